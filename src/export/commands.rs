//! Cube placement commands for vector-graphics export.
//!
//! Instead of filling an array, a traversal can be turned into one cube per
//! node for a document writer to draw. Coordinates here are drawing
//! coordinates `(x, y, z) = (width, height, depth)`.

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::octree::level::Level;
use crate::octree::source::{OctreeSource, TraversalFilter};
use crate::projection::decode::{decode, DecodedNode};

/// How a cube is drawn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CubeStyle {
    /// Filled leaf cell
    Filled,
    /// Thin leaf outline
    Outline,
    /// Heavy outline of a split top-level block
    BlockBoundary,
}

/// Which nodes become cubes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportMode {
    /// Filled leaves plus boundaries of split blocks
    #[default]
    Solid,
    /// Leaf outlines only
    Wireframe,
}

/// Where cube colors come from
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSource {
    /// First three payload channels as RGB; internal nodes are black
    Payload,
    /// Block position in the grid, for the caller's colormap
    #[default]
    BlockIndex,
}

/// Color attached to a cube
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CubeColor {
    Rgb([u8; 3]),
    /// `block_index / num_blocks`, in `[0, 1)`
    BlockFraction(f32),
}

/// Export options
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub mode: ExportMode,
    pub color: ColorSource,
    pub block_filter: Option<u32>,
}

/// One cube to draw
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubeCommand {
    /// Minimum corner `(x, y, z)`
    pub min: [u32; 3],
    /// Maximum corner `(x, y, z)`
    pub max: [u32; 3],
    pub style: CubeStyle,
    pub color: CubeColor,
    pub block_index: u32,
    pub level: Level,
}

impl CubeCommand {
    fn from_node(node: &DecodedNode, style: CubeStyle, color: CubeColor) -> Self {
        let o = node.region.origin;
        let e = node.region.end();
        Self {
            min: [o.z, o.y, o.x],
            max: [e.z, e.y, e.x],
            style,
            color,
            block_index: node.block_index,
            level: node.level(),
        }
    }

    /// Side length
    pub fn width(&self) -> u32 {
        self.max[0] - self.min[0]
    }

    /// The six faces as closed quads
    pub fn faces(&self) -> [[[u32; 3]; 4]; 6] {
        let [x0, y0, z0] = self.min;
        let [x1, y1, z1] = self.max;
        [
            [[x0, y0, z0], [x0, y1, z0], [x1, y1, z0], [x1, y0, z0]],
            [[x0, y0, z0], [x0, y0, z1], [x0, y1, z1], [x0, y1, z0]],
            [[x0, y1, z0], [x1, y1, z0], [x1, y1, z1], [x0, y1, z1]],
            [[x0, y0, z0], [x1, y0, z0], [x1, y0, z1], [x0, y0, z1]],
            [[x0, y0, z1], [x0, y1, z1], [x1, y1, z1], [x1, y0, z1]],
            [[x1, y0, z0], [x1, y0, z1], [x1, y1, z1], [x1, y1, z0]],
        ]
    }
}

fn to_channel(v: f32) -> u8 {
    v.clamp(0.0, 255.0) as u8
}

fn node_color<S: OctreeSource>(source: &S, node: &DecodedNode, color: ColorSource) -> Result<CubeColor> {
    match color {
        ColorSource::BlockIndex => {
            let n = source.num_blocks().max(1);
            Ok(CubeColor::BlockFraction(node.block_index as f32 / n as f32))
        }
        ColorSource::Payload => {
            let Some(offset) = node.data_offset else {
                return Ok(CubeColor::Rgb([0, 0, 0]));
            };
            let len = source.feature_size().min(3);
            let values = source.payload(offset, len).ok_or(Error::PayloadAccess {
                offset,
                len,
                available: source.payload_len(),
            })?;
            let mut rgb = [0u8; 3];
            for (slot, v) in rgb.iter_mut().zip(values) {
                *slot = to_channel(*v);
            }
            Ok(CubeColor::Rgb(rgb))
        }
    }
}

/// Enumerate cube commands for one traversal of `source`
pub fn placement_commands<S: OctreeSource>(source: &S, options: &ExportOptions) -> Result<Vec<CubeCommand>> {
    let filter = TraversalFilter {
        leafs_only: options.mode == ExportMode::Wireframe,
        block: options.block_filter,
    };
    let dims = source.vx_dims();
    let mut commands = Vec::new();

    for (index, record) in source.traverse(filter).enumerate() {
        // Engines are not trusted to apply the filter themselves
        if !filter.accepts(&record) {
            continue;
        }
        let node = decode(&record, dims, source).map_err(|e| e.at_record(index))?;

        let style = match (options.mode, node.is_leaf, node.level() == Level::COARSEST) {
            (ExportMode::Solid, true, _) => CubeStyle::Filled,
            (ExportMode::Solid, false, true) => CubeStyle::BlockBoundary,
            (ExportMode::Wireframe, true, _) => CubeStyle::Outline,
            _ => continue,
        };
        let color = node_color(source, &node, options.color).map_err(|e| e.at_record(index))?;
        commands.push(CubeCommand::from_node(&node, style, color));
    }

    log::debug!("Enumerated {} cube commands ({:?})", commands.len(), options.mode);
    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::octree::record::{BlockCoord, TraversalRecord};
    use crate::octree::recorded::RecordedOctree;

    fn split_grid() -> RecordedOctree {
        let mut oct = RecordedOctree::new(1, 1, 2, 3);
        oct.uniform_block(0, &[10.0, 20.0, 300.0]).unwrap();
        oct.split_block(1, Level::new(1).unwrap(), |p| vec![p[2] as f32, 0.0, -5.0]).unwrap();
        oct
    }

    #[test]
    fn test_solid_mode() {
        let oct = split_grid();
        let cmds = placement_commands(&oct, &ExportOptions::default()).unwrap();
        // block 0 leaf, block 1 boundary, 8 octant leaves
        assert_eq!(cmds.len(), 10);
        assert_eq!(cmds.iter().filter(|c| c.style == CubeStyle::BlockBoundary).count(), 1);
        let boundary = cmds.iter().find(|c| c.style == CubeStyle::BlockBoundary).unwrap();
        assert_eq!(boundary.min, [8, 0, 0]);
        assert_eq!(boundary.max, [16, 8, 8]);
        assert_eq!(boundary.width(), 8);
    }

    #[test]
    fn test_wireframe_mode() {
        let oct = split_grid();
        let options = ExportOptions { mode: ExportMode::Wireframe, ..ExportOptions::default() };
        let cmds = placement_commands(&oct, &options).unwrap();
        assert_eq!(cmds.len(), 9);
        assert!(cmds.iter().all(|c| c.style == CubeStyle::Outline));
    }

    #[test]
    fn test_payload_colors() {
        let oct = split_grid();
        let options = ExportOptions { color: ColorSource::Payload, ..ExportOptions::default() };
        let cmds = placement_commands(&oct, &options).unwrap();
        assert_eq!(cmds[0].color, CubeColor::Rgb([10, 20, 255]));
        assert_eq!(cmds[1].color, CubeColor::Rgb([0, 0, 0]));
        // second octant of block 1 starts at w = 12
        assert_eq!(cmds[3].color, CubeColor::Rgb([12, 0, 0]));
        assert_eq!(cmds[3].min, [12, 0, 0]);
    }

    #[test]
    fn test_block_fraction_and_filter() {
        let oct = split_grid();
        let options = ExportOptions { block_filter: Some(1), ..ExportOptions::default() };
        let cmds = placement_commands(&oct, &options).unwrap();
        assert_eq!(cmds.len(), 9);
        assert!(cmds.iter().all(|c| c.color == CubeColor::BlockFraction(0.5)));
    }

    #[test]
    fn test_faces_are_on_cube_surface() {
        let mut oct = RecordedOctree::new(1, 1, 1, 1);
        oct.push_leaf(TraversalRecord::leaf(0, BlockCoord::default(), [2, 0, 4], 2), &[1.0]).unwrap();
        let cmd = placement_commands(&oct, &ExportOptions::default()).unwrap()[0];
        assert_eq!(cmd.min, [4, 0, 2]);
        for face in cmd.faces() {
            let on_plane = (0..3).any(|axis| {
                face.iter().all(|p| p[axis] == cmd.min[axis]) || face.iter().all(|p| p[axis] == cmd.max[axis])
            });
            assert!(on_plane);
        }
    }
}
