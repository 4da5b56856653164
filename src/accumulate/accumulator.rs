//! Multi-level accumulation of a full traversal.
//!
//! The accumulator consumes a traversal exactly once, in the order the
//! engine produces it, decodes every record, fetches leaf payload and
//! projects into the buffer selected by the routing. After the traversal it
//! optionally normalizes the buffers. Nothing survives a call except the
//! returned [`Reconstruction`].

use rayon::prelude::*;

use super::config::{LevelResolution, LevelRouting, Layout, PayloadReduce, ReconstructConfig, ValueSource};
use crate::core::types::UVec3;
use crate::core::{Error, Result};
use crate::octree::level::{Level, LEVEL_COUNT};
use crate::octree::record::TraversalRecord;
use crate::octree::source::{OctreeSource, TraversalFilter};
use crate::projection::buffer::{DenseBuffer, Dims};
use crate::projection::decode::{decode, DecodedNode};
use crate::projection::policy::classify_color;
use crate::projection::project::{fill_region, project};
use crate::projection::region::PlacementRegion;

/// Lifecycle of a reconstruction call
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Consuming,
    Finalizing,
    Done,
}

/// Counters gathered during one reconstruction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconstructStats {
    /// Records yielded by the traversal
    pub records: usize,
    pub leaves: usize,
    pub internal: usize,
    /// Records the source yielded despite the filter (always 0 for a
    /// source that honors [`TraversalFilter`])
    pub skipped: usize,
    /// Voxels (cells) written across all buffers
    pub voxels_written: usize,
    /// Projected records per level
    pub per_level: [usize; LEVEL_COUNT],
    /// Regions marked occupied by threshold classification
    pub classified: usize,
}

/// Buffers produced by one reconstruction
#[derive(Clone, Debug, PartialEq)]
pub struct Reconstruction {
    /// One buffer (shared routing) or one per level, coarsest first
    pub layers: Vec<DenseBuffer>,
    /// Color buffers matching `layers`, only for threshold classification
    pub colors: Vec<DenseBuffer>,
    pub stats: ReconstructStats,
}

impl Reconstruction {
    /// The first (for shared routing, the only) buffer
    pub fn buffer(&self) -> &DenseBuffer {
        &self.layers[0]
    }

    /// Buffer for `level` under per-level routing
    pub fn level(&self, level: Level) -> Option<&DenseBuffer> {
        (self.layers.len() == LEVEL_COUNT).then(|| &self.layers[level.index()])
    }

    /// Color buffer for layer `index`
    pub fn colors(&self, index: usize) -> Option<&DenseBuffer> {
        self.colors.get(index)
    }

    /// Take the first buffer
    pub fn into_buffer(mut self) -> DenseBuffer {
        self.layers.swap_remove(0)
    }
}

/// Value a node projects, borrowed from payload where possible
enum NodeValue<'a> {
    Slice(&'a [f32]),
    Scalar([f32; 1]),
}

impl NodeValue<'_> {
    fn as_slice(&self) -> &[f32] {
        match self {
            NodeValue::Slice(v) => v,
            NodeValue::Scalar(v) => v,
        }
    }
}

/// Working state of a single reconstruction
struct Pass<'c> {
    config: &'c ReconstructConfig,
    vx_dims: Dims,
    layers: Vec<DenseBuffer>,
    colors: Vec<DenseBuffer>,
    /// Leaf coverage per voxel when tiling is checked
    coverage: Option<Vec<u32>>,
    stats: ReconstructStats,
}

/// Drives decode and projection over a whole traversal
#[derive(Clone, Debug)]
pub struct Accumulator {
    config: ReconstructConfig,
    phase: Phase,
}

impl Accumulator {
    pub fn new(config: ReconstructConfig) -> Self {
        Self { config, phase: Phase::Idle }
    }

    pub fn config(&self) -> &ReconstructConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Consume one traversal of `source` and return the produced buffers
    ///
    /// Errors carry the failing record's position in the traversal. Buffers
    /// written before an error are dropped.
    pub fn reconstruct<S: OctreeSource>(&mut self, source: &S) -> Result<Reconstruction> {
        let result = self.run(source);
        self.phase = if result.is_ok() { Phase::Done } else { Phase::Idle };
        result
    }

    fn run<S: OctreeSource>(&mut self, source: &S) -> Result<Reconstruction> {
        self.config.validate()?;
        self.phase = Phase::Consuming;

        let mut pass = Pass::new(&self.config, source.vx_dims());
        let filter = TraversalFilter {
            leafs_only: self.config.leafs_only,
            block: self.config.block_filter,
        };

        for (index, record) in source.traverse(filter).enumerate() {
            pass.stats.records += 1;
            // Engines are not trusted to apply the filter themselves
            if !filter.accepts(&record) {
                pass.stats.skipped += 1;
                continue;
            }
            pass.consume(source, &record).map_err(|e| e.at_record(index))?;
        }

        self.phase = Phase::Finalizing;
        pass.finish()
    }
}

impl<'c> Pass<'c> {
    fn new(config: &'c ReconstructConfig, vx_dims: Dims) -> Self {
        let base = config.buffer.dims.unwrap_or(vx_dims);
        let layer_dims = |level: Option<Level>| {
            let mut dims = base;
            if let (LevelRouting::PerLevel { resolution: LevelResolution::Native }, Some(level)) =
                (config.routing, level)
            {
                dims = dims.downsampled(level.extent());
            }
            if let Layout::Plane { dropped } = config.layout {
                dims = dims.flattened(dropped.index());
            }
            dims
        };

        let levels: Vec<Option<Level>> = match config.routing {
            LevelRouting::Shared => vec![None],
            LevelRouting::PerLevel { .. } => Level::ALL.iter().copied().map(Some).collect(),
        };

        let layers = levels
            .iter()
            .map(|l| DenseBuffer::new(layer_dims(*l), config.buffer.channels, config.buffer.background))
            .collect();

        let colors = match config.policy.band() {
            Some(_) => levels.iter().map(|l| DenseBuffer::new(layer_dims(*l), 3, 0.0)).collect(),
            None => Vec::new(),
        };

        let coverage = match (config.check_tiling, config.block_filter) {
            (true, None) => Some(vec![0; vx_dims.voxel_count()]),
            (true, Some(block)) => {
                log::warn!("Tiling check ignored: traversal restricted to block {}", block);
                None
            }
            (false, _) => None,
        };

        Self {
            config,
            vx_dims,
            layers,
            colors,
            coverage,
            stats: ReconstructStats::default(),
        }
    }

    fn consume<S: OctreeSource>(&mut self, source: &S, record: &TraversalRecord) -> Result<()> {
        let node = decode(record, self.vx_dims, source)?;
        let level = node.level();

        if node.is_leaf {
            self.stats.leaves += 1;
            self.cover(&node.region);
        } else {
            self.stats.internal += 1;
        }
        self.stats.per_level[level.index()] += 1;

        let value = self.node_value(source, &node)?;
        let value = value.as_slice();

        let slot = match self.config.routing {
            LevelRouting::Shared => 0,
            LevelRouting::PerLevel { .. } => level.index(),
        };
        let region = self.route(&node.region);

        let written = project(&mut self.layers[slot], &region, value, &self.config.policy)?;
        self.stats.voxels_written += written;

        if written > 0 && !self.colors.is_empty() {
            fill_region(&mut self.colors[slot], &region, &classify_color(value[0].abs()))?;
            self.stats.classified += 1;
        }
        Ok(())
    }

    fn node_value<'s, S: OctreeSource>(&self, source: &'s S, node: &DecodedNode) -> Result<NodeValue<'s>> {
        let reduce = match self.config.value_source {
            ValueSource::Level => return Ok(NodeValue::Scalar([node.level().get() as f32])),
            ValueSource::Constant { value } => return Ok(NodeValue::Scalar([value])),
            ValueSource::Payload { reduce } => reduce,
        };

        let Some(offset) = node.data_offset else {
            return Ok(NodeValue::Scalar([self.config.internal_value]));
        };

        let len = source.feature_size();
        let payload = source.payload(offset, len).ok_or(Error::PayloadAccess {
            offset,
            len,
            available: source.payload_len(),
        })?;

        Ok(match reduce {
            PayloadReduce::First => NodeValue::Scalar([payload[0]]),
            PayloadReduce::Mean => {
                NodeValue::Scalar([payload.iter().sum::<f32>() / payload.len() as f32])
            }
            PayloadReduce::All => NodeValue::Slice(payload),
        })
    }

    /// Map a volume region into the selected buffer's index space
    fn route(&self, region: &PlacementRegion) -> PlacementRegion {
        let mut region = *region;
        if let LevelRouting::PerLevel { resolution: LevelResolution::Native } = self.config.routing {
            region = region.at_level_resolution();
        }
        if let Layout::Plane { dropped } = self.config.layout {
            region = region.flattened(dropped);
        }
        region
    }

    fn cover(&mut self, region: &PlacementRegion) {
        let Some(coverage) = self.coverage.as_mut() else {
            return;
        };
        let dims = self.vx_dims;
        for p in region.voxels() {
            coverage[voxel_index(dims, p)] += 1;
        }
    }

    fn finish(mut self) -> Result<Reconstruction> {
        if let Some(coverage) = &self.coverage {
            if let Some((i, &count)) = coverage.iter().enumerate().find(|(_, c)| **c != 1) {
                return Err(Error::TilingViolation { voxel: voxel_coord(self.vx_dims, i), count });
            }
        }

        let finalize = self.config.finalize;
        if finalize.normalize_values {
            self.layers.iter_mut().for_each(|b| b.normalize(finalize.epsilon));
        }
        if finalize.normalize_colors {
            self.colors.iter_mut().for_each(|b| b.normalize(finalize.epsilon));
        }

        log::debug!(
            "Reconstructed {} records ({} leaves, {} internal, {} skipped), {} cells written, per level {:?}",
            self.stats.records,
            self.stats.leaves,
            self.stats.internal,
            self.stats.skipped,
            self.stats.voxels_written,
            self.stats.per_level,
        );

        Ok(Reconstruction {
            layers: self.layers,
            colors: self.colors,
            stats: self.stats,
        })
    }
}

fn voxel_index(dims: Dims, p: UVec3) -> usize {
    (p.x as usize * dims.height as usize + p.y as usize) * dims.width as usize + p.z as usize
}

fn voxel_coord(dims: Dims, index: usize) -> [u32; 3] {
    let w = index % dims.width as usize;
    let h = (index / dims.width as usize) % dims.height as usize;
    let d = index / (dims.width as usize * dims.height as usize);
    [d as u32, h as u32, w as u32]
}

/// Reconstruct one traversal of `source` with a fresh accumulator
pub fn reconstruct<S: OctreeSource>(source: &S, config: &ReconstructConfig) -> Result<Reconstruction> {
    Accumulator::new(config.clone()).reconstruct(source)
}

/// Reconstruct independent sources in parallel, one accumulator each
pub fn reconstruct_all<S: OctreeSource + Sync>(sources: &[S], config: &ReconstructConfig) -> Vec<Result<Reconstruction>> {
    sources.par_iter().map(|source| reconstruct(source, config)).collect()
}
