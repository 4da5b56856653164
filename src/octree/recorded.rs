//! In-memory replayable octree source.
//!
//! Holds a recorded traversal and its flat payload. Leaf payloads are laid
//! out in the order leaves were pushed, `feature_size` values each.

use std::collections::HashMap;

use super::bits::{child_bit, sub_coord_of_bit};
use super::level::{Level, BLOCK_SIZE};
use super::record::{BlockCoord, TraversalRecord};
use super::source::{DataIndex, OctreeSource, TraversalFilter};
use crate::core::{Error, Result};
use crate::projection::buffer::Dims;

/// Recorded traversal over a grid of blocks
#[derive(Clone, Debug)]
pub struct RecordedOctree {
    /// Grid size in blocks `(d, h, w)`
    grid: [u32; 3],
    feature_size: usize,
    records: Vec<TraversalRecord>,
    payload: Vec<f32>,
    /// (block_index, bit_index) -> payload offset
    offsets: HashMap<(u32, u32), usize>,
}

impl RecordedOctree {
    /// Create an empty recording for a grid of `d x h x w` blocks
    pub fn new(grid_d: u32, grid_h: u32, grid_w: u32, feature_size: usize) -> Self {
        Self {
            grid: [grid_d, grid_h, grid_w],
            feature_size: feature_size.max(1),
            records: Vec::new(),
            payload: Vec::new(),
            offsets: HashMap::new(),
        }
    }

    /// Grid size in blocks
    pub fn grid(&self) -> [u32; 3] {
        self.grid
    }

    /// Linear block index of a block coordinate
    pub fn block_index(&self, coord: BlockCoord) -> u32 {
        (coord.d * self.grid[1] + coord.h) * self.grid[2] + coord.w
    }

    /// Block coordinate of a linear block index
    pub fn block_coord(&self, index: u32) -> BlockCoord {
        let w = index % self.grid[2];
        let h = (index / self.grid[2]) % self.grid[1];
        let d = index / (self.grid[2] * self.grid[1]);
        BlockCoord::new(d, h, w)
    }

    /// Recorded nodes in traversal order
    pub fn records(&self) -> &[TraversalRecord] {
        &self.records
    }

    /// Append a leaf and its payload
    pub fn push_leaf(&mut self, record: TraversalRecord, values: &[f32]) -> Result<()> {
        if values.len() != self.feature_size {
            return Err(Error::ChannelMismatch { expected: self.feature_size, got: values.len() });
        }
        let offset = self.payload.len();
        self.payload.extend_from_slice(values);
        self.offsets.insert((record.block_index, record.bit_index), offset);
        self.records.push(TraversalRecord { is_leaf: true, ..record });
        Ok(())
    }

    /// Append an internal node (no payload)
    pub fn push_internal(&mut self, record: TraversalRecord) {
        self.records.push(TraversalRecord { is_leaf: false, ..record });
    }

    /// Append a record verbatim, without payload, even if it is malformed
    pub fn push_raw(&mut self, record: TraversalRecord) {
        self.records.push(record);
    }

    /// Record a whole block as one level-0 leaf
    pub fn uniform_block(&mut self, block_index: u32, values: &[f32]) -> Result<()> {
        let coord = self.block_coord(block_index);
        self.push_leaf(TraversalRecord::leaf(block_index, coord, [0, 0, 0], 0), values)
    }

    /// Record a block split uniformly down to `leaf_level`
    ///
    /// Internal nodes are emitted before their children. `value_at` receives
    /// each leaf's absolute voxel origin `(d, h, w)`.
    pub fn split_block<F>(&mut self, block_index: u32, leaf_level: Level, mut value_at: F) -> Result<()>
    where
        F: FnMut([u32; 3]) -> Vec<f32>,
    {
        let coord = self.block_coord(block_index);
        self.split_node(block_index, coord, 0, Level::COARSEST, leaf_level, &mut value_at)
    }

    fn split_node<F>(
        &mut self,
        block_index: u32,
        coord: BlockCoord,
        bit: u32,
        level: Level,
        leaf_level: Level,
        value_at: &mut F,
    ) -> Result<()>
    where
        F: FnMut([u32; 3]) -> Vec<f32>,
    {
        let sub = sub_coord_of_bit(bit).unwrap_or([0; 3]);
        let record = TraversalRecord {
            is_leaf: level >= leaf_level,
            block_index,
            bit_index: bit,
            block_coord: coord,
            sub_coord: sub.into(),
            level: level.get(),
        };

        match level.finer() {
            Some(finer) if level < leaf_level => {
                self.push_internal(record);
                for c in 0..8 {
                    self.split_node(block_index, coord, child_bit(bit) + c, finer, leaf_level, value_at)?;
                }
                Ok(())
            }
            _ => {
                let origin = coord.voxel_origin().ok_or(Error::CoordinateOverflow {
                    block: coord.to_array(),
                    sub,
                    level: level.get(),
                    dims: self.vx_dims(),
                })?;
                let values = value_at([origin[0] + sub[0], origin[1] + sub[1], origin[2] + sub[2]]);
                self.push_leaf(record, &values)
            }
        }
    }
}

impl DataIndex for RecordedOctree {
    fn data_idx(&self, block_index: u32, bit_index: u32) -> usize {
        // Unknown nodes resolve past the end so payload access reports them
        self.offsets
            .get(&(block_index, bit_index))
            .copied()
            .unwrap_or(self.payload.len())
    }
}

impl OctreeSource for RecordedOctree {
    fn vx_dims(&self) -> Dims {
        Dims::new(
            self.grid[0] * BLOCK_SIZE,
            self.grid[1] * BLOCK_SIZE,
            self.grid[2] * BLOCK_SIZE,
        )
    }

    fn num_blocks(&self) -> u32 {
        self.grid.iter().product()
    }

    fn feature_size(&self) -> usize {
        self.feature_size
    }

    fn payload(&self, offset: usize, len: usize) -> Option<&[f32]> {
        let end = offset.checked_add(len)?;
        self.payload.get(offset..end)
    }

    fn payload_len(&self) -> usize {
        self.payload.len()
    }

    fn traverse(&self, filter: TraversalFilter) -> impl Iterator<Item = TraversalRecord> + '_ {
        self.records.iter().copied().filter(move |r| filter.accepts(r))
    }
}
