//! Interfaces the external octree engine implements.
//!
//! The projector never owns an octree. It sees a single-pass sequence of
//! [`TraversalRecord`]s plus accessors for payload and geometry.

use serde::{Deserialize, Serialize};

use super::record::TraversalRecord;
use crate::projection::buffer::Dims;

/// Which records a traversal yields
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalFilter {
    /// Yield leaves only
    pub leafs_only: bool,
    /// Restrict to a single block
    pub block: Option<u32>,
}

impl TraversalFilter {
    pub fn leafs_only() -> Self {
        Self { leafs_only: true, block: None }
    }

    pub fn all_nodes() -> Self {
        Self { leafs_only: false, block: None }
    }

    pub fn with_block(mut self, block: Option<u32>) -> Self {
        self.block = block;
        self
    }

    /// Whether `record` passes this filter
    pub fn accepts(&self, record: &TraversalRecord) -> bool {
        (!self.leafs_only || record.is_leaf) && self.block.is_none_or(|b| b == record.block_index)
    }
}

/// Maps a node to the offset of its payload in the flat payload array
pub trait DataIndex {
    fn data_idx(&self, block_index: u32, bit_index: u32) -> usize;
}

/// Read access to an external sparse octree
pub trait OctreeSource: DataIndex {
    /// Voxel extent `(depth, height, width)`
    fn vx_dims(&self) -> Dims;

    /// Number of top-level blocks
    fn num_blocks(&self) -> u32;

    /// Payload values per leaf
    fn feature_size(&self) -> usize;

    /// `len` contiguous payload values starting at `offset`
    fn payload(&self, offset: usize, len: usize) -> Option<&[f32]>;

    /// Total number of payload values
    fn payload_len(&self) -> usize;

    /// Lazily visit nodes matching `filter`
    fn traverse(&self, filter: TraversalFilter) -> impl Iterator<Item = TraversalRecord> + '_;
}
