//! Traversal record decoding.
//!
//! Turns a raw [`TraversalRecord`] into a validated node with an absolute
//! voxel region. Every consumer (dense projection, cube export, manual
//! drivers) goes through [`decode`].

use super::buffer::Dims;
use super::region::PlacementRegion;
use crate::core::types::UVec3;
use crate::core::{Error, Result};
use crate::octree::level::{Level, BLOCK_SIZE};
use crate::octree::record::TraversalRecord;
use crate::octree::source::DataIndex;

/// A validated node ready for projection
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecodedNode {
    pub region: PlacementRegion,
    pub is_leaf: bool,
    /// Payload offset, only for leaves
    pub data_offset: Option<usize>,
    pub block_index: u32,
    pub bit_index: u32,
}

impl DecodedNode {
    pub fn level(&self) -> Level {
        self.region.level
    }
}

/// Absolute region of a record inside an octree of voxel extent `dims`
///
/// Origins that leave `u32` fail the same way as regions past `dims`.
pub fn placement(record: &TraversalRecord, dims: Dims) -> Result<PlacementRegion> {
    let level = Level::new(record.level)?;
    let extent = level.extent();
    let sub = record.sub_coord.to_array();
    if sub.iter().any(|&s| s >= BLOCK_SIZE || s % extent != 0) {
        return Err(Error::MisalignedNode { sub, level: level.get(), extent });
    }

    let overflow = || Error::CoordinateOverflow {
        block: record.block_coord.to_array(),
        sub,
        level: level.get(),
        dims,
    };
    let base = record.block_coord.voxel_origin().ok_or_else(overflow)?;
    let mut origin = [0u32; 3];
    for (axis, o) in origin.iter_mut().enumerate() {
        *o = base[axis].checked_add(sub[axis]).ok_or_else(overflow)?;
    }

    let region = PlacementRegion::new(UVec3::from_array(origin), level);
    if !region.fits_within(dims) {
        return Err(overflow());
    }
    Ok(region)
}

/// Decode `record` against an octree of voxel extent `dims`
pub fn decode<I: DataIndex + ?Sized>(record: &TraversalRecord, dims: Dims, index: &I) -> Result<DecodedNode> {
    let region = placement(record, dims)?;

    let data_offset = record
        .is_leaf
        .then(|| index.data_idx(record.block_index, record.bit_index));

    Ok(DecodedNode {
        region,
        is_leaf: record.is_leaf,
        data_offset,
        block_index: record.block_index,
        bit_index: record.bit_index,
    })
}
