//! Traversal records emitted by the octree engine

use serde::{Deserialize, Serialize};

use super::bits::{bit_of_sub, level_of_bit, sub_coord_of_bit};
use super::level::{Level, BLOCK_SIZE};

/// Integer coordinate of a top-level block in the block grid (block units)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockCoord {
    pub d: u32,
    pub h: u32,
    pub w: u32,
}

impl BlockCoord {
    pub fn new(d: u32, h: u32, w: u32) -> Self {
        Self { d, h, w }
    }

    pub fn to_array(self) -> [u32; 3] {
        [self.d, self.h, self.w]
    }

    /// Absolute voxel coordinate of the block's minimum corner, `None` past `u32`
    pub fn voxel_origin(&self) -> Option<[u32; 3]> {
        Some([
            self.d.checked_mul(BLOCK_SIZE)?,
            self.h.checked_mul(BLOCK_SIZE)?,
            self.w.checked_mul(BLOCK_SIZE)?,
        ])
    }
}

/// Voxel offset of a node inside its block
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubCoord {
    pub d: u32,
    pub h: u32,
    pub w: u32,
}

impl SubCoord {
    pub fn new(d: u32, h: u32, w: u32) -> Self {
        Self { d, h, w }
    }

    pub fn to_array(self) -> [u32; 3] {
        [self.d, self.h, self.w]
    }
}

impl From<[u32; 3]> for SubCoord {
    fn from(v: [u32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// One visited node of a sparse octree traversal
///
/// `level` is kept raw so that corrupted sources can be reported by the
/// decoder instead of being rejected at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalRecord {
    /// True if the node has no children
    pub is_leaf: bool,
    /// Index of the owning block
    pub block_index: u32,
    /// Position of the node in the block's packed tree
    pub bit_index: u32,
    /// Coordinates of the owning block
    pub block_coord: BlockCoord,
    /// Coordinates of the node inside its block, valid at `level`
    pub sub_coord: SubCoord,
    /// Resolution level, 0 (block) to 3 (voxel)
    pub level: u8,
}

impl TraversalRecord {
    /// Build a record from its block and bit index, deriving level and sub coordinate
    ///
    /// Returns `None` for bit indices past the finest level.
    pub fn from_bit(is_leaf: bool, block_index: u32, block_coord: BlockCoord, bit_index: u32) -> Option<Self> {
        Some(Self {
            is_leaf,
            block_index,
            bit_index,
            block_coord,
            sub_coord: sub_coord_of_bit(bit_index)?.into(),
            level: level_of_bit(bit_index)?,
        })
    }

    /// Leaf record at `sub` and `level` (bit index derived when the level is valid)
    pub fn leaf(block_index: u32, block_coord: BlockCoord, sub: [u32; 3], level: u8) -> Self {
        Self::with_sub(true, block_index, block_coord, sub, level)
    }

    /// Internal record at `sub` and `level`
    pub fn internal(block_index: u32, block_coord: BlockCoord, sub: [u32; 3], level: u8) -> Self {
        Self::with_sub(false, block_index, block_coord, sub, level)
    }

    fn with_sub(is_leaf: bool, block_index: u32, block_coord: BlockCoord, sub: [u32; 3], level: u8) -> Self {
        let bit_index = Level::new(level)
            .map(|l| bit_of_sub(sub, l))
            .unwrap_or(u32::MAX);
        Self {
            is_leaf,
            block_index,
            bit_index,
            block_coord,
            sub_coord: sub.into(),
            level,
        }
    }
}
