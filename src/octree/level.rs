//! Resolution level constants and utilities.
//!
//! A shallow octree block is 8x8x8 voxels and subdivides at most three times:
//! - Level 0: whole block (8 voxels per side)
//! - Level 1: octant (4)
//! - Level 2: 2x2x2 cell
//! - Level 3: single voxel

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Block size in voxels per side
pub const BLOCK_SIZE: u32 = 8;

/// Finest level (single voxel)
pub const MAX_LEVEL: u8 = 3;

/// Number of distinct levels
pub const LEVEL_COUNT: usize = MAX_LEVEL as usize + 1;

/// Voxels per side of a node, indexed by level
pub const EXTENT_BY_LEVEL: [u32; LEVEL_COUNT] = [8, 4, 2, 1];

/// Validated resolution level in `0..=3`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Level(u8);

impl Level {
    pub const COARSEST: Level = Level(0);
    pub const FINEST: Level = Level(MAX_LEVEL);

    /// All levels, coarsest first
    pub const ALL: [Level; LEVEL_COUNT] = [Level(0), Level(1), Level(2), Level(3)];

    /// Validate a raw level
    pub fn new(level: u8) -> Result<Self> {
        if level > MAX_LEVEL {
            return Err(Error::InvalidLevel { level });
        }
        Ok(Self(level))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Voxels per side covered by a node at this level
    pub fn extent(self) -> u32 {
        EXTENT_BY_LEVEL[self.index()]
    }

    /// Voxels covered by a node at this level
    pub fn voxel_count(self) -> u32 {
        let e = self.extent();
        e * e * e
    }

    /// Next finer level, if any
    pub fn finer(self) -> Option<Level> {
        (self.0 < MAX_LEVEL).then(|| Level(self.0 + 1))
    }
}

impl TryFrom<u8> for Level {
    type Error = Error;

    fn try_from(level: u8) -> Result<Self> {
        Level::new(level)
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> u8 {
        level.0
    }
}

/// Voxels per side at `level`, or `InvalidLevel`
pub fn extent(level: u8) -> Result<u32> {
    Level::new(level).map(Level::extent)
}
