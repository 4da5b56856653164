//! Error types for octree projection

use thiserror::Error;

use crate::projection::buffer::Dims;
use crate::projection::region::PlacementRegion;

/// Main error type for decoding, projection and reconstruction
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid level {level} (expected 0..=3)")]
    InvalidLevel { level: u8 },

    #[error("sub coordinate {sub:?} is not aligned to level {level} (cell width {extent})")]
    MisalignedNode { sub: [u32; 3], level: u8, extent: u32 },

    #[error("node at block {block:?} + {sub:?} (level {level}) overflows the declared voxel extent {dims}")]
    CoordinateOverflow { block: [u32; 3], sub: [u32; 3], level: u8, dims: Dims },

    #[error("region {region} lies outside the destination buffer {dims}")]
    RegionOutOfBounds { region: PlacementRegion, dims: Dims },

    #[error("payload access at offset {offset} (+{len}) exceeds payload of {available} values")]
    PayloadAccess { offset: usize, len: usize, available: usize },

    #[error("value has {got} channels but buffer expects {expected}")]
    ChannelMismatch { expected: usize, got: usize },

    #[error("voxel {voxel:?} covered by {count} leaves (expected exactly 1)")]
    TilingViolation { voxel: [u32; 3], count: u32 },

    #[error("config error: {0}")]
    Config(String),

    #[error("record {index}: {source}")]
    AtRecord {
        index: usize,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attach the traversal position of the offending record
    pub fn at_record(self, index: usize) -> Self {
        Error::AtRecord { index, source: Box::new(self) }
    }

    /// The underlying error with any record context stripped
    pub fn root(&self) -> &Error {
        match self {
            Error::AtRecord { source, .. } => source.root(),
            other => other,
        }
    }

    /// Index of the record that failed, if known
    pub fn record_index(&self) -> Option<usize> {
        match self {
            Error::AtRecord { index, .. } => Some(*index),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
