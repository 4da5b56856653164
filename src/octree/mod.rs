//! Shallow octree addressing and the external engine interface

pub mod level;
pub mod bits;
pub mod record;
pub mod source;
pub mod recorded;

pub use level::{Level, BLOCK_SIZE, EXTENT_BY_LEVEL, MAX_LEVEL};
pub use record::{BlockCoord, SubCoord, TraversalRecord};
pub use source::{DataIndex, OctreeSource, TraversalFilter};
pub use recorded::RecordedOctree;
