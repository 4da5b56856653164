//! Octproj - projects sparse shallow-octree traversals into dense buffers
//!
//! Records from an external octree engine are decoded into absolute voxel
//! regions ([`projection::decode`]), merged into dense buffers under a
//! [`projection::MergePolicy`] ([`projection::project`]) and accumulated over
//! a whole traversal ([`accumulate::reconstruct`]). The same decoder drives
//! cube placement export ([`export::placement_commands`]).

pub mod core;
pub mod octree;
pub mod projection;
pub mod accumulate;
pub mod export;

pub use crate::core::{Error, Result};
pub use accumulate::{reconstruct, reconstruct_all, Accumulator, ReconstructConfig, Reconstruction};
pub use octree::{OctreeSource, RecordedOctree, TraversalRecord};
pub use projection::{decode, project, DenseBuffer, Dims, MergePolicy, PlacementRegion};
