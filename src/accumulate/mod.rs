//! Whole-traversal reconstruction into one or more dense buffers

pub mod config;
pub mod accumulator;

pub use config::{
    BufferSpec, Finalize, LevelResolution, LevelRouting, Layout, PayloadReduce, ReconstructConfig, ValueSource,
};
pub use accumulator::{reconstruct, reconstruct_all, Accumulator, Phase, ReconstructStats, Reconstruction};
