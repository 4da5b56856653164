//! Record decoding and dense region projection

pub mod buffer;
pub mod region;
pub mod policy;
pub mod decode;
pub mod project;

pub use buffer::{DenseBuffer, Dims};
pub use region::{Axis, PlacementRegion};
pub use policy::{classify_color, MergePolicy, ThresholdBand};
pub use decode::{decode, DecodedNode};
pub use project::{fill_region, project};
