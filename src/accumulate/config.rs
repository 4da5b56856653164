//! Reconstruction configuration.

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::projection::buffer::Dims;
use crate::projection::policy::{MergePolicy, ThresholdBand};
use crate::projection::region::Axis;

// ---------------------------------------------------------------------------
// Value selection
// ---------------------------------------------------------------------------

/// How a leaf's payload is reduced before projection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadReduce {
    /// First channel only (scalar payloads, signed distances)
    #[default]
    First,
    /// Mean over all channels
    Mean,
    /// Every channel, for vector-valued buffers
    All,
}

/// What value a node projects
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueSource {
    /// Leaf payload; internal nodes project `internal_value`
    Payload { reduce: PayloadReduce },
    /// The node's level (resolution maps)
    Level,
    /// A fixed value (occupancy, cell boundaries)
    Constant { value: f32 },
}

impl Default for ValueSource {
    fn default() -> Self {
        ValueSource::Payload { reduce: PayloadReduce::First }
    }
}

// ---------------------------------------------------------------------------
// Destination layout
// ---------------------------------------------------------------------------

/// Resolution of per-level buffers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelResolution {
    /// Every level buffer has the full voxel extent
    #[default]
    Full,
    /// Level L buffer has one cell per level-L node
    Native,
}

/// Which buffer a node is projected into
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LevelRouting {
    /// One buffer for all levels
    #[default]
    Shared,
    /// One buffer per level
    PerLevel {
        #[serde(default)]
        resolution: LevelResolution,
    },
}

impl LevelRouting {
    pub fn layer_count(&self) -> usize {
        match self {
            LevelRouting::Shared => 1,
            LevelRouting::PerLevel { .. } => crate::octree::level::LEVEL_COUNT,
        }
    }
}

/// Volume or planar projection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Layout {
    #[default]
    Volume,
    /// Collapse `dropped` so the result is a 2D image
    Plane { dropped: Axis },
}

impl Layout {
    pub fn plane(dropped: Axis) -> Self {
        Layout::Plane { dropped }
    }
}

/// Destination buffer allocation
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferSpec {
    /// Voxel extent; defaults to the source's extent
    pub dims: Option<Dims>,
    /// Values per voxel
    pub channels: usize,
    /// Initial value of every cell
    pub background: f32,
}

impl Default for BufferSpec {
    fn default() -> Self {
        Self {
            dims: None,
            channels: 1,
            background: 0.0,
        }
    }
}

/// Post-traversal normalization
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Finalize {
    pub normalize_values: bool,
    pub normalize_colors: bool,
    /// Added to the range so uniform buffers do not divide by zero
    pub epsilon: f32,
}

impl Default for Finalize {
    fn default() -> Self {
        Self {
            normalize_values: false,
            normalize_colors: false,
            epsilon: 1e-6,
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Full reconstruction configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructConfig {
    pub policy: MergePolicy,
    /// Skip internal nodes entirely
    pub leafs_only: bool,
    /// Value projected by internal nodes when values come from payload
    pub internal_value: f32,
    /// Restrict the traversal to one block
    pub block_filter: Option<u32>,
    pub value_source: ValueSource,
    pub routing: LevelRouting,
    pub layout: Layout,
    pub buffer: BufferSpec,
    /// Fail unless leaves cover every voxel exactly once
    pub check_tiling: bool,
    pub finalize: Finalize,
}

impl Default for ReconstructConfig {
    fn default() -> Self {
        Self {
            policy: MergePolicy::Overwrite,
            leafs_only: true,
            internal_value: 0.0,
            block_filter: None,
            value_source: ValueSource::default(),
            routing: LevelRouting::Shared,
            layout: Layout::Volume,
            buffer: BufferSpec::default(),
            check_tiling: false,
            finalize: Finalize::default(),
        }
    }
}

impl ReconstructConfig {
    /// Create a new config with defaults (overwrite, leaves only, first payload channel)
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-voxel maximum of node levels
    pub fn level_map() -> Self {
        Self {
            policy: MergePolicy::TakeMax,
            value_source: ValueSource::Level,
            ..Self::default()
        }
    }

    /// Mean of vector payloads, assigned per leaf
    pub fn mean_payload() -> Self {
        Self {
            policy: MergePolicy::Average,
            value_source: ValueSource::Payload { reduce: PayloadReduce::Mean },
            ..Self::default()
        }
    }

    /// Occupancy of a signed distance band, one native-resolution buffer per level
    pub fn surface_classify(band: ThresholdBand) -> Self {
        Self {
            policy: MergePolicy::ThresholdClassify(band),
            leafs_only: false,
            routing: LevelRouting::PerLevel { resolution: LevelResolution::Native },
            finalize: Finalize { normalize_colors: true, ..Finalize::default() },
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_leafs_only(mut self, leafs_only: bool) -> Self {
        self.leafs_only = leafs_only;
        self
    }

    pub fn with_internal_value(mut self, value: f32) -> Self {
        self.internal_value = value;
        self
    }

    pub fn with_block_filter(mut self, block: Option<u32>) -> Self {
        self.block_filter = block;
        self
    }

    pub fn with_value_source(mut self, source: ValueSource) -> Self {
        self.value_source = source;
        self
    }

    pub fn with_routing(mut self, routing: LevelRouting) -> Self {
        self.routing = routing;
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_buffer(mut self, buffer: BufferSpec) -> Self {
        self.buffer = buffer;
        self
    }

    pub fn with_check_tiling(mut self, check: bool) -> Self {
        self.check_tiling = check;
        self
    }

    pub fn with_finalize(mut self, finalize: Finalize) -> Self {
        self.finalize = finalize;
        self
    }

    /// Reject configurations that cannot produce a meaningful buffer
    pub fn validate(&self) -> Result<()> {
        if self.buffer.channels == 0 {
            return Err(Error::Config("buffer.channels must be at least 1".into()));
        }
        if !(self.finalize.epsilon >= 0.0) {
            return Err(Error::Config(format!("finalize.epsilon must be >= 0, got {}", self.finalize.epsilon)));
        }
        if let Some(band) = self.policy.band() {
            if !(band.lo <= band.hi) {
                return Err(Error::Config(format!("threshold band lo {} exceeds hi {}", band.lo, band.hi)));
            }
        }
        if let Some(dims) = self.buffer.dims {
            if dims.voxel_count() == 0 {
                return Err(Error::Config(format!("buffer dims {} are empty", dims)));
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ReconstructConfig::default();
        assert!(cfg.leafs_only);
        assert_eq!(cfg.policy, MergePolicy::Overwrite);
        assert_eq!(cfg.routing.layer_count(), 1);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        assert_eq!(ReconstructConfig::level_map().value_source, ValueSource::Level);
        let surface = ReconstructConfig::surface_classify(ThresholdBand::surface());
        assert!(!surface.leafs_only);
        assert_eq!(surface.routing.layer_count(), 4);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cfg = ReconstructConfig::default().with_buffer(BufferSpec { channels: 0, ..BufferSpec::default() });
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));

        let cfg = ReconstructConfig::default().with_policy(MergePolicy::threshold(3.0, 0.5));
        assert!(cfg.validate().is_err());

        let cfg = ReconstructConfig::default()
            .with_finalize(Finalize { epsilon: f32::NAN, ..Finalize::default() });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_json_partial_config() {
        let cfg = ReconstructConfig::from_json(
            r#"{
                "policy": { "kind": "take_max" },
                "leafs_only": false,
                "value_source": { "kind": "level" },
                "routing": { "kind": "per_level", "resolution": "native" },
                "layout": { "kind": "plane", "dropped": "width" }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.policy, MergePolicy::TakeMax);
        assert!(!cfg.leafs_only);
        assert_eq!(cfg.routing, LevelRouting::PerLevel { resolution: LevelResolution::Native });
        assert_eq!(cfg.layout, Layout::plane(Axis::Width));
        assert_eq!(cfg.buffer.channels, 1);
    }

    #[test]
    fn test_json_roundtrip() {
        let cfg = ReconstructConfig::surface_classify(ThresholdBand::surface()).with_block_filter(Some(3));
        let json = cfg.to_json().unwrap();
        let back = ReconstructConfig::from_json(&json).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn test_json_errors_are_config_errors() {
        assert!(matches!(ReconstructConfig::from_json("{ nope"), Err(Error::Config(_))));
    }
}
