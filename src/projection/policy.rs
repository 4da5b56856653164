//! Merge policies for projected values

use serde::{Deserialize, Serialize};

/// Symmetric magnitude band used for occupancy classification
///
/// A value is inside when `lo <= |v| < hi` (or `lo < |v| < hi` when
/// `lo_inclusive` is false).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBand {
    pub lo: f32,
    pub hi: f32,
    #[serde(default = "default_true")]
    pub lo_inclusive: bool,
}

fn default_true() -> bool {
    true
}

impl ThresholdBand {
    pub fn new(lo: f32, hi: f32) -> Self {
        Self { lo, hi, lo_inclusive: true }
    }

    /// Narrow band around a signed distance surface, `[0.5, 3.0)`
    pub fn surface() -> Self {
        Self::new(0.5, 3.0)
    }

    /// Anything measurably non-zero, `(1e-5, inf)`
    pub fn nonzero() -> Self {
        Self { lo: 1e-5, hi: f32::INFINITY, lo_inclusive: false }
    }

    pub fn contains(&self, value: f32) -> bool {
        let m = value.abs();
        let above = if self.lo_inclusive { m >= self.lo } else { m > self.lo };
        above && m < self.hi
    }
}

impl Default for ThresholdBand {
    fn default() -> Self {
        Self::surface()
    }
}

/// How a projected value combines with what the region already holds
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MergePolicy {
    /// Unconditional assignment
    #[default]
    Overwrite,
    /// Keep the per-voxel maximum
    TakeMax,
    /// Assign a value already reduced to the mean of its channels
    Average,
    /// Mark the region occupied (1.0) when the value falls in the band
    ThresholdClassify(ThresholdBand),
}

impl MergePolicy {
    pub fn threshold(lo: f32, hi: f32) -> Self {
        MergePolicy::ThresholdClassify(ThresholdBand::new(lo, hi))
    }

    /// Band of a classifying policy
    pub fn band(&self) -> Option<&ThresholdBand> {
        match self {
            MergePolicy::ThresholdClassify(band) => Some(band),
            _ => None,
        }
    }
}

/// Color written to the auxiliary buffer for a classified magnitude
pub fn classify_color(magnitude: f32) -> [f32; 3] {
    [0.0, magnitude, 1.0 - magnitude]
}
