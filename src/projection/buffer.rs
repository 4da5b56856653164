//! Dense destination buffers

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::types::UVec3;

/// Voxel extent `(depth, height, width)`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dims {
    pub depth: u32,
    pub height: u32,
    pub width: u32,
}

impl Dims {
    pub fn new(depth: u32, height: u32, width: u32) -> Self {
        Self { depth, height, width }
    }

    /// Cubic extent
    pub fn cube(side: u32) -> Self {
        Self::new(side, side, side)
    }

    pub fn voxel_count(&self) -> usize {
        self.depth as usize * self.height as usize * self.width as usize
    }

    pub fn to_array(self) -> [u32; 3] {
        [self.depth, self.height, self.width]
    }

    pub fn from_array(v: [u32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }

    /// Extent with every axis divided by `factor` (rounded up)
    pub fn downsampled(&self, factor: u32) -> Self {
        let f = factor.max(1);
        Self::new(self.depth.div_ceil(f), self.height.div_ceil(f), self.width.div_ceil(f))
    }

    /// Extent with `axis` collapsed to 1
    pub fn flattened(&self, axis: usize) -> Self {
        let mut v = self.to_array();
        v[axis] = 1;
        Self::from_array(v)
    }
}

impl fmt::Display for Dims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.depth, self.height, self.width)
    }
}

/// Owned dense array of `depth x height x width x channels` values
///
/// Row-major with channels innermost. Allocated before reconstruction,
/// mutated in place by the projector and read afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseBuffer {
    dims: Dims,
    channels: usize,
    data: Vec<f32>,
}

impl DenseBuffer {
    /// Allocate a buffer with every value set to `background`
    pub fn new(dims: Dims, channels: usize, background: f32) -> Self {
        let channels = channels.max(1);
        Self {
            dims,
            channels,
            data: vec![background; dims.voxel_count() * channels],
        }
    }

    /// Single-channel zeroed buffer
    pub fn zeros(dims: Dims) -> Self {
        Self::new(dims, 1, 0.0)
    }

    pub fn dims(&self) -> Dims {
        self.dims
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Linear offset of the first channel of voxel `p` (caller checks bounds)
    pub fn offset(&self, p: UVec3) -> usize {
        let voxel = (p.x as usize * self.dims.height as usize + p.y as usize) * self.dims.width as usize
            + p.z as usize;
        voxel * self.channels
    }

    /// Check if a voxel lies inside the buffer
    pub fn in_bounds(&self, p: UVec3) -> bool {
        p.x < self.dims.depth && p.y < self.dims.height && p.z < self.dims.width
    }

    /// First channel at `(d, h, w)`
    pub fn get(&self, d: u32, h: u32, w: u32) -> Option<f32> {
        self.get_channels(d, h, w).map(|c| c[0])
    }

    /// All channels at `(d, h, w)`
    pub fn get_channels(&self, d: u32, h: u32, w: u32) -> Option<&[f32]> {
        let p = UVec3::new(d, h, w);
        if !self.in_bounds(p) {
            return None;
        }
        let o = self.offset(p);
        Some(&self.data[o..o + self.channels])
    }

    /// Set the first channel at `(d, h, w)`; returns false when out of bounds
    pub fn set(&mut self, d: u32, h: u32, w: u32, value: f32) -> bool {
        let p = UVec3::new(d, h, w);
        if !self.in_bounds(p) {
            return false;
        }
        let o = self.offset(p);
        self.data[o] = value;
        true
    }

    /// Minimum and maximum over all values, `None` for an empty buffer
    pub fn min_max(&self) -> Option<(f32, f32)> {
        self.data.iter().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Rescale into `[0, 1)` via `(v - min) / (max - min + epsilon)`
    pub fn normalize(&mut self, epsilon: f32) {
        let Some((lo, hi)) = self.min_max() else {
            return;
        };
        let scale = hi - lo + epsilon;
        for v in &mut self.data {
            *v = (*v - lo) / scale;
        }
    }

    /// Count values equal to `value` in the first channel
    pub fn count_equal(&self, value: f32) -> usize {
        self.data.iter().step_by(self.channels).filter(|v| **v == value).count()
    }

    /// Raw byte view for bit-identity comparisons
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}
