//! Dense region projection.
//!
//! One generic routine writes a value over every voxel of a region. A level-0
//! node expands to an 8x8x8 write, level 1 to 4x4x4, level 2 to 2x2x2 and
//! level 3 to a single voxel.

use super::buffer::DenseBuffer;
use super::policy::MergePolicy;
use super::region::PlacementRegion;
use crate::core::types::UVec3;
use crate::core::{Error, Result};

/// Per-channel value after broadcasting or reduction
#[derive(Clone, Copy)]
enum Resolved<'a> {
    Channels(&'a [f32]),
    Scalar(f32),
}

impl Resolved<'_> {
    fn at(&self, c: usize) -> f32 {
        match self {
            Resolved::Channels(v) => v[c],
            Resolved::Scalar(v) => *v,
        }
    }
}

fn mean(values: &[f32]) -> f32 {
    values.iter().sum::<f32>() / values.len() as f32
}

/// Match `value` to the buffer's channel count for `policy`
fn resolve<'a>(value: &'a [f32], channels: usize, policy: &MergePolicy) -> Result<Resolved<'a>> {
    let mismatch = || Error::ChannelMismatch { expected: channels, got: value.len() };
    match (policy, value.len()) {
        (_, 0) => Err(mismatch()),
        (_, n) if n == channels => Ok(Resolved::Channels(value)),
        (MergePolicy::Average, _) if channels == 1 => Ok(Resolved::Scalar(mean(value))),
        (MergePolicy::Overwrite | MergePolicy::TakeMax | MergePolicy::Average, 1) => {
            Ok(Resolved::Scalar(value[0]))
        }
        _ => Err(mismatch()),
    }
}

/// Merge `value` into every voxel of `region` under `policy`
///
/// The region is bounds-checked before anything is written. Returns the
/// number of voxels touched (0 when a classifying policy rejects the value).
pub fn project(
    buffer: &mut DenseBuffer,
    region: &PlacementRegion,
    value: &[f32],
    policy: &MergePolicy,
) -> Result<usize> {
    if !region.fits_within(buffer.dims()) {
        return Err(Error::RegionOutOfBounds { region: *region, dims: buffer.dims() });
    }

    if let MergePolicy::ThresholdClassify(band) = policy {
        let v = *value.first().ok_or(Error::ChannelMismatch { expected: 1, got: 0 })?;
        if !band.contains(v) {
            return Ok(0);
        }
        return Ok(write_region(buffer, region, Resolved::Scalar(1.0), false));
    }

    let resolved = resolve(value, buffer.channels(), policy)?;
    Ok(write_region(buffer, region, resolved, matches!(policy, MergePolicy::TakeMax)))
}

/// Unconditionally assign `value` over `region`
pub fn fill_region(buffer: &mut DenseBuffer, region: &PlacementRegion, value: &[f32]) -> Result<usize> {
    project(buffer, region, value, &MergePolicy::Overwrite)
}

/// Row-wise write of an already bounds-checked region
fn write_region(buffer: &mut DenseBuffer, region: &PlacementRegion, value: Resolved<'_>, take_max: bool) -> usize {
    let channels = buffer.channels();
    let (o, end) = (region.origin, region.end());
    let row_len = region.size.z as usize * channels;

    for d in o.x..end.x {
        for h in o.y..end.y {
            let start = buffer.offset(UVec3::new(d, h, o.z));
            let row = &mut buffer.data_mut()[start..start + row_len];
            for (i, slot) in row.iter_mut().enumerate() {
                let v = value.at(i % channels);
                *slot = if take_max { slot.max(v) } else { v };
            }
        }
    }

    region.voxel_count()
}
