//! Axis-aligned voxel region covered by one octree node

use std::fmt;

use serde::{Deserialize, Serialize};

use super::buffer::Dims;
use crate::core::types::UVec3;
use crate::octree::level::Level;

/// Buffer axis, in `(depth, height, width)` order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Depth,
    Height,
    Width,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::Depth => 0,
            Axis::Height => 1,
            Axis::Width => 2,
        }
    }
}

/// Voxel box defined by its minimum corner and per-axis size
///
/// Vector components are `(x, y, z) = (depth, height, width)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlacementRegion {
    pub origin: UVec3,
    pub size: UVec3,
    pub level: Level,
}

impl PlacementRegion {
    /// Cube of the level's extent at `origin`
    pub fn new(origin: UVec3, level: Level) -> Self {
        Self {
            origin,
            size: UVec3::splat(level.extent()),
            level,
        }
    }

    /// Level's cell width (independent of any flattening)
    pub fn extent(&self) -> u32 {
        self.level.extent()
    }

    /// Exclusive maximum corner, saturating at `u32::MAX`
    pub fn end(&self) -> UVec3 {
        self.origin.saturating_add(self.size)
    }

    /// Number of voxels covered
    pub fn voxel_count(&self) -> usize {
        self.size.x as usize * self.size.y as usize * self.size.z as usize
    }

    /// Check if the whole region lies inside `dims`
    pub fn fits_within(&self, dims: Dims) -> bool {
        let (origin, size) = (self.origin.to_array(), self.size.to_array());
        dims.to_array()
            .into_iter()
            .zip(origin.into_iter().zip(size))
            .all(|(limit, (o, s))| s <= limit && o <= limit - s)
    }

    /// Same node addressed in a buffer with one cell per node of its level
    pub fn at_level_resolution(&self) -> PlacementRegion {
        let e = self.extent();
        PlacementRegion {
            origin: self.origin / e,
            size: (self.size / e).max(UVec3::ONE),
            level: self.level,
        }
    }

    /// Region collapsed onto the plane orthogonal to `axis`
    pub fn flattened(&self, axis: Axis) -> PlacementRegion {
        let mut origin = self.origin.to_array();
        let mut size = self.size.to_array();
        origin[axis.index()] = 0;
        size[axis.index()] = 1;
        PlacementRegion {
            origin: UVec3::from_array(origin),
            size: UVec3::from_array(size),
            level: self.level,
        }
    }

    /// Iterate covered voxels, width fastest
    pub fn voxels(&self) -> impl Iterator<Item = UVec3> + '_ {
        let (o, e) = (self.origin, self.end());
        (o.x..e.x).flat_map(move |d| {
            (o.y..e.y).flat_map(move |h| (o.z..e.z).map(move |w| UVec3::new(d, h, w)))
        })
    }
}

impl fmt::Display for PlacementRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self.end();
        write!(
            f,
            "[d {}..{}, h {}..{}, w {}..{}] @ level {}",
            self.origin.x, end.x, self.origin.y, end.y, self.origin.z, end.z, self.level.get()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn level(l: u8) -> Level {
        Level::new(l).unwrap()
    }

    #[test]
    fn test_voxel_count_by_level() {
        assert_eq!(PlacementRegion::new(UVec3::ZERO, level(0)).voxel_count(), 512);
        assert_eq!(PlacementRegion::new(UVec3::ZERO, level(1)).voxel_count(), 64);
        assert_eq!(PlacementRegion::new(UVec3::ZERO, level(2)).voxel_count(), 8);
        assert_eq!(PlacementRegion::new(UVec3::ZERO, level(3)).voxel_count(), 1);
    }

    #[test]
    fn test_voxels_half_open() {
        let r = PlacementRegion::new(UVec3::new(4, 4, 4), level(1));
        let voxels: Vec<UVec3> = r.voxels().collect();
        assert_eq!(voxels.len(), 64);
        assert_eq!(voxels.first(), Some(&UVec3::new(4, 4, 4)));
        assert_eq!(voxels.last(), Some(&UVec3::new(7, 7, 7)));
        assert_eq!(voxels[1], UVec3::new(4, 4, 5));
    }

    #[test]
    fn test_sibling_regions_disjoint() {
        let a: HashSet<UVec3> = PlacementRegion::new(UVec3::new(0, 0, 0), level(1)).voxels().collect();
        let b: HashSet<UVec3> = PlacementRegion::new(UVec3::new(0, 0, 4), level(1)).voxels().collect();
        let inner: HashSet<UVec3> = PlacementRegion::new(UVec3::new(2, 2, 2), level(2)).voxels().collect();
        assert!(a.is_disjoint(&b));
        assert!(inner.is_subset(&a));
    }

    #[test]
    fn test_fits_within() {
        let r = PlacementRegion::new(UVec3::new(8, 0, 0), level(0));
        assert!(r.fits_within(Dims::new(16, 8, 8)));
        assert!(!r.fits_within(Dims::new(8, 8, 8)));
        assert!(!PlacementRegion::new(UVec3::ZERO, level(0)).fits_within(Dims::new(4, 8, 8)));
    }

    #[test]
    fn test_origin_near_u32_max() {
        let r = PlacementRegion::new(UVec3::new(u32::MAX - 2, 0, 0), level(0));
        assert!(!r.fits_within(Dims::new(u32::MAX, 8, 8)));
        assert!(!r.fits_within(Dims::cube(8)));
        assert_eq!(r.end(), UVec3::new(u32::MAX, 8, 8));
    }

    #[test]
    fn test_level_resolution() {
        let r = PlacementRegion::new(UVec3::new(12, 4, 8), level(1));
        let cell = r.at_level_resolution();
        assert_eq!(cell.origin, UVec3::new(3, 1, 2));
        assert_eq!(cell.voxel_count(), 1);
    }

    #[test]
    fn test_flattened() {
        let r = PlacementRegion::new(UVec3::new(8, 2, 4), level(2)).flattened(Axis::Width);
        assert_eq!(r.origin, UVec3::new(8, 2, 0));
        assert_eq!(r.size, UVec3::new(2, 2, 1));
        assert_eq!(r.voxels().count(), 4);
    }
}
