//! Bit-index layout of a block's packed tree.
//!
//! Breadth-first numbering: bit 0 is the block root, bits 1..=8 its octants,
//! bits 9..=72 the level-2 cells and 73..=584 the level-3 voxels. Only the
//! first 73 bits are stored by the engine (split flags); level-3 indices are
//! implied by their parent.
//!
//! Child ordinal `c` inside a parent maps to the octant offset
//! `(d, h, w) = ((c >> 2) & 1, (c >> 1) & 1, c & 1)`, so width varies fastest.

use super::level::{Level, EXTENT_BY_LEVEL, MAX_LEVEL};

/// First bit index of each level
pub const LEVEL_FIRST_BIT: [u32; 4] = [0, 1, 9, 73];

/// Number of addressable node positions in one block (1 + 8 + 64 + 512)
pub const NODES_PER_BLOCK: u32 = 585;

/// Level of the node addressed by `bit`, or `None` past the finest level
pub fn level_of_bit(bit: u32) -> Option<u8> {
    match bit {
        0 => Some(0),
        1..=8 => Some(1),
        9..=72 => Some(2),
        73..=584 => Some(3),
        _ => None,
    }
}

/// Bit index of the first child of `bit`
pub fn child_bit(bit: u32) -> u32 {
    8 * bit + 1
}

/// Bit index of the parent of `bit` (root has none)
pub fn parent_bit(bit: u32) -> Option<u32> {
    (bit > 0).then(|| (bit - 1) / 8)
}

/// Octant offset of child ordinal `c` in units of the child's extent
fn octant(c: u32) -> [u32; 3] {
    [(c >> 2) & 1, (c >> 1) & 1, c & 1]
}

/// Voxel offset `(d, h, w)` of the node addressed by `bit` inside its block
pub fn sub_coord_of_bit(bit: u32) -> Option<[u32; 3]> {
    let mut level = level_of_bit(bit)?;
    let mut sub = [0u32; 3];
    let mut b = bit;
    while let Some(parent) = parent_bit(b) {
        let extent = EXTENT_BY_LEVEL[level as usize];
        let o = octant((b - 1) % 8);
        for axis in 0..3 {
            sub[axis] += o[axis] * extent;
        }
        b = parent;
        level -= 1;
    }
    Some(sub)
}

/// Bit index of the node at `sub` (voxel offset) on `level`
///
/// `sub` components must be below the block size; bits finer than the
/// level's extent are ignored.
pub fn bit_of_sub(sub: [u32; 3], level: Level) -> u32 {
    let mut bit = 0;
    for l in 1..=level.get().min(MAX_LEVEL) {
        let extent = EXTENT_BY_LEVEL[l as usize];
        let c = (((sub[0] / extent) & 1) << 2)
            | (((sub[1] / extent) & 1) << 1)
            | ((sub[2] / extent) & 1);
        bit = child_bit(bit) + c;
    }
    bit
}
