//! Piece-to-extent translation for structured data.
//!
//! The split is a pure function of the whole extent, the piece index, the
//! piece count and the split mode. Each step halves the piece count and
//! cuts the chosen axis at `lo + size * (n / 2) / n`; the two halves share
//! the points on the cut.

use serde::{Deserialize, Serialize};

use crate::data::extent::Extent;

/// Axis selection strategy for [`piece_extent`].
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum SplitMode {
    /// Bisect the longest axis, z winning ties, then y.
    #[default]
    Block,
    /// Split x while it has more than one cell, then fall back to block mode.
    XSlab,
    YSlab,
    ZSlab,
}

impl SplitMode {
    fn slab_axis(self) -> Option<usize> {
        match self {
            SplitMode::Block => None,
            SplitMode::XSlab => Some(0),
            SplitMode::YSlab => Some(1),
            SplitMode::ZSlab => Some(2),
        }
    }

    fn choose_axis(self, size: [i64; 3]) -> Option<usize> {
        if let Some(axis) = self.slab_axis() {
            if size[axis] > 1 {
                return Some(axis);
            }
        }
        if size[2] >= size[1] && size[2] >= size[0] && size[2] / 2 >= 1 {
            Some(2)
        } else if size[1] >= size[0] && size[1] / 2 >= 1 {
            Some(1)
        } else if size[0] / 2 >= 1 {
            Some(0)
        } else {
            None
        }
    }
}

/// Sub-extent of `whole` owned by `piece` out of `pieces`.
///
/// Returns [`Extent::EMPTY`] for an out-of-range piece and for pieces left
/// over once no axis can be split further.
pub fn piece_extent(whole: &Extent, piece: i32, pieces: i32, mode: SplitMode) -> Extent {
    if pieces < 1 || piece < 0 || piece >= pieces {
        return Extent::EMPTY;
    }
    if whole.is_empty() {
        return if piece == 0 { *whole } else { Extent::EMPTY };
    }
    let mut ext = *whole;
    let (mut piece, mut pieces) = (piece as i64, pieces as i64);
    while pieces > 1 {
        let size = [0, 1, 2].map(|a| {
            let (lo, hi) = ext.axis(a);
            hi as i64 - lo as i64
        });
        let Some(axis) = mode.choose_axis(size) else {
            if piece == 0 {
                break;
            }
            return Extent::EMPTY;
        };
        let first_half = pieces / 2;
        let (lo, hi) = ext.axis(axis);
        let mid = (lo as i64 + size[axis] * first_half / pieces) as i32;
        if piece < first_half {
            ext.set_axis(axis, lo, mid);
            pieces = first_half;
        } else {
            ext.set_axis(axis, mid, hi);
            pieces -= first_half;
            piece -= first_half;
        }
    }
    ext
}

/// [`piece_extent`] dilated by `ghost_levels` layers, clamped to `whole`.
pub fn piece_extent_with_ghosts(
    whole: &Extent,
    piece: i32,
    pieces: i32,
    ghost_levels: i32,
    mode: SplitMode,
) -> Extent {
    let owned = piece_extent(whole, piece, pieces, mode);
    if owned.is_empty() || ghost_levels <= 0 {
        owned
    } else {
        owned.dilate(ghost_levels, whole)
    }
}
