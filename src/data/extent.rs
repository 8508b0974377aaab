//! Structured index boxes.

use std::fmt;
use std::ops::Index;

use crate::pipeline_error::{PipelineError, PipelineResult};

/// Inclusive structured index box `(i0, i1, j0, j1, k0, k1)`.
///
/// An axis with `hi == lo - 1` holds no points; any such axis makes the
/// whole extent empty. `hi < lo - 1` is invalid.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Extent(pub [i32; 6]);

impl Default for Extent {
    fn default() -> Self {
        Extent::EMPTY
    }
}

impl Extent {
    /// The canonical empty extent.
    pub const EMPTY: Extent = Extent([0, -1, 0, -1, 0, -1]);

    pub const fn new(i0: i32, i1: i32, j0: i32, j1: i32, k0: i32, k1: i32) -> Self {
        Extent([i0, i1, j0, j1, k0, k1])
    }

    /// Extent `0..n-1` on each axis.
    pub fn from_dimensions(dims: [usize; 3]) -> Self {
        let hi = |n: usize| n as i32 - 1;
        Extent([0, hi(dims[0]), 0, hi(dims[1]), 0, hi(dims[2])])
    }

    /// `(lo, hi)` of axis `a` (0 = i, 1 = j, 2 = k).
    #[inline]
    pub fn axis(&self, a: usize) -> (i32, i32) {
        (self.0[2 * a], self.0[2 * a + 1])
    }

    #[inline]
    pub fn set_axis(&mut self, a: usize, lo: i32, hi: i32) {
        self.0[2 * a] = lo;
        self.0[2 * a + 1] = hi;
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|a| {
            let (lo, hi) = self.axis(a);
            hi < lo
        })
    }

    pub fn is_valid(&self) -> bool {
        (0..3).all(|a| {
            let (lo, hi) = self.axis(a);
            hi >= lo - 1
        })
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(PipelineError::InvalidExtent(*self))
        }
    }

    /// Point count along each axis; all zero when empty.
    pub fn dimensions(&self) -> [usize; 3] {
        if self.is_empty() {
            return [0; 3];
        }
        let d = |a: usize| {
            let (lo, hi) = self.axis(a);
            (hi - lo + 1) as usize
        };
        [d(0), d(1), d(2)]
    }

    pub fn number_of_points(&self) -> usize {
        self.dimensions().iter().product()
    }

    /// Cell count along each axis. A flat axis contributes one layer.
    pub fn cell_dimensions(&self) -> [usize; 3] {
        let dims = self.dimensions();
        if dims.contains(&0) {
            return [0; 3];
        }
        dims.map(|d| if d > 1 { d - 1 } else { 1 })
    }

    /// Cells spanned by the points; a single point is one vertex cell.
    pub fn number_of_cells(&self) -> usize {
        self.cell_dimensions().iter().product()
    }

    /// Number of axes with more than one point.
    pub fn data_dimension(&self) -> usize {
        self.dimensions().iter().filter(|&&d| d > 1).count()
    }

    /// True when `other` lies inside `self`. The empty extent is inside everything.
    pub fn contains(&self, other: &Extent) -> bool {
        if other.is_empty() {
            return true;
        }
        (0..3).all(|a| {
            let (lo, hi) = self.axis(a);
            let (olo, ohi) = other.axis(a);
            olo >= lo && ohi <= hi
        })
    }

    pub fn contains_point(&self, ijk: [i32; 3]) -> bool {
        (0..3).all(|a| {
            let (lo, hi) = self.axis(a);
            ijk[a] >= lo && ijk[a] <= hi
        })
    }

    /// Overlap of two extents; [`Extent::EMPTY`] when disjoint.
    pub fn intersect(&self, other: &Extent) -> Extent {
        let mut out = Extent::EMPTY;
        for a in 0..3 {
            let (lo, hi) = self.axis(a);
            let (olo, ohi) = other.axis(a);
            out.set_axis(a, lo.max(olo), hi.min(ohi));
        }
        if out.is_empty() { Extent::EMPTY } else { out }
    }

    /// Smallest extent containing both.
    pub fn union(&self, other: &Extent) -> Extent {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let mut out = *self;
        for a in 0..3 {
            let (lo, hi) = self.axis(a);
            let (olo, ohi) = other.axis(a);
            out.set_axis(a, lo.min(olo), hi.max(ohi));
        }
        out
    }

    /// Grow by `levels` on both sides of every axis, clamped to `whole`.
    pub fn dilate(&self, levels: i32, whole: &Extent) -> Extent {
        if self.is_empty() || levels <= 0 {
            return *self;
        }
        let mut out = *self;
        for a in 0..3 {
            let (lo, hi) = self.axis(a);
            let (wlo, whi) = whole.axis(a);
            out.set_axis(a, (lo - levels).max(wlo), (hi + levels).min(whi));
        }
        out
    }

    /// Linear index of point `ijk` with `i` varying fastest.
    #[inline]
    pub fn point_index(&self, ijk: [i32; 3]) -> usize {
        let [nx, ny, _] = self.dimensions();
        let i = (ijk[0] - self.0[0]) as usize;
        let j = (ijk[1] - self.0[2]) as usize;
        let k = (ijk[2] - self.0[4]) as usize;
        i + nx * (j + ny * k)
    }

    /// Structured coordinates of the point with linear index `index`.
    #[inline]
    pub fn point_ijk(&self, index: usize) -> [i32; 3] {
        let [nx, ny, _] = self.dimensions();
        let i = index % nx;
        let j = (index / nx) % ny;
        let k = index / (nx * ny);
        [self.0[0] + i as i32, self.0[2] + j as i32, self.0[4] + k as i32]
    }

    /// Linear index of the cell whose lower corner is `ijk`.
    #[inline]
    pub fn cell_index(&self, ijk: [i32; 3]) -> usize {
        let [cx, cy, _] = self.cell_dimensions();
        let i = (ijk[0] - self.0[0]) as usize;
        let j = (ijk[1] - self.0[2]) as usize;
        let k = (ijk[2] - self.0[4]) as usize;
        i + cx * (j + cy * k)
    }

    /// Lower-corner point coordinates of the cell with linear index `index`.
    #[inline]
    pub fn cell_ijk(&self, index: usize) -> [i32; 3] {
        let [cx, cy, _] = self.cell_dimensions();
        let i = index % cx;
        let j = (index / cx) % cy;
        let k = index / (cx * cy);
        [self.0[0] + i as i32, self.0[2] + j as i32, self.0[4] + k as i32]
    }

    pub fn as_array(&self) -> [i32; 6] {
        self.0
    }
}

impl From<[i32; 6]> for Extent {
    fn from(e: [i32; 6]) -> Self {
        Extent(e)
    }
}

impl Index<usize> for Extent {
    type Output = i32;

    fn index(&self, i: usize) -> &i32 {
        &self.0[i]
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [i0, i1, j0, j1, k0, k1] = self.0;
        write!(f, "[{i0}, {i1}, {j0}, {j1}, {k0}, {k1}]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_follow_structured_rules() {
        let e = Extent::new(0, 9, 0, 9, 0, 9);
        assert_eq!(e.number_of_points(), 1000);
        assert_eq!(e.number_of_cells(), 729);
        let plane = Extent::new(0, 4, 0, 3, 2, 2);
        assert_eq!(plane.number_of_cells(), 12);
        assert_eq!(plane.data_dimension(), 2);
        assert_eq!(Extent::new(3, 3, 3, 3, 3, 3).number_of_cells(), 1);
        assert_eq!(Extent::EMPTY.number_of_points(), 0);
        assert_eq!(Extent::EMPTY.number_of_cells(), 0);
    }

    #[test]
    fn emptiness_and_validity() {
        assert!(Extent::EMPTY.is_empty());
        assert!(Extent::EMPTY.is_valid());
        assert!(Extent::new(0, 5, 0, -1, 0, 5).is_empty());
        assert!(!Extent::new(0, 5, 0, -2, 0, 5).is_valid());
        assert!(Extent::new(0, 5, 0, -2, 0, 5).validate().is_err());
    }

    #[test]
    fn intersect_union_dilate() {
        let whole = Extent::new(0, 9, 0, 9, 0, 0);
        let a = Extent::new(0, 4, 0, 9, 0, 0);
        let b = Extent::new(3, 9, 5, 9, 0, 0);
        assert_eq!(a.intersect(&b), Extent::new(3, 4, 5, 9, 0, 0));
        assert_eq!(a.union(&b), whole);
        assert_eq!(a.intersect(&Extent::new(6, 9, 0, 9, 0, 0)), Extent::EMPTY);
        assert_eq!(a.dilate(2, &whole), Extent::new(0, 6, 0, 9, 0, 0));
        assert!(whole.contains(&a));
        assert!(!a.contains(&b));
        assert!(a.contains(&Extent::EMPTY));
    }

    #[test]
    fn linear_indices_round_trip() {
        let e = Extent::new(2, 5, -1, 1, 4, 6);
        for idx in 0..e.number_of_points() {
            assert_eq!(e.point_index(e.point_ijk(idx)), idx);
        }
        for idx in 0..e.number_of_cells() {
            assert_eq!(e.cell_index(e.cell_ijk(idx)), idx);
        }
        assert_eq!(e.point_ijk(0), [2, -1, 4]);
        assert_eq!(e.to_string(), "[2, 5, -1, 1, 4, 6]");
    }
}
