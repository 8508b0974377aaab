//! Ghost tagging for structured pieces.
//!
//! A piece owns the points of its owned extent except those on its upper
//! boundary, which belong to the neighbouring piece; points on the whole
//! extent's upper boundary stay with the last piece. A cell is owned when
//! its lower corner lies in the owned extent and strictly below its upper
//! boundary. Everything else in the (dilated) data extent is a ghost.

use crate::data::array::DataArray;
use crate::data::extent::Extent;
use crate::pipeline_error::PipelineResult;

/// Name of the ghost attribute array on point and cell data.
pub const GHOST_ARRAY_NAME: &str = "svtkGhostType";

/// Point is a copy of a point owned by another piece.
pub const DUPLICATE_POINT: u8 = 1;
/// Cell is a copy of a cell owned by another piece.
pub const DUPLICATE_CELL: u8 = 1;

fn point_owned_on_axis(p: i32, owned: (i32, i32), whole_hi: i32) -> bool {
    p >= owned.0 && (p < owned.1 || p == whole_hi)
}

fn cell_owned_on_axis(c: i32, owned: (i32, i32), flat: bool) -> bool {
    flat || (c >= owned.0 && c < owned.1)
}

/// Whether point `ijk` is owned by the piece with extent `owned`.
pub fn point_is_owned(ijk: [i32; 3], owned: &Extent, whole: &Extent) -> bool {
    !owned.is_empty()
        && (0..3).all(|a| point_owned_on_axis(ijk[a], owned.axis(a), whole.axis(a).1))
}

/// Whether the cell with lower corner `ijk` is owned by the piece with extent `owned`.
pub fn cell_is_owned(ijk: [i32; 3], owned: &Extent, whole: &Extent) -> bool {
    !owned.is_empty()
        && (0..3).all(|a| {
            let (wlo, whi) = whole.axis(a);
            cell_owned_on_axis(ijk[a], owned.axis(a), wlo == whi)
        })
}

/// Point ghost flags for every point of `data`.
pub fn point_ghost_array(
    data: &Extent,
    owned: &Extent,
    whole: &Extent,
) -> PipelineResult<DataArray> {
    let flags: Vec<u8> = (0..data.number_of_points())
        .map(|idx| {
            if point_is_owned(data.point_ijk(idx), owned, whole) {
                0
            } else {
                DUPLICATE_POINT
            }
        })
        .collect();
    DataArray::new(GHOST_ARRAY_NAME, 1, flags)
}

/// Cell ghost flags for every cell of `data`.
pub fn cell_ghost_array(
    data: &Extent,
    owned: &Extent,
    whole: &Extent,
) -> PipelineResult<DataArray> {
    let flags: Vec<u8> = (0..data.number_of_cells())
        .map(|idx| {
            if cell_is_owned(data.cell_ijk(idx), owned, whole) {
                0
            } else {
                DUPLICATE_CELL
            }
        })
        .collect();
    DataArray::new(GHOST_ARRAY_NAME, 1, flags)
}

/// True when entry `i` of a ghost array carries `flag`. Absent arrays mean no ghosts.
#[inline]
pub fn is_ghost(ghosts: Option<&DataArray>, i: usize, flag: u8) -> bool {
    ghosts
        .and_then(|g| g.as_slice::<u8>())
        .and_then(|g| g.get(i))
        .is_some_and(|&v| v & flag != 0)
}
