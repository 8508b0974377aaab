//! Polygonal data: vertices, lines, polygons and triangle strips.

use crate::data::attributes::{DataSetAttributes, FieldData};
use crate::data::cell_array::CellArray;
use crate::data::points::{Bounds, Points};
use crate::consistency::Consistent;
use crate::pipeline_error::PipelineError;

/// Surface mesh with four independent cell lists.
///
/// Cell ids run through vertices, then lines, then polygons, then strips;
/// cell data follows that order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PolyData {
    points: Points,
    verts: CellArray,
    lines: CellArray,
    polys: CellArray,
    strips: CellArray,
    point_data: DataSetAttributes,
    cell_data: DataSetAttributes,
    field_data: FieldData,
}

impl PolyData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &Points {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut Points {
        &mut self.points
    }

    pub fn set_points(&mut self, points: Points) {
        self.points = points;
    }

    pub fn verts(&self) -> &CellArray {
        &self.verts
    }

    pub fn lines(&self) -> &CellArray {
        &self.lines
    }

    pub fn polys(&self) -> &CellArray {
        &self.polys
    }

    pub fn strips(&self) -> &CellArray {
        &self.strips
    }

    pub fn verts_mut(&mut self) -> &mut CellArray {
        &mut self.verts
    }

    pub fn lines_mut(&mut self) -> &mut CellArray {
        &mut self.lines
    }

    pub fn polys_mut(&mut self) -> &mut CellArray {
        &mut self.polys
    }

    pub fn strips_mut(&mut self) -> &mut CellArray {
        &mut self.strips
    }

    pub fn set_verts(&mut self, cells: CellArray) {
        self.verts = cells;
    }

    pub fn set_lines(&mut self, cells: CellArray) {
        self.lines = cells;
    }

    pub fn set_polys(&mut self, cells: CellArray) {
        self.polys = cells;
    }

    pub fn set_strips(&mut self, cells: CellArray) {
        self.strips = cells;
    }

    pub fn number_of_points(&self) -> usize {
        self.points.len()
    }

    pub fn number_of_cells(&self) -> usize {
        self.cell_arrays().iter().map(|c| c.number_of_cells()).sum()
    }

    fn cell_arrays(&self) -> [&CellArray; 4] {
        [&self.verts, &self.lines, &self.polys, &self.strips]
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.points.bounds()
    }

    pub fn point_data(&self) -> &DataSetAttributes {
        &self.point_data
    }

    pub fn point_data_mut(&mut self) -> &mut DataSetAttributes {
        &mut self.point_data
    }

    pub fn cell_data(&self) -> &DataSetAttributes {
        &self.cell_data
    }

    pub fn cell_data_mut(&mut self) -> &mut DataSetAttributes {
        &mut self.cell_data
    }

    pub fn field_data(&self) -> &FieldData {
        &self.field_data
    }

    pub fn field_data_mut(&mut self) -> &mut FieldData {
        &mut self.field_data
    }

    pub fn empty_like(&self) -> Self {
        Self {
            point_data: self.point_data.empty_like(),
            cell_data: self.cell_data.empty_like(),
            ..Self::default()
        }
    }

    pub fn deep_copy(&self) -> Self {
        Self {
            points: self.points.deep_copy(),
            verts: self.verts.deep_copy(),
            lines: self.lines.deep_copy(),
            polys: self.polys.deep_copy(),
            strips: self.strips.deep_copy(),
            point_data: self.point_data.deep_copy(),
            cell_data: self.cell_data.deep_copy(),
            field_data: self.field_data.deep_copy(),
        }
    }

    pub fn memory_size(&self) -> usize {
        self.points.memory_size()
            + self.cell_arrays().iter().map(|c| c.memory_size()).sum::<usize>()
            + self.point_data.memory_size()
            + self.cell_data.memory_size()
            + self.field_data.memory_size()
    }
}

impl Consistent for PolyData {
    fn check_consistency(&self) -> Result<(), PipelineError> {
        let n = self.number_of_points();
        for cells in self.cell_arrays() {
            cells.check_points(n)?;
        }
        if !self.point_data.is_empty() {
            self.point_data.check_tuples(n)?;
        }
        if !self.cell_data.is_empty() {
            self.cell_data.check_tuples(self.number_of_cells())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_count_across_all_lists() {
        let mut poly = PolyData::new();
        poly.set_points(Points::from_coords(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
        ]));
        poly.verts_mut().push_cell(&[0]);
        poly.lines_mut().push_cell(&[0, 1]);
        poly.polys_mut().push_cell(&[0, 1, 2]);
        assert_eq!(poly.number_of_cells(), 3);
        assert!(poly.check_consistency().is_ok());
        poly.polys_mut().push_cell(&[0, 1, 3]);
        assert!(matches!(
            poly.check_consistency(),
            Err(PipelineError::CellPointOutOfRange { point: 3, .. })
        ));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "[consistency]")]
    fn dangling_cells_fail_the_assertion() {
        let mut poly = PolyData::new();
        poly.set_points(Points::from_coords(&[[0.0; 3]]));
        poly.lines_mut().push_cell(&[0, 4]);
        poly.assert_consistent();
    }

    #[test]
    fn deep_copy_detaches_topology() {
        let mut poly = PolyData::new();
        poly.set_points(Points::from_coords(&[[0.0; 3], [1.0; 3]]));
        poly.lines_mut().push_cell(&[0, 1]);
        let copy = poly.deep_copy();
        assert_eq!(copy, poly);
        assert!(!copy.lines().shares_storage_with(poly.lines()));
        assert!(!copy.points().shares_storage_with(poly.points()));
    }
}
