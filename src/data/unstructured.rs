//! Unstructured grids with heterogeneous cells.

use std::sync::Arc;

use crate::data::attributes::{DataSetAttributes, FieldData};
use crate::data::cell_array::CellArray;
use crate::data::cell_type::CellType;
use crate::data::points::{Bounds, Points};
use crate::data::scalar::IdType;
use crate::consistency::Consistent;
use crate::pipeline_error::{PipelineError, PipelineResult};

/// Explicit points plus a connectivity list with a parallel cell-type list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UnstructuredGrid {
    points: Points,
    cells: CellArray,
    cell_types: Arc<Vec<CellType>>,
    point_data: DataSetAttributes,
    cell_data: DataSetAttributes,
    field_data: FieldData,
}

impl UnstructuredGrid {
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

    /// Append a cell, checking the point count of fixed-size types.
    pub fn insert_next_cell(
        &mut self,
        cell_type: CellType,
        points: &[IdType],
    ) -> PipelineResult<usize> {
        let expected = cell_type.point_count();
        if expected.is_some_and(|n| n != points.len()) || points.len() < cell_type.min_points() {
            return Err(PipelineError::CellSizeMismatch {
                cell_type: cell_type.to_string(),
                expected: expected.unwrap_or(cell_type.min_points()),
                found: points.len(),
            });
        }
        Arc::make_mut(&mut self.cell_types).push(cell_type);
        Ok(self.cells.push_cell(points))
    }

    pub fn cell(&self, i: usize) -> Option<(CellType, &[IdType])> {
        Some((*self.cell_types.get(i)?, self.cells.cell(i)?))
    }

    pub fn cells(&self) -> &CellArray {
        &self.cells
    }

    pub fn cell_types(&self) -> &[CellType] {
        &self.cell_types
    }

    pub fn number_of_points(&self) -> usize {
        self.points.len()
    }

    pub fn number_of_cells(&self) -> usize {
        self.cells.number_of_cells()
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
            cells: self.cells.deep_copy(),
            cell_types: Arc::new(self.cell_types.as_ref().clone()),
            point_data: self.point_data.deep_copy(),
            cell_data: self.cell_data.deep_copy(),
            field_data: self.field_data.deep_copy(),
        }
    }

    pub fn memory_size(&self) -> usize {
        self.points.memory_size()
            + self.cells.memory_size()
            + self.cell_types.len()
            + self.point_data.memory_size()
            + self.cell_data.memory_size()
            + self.field_data.memory_size()
    }
}

impl Consistent for UnstructuredGrid {
    fn check_consistency(&self) -> Result<(), PipelineError> {
        if self.cell_types.len() != self.cells.number_of_cells() {
            return Err(PipelineError::InvalidCellArray(format!(
                "{} cell types for {} cells",
                self.cell_types.len(),
                self.cells.number_of_cells()
            )));
        }
        self.cells.check_points(self.number_of_points())?;
        if !self.point_data.is_empty() {
            self.point_data.check_tuples(self.number_of_points())?;
        }
        if !self.cell_data.is_empty() {
            self.cell_data.check_tuples(self.number_of_cells())?;
        }
        Ok(())
    }
}
