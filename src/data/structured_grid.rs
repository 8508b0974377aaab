//! Curvilinear structured grids.

use crate::data::attributes::{DataSetAttributes, FieldData};
use crate::data::extent::Extent;
use crate::data::points::{Bounds, Points};
use crate::consistency::Consistent;
use crate::pipeline_error::{PipelineError, PipelineResult};

/// Structured topology with explicit point coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StructuredGrid {
    extent: Extent,
    points: Points,
    point_data: DataSetAttributes,
    cell_data: DataSetAttributes,
    field_data: FieldData,
}

impl StructuredGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Set extent and points together; the point count must match the extent.
    pub fn set_geometry(&mut self, extent: Extent, points: Points) -> PipelineResult<()> {
        extent.validate()?;
        if points.len() != extent.number_of_points() {
            return Err(PipelineError::TupleCountMismatch {
                name: points.data().name().to_owned(),
                expected: extent.number_of_points(),
                found: points.len(),
            });
        }
        self.extent = extent;
        self.points = points;
        Ok(())
    }

    pub fn points(&self) -> &Points {
        &self.points
    }

    pub fn number_of_points(&self) -> usize {
        self.extent.number_of_points()
    }

    pub fn number_of_cells(&self) -> usize {
        self.extent.number_of_cells()
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
            extent: self.extent,
            points: self.points.deep_copy(),
            point_data: self.point_data.deep_copy(),
            cell_data: self.cell_data.deep_copy(),
            field_data: self.field_data.deep_copy(),
        }
    }

    pub fn memory_size(&self) -> usize {
        self.points.memory_size()
            + self.point_data.memory_size()
            + self.cell_data.memory_size()
            + self.field_data.memory_size()
    }
}

impl Consistent for StructuredGrid {
    fn check_consistency(&self) -> Result<(), PipelineError> {
        self.extent.validate()?;
        if self.points.len() != self.number_of_points() {
            return Err(PipelineError::TupleCountMismatch {
                name: "Points".into(),
                expected: self.number_of_points(),
                found: self.points.len(),
            });
        }
        if !self.point_data.is_empty() {
            self.point_data.check_tuples(self.number_of_points())?;
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
    fn point_count_must_match_extent() {
        let mut grid = StructuredGrid::new();
        let pts = Points::from_coords(&[[0.0, 0.0, 0.0], [1.0, 0.5, 0.0]]);
        assert!(grid.set_geometry(Extent::new(0, 2, 0, 0, 0, 0), pts.clone()).is_err());
        grid.set_geometry(Extent::new(0, 1, 0, 0, 0, 0), pts).unwrap();
        assert_eq!(grid.number_of_cells(), 1);
        assert_eq!(grid.bounds(), Some([0.0, 1.0, 0.0, 0.5, 0.0, 0.0]));
        assert!(grid.check_consistency().is_ok());
    }
}
