//! Axis-aligned grids with per-axis coordinate arrays.

use crate::data::array::DataArray;
use crate::data::attributes::{DataSetAttributes, FieldData};
use crate::data::extent::Extent;
use crate::data::points::Bounds;
use crate::data::scalar::ScalarType;
use crate::consistency::Consistent;
use crate::pipeline_error::{PipelineError, PipelineResult};

/// Structured grid whose points are the tensor product of three coordinate lists.
#[derive(Clone, Debug, PartialEq)]
pub struct RectilinearGrid {
    extent: Extent,
    coordinates: [DataArray; 3],
    point_data: DataSetAttributes,
    cell_data: DataSetAttributes,
    field_data: FieldData,
}

impl Default for RectilinearGrid {
    fn default() -> Self {
        Self {
            extent: Extent::EMPTY,
            coordinates: ["XCoordinates", "YCoordinates", "ZCoordinates"]
                .map(|n| DataArray::with_type(n, ScalarType::Float64, 1)),
            point_data: DataSetAttributes::new(),
            cell_data: DataSetAttributes::new(),
            field_data: FieldData::new(),
        }
    }
}

impl RectilinearGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grid spanning `0..len-1` on each axis with the given coordinates.
    pub fn from_coordinates(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> PipelineResult<Self> {
        let mut grid = Self::new();
        grid.extent = Extent::from_dimensions([x.len(), y.len(), z.len()]);
        grid.coordinates = [
            DataArray::new("XCoordinates", 1, x)?,
            DataArray::new("YCoordinates", 1, y)?,
            DataArray::new("ZCoordinates", 1, z)?,
        ];
        Ok(grid)
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Set extent and coordinates together; each coordinate array must
    /// match the extent's point count on its axis.
    pub fn set_geometry(
        &mut self,
        extent: Extent,
        coordinates: [DataArray; 3],
    ) -> PipelineResult<()> {
        extent.validate()?;
        let dims = extent.dimensions();
        for (axis, array) in coordinates.iter().enumerate() {
            if array.number_of_tuples() != dims[axis] || array.number_of_components() != 1 {
                return Err(PipelineError::TupleCountMismatch {
                    name: array.name().to_owned(),
                    expected: dims[axis],
                    found: array.number_of_tuples(),
                });
            }
        }
        self.extent = extent;
        self.coordinates = coordinates;
        Ok(())
    }

    pub fn coordinates(&self, axis: usize) -> Option<&DataArray> {
        self.coordinates.get(axis)
    }

    pub fn number_of_points(&self) -> usize {
        self.extent.number_of_points()
    }

    pub fn number_of_cells(&self) -> usize {
        self.extent.number_of_cells()
    }

    pub fn point(&self, i: usize) -> Option<[f64; 3]> {
        if i >= self.number_of_points() {
            return None;
        }
        let ijk = self.extent.point_ijk(i);
        let mut p = [0.0; 3];
        for a in 0..3 {
            let local = (ijk[a] - self.extent.axis(a).0) as usize;
            p[a] = self.coordinates[a].component(local, 0)?;
        }
        Some(p)
    }

    pub fn bounds(&self) -> Option<Bounds> {
        if self.extent.is_empty() {
            return None;
        }
        let x = self.coordinates[0].range(0)?;
        let y = self.coordinates[1].range(0)?;
        let z = self.coordinates[2].range(0)?;
        Some([x.0, x.1, y.0, y.1, z.0, z.1])
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
            coordinates: self.coordinates.each_ref().map(DataArray::deep_copy),
            point_data: self.point_data.deep_copy(),
            cell_data: self.cell_data.deep_copy(),
            field_data: self.field_data.deep_copy(),
        }
    }

    pub fn memory_size(&self) -> usize {
        self.coordinates.iter().map(DataArray::memory_size).sum::<usize>()
            + self.point_data.memory_size()
            + self.cell_data.memory_size()
            + self.field_data.memory_size()
    }
}

impl Consistent for RectilinearGrid {
    fn check_consistency(&self) -> Result<(), PipelineError> {
        self.extent.validate()?;
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
    fn points_are_tensor_products() {
        let grid =
            RectilinearGrid::from_coordinates(vec![0.0, 1.0, 4.0], vec![-1.0, 1.0], vec![2.0])
                .unwrap();
        assert_eq!(grid.number_of_points(), 6);
        assert_eq!(grid.number_of_cells(), 2);
        assert_eq!(grid.point(5), Some([4.0, 1.0, 2.0]));
        assert_eq!(grid.bounds(), Some([0.0, 4.0, -1.0, 1.0, 2.0, 2.0]));
    }

    #[test]
    fn geometry_must_match_extent() {
        let mut grid = RectilinearGrid::new();
        let coords = [
            DataArray::new("x", 1, vec![0.0f64, 1.0]).unwrap(),
            DataArray::new("y", 1, vec![0.0f64]).unwrap(),
            DataArray::new("z", 1, vec![0.0f64]).unwrap(),
        ];
        assert!(grid.set_geometry(Extent::new(0, 2, 0, 0, 0, 0), coords.clone()).is_err());
        grid.set_geometry(Extent::new(0, 1, 0, 0, 0, 0), coords).unwrap();
        assert_eq!(grid.point(1), Some([1.0, 0.0, 0.0]));
    }
}
