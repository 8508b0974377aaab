//! Explicit point coordinates.

use crate::data::array::DataArray;
use crate::data::scalar::ScalarType;
use crate::pipeline_error::{PipelineError, PipelineResult};

/// Axis-aligned bounds `[xmin, xmax, ymin, ymax, zmin, zmax]`.
pub type Bounds = [f64; 6];

/// Three-component floating-point coordinate array.
#[derive(Clone, Debug, PartialEq)]
pub struct Points(DataArray);

impl Default for Points {
    fn default() -> Self {
        Points(DataArray::with_type("Points", ScalarType::Float64, 3))
    }
}

impl Points {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a float32 or float64 array with three components.
    pub fn from_array(array: DataArray) -> PipelineResult<Self> {
        if array.number_of_components() != 3 {
            return Err(PipelineError::ComponentMismatch {
                name: array.name().to_owned(),
                len: array.len(),
                components: 3,
            });
        }
        if !array.scalar_type().is_floating_point() {
            return Err(PipelineError::ScalarTypeMismatch {
                expected: ScalarType::Float64,
                found: array.scalar_type(),
            });
        }
        Ok(Points(array))
    }

    pub fn from_coords(coords: &[[f64; 3]]) -> Self {
        let mut points = Points::default();
        for &p in coords {
            points.push(p);
        }
        points
    }

    pub fn len(&self) -> usize {
        self.0.number_of_tuples()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn point(&self, i: usize) -> Option<[f64; 3]> {
        Some([
            self.0.component(i, 0)?,
            self.0.component(i, 1)?,
            self.0.component(i, 2)?,
        ])
    }

    /// Append a point and return its id.
    pub fn push(&mut self, p: [f64; 3]) -> usize {
        let id = self.len();
        // a float array with three components always accepts three values
        let _ = self.0.push_tuple_f64(&p);
        id
    }

    pub fn iter(&self) -> impl Iterator<Item = [f64; 3]> + '_ {
        (0..self.len()).filter_map(|i| self.point(i))
    }

    /// Bounds of all points; cached with the array ranges.
    pub fn bounds(&self) -> Option<Bounds> {
        let x = self.0.range(0)?;
        let y = self.0.range(1)?;
        let z = self.0.range(2)?;
        Some([x.0, x.1, y.0, y.1, z.0, z.1])
    }

    pub fn data(&self) -> &DataArray {
        &self.0
    }

    pub fn deep_copy(&self) -> Self {
        Points(self.0.deep_copy())
    }

    pub fn shares_storage_with(&self, other: &Points) -> bool {
        self.0.shares_storage_with(&other.0)
    }

    pub fn extract(&self, ids: &[usize]) -> PipelineResult<Self> {
        Ok(Points(self.0.extract_tuples(ids)?))
    }

    pub fn memory_size(&self) -> usize {
        self.0.memory_size()
    }
}

/// Bounds of a set of corner points.
pub(crate) fn bounds_of(points: impl IntoIterator<Item = [f64; 3]>) -> Option<Bounds> {
    points.into_iter().fold(None, |acc: Option<Bounds>, p| {
        let mut b = acc.unwrap_or([p[0], p[0], p[1], p[1], p[2], p[2]]);
        for a in 0..3 {
            b[2 * a] = b[2 * a].min(p[a]);
            b[2 * a + 1] = b[2 * a + 1].max(p[a]);
        }
        Some(b)
    })
}
