//! Elevation scalars along a line segment.

use serde::{Deserialize, Serialize};

use crate::data::array::DataArray;
use crate::data::attributes::AttributeRole;
use crate::data::object::DataObjectType;
use crate::information::{Information, keys};
use crate::pipeline::{Algorithm, RequestContext};
use crate::pipeline_error::PipelineResult;

/// Projects every point onto the segment `low_point -> high_point` and
/// stores the clamped position, mapped into `scalar_range`, as the active
/// `Elevation` scalars. Geometry and other arrays are shared with the input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElevationFilter {
    pub low_point: [f64; 3],
    pub high_point: [f64; 3],
    pub scalar_range: [f64; 2],
}

impl Default for ElevationFilter {
    fn default() -> Self {
        Self {
            low_point: [0.0; 3],
            high_point: [0.0, 0.0, 1.0],
            scalar_range: [0.0, 1.0],
        }
    }
}

impl ElevationFilter {
    pub fn new(low_point: [f64; 3], high_point: [f64; 3]) -> Self {
        Self {
            low_point,
            high_point,
            ..Self::default()
        }
    }

    pub fn elevation(&self, p: [f64; 3]) -> f64 {
        let dir: [f64; 3] = std::array::from_fn(|a| self.high_point[a] - self.low_point[a]);
        let len2: f64 = dir.iter().map(|d| d * d).sum();
        let s = if len2 > 0.0 {
            let dot: f64 = (0..3).map(|a| (p[a] - self.low_point[a]) * dir[a]).sum();
            (dot / len2).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let [lo, hi] = self.scalar_range;
        lo + s * (hi - lo)
    }
}

impl Algorithm for ElevationFilter {
    fn class_name(&self) -> &'static str {
        "ElevationFilter"
    }

    fn fill_input_port_information(&self, _port: usize, info: &mut Information) {
        info.set(keys::INPUT_REQUIRED_DATA_TYPE, vec![DataObjectType::DataSet]);
    }

    fn request_data(&mut self, ctx: &mut RequestContext) -> PipelineResult<()> {
        let input = ctx.require_input(0)?;
        let mut output = input.shallow_copy();
        let values: Vec<f64> = (0..input.number_of_points())
            .map(|i| input.point(i).map_or(f64::NAN, |p| self.elevation(p)))
            .collect();
        let elevation = DataArray::new("Elevation", 1, values)?;
        if let Some(pd) = output.point_data_mut() {
            pd.add_active(AttributeRole::Scalars, elevation)?;
        }
        ctx.set_output(0, output);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_is_clamped_to_the_segment() {
        let f = ElevationFilter {
            scalar_range: [10.0, 20.0],
            ..ElevationFilter::new([0.0; 3], [0.0, 0.0, 2.0])
        };
        assert_eq!(f.elevation([5.0, 5.0, 1.0]), 15.0);
        assert_eq!(f.elevation([0.0, 0.0, -4.0]), 10.0);
        assert_eq!(f.elevation([0.0, 0.0, 9.0]), 20.0);
    }
}
