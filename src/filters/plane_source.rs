//! Quad-grid plane source.

use serde::{Deserialize, Serialize};

use crate::data::array::DataArray;
use crate::data::attributes::AttributeRole;
use crate::data::cell_array::CellArray;
use crate::data::object::DataObjectType;
use crate::data::points::Points;
use crate::data::poly::PolyData;
use crate::data::scalar::IdType;
use crate::information::{Information, keys};
use crate::pipeline::{Algorithm, RequestContext};
use crate::pipeline_error::PipelineResult;

/// Parallelogram spanned by `origin -> point1` and `origin -> point2`,
/// tessellated into `x_resolution × y_resolution` quads with active normals
/// and texture coordinates.
///
/// The source cannot split its output, so only piece 0 of a multi-piece
/// request receives geometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaneSource {
    pub origin: [f64; 3],
    pub point1: [f64; 3],
    pub point2: [f64; 3],
    pub x_resolution: usize,
    pub y_resolution: usize,
}

impl Default for PlaneSource {
    fn default() -> Self {
        Self {
            origin: [-0.5, -0.5, 0.0],
            point1: [0.5, -0.5, 0.0],
            point2: [-0.5, 0.5, 0.0],
            x_resolution: 1,
            y_resolution: 1,
        }
    }
}

impl PlaneSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolution(x_resolution: usize, y_resolution: usize) -> Self {
        Self {
            x_resolution,
            y_resolution,
            ..Self::default()
        }
    }

    /// Unit normal of the plane.
    pub fn normal(&self) -> [f64; 3] {
        let u: [f64; 3] = std::array::from_fn(|a| self.point1[a] - self.origin[a]);
        let v: [f64; 3] = std::array::from_fn(|a| self.point2[a] - self.origin[a]);
        let n = [
            u[1] * v[2] - u[2] * v[1],
            u[2] * v[0] - u[0] * v[2],
            u[0] * v[1] - u[1] * v[0],
        ];
        let len = n.iter().map(|c| c * c).sum::<f64>().sqrt();
        if len > 0.0 { n.map(|c| c / len) } else { [0.0, 0.0, 1.0] }
    }

    fn build(&self) -> PipelineResult<PolyData> {
        let (nx, ny) = (self.x_resolution.max(1), self.y_resolution.max(1));
        let normal = self.normal();
        let mut points = Points::new();
        let mut normals = Vec::with_capacity(3 * (nx + 1) * (ny + 1));
        let mut tcoords = Vec::with_capacity(2 * (nx + 1) * (ny + 1));
        for j in 0..=ny {
            let t = j as f64 / ny as f64;
            for i in 0..=nx {
                let s = i as f64 / nx as f64;
                points.push(std::array::from_fn(|a| {
                    self.origin[a]
                        + s * (self.point1[a] - self.origin[a])
                        + t * (self.point2[a] - self.origin[a])
                }));
                normals.extend(normal);
                tcoords.extend([s, t]);
            }
        }
        let mut polys = CellArray::new();
        let row = (nx + 1) as IdType;
        for j in 0..ny as IdType {
            for i in 0..nx as IdType {
                let p = i + j * row;
                polys.push_cell(&[p, p + 1, p + row + 1, p + row]);
            }
        }
        let mut poly = PolyData::new();
        poly.set_points(points);
        poly.set_polys(polys);
        let pd = poly.point_data_mut();
        pd.add_active(AttributeRole::Normals, DataArray::new("Normals", 3, normals)?)?;
        pd.add_active(
            AttributeRole::TCoords,
            DataArray::new("TextureCoordinates", 2, tcoords)?,
        )?;
        Ok(poly)
    }
}

impl Algorithm for PlaneSource {
    fn class_name(&self) -> &'static str {
        "PlaneSource"
    }

    fn number_of_input_ports(&self) -> usize {
        0
    }

    fn fill_output_port_information(&self, _port: usize, info: &mut Information) {
        info.set(keys::DATA_TYPE_NAME, DataObjectType::PolyData);
    }

    fn request_data(&mut self, ctx: &mut RequestContext) -> PipelineResult<()> {
        let poly = self.build()?;
        ctx.set_output(0, poly.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_counts_follow_resolution() {
        let poly = PlaneSource::with_resolution(3, 2).build().unwrap();
        assert_eq!(poly.number_of_points(), 12);
        assert_eq!(poly.polys().number_of_cells(), 6);
        assert_eq!(poly.point_data().normals().unwrap().tuple_f64(5).unwrap(), vec![0.0, 0.0, 1.0]);
        assert_eq!(poly.point_data().tcoords().unwrap().number_of_components(), 2);
    }
}
