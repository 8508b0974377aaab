//! Iso-surface extraction from image data.
//!
//! Every voxel is split into six tetrahedra around its main diagonal. The
//! split is the same in every voxel, so neighbouring voxels agree on the
//! diagonals of shared faces and the extracted surface has no cracks.
//! Surface vertices are keyed by the grid edge they lie on, which merges
//! them across tetrahedra and voxels.

use hashbrown::HashMap;

use crate::data::array::DataArray;
use crate::data::attributes::DataSetAttributes;
use crate::data::cell_array::CellArray;
use crate::data::ghost::{self, DUPLICATE_CELL};
use crate::data::image::ImageData;
use crate::data::object::DataObjectType;
use crate::data::points::Points;
use crate::data::poly::PolyData;
use crate::data::scalar::IdType;
use crate::information::{Information, keys};
use crate::pipeline::{Algorithm, RequestContext};
use crate::pipeline_error::PipelineResult;

/// Voxel corners are numbered `x + 2y + 4z`.
const TETRAHEDRA: [[usize; 4]; 6] = [
    [0, 1, 3, 7],
    [0, 3, 2, 7],
    [0, 2, 6, 7],
    [0, 6, 4, 7],
    [0, 4, 5, 7],
    [0, 5, 1, 7],
];

/// `ImageData` to `PolyData` iso-surface filter.
#[derive(Clone, Debug)]
pub struct ContourFilter {
    value: f64,
    array_name: Option<String>,
    abort_check_interval: usize,
}

impl ContourFilter {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            array_name: None,
            abort_check_interval: 4096,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    /// Contour the named point array instead of the active scalars.
    pub fn select_input_scalars(&mut self, name: impl Into<String>) {
        self.array_name = Some(name.into());
    }

    /// Number of voxels between two abort checks.
    pub fn set_abort_check_interval(&mut self, cells: usize) {
        self.abort_check_interval = cells.max(1);
    }

    pub fn abort_check_interval(&self) -> usize {
        self.abort_check_interval
    }
}

struct SurfaceBuilder<'a> {
    image: &'a ImageData,
    values: Vec<f64>,
    iso: f64,
    edge_points: HashMap<(usize, usize), IdType>,
    points: Points,
    polys: CellArray,
    point_data: DataSetAttributes,
}

impl<'a> SurfaceBuilder<'a> {
    fn new(image: &'a ImageData, scalars: &DataArray, iso: f64) -> Self {
        let values = (0..scalars.number_of_tuples())
            .map(|i| scalars.component(i, 0).unwrap_or(f64::NAN))
            .collect();
        Self {
            image,
            values,
            iso,
            edge_points: HashMap::new(),
            points: Points::new(),
            polys: CellArray::new(),
            point_data: image.point_data().interpolation_like(),
        }
    }

    fn location(&self, point: usize) -> [f64; 3] {
        self.image.point(point).unwrap_or([f64::NAN; 3])
    }

    fn edge_point(&mut self, a: usize, b: usize) -> PipelineResult<IdType> {
        let key = (a.min(b), a.max(b));
        if let Some(&id) = self.edge_points.get(&key) {
            return Ok(id);
        }
        let (a, b) = key;
        let (va, vb) = (self.values[a], self.values[b]);
        let t = (self.iso - va) / (vb - va);
        let (pa, pb) = (self.location(a), self.location(b));
        let p = std::array::from_fn(|c| pa[c] + t * (pb[c] - pa[c]));
        let id = self.points.push(p) as IdType;
        self.point_data
            .push_interpolated(self.image.point_data(), a, b, t)?;
        self.edge_points.insert(key, id);
        Ok(id)
    }

    /// Append a triangle whose normal points along `outward`.
    fn push_triangle(&mut self, mut tri: [IdType; 3], outward: [f64; 3]) {
        let p: [[f64; 3]; 3] = tri.map(|id| self.points.point(id as usize).unwrap_or([0.0; 3]));
        let u: [f64; 3] = std::array::from_fn(|c| p[1][c] - p[0][c]);
        let v: [f64; 3] = std::array::from_fn(|c| p[2][c] - p[0][c]);
        let n = [
            u[1] * v[2] - u[2] * v[1],
            u[2] * v[0] - u[0] * v[2],
            u[0] * v[1] - u[1] * v[0],
        ];
        if n[0] * outward[0] + n[1] * outward[1] + n[2] * outward[2] < 0.0 {
            tri.swap(1, 2);
        }
        self.polys.push_cell(&tri);
    }

    fn centroid(&self, points: &[usize]) -> [f64; 3] {
        let mut c = [0.0; 3];
        for &p in points {
            let x = self.location(p);
            for a in 0..3 {
                c[a] += x[a] / points.len() as f64;
            }
        }
        c
    }

    fn tetra(&mut self, ids: [usize; 4]) -> PipelineResult<()> {
        let (inside, outside): (Vec<usize>, Vec<usize>) =
            ids.iter().copied().partition(|&p| self.values[p] < self.iso);
        let (lo, hi) = (self.centroid(&inside), self.centroid(&outside));
        let outward = std::array::from_fn(|a| hi[a] - lo[a]);
        match inside.len() {
            1 | 3 => {
                let (lone, rest) = if inside.len() == 1 {
                    (inside[0], &outside)
                } else {
                    (outside[0], &inside)
                };
                let tri = [
                    self.edge_point(lone, rest[0])?,
                    self.edge_point(lone, rest[1])?,
                    self.edge_point(lone, rest[2])?,
                ];
                self.push_triangle(tri, outward);
            }
            2 => {
                let (a, b, c, d) = (inside[0], inside[1], outside[0], outside[1]);
                let ac = self.edge_point(a, c)?;
                let ad = self.edge_point(a, d)?;
                let bd = self.edge_point(b, d)?;
                let bc = self.edge_point(b, c)?;
                self.push_triangle([ac, ad, bd], outward);
                self.push_triangle([ac, bd, bc], outward);
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(self) -> PolyData {
        let mut poly = PolyData::new();
        poly.set_points(self.points);
        poly.set_polys(self.polys);
        *poly.point_data_mut() = self.point_data;
        poly
    }
}

impl Algorithm for ContourFilter {
    fn class_name(&self) -> &'static str {
        "ContourFilter"
    }

    fn fill_input_port_information(&self, _port: usize, info: &mut Information) {
        info.set(keys::INPUT_REQUIRED_DATA_TYPE, vec![DataObjectType::ImageData]);
    }

    fn fill_output_port_information(&self, _port: usize, info: &mut Information) {
        info.set(keys::DATA_TYPE_NAME, DataObjectType::PolyData);
    }

    fn request_information(&mut self, ctx: &mut RequestContext) -> PipelineResult<()> {
        let out = ctx.output(0)?;
        out.remove(keys::WHOLE_EXTENT);
        out.remove(keys::SPACING);
        out.remove(keys::ORIGIN);
        Ok(())
    }

    /// Whole-extent requests ask for the entire input; piece requests pass
    /// through unchanged.
    fn request_update_extent(&mut self, ctx: &mut RequestContext) -> PipelineResult<()> {
        let pieces = ctx
            .output_information(0)
            .and_then(|info| info.get(keys::UPDATE_NUMBER_OF_PIECES))
            .unwrap_or(1);
        if pieces > 1 {
            return Ok(());
        }
        if let Some(input) = ctx.input_information_mut(0, 0) {
            if let Some(whole) = input.get(keys::WHOLE_EXTENT) {
                input.set(keys::UPDATE_EXTENT, whole);
            }
            input.set(keys::UPDATE_PIECE_NUMBER, 0);
            input.set(keys::UPDATE_NUMBER_OF_PIECES, 1);
            input.set(keys::UPDATE_NUMBER_OF_GHOST_LEVELS, 0);
        }
        Ok(())
    }

    fn request_data(&mut self, ctx: &mut RequestContext) -> PipelineResult<()> {
        let input = ctx.require_input(0)?;
        let Some(image) = input.as_image() else {
            return Err(ctx.fail("input is not image data"));
        };
        let scalars = match &self.array_name {
            Some(name) => image.point_data().array(name),
            None => image.point_data().scalars(),
        };
        let Some(scalars) = scalars else {
            ctx.warning("no point scalars to contour");
            return Ok(());
        };
        let extent = image.extent();
        if extent.data_dimension() < 3 {
            ctx.warning("contouring needs a three-dimensional image");
            return Ok(());
        }

        let ghosts = image.cell_data().ghost_array();
        let mut builder = SurfaceBuilder::new(image, scalars, self.value);
        let total = extent.number_of_cells();
        for cell in 0..total {
            if cell % self.abort_check_interval == 0 {
                if ctx.check_abort() {
                    return Ok(());
                }
                ctx.update_progress(cell as f64 / total as f64);
            }
            if ghost::is_ghost(ghosts, cell, DUPLICATE_CELL) {
                continue;
            }
            let ijk = extent.cell_ijk(cell);
            let corners: [usize; 8] = std::array::from_fn(|c| {
                extent.point_index([
                    ijk[0] + (c & 1) as i32,
                    ijk[1] + ((c >> 1) & 1) as i32,
                    ijk[2] + ((c >> 2) & 1) as i32,
                ])
            });
            let below = corners
                .iter()
                .filter(|&&p| builder.values[p] < self.value)
                .count();
            if below == 0 || below == 8 {
                continue;
            }
            for tet in TETRAHEDRA {
                builder.tetra(tet.map(|c| corners[c]))?;
            }
        }
        log::debug!(
            "{}: {} triangles at {}",
            ctx.algorithm_name(),
            builder.polys.number_of_cells(),
            self.value
        );
        ctx.set_output(0, builder.finish().into());
        Ok(())
    }
}
