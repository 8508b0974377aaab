//! Source sampling an implicit function on a uniform grid.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use super::implicit::ImplicitFunction;
use crate::data::array::DataArray;
use crate::data::attributes::AttributeRole;
use crate::data::extent::Extent;
use crate::data::image::ImageData;
use crate::data::object::DataObjectType;
use crate::information::{Information, keys};
use crate::pipeline::{Algorithm, RequestContext};
use crate::pipeline_error::PipelineResult;

/// Samples an [`ImplicitFunction`] at the points of an [`ImageData`].
///
/// The grid has `dimensions` points per axis spanning `bounds`
/// (`[xmin, xmax, ymin, ymax, zmin, zmax]`). The source can produce any
/// sub-extent, so piece requests are translated into extents before it
/// runs. The abort flag is polled once per row of samples.
#[derive(Debug)]
pub struct SampleFunction {
    function: Box<dyn ImplicitFunction>,
    dimensions: [usize; 3],
    bounds: [f64; 6],
    scalar_name: String,
}

impl SampleFunction {
    pub fn new(
        function: impl ImplicitFunction + 'static,
        dimensions: [usize; 3],
        bounds: [f64; 6],
    ) -> Self {
        Self {
            function: Box::new(function),
            dimensions,
            bounds,
            scalar_name: "scalars".to_owned(),
        }
    }

    pub fn set_function(&mut self, function: impl ImplicitFunction + 'static) {
        self.function = Box::new(function);
    }

    pub fn dimensions(&self) -> [usize; 3] {
        self.dimensions
    }

    pub fn set_dimensions(&mut self, dimensions: [usize; 3]) {
        self.dimensions = dimensions;
    }

    pub fn bounds(&self) -> [f64; 6] {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: [f64; 6]) {
        self.bounds = bounds;
    }

    pub fn scalar_name(&self) -> &str {
        &self.scalar_name
    }

    pub fn set_scalar_name(&mut self, name: impl Into<String>) {
        self.scalar_name = name.into();
    }

    pub fn whole_extent(&self) -> Extent {
        Extent::from_dimensions(self.dimensions)
    }

    pub fn spacing(&self) -> [f64; 3] {
        std::array::from_fn(|a| {
            let span = self.bounds[2 * a + 1] - self.bounds[2 * a];
            if self.dimensions[a] > 1 && span > 0.0 {
                span / (self.dimensions[a] - 1) as f64
            } else {
                1.0
            }
        })
    }

    pub fn origin(&self) -> [f64; 3] {
        [self.bounds[0], self.bounds[2], self.bounds[4]]
    }

    fn sample_row(&self, image: &ImageData, j: i32, k: i32, (i0, i1): (i32, i32)) -> Vec<f64> {
        (i0..=i1)
            .map(|i| self.function.evaluate(image.point_at([i, j, k])))
            .collect()
    }
}

impl Algorithm for SampleFunction {
    fn class_name(&self) -> &'static str {
        "SampleFunction"
    }

    fn number_of_input_ports(&self) -> usize {
        0
    }

    fn fill_output_port_information(&self, _port: usize, info: &mut Information) {
        info.set(keys::DATA_TYPE_NAME, DataObjectType::ImageData);
    }

    fn request_information(&mut self, ctx: &mut RequestContext) -> PipelineResult<()> {
        let whole = self.whole_extent();
        let spacing = self.spacing();
        let origin = self.origin();
        let name = self.scalar_name.clone();
        let out = ctx.output(0)?;
        out.set(keys::WHOLE_EXTENT, whole);
        out.set(keys::SPACING, spacing);
        out.set(keys::ORIGIN, origin);
        out.set(keys::CAN_PRODUCE_SUB_EXTENT, true);
        out.set(keys::POINT_ARRAY_NAMES, vec![name]);
        Ok(())
    }

    fn request_data(&mut self, ctx: &mut RequestContext) -> PipelineResult<()> {
        let extent = ctx
            .output_information(0)
            .and_then(|info| info.get(keys::UPDATE_EXTENT))
            .unwrap_or_else(|| self.whole_extent());
        let mut image = ImageData::new();
        image.set_extent(extent)?;
        image.set_spacing(self.spacing())?;
        image.set_origin(self.origin());

        let mut values = Vec::with_capacity(extent.number_of_points());
        if !extent.is_empty() {
            let (j0, j1) = extent.axis(1);
            let (k0, k1) = extent.axis(2);
            let slabs = (k1 - k0 + 1) as f64;
            for k in k0..=k1 {
                #[cfg(feature = "rayon")]
                {
                    if ctx.check_abort() {
                        return Ok(());
                    }
                    let rows: Vec<Vec<f64>> = (j0..=j1)
                        .into_par_iter()
                        .map(|j| self.sample_row(&image, j, k, extent.axis(0)))
                        .collect();
                    values.extend(rows.into_iter().flatten());
                }
                #[cfg(not(feature = "rayon"))]
                for j in j0..=j1 {
                    if ctx.check_abort() {
                        return Ok(());
                    }
                    values.extend(self.sample_row(&image, j, k, extent.axis(0)));
                }
                ctx.update_progress((k - k0 + 1) as f64 / slabs);
            }
        }

        let scalars = DataArray::new(self.scalar_name.clone(), 1, values)?;
        image
            .point_data_mut()
            .add_active(AttributeRole::Scalars, scalars)?;
        ctx.set_output(0, image.into());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::implicit::{Plane, Sphere};

    #[test]
    fn spacing_spans_the_bounds() {
        let s = SampleFunction::new(
            Sphere::new([0.0; 3], 1.0),
            [64, 64, 64],
            [-31.5, 31.5, -31.5, 31.5, -31.5, 31.5],
        );
        assert_eq!(s.spacing(), [1.0; 3]);
        assert_eq!(s.origin(), [-31.5; 3]);
        assert_eq!(s.whole_extent(), Extent::new(0, 63, 0, 63, 0, 63));
    }

    #[test]
    fn single_sample_axes_use_unit_spacing() {
        let s = SampleFunction::new(
            Plane::new([0.0; 3], [1.0, 0.0, 0.0]),
            [4, 1, 1],
            [0.0, 3.0, 0.0, 0.0, 0.0, 0.0],
        );
        assert_eq!(s.spacing(), [1.0, 1.0, 1.0]);
    }
}
