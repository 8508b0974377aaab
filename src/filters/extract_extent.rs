//! Sub-volume extraction.

use crate::data::extent::Extent;
use crate::data::object::{DataObject, DataObjectType};
use crate::information::{Information, keys};
use crate::pipeline::{Algorithm, RequestContext};
use crate::pipeline_error::PipelineResult;

/// Crops an `ImageData` to a volume of interest. Only the cropped region
/// is requested from upstream.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractExtent {
    voi: Extent,
}

impl ExtractExtent {
    pub fn new(voi: Extent) -> Self {
        Self { voi }
    }

    pub fn voi(&self) -> Extent {
        self.voi
    }

    pub fn set_voi(&mut self, voi: Extent) {
        self.voi = voi;
    }
}

impl Algorithm for ExtractExtent {
    fn class_name(&self) -> &'static str {
        "ExtractExtent"
    }

    fn fill_input_port_information(&self, _port: usize, info: &mut Information) {
        info.set(keys::INPUT_REQUIRED_DATA_TYPE, vec![DataObjectType::ImageData]);
    }

    fn fill_output_port_information(&self, _port: usize, info: &mut Information) {
        info.set(keys::DATA_TYPE_NAME, DataObjectType::ImageData);
    }

    fn request_information(&mut self, ctx: &mut RequestContext) -> PipelineResult<()> {
        let whole = ctx
            .input_information(0, 0)
            .and_then(|info| info.get(keys::WHOLE_EXTENT))
            .map(|whole| whole.intersect(&self.voi));
        if let Some(whole) = whole {
            ctx.output(0)?.set(keys::WHOLE_EXTENT, whole);
        }
        Ok(())
    }

    fn request_update_extent(&mut self, ctx: &mut RequestContext) -> PipelineResult<()> {
        let requested = ctx.output_information(0).and_then(|info| {
            info.get(keys::UPDATE_EXTENT)
                .or_else(|| info.get(keys::WHOLE_EXTENT))
        });
        if let Some(input) = ctx.input_information_mut(0, 0) {
            let mut extent = requested.unwrap_or(self.voi).intersect(&self.voi);
            if let Some(whole) = input.get(keys::WHOLE_EXTENT) {
                extent = extent.intersect(&whole);
            }
            input.set(keys::UPDATE_EXTENT, extent);
        }
        Ok(())
    }

    fn request_data(&mut self, ctx: &mut RequestContext) -> PipelineResult<()> {
        let input = ctx.require_input(0)?;
        let Some(image) = input.as_image() else {
            return Err(ctx.fail("input is not image data"));
        };
        let requested = ctx
            .output_information(0)
            .and_then(|info| info.get(keys::UPDATE_EXTENT))
            .unwrap_or(self.voi);
        let cropped = image.extract_extent(&requested.intersect(&self.voi))?;
        ctx.set_output(0, DataObject::from(cropped));
        Ok(())
    }
}
