//! Source wrapping a caller-supplied data object.

use std::sync::Arc;

use super::algorithm::{Algorithm, RequestContext};
use crate::data::object::DataObject;
use crate::information::keys;
use crate::pipeline_error::PipelineResult;

/// Hands out a fixed data object; created by
/// [`Pipeline::set_input_data`](super::Pipeline::set_input_data).
///
/// Structured data declares its extent as `WHOLE_EXTENT`; images can also
/// be streamed, in which case each request receives the requested
/// sub-extent.
#[derive(Debug)]
pub struct TrivialProducer {
    data: Arc<DataObject>,
}

impl TrivialProducer {
    pub fn new(data: impl Into<DataObject>) -> Self {
        Self {
            data: Arc::new(data.into()),
        }
    }

    pub fn data(&self) -> &Arc<DataObject> {
        &self.data
    }

    pub fn set_data(&mut self, data: impl Into<DataObject>) {
        self.data = Arc::new(data.into());
    }
}

impl Algorithm for TrivialProducer {
    fn class_name(&self) -> &'static str {
        "TrivialProducer"
    }

    fn number_of_input_ports(&self) -> usize {
        0
    }

    fn request_data_object(&mut self, ctx: &mut RequestContext) -> PipelineResult<()> {
        let ty = self.data.data_type();
        ctx.output(0)?.set(keys::DATA_TYPE_NAME, ty);
        if ctx.output_data(0).map(DataObject::data_type) != Some(ty) {
            ctx.set_output(0, DataObject::new_instance(ty)?);
        }
        Ok(())
    }

    fn request_information(&mut self, ctx: &mut RequestContext) -> PipelineResult<()> {
        let out = ctx.output(0)?;
        if let Some(extent) = self.data.extent() {
            out.set(keys::WHOLE_EXTENT, extent);
        }
        if let Some(image) = self.data.as_image() {
            out.set(keys::SPACING, image.spacing());
            out.set(keys::ORIGIN, image.origin());
            out.set(keys::CAN_PRODUCE_SUB_EXTENT, true);
        }
        Ok(())
    }

    fn request_data(&mut self, ctx: &mut RequestContext) -> PipelineResult<()> {
        let requested = ctx
            .output_information(0)
            .and_then(|info| info.get(keys::UPDATE_EXTENT));
        let output = match (self.data.as_image(), requested) {
            (Some(image), Some(extent)) if extent != image.extent() => {
                Arc::new(DataObject::from(image.extract_extent(&extent)?))
            }
            _ => Arc::clone(&self.data),
        };
        ctx.set_output_object(0, output);
        Ok(())
    }
}
