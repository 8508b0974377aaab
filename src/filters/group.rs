//! Collect every connection of one repeatable port into a multiblock.

use crate::data::multiblock::MultiBlockDataSet;
use crate::data::object::DataObjectType;
use crate::information::{Information, keys};
use crate::pipeline::{Algorithm, RequestContext};
use crate::pipeline_error::PipelineResult;

/// Groups its inputs, in connection order, into a `MultiBlockDataSet`.
/// Blocks are named from `set_block_name`, defaulting to `Block<i>`.
#[derive(Clone, Debug, Default)]
pub struct GroupDataSets {
    names: Vec<Option<String>>,
}

impl GroupDataSets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_block_name(&mut self, index: usize, name: impl Into<String>) {
        if self.names.len() <= index {
            self.names.resize(index + 1, None);
        }
        self.names[index] = Some(name.into());
    }

    pub fn block_name(&self, index: usize) -> String {
        self.names
            .get(index)
            .cloned()
            .flatten()
            .unwrap_or_else(|| format!("Block{index}"))
    }
}

impl Algorithm for GroupDataSets {
    fn class_name(&self) -> &'static str {
        "GroupDataSets"
    }

    fn fill_input_port_information(&self, _port: usize, info: &mut Information) {
        info.set(keys::INPUT_REQUIRED_DATA_TYPE, vec![DataObjectType::DataObject]);
        info.set(keys::INPUT_IS_REPEATABLE, true);
    }

    fn fill_output_port_information(&self, _port: usize, info: &mut Information) {
        info.set(keys::DATA_TYPE_NAME, DataObjectType::MultiBlockDataSet);
    }

    fn request_information(&mut self, ctx: &mut RequestContext) -> PipelineResult<()> {
        let out = ctx.output(0)?;
        out.remove(keys::WHOLE_EXTENT);
        out.remove(keys::SPACING);
        out.remove(keys::ORIGIN);
        Ok(())
    }

    fn request_data(&mut self, ctx: &mut RequestContext) -> PipelineResult<()> {
        let mut group = MultiBlockDataSet::new();
        for c in 0..ctx.number_of_connections(0) {
            group.push_block(self.block_name(c), ctx.input_object(0, c));
        }
        ctx.set_output(0, group.into());
        Ok(())
    }
}
