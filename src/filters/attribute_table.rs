//! Attribute arrays of a data set as table columns.

use serde::{Deserialize, Serialize};

use crate::data::ghost::GHOST_ARRAY_NAME;
use crate::data::object::DataObjectType;
use crate::data::table::Table;
use crate::information::{Information, keys};
use crate::pipeline::{Algorithm, RequestContext};
use crate::pipeline_error::PipelineResult;

/// Which attribute collection becomes the table.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum FieldAssociation {
    #[default]
    Points,
    Cells,
}

/// Copies the point or cell arrays of a data set into a `Table`, one
/// column per array. Ghost flags are left out.
#[derive(Clone, Debug, Default)]
pub struct AttributeTable {
    association: FieldAssociation,
}

impl AttributeTable {
    pub fn new(association: FieldAssociation) -> Self {
        Self { association }
    }

    pub fn association(&self) -> FieldAssociation {
        self.association
    }

    pub fn set_association(&mut self, association: FieldAssociation) {
        self.association = association;
    }
}

impl Algorithm for AttributeTable {
    fn class_name(&self) -> &'static str {
        "AttributeTable"
    }

    fn fill_input_port_information(&self, _port: usize, info: &mut Information) {
        info.set(keys::INPUT_REQUIRED_DATA_TYPE, vec![DataObjectType::DataSet]);
    }

    fn fill_output_port_information(&self, _port: usize, info: &mut Information) {
        info.set(keys::DATA_TYPE_NAME, DataObjectType::Table);
    }

    fn request_information(&mut self, ctx: &mut RequestContext) -> PipelineResult<()> {
        let out = ctx.output(0)?;
        out.remove(keys::WHOLE_EXTENT);
        out.remove(keys::SPACING);
        out.remove(keys::ORIGIN);
        Ok(())
    }

    fn request_data(&mut self, ctx: &mut RequestContext) -> PipelineResult<()> {
        let input = ctx.require_input(0)?;
        let attributes = match self.association {
            FieldAssociation::Points => input.point_data(),
            FieldAssociation::Cells => input.cell_data(),
        };
        let mut table = Table::new();
        for array in attributes.into_iter().flat_map(|a| a.iter()) {
            if array.name() != GHOST_ARRAY_NAME {
                table.add_column(array.clone())?;
            }
        }
        ctx.set_output(0, table.into());
        Ok(())
    }
}
