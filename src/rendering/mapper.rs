//! Terminal node handing data sets to a renderer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::lookup_table::{LookupTable, Rgba};
use crate::data::array::DataArray;
use crate::data::attributes::DataSetAttributes;
use crate::data::object::{DataObject, DataObjectType};
use crate::information::{Information, keys};
use crate::pipeline::{Algorithm, RequestContext};
use crate::pipeline_error::PipelineResult;

/// Which attribute collection and array feed colour mapping.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum ScalarMode {
    /// Active point scalars, else active cell scalars.
    #[default]
    Default,
    UsePointData,
    UseCellData,
    /// The point array selected with [`Mapper::select_color_array`].
    UsePointFieldData,
    /// The cell array selected with [`Mapper::select_color_array`].
    UseCellFieldData,
}

/// Whether colours apply per point or per cell.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ColorAssociation {
    Points,
    Cells,
}

/// Colours produced by [`Mapper::map_scalars`].
#[derive(Clone, Debug, PartialEq)]
pub struct MappedColors {
    pub association: ColorAssociation,
    pub colors: Vec<Rgba>,
}

/// Algorithm with one input and no outputs. Updating it pulls the
/// requested piece through the pipeline and records the result for the
/// renderer.
#[derive(Clone, Debug)]
pub struct Mapper {
    scalar_mode: ScalarMode,
    color_array: Option<String>,
    color_component: Option<usize>,
    scalar_range: [f64; 2],
    use_lookup_table_scalar_range: bool,
    scalar_visibility: bool,
    lookup_table: LookupTable,
    piece: i32,
    number_of_pieces: i32,
    ghost_level: i32,
    input: Option<Arc<DataObject>>,
}

impl Default for Mapper {
    fn default() -> Self {
        Self {
            scalar_mode: ScalarMode::Default,
            color_array: None,
            color_component: None,
            scalar_range: [0.0, 1.0],
            use_lookup_table_scalar_range: false,
            scalar_visibility: true,
            lookup_table: LookupTable::new(),
            piece: 0,
            number_of_pieces: 1,
            ghost_level: 0,
            input: None,
        }
    }
}

impl Mapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_scalar_mode(&mut self, mode: ScalarMode) {
        self.scalar_mode = mode;
    }

    pub fn scalar_mode(&self) -> ScalarMode {
        self.scalar_mode
    }

    /// Array used by the field-data scalar modes.
    pub fn select_color_array(&mut self, name: impl Into<String>) {
        self.color_array = Some(name.into());
    }

    /// Map one component instead of the tuple magnitude.
    pub fn set_color_component(&mut self, component: Option<usize>) {
        self.color_component = component;
    }

    pub fn set_scalar_range(&mut self, lo: f64, hi: f64) {
        self.scalar_range = [lo, hi];
    }

    pub fn scalar_range(&self) -> [f64; 2] {
        self.scalar_range
    }

    pub fn set_use_lookup_table_scalar_range(&mut self, on: bool) {
        self.use_lookup_table_scalar_range = on;
    }

    pub fn set_scalar_visibility(&mut self, on: bool) {
        self.scalar_visibility = on;
    }

    pub fn set_lookup_table(&mut self, lut: LookupTable) {
        self.lookup_table = lut;
    }

    pub fn lookup_table(&self) -> &LookupTable {
        &self.lookup_table
    }

    pub fn set_piece(&mut self, piece: i32) {
        self.piece = piece;
    }

    pub fn piece(&self) -> i32 {
        self.piece
    }

    pub fn set_number_of_pieces(&mut self, pieces: i32) {
        self.number_of_pieces = pieces;
    }

    pub fn number_of_pieces(&self) -> i32 {
        self.number_of_pieces
    }

    pub fn set_ghost_level(&mut self, level: i32) {
        self.ghost_level = level;
    }

    pub fn ghost_level(&self) -> i32 {
        self.ghost_level
    }

    /// Data set received by the last update.
    pub fn input(&self) -> Option<&Arc<DataObject>> {
        self.input.as_ref()
    }

    fn color_source<'a>(&self, data: &'a DataObject) -> Option<(&'a DataArray, ColorAssociation)> {
        let named = |attrs: Option<&'a DataSetAttributes>| {
            self.color_array
                .as_deref()
                .and_then(|name| attrs.and_then(|a| a.array(name)))
        };
        match self.scalar_mode {
            ScalarMode::Default => data
                .point_data()
                .and_then(|pd| pd.scalars())
                .map(|a| (a, ColorAssociation::Points))
                .or_else(|| {
                    data.cell_data()
                        .and_then(|cd| cd.scalars())
                        .map(|a| (a, ColorAssociation::Cells))
                }),
            ScalarMode::UsePointData => data
                .point_data()
                .and_then(|pd| pd.scalars())
                .map(|a| (a, ColorAssociation::Points)),
            ScalarMode::UseCellData => data
                .cell_data()
                .and_then(|cd| cd.scalars())
                .map(|a| (a, ColorAssociation::Cells)),
            ScalarMode::UsePointFieldData => {
                named(data.point_data()).map(|a| (a, ColorAssociation::Points))
            }
            ScalarMode::UseCellFieldData => {
                named(data.cell_data()).map(|a| (a, ColorAssociation::Cells))
            }
        }
    }

    /// Colours for the last input, or `None` when scalar colouring is off
    /// or no array matches the scalar mode.
    pub fn map_scalars(&self) -> Option<MappedColors> {
        if !self.scalar_visibility {
            return None;
        }
        let data = self.input.as_deref()?;
        let (array, association) = self.color_source(data)?;
        let colors = if self.use_lookup_table_scalar_range {
            self.lookup_table.map_array(array, self.color_component)
        } else {
            let mut lut = self.lookup_table.clone();
            lut.set_range(self.scalar_range[0], self.scalar_range[1]);
            lut.map_array(array, self.color_component)
        };
        Some(MappedColors { association, colors })
    }
}

impl Algorithm for Mapper {
    fn class_name(&self) -> &'static str {
        "Mapper"
    }

    fn number_of_output_ports(&self) -> usize {
        0
    }

    fn fill_input_port_information(&self, _port: usize, info: &mut Information) {
        info.set(keys::INPUT_REQUIRED_DATA_TYPE, vec![DataObjectType::DataSet]);
    }

    /// Issue the mapper's own piece request.
    fn request_update_extent(&mut self, ctx: &mut RequestContext) -> PipelineResult<()> {
        if let Some(input) = ctx.input_information_mut(0, 0) {
            match input.get(keys::WHOLE_EXTENT) {
                Some(whole) => input.set(keys::UPDATE_EXTENT, whole),
                None => {
                    input.remove(keys::UPDATE_EXTENT);
                }
            }
            input.set(keys::UPDATE_PIECE_NUMBER, self.piece);
            input.set(keys::UPDATE_NUMBER_OF_PIECES, self.number_of_pieces);
            input.set(keys::UPDATE_NUMBER_OF_GHOST_LEVELS, self.ghost_level);
        }
        Ok(())
    }

    fn request_data(&mut self, ctx: &mut RequestContext) -> PipelineResult<()> {
        self.input = ctx.input_object(0, 0);
        Ok(())
    }
}
