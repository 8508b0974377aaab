//! Column-oriented tables.

use crate::data::array::DataArray;
use crate::data::attributes::{DataSetAttributes, FieldData};
use crate::pipeline_error::PipelineResult;

/// Rows of named columns; every column has one tuple per row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    row_data: DataSetAttributes,
    field_data: FieldData,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn number_of_rows(&self) -> usize {
        self.row_data.number_of_tuples().unwrap_or(0)
    }

    pub fn number_of_columns(&self) -> usize {
        self.row_data.len()
    }

    /// Add a column; its tuple count must match the existing rows.
    pub fn add_column(&mut self, column: DataArray) -> PipelineResult<()> {
        self.row_data.add_array(column)
    }

    pub fn column(&self, name: &str) -> Option<&DataArray> {
        self.row_data.array(name)
    }

    pub fn column_at(&self, index: usize) -> Option<&DataArray> {
        self.row_data.array_at(index)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.row_data.names()
    }

    /// First component of `column` at `row`, widened to `f64`.
    pub fn value(&self, row: usize, column: &str) -> Option<f64> {
        self.column(column)?.component(row, 0)
    }

    pub fn row_data(&self) -> &DataSetAttributes {
        &self.row_data
    }

    pub fn row_data_mut(&mut self) -> &mut DataSetAttributes {
        &mut self.row_data
    }

    pub fn field_data(&self) -> &FieldData {
        &self.field_data
    }

    pub fn field_data_mut(&mut self) -> &mut FieldData {
        &mut self.field_data
    }

    pub fn empty_like(&self) -> Self {
        Self {
            row_data: self.row_data.empty_like(),
            field_data: FieldData::new(),
        }
    }

    pub fn deep_copy(&self) -> Self {
        Self {
            row_data: self.row_data.deep_copy(),
            field_data: self.field_data.deep_copy(),
        }
    }

    pub fn memory_size(&self) -> usize {
        self.row_data.memory_size() + self.field_data.memory_size()
    }
}
