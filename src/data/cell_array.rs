//! Offset/connectivity cell lists.

use crate::data::scalar::IdType;
use crate::data::storage::{SharedStorage, Storage};
use crate::pipeline_error::{PipelineError, PipelineResult};

/// Variable-size cells stored as `offsets` into a flat `connectivity` list.
///
/// Cell `i` is `connectivity[offsets[i]..offsets[i + 1]]`; `offsets` always
/// starts with `0` and has one more entry than there are cells.
#[derive(Clone, Debug, PartialEq)]
pub struct CellArray {
    offsets: SharedStorage<IdType>,
    connectivity: SharedStorage<IdType>,
}

impl Default for CellArray {
    fn default() -> Self {
        Self {
            offsets: SharedStorage::from(vec![0]),
            connectivity: SharedStorage::default(),
        }
    }
}

impl CellArray {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw offsets and connectivity, validating their structure.
    pub fn from_raw(offsets: Vec<IdType>, connectivity: Vec<IdType>) -> PipelineResult<Self> {
        if offsets.first() != Some(&0) {
            return Err(PipelineError::InvalidCellArray(
                "offsets must start with 0".into(),
            ));
        }
        if offsets.windows(2).any(|w| w[1] < w[0]) {
            return Err(PipelineError::InvalidCellArray(
                "offsets must be non-decreasing".into(),
            ));
        }
        if offsets.last().map(|&o| o as usize) != Some(connectivity.len()) {
            return Err(PipelineError::InvalidCellArray(format!(
                "last offset must equal connectivity length {}",
                connectivity.len()
            )));
        }
        Ok(Self {
            offsets: SharedStorage::from(offsets),
            connectivity: SharedStorage::from(connectivity),
        })
    }

    pub fn from_cells<'a>(cells: impl IntoIterator<Item = &'a [IdType]>) -> Self {
        let mut out = Self::new();
        for cell in cells {
            out.push_cell(cell);
        }
        out
    }

    /// Append a cell and return its index.
    pub fn push_cell(&mut self, points: &[IdType]) -> usize {
        let id = self.number_of_cells();
        self.connectivity.extend_from_slice(points);
        self.offsets.push(self.connectivity.len() as IdType);
        id
    }

    pub fn number_of_cells(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.number_of_cells() == 0
    }

    pub fn connectivity_len(&self) -> usize {
        self.connectivity.len()
    }

    #[inline]
    pub fn cell(&self, i: usize) -> Option<&[IdType]> {
        let offsets = self.offsets.as_slice();
        let start = *offsets.get(i)? as usize;
        let end = *offsets.get(i + 1)? as usize;
        self.connectivity.as_slice().get(start..end)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[IdType]> + '_ {
        (0..self.number_of_cells()).filter_map(|i| self.cell(i))
    }

    pub fn offsets(&self) -> &[IdType] {
        self.offsets.as_slice()
    }

    pub fn connectivity(&self) -> &[IdType] {
        self.connectivity.as_slice()
    }

    /// Fail when any cell references a point id outside `0..point_count`.
    pub fn check_points(&self, point_count: usize) -> PipelineResult<()> {
        match self
            .connectivity
            .as_slice()
            .iter()
            .find(|&&p| p < 0 || p as usize >= point_count)
        {
            Some(&p) => Err(PipelineError::CellPointOutOfRange {
                point: p as i64,
                count: point_count,
            }),
            None => Ok(()),
        }
    }

    pub fn deep_copy(&self) -> Self {
        Self {
            offsets: self.offsets.deep_copy(),
            connectivity: self.connectivity.deep_copy(),
        }
    }

    pub fn shares_storage_with(&self, other: &CellArray) -> bool {
        self.connectivity.shares_with(&other.connectivity)
    }

    pub fn memory_size(&self) -> usize {
        (self.offsets.len() + self.connectivity.len()) * std::mem::size_of::<IdType>()
    }
}
