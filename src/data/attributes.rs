//! Attribute collections: point data, cell data, row data and field data.

use std::fmt;

use crate::data::array::DataArray;
use crate::data::ghost::GHOST_ARRAY_NAME;
use crate::pipeline_error::{PipelineError, PipelineResult};

/// Role an array can play on an attribute collection.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum AttributeRole {
    Scalars,
    Vectors,
    Normals,
    TCoords,
    Tensors,
}

impl AttributeRole {
    pub const ALL: [AttributeRole; 5] = [
        AttributeRole::Scalars,
        AttributeRole::Vectors,
        AttributeRole::Normals,
        AttributeRole::TCoords,
        AttributeRole::Tensors,
    ];

    fn slot(self) -> usize {
        self as usize
    }

    /// Whether an array with `components` components can play this role.
    pub fn accepts(self, components: usize) -> bool {
        match self {
            AttributeRole::Scalars => (1..=4).contains(&components),
            AttributeRole::Vectors | AttributeRole::Normals => components == 3,
            AttributeRole::TCoords => (1..=3).contains(&components),
            AttributeRole::Tensors => components == 6 || components == 9,
        }
    }
}

impl fmt::Display for AttributeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Ordered, named arrays sharing one tuple count, with one active array per role.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataSetAttributes {
    arrays: Vec<DataArray>,
    active: [Option<String>; 5],
}

impl DataSetAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Shared tuple count, or `None` when the collection holds no arrays.
    pub fn number_of_tuples(&self) -> Option<usize> {
        self.arrays.first().map(DataArray::number_of_tuples)
    }

    /// Add an array, replacing any array with the same name in place.
    pub fn add_array(&mut self, array: DataArray) -> PipelineResult<()> {
        let existing = self.arrays.iter().position(|a| a.name() == array.name());
        let expected = self
            .arrays
            .iter()
            .enumerate()
            .find(|(i, _)| Some(*i) != existing)
            .map(|(_, a)| a.number_of_tuples());
        if let Some(expected) = expected {
            if array.number_of_tuples() != expected {
                return Err(PipelineError::TupleCountMismatch {
                    name: array.name().to_owned(),
                    expected,
                    found: array.number_of_tuples(),
                });
            }
        }
        match existing {
            Some(i) => {
                let stale = self.active_roles_of(array.name());
                self.arrays[i] = array;
                for role in stale {
                    if !role.accepts(self.arrays[i].number_of_components()) {
                        self.active[role.slot()] = None;
                    }
                }
            }
            None => self.arrays.push(array),
        }
        Ok(())
    }

    /// Add an array and make it the active array for `role`.
    pub fn add_active(&mut self, role: AttributeRole, array: DataArray) -> PipelineResult<()> {
        let name = array.name().to_owned();
        self.add_array(array)?;
        self.set_active(role, &name)
    }

    pub fn array(&self, name: &str) -> Option<&DataArray> {
        self.arrays.iter().find(|a| a.name() == name)
    }

    /// Overwrite component `c` of tuple `i` of a named array. Arrays are
    /// only edited in place, so the shared tuple count cannot drift.
    pub fn set_component(
        &mut self,
        name: &str,
        i: usize,
        c: usize,
        value: f64,
    ) -> PipelineResult<()> {
        self.arrays
            .iter_mut()
            .find(|a| a.name() == name)
            .ok_or_else(|| PipelineError::MissingArray(name.to_owned()))?
            .set_component(i, c, value)
    }

    pub fn array_at(&self, index: usize) -> Option<&DataArray> {
        self.arrays.get(index)
    }

    pub fn has_array(&self, name: &str) -> bool {
        self.array(name).is_some()
    }

    /// Remove a named array, clearing any role it held.
    pub fn remove_array(&mut self, name: &str) -> Option<DataArray> {
        let pos = self.arrays.iter().position(|a| a.name() == name)?;
        for role in self.active_roles_of(name) {
            self.active[role.slot()] = None;
        }
        Some(self.arrays.remove(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataArray> {
        self.arrays.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arrays.iter().map(DataArray::name)
    }

    /// Mark the array `name` as the active array for `role`.
    pub fn set_active(&mut self, role: AttributeRole, name: &str) -> PipelineResult<()> {
        let array = self
            .array(name)
            .ok_or_else(|| PipelineError::MissingArray(name.to_owned()))?;
        if !role.accepts(array.number_of_components()) {
            return Err(PipelineError::InvalidAttribute {
                name: name.to_owned(),
                role: role.to_string(),
                components: array.number_of_components(),
            });
        }
        self.active[role.slot()] = Some(name.to_owned());
        Ok(())
    }

    pub fn clear_active(&mut self, role: AttributeRole) {
        self.active[role.slot()] = None;
    }

    pub fn active_name(&self, role: AttributeRole) -> Option<&str> {
        self.active[role.slot()].as_deref()
    }

    pub fn active(&self, role: AttributeRole) -> Option<&DataArray> {
        self.active_name(role).and_then(|n| self.array(n))
    }

    pub fn scalars(&self) -> Option<&DataArray> {
        self.active(AttributeRole::Scalars)
    }

    pub fn vectors(&self) -> Option<&DataArray> {
        self.active(AttributeRole::Vectors)
    }

    pub fn normals(&self) -> Option<&DataArray> {
        self.active(AttributeRole::Normals)
    }

    pub fn tcoords(&self) -> Option<&DataArray> {
        self.active(AttributeRole::TCoords)
    }

    pub fn tensors(&self) -> Option<&DataArray> {
        self.active(AttributeRole::Tensors)
    }

    /// The ghost flag array, if present.
    pub fn ghost_array(&self) -> Option<&DataArray> {
        self.array(GHOST_ARRAY_NAME)
    }

    fn active_roles_of(&self, name: &str) -> Vec<AttributeRole> {
        AttributeRole::ALL
            .into_iter()
            .filter(|r| self.active_name(*r) == Some(name))
            .collect()
    }

    /// Check that every array carries `tuples` tuples.
    pub fn check_tuples(&self, tuples: usize) -> PipelineResult<()> {
        match self.arrays.iter().find(|a| a.number_of_tuples() != tuples) {
            Some(a) => Err(PipelineError::TupleCountMismatch {
                name: a.name().to_owned(),
                expected: tuples,
                found: a.number_of_tuples(),
            }),
            None => Ok(()),
        }
    }

    /// Same arrays and roles with zero tuples; the ghost array is dropped.
    pub fn empty_like(&self) -> Self {
        Self {
            arrays: self
                .arrays
                .iter()
                .filter(|a| a.name() != GHOST_ARRAY_NAME)
                .map(DataArray::empty_like)
                .collect(),
            active: self.active.clone(),
        }
    }

    /// Numeric arrays only, emptied, for interpolated output.
    pub fn interpolation_like(&self) -> Self {
        let mut out = self.empty_like();
        out.arrays.retain(|a| a.scalar_type().is_numeric());
        for role in AttributeRole::ALL {
            if let Some(name) = out.active_name(role) {
                if !out.has_array(name) {
                    out.active[role.slot()] = None;
                }
            }
        }
        out
    }

    /// Append one tuple per array interpolated between tuples `a` and `b` of `src`.
    ///
    /// `self` must come from [`DataSetAttributes::interpolation_like`] on `src`.
    pub fn push_interpolated(
        &mut self,
        src: &DataSetAttributes,
        a: usize,
        b: usize,
        t: f64,
    ) -> PipelineResult<()> {
        for out in &mut self.arrays {
            let from = src
                .array(out.name())
                .ok_or_else(|| PipelineError::MissingArray(out.name().to_owned()))?;
            let (ta, tb) = match (from.tuple_f64(a), from.tuple_f64(b)) {
                (Some(ta), Some(tb)) => (ta, tb),
                _ => {
                    return Err(PipelineError::TupleOutOfRange {
                        name: from.name().to_owned(),
                        index: a.max(b),
                        tuples: from.number_of_tuples(),
                    });
                }
            };
            let mixed: Vec<f64> = ta.iter().zip(&tb).map(|(x, y)| x + t * (y - x)).collect();
            out.push_tuple_f64(&mixed)?;
        }
        Ok(())
    }

    /// Tuples `ids` of every array, keeping roles.
    pub fn extract_tuples(&self, ids: &[usize]) -> PipelineResult<Self> {
        Ok(Self {
            arrays: self
                .arrays
                .iter()
                .map(|a| a.extract_tuples(ids))
                .collect::<PipelineResult<_>>()?,
            active: self.active.clone(),
        })
    }

    pub fn deep_copy(&self) -> Self {
        Self {
            arrays: self.arrays.iter().map(DataArray::deep_copy).collect(),
            active: self.active.clone(),
        }
    }

    /// True when any array shares storage with the same-named array of `other`.
    pub fn shares_storage_with(&self, other: &DataSetAttributes) -> bool {
        self.arrays.iter().any(|a| {
            other
                .array(a.name())
                .is_some_and(|b| a.shares_storage_with(b))
        })
    }

    pub fn memory_size(&self) -> usize {
        self.arrays.iter().map(DataArray::memory_size).sum()
    }
}

/// Named arrays with independent tuple counts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldData {
    arrays: Vec<DataArray>,
}

impl FieldData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an array, replacing any array with the same name.
    pub fn add_array(&mut self, array: DataArray) {
        match self.arrays.iter_mut().find(|a| a.name() == array.name()) {
            Some(slot) => *slot = array,
            None => self.arrays.push(array),
        }
    }

    pub fn array(&self, name: &str) -> Option<&DataArray> {
        self.arrays.iter().find(|a| a.name() == name)
    }

    pub fn remove_array(&mut self, name: &str) -> Option<DataArray> {
        let pos = self.arrays.iter().position(|a| a.name() == name)?;
        Some(self.arrays.remove(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataArray> {
        self.arrays.iter()
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    pub fn deep_copy(&self) -> Self {
        Self {
            arrays: self.arrays.iter().map(DataArray::deep_copy).collect(),
        }
    }

    pub fn memory_size(&self) -> usize {
        self.arrays.iter().map(DataArray::memory_size).sum()
    }
}
