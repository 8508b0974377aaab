//! Named, typed, component-valued attribute arrays.
//!
//! A [`DataArray`] stores `number_of_tuples × number_of_components` elements
//! of one [`ScalarType`] in a flat, tuple-major buffer. Storage is shared on
//! clone (shallow copy) and detached on first mutation; [`DataArray::deep_copy`]
//! always duplicates it. Per-component ranges are computed lazily and cached
//! until the next mutation.

use once_cell::sync::OnceCell;

use crate::data::cache::InvalidateCache;
use crate::data::scalar::{ArrayElement, ScalarType};
use crate::data::storage::{SharedStorage, Storage};
use crate::pipeline_error::{PipelineError, PipelineResult};

/// Tagged, type-erased element buffer.
#[derive(Clone, Debug, PartialEq)]
pub enum ArrayValues {
    Int8(SharedStorage<i8>),
    UInt8(SharedStorage<u8>),
    Int16(SharedStorage<i16>),
    UInt16(SharedStorage<u16>),
    Int32(SharedStorage<i32>),
    UInt32(SharedStorage<u32>),
    Int64(SharedStorage<i64>),
    UInt64(SharedStorage<u64>),
    Float32(SharedStorage<f32>),
    Float64(SharedStorage<f64>),
    String(SharedStorage<String>),
}

macro_rules! with_values {
    ($values:expr, $v:ident => $body:expr) => {
        match $values {
            ArrayValues::Int8($v) => $body,
            ArrayValues::UInt8($v) => $body,
            ArrayValues::Int16($v) => $body,
            ArrayValues::UInt16($v) => $body,
            ArrayValues::Int32($v) => $body,
            ArrayValues::UInt32($v) => $body,
            ArrayValues::Int64($v) => $body,
            ArrayValues::UInt64($v) => $body,
            ArrayValues::Float32($v) => $body,
            ArrayValues::Float64($v) => $body,
            ArrayValues::String($v) => $body,
        }
    };
}

macro_rules! with_numeric {
    ($values:expr, $v:ident => $body:expr, string => $other:expr) => {
        match $values {
            ArrayValues::Int8($v) => $body,
            ArrayValues::UInt8($v) => $body,
            ArrayValues::Int16($v) => $body,
            ArrayValues::UInt16($v) => $body,
            ArrayValues::Int32($v) => $body,
            ArrayValues::UInt32($v) => $body,
            ArrayValues::Int64($v) => $body,
            ArrayValues::UInt64($v) => $body,
            ArrayValues::Float32($v) => $body,
            ArrayValues::Float64($v) => $body,
            ArrayValues::String(_) => $other,
        }
    };
}

macro_rules! map_values {
    ($values:expr, $v:ident => $body:expr) => {
        match $values {
            ArrayValues::Int8($v) => ArrayValues::Int8($body),
            ArrayValues::UInt8($v) => ArrayValues::UInt8($body),
            ArrayValues::Int16($v) => ArrayValues::Int16($body),
            ArrayValues::UInt16($v) => ArrayValues::UInt16($body),
            ArrayValues::Int32($v) => ArrayValues::Int32($body),
            ArrayValues::UInt32($v) => ArrayValues::UInt32($body),
            ArrayValues::Int64($v) => ArrayValues::Int64($body),
            ArrayValues::UInt64($v) => ArrayValues::UInt64($body),
            ArrayValues::Float32($v) => ArrayValues::Float32($body),
            ArrayValues::Float64($v) => ArrayValues::Float64($body),
            ArrayValues::String($v) => ArrayValues::String($body),
        }
    };
}

macro_rules! zip_values {
    ($a:expr, $b:expr, ($x:ident, $y:ident) => $body:expr, _ => $other:expr) => {
        match ($a, $b) {
            (ArrayValues::Int8($x), ArrayValues::Int8($y)) => $body,
            (ArrayValues::UInt8($x), ArrayValues::UInt8($y)) => $body,
            (ArrayValues::Int16($x), ArrayValues::Int16($y)) => $body,
            (ArrayValues::UInt16($x), ArrayValues::UInt16($y)) => $body,
            (ArrayValues::Int32($x), ArrayValues::Int32($y)) => $body,
            (ArrayValues::UInt32($x), ArrayValues::UInt32($y)) => $body,
            (ArrayValues::Int64($x), ArrayValues::Int64($y)) => $body,
            (ArrayValues::UInt64($x), ArrayValues::UInt64($y)) => $body,
            (ArrayValues::Float32($x), ArrayValues::Float32($y)) => $body,
            (ArrayValues::Float64($x), ArrayValues::Float64($y)) => $body,
            (ArrayValues::String($x), ArrayValues::String($y)) => $body,
            _ => $other,
        }
    };
}

impl ArrayValues {
    /// Empty buffer of the given element type.
    pub fn empty(ty: ScalarType) -> Self {
        match ty {
            ScalarType::Int8 => ArrayValues::Int8(SharedStorage::default()),
            ScalarType::UInt8 => ArrayValues::UInt8(SharedStorage::default()),
            ScalarType::Int16 => ArrayValues::Int16(SharedStorage::default()),
            ScalarType::UInt16 => ArrayValues::UInt16(SharedStorage::default()),
            ScalarType::Int32 => ArrayValues::Int32(SharedStorage::default()),
            ScalarType::UInt32 => ArrayValues::UInt32(SharedStorage::default()),
            ScalarType::Int64 => ArrayValues::Int64(SharedStorage::default()),
            ScalarType::UInt64 => ArrayValues::UInt64(SharedStorage::default()),
            ScalarType::Float32 => ArrayValues::Float32(SharedStorage::default()),
            ScalarType::Float64 => ArrayValues::Float64(SharedStorage::default()),
            ScalarType::String => ArrayValues::String(SharedStorage::default()),
        }
    }

    pub fn scalar_type(&self) -> ScalarType {
        match self {
            ArrayValues::Int8(_) => ScalarType::Int8,
            ArrayValues::UInt8(_) => ScalarType::UInt8,
            ArrayValues::Int16(_) => ScalarType::Int16,
            ArrayValues::UInt16(_) => ScalarType::UInt16,
            ArrayValues::Int32(_) => ScalarType::Int32,
            ArrayValues::UInt32(_) => ScalarType::UInt32,
            ArrayValues::Int64(_) => ScalarType::Int64,
            ArrayValues::UInt64(_) => ScalarType::UInt64,
            ArrayValues::Float32(_) => ScalarType::Float32,
            ArrayValues::Float64(_) => ScalarType::Float64,
            ArrayValues::String(_) => ScalarType::String,
        }
    }

    /// Flat element count.
    pub fn len(&self) -> usize {
        with_values!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn resize(&mut self, len: usize) {
        with_values!(self, v => v.resize(len, Default::default()))
    }

    fn deep_copy(&self) -> Self {
        map_values!(self, v => v.deep_copy())
    }

    fn shares_with(&self, other: &ArrayValues) -> bool {
        zip_values!(self, other, (a, b) => a.shares_with(b), _ => false)
    }

    /// Gather the elements at `flat` indices; indices must be in range.
    fn select(&self, flat: &[usize]) -> Self {
        map_values!(self, v => {
            let src = v.as_slice();
            SharedStorage::from(flat.iter().map(|&i| src[i].clone()).collect::<Vec<_>>())
        })
    }

    fn value_f64(&self, i: usize) -> Option<f64> {
        with_numeric!(self, v => v.as_slice().get(i).map(|x| x.to_f64_lossy()), string => None)
    }

    fn set_value_f64(&mut self, i: usize, value: f64) -> bool {
        with_numeric!(self, v => match v.as_mut_slice().get_mut(i) {
            Some(slot) => {
                *slot = ArrayElement::from_f64_lossy(value);
                true
            }
            None => false,
        }, string => false)
    }

    /// Copy `n` elements from `src[src_at..]` into `self[dst_at..]`.
    fn copy_from(&mut self, dst_at: usize, src: &ArrayValues, src_at: usize, n: usize) -> bool {
        zip_values!(self, src, (dst, from) => {
            let from = match from.as_slice().get(src_at..src_at + n) {
                Some(from) => from,
                None => return false,
            };
            match dst.as_mut_slice().get_mut(dst_at..dst_at + n) {
                Some(to) => {
                    to.clone_from_slice(from);
                    true
                }
                None => false,
            }
        }, _ => false)
    }

    /// Raw bytes of a numeric buffer.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        with_numeric!(self, v => Some(bytemuck::cast_slice::<_, u8>(v.as_slice())), string => None)
    }
}

/// A named attribute array.
#[derive(Clone, Debug)]
pub struct DataArray {
    name: String,
    components: usize,
    values: ArrayValues,
    /// Lazily computed per-component `(min, max)`; `None` for components
    /// without a finite value.
    range: OnceCell<Vec<Option<(f64, f64)>>>,
}

impl PartialEq for DataArray {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.components == other.components
            && self.values == other.values
    }
}

impl InvalidateCache for DataArray {
    fn invalidate_cache(&mut self) {
        self.range.take();
    }
}

impl DataArray {
    /// Build an array from a flat, tuple-major buffer.
    pub fn from_values(
        name: impl Into<String>,
        components: usize,
        values: ArrayValues,
    ) -> PipelineResult<Self> {
        let name = name.into();
        if components == 0 {
            return Err(PipelineError::ZeroComponents(name));
        }
        if values.len() % components != 0 {
            return Err(PipelineError::ComponentMismatch {
                name,
                len: values.len(),
                components,
            });
        }
        Ok(Self {
            name,
            components,
            values,
            range: OnceCell::new(),
        })
    }

    /// Build a numeric array from a flat, tuple-major `Vec`.
    pub fn new<T: ArrayElement>(
        name: impl Into<String>,
        components: usize,
        values: Vec<T>,
    ) -> PipelineResult<Self> {
        Self::from_values(name, components, T::wrap(SharedStorage::from(values)))
    }

    /// Single-component string array.
    pub fn from_strings(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            components: 1,
            values: ArrayValues::String(SharedStorage::from(values)),
            range: OnceCell::new(),
        }
    }

    /// Empty array of the given type; `components` is raised to at least one.
    pub fn with_type(name: impl Into<String>, ty: ScalarType, components: usize) -> Self {
        Self {
            name: name.into(),
            components: components.max(1),
            values: ArrayValues::empty(ty),
            range: OnceCell::new(),
        }
    }

    /// Zero-filled (or empty-string-filled) array with `tuples` tuples.
    pub fn allocate(
        name: impl Into<String>,
        ty: ScalarType,
        components: usize,
        tuples: usize,
    ) -> PipelineResult<Self> {
        let mut array = Self::from_values(name, components, ArrayValues::empty(ty))?;
        array.values.resize(tuples * components);
        Ok(array)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn scalar_type(&self) -> ScalarType {
        self.values.scalar_type()
    }

    pub fn number_of_components(&self) -> usize {
        self.components
    }

    pub fn number_of_tuples(&self) -> usize {
        self.values.len() / self.components
    }

    /// Flat element count (`tuples × components`).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &ArrayValues {
        &self.values
    }

    /// Typed view of the flat buffer, if `T` matches the element type.
    pub fn as_slice<T: ArrayElement>(&self) -> Option<&[T]> {
        T::unwrap(&self.values).map(|s| s.as_slice())
    }

    /// Typed view of the flat buffer, or a type-mismatch error.
    pub fn try_slice<T: ArrayElement>(&self) -> PipelineResult<&[T]> {
        self.as_slice::<T>()
            .ok_or(PipelineError::ScalarTypeMismatch {
                expected: T::SCALAR_TYPE,
                found: self.scalar_type(),
            })
    }

    /// Mutable typed view; detaches shared storage and drops cached ranges.
    pub fn as_mut_slice<T: ArrayElement>(&mut self) -> Option<&mut [T]> {
        self.invalidate_cache();
        T::unwrap_mut(&mut self.values).map(|s| s.as_mut_slice())
    }

    pub fn strings(&self) -> Option<&[String]> {
        match &self.values {
            ArrayValues::String(s) => Some(s.as_slice()),
            _ => None,
        }
    }

    /// Tuple `i` as a typed slice of `number_of_components` elements.
    #[inline]
    pub fn tuple<T: ArrayElement>(&self, i: usize) -> Option<&[T]> {
        let c = self.components;
        self.as_slice::<T>()?.get(i * c..(i + 1) * c)
    }

    /// Component `c` of tuple `i`, widened to `f64`. `None` for string arrays.
    #[inline]
    pub fn component(&self, i: usize, c: usize) -> Option<f64> {
        if c >= self.components {
            return None;
        }
        self.values.value_f64(i * self.components + c)
    }

    /// Tuple `i` widened to `f64`.
    pub fn tuple_f64(&self, i: usize) -> Option<Vec<f64>> {
        (0..self.components).map(|c| self.component(i, c)).collect()
    }

    /// Overwrite component `c` of tuple `i`, narrowing from `f64`.
    pub fn set_component(&mut self, i: usize, c: usize, value: f64) -> PipelineResult<()> {
        let tuples = self.number_of_tuples();
        if i >= tuples || c >= self.components {
            return Err(self.out_of_range(i));
        }
        if !self.values.set_value_f64(i * self.components + c, value) {
            return Err(PipelineError::ScalarTypeMismatch {
                expected: ScalarType::Float64,
                found: self.scalar_type(),
            });
        }
        self.invalidate_cache();
        Ok(())
    }

    /// Overwrite tuple `i`.
    pub fn set_tuple<T: ArrayElement>(&mut self, i: usize, tuple: &[T]) -> PipelineResult<()> {
        self.check_tuple_len(tuple.len())?;
        let tuples = self.number_of_tuples();
        if i >= tuples {
            return Err(self.out_of_range(i));
        }
        let c = self.components;
        let found = self.scalar_type();
        let storage = T::unwrap_mut(&mut self.values).ok_or(PipelineError::ScalarTypeMismatch {
            expected: T::SCALAR_TYPE,
            found,
        })?;
        storage.write_at(i * c, tuple)?;
        self.invalidate_cache();
        Ok(())
    }

    /// Append one tuple.
    pub fn push_tuple<T: ArrayElement>(&mut self, tuple: &[T]) -> PipelineResult<()> {
        self.check_tuple_len(tuple.len())?;
        let found = self.scalar_type();
        let storage = T::unwrap_mut(&mut self.values).ok_or(PipelineError::ScalarTypeMismatch {
            expected: T::SCALAR_TYPE,
            found,
        })?;
        storage.extend_from_slice(tuple);
        self.invalidate_cache();
        Ok(())
    }

    /// Append one tuple given as `f64`, narrowing to the element type.
    pub fn push_tuple_f64(&mut self, tuple: &[f64]) -> PipelineResult<()> {
        self.check_tuple_len(tuple.len())?;
        if !self.scalar_type().is_numeric() {
            return Err(PipelineError::ScalarTypeMismatch {
                expected: ScalarType::Float64,
                found: ScalarType::String,
            });
        }
        let start = self.values.len();
        self.values.resize(start + tuple.len());
        for (offset, &v) in tuple.iter().enumerate() {
            self.values.set_value_f64(start + offset, v);
        }
        self.invalidate_cache();
        Ok(())
    }

    /// Resize to `tuples` tuples; new tuples are zero (or empty strings).
    pub fn resize_tuples(&mut self, tuples: usize) {
        self.values.resize(tuples * self.components);
        self.invalidate_cache();
    }

    /// Array with the same name, type and component count but no tuples.
    pub fn empty_like(&self) -> Self {
        Self::with_type(self.name.clone(), self.scalar_type(), self.components)
    }

    /// Append one string value.
    pub fn push_string(&mut self, value: impl Into<String>) -> PipelineResult<()> {
        match &mut self.values {
            ArrayValues::String(s) => {
                s.push(value.into());
                Ok(())
            }
            other => Err(PipelineError::ScalarTypeMismatch {
                expected: ScalarType::String,
                found: other.scalar_type(),
            }),
        }
    }

    /// Copy tuple `src_tuple` of `src` into tuple `dst_tuple` of `self`.
    ///
    /// Both arrays must share element type and component count.
    pub fn copy_tuple_from(
        &mut self,
        dst_tuple: usize,
        src: &DataArray,
        src_tuple: usize,
    ) -> PipelineResult<()> {
        if src.scalar_type() != self.scalar_type() {
            return Err(PipelineError::ScalarTypeMismatch {
                expected: self.scalar_type(),
                found: src.scalar_type(),
            });
        }
        if src.components != self.components {
            return Err(PipelineError::ComponentMismatch {
                name: src.name.clone(),
                len: src.len(),
                components: self.components,
            });
        }
        if src_tuple >= src.number_of_tuples() {
            return Err(src.out_of_range(src_tuple));
        }
        if dst_tuple >= self.number_of_tuples() {
            return Err(self.out_of_range(dst_tuple));
        }
        let c = self.components;
        self.values.copy_from(dst_tuple * c, &src.values, src_tuple * c, c);
        self.invalidate_cache();
        Ok(())
    }

    /// New array holding the tuples `ids`, in that order.
    pub fn extract_tuples(&self, ids: &[usize]) -> PipelineResult<Self> {
        let tuples = self.number_of_tuples();
        if let Some(&bad) = ids.iter().find(|&&i| i >= tuples) {
            return Err(self.out_of_range(bad));
        }
        let c = self.components;
        let flat: Vec<usize> = ids.iter().flat_map(|&i| i * c..(i + 1) * c).collect();
        Ok(Self {
            name: self.name.clone(),
            components: c,
            values: self.values.select(&flat),
            range: OnceCell::new(),
        })
    }

    /// Per-component `(min, max)` ignoring NaNs; cached until the next mutation.
    pub fn range(&self, component: usize) -> Option<(f64, f64)> {
        self.ranges().get(component).copied().flatten()
    }

    /// All per-component ranges.
    pub fn ranges(&self) -> &[Option<(f64, f64)>] {
        self.range.get_or_init(|| {
            let tuples = self.number_of_tuples();
            (0..self.components)
                .map(|c| {
                    (0..tuples)
                        .filter_map(|i| self.component(i, c))
                        .filter(|v| !v.is_nan())
                        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                            None => Some((v, v)),
                            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                        })
                })
                .collect()
        })
    }

    /// Duplicate the storage.
    pub fn deep_copy(&self) -> Self {
        Self {
            name: self.name.clone(),
            components: self.components,
            values: self.values.deep_copy(),
            range: self.range.clone(),
        }
    }

    /// True when `self` and `other` share one storage buffer.
    pub fn shares_storage_with(&self, other: &DataArray) -> bool {
        self.values.shares_with(&other.values)
    }

    /// Bytes held by the element buffer.
    pub fn memory_size(&self) -> usize {
        match (&self.values, self.values.as_bytes()) {
            (_, Some(bytes)) => bytes.len(),
            (ArrayValues::String(s), None) => s.as_slice().iter().map(String::len).sum(),
            _ => 0,
        }
    }

    fn check_tuple_len(&self, len: usize) -> PipelineResult<()> {
        if len != self.components {
            return Err(PipelineError::ComponentMismatch {
                name: self.name.clone(),
                len,
                components: self.components,
            });
        }
        Ok(())
    }

    fn out_of_range(&self, index: usize) -> PipelineError {
        PipelineError::TupleOutOfRange {
            name: self.name.clone(),
            index,
            tuples: self.number_of_tuples(),
        }
    }
}
