//! Information objects: typed keys mapped to metadata values.
//!
//! A [`Key<T>`] is a `const` carrying its name and, through the type
//! parameter, the type of value it maps to. [`Information`] stores the
//! values type-erased as [`Value`] and converts back on access, so a key
//! can only ever be read as the type it was declared with.

pub mod keys;

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::data::extent::Extent;
use crate::data::object::{DataObject, DataObjectType};

/// A typed metadata key.
pub struct Key<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.name)
    }
}

/// Presence-only value used by request markers.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Marker;

/// Type-erased information value.
#[derive(Clone, Debug)]
pub enum Value {
    Int(i32),
    IntVector(Vec<i32>),
    Double(f64),
    DoubleVector(Vec<f64>),
    String(String),
    StringVector(Vec<String>),
    Object(Arc<DataObject>),
    Marker,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::IntVector(a), Value::IntVector(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::DoubleVector(a), Value::DoubleVector(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::StringVector(a), Value::StringVector(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b) || a == b,
            (Value::Marker, Value::Marker) => true,
            _ => false,
        }
    }
}

/// Conversion between a key's value type and [`Value`].
pub trait InfoValue: Sized {
    fn into_value(self) -> Value;
    fn from_value(value: &Value) -> Option<Self>;
}

impl InfoValue for i32 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl InfoValue for bool {
    fn into_value(self) -> Value {
        Value::Int(self as i32)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(*v != 0),
            _ => None,
        }
    }
}

impl InfoValue for Vec<i32> {
    fn into_value(self) -> Value {
        Value::IntVector(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::IntVector(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl InfoValue for Extent {
    fn into_value(self) -> Value {
        Value::IntVector(self.0.to_vec())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::IntVector(v) => <[i32; 6]>::try_from(v.as_slice()).ok().map(Extent),
            _ => None,
        }
    }
}

impl InfoValue for f64 {
    fn into_value(self) -> Value {
        Value::Double(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }
}

impl InfoValue for Vec<f64> {
    fn into_value(self) -> Value {
        Value::DoubleVector(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::DoubleVector(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl InfoValue for [f64; 3] {
    fn into_value(self) -> Value {
        Value::DoubleVector(self.to_vec())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::DoubleVector(v) => <[f64; 3]>::try_from(v.as_slice()).ok(),
            _ => None,
        }
    }
}

impl InfoValue for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl InfoValue for Vec<String> {
    fn into_value(self) -> Value {
        Value::StringVector(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::StringVector(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl InfoValue for Arc<DataObject> {
    fn into_value(self) -> Value {
        Value::Object(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl InfoValue for Marker {
    fn into_value(self) -> Value {
        Value::Marker
    }

    fn from_value(value: &Value) -> Option<Self> {
        matches!(value, Value::Marker).then_some(Marker)
    }
}

/// Type names travel as strings, the way they appear at the public boundary.
impl InfoValue for DataObjectType {
    fn into_value(self) -> Value {
        Value::String(self.name().to_owned())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

/// A list of acceptable types; a single string is read as a one-element list.
impl InfoValue for Vec<DataObjectType> {
    fn into_value(self) -> Value {
        Value::StringVector(self.iter().map(|t| t.name().to_owned()).collect())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => s.parse().ok().map(|t| vec![t]),
            Value::StringVector(v) => v.iter().map(|s| s.parse().ok()).collect(),
            _ => None,
        }
    }
}

/// Keyed metadata bag attached to ports and requests.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Information {
    entries: BTreeMap<&'static str, Value>,
}

impl Information {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<T: InfoValue>(&mut self, key: Key<T>, value: T) {
        self.entries.insert(key.name, value.into_value());
    }

    /// Value stored under `key`, or `None` when absent or of another type.
    pub fn get<T: InfoValue>(&self, key: Key<T>) -> Option<T> {
        self.entries.get(key.name).and_then(T::from_value)
    }

    pub fn has<T>(&self, key: Key<T>) -> bool {
        self.entries.contains_key(key.name)
    }

    /// Flag keys read as `false` when absent.
    pub fn flag(&self, key: Key<bool>) -> bool {
        self.get(key).unwrap_or(false)
    }

    pub fn remove<T>(&mut self, key: Key<T>) -> bool {
        self.entries.remove(key.name).is_some()
    }

    /// Copy the entry for `key` from `from`, removing it here when absent there.
    pub fn copy_entry<T>(&mut self, from: &Information, key: Key<T>) {
        match from.entries.get(key.name) {
            Some(v) => {
                self.entries.insert(key.name, v.clone());
            }
            None => {
                self.entries.remove(key.name);
            }
        }
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn set_value(&mut self, name: &'static str, value: Value) {
        self.entries.insert(name, value);
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Keep only entries whose key name satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|name, _| keep(name));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Borrow the data object stored under `DATA_OBJECT`.
    pub fn data_object(&self) -> Option<&Arc<DataObject>> {
        match self.entries.get(keys::DATA_OBJECT.name) {
            Some(Value::Object(obj)) => Some(obj),
            _ => None,
        }
    }

    /// Mutable access to the stored data object, detaching it from other holders.
    pub fn data_object_mut(&mut self) -> Option<&mut DataObject> {
        match self.entries.get_mut(keys::DATA_OBJECT.name) {
            Some(Value::Object(obj)) => Some(Arc::make_mut(obj)),
            _ => None,
        }
    }

    pub fn set_data_object(&mut self, obj: DataObject) {
        self.set(keys::DATA_OBJECT, Arc::new(obj));
    }
}

#[cfg(test)]
mod tests {
    use super::keys::*;
    use super::*;
    use crate::data::image::ImageData;

    #[test]
    fn typed_keys_read_back_their_type() {
        let mut info = Information::new();
        info.set(WHOLE_EXTENT, Extent::new(0, 9, 0, 9, 0, 0));
        info.set(UPDATE_PIECE_NUMBER, 3);
        info.set(SPACING, [0.5, 0.5, 1.0]);
        info.set(CAN_PRODUCE_SUB_EXTENT, true);
        assert_eq!(info.get(WHOLE_EXTENT), Some(Extent::new(0, 9, 0, 9, 0, 0)));
        assert_eq!(info.get(UPDATE_PIECE_NUMBER), Some(3));
        assert_eq!(info.get(SPACING), Some([0.5, 0.5, 1.0]));
        assert!(info.flag(CAN_PRODUCE_SUB_EXTENT));
        assert!(!info.flag(INPUT_IS_OPTIONAL));
        assert_eq!(info.len(), 4);
        assert!(info.remove(UPDATE_PIECE_NUMBER));
        assert!(!info.has(UPDATE_PIECE_NUMBER));
    }

    #[test]
    fn required_type_accepts_string_or_vector() {
        let mut info = Information::new();
        info.set_value(INPUT_REQUIRED_DATA_TYPE.name(), Value::String("svtkImageData".into()));
        assert_eq!(
            info.get(INPUT_REQUIRED_DATA_TYPE),
            Some(vec![DataObjectType::ImageData])
        );
        info.set(
            INPUT_REQUIRED_DATA_TYPE,
            vec![DataObjectType::PolyData, DataObjectType::UnstructuredGrid],
        );
        assert_eq!(info.get(INPUT_REQUIRED_DATA_TYPE).map(|v| v.len()), Some(2));
    }

    #[test]
    fn data_object_is_copy_on_write() {
        let mut info = Information::new();
        info.set_data_object(ImageData::with_dimensions([2, 2, 2]).into());
        let shared = info.data_object().cloned().unwrap();
        if let Some(DataObject::ImageData(img)) = info.data_object_mut() {
            img.set_origin([1.0, 0.0, 0.0]);
        }
        assert_eq!(shared.as_image().map(|i| i.origin()), Some([0.0; 3]));
        assert_eq!(
            info.data_object().and_then(|d| d.as_image()).map(|i| i.origin()),
            Some([1.0, 0.0, 0.0])
        );
    }

    #[test]
    fn copy_entry_mirrors_presence() {
        let mut a = Information::new();
        let mut b = Information::new();
        a.set(TIME_STEPS, vec![0.0, 0.5]);
        b.set(TIME_RANGE, vec![0.0, 1.0]);
        b.copy_entry(&a, TIME_STEPS);
        b.copy_entry(&a, TIME_RANGE);
        assert_eq!(b.get(TIME_STEPS), Some(vec![0.0, 0.5]));
        assert!(!b.has(TIME_RANGE));
    }
}
