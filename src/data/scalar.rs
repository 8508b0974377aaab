//! Element types for attribute arrays.
//!
//! [`ScalarType`] is the closed set of element tags an array can carry and
//! [`ArrayElement`] maps each numeric Rust type onto its tag and onto the
//! matching [`ArrayValues`] variant.

use std::fmt;

use num_traits::{NumCast, ToPrimitive};

use crate::data::array::ArrayValues;
use crate::data::storage::SharedStorage;

/// Element type tag for attribute arrays.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ScalarType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    /// Variable-length UTF-8 strings.
    String,
}

/// Integer type used for point and cell ids.
#[cfg(not(feature = "id32"))]
pub type IdType = i64;
/// Integer type used for point and cell ids.
#[cfg(feature = "id32")]
pub type IdType = i32;

/// Tag of [`IdType`] arrays.
pub const ID_TYPE: ScalarType = <IdType as ArrayElement>::SCALAR_TYPE;

impl ScalarType {
    /// Returns a stable string label for the scalar type.
    pub fn as_str(self) -> &'static str {
        match self {
            ScalarType::Int8 => "int8",
            ScalarType::UInt8 => "uint8",
            ScalarType::Int16 => "int16",
            ScalarType::UInt16 => "uint16",
            ScalarType::Int32 => "int32",
            ScalarType::UInt32 => "uint32",
            ScalarType::Int64 => "int64",
            ScalarType::UInt64 => "uint64",
            ScalarType::Float32 => "float32",
            ScalarType::Float64 => "float64",
            ScalarType::String => "string",
        }
    }

    /// Parse a scalar type from a string label. `"id"` resolves to [`ID_TYPE`].
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "int8" => Some(ScalarType::Int8),
            "uint8" => Some(ScalarType::UInt8),
            "int16" => Some(ScalarType::Int16),
            "uint16" => Some(ScalarType::UInt16),
            "int32" => Some(ScalarType::Int32),
            "uint32" => Some(ScalarType::UInt32),
            "int64" => Some(ScalarType::Int64),
            "uint64" => Some(ScalarType::UInt64),
            "float32" => Some(ScalarType::Float32),
            "float64" => Some(ScalarType::Float64),
            "string" => Some(ScalarType::String),
            "id" => Some(ID_TYPE),
            _ => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        self != ScalarType::String
    }

    pub fn is_floating_point(self) -> bool {
        matches!(self, ScalarType::Float32 | ScalarType::Float64)
    }

    /// Size in bytes of one element. Strings report the size of their handle.
    pub fn element_size(self) -> usize {
        match self {
            ScalarType::Int8 | ScalarType::UInt8 => 1,
            ScalarType::Int16 | ScalarType::UInt16 => 2,
            ScalarType::Int32 | ScalarType::UInt32 | ScalarType::Float32 => 4,
            ScalarType::Int64 | ScalarType::UInt64 | ScalarType::Float64 => 8,
            ScalarType::String => std::mem::size_of::<String>(),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric element of an attribute array.
pub trait ArrayElement:
    Copy
    + Default
    + PartialOrd
    + NumCast
    + ToPrimitive
    + bytemuck::Pod
    + Send
    + Sync
    + fmt::Debug
    + 'static
{
    /// Scalar type tag for this concrete type.
    const SCALAR_TYPE: ScalarType;

    /// Wrap typed storage into the tagged container.
    fn wrap(values: SharedStorage<Self>) -> ArrayValues;
    /// Borrow typed storage if the tag matches.
    fn unwrap(values: &ArrayValues) -> Option<&SharedStorage<Self>>;
    /// Mutably borrow typed storage if the tag matches.
    fn unwrap_mut(values: &mut ArrayValues) -> Option<&mut SharedStorage<Self>>;

    /// Widen to `f64`; never fails for the supported types.
    #[inline]
    fn to_f64_lossy(self) -> f64 {
        ToPrimitive::to_f64(&self).unwrap_or(f64::NAN)
    }

    /// Narrow from `f64`, yielding zero when the value is not representable.
    #[inline]
    fn from_f64_lossy(v: f64) -> Self {
        <Self as NumCast>::from(v).unwrap_or_default()
    }
}

macro_rules! impl_array_element {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl ArrayElement for $t {
                const SCALAR_TYPE: ScalarType = ScalarType::$variant;

                fn wrap(values: SharedStorage<Self>) -> ArrayValues {
                    ArrayValues::$variant(values)
                }

                fn unwrap(values: &ArrayValues) -> Option<&SharedStorage<Self>> {
                    if let ArrayValues::$variant(values) = values {
                        Some(values)
                    } else {
                        None
                    }
                }

                fn unwrap_mut(values: &mut ArrayValues) -> Option<&mut SharedStorage<Self>> {
                    if let ArrayValues::$variant(values) = values {
                        Some(values)
                    } else {
                        None
                    }
                }
            }
        )*
    };
}

impl_array_element!(
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
);
