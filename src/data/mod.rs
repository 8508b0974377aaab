//! Data module: data objects, attribute arrays and their storage.
//!
//! Every data object is a plain value. Cloning one is a shallow copy: array
//! and topology buffers are reference counted and detach on first write.
//! `deep_copy` duplicates every buffer.

pub mod array;
pub mod attributes;
pub mod cache;
pub mod cell_array;
pub mod cell_type;
pub mod extent;
pub mod ghost;
pub mod image;
pub mod multiblock;
pub mod object;
pub mod points;
pub mod poly;
pub mod rectilinear;
pub mod scalar;
pub mod storage;
pub mod structured_grid;
pub mod table;
pub mod unstructured;

pub use array::{ArrayValues, DataArray};
pub use attributes::{AttributeRole, DataSetAttributes, FieldData};
pub use cell_array::CellArray;
pub use cell_type::CellType;
pub use extent::Extent;
pub use image::ImageData;
pub use multiblock::{Block, MultiBlockDataSet};
pub use object::{DataObject, DataObjectType};
pub use points::{Bounds, Points};
pub use poly::PolyData;
pub use rectilinear::RectilinearGrid;
pub use scalar::{ArrayElement, ID_TYPE, IdType, ScalarType};
pub use storage::{SharedStorage, Storage};
pub use structured_grid::StructuredGrid;
pub use table::Table;
pub use unstructured::UnstructuredGrid;
