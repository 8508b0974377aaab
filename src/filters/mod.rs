//! Reference sources and filters built on the [`Algorithm`](crate::pipeline::Algorithm) trait.

pub mod attribute_table;
pub mod contour;
pub mod elevation;
pub mod extract_extent;
pub mod group;
pub mod implicit;
pub mod plane_source;
pub mod sample_function;

pub use attribute_table::{AttributeTable, FieldAssociation};
pub use contour::ContourFilter;
pub use elevation::ElevationFilter;
pub use extract_extent::ExtractExtent;
pub use group::GroupDataSets;
pub use implicit::{ImplicitFunction, Plane, Sphere};
pub use plane_source::PlaneSource;
pub use sample_function::SampleFunction;
