//! Rendering-side consumers: colour mapping, mappers and the event sources
//! that drive them. Nothing here draws; a host renderer reads the mapped
//! colours and the mapper's input.

pub mod lookup_table;
pub mod mapper;
pub mod window;

pub use lookup_table::{LookupTable, Rgba};
pub use mapper::{ColorAssociation, MappedColors, Mapper, ScalarMode};
pub use window::{Interactor, RenderOutcome, RenderWindow};
