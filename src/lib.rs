#![cfg_attr(docsrs, feature(doc_cfg))]
//! # svtk-pipeline
//!
//! svtk-pipeline is a demand-driven dataflow engine for scientific
//! visualization. Algorithms are connected into a directed acyclic graph;
//! asking for the output of any node pulls exactly the data it needs
//! through four request passes (data object, information, update extent,
//! data) and re-executes only what is out of date.
//!
//! ## Features
//! - Typed data objects (image, rectilinear, structured, poly and
//!   unstructured grids, tables, multi-block) with shared, copy-on-write
//!   attribute arrays
//! - Typed information keys describing what a port can produce and what a
//!   consumer requests
//! - Piece streaming: structured sources split their whole extent into
//!   pieces with optional ghost layers
//! - Prioritized observers, progress reporting and cooperative abort
//! - Reference sources and filters plus a colour-mapping mapper
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! svtk-pipeline = "0.1"
//! # Optional features:
//! # features = ["rayon", "id32"]
//! ```
//!
//! ## Shared payloads
//! Outputs are handed out as `Arc<DataObject>`. Cloning a data object
//! shares its buffers; a consumer that modifies a shared array detaches a
//! private copy first, so cached upstream results never change underneath
//! their producer.

pub mod config;
pub mod data;
pub mod consistency;
pub mod event;
pub mod filters;
pub mod information;
pub mod pipeline;
pub mod pipeline_error;
pub mod rendering;

pub use consistency::Consistent;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::config::PipelineConfig;
    pub use crate::data::{
        AttributeRole, Block, Bounds, CellArray, CellType, DataArray, DataObject, DataObjectType,
        DataSetAttributes, Extent, FieldData, IdType, ImageData, MultiBlockDataSet, Points,
        PolyData, RectilinearGrid, ScalarType, StructuredGrid, Table, UnstructuredGrid,
    };
    pub use crate::consistency::Consistent;
    pub use crate::event::{CallData, CallDataType, EventContext, EventKind, ObserverTag};
    pub use crate::filters::{
        AttributeTable, ContourFilter, ElevationFilter, ExtractExtent, FieldAssociation,
        GroupDataSets, ImplicitFunction, Plane, PlaneSource, SampleFunction, Sphere,
    };
    pub use crate::information::{Information, Key, keys};
    pub use crate::pipeline::{
        Algorithm, AlgorithmId, ExecutionStatus, OutputPort, Pipeline, RequestContext, RequestPass,
        SplitMode, TrivialProducer,
    };
    pub use crate::pipeline_error::{ErrorKind, PipelineError, PipelineResult};
    pub use crate::rendering::{LookupTable, Mapper, RenderWindow, ScalarMode};
}
