//! PipelineError: Unified error type for svtk-pipeline public APIs
//!
//! Every engine operation reports failure through this type instead of
//! panicking. Each variant belongs to one [`ErrorKind`], which is also the
//! payload kind carried by `ErrorEvent`.

use std::fmt;

use thiserror::Error;

use crate::data::extent::Extent;
use crate::data::object::DataObjectType;
use crate::data::scalar::ScalarType;
use crate::pipeline::executive::RequestPass;

/// Convenience result type used across the crate.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Coarse classification of a [`PipelineError`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Unconnected input, incompatible input type, impossible extent.
    Configuration,
    /// A request handler reported failure.
    Execution,
    /// Programmer error: recursive update, out-of-range port, mutation of
    /// an executing algorithm.
    ContractViolation,
    /// Malformed data object content (array shapes, extents, cell lists).
    Data,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::Execution => "ExecutionError",
            ErrorKind::ContractViolation => "ContractViolation",
            ErrorKind::Data => "DataError",
        };
        f.write_str(s)
    }
}

/// Direction of a port, used in diagnostics.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PortDirection {
    Input,
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input => f.write_str("input"),
            PortDirection::Output => f.write_str("output"),
        }
    }
}

/// Unified error type for pipeline operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    // --- configuration -----------------------------------------------------
    /// A required input port has no connection.
    #[error("input port {port} of `{algorithm}` is not connected")]
    UnconnectedInput { algorithm: String, port: usize },
    /// The producer connected to an input port emits a type the port rejects.
    #[error("input port {port} of `{algorithm}` requires {expected} but the connected producer emits {found}")]
    IncompatibleInput {
        algorithm: String,
        port: usize,
        expected: String,
        found: DataObjectType,
    },
    /// A requested extent lies outside the declared whole extent.
    #[error("update extent {requested} on output {port} of `{algorithm}` lies outside the whole extent {whole}")]
    ExtentOutsideWholeExtent {
        algorithm: String,
        port: usize,
        requested: Extent,
        whole: Extent,
    },
    /// Piece request with `piece >= pieces` or `pieces < 1`.
    #[error("invalid piece request {piece} of {pieces} on output {port} of `{algorithm}`")]
    InvalidPieceRequest {
        algorithm: String,
        port: usize,
        piece: i32,
        pieces: i32,
    },
    /// Connecting the ports would close a cycle in the pipeline graph.
    #[error("connecting `{upstream}` into `{downstream}` would create a cycle")]
    CyclicConnection { upstream: String, downstream: String },
    /// `add_input_connection` on a port that accepts one connection only.
    #[error("input port {port} of `{algorithm}` is not repeatable and is already connected")]
    PortNotRepeatable { algorithm: String, port: usize },
    /// An output port declares no data type and no data object was created.
    #[error("output port {port} of `{algorithm}` has no data object after RequestDataObject")]
    MissingOutputDataObject { algorithm: String, port: usize },

    // --- execution ---------------------------------------------------------
    /// A request handler returned failure.
    #[error("`{algorithm}` failed during {pass}: {message}")]
    RequestFailed {
        algorithm: String,
        pass: RequestPass,
        message: String,
    },

    // --- contract violations -------------------------------------------------
    /// `Update` entered on an algorithm that is already executing.
    #[error("recursive update of `{0}` while it is already executing")]
    RecursiveUpdate(String),
    /// Parameters of an executing algorithm were modified.
    #[error("`{0}` cannot be modified or inspected while it is executing")]
    AlgorithmBusy(String),
    /// A port index outside the declared port count.
    #[error("{direction} port {index} is out of range for `{algorithm}` ({count} ports)")]
    PortOutOfRange {
        algorithm: String,
        direction: PortDirection,
        index: usize,
        count: usize,
    },
    /// The port layout changed after the first execution.
    #[error("port layout of `{0}` cannot change after its first execution")]
    PortLayoutFrozen(String),
    /// An id that does not name a live algorithm.
    #[error("no algorithm with id {0}")]
    UnknownAlgorithm(usize),
    /// Downcast of an algorithm to the wrong concrete type.
    #[error("algorithm `{0}` is not of the requested type")]
    AlgorithmTypeMismatch(String),
    /// Removal of an algorithm that still feeds downstream consumers.
    #[error("algorithm `{algorithm}` still feeds `{consumer}`")]
    AlgorithmInUse { algorithm: String, consumer: String },
    /// Observer registration or removal during event dispatch.
    #[error("observers of `{0}` cannot be added or removed while an event is being dispatched")]
    ObserverRegistrationDuringDispatch(String),

    // --- data ----------------------------------------------------------------
    /// Array tuple count disagrees with its attribute collection.
    #[error("array `{name}` has {found} tuples but the collection holds {expected}")]
    TupleCountMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    /// Arrays need at least one component per tuple.
    #[error("array `{0}` must have at least one component")]
    ZeroComponents(String),
    /// Flat value count is not a multiple of the component count.
    #[error("array `{name}` holds {len} values which is not a multiple of {components} components")]
    ComponentMismatch {
        name: String,
        len: usize,
        components: usize,
    },
    /// Typed access with the wrong element type.
    #[error("array element type mismatch: expected {expected}, found {found}")]
    ScalarTypeMismatch {
        expected: ScalarType,
        found: ScalarType,
    },
    /// A named array does not exist.
    #[error("no array named `{0}`")]
    MissingArray(String),
    /// Tuple index past the end of an array.
    #[error("tuple {index} is out of range for array `{name}` with {tuples} tuples")]
    TupleOutOfRange {
        name: String,
        index: usize,
        tuples: usize,
    },
    /// A read or write past the end of a storage buffer.
    #[error("storage range {offset}..{offset}+{len} exceeds buffer length {available}")]
    StorageOutOfRange {
        offset: usize,
        len: usize,
        available: usize,
    },
    /// An attribute role was assigned an array of the wrong shape.
    #[error("array `{name}` with {components} components cannot be the active {role}")]
    InvalidAttribute {
        name: String,
        role: String,
        components: usize,
    },
    /// An extent with `hi < lo - 1` on some axis.
    #[error("invalid extent {0}")]
    InvalidExtent(Extent),
    /// Image spacing must be strictly positive.
    #[error("image spacing must be positive on every axis, got {0:?}")]
    InvalidSpacing([f64; 3]),
    /// Image direction matrix must have unit determinant.
    #[error("image direction matrix must have determinant +-1, got {0}")]
    InvalidDirection(f64),
    /// A cell references a point that does not exist.
    #[error("cell connectivity references point {point} but only {count} points exist")]
    CellPointOutOfRange { point: i64, count: usize },
    /// A fixed-size cell was given the wrong number of points.
    #[error("cell type {cell_type} needs {expected} points, got {found}")]
    CellSizeMismatch {
        cell_type: String,
        expected: usize,
        found: usize,
    },
    /// Structural inconsistency in a cell array.
    #[error("invalid cell array: {0}")]
    InvalidCellArray(String),
    /// A type name outside the closed set of data object types.
    #[error("unknown data object type `{0}`")]
    UnknownDataType(String),
    /// Abstract type names cannot be instantiated.
    #[error("cannot instantiate abstract data object type {0}")]
    AbstractDataType(DataObjectType),
    /// Pieces handed to a stitching routine disagree on geometry or arrays.
    #[error("pieces cannot be merged: {0}")]
    IncompatiblePieces(String),
}

impl PipelineError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        use PipelineError::*;
        match self {
            UnconnectedInput { .. }
            | IncompatibleInput { .. }
            | ExtentOutsideWholeExtent { .. }
            | InvalidPieceRequest { .. }
            | CyclicConnection { .. }
            | PortNotRepeatable { .. }
            | MissingOutputDataObject { .. } => ErrorKind::Configuration,
            RequestFailed { .. } => ErrorKind::Execution,
            RecursiveUpdate(_)
            | AlgorithmBusy(_)
            | PortOutOfRange { .. }
            | PortLayoutFrozen(_)
            | UnknownAlgorithm(_)
            | AlgorithmTypeMismatch(_)
            | AlgorithmInUse { .. }
            | ObserverRegistrationDuringDispatch(_) => ErrorKind::ContractViolation,
            TupleCountMismatch { .. }
            | ZeroComponents(_)
            | ComponentMismatch { .. }
            | ScalarTypeMismatch { .. }
            | MissingArray(_)
            | TupleOutOfRange { .. }
            | StorageOutOfRange { .. }
            | InvalidAttribute { .. }
            | InvalidExtent(_)
            | InvalidSpacing(_)
            | InvalidDirection(_)
            | CellPointOutOfRange { .. }
            | CellSizeMismatch { .. }
            | InvalidCellArray(_)
            | UnknownDataType(_)
            | AbstractDataType(_)
            | IncompatiblePieces(_) => ErrorKind::Data,
        }
    }

    /// Build a [`PipelineError::RequestFailed`] value.
    pub fn request_failed(
        algorithm: impl Into<String>,
        pass: RequestPass,
        message: impl Into<String>,
    ) -> Self {
        PipelineError::RequestFailed {
            algorithm: algorithm.into(),
            pass,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_cover_the_taxonomy() {
        let e = PipelineError::UnconnectedInput {
            algorithm: "ContourFilter#1".into(),
            port: 0,
        };
        assert_eq!(e.kind(), ErrorKind::Configuration);
        assert_eq!(
            PipelineError::RecursiveUpdate("x".into()).kind(),
            ErrorKind::ContractViolation
        );
        assert_eq!(
            PipelineError::request_failed("x", RequestPass::Data, "boom").kind(),
            ErrorKind::Execution
        );
        assert_eq!(
            PipelineError::InvalidSpacing([0.0, 1.0, 1.0]).kind(),
            ErrorKind::Data
        );
    }

    #[test]
    fn messages_name_the_algorithm() {
        let e = PipelineError::request_failed("SampleFunction#0", RequestPass::Data, "no memory");
        assert_eq!(
            e.to_string(),
            "`SampleFunction#0` failed during REQUEST_DATA: no memory"
        );
        assert_eq!(ErrorKind::Configuration.to_string(), "ConfigurationError");
    }
}
