//! Standard information keys.

use std::sync::Arc;

use super::{Key, Marker};
use crate::data::extent::Extent;
use crate::data::object::{DataObject, DataObjectType};

// --- structured metadata, declared upstream --------------------------------
pub const WHOLE_EXTENT: Key<Extent> = Key::new("WHOLE_EXTENT");
pub const SPACING: Key<[f64; 3]> = Key::new("SPACING");
pub const ORIGIN: Key<[f64; 3]> = Key::new("ORIGIN");
pub const TIME_STEPS: Key<Vec<f64>> = Key::new("TIME_STEPS");
/// `[t_min, t_max]`.
pub const TIME_RANGE: Key<Vec<f64>> = Key::new("TIME_RANGE");
/// Names of the point arrays a source will produce.
pub const POINT_ARRAY_NAMES: Key<Vec<String>> = Key::new("POINT_ARRAY_NAMES");
/// The source can clip its output to any sub-extent of `WHOLE_EXTENT`.
pub const CAN_PRODUCE_SUB_EXTENT: Key<bool> = Key::new("CAN_PRODUCE_SUB_EXTENT");
/// The source can produce any piece of an unstructured decomposition.
pub const CAN_HANDLE_PIECE_REQUEST: Key<bool> = Key::new("CAN_HANDLE_PIECE_REQUEST");

// --- requests, propagated downstream to upstream -----------------------------
pub const UPDATE_EXTENT: Key<Extent> = Key::new("UPDATE_EXTENT");
/// Set once `UPDATE_EXTENT` holds a real request rather than the default.
pub const UPDATE_EXTENT_INITIALIZED: Key<bool> = Key::new("UPDATE_EXTENT_INITIALIZED");
pub const UPDATE_PIECE_NUMBER: Key<i32> = Key::new("UPDATE_PIECE_NUMBER");
pub const UPDATE_NUMBER_OF_PIECES: Key<i32> = Key::new("UPDATE_NUMBER_OF_PIECES");
pub const UPDATE_NUMBER_OF_GHOST_LEVELS: Key<i32> = Key::new("UPDATE_NUMBER_OF_GHOST_LEVELS");
pub const UPDATE_TIME_STEP: Key<f64> = Key::new("UPDATE_TIME_STEP");
/// The full request saved while a source runs on one translated piece.
pub const ALL_PIECES_EXTENT: Key<Extent> = Key::new("ALL_PIECES_EXTENT");

// --- data description, recorded after execution ------------------------------
pub const DATA_OBJECT: Key<Arc<DataObject>> = Key::new("DATA_OBJECT");
pub const DATA_EXTENT: Key<Extent> = Key::new("DATA_EXTENT");
pub const DATA_PIECE_NUMBER: Key<i32> = Key::new("DATA_PIECE_NUMBER");
pub const DATA_NUMBER_OF_PIECES: Key<i32> = Key::new("DATA_NUMBER_OF_PIECES");
pub const DATA_NUMBER_OF_GHOST_LEVELS: Key<i32> = Key::new("DATA_NUMBER_OF_GHOST_LEVELS");
pub const DATA_TIME_STEP: Key<f64> = Key::new("DATA_TIME_STEP");

// --- port declarations -------------------------------------------------------
pub const DATA_TYPE_NAME: Key<DataObjectType> = Key::new("DATA_TYPE_NAME");
pub const INPUT_REQUIRED_DATA_TYPE: Key<Vec<DataObjectType>> = Key::new("INPUT_REQUIRED_DATA_TYPE");
pub const INPUT_IS_OPTIONAL: Key<bool> = Key::new("INPUT_IS_OPTIONAL");
pub const INPUT_IS_REPEATABLE: Key<bool> = Key::new("INPUT_IS_REPEATABLE");

// --- request objects ---------------------------------------------------------
pub const REQUEST_DATA_OBJECT: Key<Marker> = Key::new("REQUEST_DATA_OBJECT");
pub const REQUEST_INFORMATION: Key<Marker> = Key::new("REQUEST_INFORMATION");
pub const REQUEST_UPDATE_EXTENT: Key<Marker> = Key::new("REQUEST_UPDATE_EXTENT");
pub const REQUEST_DATA: Key<Marker> = Key::new("REQUEST_DATA");
/// Output port whose request started the pass.
pub const FROM_OUTPUT_PORT: Key<i32> = Key::new("FROM_OUTPUT_PORT");

// --- composite metadata ------------------------------------------------------
pub const NAME: Key<String> = Key::new("NAME");
