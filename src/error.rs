//! Error types
//!
//! Configuration problems are reported where the bad object is built or
//! inserted. Crashing and "no collision" are simulation values, not errors.

use thiserror::Error;

use crate::sim::LineId;

/// Errors from building or editing track lines
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackError {
    /// Both endpoints coincide
    #[error("line {id} has zero length")]
    ZeroLength { id: LineId },

    /// Record discriminant is not a known line kind
    #[error("line {id} has unknown kind {kind}")]
    UnknownKind { id: LineId, kind: u8 },

    /// Extension flags outside none/left/right/both
    #[error("line {id} has invalid extension flags {flags:#04b}")]
    InvalidExtension { id: LineId, flags: u8 },

    /// Accelerant multiplier below 1
    #[error("line {id} has invalid multiplier {multiplier}")]
    InvalidMultiplier { id: LineId, multiplier: i32 },

    /// Trigger with a non-positive zoom or zero duration
    #[error("line {id} has invalid trigger (zoom {target_zoom}, {frame_count} frames)")]
    InvalidTrigger {
        id: LineId,
        target_zoom: f64,
        frame_count: u32,
    },

    /// Scenery stroke width must be positive
    #[error("line {id} has invalid width {width}")]
    InvalidWidth { id: LineId, width: f64 },

    /// Endpoint is NaN or infinite
    #[error("line {id} has a non-finite endpoint")]
    NonFinite { id: LineId },

    /// The uninitialized sentinel id was used
    #[error("line id is unset")]
    UnsetId,

    /// Id already present in the track
    #[error("line {id} already exists")]
    DuplicateId { id: LineId },

    /// Id not present in the track
    #[error("line {id} not found")]
    UnknownLine { id: LineId },

    /// Edit not supported by this line kind
    #[error("line {id} does not support {operation}")]
    Unsupported {
        id: LineId,
        operation: &'static str,
    },

    /// A record in a batch failed
    #[error("record {index}: {source}")]
    Record {
        index: usize,
        #[source]
        source: Box<TrackError>,
    },
}

/// Errors from assembling a rider body
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BodyError {
    /// Body without points
    #[error("rider body has no points")]
    Empty,

    /// Bone references a point that does not exist
    #[error("bone {bone} references point {point}, body has {count} points")]
    PointOutOfRange {
        bone: usize,
        point: usize,
        count: usize,
    },

    /// Bone connects a point to itself
    #[error("bone {bone} connects point {point} to itself")]
    SelfReference { bone: usize, point: usize },

    /// Bone endpoints coincide at rest
    #[error("bone {bone} has zero rest length")]
    ZeroLength { bone: usize },

    /// Endurance must be finite and positive
    #[error("bone {bone} has invalid endurance {endurance}")]
    InvalidEndurance { bone: usize, endurance: f64 },

    /// Scarf anchor outside the body
    #[error("scarf anchor {anchor} out of range, body has {count} points")]
    ScarfAnchor { anchor: usize, count: usize },
}

/// Errors from loading settings or track files
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A tunable is outside its valid range
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error(transparent)]
    Track(#[from] TrackError),

    #[error(transparent)]
    Body(#[from] BodyError),
}
