//! Error types for building, serializing and loading probing tables.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("table file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("size mismatch: expected {expected} bytes, file has {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    #[error("unsupported format version {found} (supported: {supported})")]
    VersionMismatch { found: u32, supported: u32 },

    #[error("corrupt table: {0}")]
    Corrupt(String),

    #[error("duplicate key {0:#018x}")]
    DuplicateKey(u64),

    #[error("table full: no empty slot among {buckets} buckets")]
    TableFull { buckets: usize },

    #[error("record out of bounds: need {needed} bytes at offset {offset}, region has {available}")]
    RecordBounds {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("malformed phrase property: {0}")]
    MalformedProperty(String),

    #[error(transparent)]
    Stats(#[from] StatsError),
}

/// Which count of a statistics record a [`StatsError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountField {
    TargetMarginal,
    SourceMarginal,
    JointCount,
}

impl std::fmt::Display for CountField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CountField::TargetMarginal => "target marginal",
            CountField::SourceMarginal => "source marginal",
            CountField::JointCount => "joint count",
        })
    }
}

/// Malformed-input errors from the phrase statistics parser.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("counts: missing {field}")]
    Missing { field: CountField },

    #[error("counts: {field} is not numeric: {token:?}")]
    NotNumeric { field: CountField, token: String },

    #[error("counts: {field} must be positive, got {value}")]
    NonPositive { field: CountField, value: f32 },

    #[error("counts: unexpected trailing input {0:?}")]
    TrailingInput(String),
}

pub type Result<T> = std::result::Result<T, TableError>;
