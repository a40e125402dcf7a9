//! Error types for hetmp.

use thiserror::Error;

/// Every failure the engine can report.
///
/// All variants are input-validation failures: the engine is pure and
/// deterministic, so retrying a failed call with the same inputs fails again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A tensor or sequence has a different extent than the one declared.
    #[error("shape mismatch in {what}: expected {expected}, got {got}")]
    ShapeMismatch {
        what: String,
        expected: usize,
        got: usize,
    },

    /// An edge or group index points outside its node set.
    #[error("{what} index {index} out of range for {bound} nodes")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        bound: usize,
    },

    /// An index tensor holds a negative entry.
    #[error("{what} index {index} is negative")]
    NegativeIndex { what: &'static str, index: i64 },

    /// A message stage needs an input that was not supplied.
    #[error("missing argument: {0}")]
    MissingArgument(String),

    /// A node type that is not part of the layer's metadata.
    #[error("unknown node type `{0}`")]
    UnknownNodeType(String),

    /// An edge type that is not part of the layer's metadata.
    #[error("unknown edge type {0}")]
    UnknownEdgeType(String),

    /// A configuration that cannot produce a layer.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Reading tensor data back from the backend failed.
    #[error("tensor data: {0}")]
    TensorData(String),
}

impl Error {
    pub(crate) fn shape(what: impl Into<String>, expected: usize, got: usize) -> Self {
        Self::ShapeMismatch {
            what: what.into(),
            expected,
            got,
        }
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
