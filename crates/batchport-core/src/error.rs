use thiserror::Error;

use crate::{DType, Shape};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TensorError {
    #[error("shape {shape} holds {expected} elements, got {actual} values")]
    ElementCountMismatch {
        shape: Shape,
        expected: usize,
        actual: usize,
    },

    #[error("dtype mismatch: expected {expected}, got {actual}")]
    DTypeMismatch { expected: DType, actual: DType },

    #[error("range {start}..{end} out of bounds for {len} values")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },

    #[error("unknown dtype name {0:?}")]
    UnknownDType(String),
}

/// A request that does not fit the schema of the batch it was offered to.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaViolation {
    #[error("tensor `{tensor}` is missing")]
    Missing { tensor: String },

    #[error("tensor `{tensor}` is not part of the batch schema")]
    Unexpected { tensor: String },

    #[error("tensor `{tensor}` has dtype {actual}, batch expects {expected}")]
    DType {
        tensor: String,
        expected: DType,
        actual: DType,
    },

    #[error("tensor `{tensor}` has trailing dims {actual:?}, batch expects {expected:?}")]
    TrailingDims {
        tensor: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("tensor `{tensor}` is a scalar in the batch and cannot take more rows")]
    Scalar { tensor: String },

    #[error("tensor `{tensor}` is batched but arrived as a scalar")]
    Unbatched { tensor: String },

    #[error("tensor `{tensor}` has {actual} rows, request has {expected}")]
    Rows {
        tensor: String,
        expected: usize,
        actual: usize,
    },

    #[error("tensor `{tensor}` is absent from the first request of the batch")]
    NotInBatch { tensor: String },
}

/// Failure reported by the model executor.
///
/// `code` follows the executor convention: negative values are failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("predict failed with status {code}: {message}")]
pub struct PredictError {
    pub code: i32,
    pub message: String,
}

impl PredictError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
