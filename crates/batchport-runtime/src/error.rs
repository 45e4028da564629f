use batchport_core::{PredictError, SchemaViolation, TensorError};
use batchport_proto::WireError;
use thiserror::Error;

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_INTERNAL: u16 = 500;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("request {index}: {source}")]
    Decode {
        index: usize,
        #[source]
        source: WireError,
    },

    #[error("request {index}: {source}")]
    SchemaMismatch {
        index: usize,
        #[source]
        source: SchemaViolation,
    },

    #[error("request {index}: no tensor has a batch dimension")]
    MissingBatchDim { index: usize },

    #[error("Predict Process Failed: {0}")]
    Predict(#[from] PredictError),

    #[error("output `{tensor}`: ledger covers {expected} elements, tensor holds {actual}")]
    LedgerInconsistency {
        tensor: String,
        expected: usize,
        actual: usize,
    },

    #[error("output `{tensor}` has no batch dimension to split")]
    UnbatchedOutput { tensor: String },

    #[error(transparent)]
    Tensor(#[from] TensorError),
}

impl BatchError {
    /// Index of the offending request for per-request failures.
    pub fn request_index(&self) -> Option<usize> {
        match self {
            BatchError::Decode { index, .. }
            | BatchError::SchemaMismatch { index, .. }
            | BatchError::MissingBatchDim { index } => Some(*index),
            _ => None,
        }
    }

    pub fn status_code(&self) -> u16 {
        if self.request_index().is_some() {
            STATUS_BAD_REQUEST
        } else {
            STATUS_INTERNAL
        }
    }
}
