use batchport_core::{DType, TensorError};
use thiserror::Error;

use crate::v1 as pb;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed message: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("failed to encode frame: {0}")]
    Encode(#[from] prost::EncodeError),

    #[error("tensor `{tensor}`: unknown dtype enum value {raw}")]
    UnknownDType { tensor: String, raw: i32 },

    #[error("tensor `{tensor}`: dtype {dtype:?} is not supported")]
    UnsupportedDType {
        tensor: String,
        dtype: pb::ArrayDataType,
    },

    #[error("tensor `{tensor}`: negative dimension {dim}")]
    NegativeDim { tensor: String, dim: i64 },

    #[error("tensor `{tensor}`: `{field}` is populated but dtype is {dtype}")]
    StrayValues {
        tensor: String,
        field: &'static str,
        dtype: DType,
    },

    #[error("tensor `{tensor}`: value {value} does not fit {dtype}")]
    OutOfRange {
        tensor: String,
        value: i32,
        dtype: DType,
    },

    #[error("tensor `{tensor}`: {source}")]
    Tensor {
        tensor: String,
        #[source]
        source: TensorError,
    },

    #[error("truncated frame: need {needed} bytes, {remaining} left")]
    TruncatedFrame { needed: usize, remaining: usize },
}
