//! Flat value storage for tensors.
//!
//! Exactly one typed array backs a tensor, selected by its dtype. Both the
//! merger (concatenation) and the splitter (range extraction) go through
//! [`TensorValues::append_range`], so the per-dtype dispatch lives here only.

use std::ops::Range;

use bytes::Bytes;

use crate::{DType, TensorError};

#[derive(Clone, Debug, PartialEq)]
pub enum TensorValues {
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Int32(Vec<i32>),
    UInt8(Vec<u8>),
    Int8(Vec<i8>),
    Int64(Vec<i64>),
    Bool(Vec<bool>),
    String(Vec<Bytes>),
}

macro_rules! each_variant {
    ($values:expr, $v:ident => $body:expr) => {
        match $values {
            TensorValues::Float32($v) => $body,
            TensorValues::Float64($v) => $body,
            TensorValues::Int32($v) => $body,
            TensorValues::UInt8($v) => $body,
            TensorValues::Int8($v) => $body,
            TensorValues::Int64($v) => $body,
            TensorValues::Bool($v) => $body,
            TensorValues::String($v) => $body,
        }
    };
}

impl TensorValues {
    pub fn empty(dtype: DType) -> Self {
        Self::with_capacity(dtype, 0)
    }

    pub fn with_capacity(dtype: DType, capacity: usize) -> Self {
        match dtype {
            DType::Float32 => TensorValues::Float32(Vec::with_capacity(capacity)),
            DType::Float64 => TensorValues::Float64(Vec::with_capacity(capacity)),
            DType::Int32 => TensorValues::Int32(Vec::with_capacity(capacity)),
            DType::UInt8 => TensorValues::UInt8(Vec::with_capacity(capacity)),
            DType::Int8 => TensorValues::Int8(Vec::with_capacity(capacity)),
            DType::Int64 => TensorValues::Int64(Vec::with_capacity(capacity)),
            DType::Bool => TensorValues::Bool(Vec::with_capacity(capacity)),
            DType::String => TensorValues::String(Vec::with_capacity(capacity)),
        }
    }

    /// `n` zero values (empty strings for `String`).
    pub fn zeros(dtype: DType, n: usize) -> Self {
        match dtype {
            DType::Float32 => TensorValues::Float32(vec![0.0; n]),
            DType::Float64 => TensorValues::Float64(vec![0.0; n]),
            DType::Int32 => TensorValues::Int32(vec![0; n]),
            DType::UInt8 => TensorValues::UInt8(vec![0; n]),
            DType::Int8 => TensorValues::Int8(vec![0; n]),
            DType::Int64 => TensorValues::Int64(vec![0; n]),
            DType::Bool => TensorValues::Bool(vec![false; n]),
            DType::String => TensorValues::String(vec![Bytes::new(); n]),
        }
    }

    pub fn dtype(&self) -> DType {
        match self {
            TensorValues::Float32(_) => DType::Float32,
            TensorValues::Float64(_) => DType::Float64,
            TensorValues::Int32(_) => DType::Int32,
            TensorValues::UInt8(_) => DType::UInt8,
            TensorValues::Int8(_) => DType::Int8,
            TensorValues::Int64(_) => DType::Int64,
            TensorValues::Bool(_) => DType::Bool,
            TensorValues::String(_) => DType::String,
        }
    }

    pub fn len(&self) -> usize {
        each_variant!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends `src[range]` onto `self`. Both sides must hold the same dtype.
    pub fn append_range(&mut self, src: &TensorValues, range: Range<usize>) -> Result<(), TensorError> {
        let len = src.len();
        if range.start > range.end || range.end > len {
            return Err(TensorError::RangeOutOfBounds {
                start: range.start,
                end: range.end,
                len,
            });
        }

        match (self, src) {
            (TensorValues::Float32(dst), TensorValues::Float32(src)) => {
                dst.extend_from_slice(&src[range])
            }
            (TensorValues::Float64(dst), TensorValues::Float64(src)) => {
                dst.extend_from_slice(&src[range])
            }
            (TensorValues::Int32(dst), TensorValues::Int32(src)) => {
                dst.extend_from_slice(&src[range])
            }
            (TensorValues::UInt8(dst), TensorValues::UInt8(src)) => {
                dst.extend_from_slice(&src[range])
            }
            (TensorValues::Int8(dst), TensorValues::Int8(src)) => {
                dst.extend_from_slice(&src[range])
            }
            (TensorValues::Int64(dst), TensorValues::Int64(src)) => {
                dst.extend_from_slice(&src[range])
            }
            (TensorValues::Bool(dst), TensorValues::Bool(src)) => {
                dst.extend_from_slice(&src[range])
            }
            // Owned copies: outputs must not share storage with the source.
            (TensorValues::String(dst), TensorValues::String(src)) => {
                dst.extend(src[range].iter().map(|s| Bytes::copy_from_slice(s)))
            }
            (dst, src) => {
                return Err(TensorError::DTypeMismatch {
                    expected: dst.dtype(),
                    actual: src.dtype(),
                })
            }
        }
        Ok(())
    }

    pub fn extend_from(&mut self, src: &TensorValues) -> Result<(), TensorError> {
        self.append_range(src, 0..src.len())
    }

    pub fn copy_range(&self, range: Range<usize>) -> Result<TensorValues, TensorError> {
        let mut out = TensorValues::with_capacity(self.dtype(), range.len());
        out.append_range(self, range)?;
        Ok(out)
    }
}
