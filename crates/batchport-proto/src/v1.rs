//! Predict service messages.
//!
//! Written by hand against `tf_predict.proto` so the build needs no `protoc`.

use std::collections::BTreeMap;

use bytes::Bytes;
use prost::{Enumeration, Message};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Enumeration)]
#[repr(i32)]
pub enum ArrayDataType {
    DtInvalid = 0,
    DtFloat = 1,
    DtDouble = 2,
    DtInt32 = 3,
    DtUint8 = 4,
    DtInt16 = 5,
    DtInt8 = 6,
    DtString = 7,
    DtComplex64 = 8,
    DtInt64 = 9,
    DtBool = 10,
}

#[derive(Clone, PartialEq, Message)]
pub struct ArrayShape {
    #[prost(int64, repeated, tag = "1")]
    pub dim: Vec<i64>,
}

/// One tensor. Only the value field matching `dtype` is populated;
/// `int_val` carries INT32, INT8 and UINT8.
#[derive(Clone, PartialEq, Message)]
pub struct ArrayProto {
    #[prost(enumeration = "ArrayDataType", tag = "1")]
    pub dtype: i32,

    #[prost(message, optional, tag = "2")]
    pub array_shape: Option<ArrayShape>,

    #[prost(float, repeated, tag = "3")]
    pub float_val: Vec<f32>,

    #[prost(double, repeated, tag = "4")]
    pub double_val: Vec<f64>,

    #[prost(int32, repeated, tag = "5")]
    pub int_val: Vec<i32>,

    #[prost(bytes = "bytes", repeated, tag = "6")]
    pub string_val: Vec<Bytes>,

    #[prost(int64, repeated, tag = "7")]
    pub int64_val: Vec<i64>,

    #[prost(bool, repeated, tag = "8")]
    pub bool_val: Vec<bool>,
}

#[derive(Clone, PartialEq, Message)]
pub struct PredictRequest {
    #[prost(string, tag = "1")]
    pub signature_name: String,

    #[prost(btree_map = "string, message", tag = "2")]
    pub inputs: BTreeMap<String, ArrayProto>,

    #[prost(string, repeated, tag = "3")]
    pub output_filter: Vec<String>,
}

#[derive(Clone, PartialEq, Message)]
pub struct PredictResponse {
    #[prost(btree_map = "string, message", tag = "1")]
    pub outputs: BTreeMap<String, ArrayProto>,
}
