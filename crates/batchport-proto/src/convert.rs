use batchport_core::{DType, PredictRequest, Shape, Tensor, TensorMap, TensorValues};
use bytes::{Buf, Bytes};
use prost::Message;

use crate::v1 as pb;
use crate::WireError;

pub fn decode_request(buf: impl Buf) -> Result<PredictRequest, WireError> {
    let raw = pb::PredictRequest::decode(buf)?;
    Ok(PredictRequest {
        signature_name: raw.signature_name,
        output_filter: raw.output_filter,
        inputs: tensors_from_proto(raw.inputs)?,
    })
}

pub fn encode_request(request: &PredictRequest) -> Bytes {
    let raw = pb::PredictRequest {
        signature_name: request.signature_name.clone(),
        inputs: tensors_to_proto(&request.inputs),
        output_filter: request.output_filter.clone(),
    };
    Bytes::from(raw.encode_to_vec())
}

pub fn decode_response(buf: impl Buf) -> Result<TensorMap, WireError> {
    let raw = pb::PredictResponse::decode(buf)?;
    tensors_from_proto(raw.outputs)
}

pub fn encode_response(outputs: &TensorMap) -> Bytes {
    let raw = pb::PredictResponse {
        outputs: tensors_to_proto(outputs),
    };
    Bytes::from(raw.encode_to_vec())
}

fn tensors_from_proto(
    raw: impl IntoIterator<Item = (String, pb::ArrayProto)>,
) -> Result<TensorMap, WireError> {
    raw.into_iter()
        .map(|(name, proto)| {
            let tensor = tensor_from_proto(&name, proto)?;
            Ok::<_, WireError>((name, tensor))
        })
        .collect()
}

fn tensors_to_proto(tensors: &TensorMap) -> std::collections::BTreeMap<String, pb::ArrayProto> {
    tensors
        .iter()
        .map(|(name, tensor)| (name.clone(), tensor_to_proto(tensor)))
        .collect()
}

pub fn tensor_from_proto(name: &str, proto: pb::ArrayProto) -> Result<Tensor, WireError> {
    let dtype = parse_dtype(name, proto.dtype)?;

    let dims = proto
        .array_shape
        .map(|shape| shape.dim)
        .unwrap_or_default()
        .into_iter()
        .map(|dim| {
            usize::try_from(dim).map_err(|_| WireError::NegativeDim {
                tensor: name.to_string(),
                dim,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let own_field = value_field(dtype);
    let populated = [
        ("float_val", !proto.float_val.is_empty()),
        ("double_val", !proto.double_val.is_empty()),
        ("int_val", !proto.int_val.is_empty()),
        ("string_val", !proto.string_val.is_empty()),
        ("int64_val", !proto.int64_val.is_empty()),
        ("bool_val", !proto.bool_val.is_empty()),
    ];
    if let Some((field, _)) = populated
        .iter()
        .find(|(field, set)| *set && *field != own_field)
    {
        return Err(WireError::StrayValues {
            tensor: name.to_string(),
            field: *field,
            dtype,
        });
    }

    let values = match dtype {
        DType::Float32 => TensorValues::Float32(proto.float_val),
        DType::Float64 => TensorValues::Float64(proto.double_val),
        DType::Int32 => TensorValues::Int32(proto.int_val),
        DType::UInt8 => TensorValues::UInt8(narrow(name, dtype, proto.int_val)?),
        DType::Int8 => TensorValues::Int8(narrow(name, dtype, proto.int_val)?),
        DType::Int64 => TensorValues::Int64(proto.int64_val),
        DType::Bool => TensorValues::Bool(proto.bool_val),
        DType::String => TensorValues::String(proto.string_val),
    };

    Tensor::new(Shape::from_slice(&dims), values).map_err(|source| WireError::Tensor {
        tensor: name.to_string(),
        source,
    })
}

pub fn tensor_to_proto(tensor: &Tensor) -> pb::ArrayProto {
    let mut proto = pb::ArrayProto {
        dtype: to_proto_dtype(tensor.dtype()) as i32,
        array_shape: Some(pb::ArrayShape {
            dim: tensor.shape.0.iter().map(|d| *d as i64).collect(),
        }),
        ..Default::default()
    };
    match &tensor.values {
        TensorValues::Float32(v) => proto.float_val = v.clone(),
        TensorValues::Float64(v) => proto.double_val = v.clone(),
        TensorValues::Int32(v) => proto.int_val = v.clone(),
        TensorValues::UInt8(v) => proto.int_val = v.iter().map(|b| i32::from(*b)).collect(),
        TensorValues::Int8(v) => proto.int_val = v.iter().map(|b| i32::from(*b)).collect(),
        TensorValues::Int64(v) => proto.int64_val = v.clone(),
        TensorValues::Bool(v) => proto.bool_val = v.clone(),
        TensorValues::String(v) => proto.string_val = v.clone(),
    }
    proto
}

fn parse_dtype(tensor: &str, raw: i32) -> Result<DType, WireError> {
    let dtype = pb::ArrayDataType::try_from(raw).map_err(|_| WireError::UnknownDType {
        tensor: tensor.to_string(),
        raw,
    })?;
    Ok(match dtype {
        pb::ArrayDataType::DtFloat => DType::Float32,
        pb::ArrayDataType::DtDouble => DType::Float64,
        pb::ArrayDataType::DtInt32 => DType::Int32,
        pb::ArrayDataType::DtUint8 => DType::UInt8,
        pb::ArrayDataType::DtInt8 => DType::Int8,
        pb::ArrayDataType::DtInt64 => DType::Int64,
        pb::ArrayDataType::DtBool => DType::Bool,
        pb::ArrayDataType::DtString => DType::String,
        other => {
            return Err(WireError::UnsupportedDType {
                tensor: tensor.to_string(),
                dtype: other,
            })
        }
    })
}

fn to_proto_dtype(dtype: DType) -> pb::ArrayDataType {
    match dtype {
        DType::Float32 => pb::ArrayDataType::DtFloat,
        DType::Float64 => pb::ArrayDataType::DtDouble,
        DType::Int32 => pb::ArrayDataType::DtInt32,
        DType::UInt8 => pb::ArrayDataType::DtUint8,
        DType::Int8 => pb::ArrayDataType::DtInt8,
        DType::Int64 => pb::ArrayDataType::DtInt64,
        DType::Bool => pb::ArrayDataType::DtBool,
        DType::String => pb::ArrayDataType::DtString,
    }
}

fn value_field(dtype: DType) -> &'static str {
    match dtype {
        DType::Float32 => "float_val",
        DType::Float64 => "double_val",
        DType::Int32 | DType::UInt8 | DType::Int8 => "int_val",
        DType::Int64 => "int64_val",
        DType::Bool => "bool_val",
        DType::String => "string_val",
    }
}

fn narrow<T: TryFrom<i32>>(tensor: &str, dtype: DType, raw: Vec<i32>) -> Result<Vec<T>, WireError> {
    raw.into_iter()
        .map(|value| {
            T::try_from(value).map_err(|_| WireError::OutOfRange {
                tensor: tensor.to_string(),
                value,
                dtype,
            })
        })
        .collect()
}
