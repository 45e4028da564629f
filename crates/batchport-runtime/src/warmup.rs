use batchport_core::{
    DType, ModelSignature, PredictRequest, Shape, Tensor, TensorMap, TensorValues,
};
use bytes::Bytes;
use tracing::warn;

const WARMUP_TEXT: &[u8] = b"PACKAGE_611";

/// Builds a request that matches the model signature, with dynamic
/// dimensions pinned to 1.
pub fn warmup_request(signature: &ModelSignature) -> PredictRequest {
    let mut inputs = TensorMap::new();
    for input in &signature.inputs {
        let dtype = match input.dtype.parse::<DType>() {
            Ok(dtype) => dtype,
            Err(err) => {
                warn!(tensor = %input.name, error = %err, "skipping warm-up input");
                continue;
            }
        };

        let dims: Vec<usize> = input
            .shape
            .iter()
            .map(|d| if *d > 0 { *d as usize } else { 1 })
            .collect();
        let shape = Shape::from_slice(&dims);
        let n = shape.numel();
        let values = match dtype {
            DType::String => TensorValues::String(vec![Bytes::from_static(WARMUP_TEXT); n]),
            other => TensorValues::zeros(other, n),
        };
        inputs.insert(input.name.clone(), Tensor { shape, values });
    }

    PredictRequest {
        signature_name: signature.signature_name.clone().unwrap_or_default(),
        output_filter: Vec::new(),
        inputs,
    }
}
