use std::borrow::Cow;

use crate::{DType, SchemaViolation, TensorMap};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TensorSpec {
    pub name: String,
    pub dtype: DType,
    /// Has a batch dimension and grows with each request.
    pub batched: bool,
}

impl TensorSpec {
    pub fn batched(name: impl Into<String>, dtype: DType) -> Self {
        Self {
            name: name.into(),
            dtype,
            batched: true,
        }
    }
}

/// What to do with tensors a request carries but the schema does not name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtraTensors {
    Drop,
    Reject,
}

/// Tensor names and dtypes every request in a batch must agree on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchSchema {
    tensors: Vec<TensorSpec>,
    extra: ExtraTensors,
}

impl BatchSchema {
    /// Explicit schema; undeclared tensors are rejected.
    pub fn declared(tensors: Vec<TensorSpec>) -> Self {
        Self {
            tensors,
            extra: ExtraTensors::Reject,
        }
    }

    /// Schema taken from the first request of a batch. Tensors that only
    /// later requests carry are dropped from the merged request.
    pub fn inferred(first: &TensorMap) -> Self {
        let tensors = first
            .iter()
            .map(|(name, tensor)| TensorSpec {
                name: name.clone(),
                dtype: tensor.dtype(),
                batched: !tensor.shape.is_scalar(),
            })
            .collect();
        Self {
            tensors,
            extra: ExtraTensors::Drop,
        }
    }

    pub fn extra(&self) -> ExtraTensors {
        self.extra
    }

    pub fn get(&self, name: &str) -> Option<&TensorSpec> {
        self.tensors.iter().find(|spec| spec.name == name)
    }

    pub fn check(&self, request: &TensorMap) -> Result<(), SchemaViolation> {
        for spec in &self.tensors {
            match request.get(&spec.name) {
                Some(tensor) if tensor.dtype() != spec.dtype => {
                    return Err(SchemaViolation::DType {
                        tensor: spec.name.clone(),
                        expected: spec.dtype,
                        actual: tensor.dtype(),
                    });
                }
                Some(tensor) if spec.batched && tensor.shape.is_scalar() => {
                    return Err(SchemaViolation::Unbatched {
                        tensor: spec.name.clone(),
                    });
                }
                Some(tensor) if !spec.batched && !tensor.shape.is_scalar() => {
                    return Err(SchemaViolation::Scalar {
                        tensor: spec.name.clone(),
                    });
                }
                Some(_) => {}
                None if spec.batched => {
                    return Err(SchemaViolation::Missing {
                        tensor: spec.name.clone(),
                    });
                }
                None => {}
            }
        }

        if self.extra == ExtraTensors::Reject {
            if let Some(name) = request.names().find(|name| self.get(name).is_none()) {
                return Err(SchemaViolation::Unexpected {
                    tensor: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SchemaPolicy {
    /// The first request's tensors define the batch.
    #[default]
    FirstRequest,
    Declared(BatchSchema),
}

impl SchemaPolicy {
    pub fn schema_for<'a>(&'a self, first: &TensorMap) -> Cow<'a, BatchSchema> {
        match self {
            SchemaPolicy::FirstRequest => Cow::Owned(BatchSchema::inferred(first)),
            SchemaPolicy::Declared(schema) => Cow::Borrowed(schema),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Shape, Tensor, TensorValues};

    fn tensor(dims: &[usize], values: TensorValues) -> Tensor {
        Tensor::new(Shape::from_slice(dims), values).unwrap()
    }

    fn request(tensors: Vec<(&str, Tensor)>) -> TensorMap {
        tensors
            .into_iter()
            .map(|(name, t)| (name.to_string(), t))
            .collect()
    }

    #[test]
    fn inferred_schema_drops_extras_and_requires_batched() {
        let first = request(vec![
            ("x", tensor(&[1, 2], TensorValues::Float32(vec![1.0, 2.0]))),
            ("k", tensor(&[], TensorValues::Int32(vec![7]))),
        ]);
        let schema = BatchSchema::inferred(&first);
        assert_eq!(schema.extra(), ExtraTensors::Drop);
        assert!(!schema.get("k").unwrap().batched);

        let extra = request(vec![
            ("x", tensor(&[1, 2], TensorValues::Float32(vec![3.0, 4.0]))),
            ("late", tensor(&[1], TensorValues::Int64(vec![1]))),
        ]);
        assert_eq!(schema.check(&extra), Ok(()));

        let missing = request(vec![("k", tensor(&[], TensorValues::Int32(vec![7])))]);
        assert_eq!(
            schema.check(&missing),
            Err(SchemaViolation::Missing {
                tensor: "x".to_string()
            })
        );
    }

    #[test]
    fn declared_schema_rejects_unknown_and_wrong_dtype() {
        let schema = BatchSchema::declared(vec![TensorSpec::batched("x", DType::Float32)]);

        let extra = request(vec![
            ("x", tensor(&[1], TensorValues::Float32(vec![1.0]))),
            ("y", tensor(&[1], TensorValues::Float32(vec![1.0]))),
        ]);
        assert_eq!(
            schema.check(&extra),
            Err(SchemaViolation::Unexpected {
                tensor: "y".to_string()
            })
        );

        let wrong = request(vec![("x", tensor(&[1], TensorValues::Float64(vec![1.0])))]);
        assert!(matches!(
            schema.check(&wrong),
            Err(SchemaViolation::DType {
                expected: DType::Float32,
                actual: DType::Float64,
                ..
            })
        ));
    }

    #[test]
    fn rank_must_match_declared_batching() {
        let schema = BatchSchema::declared(vec![
            TensorSpec::batched("x", DType::Int64),
            TensorSpec {
                name: "k".to_string(),
                dtype: DType::Float32,
                batched: false,
            },
        ]);

        let scalar_x = request(vec![("x", tensor(&[], TensorValues::Int64(vec![1])))]);
        assert_eq!(
            schema.check(&scalar_x),
            Err(SchemaViolation::Unbatched {
                tensor: "x".to_string()
            })
        );

        let batched_k = request(vec![
            ("x", tensor(&[1], TensorValues::Int64(vec![1]))),
            ("k", tensor(&[1], TensorValues::Float32(vec![0.5]))),
        ]);
        assert_eq!(
            schema.check(&batched_k),
            Err(SchemaViolation::Scalar {
                tensor: "k".to_string()
            })
        );

        let fine = request(vec![
            ("x", tensor(&[2], TensorValues::Int64(vec![1, 2]))),
            ("k", tensor(&[], TensorValues::Float32(vec![0.5]))),
        ]);
        assert_eq!(schema.check(&fine), Ok(()));
    }
}
