use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;

use crate::{TensorError, TensorValues};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    Float32,
    Float64,
    Int32,
    UInt8,
    Int8,
    Int64,
    Bool,
    String,
}

impl DType {
    /// TensorFlow-style name, as used in model signatures.
    pub fn as_str(self) -> &'static str {
        match self {
            DType::Float32 => "DT_FLOAT",
            DType::Float64 => "DT_DOUBLE",
            DType::Int32 => "DT_INT32",
            DType::UInt8 => "DT_UINT8",
            DType::Int8 => "DT_INT8",
            DType::Int64 => "DT_INT64",
            DType::Bool => "DT_BOOL",
            DType::String => "DT_STRING",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DType {
    type Err = TensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "DT_FLOAT" => DType::Float32,
            "DT_DOUBLE" => DType::Float64,
            "DT_INT32" => DType::Int32,
            "DT_UINT8" => DType::UInt8,
            "DT_INT8" => DType::Int8,
            "DT_INT64" => DType::Int64,
            "DT_BOOL" => DType::Bool,
            "DT_STRING" => DType::String,
            other => return Err(TensorError::UnknownDType(other.to_string())),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Shape(pub SmallVec<[usize; 6]>);

impl Shape {
    pub fn from_slice(d: &[usize]) -> Self {
        Self(d.iter().copied().collect())
    }

    pub fn scalar() -> Self {
        Self(SmallVec::new())
    }

    pub fn is_scalar(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of elements. A scalar holds one.
    pub fn numel(&self) -> usize {
        self.0.iter().product::<usize>()
    }

    /// `shape[0]`, the row count of a batched tensor.
    pub fn batch_dim(&self) -> Option<usize> {
        self.0.first().copied()
    }

    /// Dimensions after the batch dimension.
    pub fn trailing(&self) -> &[usize] {
        self.0.get(1..).unwrap_or(&[])
    }

    /// Elements per row: the product of the trailing dimensions.
    pub fn row_width(&self) -> usize {
        self.trailing().iter().product::<usize>()
    }

    pub fn with_batch_dim(&self, rows: usize) -> Self {
        let mut dims = self.0.clone();
        match dims.first_mut() {
            Some(d) => *d = rows,
            None => dims.push(rows),
        }
        Self(dims)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0.as_slice())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    pub shape: Shape,
    pub values: TensorValues,
}

impl Tensor {
    pub fn new(shape: Shape, values: TensorValues) -> Result<Self, TensorError> {
        let expected = shape.numel();
        if values.len() != expected {
            return Err(TensorError::ElementCountMismatch {
                shape,
                expected,
                actual: values.len(),
            });
        }
        Ok(Self { shape, values })
    }

    pub fn dtype(&self) -> DType {
        self.values.dtype()
    }

    pub fn rows(&self) -> Option<usize> {
        self.shape.batch_dim()
    }
}

/// Named tensors of one request or response, iterated in name order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TensorMap(BTreeMap<String, Tensor>);

impl TensorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, tensor: Tensor) -> Option<Tensor> {
        self.0.insert(name.into(), tensor)
    }

    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.0.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Tensor> {
        self.0.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Tensor> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Row count of the request: `shape[0]` of the first tensor that has a
    /// batch dimension. `None` when every tensor is a scalar.
    pub fn batch_rows(&self) -> Option<usize> {
        self.0.values().find_map(Tensor::rows)
    }
}

impl FromIterator<(String, Tensor)> for TensorMap {
    fn from_iter<I: IntoIterator<Item = (String, Tensor)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for TensorMap {
    type Item = (String, Tensor);
    type IntoIter = btree_map::IntoIter<String, Tensor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a TensorMap {
    type Item = (&'a String, &'a Tensor);
    type IntoIter = btree_map::Iter<'a, String, Tensor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A decoded prediction request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PredictRequest {
    pub signature_name: String,
    pub output_filter: Vec<String>,
    pub inputs: TensorMap,
}

impl PredictRequest {
    pub fn new(inputs: TensorMap) -> Self {
        Self {
            inputs,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f32_tensor(dims: &[usize], data: Vec<f32>) -> Tensor {
        Tensor::new(Shape::from_slice(dims), TensorValues::Float32(data)).expect("valid tensor")
    }

    #[test]
    fn shape_helpers() {
        let shape = Shape::from_slice(&[4, 2, 3]);
        assert_eq!(shape.numel(), 24);
        assert_eq!(shape.batch_dim(), Some(4));
        assert_eq!(shape.row_width(), 6);
        assert_eq!(shape.with_batch_dim(1), Shape::from_slice(&[1, 2, 3]));

        let scalar = Shape::scalar();
        assert_eq!(scalar.numel(), 1);
        assert_eq!(scalar.batch_dim(), None);
        assert_eq!(scalar.row_width(), 1);

        assert_eq!(Shape::from_slice(&[3, 0]).numel(), 0);
    }

    #[test]
    fn tensor_rejects_wrong_element_count() {
        let err = Tensor::new(
            Shape::from_slice(&[2, 2]),
            TensorValues::Int64(vec![1, 2, 3]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TensorError::ElementCountMismatch {
                expected: 4,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn batch_rows_skips_scalars() {
        let mut map = TensorMap::new();
        map.insert("a_scalar", f32_tensor(&[], vec![0.5]));
        map.insert("b", f32_tensor(&[2, 1], vec![1.0, 2.0]));
        map.insert("c", f32_tensor(&[5], vec![0.0; 5]));
        assert_eq!(map.batch_rows(), Some(2));

        let mut scalars = TensorMap::new();
        scalars.insert("only", f32_tensor(&[], vec![1.0]));
        assert_eq!(scalars.batch_rows(), None);
    }

    #[test]
    fn dtype_names_parse_back() {
        for dtype in [DType::Float32, DType::Int8, DType::Bool, DType::String] {
            assert_eq!(dtype.as_str().parse::<DType>().unwrap(), dtype);
        }
        assert!("DT_HALF".parse::<DType>().is_err());
    }
}
