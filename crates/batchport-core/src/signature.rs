use serde::{Deserialize, Serialize};

/// Input/output description the executor reports after loading a model.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSignature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_name: Option<String>,
    #[serde(default)]
    pub inputs: Vec<SignatureTensor>,
    #[serde(default)]
    pub outputs: Vec<SignatureTensor>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignatureTensor {
    pub name: String,
    /// TensorFlow dtype name, e.g. `DT_FLOAT`.
    #[serde(rename = "type")]
    pub dtype: String,
    /// `-1` marks a dynamic dimension.
    #[serde(default)]
    pub shape: Vec<i64>,
}

impl ModelSignature {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.outputs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_signature_json() {
        let raw = r#"{
            "signature_name": "serving_default",
            "inputs": [{"name": "x", "type": "DT_FLOAT", "shape": [-1, 3]}],
            "outputs": [{"name": "y", "type": "DT_FLOAT", "shape": [-1]}]
        }"#;
        let sig = ModelSignature::from_json(raw).unwrap();
        assert_eq!(sig.signature_name.as_deref(), Some("serving_default"));
        assert_eq!(sig.inputs[0].dtype, "DT_FLOAT");
        assert_eq!(sig.inputs[0].shape, vec![-1, 3]);

        let back = ModelSignature::from_json(&sig.to_json().unwrap()).unwrap();
        assert_eq!(back, sig);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let sig = ModelSignature::from_json("{}").unwrap();
        assert!(sig.is_empty());
        assert!(sig.signature_name.is_none());
    }
}
