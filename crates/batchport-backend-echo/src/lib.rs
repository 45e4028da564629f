//! Identity executor: every predict call returns its inputs as outputs.
//!
//! Useful as a stand-in model when exercising the batching path, since a
//! merged request then comes back unchanged and must split into exactly the
//! original per-request tensors.

use std::path::Path;

use anyhow::{Context, Result};
use batchport_core::{
    Backend, BackendModel, ModelSignature, PredictError, PredictRequest, TensorMap,
    ThreadPoolConfig,
};
use tracing::debug;

pub struct EchoBackend;

impl EchoBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EchoBackend {
    fn default() -> Self {
        Self::new()
    }
}

pub struct EchoModel {
    signature: ModelSignature,
    threads: ThreadPoolConfig,
    calls: usize,
}

impl EchoModel {
    pub fn new(signature: ModelSignature) -> Self {
        Self {
            signature,
            threads: ThreadPoolConfig::default(),
            calls: 0,
        }
    }

    pub fn threads(&self) -> ThreadPoolConfig {
        self.threads
    }

    /// Number of predict calls served so far.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl Backend for EchoBackend {
    type Model = EchoModel;

    fn name(&self) -> &'static str {
        "echo"
    }

    /// `model_entry` is an optional signature JSON file; an empty path loads
    /// a model without signature.
    fn load(&self, model_entry: &Path, threads: ThreadPoolConfig) -> Result<Self::Model> {
        let signature = if model_entry.as_os_str().is_empty() {
            ModelSignature::default()
        } else {
            let raw = std::fs::read_to_string(model_entry)
                .with_context(|| format!("failed to read {}", model_entry.display()))?;
            ModelSignature::from_json(&raw).context("failed to parse model signature")?
        };

        Ok(EchoModel {
            signature,
            threads,
            calls: 0,
        })
    }
}

impl BackendModel for EchoModel {
    fn signature(&self) -> &ModelSignature {
        &self.signature
    }

    /// Echoes the inputs, restricted to `output_filter` when one is given.
    fn predict(&mut self, request: &PredictRequest) -> Result<TensorMap, PredictError> {
        self.calls += 1;
        if request.output_filter.is_empty() {
            return Ok(request.inputs.clone());
        }

        let mut outputs = TensorMap::new();
        for name in &request.output_filter {
            let tensor = request.inputs.get(name).ok_or_else(|| {
                PredictError::new(-1, format!("requested output `{name}` does not exist"))
            })?;
            outputs.insert(name.clone(), tensor.clone());
        }
        debug!(outputs = outputs.len(), "filtered echo outputs");
        Ok(outputs)
    }
}
