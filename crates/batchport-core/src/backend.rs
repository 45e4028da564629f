use std::path::Path;

use anyhow::Result;

use crate::{ModelSignature, PredictError, PredictRequest, TensorMap};

/// Thread pools handed to the executor at load time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ThreadPoolConfig {
    pub inter_op_threads: usize,
    pub intra_op_threads: usize,
}

impl ThreadPoolConfig {
    /// Non-positive requests fall back to half of the schedulable CPUs.
    pub fn resolve(inter_op: i64, intra_op: i64, schedulable_cpus: usize) -> Self {
        let fallback = schedulable_cpus / 2;
        let pick = |requested: i64| {
            if requested > 0 {
                requested as usize
            } else {
                fallback
            }
        };
        Self {
            inter_op_threads: pick(inter_op),
            intra_op_threads: pick(intra_op),
        }
    }
}

pub trait Backend: Send + Sync + 'static {
    type Model: BackendModel;

    fn name(&self) -> &'static str;
    fn load(&self, model_entry: &Path, threads: ThreadPoolConfig) -> Result<Self::Model>;
}

pub trait BackendModel: Send + 'static {
    fn signature(&self) -> &ModelSignature;

    /// Runs one (already batched) request through the model.
    fn predict(&mut self, request: &PredictRequest) -> Result<TensorMap, PredictError>;
}
