use batchport_core::ThreadPoolConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// CPU budget of the serving container, read when thread counts are unset.
pub const SCHEDULABLE_CPUS_ENV: &str = "SCHEDULABLE_CPUS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid model config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Model config passed alongside the model entry, as JSON.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    pub inter_op_parallelism_threads: i64,
    pub intra_op_parallelism_threads: i64,
    pub enable_warm_up: bool,
}

impl ProcessorConfig {
    /// An empty config string means defaults.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(raw)?)
    }

    pub fn thread_pool(&self, schedulable_cpus: usize) -> ThreadPoolConfig {
        ThreadPoolConfig::resolve(
            self.inter_op_parallelism_threads,
            self.intra_op_parallelism_threads,
            schedulable_cpus,
        )
    }
}

/// Unset or unparsable values count as zero.
pub fn schedulable_cpus_from_env() -> usize {
    std::env::var(SCHEDULABLE_CPUS_ENV)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(0)
}
