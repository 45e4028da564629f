use bytes::Bytes;
use tokio::sync::oneshot;

use crate::BatchError;

#[derive(Debug, Default, Clone, Copy)]
pub struct Timings {
    pub merge_us: u64,
    pub predict_us: u64,
    pub split_us: u64,
}

/// Result of a single-request call: a status code and an owned body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub status: u16,
    pub body: Bytes,
}

impl ProcessOutput {
    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: Bytes::from(message.into()),
        }
    }
}

/// Result of a batch call. `responses[i]` answers request `i`; the caller
/// owns every buffer.
#[derive(Debug)]
pub struct BatchOutput {
    pub status: u16,
    pub responses: Vec<Result<Bytes, BatchError>>,
    pub timings: Timings,
}

/// A fixed batch of encoded requests handed to a worker.
#[derive(Debug)]
pub struct BatchJob {
    pub requests: Vec<Bytes>,
    pub resp_tx: oneshot::Sender<Result<BatchOutput, BatchError>>,
}
