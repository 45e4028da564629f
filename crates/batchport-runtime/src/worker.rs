use anyhow::{Context, Result};
use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::{BatchError, BatchJob, BatchOutput, Processor};

/// Runs batches one at a time against its own processor.
pub struct Worker {
    pub id: u32,
    pub inbox: mpsc::Receiver<BatchJob>,
    pub processor: Processor,
}

impl Worker {
    pub fn channel(id: u32, processor: Processor, capacity: usize) -> (Self, WorkerHandle) {
        let (tx, inbox) = mpsc::channel(capacity);
        let worker = Self {
            id,
            inbox,
            processor,
        };
        (worker, WorkerHandle { tx })
    }

    pub async fn run(mut self) -> Result<()> {
        info!(worker_id = self.id, "worker started");
        while let Some(job) = self.inbox.recv().await {
            let outcome = self.processor.batch_process(&job.requests);
            if let Err(err) = &outcome {
                error!(worker_id = self.id, error = %err, "batch failed");
            }
            if job.resp_tx.send(outcome).is_err() {
                debug!(worker_id = self.id, "caller went away before the batch finished");
            }
        }
        info!(worker_id = self.id, "worker stopped");
        Ok(())
    }
}

#[derive(Clone)]
pub struct WorkerHandle {
    tx: mpsc::Sender<BatchJob>,
}

impl WorkerHandle {
    pub async fn submit(&self, requests: Vec<Bytes>) -> Result<Result<BatchOutput, BatchError>> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.tx
            .send(BatchJob { requests, resp_tx })
            .await
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;
        resp_rx.await.context("worker dropped the batch")
    }
}
