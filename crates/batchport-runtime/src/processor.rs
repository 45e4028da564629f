use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use batchport_core::{
    Backend, BackendModel, ModelSignature, PredictError, PredictRequest, SchemaPolicy, TensorMap,
};
use batchport_proto::{decode_request, encode_response};
use bytes::Bytes;
use tracing::{debug, error, info, warn};

use crate::{
    merge, schedulable_cpus_from_env, split, warmup_request, Admission, BatchError, BatchOutput,
    MergedBatch, ProcessOutput, ProcessorConfig, Timings, STATUS_BAD_REQUEST, STATUS_INTERNAL,
    STATUS_OK,
};

/// Serves encoded predict requests against one loaded model.
pub struct Processor {
    model: Box<dyn BackendModel>,
    policy: SchemaPolicy,
}

impl Processor {
    pub fn new(model: Box<dyn BackendModel>) -> Self {
        Self {
            model,
            policy: SchemaPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SchemaPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Loads the model and, if configured, warms it up. A failed warm-up is
    /// logged and does not prevent serving.
    pub fn initialize<B: Backend>(
        backend: &B,
        model_entry: &Path,
        config: &ProcessorConfig,
    ) -> Result<Self> {
        let threads = config.thread_pool(schedulable_cpus_from_env());
        info!(
            backend = backend.name(),
            entry = %model_entry.display(),
            inter_op = threads.inter_op_threads,
            intra_op = threads.intra_op_threads,
            "loading model"
        );
        let model = backend
            .load(model_entry, threads)
            .with_context(|| format!("failed to load model from {}", model_entry.display()))?;

        let mut processor = Self::new(Box::new(model));
        if config.enable_warm_up {
            match processor.warm_up() {
                Ok(()) => info!("warm-up finished"),
                Err(err) => warn!(error = %err, "warm-up failed"),
            }
        }
        Ok(processor)
    }

    pub fn signature(&self) -> &ModelSignature {
        self.model.signature()
    }

    pub fn warm_up(&mut self) -> Result<(), PredictError> {
        let request = warmup_request(self.model.signature());
        self.model.predict(&request).map(|_| ())
    }

    /// Single request. Empty input asks for the model signature.
    pub fn process(&mut self, input: &[u8]) -> ProcessOutput {
        if input.is_empty() {
            return self.describe();
        }

        let request = match decode_request(input) {
            Ok(request) => request,
            Err(err) => {
                warn!(error = %err, "rejecting undecodable request");
                return ProcessOutput::error(STATUS_BAD_REQUEST, err.to_string());
            }
        };

        match self.model.predict(&request) {
            Ok(outputs) => ProcessOutput {
                status: STATUS_OK,
                body: encode_response(&outputs),
            },
            Err(err) => {
                let err = BatchError::from(err);
                error!(error = %err, "predict failed");
                ProcessOutput::error(STATUS_INTERNAL, err.to_string())
            }
        }
    }

    fn describe(&self) -> ProcessOutput {
        let signature = self.model.signature();
        if signature.is_empty() {
            return ProcessOutput::error(STATUS_BAD_REQUEST, "input data should not be empty");
        }
        match signature.to_json() {
            Ok(json) => ProcessOutput {
                status: STATUS_OK,
                body: Bytes::from(json),
            },
            Err(err) => ProcessOutput::error(
                STATUS_INTERNAL,
                format!("failed to serialize model signature: {err}"),
            ),
        }
    }

    /// Runs a fixed batch of encoded requests through one predict call.
    ///
    /// Requests that fail to decode or do not fit the batch get an error in
    /// their own slot; the rest are still served. A predict or split failure
    /// fails the whole batch.
    pub fn batch_process(&mut self, inputs: &[Bytes]) -> Result<BatchOutput, BatchError> {
        let mut responses: Vec<Result<Bytes, BatchError>> =
            inputs.iter().map(|_| Ok(Bytes::new())).collect();
        let mut timings = Timings::default();

        let mut decoded = Vec::with_capacity(inputs.len());
        for (index, buf) in inputs.iter().enumerate() {
            match decode_request(buf.clone()) {
                Ok(request) => decoded.push((index, request)),
                Err(source) => reject(&mut responses, BatchError::Decode { index, source }),
            }
        }

        let admitted = self.admit(decoded, &mut responses);
        if admitted.is_empty() {
            let status = if inputs.is_empty() {
                STATUS_OK
            } else {
                STATUS_BAD_REQUEST
            };
            return Ok(BatchOutput {
                status,
                responses,
                timings,
            });
        }

        let mut indices = Vec::with_capacity(admitted.len());
        let mut inputs_by_request: Vec<TensorMap> = Vec::with_capacity(admitted.len());
        let mut batch_request = PredictRequest::default();
        for (position, (index, request)) in admitted.into_iter().enumerate() {
            if position == 0 {
                batch_request.signature_name = request.signature_name;
                batch_request.output_filter = request.output_filter;
            }
            indices.push(index);
            inputs_by_request.push(request.inputs);
        }

        let t0 = Instant::now();
        let MergedBatch { merged, ledger } = merge(&inputs_by_request, &self.policy)?;
        batch_request.inputs = merged;
        timings.merge_us = t0.elapsed().as_micros() as u64;
        debug!(
            batch = inputs.len(),
            admitted = indices.len(),
            rows = ?ledger.total_rows(),
            "dispatching batch"
        );

        let t1 = Instant::now();
        let outputs = self.model.predict(&batch_request).map_err(|err| {
            error!(batch = indices.len(), error = %err, "batch predict failed");
            BatchError::from(err)
        })?;
        timings.predict_us = t1.elapsed().as_micros() as u64;

        let t2 = Instant::now();
        let split_outputs = split(&outputs, &ledger).inspect_err(|err| {
            error!(error = %err, "cannot split batch response");
        })?;
        for (index, response) in indices.into_iter().zip(split_outputs) {
            responses[index] = Ok(encode_response(&response));
        }
        timings.split_us = t2.elapsed().as_micros() as u64;

        Ok(BatchOutput {
            status: STATUS_OK,
            responses,
            timings,
        })
    }

    /// Keeps requests that fit the batch, in input order. The first request
    /// that is valid on its own becomes the baseline for the rest.
    fn admit(
        &self,
        decoded: Vec<(usize, PredictRequest)>,
        responses: &mut [Result<Bytes, BatchError>],
    ) -> Vec<(usize, PredictRequest)> {
        let mut pending = decoded.into_iter();
        let mut admitted = Vec::new();

        for (index, request) in pending.by_ref() {
            let verdict =
                Admission::new(&self.policy, &request.inputs).admit(index, &request.inputs);
            match verdict {
                Ok(_) => {
                    admitted.push((index, request));
                    break;
                }
                Err(err) => reject(responses, err),
            }
        }

        let Some((_, baseline)) = admitted.first() else {
            return admitted;
        };
        let rest: Vec<_> = {
            let admission = Admission::new(&self.policy, &baseline.inputs);
            pending
                .filter(|(index, request)| match admission.admit(*index, &request.inputs) {
                    Ok(_) => true,
                    Err(err) => {
                        reject(responses, err);
                        false
                    }
                })
                .collect()
        };

        admitted.extend(rest);
        admitted
    }
}

fn reject(responses: &mut [Result<Bytes, BatchError>], err: BatchError) {
    warn!(index = ?err.request_index(), error = %err, "rejecting request from batch");
    if let Some(index) = err.request_index() {
        responses[index] = Err(err);
    }
}
