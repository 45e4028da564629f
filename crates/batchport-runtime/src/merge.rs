use std::borrow::Cow;

use batchport_core::{BatchSchema, ExtraTensors, SchemaPolicy, SchemaViolation, TensorMap};
use tracing::debug;

use crate::{BatchError, BatchLedger};

/// Merged request plus the row counts needed to split its response.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergedBatch {
    pub merged: TensorMap,
    pub ledger: BatchLedger,
}

/// Per-request validation against the baseline (first) request of a batch.
pub struct Admission<'a> {
    schema: Cow<'a, BatchSchema>,
    baseline: &'a TensorMap,
}

impl<'a> Admission<'a> {
    pub fn new(policy: &'a SchemaPolicy, baseline: &'a TensorMap) -> Self {
        Self {
            schema: policy.schema_for(baseline),
            baseline,
        }
    }

    /// Checks that `request` can be stacked onto the baseline and returns
    /// its row count for the ledger.
    pub fn admit(&self, index: usize, request: &TensorMap) -> Result<usize, BatchError> {
        let mismatch = |source| BatchError::SchemaMismatch { index, source };

        self.schema.check(request).map_err(mismatch)?;
        let rows = request
            .batch_rows()
            .ok_or(BatchError::MissingBatchDim { index })?;

        for (name, tensor) in request {
            let Some(base) = self.baseline.get(name) else {
                if self.schema.extra() == ExtraTensors::Reject {
                    return Err(mismatch(SchemaViolation::NotInBatch {
                        tensor: name.clone(),
                    }));
                }
                continue;
            };
            match (base.shape.is_scalar(), tensor.rows()) {
                (true, None) => continue,
                (true, Some(_)) => {
                    return Err(mismatch(SchemaViolation::Scalar {
                        tensor: name.clone(),
                    }));
                }
                (false, None) => {
                    return Err(mismatch(SchemaViolation::Unbatched {
                        tensor: name.clone(),
                    }));
                }
                (false, Some(actual)) if actual != rows => {
                    return Err(mismatch(SchemaViolation::Rows {
                        tensor: name.clone(),
                        expected: rows,
                        actual,
                    }));
                }
                (false, Some(_)) => {}
            }
            if base.shape.trailing() != tensor.shape.trailing() {
                return Err(mismatch(SchemaViolation::TrailingDims {
                    tensor: name.clone(),
                    expected: base.shape.trailing().to_vec(),
                    actual: tensor.shape.trailing().to_vec(),
                }));
            }
        }
        Ok(rows)
    }
}

/// Stacks `requests` along the batch dimension.
///
/// The first request seeds the merged map; later requests append rows to the
/// tensors it already holds. With [`SchemaPolicy::FirstRequest`] a tensor that
/// only later requests carry is left out of the merged map; a declared schema
/// rejects such a request instead.
pub fn merge(requests: &[TensorMap], policy: &SchemaPolicy) -> Result<MergedBatch, BatchError> {
    let Some(first) = requests.first() else {
        return Ok(MergedBatch::default());
    };

    let admission = Admission::new(policy, first);
    let mut ledger = BatchLedger::with_capacity(requests.len());
    for (index, request) in requests.iter().enumerate() {
        ledger.push(admission.admit(index, request)?);
    }

    let mut merged = first.clone();
    for request in &requests[1..] {
        append_rows(&mut merged, request)?;
    }

    debug!(
        batch = requests.len(),
        rows = ?ledger.total_rows(),
        tensors = merged.len(),
        "merged batch"
    );
    Ok(MergedBatch { merged, ledger })
}

fn append_rows(merged: &mut TensorMap, request: &TensorMap) -> Result<(), BatchError> {
    for (name, tensor) in request {
        let Some(rows) = tensor.rows() else {
            continue;
        };
        let Some(target) = merged.get_mut(name) else {
            debug!(tensor = %name, "dropping tensor absent from the first request");
            continue;
        };
        target.values.extend_from(&tensor.values)?;
        if let Some(dim) = target.shape.0.first_mut() {
            *dim += rows;
        }
    }
    Ok(())
}
