use batchport_core::{Tensor, TensorMap};
use tracing::debug;

use crate::{BatchError, BatchLedger};

/// Read position into one merged output tensor.
struct Cursor<'a> {
    name: &'a str,
    tensor: &'a Tensor,
    width: usize,
    offset: usize,
}

impl Cursor<'_> {
    fn take(&mut self, rows: usize) -> Result<Tensor, BatchError> {
        let count = rows * self.width;
        let values = self
            .tensor
            .values
            .copy_range(self.offset..self.offset + count)?;
        self.offset += count;
        Ok(Tensor {
            shape: self.tensor.shape.with_batch_dim(rows),
            values,
        })
    }
}

/// Cuts a merged response into one response per ledger entry.
///
/// Every output is checked against the ledger before any slice is taken, so
/// an inconsistent pair yields an error and no partial output.
pub fn split(merged: &TensorMap, ledger: &BatchLedger) -> Result<Vec<TensorMap>, BatchError> {
    let total_rows = ledger.total_rows();

    let mut cursors = Vec::with_capacity(merged.len());
    for (name, tensor) in merged {
        if tensor.shape.is_scalar() {
            return Err(BatchError::UnbatchedOutput {
                tensor: name.clone(),
            });
        }
        let width = tensor.shape.row_width();
        // An overflowing ledger saturates and can never match a real tensor.
        let expected = total_rows
            .and_then(|rows| rows.checked_mul(width))
            .unwrap_or(usize::MAX);
        let actual = tensor.values.len();
        if expected != actual {
            return Err(BatchError::LedgerInconsistency {
                tensor: name.clone(),
                expected,
                actual,
            });
        }
        cursors.push(Cursor {
            name,
            tensor,
            width,
            offset: 0,
        });
    }

    let mut responses = Vec::with_capacity(ledger.len());
    for rows in ledger.iter() {
        let mut response = TensorMap::new();
        for cursor in &mut cursors {
            response.insert(cursor.name, cursor.take(rows)?);
        }
        responses.push(response);
    }

    debug!(
        responses = responses.len(),
        outputs = cursors.len(),
        "split batch"
    );
    Ok(responses)
}
