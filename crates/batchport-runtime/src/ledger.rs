/// Row count of every request in a batch, in request order.
///
/// Produced by the merger and consumed by the splitter to cut each merged
/// output back into per-request slices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchLedger(Vec<usize>);

impl BatchLedger {
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn push(&mut self, rows: usize) {
        self.0.push(rows);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    /// Sum of all row counts, `None` on overflow.
    pub fn total_rows(&self) -> Option<usize> {
        self.0.iter().try_fold(0usize, |acc, rows| acc.checked_add(*rows))
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}

impl From<Vec<usize>> for BatchLedger {
    fn from(rows: Vec<usize>) -> Self {
        Self(rows)
    }
}
