use ndarray::ArrayView1;
use tracing::{debug, warn};

/// Counts candidates with NaN or infinite log-likelihood
///
/// Such candidates are never accepted, they are counted and logged instead of raising.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DegenerateCounter {
    degenerate: usize,
    total: usize,
}

impl DegenerateCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count non-finite values of a batch, returns the number of them
    pub fn record(&mut self, ln_like: ArrayView1<f64>) -> usize {
        let degenerate = ln_like.iter().filter(|x| !x.is_finite()).count();
        self.degenerate += degenerate;
        self.total += ln_like.len();
        if degenerate > 0 {
            if degenerate == ln_like.len() {
                warn!(
                    batch_size = ln_like.len(),
                    "all candidates of the batch have degenerate log-likelihood"
                );
            } else {
                debug!(
                    degenerate,
                    batch_size = ln_like.len(),
                    "degenerate log-likelihoods in batch"
                );
            }
        }
        degenerate
    }

    pub fn degenerate(&self) -> usize {
        self.degenerate
    }

    pub fn total(&self) -> usize {
        self.total
    }
}
