use crate::array_stats::argmax;
use crate::error::ResultsError;
use crate::sampler::SamplerState;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Posterior samples collected by a sampler run
#[derive(Clone, Debug, PartialEq)]
pub struct Results {
    sampler_name: String,
    labels: Vec<String>,
    post: Array2<f64>,
    lnlike: Option<Array1<f64>>,
    degenerate_count: usize,
    state: SamplerState,
}

impl Results {
    /// Empty results for parameters named by `labels`
    pub fn new(sampler_name: impl Into<String>, labels: Vec<String>) -> Self {
        let n_params = labels.len();
        Self {
            sampler_name: sampler_name.into(),
            labels,
            post: Array2::zeros((0, n_params)),
            lnlike: None,
            degenerate_count: 0,
            state: SamplerState::Initialized,
        }
    }

    /// Append `(n, n_params)` samples and optionally their `n` log-likelihoods
    ///
    /// Log-likelihoods must be given either with every call or never, empty results accept both.
    pub fn add_samples(
        &mut self,
        post: ArrayView2<f64>,
        lnlike: Option<ArrayView1<f64>>,
    ) -> Result<(), ResultsError> {
        if post.ncols() != self.n_params() {
            return Err(ResultsError::ParameterCount {
                actual: post.ncols(),
                expected: self.n_params(),
            });
        }
        if let Some(lnlike) = lnlike {
            if lnlike.len() != post.nrows() {
                return Err(ResultsError::LnLikeCount {
                    samples: post.nrows(),
                    ln_likes: lnlike.len(),
                });
            }
        }
        match (&self.lnlike, lnlike) {
            (None, Some(_)) if !self.is_empty() => return Err(ResultsError::LnLikePresence),
            (Some(_), None) => return Err(ResultsError::LnLikePresence),
            _ => {}
        }
        self.post
            .append(Axis(0), post)
            .map_err(|_| ResultsError::ParameterCount {
                actual: post.ncols(),
                expected: self.labels.len(),
            })?;
        if let Some(lnlike) = lnlike {
            self.lnlike
                .get_or_insert_with(|| Array1::zeros(0))
                .append(Axis(0), lnlike)
                .map_err(|_| ResultsError::LnLikeCount {
                    samples: post.nrows(),
                    ln_likes: lnlike.len(),
                })?;
        }
        Ok(())
    }

    pub fn sampler_name(&self) -> &str {
        &self.sampler_name
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn n_params(&self) -> usize {
        self.labels.len()
    }

    /// Number of stored samples
    pub fn len(&self) -> usize {
        self.post.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Samples, `(len, n_params)`
    pub fn post(&self) -> ArrayView2<'_, f64> {
        self.post.view()
    }

    pub fn lnlike(&self) -> Option<ArrayView1<'_, f64>> {
        self.lnlike.as_ref().map(|lnlike| lnlike.view())
    }

    /// Samples of a single parameter
    pub fn column(&self, label: &str) -> Option<ArrayView1<'_, f64>> {
        let index = self.labels.iter().position(|x| x == label)?;
        Some(self.post.column(index))
    }

    /// Sample with the largest finite log-likelihood
    pub fn best_fit(&self) -> Option<ArrayView1<'_, f64>> {
        let index = argmax(self.lnlike.as_ref()?.view())?;
        Some(self.post.row(index))
    }

    /// Number of candidates with NaN or infinite log-likelihood met during the run
    pub fn degenerate_count(&self) -> usize {
        self.degenerate_count
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub(crate) fn set_degenerate_count(&mut self, degenerate_count: usize) {
        self.degenerate_count = degenerate_count;
    }

    pub(crate) fn set_state(&mut self, state: SamplerState) {
        self.state = state;
    }

    /// Keep only the first `n` samples
    pub(crate) fn truncate(&mut self, n: usize) {
        if n >= self.len() {
            return;
        }
        self.post = self.post.slice_axis(Axis(0), (..n).into()).to_owned();
        if let Some(lnlike) = &mut self.lnlike {
            *lnlike = lnlike.slice_axis(Axis(0), (..n).into()).to_owned();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;

    fn results() -> Results {
        Results::new("test", vec!["sma1".to_owned(), "ecc1".to_owned()])
    }

    #[test]
    fn add_samples_appends() {
        let mut results = results();
        assert!(results.is_empty());
        results
            .add_samples(array![[1.0, 0.1], [2.0, 0.2]].view(), Some(array![-1.0, -2.0].view()))
            .unwrap();
        results
            .add_samples(array![[3.0, 0.3]].view(), Some(array![-0.5].view()))
            .unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results.post(), array![[1.0, 0.1], [2.0, 0.2], [3.0, 0.3]]);
        assert_eq!(results.lnlike().unwrap(), array![-1.0, -2.0, -0.5]);
        assert_eq!(results.column("ecc1").unwrap(), array![0.1, 0.2, 0.3]);
        assert!(results.column("tau1").is_none());
        assert_eq!(results.best_fit().unwrap(), array![3.0, 0.3]);
    }

    #[test]
    fn add_samples_without_lnlike() {
        let mut results = results();
        results
            .add_samples(array![[1.0, 0.1]].view(), None)
            .unwrap();
        results
            .add_samples(array![[2.0, 0.2]].view(), None)
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.lnlike().is_none());
        assert!(results.best_fit().is_none());
    }

    #[test]
    fn add_samples_rejects_wrong_shapes() {
        let mut results = results();
        assert_eq!(
            results.add_samples(array![[1.0, 0.1, 5.0]].view(), None),
            Err(ResultsError::ParameterCount {
                actual: 3,
                expected: 2
            })
        );
        assert_eq!(
            results.add_samples(array![[1.0, 0.1]].view(), Some(array![0.0, 1.0].view())),
            Err(ResultsError::LnLikeCount {
                samples: 1,
                ln_likes: 2
            })
        );
        assert!(results.is_empty());
    }

    #[test]
    fn add_samples_requires_consistent_lnlike() {
        let mut results = results();
        results
            .add_samples(array![[1.0, 0.1]].view(), Some(array![-1.0].view()))
            .unwrap();
        assert_eq!(
            results.add_samples(array![[2.0, 0.2]].view(), None),
            Err(ResultsError::LnLikePresence)
        );
        // Failed call leaves results untouched
        assert_eq!(results.len(), 1);
        assert_eq!(results.lnlike().unwrap(), array![-1.0]);

        let mut results = self::results();
        results
            .add_samples(array![[1.0, 0.1]].view(), None)
            .unwrap();
        assert_eq!(
            results.add_samples(array![[2.0, 0.2]].view(), Some(array![-1.0].view())),
            Err(ResultsError::LnLikePresence)
        );
    }

    #[test]
    fn truncate() {
        let mut results = results();
        results
            .add_samples(
                array![[1.0, 0.1], [2.0, 0.2], [3.0, 0.3]].view(),
                Some(array![-1.0, -2.0, -3.0].view()),
            )
            .unwrap();
        results.truncate(5);
        assert_eq!(results.len(), 3);
        results.truncate(2);
        assert_eq!(results.post(), array![[1.0, 0.1], [2.0, 0.2]]);
        assert_eq!(results.lnlike().unwrap(), array![-1.0, -2.0]);
    }
}
