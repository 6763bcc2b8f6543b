use crate::error::{SamplerConfigError, SamplerError, ShapeError};
use crate::likelihood::Likelihood;
use crate::system::System;

use ndarray::{Array1, ArrayView2, Axis};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;

/// Evaluates priors and likelihoods of candidate parameter sets
///
/// With more than one thread candidates are split into row chunks evaluated on a dedicated
/// thread pool. Evaluation involves no randomness, so results don't depend on the thread count.
#[derive(Debug)]
pub struct Posterior {
    system: Arc<System>,
    likelihood: Likelihood,
    pool: Option<ThreadPool>,
}

impl Posterior {
    pub fn new(
        system: Arc<System>,
        likelihood: Likelihood,
        num_threads: usize,
    ) -> Result<Self, SamplerError> {
        let pool = match num_threads {
            0 => return Err(SamplerConfigError::NonPositive("num_threads").into()),
            1 => None,
            _ => Some(
                ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build()
                    .map_err(|err| SamplerError::ThreadPool(err.to_string()))?,
            ),
        };
        Ok(Self {
            system,
            likelihood,
            pool,
        })
    }

    pub fn system(&self) -> &Arc<System> {
        &self.system
    }

    pub fn likelihood(&self) -> &Likelihood {
        &self.likelihood
    }

    pub fn num_threads(&self) -> usize {
        self.pool
            .as_ref()
            .map_or(1, |pool| pool.current_num_threads())
    }

    /// Log-prior of every row of `(M, n_params)` candidates
    pub fn ln_prior(&self, params: ArrayView2<f64>) -> Array1<f64> {
        self.system.ln_prior_rows(params)
    }

    /// Log-likelihood of every row of `(M, n_params)` candidates
    ///
    /// Unphysical candidates get NaN, only shape problems are errors.
    pub fn ln_like(&self, params: ArrayView2<f64>) -> Result<Array1<f64>, ShapeError> {
        let n_candidates = params.nrows();
        let pool = match &self.pool {
            Some(pool) if n_candidates > 1 => pool,
            _ => return self.ln_like_chunk(params),
        };
        let chunk_size = n_candidates.div_ceil(pool.current_num_threads());
        let chunks: Vec<_> = params.axis_chunks_iter(Axis(0), chunk_size).collect();
        let ln_likes = pool.install(|| {
            chunks
                .par_iter()
                .map(|chunk| self.ln_like_chunk(chunk.view()))
                .collect::<Result<Vec<_>, _>>()
        })?;
        Ok(ln_likes
            .iter()
            .flat_map(|ln_like| ln_like.iter().copied())
            .collect())
    }

    fn ln_like_chunk(&self, params: ArrayView2<f64>) -> Result<Array1<f64>, ShapeError> {
        if params.nrows() == 0 {
            return Ok(Array1::zeros(0));
        }
        let model = self.system.compute_model(params)?;
        Ok(self.likelihood.ln_like(&model)?.into_array1())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::tests::posterior;

    use ndarray::Array2;
    use rand::prelude::*;

    #[test]
    fn zero_threads_is_an_error() {
        let posterior = posterior(1);
        let err = Posterior::new(
            posterior.system().clone(),
            posterior.likelihood().clone(),
            0,
        )
        .unwrap_err();
        assert_eq!(
            err,
            SamplerError::Config(SamplerConfigError::NonPositive("num_threads"))
        );
    }

    #[test]
    fn thread_count_does_not_change_values() {
        let single = posterior(1);
        let multi = posterior(3);
        assert_eq!(multi.num_threads(), 3);

        let params = single
            .system()
            .sample_priors(101, &mut StdRng::seed_from_u64(0))
            .unwrap();
        let expected = single.ln_like(params.view()).unwrap();
        let actual = multi.ln_like(params.view()).unwrap();
        assert_eq!(expected.len(), 101);
        // NaN != NaN, compare bit patterns
        assert_eq!(
            expected.mapv(f64::to_bits),
            actual.mapv(f64::to_bits)
        );
    }

    #[test]
    fn empty_batch() {
        let posterior = posterior(2);
        let params = Array2::zeros((0, 8));
        assert_eq!(posterior.ln_like(params.view()).unwrap().len(), 0);
    }

    #[test]
    fn wrong_parameter_count() {
        let posterior = posterior(2);
        let params = Array2::zeros((4, 5));
        assert_eq!(
            posterior.ln_like(params.view()),
            Err(ShapeError::ParameterCount {
                actual: 5,
                expected: 8
            })
        );
    }

    #[test]
    fn unphysical_candidate_is_nan() {
        let posterior = posterior(1);
        let mut params = posterior
            .system()
            .sample_priors(2, &mut StdRng::seed_from_u64(3))
            .unwrap();
        params[[1, 1]] = 1.5;
        let ln_like = posterior.ln_like(params.view()).unwrap();
        assert!(ln_like[0].is_finite());
        assert!(ln_like[1].is_nan());
    }
}
