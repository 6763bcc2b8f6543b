use crate::array_stats::finite_max;
use crate::error::{SamplerConfigError, SamplerError};
use crate::results::Results;
use crate::sampler::{DegenerateCounter, Posterior, SamplerState, SamplerTrait, StopSignal};
use crate::system::System;

use ndarray::{Array1, Axis};
use rand::prelude::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Rejection sampler drawing candidate orbits from the priors
///
/// Each batch of `num_samples` prior draws is evaluated at once, a candidate is kept if
/// `ln(u) < ln_like - max(ln_like)` for a uniform `u`, where the maximum is over finite
/// log-likelihoods of the batch. Batches repeat until the requested number of samples is
/// accepted or `max_batches` batches were drawn.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename = "Rejection")]
pub struct RejectionSampler {
    #[serde(default = "RejectionSampler::default_num_samples")]
    pub num_samples: usize,
    #[serde(default = "RejectionSampler::default_max_batches")]
    pub max_batches: usize,
}

impl RejectionSampler {
    pub fn new(num_samples: usize, max_batches: usize) -> Self {
        Self {
            num_samples,
            max_batches,
        }
    }

    #[inline]
    pub fn default_num_samples() -> usize {
        10_000
    }

    #[inline]
    pub fn default_max_batches() -> usize {
        1_000
    }
}

impl Default for RejectionSampler {
    fn default() -> Self {
        Self::new(Self::default_num_samples(), Self::default_max_batches())
    }
}

impl SamplerTrait for RejectionSampler {
    fn name(&self) -> &'static str {
        "ofti"
    }

    fn validate(&self, system: &System) -> Result<(), SamplerConfigError> {
        if self.num_samples == 0 {
            return Err(SamplerConfigError::NonPositive("num_samples"));
        }
        if self.max_batches == 0 {
            return Err(SamplerConfigError::NonPositive("max_batches"));
        }
        system.check_proper_priors()
    }

    fn run(
        &self,
        posterior: &Posterior,
        rng: &mut StdRng,
        total: usize,
        stop: &StopSignal,
    ) -> Result<Results, SamplerError> {
        let system = posterior.system();
        self.validate(system)?;

        let mut results = Results::new(self.name(), system.labels().to_vec());
        let mut degenerate = DegenerateCounter::new();
        let mut state = SamplerState::Initialized;
        info!(
            total,
            batch_size = self.num_samples,
            max_batches = self.max_batches,
            "starting rejection sampling"
        );

        let mut batch = 0;
        while results.len() < total {
            if stop.is_stopped() {
                info!(batch, accepted = results.len(), "rejection sampling stopped");
                state = SamplerState::Stopped;
                break;
            }
            if batch == self.max_batches {
                warn!(
                    batch,
                    accepted = results.len(),
                    total,
                    "maximum number of batches reached"
                );
                state = SamplerState::Stopped;
                break;
            }
            state = SamplerState::Running;
            batch += 1;

            let candidates = system.sample_priors(self.num_samples, rng)?;
            let ln_like = posterior.ln_like(candidates.view())?;
            degenerate.record(ln_like.view());
            // Drawn for every candidate so the random stream doesn't depend on the data
            let u: Array1<f64> = (0..self.num_samples).map(|_| rng.random()).collect();

            let Some(ln_like_max) = finite_max(ln_like.view()) else {
                debug!(batch, "no finite log-likelihood in batch");
                continue;
            };
            let accepted: Vec<usize> = ln_like
                .iter()
                .zip(u.iter())
                .enumerate()
                .filter(|(_, (ll, u))| ll.is_finite() && u.ln() < *ll - ln_like_max)
                .map(|(index, _)| index)
                .take(total - results.len())
                .collect();
            results.add_samples(
                candidates.select(Axis(0), &accepted).view(),
                Some(ln_like.select(Axis(0), &accepted).view()),
            )?;
            debug!(
                batch,
                accepted = accepted.len(),
                total_accepted = results.len(),
                ln_like_max,
                "rejection batch done"
            );
        }
        if results.len() >= total {
            state = SamplerState::Converged;
        }

        info!(
            accepted = results.len(),
            batches = batch,
            degenerate = degenerate.degenerate(),
            evaluated = degenerate.total(),
            %state,
            "rejection sampling finished"
        );
        results.set_degenerate_count(degenerate.degenerate());
        results.set_state(state);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prior::{LnPrior, LnPrior1D};
    use crate::sampler::tests::{posterior, posterior_with_priors, truth};

    #[test]
    fn collects_requested_samples() {
        let posterior = posterior(1);
        let sampler = RejectionSampler::new(2_000, 500);
        let results = sampler
            .run(
                &posterior,
                &mut StdRng::seed_from_u64(0),
                20,
                &StopSignal::new(),
            )
            .unwrap();
        assert_eq!(results.state(), SamplerState::Converged);
        assert_eq!(results.sampler_name(), "ofti");
        assert_eq!(results.len(), 20);
        assert_eq!(results.post().ncols(), 8);
        let lnlike = results.lnlike().unwrap();
        assert!(lnlike.iter().all(|x| x.is_finite()));
        // Fixed parallax and mass
        assert!(results.column("plx").unwrap().iter().all(|&x| x == truth()[6]));
        assert!(results.column("mtot").unwrap().iter().all(|&x| x == truth()[7]));
    }

    #[test]
    fn deterministic_across_thread_counts() {
        let sampler = RejectionSampler::new(500, 100);
        let run = |num_threads| {
            sampler
                .run(
                    &posterior(num_threads),
                    &mut StdRng::seed_from_u64(42),
                    5,
                    &StopSignal::new(),
                )
                .unwrap()
        };
        assert_eq!(run(1), run(4));
    }

    #[test]
    fn zero_total_converges_immediately() {
        let results = RejectionSampler::default()
            .run(
                &posterior(1),
                &mut StdRng::seed_from_u64(0),
                0,
                &StopSignal::new(),
            )
            .unwrap();
        assert!(results.is_empty());
        assert_eq!(results.state(), SamplerState::Converged);
    }

    #[test]
    fn stop_signal_is_checked_before_batches() {
        let stop = StopSignal::new();
        stop.stop();
        let results = RejectionSampler::default()
            .run(&posterior(1), &mut StdRng::seed_from_u64(0), 10, &stop)
            .unwrap();
        assert!(results.is_empty());
        assert_eq!(results.state(), SamplerState::Stopped);
    }

    #[test]
    fn all_degenerate_batches_accept_nothing() {
        // Eccentricities above one give NaN predictions for every candidate
        let mut components = vec![LnPrior1D::uniform(0.0, 1.0); 8];
        components[0] = LnPrior1D::log_uniform(1.0, 100.0);
        components[1] = LnPrior1D::uniform(1.5, 2.0);
        components[6] = LnPrior1D::fixed(truth()[6]);
        components[7] = LnPrior1D::fixed(truth()[7]);
        let posterior = posterior_with_priors(LnPrior::ind_components(components));

        let results = RejectionSampler::new(100, 3)
            .run(
                &posterior,
                &mut StdRng::seed_from_u64(0),
                10,
                &StopSignal::new(),
            )
            .unwrap();
        assert!(results.is_empty());
        assert_eq!(results.state(), SamplerState::Stopped);
        assert_eq!(results.degenerate_count(), 300);
    }

    #[test]
    fn invalid_config() {
        let posterior = posterior(1);
        let system = posterior.system();
        assert_eq!(
            RejectionSampler::new(0, 1).validate(system),
            Err(SamplerConfigError::NonPositive("num_samples"))
        );
        assert_eq!(
            RejectionSampler::new(1, 0).validate(system),
            Err(SamplerConfigError::NonPositive("max_batches"))
        );
        let improper = posterior_with_priors(LnPrior::ind_components(vec![LnPrior1D::none(); 8]));
        assert_eq!(
            RejectionSampler::default()
                .run(
                    &improper,
                    &mut StdRng::seed_from_u64(0),
                    1,
                    &StopSignal::new()
                )
                .unwrap_err(),
            SamplerError::Config(SamplerConfigError::ImproperPrior {
                label: "sma1".to_owned()
            })
        );
    }

    #[test]
    fn serde_defaults() {
        let sampler: RejectionSampler = serde_json::from_str(r#"{"num_samples": 10}"#).unwrap();
        assert_eq!(sampler, RejectionSampler::new(10, 1_000));
    }
}
