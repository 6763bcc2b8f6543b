use crate::array_stats::mean_variance;
use crate::error::{SamplerConfigError, SamplerError, ShapeError};
use crate::results::Results;
use crate::sampler::{Chain, DegenerateCounter, Posterior, SamplerState, SamplerTrait, StopSignal};
use crate::system::System;

use ndarray::{Array1, Array2, ArrayView1, Axis, s};
use rand::prelude::*;
use rand_distr::StandardNormal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::f64::consts::SQRT_2;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Proposal used to perturb walkers
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    /// Affine-invariant stretch move towards or away from a walker of the other half-ensemble
    #[default]
    Stretch,
    /// Independent Gaussian random walk of every free parameter
    Gaussian,
}

impl MoveKind {
    const NAMES: [(&'static str, Self); 2] =
        [("stretch", Self::Stretch), ("gaussian", Self::Gaussian)];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Stretch => "stretch",
            Self::Gaussian => "gaussian",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::NAMES.iter().map(|(name, _)| *name).collect()
    }
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MoveKind {
    type Err = SamplerConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::NAMES
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| SamplerConfigError::UnknownMove(s.to_owned(), Self::names()))
    }
}

/// Metropolis rule: always accept non-negative log-ratios, otherwise if `ln(u) < log_ratio`
///
/// NaN log-ratios are never accepted.
pub fn metropolis_accept(log_ratio: f64, u: f64) -> bool {
    log_ratio >= 0.0 || u.ln() < log_ratio
}

/// Parallel-tempered ensemble Markov chain Monte Carlo
///
/// `num_walkers` walkers run at each of `num_temps` temperatures, forming a geometric ladder
/// with ratio $\sqrt{2}$ starting from the posterior itself. Walkers start from prior draws.
/// After every step adjacent temperatures attempt to swap walkers. Only the coldest chain is
/// recorded: after `burn_steps` burn-in steps every `thin`-th step is stored, until the
/// requested number of samples is collected. Optionally the run finishes earlier when the
/// split Gelman-Rubin statistic of every parameter drops under `convergence_threshold`.
///
/// Parameters with fixed priors are never perturbed.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename = "Mcmc")]
pub struct McmcSampler {
    #[serde(default = "McmcSampler::default_num_temps")]
    pub num_temps: usize,
    #[serde(default = "McmcSampler::default_num_walkers")]
    pub num_walkers: usize,
    #[serde(default = "McmcSampler::default_burn_steps")]
    pub burn_steps: usize,
    #[serde(default = "McmcSampler::default_thin")]
    pub thin: usize,
    #[serde(default)]
    pub proposal: MoveKind,
    /// Scale `a` of the stretch move, `z` is drawn from $[1/a, a]$
    #[serde(default = "McmcSampler::default_stretch_scale")]
    pub stretch_scale: f64,
    /// Gaussian step of every free parameter relative to its spread over the initial walkers
    #[serde(default = "McmcSampler::default_gaussian_scale")]
    pub gaussian_scale: f64,
    #[serde(default)]
    pub convergence_threshold: Option<f64>,
}

impl McmcSampler {
    pub fn new(num_temps: usize, num_walkers: usize, burn_steps: usize, thin: usize) -> Self {
        Self {
            num_temps,
            num_walkers,
            burn_steps,
            thin,
            proposal: MoveKind::default(),
            stretch_scale: Self::default_stretch_scale(),
            gaussian_scale: Self::default_gaussian_scale(),
            convergence_threshold: None,
        }
    }

    #[inline]
    pub fn default_num_temps() -> usize {
        20
    }

    #[inline]
    pub fn default_num_walkers() -> usize {
        1000
    }

    #[inline]
    pub fn default_burn_steps() -> usize {
        0
    }

    #[inline]
    pub fn default_thin() -> usize {
        1
    }

    #[inline]
    pub fn default_stretch_scale() -> f64 {
        2.0
    }

    #[inline]
    pub fn default_gaussian_scale() -> f64 {
        0.05
    }

    /// Inverse temperatures, $\beta_k = 2^{-k/2}$
    pub fn betas(&self) -> Array1<f64> {
        (0..self.num_temps)
            .map(|k| SQRT_2.powi(-(k as i32)))
            .collect()
    }

    fn stretch_z<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let u: f64 = rng.random();
        let a = self.stretch_scale;
        ((a - 1.0) * u + 1.0).powi(2) / a
    }

    fn stretch_step(
        &self,
        ensemble: &mut Ensemble,
        evaluator: &mut Evaluator<'_>,
        rng: &mut StdRng,
    ) -> Result<usize, ShapeError> {
        let half_size = self.num_walkers / 2;
        let n_free = evaluator.free.len() as f64;
        let mut accepted = 0;
        for (active, complementary) in [(0, half_size), (half_size, 0)] {
            let indices: Vec<usize> = (0..self.num_temps)
                .flat_map(|temp| {
                    let first = temp * self.num_walkers + active;
                    first..first + half_size
                })
                .collect();
            let mut proposals = ensemble.positions.select(Axis(0), &indices);
            let mut log_z = Array1::zeros(indices.len());
            for (i, &index) in indices.iter().enumerate() {
                let temp = index / self.num_walkers;
                let other = ensemble.index(temp, complementary + rng.random_range(0..half_size));
                let z = self.stretch_z(rng);
                log_z[i] = (n_free - 1.0) * z.ln();
                for &param in evaluator.free.iter() {
                    let c = ensemble.positions[[other, param]];
                    proposals[[i, param]] = c + z * (ensemble.positions[[index, param]] - c);
                }
            }
            accepted += ensemble.update(&indices, proposals, log_z.view(), evaluator, rng)?;
        }
        Ok(accepted)
    }

    fn gaussian_step(
        &self,
        ensemble: &mut Ensemble,
        evaluator: &mut Evaluator<'_>,
        sigma: ArrayView1<f64>,
        rng: &mut StdRng,
    ) -> Result<usize, ShapeError> {
        let indices: Vec<usize> = (0..ensemble.positions.nrows()).collect();
        let mut proposals = ensemble.positions.clone();
        for mut row in proposals.axis_iter_mut(Axis(0)) {
            for (&param, &scale) in evaluator.free.iter().zip(sigma.iter()) {
                let step: f64 = rng.sample(StandardNormal);
                row[param] += scale * step;
            }
        }
        let log_z = Array1::zeros(indices.len());
        ensemble.update(&indices, proposals, log_z.view(), evaluator, rng)
    }

    /// Gaussian step of every free parameter
    fn gaussian_sigma(&self, positions: &Array2<f64>, free: &[usize]) -> Array1<f64> {
        free.iter()
            .map(|&param| {
                let spread = mean_variance(positions.column(param))
                    .map_or(0.0, |(_, variance)| variance.sqrt());
                if spread > 0.0 {
                    self.gaussian_scale * spread
                } else {
                    self.gaussian_scale
                }
            })
            .collect()
    }
}

impl Default for McmcSampler {
    fn default() -> Self {
        Self::new(
            Self::default_num_temps(),
            Self::default_num_walkers(),
            Self::default_burn_steps(),
            Self::default_thin(),
        )
    }
}

impl SamplerTrait for McmcSampler {
    fn name(&self) -> &'static str {
        "mcmc"
    }

    fn validate(&self, system: &System) -> Result<(), SamplerConfigError> {
        if self.num_temps == 0 {
            return Err(SamplerConfigError::ZeroTemperatures);
        }
        let odd = self.num_walkers % 2 == 1 && self.proposal == MoveKind::Stretch;
        if self.num_walkers < 2 || odd {
            return Err(SamplerConfigError::WalkerCount {
                actual: self.num_walkers,
                minimum: 2,
            });
        }
        if self.thin == 0 {
            return Err(SamplerConfigError::NonPositive("thin"));
        }
        if !(self.stretch_scale > 1.0 && self.stretch_scale.is_finite()) {
            return Err(SamplerConfigError::StretchScale(
                self.stretch_scale.to_string(),
            ));
        }
        if !(self.gaussian_scale > 0.0 && self.gaussian_scale.is_finite()) {
            return Err(SamplerConfigError::NonPositive("gaussian_scale"));
        }
        if let Some(threshold) = self.convergence_threshold {
            if !(threshold > 0.0) {
                return Err(SamplerConfigError::NonPositive("convergence_threshold"));
            }
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

        let free: Vec<usize> = system
            .free_mask()
            .iter()
            .enumerate()
            .filter_map(|(param, &is_free)| is_free.then_some(param))
            .collect();
        let mut evaluator = Evaluator {
            posterior,
            free,
            degenerate: DegenerateCounter::new(),
        };

        let positions = system.sample_priors(self.num_temps * self.num_walkers, rng)?;
        let sigma = self.gaussian_sigma(&positions, &evaluator.free);
        let (ln_prior, ln_like) = evaluator.evaluate(&positions)?;
        let mut ensemble = Ensemble {
            positions,
            ln_prior,
            ln_like,
            betas: self.betas(),
            num_walkers: self.num_walkers,
        };

        let n_steps = total.div_ceil(self.num_walkers) * self.thin;
        info!(
            total,
            num_temps = self.num_temps,
            num_walkers = self.num_walkers,
            burn_steps = self.burn_steps,
            n_steps,
            proposal = %self.proposal,
            "starting parallel-tempered mcmc"
        );

        let mut chain = Chain::new(system.n_params(), self.thin);
        let mut state = SamplerState::Initialized;
        let mut accepted = 0;
        let mut proposed = 0;
        let mut swaps = 0;
        for step in 0..self.burn_steps + n_steps {
            if stop.is_stopped() {
                info!(step, "mcmc stopped");
                state = SamplerState::Stopped;
                break;
            }
            state = SamplerState::Running;

            accepted += match self.proposal {
                MoveKind::Stretch => self.stretch_step(&mut ensemble, &mut evaluator, rng)?,
                MoveKind::Gaussian => {
                    self.gaussian_step(&mut ensemble, &mut evaluator, sigma.view(), rng)?
                }
            };
            proposed += ensemble.positions.nrows();
            swaps += ensemble.swap_temperatures(rng);

            if step < self.burn_steps {
                if step + 1 == self.burn_steps {
                    debug!(step, "burn-in finished");
                }
                continue;
            }
            let stored = chain.push(
                ensemble.positions.slice(s![..self.num_walkers, ..]).to_owned(),
                ensemble.ln_like.slice(s![..self.num_walkers]).to_owned(),
            );
            if stored {
                debug!(step, stored = chain.len(), "mcmc step recorded");
                if let Some(threshold) = self.convergence_threshold {
                    if chain.is_converged(threshold) {
                        info!(step, threshold, "cold chain converged");
                        break;
                    }
                }
            }
        }
        if state != SamplerState::Stopped {
            state = SamplerState::Converged;
        }

        let mut results = Results::new(self.name(), system.labels().to_vec());
        results.add_samples(chain.flat_samples().view(), Some(chain.flat_ln_likes().view()))?;
        results.truncate(total);
        results.set_degenerate_count(evaluator.degenerate.degenerate());
        results.set_state(state);
        info!(
            samples = results.len(),
            acceptance_fraction = accepted as f64 / proposed.max(1) as f64,
            swaps,
            degenerate = evaluator.degenerate.degenerate(),
            %state,
            "mcmc finished"
        );
        Ok(results)
    }
}

/// Evaluates proposals, skipping likelihoods of those outside of the prior support
struct Evaluator<'a> {
    posterior: &'a Posterior,
    /// Indices of free parameters
    free: Vec<usize>,
    degenerate: DegenerateCounter,
}

impl Evaluator<'_> {
    /// Log-prior and log-likelihood of every row, non-finite likelihoods become `-inf`
    fn evaluate(&mut self, params: &Array2<f64>) -> Result<(Array1<f64>, Array1<f64>), ShapeError> {
        let ln_prior = self.posterior.ln_prior(params.view());
        let inside: Vec<usize> = ln_prior
            .iter()
            .enumerate()
            .filter_map(|(i, lp)| lp.is_finite().then_some(i))
            .collect();
        let mut ln_like = Array1::from_elem(params.nrows(), f64::NEG_INFINITY);
        if !inside.is_empty() {
            let evaluated = self
                .posterior
                .ln_like(params.select(Axis(0), &inside).view())?;
            self.degenerate.record(evaluated.view());
            for (&i, &ll) in inside.iter().zip(evaluated.iter()) {
                if ll.is_finite() {
                    ln_like[i] = ll;
                }
            }
        }
        Ok((ln_prior, ln_like))
    }
}

/// Walkers of all temperatures, row `temp * num_walkers + walker`
struct Ensemble {
    positions: Array2<f64>,
    ln_prior: Array1<f64>,
    ln_like: Array1<f64>,
    betas: Array1<f64>,
    num_walkers: usize,
}

impl Ensemble {
    fn index(&self, temp: usize, walker: usize) -> usize {
        temp * self.num_walkers + walker
    }

    /// Metropolis update of the walkers at `indices` with their proposals, returns the number
    /// of accepted proposals
    fn update(
        &mut self,
        indices: &[usize],
        proposals: Array2<f64>,
        log_z: ArrayView1<f64>,
        evaluator: &mut Evaluator<'_>,
        rng: &mut StdRng,
    ) -> Result<usize, ShapeError> {
        let (ln_prior, ln_like) = evaluator.evaluate(&proposals)?;
        let mut accepted = 0;
        for (i, &index) in indices.iter().enumerate() {
            let beta = self.betas[index / self.num_walkers];
            let log_ratio = log_z[i]
                + beta * (ln_like[i] - self.ln_like[index])
                + (ln_prior[i] - self.ln_prior[index]);
            if metropolis_accept(log_ratio, rng.random()) {
                self.positions.row_mut(index).assign(&proposals.row(i));
                self.ln_prior[index] = ln_prior[i];
                self.ln_like[index] = ln_like[i];
                accepted += 1;
            }
        }
        Ok(accepted)
    }

    /// Propose swaps of randomly paired walkers of adjacent temperatures, from the hottest
    /// pair down, returns the number of accepted swaps
    fn swap_temperatures(&mut self, rng: &mut StdRng) -> usize {
        let mut swaps = 0;
        let mut pairing: Vec<usize> = (0..self.num_walkers).collect();
        for temp in (1..self.betas.len()).rev() {
            pairing.shuffle(rng);
            let delta_beta = self.betas[temp - 1] - self.betas[temp];
            for (walker, &partner) in pairing.iter().enumerate() {
                let hot = self.index(temp, walker);
                let cold = self.index(temp - 1, partner);
                let log_ratio = delta_beta * (self.ln_like[hot] - self.ln_like[cold]);
                if metropolis_accept(log_ratio, rng.random()) {
                    self.swap(hot, cold);
                    swaps += 1;
                }
            }
        }
        swaps
    }

    fn swap(&mut self, a: usize, b: usize) {
        for param in 0..self.positions.ncols() {
            self.positions.swap([a, param], [b, param]);
        }
        self.ln_prior.swap(a, b);
        self.ln_like.swap(a, b);
    }
}
