//! Posterior samplers and their configuration
//!
//! A sampler draws or perturbs candidate parameter sets, evaluates them through the orbit model,
//! residual engine and likelihood aggregator, and decides which candidates to keep. Two
//! algorithms are available: [RejectionSampler] drawing from the priors and the
//! parallel-tempered [McmcSampler]. [SamplerConfig] resolves them from registry names.

use crate::error::{SamplerConfigError, SamplerError};
use crate::likelihood::LikelihoodMode;
use crate::results::Results;
use crate::system::System;

use enum_dispatch::enum_dispatch;
use rand::rngs::StdRng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Debug;
use std::str::FromStr;

mod chain;
pub use chain::Chain;

mod degenerate;
pub use degenerate::DegenerateCounter;

mod mcmc;
pub use mcmc::{McmcSampler, MoveKind, metropolis_accept};

mod posterior;
pub use posterior::Posterior;

mod rejection;
pub use rejection::RejectionSampler;

mod state;
pub use state::SamplerState;

mod stop;
pub use stop::StopSignal;

#[enum_dispatch]
pub trait SamplerTrait: Clone + Debug {
    /// Registry name reported in [Results]
    fn name(&self) -> &'static str;

    /// Check the configuration against the system, e.g. that all priors can be sampled
    fn validate(&self, system: &System) -> Result<(), SamplerConfigError>;

    /// Collect `total` posterior samples
    ///
    /// The run finishes early if `stop` is raised, the returned results are then
    /// [Stopped](SamplerState::Stopped) and hold whatever was collected so far.
    fn run(
        &self,
        posterior: &Posterior,
        rng: &mut StdRng,
        total: usize,
        stop: &StopSignal,
    ) -> Result<Results, SamplerError>;
}

/// Sampling algorithm
#[enum_dispatch(SamplerTrait)]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[non_exhaustive]
pub enum SamplerAlgorithm {
    Rejection(RejectionSampler),
    Mcmc(McmcSampler),
}

impl SamplerAlgorithm {
    pub fn rejection(num_samples: usize, max_batches: usize) -> Self {
        RejectionSampler::new(num_samples, max_batches).into()
    }

    pub fn mcmc(num_temps: usize, num_walkers: usize, burn_steps: usize, thin: usize) -> Self {
        McmcSampler::new(num_temps, num_walkers, burn_steps, thin).into()
    }
}

/// Registry of sampler names
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum SamplerKind {
    /// Rejection sampling from the priors, also known as "ofti"
    #[default]
    #[serde(rename = "ofti", alias = "rejection")]
    Rejection,
    #[serde(rename = "mcmc")]
    Mcmc,
}

impl SamplerKind {
    const NAMES: [(&'static str, Self); 3] = [
        ("ofti", Self::Rejection),
        ("rejection", Self::Rejection),
        ("mcmc", Self::Mcmc),
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Rejection => "ofti",
            Self::Mcmc => "mcmc",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::NAMES.iter().map(|(name, _)| *name).collect()
    }
}

impl fmt::Display for SamplerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SamplerKind {
    type Err = SamplerConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::NAMES
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| SamplerConfigError::UnknownSampler(s.to_owned(), Self::names()))
    }
}

/// Sampler selection and settings of every algorithm
///
/// Only the settings of the selected `sampler` are used.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SamplerConfig {
    #[serde(default)]
    pub sampler: SamplerKind,
    #[serde(default)]
    pub likelihood: LikelihoodMode,
    #[serde(default = "SamplerConfig::default_num_threads")]
    pub num_threads: usize,
    /// Seed of the random number generator, `None` seeds from the OS
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub rejection: RejectionSampler,
    #[serde(default)]
    pub mcmc: McmcSampler,
}

impl SamplerConfig {
    pub fn new(sampler: SamplerKind, likelihood: LikelihoodMode) -> Self {
        Self {
            sampler,
            likelihood,
            num_threads: Self::default_num_threads(),
            seed: None,
            rejection: RejectionSampler::default(),
            mcmc: McmcSampler::default(),
        }
    }

    /// Resolve the sampler and likelihood from their registry names
    pub fn with_names(sampler: &str, likelihood: &str) -> Result<Self, SamplerConfigError> {
        Ok(Self::new(sampler.parse()?, likelihood.parse()?))
    }

    #[inline]
    pub fn default_num_threads() -> usize {
        1
    }

    /// The selected algorithm with its settings
    pub fn algorithm(&self) -> SamplerAlgorithm {
        match self.sampler {
            SamplerKind::Rejection => self.rejection.clone().into(),
            SamplerKind::Mcmc => self.mcmc.clone().into(),
        }
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self::new(SamplerKind::default(), LikelihoodMode::default())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::{DataRecord, ObservationSet};
    use crate::likelihood::Likelihood;
    use crate::orbit::{OrbitalElements, default_tau_ref_epoch};
    use crate::prior::LnPrior;
    use crate::system::SystemConfig;

    use rand::SeedableRng;
    use std::sync::Arc;

    /// `[sma1, ecc1, inc1, aop1, pan1, tau1, plx, mtot]` the fixture observations are made of
    pub(crate) fn truth() -> [f64; 8] {
        [10.0, 0.1, 1.5, 1.0, 0.5, 0.3, 51.44, 1.8]
    }

    pub(crate) fn observations() -> Arc<ObservationSet> {
        let [sma, ecc, inc, aop, pan, tau, plx, mtot] = truth();
        let elements = OrbitalElements {
            sma,
            ecc,
            inc,
            aop,
            pan,
            tau,
        };
        let tau_ref = default_tau_ref_epoch();
        let mut records: Vec<_> = [55000.0, 55300.0, 55700.0, 56200.0]
            .into_iter()
            .map(|epoch| {
                let (raoff, decoff) = elements.radec(epoch, plx, mtot, tau_ref);
                DataRecord::radec(epoch, 1, raoff, 5.0, decoff, 5.0)
            })
            .collect();
        let (sep, pa) = elements.seppa(56800.0, plx, mtot, tau_ref);
        records.push(DataRecord::seppa(56800.0, 1, sep, 5.0, pa.to_degrees(), 0.5));
        let rv = elements.relative_rv(57000.0, mtot, tau_ref);
        records.push(DataRecord::rv(57000.0, 1, rv, 0.5));
        Arc::new(ObservationSet::new(records).unwrap())
    }

    fn system() -> System {
        let [.., plx, mtot] = truth();
        System::new(&SystemConfig::new(mtot, plx), observations()).unwrap()
    }

    pub(crate) fn posterior(num_threads: usize) -> Posterior {
        let system = system();
        let likelihood = Likelihood::new(system.observations().clone(), LikelihoodMode::Chi2);
        Posterior::new(Arc::new(system), likelihood, num_threads).unwrap()
    }

    pub(crate) fn posterior_with_priors(priors: LnPrior) -> Posterior {
        let system = system().with_priors(priors).unwrap();
        let likelihood = Likelihood::new(system.observations().clone(), LikelihoodMode::Chi2);
        Posterior::new(Arc::new(system), likelihood, 1).unwrap()
    }

    #[test]
    fn truth_has_zero_ln_like() {
        let posterior = posterior(1);
        let params = ndarray::Array2::from_shape_vec((1, 8), truth().to_vec()).unwrap();
        let ln_like = posterior.ln_like(params.view()).unwrap();
        assert!(ln_like[0].abs() < 1e-12, "{}", ln_like[0]);
    }

    #[test]
    fn sampler_registry() {
        assert_eq!("ofti".parse::<SamplerKind>(), Ok(SamplerKind::Rejection));
        assert_eq!("rejection".parse::<SamplerKind>(), Ok(SamplerKind::Rejection));
        assert_eq!("mcmc".parse::<SamplerKind>(), Ok(SamplerKind::Mcmc));
        assert_eq!(
            "nested".parse::<SamplerKind>(),
            Err(SamplerConfigError::UnknownSampler(
                "nested".to_owned(),
                vec!["ofti", "rejection", "mcmc"]
            ))
        );
        assert_eq!(SamplerKind::Rejection.to_string(), "ofti");
    }

    #[test]
    fn config_with_names() {
        let config = SamplerConfig::with_names("mcmc", "normalized").unwrap();
        assert_eq!(config.sampler, SamplerKind::Mcmc);
        assert_eq!(config.likelihood, LikelihoodMode::Normalized);
        assert_eq!(
            config.algorithm(),
            SamplerAlgorithm::Mcmc(McmcSampler::default())
        );
        assert!(matches!(
            SamplerConfig::with_names("ofti", "gaussian"),
            Err(SamplerConfigError::UnknownLikelihood(..))
        ));
        assert!(matches!(
            SamplerConfig::with_names("emcee", "chi2"),
            Err(SamplerConfigError::UnknownSampler(..))
        ));
    }

    #[test]
    fn config_serde() {
        let config: SamplerConfig = serde_json::from_str(
            r#"{"sampler": "rejection", "likelihood": "chi2_lnlike", "seed": 5,
                "rejection": {"num_samples": 100}}"#,
        )
        .unwrap();
        assert_eq!(config.sampler, SamplerKind::Rejection);
        assert_eq!(config.seed, Some(5));
        assert_eq!(config.num_threads, 1);
        assert_eq!(
            config.algorithm(),
            SamplerAlgorithm::rejection(100, RejectionSampler::default_max_batches())
        );

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""sampler":"ofti""#));
        let restored: SamplerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn dispatch() {
        let posterior = posterior(1);
        let algorithm = SamplerAlgorithm::rejection(1000, 100);
        assert_eq!(algorithm.name(), "ofti");
        assert!(algorithm.validate(posterior.system()).is_ok());
        let results = algorithm
            .run(
                &posterior,
                &mut StdRng::seed_from_u64(0),
                3,
                &StopSignal::new(),
            )
            .unwrap();
        assert_eq!(results.len(), 3);

        let algorithm = SamplerAlgorithm::mcmc(2, 4, 0, 1);
        assert_eq!(algorithm.name(), "mcmc");
        let results = algorithm
            .run(
                &posterior,
                &mut StdRng::seed_from_u64(0),
                8,
                &StopSignal::new(),
            )
            .unwrap();
        assert_eq!(results.len(), 8);
    }
}
