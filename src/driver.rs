use crate::data::{DataRecord, ObservationSet, read_formatted_csv};
use crate::error::DriverError;
use crate::likelihood::Likelihood;
use crate::results::Results;
use crate::sampler::{Posterior, SamplerAlgorithm, SamplerConfig, SamplerTrait, StopSignal};
use crate::system::{System, SystemConfig};

use rand::SeedableRng;
use rand::rngs::StdRng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::sync::Arc;
use tracing::info;

/// Everything needed to set up a fit besides the observations
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct DriverConfig {
    pub system: SystemConfig,
    #[serde(default)]
    pub sampler: SamplerConfig,
}

impl DriverConfig {
    pub fn new(system: SystemConfig, sampler: SamplerConfig) -> Self {
        Self { system, sampler }
    }
}

/// Sets up observations, system, likelihood and sampler, and runs the fit
///
/// The random number generator persists between [Driver::run] calls, so repeated runs continue
/// the random stream instead of repeating it.
#[derive(Debug)]
pub struct Driver {
    system: Arc<System>,
    posterior: Posterior,
    algorithm: SamplerAlgorithm,
    rng: StdRng,
}

impl Driver {
    /// Validate the table rows and build every component
    pub fn new(
        records: impl IntoIterator<Item = DataRecord>,
        config: &DriverConfig,
    ) -> Result<Self, DriverError> {
        let observations = Arc::new(ObservationSet::new(records)?);
        let system = System::new(&config.system, observations)?;
        Self::with_system(system, &config.sampler)
    }

    /// Read observations in the CSV format of [read_formatted_csv]
    pub fn from_csv<R: Read>(reader: R, config: &DriverConfig) -> Result<Self, DriverError> {
        Self::new(read_formatted_csv(reader)?, config)
    }

    /// Use a ready system, e.g. one with custom priors
    pub fn with_system(system: System, config: &SamplerConfig) -> Result<Self, DriverError> {
        let algorithm = config.algorithm();
        algorithm.validate(&system)?;
        let system = Arc::new(system);
        let likelihood = Likelihood::new(system.observations().clone(), config.likelihood);
        let posterior = Posterior::new(system.clone(), likelihood, config.num_threads)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        info!(
            sampler = algorithm.name(),
            likelihood = %config.likelihood,
            n_epochs = system.observations().n_epochs(),
            n_params = system.n_params(),
            num_threads = config.num_threads,
            "driver is set up"
        );
        Ok(Self {
            system,
            posterior,
            algorithm,
            rng,
        })
    }

    pub fn system(&self) -> &Arc<System> {
        &self.system
    }

    pub fn posterior(&self) -> &Posterior {
        &self.posterior
    }

    pub fn algorithm(&self) -> &SamplerAlgorithm {
        &self.algorithm
    }

    /// Collect `total` posterior samples, see [SamplerTrait::run]
    pub fn run(&mut self, total: usize, stop: &StopSignal) -> Result<Results, DriverError> {
        let results = self
            .algorithm
            .run(&self.posterior, &mut self.rng, total, stop)?;
        info!(
            sampler = results.sampler_name(),
            samples = results.len(),
            state = %results.state(),
            "run finished"
        );
        Ok(results)
    }
}
