use crate::data::{ObservationSet, QuantityType};
use crate::error::{SamplerConfigError, ShapeError, SystemError};
use crate::orbit::{ELEMENTS_PER_BODY, KeplerianOrbit, OrbitModel, default_tau_ref_epoch};
use crate::prior::{LnPrior, LnPrior1D};

use ndarray::{Array1, Array2, Array3, ArrayView2};
use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::sync::Arc;

const ELEMENT_NAMES: [&str; ELEMENTS_PER_BODY] = ["sma", "ecc", "inc", "aop", "pan", "tau"];

/// Physical description of the system being fit
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SystemConfig {
    /// Number of secondaries, observation object ids run from 1 to this value
    #[serde(default = "SystemConfig::default_num_secondary_bodies")]
    pub num_secondary_bodies: usize,
    /// Total system mass, solar masses
    pub system_mass: f64,
    /// Parallax, mas
    pub plx: f64,
    /// Uncertainty of the total mass, zero fixes the mass
    #[serde(default)]
    pub mass_err: f64,
    /// Uncertainty of the parallax, zero fixes the parallax
    #[serde(default)]
    pub plx_err: f64,
    /// Reference epoch of `tau`, MJD
    #[serde(default = "default_tau_ref_epoch")]
    pub tau_ref_epoch: f64,
}

impl SystemConfig {
    pub fn new(system_mass: f64, plx: f64) -> Self {
        Self {
            num_secondary_bodies: Self::default_num_secondary_bodies(),
            system_mass,
            plx,
            mass_err: 0.0,
            plx_err: 0.0,
            tau_ref_epoch: default_tau_ref_epoch(),
        }
    }

    #[inline]
    pub fn default_num_secondary_bodies() -> usize {
        1
    }

    fn validate(&self) -> Result<(), SystemError> {
        if self.num_secondary_bodies == 0 {
            return Err(SystemError::NoSecondaryBodies);
        }
        for (name, value) in [("system_mass", self.system_mass), ("plx", self.plx)] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(SystemError::NonPositive(name));
            }
        }
        for (name, value) in [("mass_err", self.mass_err), ("plx_err", self.plx_err)] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(SystemError::Negative(name));
            }
        }
        if !self.tau_ref_epoch.is_finite() {
            return Err(SystemError::NonFinite("tau_ref_epoch"));
        }
        Ok(())
    }
}

/// Observations, orbit model and priors of a single fit
///
/// Parameters are laid out as `[sma, ecc, inc, aop, pan, tau]` for every secondary body
/// followed by `[plx, mtot]`, see [KeplerianOrbit].
#[derive(Clone, Debug)]
pub struct System {
    observations: Arc<ObservationSet>,
    model: KeplerianOrbit,
    priors: LnPrior,
    labels: Vec<String>,
}

impl System {
    /// Build the system with default priors
    ///
    /// Semi-major axes are log-uniform on `[0.001, 1e4]` AU, eccentricities uniform on
    /// `[0, 1]`, inclinations follow the isotropic sine prior, the other angles and `tau` are
    /// uniform over their full range. Parallax and total mass are normal, or fixed when their
    /// errors are zero.
    pub fn new(
        config: &SystemConfig,
        observations: Arc<ObservationSet>,
    ) -> Result<Self, SystemError> {
        config.validate()?;
        check_objects(&observations, config.num_secondary_bodies)?;

        let num_bodies = config.num_secondary_bodies;
        let mut components = Vec::with_capacity(ELEMENTS_PER_BODY * num_bodies + 2);
        let mut labels = Vec::with_capacity(components.capacity());
        for body in 1..=num_bodies {
            components.extend([
                LnPrior1D::log_uniform(0.001, 1e4),
                LnPrior1D::uniform(0.0, 1.0),
                LnPrior1D::sine(),
                LnPrior1D::uniform(0.0, TAU),
                LnPrior1D::uniform(0.0, TAU),
                LnPrior1D::uniform(0.0, 1.0),
            ]);
            labels.extend(ELEMENT_NAMES.iter().map(|name| format!("{name}{body}")));
        }
        components.push(normal_or_fixed(config.plx, config.plx_err));
        components.push(normal_or_fixed(config.system_mass, config.mass_err));
        labels.extend(["plx".to_owned(), "mtot".to_owned()]);

        Ok(Self {
            observations,
            model: KeplerianOrbit::new(num_bodies, config.tau_ref_epoch),
            priors: LnPrior::ind_components(components),
            labels,
        })
    }

    /// Replace the priors, one per parameter
    pub fn with_priors(mut self, priors: LnPrior) -> Result<Self, SystemError> {
        if priors.n_params() != self.n_params() {
            return Err(SystemError::PriorCount {
                actual: priors.n_params(),
                expected: self.n_params(),
            });
        }
        self.priors = priors;
        Ok(self)
    }

    pub fn observations(&self) -> &Arc<ObservationSet> {
        &self.observations
    }

    pub fn model(&self) -> &KeplerianOrbit {
        &self.model
    }

    pub fn priors(&self) -> &LnPrior {
        &self.priors
    }

    /// Parameter names: `sma1, ecc1, inc1, aop1, pan1, tau1, ..., plx, mtot`
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn n_params(&self) -> usize {
        self.model.n_params()
    }

    /// Model predictions for `(M, n_params)` parameters, `(n_epochs, 2, M)`
    pub fn compute_model(&self, params: ArrayView2<f64>) -> Result<Array3<f64>, ShapeError> {
        self.model.predict(params, &self.observations)
    }

    pub fn ln_prior(&self, params: &[f64]) -> f64 {
        self.priors.ln_prior(params)
    }

    pub fn ln_prior_rows(&self, params: ArrayView2<f64>) -> Array1<f64> {
        self.priors.ln_prior_rows(params)
    }

    /// Fails for improper priors, which cannot be sampled from
    pub fn check_proper_priors(&self) -> Result<(), SamplerConfigError> {
        match self.priors.improper_component() {
            Some(index) => Err(self.improper_prior(index)),
            None => Ok(()),
        }
    }

    /// Draw `n` parameter sets from the priors, `(n, n_params)`
    pub fn sample_priors<R: Rng + ?Sized>(
        &self,
        n: usize,
        rng: &mut R,
    ) -> Result<Array2<f64>, SamplerConfigError> {
        self.priors
            .sample(n, rng)
            .map_err(|index| self.improper_prior(index))
    }

    fn improper_prior(&self, index: usize) -> SamplerConfigError {
        SamplerConfigError::ImproperPrior {
            label: self.labels[index].clone(),
        }
    }

    /// Whether each parameter is free, fixed parameters are never perturbed by samplers
    pub fn free_mask(&self) -> Vec<bool> {
        self.priors.free_mask()
    }
}

fn normal_or_fixed(value: f64, error: f64) -> LnPrior1D {
    if error > 0.0 {
        LnPrior1D::normal(value, error)
    } else {
        LnPrior1D::fixed(value)
    }
}

fn check_objects(observations: &ObservationSet, num_bodies: usize) -> Result<(), SystemError> {
    let rows = observations
        .objects()
        .iter()
        .zip(observations.quantity_types());
    for (epoch, (&object, &quantity_type)) in rows.enumerate() {
        if object as usize > num_bodies {
            return Err(SystemError::UnknownObject {
                epoch,
                object,
                num_bodies,
            });
        }
        if object == 0 {
            return Err(match quantity_type {
                QuantityType::Rv => SystemError::PrimaryRv { epoch },
                quantity_type => SystemError::PrimaryAstrometry {
                    epoch,
                    quantity_type,
                },
            });
        }
    }
    Ok(())
}
