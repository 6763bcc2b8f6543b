use crate::prior::ln_prior_1d::{LnPrior1D, LnPrior1DTrait};

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Natural logarithm of the joint prior of independent orbital parameters
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename = "IndComponentsLnPrior")]
pub struct LnPrior {
    components: Vec<LnPrior1D>,
}

impl LnPrior {
    pub fn ind_components(components: Vec<LnPrior1D>) -> Self {
        Self { components }
    }

    pub fn n_params(&self) -> usize {
        self.components.len()
    }

    pub fn components(&self) -> &[LnPrior1D] {
        &self.components
    }

    /// Evaluate the natural logarithm of the prior at params
    ///
    /// Extra parameters are ignored, missing parameters give NaN.
    pub fn ln_prior(&self, params: &[f64]) -> f64 {
        if params.len() < self.components.len() {
            return f64::NAN;
        }
        params
            .iter()
            .zip(self.components.iter())
            .map(|(&x, ln_prior)| ln_prior.ln_prior_1d(x))
            .sum()
    }

    /// Log-prior of every row of a `(M, n_params)` array
    pub fn ln_prior_rows(&self, params: ArrayView2<f64>) -> Array1<f64> {
        params
            .axis_iter(Axis(0))
            .map(|row| match row.as_slice() {
                Some(slice) => self.ln_prior(slice),
                None => self.ln_prior(&row.to_vec()),
            })
            .collect()
    }

    /// Index of the first component which cannot be sampled from
    pub fn improper_component(&self) -> Option<usize> {
        self.components.iter().position(|prior| !prior.is_proper())
    }

    /// Whether each parameter is free, i.e. not fixed to a single value
    pub fn free_mask(&self) -> Vec<bool> {
        self.components
            .iter()
            .map(|prior| prior.fixed_value().is_none())
            .collect()
    }

    /// Draw `n` independent parameter sets, `(n, n_params)`
    ///
    /// Fails with the index of the first improper component.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Array2<f64>, usize> {
        let mut samples = Array2::zeros((n, self.components.len()));
        for mut row in samples.axis_iter_mut(Axis(0)) {
            for (index, (x, prior)) in row.iter_mut().zip(self.components.iter()).enumerate() {
                *x = prior.sample(rng).ok_or(index)?;
            }
        }
        Ok(samples)
    }
}

impl From<Vec<LnPrior1D>> for LnPrior {
    fn from(components: Vec<LnPrior1D>) -> Self {
        Self::ind_components(components)
    }
}
