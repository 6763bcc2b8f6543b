use crate::data::ObservationSet;
use crate::error::{SamplerConfigError, ShapeError};
use crate::float_trait::Float;
use crate::lnlike::{Chi2, ModelBatch, compute_chi2};

use ndarray::{Array1, ArrayView2, Axis, s};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// How chi-squared terms are turned into a log-likelihood
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LikelihoodMode {
    /// Sum of chi-squared terms, good for relative comparison of candidates only
    #[default]
    #[serde(alias = "chi2_lnlike")]
    Chi2,
    /// Sum of chi-squared terms plus the Gaussian normalization `-0.5 ln(2 pi error^2)`
    #[serde(alias = "normalized_chi2_lnlike")]
    Normalized,
}

impl LikelihoodMode {
    const NAMES: [(&'static str, Self); 4] = [
        ("chi2", Self::Chi2),
        ("chi2_lnlike", Self::Chi2),
        ("normalized", Self::Normalized),
        ("normalized_chi2_lnlike", Self::Normalized),
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Chi2 => "chi2",
            Self::Normalized => "normalized",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::NAMES.iter().map(|(name, _)| *name).collect()
    }
}

impl fmt::Display for LikelihoodMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LikelihoodMode {
    type Err = SamplerConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::NAMES
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, mode)| *mode)
            .ok_or_else(|| SamplerConfigError::UnknownLikelihood(s.to_owned(), Self::names()))
    }
}

/// Log-likelihood of every candidate of a batch
#[derive(Clone, Debug, PartialEq)]
pub enum LnLike<T> {
    /// Computed from a single-orbit model
    Single(T),
    /// One value per candidate
    Batch(Array1<T>),
}

impl<T: Float> LnLike<T> {
    pub fn n_candidates(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Batch(ln_like) => ln_like.len(),
        }
    }

    pub fn into_array1(self) -> Array1<T> {
        match self {
            Self::Single(ln_like) => Array1::from_elem(1, ln_like),
            Self::Batch(ln_like) => ln_like,
        }
    }

    fn add_constant(self, constant: T) -> Self {
        match self {
            Self::Single(ln_like) => Self::Single(ln_like + constant),
            Self::Batch(ln_like) => Self::Batch(ln_like + constant),
        }
    }
}

/// Sum chi-squared terms over epochs and components, one value per candidate
///
/// Components with `false` in the `used` mask, `(n_epochs, 2)`, are skipped. NaN terms of used
/// components propagate into the candidate's result.
pub fn aggregate_chi2<T>(chi2: &Chi2<T>, used: ArrayView2<bool>) -> Result<LnLike<T>, ShapeError>
where
    T: Float,
{
    let batch = chi2.as_batch();
    if batch.shape()[..2] != *used.shape() {
        return Err(ShapeError::ModelShape {
            data: used.dim(),
            model: batch.shape().to_vec(),
        });
    }
    let mut ln_like = Array1::zeros(batch.len_of(Axis(2)));
    for ((epoch, component), &is_used) in used.indexed_iter() {
        if is_used {
            ln_like += &batch.slice(s![epoch, component, ..]);
        }
    }
    Ok(match chi2 {
        Chi2::Single(_) => LnLike::Single(ln_like[0]),
        Chi2::Batch(_) => LnLike::Batch(ln_like),
    })
}

/// Log-likelihood of candidate orbits against a fixed set of observations
///
/// Holds everything needed to evaluate a batch of model predictions: the shared observations
/// and the aggregation mode, with the normalization constant precomputed.
#[derive(Clone, Debug)]
pub struct Likelihood {
    observations: Arc<ObservationSet>,
    mode: LikelihoodMode,
    ln_norm: f64,
}

impl Likelihood {
    pub fn new(observations: Arc<ObservationSet>, mode: LikelihoodMode) -> Self {
        let ln_norm = match mode {
            LikelihoodMode::Chi2 => 0.0,
            LikelihoodMode::Normalized => normalization(&observations),
        };
        Self {
            observations,
            mode,
            ln_norm,
        }
    }

    /// Resolve the mode from its registry name, see [LikelihoodMode]
    pub fn from_name(
        observations: Arc<ObservationSet>,
        name: &str,
    ) -> Result<Self, SamplerConfigError> {
        Ok(Self::new(observations, name.parse()?))
    }

    pub fn mode(&self) -> LikelihoodMode {
        self.mode
    }

    pub fn observations(&self) -> &Arc<ObservationSet> {
        &self.observations
    }

    /// Constant added to every candidate's log-likelihood, zero for [LikelihoodMode::Chi2]
    pub fn ln_norm(&self) -> f64 {
        self.ln_norm
    }

    /// Chi-squared terms of the model against the observations, see [compute_chi2]
    pub fn chi2<'a>(
        &self,
        model: impl Into<ModelBatch<'a, f64>>,
    ) -> Result<Chi2<f64>, ShapeError> {
        compute_chi2(
            self.observations.data(),
            self.observations.errors(),
            model,
            self.observations.angular_indices(),
        )
    }

    pub fn ln_like_from_chi2(&self, chi2: &Chi2<f64>) -> Result<LnLike<f64>, ShapeError> {
        let ln_like = aggregate_chi2(chi2, self.observations.used())?;
        Ok(match self.mode {
            LikelihoodMode::Chi2 => ln_like,
            LikelihoodMode::Normalized => ln_like.add_constant(self.ln_norm),
        })
    }

    /// Log-likelihood of every candidate in the batch
    pub fn ln_like<'a>(
        &self,
        model: impl Into<ModelBatch<'a, f64>>,
    ) -> Result<LnLike<f64>, ShapeError> {
        self.ln_like_from_chi2(&self.chi2(model)?)
    }
}

fn normalization(observations: &ObservationSet) -> f64 {
    observations
        .errors()
        .iter()
        .zip(observations.used().iter())
        .filter(|(_, is_used)| **is_used)
        .map(|(&error, _)| -0.5 * f64::ln(std::f64::consts::TAU * error * error))
        .sum()
}
