use crate::error::PriorError;

use enum_dispatch::enum_dispatch;
use ordered_float::NotNan;
use rand::Rng;
use rand_distr::StandardNormal;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

#[enum_dispatch]
pub trait LnPrior1DTrait:
    Clone + Debug + Serialize + DeserializeOwned + PartialEq + Eq + Hash
{
    /// Evaluate the natural logarithm of the prior at x
    fn ln_prior_1d(&self, x: f64) -> f64;

    /// Whether the prior is a normalizable distribution which can be sampled from
    fn is_proper(&self) -> bool {
        true
    }
}

/// Natural logarithm of prior for a single orbital parameter
#[enum_dispatch(LnPrior1DTrait)]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum LnPrior1D {
    None(NoneLnPrior1D),
    LogNormal(LogNormalLnPrior1D),
    LogUniform(LogUniformLnPrior1D),
    Normal(NormalLnPrior1D),
    Uniform(UniformLnPrior1D),
    Sine(SineLnPrior1D),
    Fixed(FixedLnPrior1D),
    Mix(MixLnPrior1D),
}

impl LnPrior1D {
    pub fn none() -> Self {
        NoneLnPrior1D {}.into()
    }

    pub fn log_normal(mu: f64, std: f64) -> Self {
        LogNormalLnPrior1D::new(mu, std).into()
    }

    pub fn log_uniform(left: f64, right: f64) -> Self {
        LogUniformLnPrior1D::new(left, right).into()
    }

    pub fn normal(mu: f64, std: f64) -> Self {
        NormalLnPrior1D::new(mu, std).into()
    }

    pub fn uniform(left: f64, right: f64) -> Self {
        UniformLnPrior1D::new(left, right).into()
    }

    pub fn sine() -> Self {
        SineLnPrior1D {}.into()
    }

    pub fn fixed(value: f64) -> Self {
        FixedLnPrior1D::new(value).into()
    }

    pub fn mix(weight_prior_pairs: &[(f64, LnPrior1D)]) -> Self {
        MixLnPrior1D::new(weight_prior_pairs).into()
    }

    /// Draw a random value from the prior distribution
    ///
    /// Returns `None` for improper priors.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<f64> {
        match self {
            Self::None(_) => None,
            Self::LogNormal(p) => Some(p.sample(rng)),
            Self::LogUniform(p) => Some(p.sample(rng)),
            Self::Normal(p) => Some(p.sample(rng)),
            Self::Uniform(p) => Some(p.sample(rng)),
            Self::Sine(p) => Some(p.sample(rng)),
            Self::Fixed(p) => Some(p.value()),
            Self::Mix(p) => p.sample(rng),
        }
    }

    /// Value of a fixed parameter, `None` for priors of free parameters
    pub fn fixed_value(&self) -> Option<f64> {
        match self {
            Self::Fixed(p) => Some(p.value()),
            _ => None,
        }
    }
}

/// Improper flat prior, cannot be sampled from
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct NoneLnPrior1D {}

impl LnPrior1DTrait for NoneLnPrior1D {
    fn ln_prior_1d(&self, _x: f64) -> f64 {
        0.0
    }

    fn is_proper(&self) -> bool {
        false
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(
    into = "LogNormalLnPrior1DParameters",
    try_from = "LogNormalLnPrior1DParameters"
)]
pub struct LogNormalLnPrior1D {
    mu: NotNan<f64>,
    inv_std2: NotNan<f64>,
    ln_prob_coeff: NotNan<f64>,
}

impl LogNormalLnPrior1D {
    /// Prior of `x` where `ln(x)` is normally distributed with mean `mu` and deviation `std`
    ///
    /// # Panics
    ///
    /// Panics if `mu` is NaN or `std` is not positive and finite.
    pub fn new(mu: f64, std: f64) -> Self {
        Self::try_new(mu, std).unwrap_or_else(|err| panic!("{err}"))
    }

    pub fn try_new(mu: f64, std: f64) -> Result<Self, PriorError> {
        let (inv_std2, ln_prob_coeff) = gaussian_coefficients(std)?;
        Ok(Self {
            mu: NotNan::new(mu).map_err(|_| PriorError::NotANumber("mu"))?,
            inv_std2,
            ln_prob_coeff,
        })
    }

    fn mu(&self) -> f64 {
        self.mu.into_inner()
    }

    fn inv_std2(&self) -> f64 {
        self.inv_std2.into_inner()
    }

    fn std(&self) -> f64 {
        self.inv_std2().recip().sqrt()
    }

    fn ln_prob_coeff(&self) -> f64 {
        self.ln_prob_coeff.into_inner()
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let z: f64 = rng.sample(StandardNormal);
        f64::exp(self.mu() + self.std() * z)
    }
}

impl LnPrior1DTrait for LogNormalLnPrior1D {
    fn ln_prior_1d(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return f64::NEG_INFINITY;
        }
        let ln_x = f64::ln(x);
        let diff = self.mu() - ln_x;
        self.ln_prob_coeff() - 0.5 * diff.powi(2) * self.inv_std2() - ln_x
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "LogNormalLnPrior1D")]
struct LogNormalLnPrior1DParameters {
    mu: f64,
    std: f64,
}

impl From<LogNormalLnPrior1D> for LogNormalLnPrior1DParameters {
    fn from(f: LogNormalLnPrior1D) -> Self {
        Self {
            mu: f.mu(),
            std: f.std(),
        }
    }
}

impl TryFrom<LogNormalLnPrior1DParameters> for LogNormalLnPrior1D {
    type Error = PriorError;

    fn try_from(f: LogNormalLnPrior1DParameters) -> Result<Self, Self::Error> {
        Self::try_new(f.mu, f.std)
    }
}

/// Jeffreys prior, uniform in `ln(x)`
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(
    into = "LogUniformLnPrior1DParameters",
    try_from = "LogUniformLnPrior1DParameters"
)]
pub struct LogUniformLnPrior1D {
    ln_range: std::ops::RangeInclusive<NotNan<f64>>,
    ln_prob_coeff: NotNan<f64>,
}

impl LogUniformLnPrior1D {
    /// # Panics
    ///
    /// Panics unless `0 < left < right < inf`.
    pub fn new(left: f64, right: f64) -> Self {
        Self::try_new(left, right).unwrap_or_else(|err| panic!("{err}"))
    }

    pub fn try_new(left: f64, right: f64) -> Result<Self, PriorError> {
        if !(left > 0.0) {
            return Err(invalid_range(left, right));
        }
        let (ln_range, ln_prob_coeff) = uniform_range(f64::ln(left), f64::ln(right))
            .map_err(|_| invalid_range(left, right))?;
        Ok(Self {
            ln_range,
            ln_prob_coeff,
        })
    }

    fn ln_left(&self) -> f64 {
        self.ln_range.start().into_inner()
    }

    fn ln_right(&self) -> f64 {
        self.ln_range.end().into_inner()
    }

    fn ln_prob_coeff(&self) -> f64 {
        self.ln_prob_coeff.into_inner()
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let u: f64 = rng.random();
        f64::exp(self.ln_left() + u * (self.ln_right() - self.ln_left()))
    }
}

impl LnPrior1DTrait for LogUniformLnPrior1D {
    fn ln_prior_1d(&self, x: f64) -> f64 {
        let Ok(ln_x) = NotNan::new(f64::ln(x)) else {
            return f64::NEG_INFINITY;
        };
        if self.ln_range.contains(&ln_x) {
            self.ln_prob_coeff() - ln_x.into_inner()
        } else {
            f64::NEG_INFINITY
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "LogUniformLnPrior")]
struct LogUniformLnPrior1DParameters {
    ln_range: std::ops::RangeInclusive<f64>,
}

impl From<LogUniformLnPrior1D> for LogUniformLnPrior1DParameters {
    fn from(f: LogUniformLnPrior1D) -> Self {
        Self {
            ln_range: f.ln_left()..=f.ln_right(),
        }
    }
}

impl TryFrom<LogUniformLnPrior1DParameters> for LogUniformLnPrior1D {
    type Error = PriorError;

    fn try_from(f: LogUniformLnPrior1DParameters) -> Result<Self, Self::Error> {
        Self::try_new(f.ln_range.start().exp(), f.ln_range.end().exp())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(
    into = "NormalLnPrior1DParameters",
    try_from = "NormalLnPrior1DParameters"
)]
pub struct NormalLnPrior1D {
    mu: NotNan<f64>,
    inv_std2: NotNan<f64>,
    ln_prob_coeff: NotNan<f64>,
}

impl NormalLnPrior1D {
    /// # Panics
    ///
    /// Panics if `mu` is NaN or `std` is not positive and finite.
    pub fn new(mu: f64, std: f64) -> Self {
        Self::try_new(mu, std).unwrap_or_else(|err| panic!("{err}"))
    }

    pub fn try_new(mu: f64, std: f64) -> Result<Self, PriorError> {
        let (inv_std2, ln_prob_coeff) = gaussian_coefficients(std)?;
        Ok(Self {
            mu: NotNan::new(mu).map_err(|_| PriorError::NotANumber("mu"))?,
            inv_std2,
            ln_prob_coeff,
        })
    }

    fn mu(&self) -> f64 {
        self.mu.into_inner()
    }

    fn inv_std2(&self) -> f64 {
        self.inv_std2.into_inner()
    }

    fn std(&self) -> f64 {
        self.inv_std2().recip().sqrt()
    }

    fn ln_prob_coeff(&self) -> f64 {
        self.ln_prob_coeff.into_inner()
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let z: f64 = rng.sample(StandardNormal);
        self.mu() + self.std() * z
    }
}

impl LnPrior1DTrait for NormalLnPrior1D {
    fn ln_prior_1d(&self, x: f64) -> f64 {
        let diff = self.mu() - x;
        self.ln_prob_coeff() - 0.5 * diff.powi(2) * self.inv_std2()
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "NormalLnPrior1D")]
struct NormalLnPrior1DParameters {
    mu: f64,
    std: f64,
}

impl From<NormalLnPrior1D> for NormalLnPrior1DParameters {
    fn from(f: NormalLnPrior1D) -> Self {
        Self {
            mu: f.mu(),
            std: f.std(),
        }
    }
}

impl TryFrom<NormalLnPrior1DParameters> for NormalLnPrior1D {
    type Error = PriorError;

    fn try_from(f: NormalLnPrior1DParameters) -> Result<Self, Self::Error> {
        Self::try_new(f.mu, f.std)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(
    into = "UniformLnPrior1DParameters",
    try_from = "UniformLnPrior1DParameters"
)]
pub struct UniformLnPrior1D {
    range: std::ops::RangeInclusive<NotNan<f64>>,
    ln_prob: NotNan<f64>,
}

impl UniformLnPrior1D {
    /// # Panics
    ///
    /// Panics unless `left < right`, both finite.
    pub fn new(left: f64, right: f64) -> Self {
        Self::try_new(left, right).unwrap_or_else(|err| panic!("{err}"))
    }

    pub fn try_new(left: f64, right: f64) -> Result<Self, PriorError> {
        let (range, ln_prob) = uniform_range(left, right)?;
        Ok(Self { range, ln_prob })
    }

    fn left(&self) -> f64 {
        self.range.start().into_inner()
    }

    fn right(&self) -> f64 {
        self.range.end().into_inner()
    }

    fn ln_prob(&self) -> f64 {
        self.ln_prob.into_inner()
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let u: f64 = rng.random();
        self.left() + u * (self.right() - self.left())
    }
}

impl LnPrior1DTrait for UniformLnPrior1D {
    fn ln_prior_1d(&self, x: f64) -> f64 {
        let Ok(x) = NotNan::new(x) else {
            return f64::NEG_INFINITY;
        };
        if self.range.contains(&x) {
            self.ln_prob()
        } else {
            f64::NEG_INFINITY
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "UniformLnPrior")]
struct UniformLnPrior1DParameters {
    range: std::ops::RangeInclusive<f64>,
}

impl From<UniformLnPrior1D> for UniformLnPrior1DParameters {
    fn from(f: UniformLnPrior1D) -> Self {
        Self {
            range: f.left()..=f.right(),
        }
    }
}

impl TryFrom<UniformLnPrior1DParameters> for UniformLnPrior1D {
    type Error = PriorError;

    fn try_from(f: UniformLnPrior1DParameters) -> Result<Self, Self::Error> {
        Self::try_new(*f.range.start(), *f.range.end())
    }
}

/// Isotropic inclination prior, `sin(x) / 2` on `[0, pi]`
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct SineLnPrior1D {}

impl SineLnPrior1D {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let u: f64 = rng.random();
        f64::acos(1.0 - 2.0 * u)
    }
}

impl LnPrior1DTrait for SineLnPrior1D {
    fn ln_prior_1d(&self, x: f64) -> f64 {
        if (0.0..=std::f64::consts::PI).contains(&x) {
            f64::ln(0.5 * x.sin())
        } else {
            f64::NEG_INFINITY
        }
    }
}

/// Delta-function prior of a parameter which is not fit
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct FixedLnPrior1D {
    value: NotNan<f64>,
}

impl FixedLnPrior1D {
    /// # Panics
    ///
    /// Panics if `value` is NaN.
    pub fn new(value: f64) -> Self {
        Self::try_new(value).unwrap_or_else(|err| panic!("{err}"))
    }

    pub fn try_new(value: f64) -> Result<Self, PriorError> {
        Ok(Self {
            value: NotNan::new(value).map_err(|_| PriorError::NotANumber("value"))?,
        })
    }

    pub fn value(&self) -> f64 {
        self.value.into_inner()
    }
}

impl LnPrior1DTrait for FixedLnPrior1D {
    fn ln_prior_1d(&self, x: f64) -> f64 {
        if x == self.value() {
            0.0
        } else {
            f64::NEG_INFINITY
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(into = "MixLnPrior1DParameters", try_from = "MixLnPrior1DParameters")]
pub struct MixLnPrior1D {
    mix: Vec<(NotNan<f64>, LnPrior1D)>,
}

impl MixLnPrior1D {
    /// Create MixLnPrior1D from pairs of a weight (positive number) and an instance of `LnPrior1D`
    ///
    /// # Panics
    ///
    /// Panics if there are no pairs or any weight is not positive and finite.
    pub fn new(weight_prior_pairs: &[(f64, LnPrior1D)]) -> Self {
        Self::try_new(weight_prior_pairs).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Weights are normalized to unit sum
    pub fn try_new(weight_prior_pairs: &[(f64, LnPrior1D)]) -> Result<Self, PriorError> {
        if weight_prior_pairs.is_empty() {
            return Err(PriorError::EmptyMix);
        }
        if let Some((weight, _)) = weight_prior_pairs
            .iter()
            .find(|(weight, _)| !(*weight > 0.0 && weight.is_finite()))
        {
            return Err(PriorError::NonPositive {
                name: "weight",
                value: weight.to_string(),
            });
        }
        let total_weight: f64 = weight_prior_pairs.iter().map(|(weight, _)| *weight).sum();
        let mix = weight_prior_pairs
            .iter()
            .map(|(weight, prior)| -> Result<_, PriorError> {
                let weight = NotNan::new(*weight / total_weight).map_err(|_| {
                    PriorError::NonPositive {
                        name: "total weight",
                        value: total_weight.to_string(),
                    }
                })?;
                Ok((weight, prior.clone()))
            })
            .collect::<Result<Vec<_>, PriorError>>()?;
        Ok(Self { mix })
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<f64> {
        let mut u: f64 = rng.random();
        for (weight, prior) in &self.mix {
            u -= weight.into_inner();
            if u < 0.0 {
                return prior.sample(rng);
            }
        }
        // Weights may sum to slightly less than one
        self.mix.last().and_then(|(_, prior)| prior.sample(rng))
    }
}

impl LnPrior1DTrait for MixLnPrior1D {
    fn ln_prior_1d(&self, x: f64) -> f64 {
        let total_prob: f64 = self
            .mix
            .iter()
            .map(|(weight, prior)| weight.into_inner() * f64::exp(prior.ln_prior_1d(x)))
            .sum();
        f64::ln(total_prob)
    }

    fn is_proper(&self) -> bool {
        self.mix.iter().all(|(_, prior)| prior.is_proper())
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(rename = "MixLnPrior1D")]
struct MixLnPrior1DParameters {
    mix: Vec<(f64, LnPrior1D)>,
}

impl From<MixLnPrior1D> for MixLnPrior1DParameters {
    fn from(f: MixLnPrior1D) -> Self {
        Self {
            mix: f
                .mix
                .into_iter()
                .map(|(weight, prior)| (weight.into_inner(), prior))
                .collect(),
        }
    }
}

impl TryFrom<MixLnPrior1DParameters> for MixLnPrior1D {
    type Error = PriorError;

    fn try_from(f: MixLnPrior1DParameters) -> Result<Self, Self::Error> {
        Self::try_new(&f.mix)
    }
}

/// `1 / std^2` and the log of the Gaussian normalization
fn gaussian_coefficients(std: f64) -> Result<(NotNan<f64>, NotNan<f64>), PriorError> {
    if !(std > 0.0 && std.is_finite()) {
        return Err(PriorError::NonPositive {
            name: "std",
            value: std.to_string(),
        });
    }
    let non_positive = |_| PriorError::NonPositive {
        name: "std",
        value: std.to_string(),
    };
    Ok((
        NotNan::new(std.powi(-2)).map_err(non_positive)?,
        NotNan::new(-f64::ln(std) - 0.5 * f64::ln(std::f64::consts::TAU)).map_err(non_positive)?,
    ))
}

fn invalid_range(left: f64, right: f64) -> PriorError {
    PriorError::InvalidRange {
        left: left.to_string(),
        right: right.to_string(),
    }
}

/// Finite non-empty range and the log of its inverse width
fn uniform_range(
    left: f64,
    right: f64,
) -> Result<(std::ops::RangeInclusive<NotNan<f64>>, NotNan<f64>), PriorError> {
    if !(left < right && left.is_finite() && right.is_finite()) {
        return Err(invalid_range(left, right));
    }
    let ln_prob = NotNan::new(-f64::ln(right - left)).map_err(|_| invalid_range(left, right))?;
    let left = NotNan::new(left).map_err(|_| invalid_range(left, right))?;
    let right = NotNan::new(right).map_err(|_| invalid_range(left.into_inner(), right))?;
    Ok((left..=right, ln_prob))
}
