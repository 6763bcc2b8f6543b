//! Orbit models converting orbital parameters into predicted observables

use crate::data::ObservationSet;
use crate::error::ShapeError;

use ndarray::{Array3, ArrayView2};

mod kepler;
pub use kepler::{solve_kepler, true_anomaly};

mod keplerian;
pub use keplerian::{ELEMENTS_PER_BODY, KeplerianOrbit, OrbitalElements, default_tau_ref_epoch};

/// Predicts the observables of every epoch for a batch of parameter sets
pub trait OrbitModel: Send + Sync {
    /// Number of columns of the parameter array
    fn n_params(&self) -> usize;

    /// Model predictions, `(n_epochs, 2, M)`, for `(M, n_params)` parameters
    ///
    /// Each epoch gets the quantity its observation has: RA/Dec offsets, separation and
    /// position angle, or RV with a NaN second component. Unphysical parameters give NaN
    /// predictions instead of errors.
    fn predict(
        &self,
        params: ArrayView2<f64>,
        observations: &ObservationSet,
    ) -> Result<Array3<f64>, ShapeError>;
}
