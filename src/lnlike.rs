//! Residual engine: per-epoch, per-component, per-orbit chi-squared terms
//!
//! The model predictions of a batch of `M` candidate orbits form an `(n_epochs, 2, M)` array,
//! a single orbit may be given as a plain `(n_epochs, 2)` array. The output mirrors the rank of
//! the input, each entry is the Gaussian log-likelihood term
//!
//! ```text
//! chi2 = -0.5 * (data - model)^2 / errors^2
//! ```
//!
//! For epochs listed in [AngularIndices] the second component is a position angle and its
//! residual is the shortest signed angular difference, `atan2(sin(d), cos(d))`.
//!
//! All inputs are borrowed immutably, reshaping happens on private views only, so the same
//! arrays may be shared between threads evaluating different batches.

use crate::data::AngularIndices;
use crate::error::ShapeError;
use crate::float_trait::Float;

use ndarray::{Array2, Array3, ArrayD, ArrayView2, ArrayView3, ArrayViewD, Axis, Ix2, Ix3, Zip, s};

/// Model predictions of one or many candidate orbits
#[derive(Clone, Debug)]
pub enum ModelBatch<'a, T> {
    /// A single orbit, `(n_epochs, 2)`
    Single(ArrayView2<'a, T>),
    /// Many orbits, `(n_epochs, 2, M)`
    Batch(ArrayView3<'a, T>),
}

impl<T> ModelBatch<'_, T> {
    pub fn n_candidates(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Batch(model) => model.len_of(Axis(2)),
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Single(model) => model.shape(),
            Self::Batch(model) => model.shape(),
        }
    }
}

impl<'a, T> From<ArrayView2<'a, T>> for ModelBatch<'a, T> {
    fn from(model: ArrayView2<'a, T>) -> Self {
        Self::Single(model)
    }
}

impl<'a, T> From<&'a Array2<T>> for ModelBatch<'a, T> {
    fn from(model: &'a Array2<T>) -> Self {
        Self::Single(model.view())
    }
}

impl<'a, T> From<ArrayView3<'a, T>> for ModelBatch<'a, T> {
    fn from(model: ArrayView3<'a, T>) -> Self {
        Self::Batch(model)
    }
}

impl<'a, T> From<&'a Array3<T>> for ModelBatch<'a, T> {
    fn from(model: &'a Array3<T>) -> Self {
        Self::Batch(model.view())
    }
}

/// Chi-squared tensor, same rank as the [ModelBatch] it was computed from
#[derive(Clone, Debug, PartialEq)]
pub enum Chi2<T> {
    /// `(n_epochs, 2)`
    Single(Array2<T>),
    /// `(n_epochs, 2, M)`
    Batch(Array3<T>),
}

impl<T> Chi2<T> {
    pub fn n_candidates(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Batch(chi2) => chi2.len_of(Axis(2)),
        }
    }

    pub fn ndim(&self) -> usize {
        match self {
            Self::Single(_) => 2,
            Self::Batch(_) => 3,
        }
    }

    /// Three-dimensional view with the candidate axis trailing, `(n_epochs, 2, M)`
    pub fn as_batch(&self) -> ArrayView3<'_, T> {
        match self {
            Self::Single(chi2) => chi2.view().insert_axis(Axis(2)),
            Self::Batch(chi2) => chi2.view(),
        }
    }

    pub fn into_dyn(self) -> ArrayD<T> {
        match self {
            Self::Single(chi2) => chi2.into_dyn(),
            Self::Batch(chi2) => chi2.into_dyn(),
        }
    }
}

/// Compute chi-squared terms of model predictions against the data
///
/// - `data`: `(n_epochs, 2)` measured values, position angles in radians
/// - `errors`: `(n_epochs, 2)` measurement errors, same shape as `data`
/// - `model`: `(n_epochs, 2, M)` or `(n_epochs, 2)` predictions, see [ModelBatch]
/// - `angular_indices`: epochs whose second component is a position angle
///
/// Returns [Chi2::Single] for a two-dimensional model and [Chi2::Batch] otherwise. NaN
/// predictions give NaN only in the corresponding entries. Errors are not checked for
/// positivity here, this is guaranteed by [ObservationSet](crate::ObservationSet).
pub fn compute_chi2<'a, T>(
    data: ArrayView2<T>,
    errors: ArrayView2<T>,
    model: impl Into<ModelBatch<'a, T>>,
    angular_indices: &AngularIndices,
) -> Result<Chi2<T>, ShapeError>
where
    T: Float,
{
    let model = model.into();
    check_shapes(&data, &errors, model.shape())?;
    angular_indices.validate(data.nrows())?;

    // Candidate index goes first, so that (n_epochs, 2) arrays broadcast against the batch
    let (batch, is_single) = match model {
        ModelBatch::Single(model) => (model.insert_axis(Axis(0)), true),
        ModelBatch::Batch(model) => (model.permuted_axes([2, 0, 1]), false),
    };

    let mut chi2 = &data - &batch;
    for epoch in angular_indices.iter() {
        let observed = data[[epoch, 1]];
        Zip::from(chi2.slice_mut(s![.., epoch, 1]))
            .and(batch.slice(s![.., epoch, 1]))
            .for_each(|residual, &predicted| {
                *residual = T::circular_diff(observed, predicted);
            });
    }
    let minus_half = -T::half();
    Zip::from(&mut chi2)
        .and_broadcast(&errors)
        .for_each(|residual, &error| {
            let z = *residual / error;
            *residual = minus_half * z * z;
        });

    Ok(if is_single {
        Chi2::Single(chi2.index_axis_move(Axis(0), 0))
    } else {
        Chi2::Batch(
            chi2.permuted_axes([1, 2, 0])
                .as_standard_layout()
                .into_owned(),
        )
    })
}

/// [compute_chi2] for a model of run-time rank
///
/// `model` must be two- or three-dimensional, the output has the same number of dimensions.
pub fn compute_chi2_dyn<T>(
    data: ArrayView2<T>,
    errors: ArrayView2<T>,
    model: ArrayViewD<T>,
    angular_indices: &AngularIndices,
) -> Result<ArrayD<T>, ShapeError>
where
    T: Float,
{
    let ndim = model.ndim();
    let chi2 = match ndim {
        2 => {
            let model = model
                .into_dimensionality::<Ix2>()
                .map_err(|_| ShapeError::ModelRank { ndim })?;
            compute_chi2(data, errors, model, angular_indices)?
        }
        3 => {
            let model = model
                .into_dimensionality::<Ix3>()
                .map_err(|_| ShapeError::ModelRank { ndim })?;
            compute_chi2(data, errors, model, angular_indices)?
        }
        _ => return Err(ShapeError::ModelRank { ndim }),
    };
    Ok(chi2.into_dyn())
}

fn check_shapes<T>(
    data: &ArrayView2<T>,
    errors: &ArrayView2<T>,
    model_shape: &[usize],
) -> Result<(), ShapeError> {
    if data.ncols() != 2 {
        return Err(ShapeError::ComponentCount {
            actual: data.ncols(),
        });
    }
    if errors.dim() != data.dim() {
        return Err(ShapeError::ErrorsShape {
            data: data.dim(),
            errors: errors.dim(),
        });
    }
    if model_shape[..2] != *data.shape() {
        return Err(ShapeError::ModelShape {
            data: data.dim(),
            model: model_shape.to_vec(),
        });
    }
    Ok(())
}
