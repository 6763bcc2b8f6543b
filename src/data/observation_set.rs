use crate::data::{AngularIndices, DataRecord, QuantityType};
use crate::error::ObservationError;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Immutable table of observations a fit is run against
///
/// Each epoch carries two measured components and their errors, `data` and `errors` are
/// `(n_epochs, 2)` arrays. Position angles are stored in radians. The second component of an
/// RV epoch carries no measurement: it is stored as NaN and flagged as unused, so it never
/// contributes to the likelihood.
///
/// The set is built once per run and shared read-only between all likelihood evaluations.
#[derive(Clone, Debug)]
pub struct ObservationSet {
    epochs: Array1<f64>,
    objects: Vec<u32>,
    quantity_types: Vec<QuantityType>,
    data: Array2<f64>,
    errors: Array2<f64>,
    used: Array2<bool>,
    angular: AngularIndices,
}

impl ObservationSet {
    /// Validate and convert table rows
    ///
    /// Fails with [ObservationError::InvalidErrorValue] if any error of a measured component is
    /// not strictly positive and finite.
    pub fn new(records: impl IntoIterator<Item = DataRecord>) -> Result<Self, ObservationError> {
        let records: Vec<_> = records.into_iter().collect();
        if records.is_empty() {
            return Err(ObservationError::Empty);
        }
        let n_epochs = records.len();

        let mut epochs = Array1::zeros(n_epochs);
        let mut objects = Vec::with_capacity(n_epochs);
        let mut quantity_types = Vec::with_capacity(n_epochs);
        let mut data = Array2::from_elem((n_epochs, 2), f64::NAN);
        let mut errors = Array2::from_elem((n_epochs, 2), f64::NAN);
        let mut used = Array2::from_elem((n_epochs, 2), false);

        for (epoch, record) in records.into_iter().enumerate() {
            epochs[epoch] = record.epoch;
            objects.push(record.object);
            quantity_types.push(record.quant_type);

            check_measurement(epoch, 0, record.quant1, record.quant1_err)?;
            data[[epoch, 0]] = record.quant1;
            errors[[epoch, 0]] = record.quant1_err;
            used[[epoch, 0]] = true;

            match (record.quant_type, record.quant2, record.quant2_err) {
                (QuantityType::Rv, None, None) => {}
                (QuantityType::Rv, _, _) => {
                    return Err(ObservationError::UnexpectedSecondComponent { epoch });
                }
                (quantity_type, Some(value), Some(error)) => {
                    check_measurement(epoch, 1, value, error)?;
                    let (value, error) = if quantity_type.is_angular() {
                        (value.to_radians(), error.to_radians())
                    } else {
                        (value, error)
                    };
                    data[[epoch, 1]] = value;
                    errors[[epoch, 1]] = error;
                    used[[epoch, 1]] = true;
                }
                (quantity_type, _, _) => {
                    return Err(ObservationError::MissingSecondComponent {
                        epoch,
                        quantity_type,
                    });
                }
            }
        }

        let angular = quantity_types
            .iter()
            .enumerate()
            .filter(|(_, quantity_type)| quantity_type.is_angular())
            .map(|(epoch, _)| epoch)
            .collect();

        Ok(Self {
            epochs,
            objects,
            quantity_types,
            data,
            errors,
            used,
            angular,
        })
    }

    #[inline]
    pub fn n_epochs(&self) -> usize {
        self.epochs.len()
    }

    /// Epochs, MJD
    pub fn epochs(&self) -> ArrayView1<'_, f64> {
        self.epochs.view()
    }

    pub fn objects(&self) -> &[u32] {
        &self.objects
    }

    pub fn quantity_types(&self) -> &[QuantityType] {
        &self.quantity_types
    }

    /// Measured values, `(n_epochs, 2)`
    pub fn data(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Measurement errors, `(n_epochs, 2)`
    pub fn errors(&self) -> ArrayView2<'_, f64> {
        self.errors.view()
    }

    /// Mask of components carrying a measurement, `(n_epochs, 2)`
    pub fn used(&self) -> ArrayView2<'_, bool> {
        self.used.view()
    }

    /// Epochs measured as separation and position angle
    pub fn angular_indices(&self) -> &AngularIndices {
        &self.angular
    }

    /// Number of measured components over all epochs
    pub fn n_measurements(&self) -> usize {
        self.used.iter().filter(|&&is_used| is_used).count()
    }
}

fn check_measurement(
    epoch: usize,
    component: usize,
    value: f64,
    error: f64,
) -> Result<(), ObservationError> {
    if !value.is_finite() {
        return Err(ObservationError::NonFiniteValue {
            epoch,
            component,
            value,
        });
    }
    // Negated comparison also rejects NaN
    if !(error > 0.0 && error.is_finite()) {
        return Err(ObservationError::InvalidErrorValue {
            epoch,
            component,
            value: error,
        });
    }
    Ok(())
}
