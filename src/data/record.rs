use crate::data::QuantityType;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single row of the normalized observation table
///
/// Units: epoch in MJD, RA/Dec offsets and separation in mas, position angle in degrees east
/// of north, radial velocity in km/s. `quant2` and `quant2_err` are `None` for RV rows.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct DataRecord {
    pub epoch: f64,
    pub object: u32,
    pub quant1: f64,
    pub quant1_err: f64,
    pub quant2: Option<f64>,
    pub quant2_err: Option<f64>,
    pub quant_type: QuantityType,
}

impl DataRecord {
    pub fn radec(
        epoch: f64,
        object: u32,
        raoff: f64,
        raoff_err: f64,
        decoff: f64,
        decoff_err: f64,
    ) -> Self {
        Self {
            epoch,
            object,
            quant1: raoff,
            quant1_err: raoff_err,
            quant2: Some(decoff),
            quant2_err: Some(decoff_err),
            quant_type: QuantityType::RaDec,
        }
    }

    /// Separation/position angle row, `pa` and `pa_err` are in degrees
    pub fn seppa(
        epoch: f64,
        object: u32,
        sep: f64,
        sep_err: f64,
        pa: f64,
        pa_err: f64,
    ) -> Self {
        Self {
            epoch,
            object,
            quant1: sep,
            quant1_err: sep_err,
            quant2: Some(pa),
            quant2_err: Some(pa_err),
            quant_type: QuantityType::SepPa,
        }
    }

    pub fn rv(epoch: f64, object: u32, rv: f64, rv_err: f64) -> Self {
        Self {
            epoch,
            object,
            quant1: rv,
            quant1_err: rv_err,
            quant2: None,
            quant2_err: None,
            quant_type: QuantityType::Rv,
        }
    }
}
