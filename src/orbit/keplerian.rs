use crate::data::{ObservationSet, QuantityType};
use crate::error::ShapeError;
use crate::orbit::OrbitModel;
use crate::orbit::kepler::{solve_kepler, true_anomaly};

use ndarray::{Array3, ArrayView1, ArrayView2, ArrayViewMut2, Axis, s};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Number of orbital elements per secondary body
pub const ELEMENTS_PER_BODY: usize = 6;

const DAYS_PER_YEAR: f64 = 365.25;
/// One AU per Julian year, km/s
const AU_PER_YEAR_KM_S: f64 = 4.740470463533348;

/// Orbital elements of a single secondary relative to the primary
///
/// Angles are in radians, `tau` is the epoch of periastron in units of the period after the
/// reference epoch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitalElements {
    /// Semi-major axis, AU
    pub sma: f64,
    pub ecc: f64,
    pub inc: f64,
    /// Argument of periastron
    pub aop: f64,
    /// Position angle of nodes
    pub pan: f64,
    pub tau: f64,
}

impl OrbitalElements {
    /// Read `[sma, ecc, inc, aop, pan, tau]`
    fn from_slice(elements: ArrayView1<f64>) -> Self {
        Self {
            sma: elements[0],
            ecc: elements[1],
            inc: elements[2],
            aop: elements[3],
            pan: elements[4],
            tau: elements[5],
        }
    }

    /// Orbital period for the total mass `mtot` in solar masses, years
    pub fn period(&self, mtot: f64) -> f64 {
        f64::sqrt(self.sma.powi(3) / mtot)
    }

    /// Eccentric and true anomalies at `epoch` (MJD)
    fn anomalies(&self, epoch: f64, mtot: f64, tau_ref_epoch: f64) -> (f64, f64) {
        let period_days = self.period(mtot) * DAYS_PER_YEAR;
        let mean_anomaly = TAU * ((epoch - tau_ref_epoch) / period_days - self.tau);
        let eanom = solve_kepler(mean_anomaly, self.ecc);
        (eanom, true_anomaly(eanom, self.ecc))
    }

    /// RA and Dec offsets of the secondary from the primary, mas
    pub fn radec(&self, epoch: f64, plx: f64, mtot: f64, tau_ref_epoch: f64) -> (f64, f64) {
        let (eanom, tanom) = self.anomalies(epoch, mtot, tau_ref_epoch);
        let radius = self.sma * (1.0 - self.ecc * eanom.cos());
        let c2i2 = f64::cos(0.5 * self.inc).powi(2);
        let s2i2 = f64::sin(0.5 * self.inc).powi(2);
        let (s1, c1) = f64::sin_cos(tanom + self.aop + self.pan);
        let (s2, c2) = f64::sin_cos(tanom + self.aop - self.pan);
        let raoff = radius * (c2i2 * s1 - s2i2 * s2) * plx;
        let deoff = radius * (c2i2 * c1 + s2i2 * c2) * plx;
        (raoff, deoff)
    }

    /// Separation (mas) and position angle east of north in `[0, 2pi)`
    pub fn seppa(&self, epoch: f64, plx: f64, mtot: f64, tau_ref_epoch: f64) -> (f64, f64) {
        let (raoff, deoff) = self.radec(epoch, plx, mtot, tau_ref_epoch);
        (
            f64::hypot(raoff, deoff),
            f64::atan2(raoff, deoff).rem_euclid(TAU),
        )
    }

    /// Radial velocity of the secondary relative to the primary, km/s
    pub fn relative_rv(&self, epoch: f64, mtot: f64, tau_ref_epoch: f64) -> f64 {
        let (_, tanom) = self.anomalies(epoch, mtot, tau_ref_epoch);
        let semi_amplitude = TAU * self.sma * self.inc.sin()
            / (self.period(mtot) * f64::sqrt(1.0 - self.ecc.powi(2)))
            * AU_PER_YEAR_KM_S;
        semi_amplitude * (f64::cos(self.aop + tanom) + self.ecc * self.aop.cos())
    }
}

#[inline]
pub fn default_tau_ref_epoch() -> f64 {
    50000.0
}

/// Two-body Keplerian orbits of every secondary around the primary
///
/// The parameter layout is `[sma, ecc, inc, aop, pan, tau]` for each secondary followed by the
/// parallax (mas) and the total system mass (solar masses). Secondaries are identified by
/// observation object ids `1..=num_bodies`. Mutual perturbations are neglected.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct KeplerianOrbit {
    num_bodies: usize,
    #[serde(default = "default_tau_ref_epoch")]
    tau_ref_epoch: f64,
}

impl KeplerianOrbit {
    pub fn new(num_bodies: usize, tau_ref_epoch: f64) -> Self {
        Self {
            num_bodies,
            tau_ref_epoch,
        }
    }

    pub fn num_bodies(&self) -> usize {
        self.num_bodies
    }

    /// Reference epoch of `tau`, MJD
    pub fn tau_ref_epoch(&self) -> f64 {
        self.tau_ref_epoch
    }

    pub fn plx_index(&self) -> usize {
        ELEMENTS_PER_BODY * self.num_bodies
    }

    pub fn mtot_index(&self) -> usize {
        self.plx_index() + 1
    }

    /// Elements of the body with the given object id, `None` for the primary and unknown ids
    pub fn elements(&self, params: ArrayView1<f64>, object: u32) -> Option<OrbitalElements> {
        let object = object as usize;
        if object == 0 || object > self.num_bodies {
            return None;
        }
        let first = ELEMENTS_PER_BODY * (object - 1);
        Some(OrbitalElements::from_slice(
            params.slice(s![first..first + ELEMENTS_PER_BODY]),
        ))
    }

    fn predict_candidate(
        &self,
        params: ArrayView1<f64>,
        observations: &ObservationSet,
        mut model: ArrayViewMut2<f64>,
    ) {
        let plx = params[self.plx_index()];
        let mtot = params[self.mtot_index()];
        let rows = observations
            .epochs()
            .into_iter()
            .zip(observations.objects())
            .zip(observations.quantity_types());
        for (((&epoch, &object), &quantity_type), mut prediction) in
            rows.zip(model.axis_iter_mut(Axis(0)))
        {
            let Some(elements) = self.elements(params, object) else {
                continue;
            };
            let (first, second) = match quantity_type {
                QuantityType::RaDec => elements.radec(epoch, plx, mtot, self.tau_ref_epoch),
                QuantityType::SepPa => elements.seppa(epoch, plx, mtot, self.tau_ref_epoch),
                QuantityType::Rv => (
                    elements.relative_rv(epoch, mtot, self.tau_ref_epoch),
                    f64::NAN,
                ),
            };
            prediction[0] = first;
            prediction[1] = second;
        }
    }
}

impl OrbitModel for KeplerianOrbit {
    fn n_params(&self) -> usize {
        ELEMENTS_PER_BODY * self.num_bodies + 2
    }

    fn predict(
        &self,
        params: ArrayView2<f64>,
        observations: &ObservationSet,
    ) -> Result<Array3<f64>, ShapeError> {
        if params.ncols() != self.n_params() {
            return Err(ShapeError::ParameterCount {
                actual: params.ncols(),
                expected: self.n_params(),
            });
        }
        let mut model = Array3::from_elem((observations.n_epochs(), 2, params.nrows()), f64::NAN);
        for (candidate, prediction) in params
            .axis_iter(Axis(0))
            .zip(model.axis_iter_mut(Axis(2)))
        {
            self.predict_candidate(candidate, observations, prediction);
        }
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataRecord;

    use approx::assert_abs_diff_eq;
    use ndarray::{Array1, array};
    use std::f64::consts::{FRAC_PI_2, PI};

    fn face_on_circular() -> Array1<f64> {
        // 1 AU circular face-on orbit around a 1 Msun star 100 pc away, periastron at the
        // reference epoch
        array![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 10.0, 1.0]
    }

    fn observations(epochs: &[f64], quantity_type: QuantityType) -> ObservationSet {
        let records = epochs.iter().map(|&epoch| match quantity_type {
            QuantityType::RaDec => DataRecord::radec(epoch, 1, 0.0, 1.0, 0.0, 1.0),
            QuantityType::SepPa => DataRecord::seppa(epoch, 1, 0.0, 1.0, 0.0, 1.0),
            QuantityType::Rv => DataRecord::rv(epoch, 1, 0.0, 1.0),
        });
        ObservationSet::new(records).unwrap()
    }

    #[test]
    fn circular_face_on_positions() {
        let orbit = KeplerianOrbit::new(1, 50000.0);
        let quarter = 0.25 * DAYS_PER_YEAR;
        let obs = observations(&[50000.0, 50000.0 + quarter], QuantityType::RaDec);
        let params = face_on_circular().insert_axis(Axis(0));
        let model = orbit.predict(params.view(), &obs).unwrap();
        assert_eq!(model.dim(), (2, 2, 1));
        // Starts north of the primary
        assert_abs_diff_eq!(model[[0, 0, 0]], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(model[[0, 1, 0]], 10.0, epsilon = 1e-9);
        // Moves east a quarter period later
        assert_abs_diff_eq!(model[[1, 0, 0]], 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(model[[1, 1, 0]], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn seppa_matches_radec() {
        let orbit = KeplerianOrbit::new(1, 50000.0);
        let elements = OrbitalElements {
            sma: 9.66,
            ecc: 0.08,
            inc: 88.81_f64.to_radians(),
            aop: 205.8_f64.to_radians(),
            pan: 31.76_f64.to_radians(),
            tau: 0.73,
        };
        for epoch in [50100.0, 53000.0, 57000.0] {
            let (ra, dec) = elements.radec(epoch, 51.44, 1.8, orbit.tau_ref_epoch());
            let (sep, pa) = elements.seppa(epoch, 51.44, 1.8, orbit.tau_ref_epoch());
            assert_abs_diff_eq!(sep * pa.sin(), ra, epsilon = 1e-9);
            assert_abs_diff_eq!(sep * pa.cos(), dec, epsilon = 1e-9);
            assert!((0.0..TAU).contains(&pa));
            // Separation never exceeds apastron
            assert!(sep <= 9.66 * 1.08 * 51.44);
        }
    }

    #[test]
    fn period_follows_third_law() {
        let elements = OrbitalElements {
            sma: 4.0,
            ecc: 0.3,
            inc: 1.0,
            aop: 2.0,
            pan: 3.0,
            tau: 0.4,
        };
        assert_abs_diff_eq!(elements.period(1.0), 8.0, epsilon = 1e-12);
        let epoch = 51234.5;
        let later = epoch + 8.0 * DAYS_PER_YEAR;
        let (ra0, dec0) = elements.radec(epoch, 10.0, 1.0, 50000.0);
        let (ra1, dec1) = elements.radec(later, 10.0, 1.0, 50000.0);
        assert_abs_diff_eq!(ra0, ra1, epsilon = 1e-8);
        assert_abs_diff_eq!(dec0, dec1, epsilon = 1e-8);
    }

    #[test]
    fn edge_on_circular_rv() {
        // Earth-like orbit seen edge-on, orbital speed is 2 pi AU/yr
        let elements = OrbitalElements {
            sma: 1.0,
            ecc: 0.0,
            inc: FRAC_PI_2,
            aop: 0.0,
            pan: 0.0,
            tau: 0.0,
        };
        let rv = elements.relative_rv(50000.0, 1.0, 50000.0);
        assert_abs_diff_eq!(rv, TAU * AU_PER_YEAR_KM_S, epsilon = 1e-9);
        let half_period = 0.5 * DAYS_PER_YEAR;
        let rv = elements.relative_rv(50000.0 + half_period, 1.0, 50000.0);
        assert_abs_diff_eq!(rv, -TAU * AU_PER_YEAR_KM_S, epsilon = 1e-9);
    }

    #[test]
    fn rv_second_component_is_nan() {
        let orbit = KeplerianOrbit::new(1, 50000.0);
        let obs = observations(&[50000.0, 50100.0], QuantityType::Rv);
        let params = face_on_circular().insert_axis(Axis(0));
        let model = orbit.predict(params.view(), &obs).unwrap();
        // face-on orbits have no radial velocity
        assert_abs_diff_eq!(model[[0, 0, 0]], 0.0, epsilon = 1e-12);
        assert!(model[[0, 1, 0]].is_nan());
        assert!(model[[1, 1, 0]].is_nan());
    }

    #[test]
    fn batch_columns_are_independent() {
        let orbit = KeplerianOrbit::new(1, 50000.0);
        let obs = observations(&[50000.0, 50200.0, 50400.0], QuantityType::SepPa);
        let mut params = ndarray::Array2::zeros((3, 8));
        for (i, mut row) in params.axis_iter_mut(Axis(0)).enumerate() {
            row.assign(&array![
                5.0 + i as f64,
                0.1,
                1.0,
                2.0,
                PI / 3.0,
                0.2,
                20.0,
                1.5
            ]);
        }
        let model = orbit.predict(params.view(), &obs).unwrap();
        for (i, row) in params.axis_iter(Axis(0)).enumerate() {
            let single = orbit
                .predict(row.insert_axis(Axis(0)), &obs)
                .unwrap();
            assert_eq!(model.index_axis(Axis(2), i), single.index_axis(Axis(2), 0));
        }
    }

    #[test]
    fn unphysical_parameters_give_nan() {
        let orbit = KeplerianOrbit::new(1, 50000.0);
        let obs = observations(&[50000.0], QuantityType::RaDec);
        let params = array![[1.0, 1.5, 0.0, 0.0, 0.0, 0.0, 10.0, 1.0]];
        let model = orbit.predict(params.view(), &obs).unwrap();
        assert!(model.iter().all(|x| x.is_nan()));
    }

    #[test]
    fn wrong_parameter_count() {
        let orbit = KeplerianOrbit::new(2, 50000.0);
        let obs = observations(&[50000.0], QuantityType::RaDec);
        let params = face_on_circular().insert_axis(Axis(0));
        assert_eq!(
            orbit.predict(params.view(), &obs),
            Err(ShapeError::ParameterCount {
                actual: 8,
                expected: 14
            })
        );
    }

    #[test]
    fn primary_epochs_stay_nan() {
        let orbit = KeplerianOrbit::new(1, 50000.0);
        let obs = ObservationSet::new(vec![DataRecord::rv(50000.0, 0, 1.0, 0.1)]).unwrap();
        let params = face_on_circular().insert_axis(Axis(0));
        let model = orbit.predict(params.view(), &obs).unwrap();
        assert!(model.iter().all(|x| x.is_nan()));
    }
}
