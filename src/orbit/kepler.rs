use std::f64::consts::{PI, TAU};

const MAX_ITERATIONS: usize = 50;
const TOLERANCE: f64 = 1e-12;

/// Solve Kepler's equation `E - e sin(E) = M` for the eccentric anomaly
///
/// Newton iterations starting from `M` for moderate eccentricities and from `pi` for highly
/// eccentric orbits. `mean_anomaly` may be any finite value, the result is in `[0, 2pi)`.
/// Returns NaN if `ecc` is outside of `[0, 1)` or the input is not finite.
pub fn solve_kepler(mean_anomaly: f64, ecc: f64) -> f64 {
    if !(0.0..1.0).contains(&ecc) || !mean_anomaly.is_finite() {
        return f64::NAN;
    }
    let mean_anomaly = mean_anomaly.rem_euclid(TAU);
    if ecc == 0.0 {
        return mean_anomaly;
    }
    let mut eanom = if ecc < 0.8 { mean_anomaly } else { PI };
    for _ in 0..MAX_ITERATIONS {
        let step = (eanom - ecc * eanom.sin() - mean_anomaly) / (1.0 - ecc * eanom.cos());
        eanom -= step;
        if step.abs() < TOLERANCE {
            break;
        }
    }
    eanom.rem_euclid(TAU)
}

/// True anomaly from the eccentric anomaly
pub fn true_anomaly(eanom: f64, ecc: f64) -> f64 {
    2.0 * f64::atan2(
        f64::sqrt(1.0 + ecc) * f64::sin(0.5 * eanom),
        f64::sqrt(1.0 - ecc) * f64::cos(0.5 * eanom),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use rand::prelude::*;

    #[test]
    fn solves_equation() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..10_000 {
            let mean_anomaly = rng.random_range(-20.0..20.0);
            let ecc = rng.random_range(0.0..0.999);
            let eanom = solve_kepler(mean_anomaly, ecc);
            let residual = (eanom - ecc * eanom.sin() - mean_anomaly.rem_euclid(TAU)).sin();
            assert_abs_diff_eq!(residual, 0.0, epsilon = 1e-9);
            assert!((0.0..TAU).contains(&eanom));
        }
    }

    #[test]
    fn circular_orbit() {
        assert_eq!(solve_kepler(1.25, 0.0), 1.25);
        assert_abs_diff_eq!(true_anomaly(1.25, 0.0), 1.25, epsilon = 1e-15);
    }

    #[test]
    fn known_value() {
        // Textbook example: M = 27 deg, e = 0.5
        let eanom = solve_kepler(27.0_f64.to_radians(), 0.5);
        assert_abs_diff_eq!(eanom.to_degrees(), 48.43417991, epsilon = 1e-6);
    }

    #[test]
    fn invalid_eccentricity() {
        assert!(solve_kepler(1.0, 1.0).is_nan());
        assert!(solve_kepler(1.0, -0.1).is_nan());
        assert!(solve_kepler(f64::NAN, 0.1).is_nan());
    }

    #[test]
    fn true_anomaly_at_apsides() {
        assert_abs_diff_eq!(true_anomaly(0.0, 0.7), 0.0);
        assert_abs_diff_eq!(true_anomaly(PI, 0.7).abs(), PI, epsilon = 1e-12);
    }
}
