use crate::orbit_data::OrbitTruth;

use orbitfit::OrbitalElements;
use orbitfit::orbit::default_tau_ref_epoch;
use rand::Rng;
use rand_distr::StandardNormal;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("fixture file {0} is missing or is not UTF-8")]
    MissingFile(String),

    #[error("cannot finish the CSV table: {0}")]
    Buffer(String),
}

/// Simulate RA/Dec observations of object 1 with Gaussian noise, returns CSV text
///
/// `error` is the uncertainty of both offsets in mas, it is also the noise amplitude.
pub fn simulate_csv<R: Rng>(
    truth: &OrbitTruth,
    epochs: &[f64],
    error: f64,
    rng: &mut R,
) -> Result<String, Error> {
    let elements = OrbitalElements {
        sma: truth.sma,
        ecc: truth.ecc,
        inc: truth.inc,
        aop: truth.aop,
        pan: truth.pan,
        tau: truth.tau,
    };
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["epoch", "object", "raoff", "raoff_err", "decoff", "decoff_err"])?;
    for &epoch in epochs {
        let (raoff, decoff) = elements.radec(epoch, truth.plx, truth.mtot, default_tau_ref_epoch());
        let noise: [f64; 2] = [rng.sample(StandardNormal), rng.sample(StandardNormal)];
        writer.write_record([
            epoch.to_string(),
            "1".to_owned(),
            (raoff + error * noise[0]).to_string(),
            error.to_string(),
            (decoff + error * noise[1]).to_string(),
            error.to_string(),
        ])?;
    }
    let buffer = writer
        .into_inner()
        .map_err(|err| Error::Buffer(err.to_string()))?;
    String::from_utf8(buffer).map_err(|err| Error::Buffer(err.to_string()))
}
