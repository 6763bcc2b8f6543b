use crate::simulate::Error;

use include_dir::{Dir, include_dir};
use lazy_static::lazy_static;
use serde::Deserialize;

static ORBITS_DIR: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/../test-data/orbits");

/// Parameters a fixture was simulated from
///
/// Observations are generated for a single secondary, object 1, with reference epoch MJD 50000.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitTruth {
    pub sma: f64,
    pub ecc: f64,
    pub inc: f64,
    pub aop: f64,
    pub pan: f64,
    pub tau: f64,
    pub plx: f64,
    pub mtot: f64,
}

impl OrbitTruth {
    /// `[sma1, ecc1, inc1, aop1, pan1, tau1, plx, mtot]`
    pub fn params(&self) -> [f64; 8] {
        [
            self.sma, self.ecc, self.inc, self.aop, self.pan, self.tau, self.plx, self.mtot,
        ]
    }
}

#[derive(Deserialize)]
struct TruthRecord {
    name: String,
    sma: f64,
    ecc: f64,
    inc: f64,
    aop: f64,
    pan: f64,
    tau: f64,
    plx: f64,
    mtot: f64,
}

impl TruthRecord {
    fn into_name_truth(self) -> (String, OrbitTruth) {
        let truth = OrbitTruth {
            sma: self.sma,
            ecc: self.ecc,
            inc: self.inc,
            aop: self.aop,
            pan: self.pan,
            tau: self.tau,
            plx: self.plx,
            mtot: self.mtot,
        };
        (self.name, truth)
    }
}

/// Observation table in the CSV format of `orbitfit::read_formatted_csv`
///
/// Crate types are not used here, because unit tests of the main crate would see them as
/// different types.
#[derive(Clone, Debug)]
pub struct OrbitFixture {
    pub name: String,
    pub csv: &'static str,
    pub truth: OrbitTruth,
}

fn load_fixtures() -> Result<Vec<OrbitFixture>, Error> {
    let truth_file = ORBITS_DIR
        .get_file("truth.csv")
        .ok_or_else(|| Error::MissingFile("truth.csv".to_owned()))?;
    let mut reader = csv::Reader::from_reader(truth_file.contents());
    reader
        .deserialize()
        .map(|record| -> Result<OrbitFixture, Error> {
            let (name, truth) = record.map(TruthRecord::into_name_truth)?;
            let file_name = format!("{name}.csv");
            let csv = ORBITS_DIR
                .get_file(&file_name)
                .and_then(|file| file.contents_utf8())
                .ok_or(Error::MissingFile(file_name))?;
            Ok(OrbitFixture { name, csv, truth })
        })
        .collect()
}

lazy_static! {
    pub static ref ORBIT_FIXTURES: Vec<OrbitFixture> = load_fixtures().unwrap();
}

/// # Panics
///
/// Panics if there is no fixture with this name
pub fn orbit_fixture(name: &str) -> &'static OrbitFixture {
    ORBIT_FIXTURES
        .iter()
        .find(|fixture| fixture.name == name)
        .unwrap_or_else(|| panic!("no orbit fixture named {name:?}"))
}
