pub use orbit_data::{ORBIT_FIXTURES, OrbitFixture, OrbitTruth, orbit_fixture};
pub use simulate::{Error, simulate_csv};

mod orbit_data;
mod simulate;
