#![doc = include_str!("../README.md")]

mod array_stats;

mod data;
pub use data::{
    AngularIndices, DataRecord, ObservationSet, QuantityType, read_formatted_csv,
    read_normalized_csv, write_normalized_csv,
};

mod driver;
pub use driver::{Driver, DriverConfig};

mod error;
pub use error::{
    DriverError, ObservationError, PriorError, ResultsError, SamplerConfigError, SamplerError,
    ShapeError, SystemError,
};

mod float_trait;
pub use float_trait::Float;

mod likelihood;
pub use likelihood::{Likelihood, LikelihoodMode, LnLike, aggregate_chi2};

mod lnlike;
pub use lnlike::{Chi2, ModelBatch, compute_chi2, compute_chi2_dyn};

pub mod orbit;
pub use orbit::{KeplerianOrbit, OrbitModel, OrbitalElements, solve_kepler};

pub mod prior;
pub use prior::{LnPrior, LnPrior1D, LnPrior1DTrait};

mod results;
pub use results::Results;

pub mod sampler;
pub use sampler::{
    McmcSampler, MoveKind, Posterior, RejectionSampler, SamplerAlgorithm, SamplerConfig,
    SamplerKind, SamplerState, SamplerTrait, StopSignal,
};

mod system;
pub use system::{System, SystemConfig};

pub use ndarray;
