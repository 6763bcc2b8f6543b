use crate::data::QuantityType;

/// Error returned when arrays handed to the residual engine don't line up
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum ShapeError {
    #[error("data must have exactly 2 components per epoch, got {actual}")]
    ComponentCount { actual: usize },

    #[error("errors shape {errors:?} differs from data shape {data:?}")]
    ErrorsShape {
        data: (usize, usize),
        errors: (usize, usize),
    },

    #[error("model shape {model:?} is incompatible with data shape {data:?}")]
    ModelShape {
        data: (usize, usize),
        model: Vec<usize>,
    },

    #[error("model must be 2- or 3-dimensional, got {ndim} dimensions")]
    ModelRank { ndim: usize },

    #[error("angular index {index} is out of bounds for {epochs} epochs")]
    AngularIndexOutOfBounds { index: usize, epochs: usize },

    #[error("parameter array has {actual} columns, the orbit model requires {expected}")]
    ParameterCount { actual: usize, expected: usize },
}

/// Error returned while building an [ObservationSet](crate::ObservationSet)
#[derive(Debug, thiserror::Error)]
pub enum ObservationError {
    #[error("observation table is empty")]
    Empty,

    #[error(
        "invalid error value {value} for component {component} of epoch {epoch}, errors must be positive and finite"
    )]
    InvalidErrorValue {
        epoch: usize,
        component: usize,
        value: f64,
    },

    #[error("non-finite measurement {value} for component {component} of epoch {epoch}")]
    NonFiniteValue {
        epoch: usize,
        component: usize,
        value: f64,
    },

    #[error("{quantity_type} measurement of epoch {epoch} is missing its second component")]
    MissingSecondComponent {
        epoch: usize,
        quantity_type: QuantityType,
    },

    #[error("rv measurement of epoch {epoch} must not carry a second component")]
    UnexpectedSecondComponent { epoch: usize },

    #[error("unknown quantity type {0:?}, expected one of \"radec\", \"seppa\", \"rv\"")]
    UnknownQuantityType(String),

    #[error("row {row} has no {column} entry")]
    MissingColumn { row: usize, column: &'static str },

    #[error("row {row} has an invalid object id {object}, object ids must be non-negative integers")]
    InvalidObjectId { row: usize, object: i64 },

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Error returned when a sampler or likelihood is configured with unsupported options
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum SamplerConfigError {
    #[error("unknown sampler {0:?}, expected one of {1:?}")]
    UnknownSampler(String, Vec<&'static str>),

    #[error("unknown likelihood {0:?}, expected one of {1:?}")]
    UnknownLikelihood(String, Vec<&'static str>),

    #[error("unknown proposal move {0:?}, expected one of {1:?}")]
    UnknownMove(String, Vec<&'static str>),

    #[error("number of walkers must be even and at least {minimum}, got {actual}")]
    WalkerCount { actual: usize, minimum: usize },

    #[error("number of temperatures must be positive")]
    ZeroTemperatures,

    #[error("{0} must be positive")]
    NonPositive(&'static str),

    #[error("stretch move scale must be larger than 1, got {0}")]
    StretchScale(String),

    #[error("prior of parameter {label} is improper and cannot be sampled")]
    ImproperPrior { label: String },
}

/// Error returned when a prior is built from invalid parameters
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum PriorError {
    #[error("{0} must not be NaN")]
    NotANumber(&'static str),

    #[error("{name} must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: String },

    #[error("prior range [{left}, {right}] must be finite and non-empty")]
    InvalidRange { left: String, right: String },

    #[error("mixture prior must have at least one component")]
    EmptyMix,
}

/// Error returned while building a [System](crate::System)
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum SystemError {
    #[error("number of secondary bodies must be at least 1")]
    NoSecondaryBodies,

    #[error("epoch {epoch} refers to object {object}, but the system has {num_bodies} secondary bodies")]
    UnknownObject {
        epoch: usize,
        object: u32,
        num_bodies: usize,
    },

    #[error("epoch {epoch} is {quantity_type} astrometry of the primary, only secondaries can be fit")]
    PrimaryAstrometry {
        epoch: usize,
        quantity_type: QuantityType,
    },

    #[error("epoch {epoch} is an rv of the primary, which requires body masses that are not fit")]
    PrimaryRv { epoch: usize },

    #[error("{actual} priors were given for {expected} parameters")]
    PriorCount { actual: usize, expected: usize },

    #[error("{0} must be positive and finite")]
    NonPositive(&'static str),

    #[error("{0} must be non-negative and finite")]
    Negative(&'static str),

    #[error("{0} must be finite")]
    NonFinite(&'static str),
}

/// Error returned from [Results::add_samples](crate::Results::add_samples)
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum ResultsError {
    #[error("samples have {actual} parameters, results store {expected}")]
    ParameterCount { actual: usize, expected: usize },

    #[error("{samples} samples were given with {ln_likes} log-likelihoods")]
    LnLikeCount { samples: usize, ln_likes: usize },

    #[error("log-likelihoods must be given for all samples or for none of them")]
    LnLikePresence,
}

/// Fatal error of a sampler run
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum SamplerError {
    #[error(transparent)]
    Shape(#[from] ShapeError),

    #[error(transparent)]
    Config(#[from] SamplerConfigError),

    #[error(transparent)]
    Results(#[from] ResultsError),

    #[error("cannot build worker thread pool: {0}")]
    ThreadPool(String),
}

/// Any error returned by the [Driver](crate::Driver)
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error(transparent)]
    Observation(#[from] ObservationError),

    #[error(transparent)]
    System(#[from] SystemError),

    #[error(transparent)]
    SamplerConfig(#[from] SamplerConfigError),

    #[error(transparent)]
    Sampler(#[from] SamplerError),
}
