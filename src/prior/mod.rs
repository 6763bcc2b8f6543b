pub mod ln_prior;
pub use ln_prior::LnPrior;

pub mod ln_prior_1d;
pub use ln_prior_1d::{LnPrior1D, LnPrior1DTrait};
