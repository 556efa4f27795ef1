//! Perturbed-parameter ensembles for aerosol microphysics box models
//!
//! Re-exports the modules of `ambrs-core`.

pub use ambrs_core::{aerosol, config, distribution, errors, gas, input, ppe, runner, scenario};
pub use ambrs_core::{AmbrsError, AmbrsResult};
