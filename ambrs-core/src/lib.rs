pub mod aerosol;
pub mod config;
pub mod distribution;
pub mod gas;
pub mod input;
pub mod ppe;
pub mod runner;
pub mod scenario;

pub mod errors;

pub use errors::{AmbrsError, AmbrsResult};
