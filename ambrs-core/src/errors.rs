use thiserror::Error;

/// Error type for invalid operations.
#[derive(Error, Debug)]
pub enum AmbrsError {
    /// Structural mismatch between specification, scenario, sweep or ensemble shapes.
    #[error("Shape mismatch: {0}")]
    Shape(String),
    #[error("Distribution '{distribution}' has no inverse CDF, so it cannot be used for Latin hypercube sampling")]
    UnsupportedDistribution { distribution: String },
    #[error("Member index {index} is out of range for an ensemble of {size} members")]
    IndexOutOfRange { index: usize, size: usize },
    #[error("Sampling failed: {0}")]
    Sampling(String),
    #[error("Mass fractions of mode '{mode}' sum to {sum}, expected 1")]
    MassFractions { mode: String, sum: f64 },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience type for `Result<T, AmbrsError>`.
pub type AmbrsResult<T> = Result<T, AmbrsError>;
