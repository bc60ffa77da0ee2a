#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid bounds: low {low} must be finite and not greater than high {high}")]
    InvalidBounds { low: f64, high: f64 },

    #[error("Duplicate target name: {0}")]
    DuplicateTarget(String),

    #[error("Invalid PV name: {0}")]
    InvalidPvName(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(String),
}
