use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuantityError {
    /// A weight was requested for a unit missing from the conversion table.
    #[error("unknown unit: {0}")]
    UnknownUnit(String),

    #[error("amount must be between 0 and 1e9, got {0}")]
    InvalidAmount(f64),

    #[error("density must be finite and positive, got {0}")]
    InvalidDensity(f64),
}
