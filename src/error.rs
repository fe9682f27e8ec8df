use thiserror::Error;

/// Errors surfaced by the suffix-forest core.
///
/// Trial, commit and rollback are infallible state transitions on
/// already-validated input; everything that can go wrong happens either at
/// the `SuffixForest::build` entry point (malformed CSC, bad parameters) or
/// during CSR assembly (offset overflow).
#[derive(Debug, Error)]
pub enum StafError {
    /// Malformed CSC input or out-of-range parameter.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// An offset or score accumulator would overflow its integer type.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),
    /// An invariant was violated that should be unreachable in correct code.
    #[error("internal invariant violation: {0}")]
    Internal(String),
}
