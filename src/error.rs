use thiserror::Error;

/// Error type used by all fallible operations in this crate.
///
/// Validation failures are detected eagerly, before any clustering work
/// starts, and are never retried internally. An oversized `k` (`k > N`) is
/// *not* an error; it triggers the documented singleton-cluster policy
/// instead.
#[derive(Debug, Error)]
pub enum KMeansError {
    /// The configuration violates a precondition (e.g. `k == 0`, a
    /// delta-threshold outside `[0, 1]`, or seed centroids whose count or
    /// dimensionality does not match).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The sample data violates a precondition (ragged vectors, NaN
    /// components). The message names the offending point.
    #[error("invalid sample data: {0}")]
    InvalidData(String),
    /// The external termination flag was observed between phases. No partial
    /// result is produced.
    #[error("calculation was cancelled")]
    Cancelled,
}

/// Convenient alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, KMeansError>;
