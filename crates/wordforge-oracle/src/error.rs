//! Error types for the oracle layer.

/// Errors reported by a [`DistanceOracle`](crate::DistanceOracle).
///
/// The two variants are treated very differently by the cache:
/// a rejection is a property of the word and is cached forever, an
/// outage is a property of the moment and is never cached.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// The oracle refused the word (not in its vocabulary, too short, ...).
    #[error("word rejected: {0}")]
    Rejected(String),

    /// The oracle could not be reached or answered with garbage.
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
}
