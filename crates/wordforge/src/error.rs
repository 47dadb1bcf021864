//! Unified error type for Wordforge.

use wordforge_game::GameError;
use wordforge_oracle::OracleError;
use wordforge_protocol::ProtocolError;
use wordforge_store::StoreError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `wordforge` crate, you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum WordforgeError {
    /// Encoding, decoding, or parsing failed (including config files).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The durable store failed (open, read, write).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The distance oracle refused a word or could not be reached.
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// A game rule refused the operation.
    #[error(transparent)]
    Game(#[from] GameError),
}

#[cfg(test)]
mod tests {
    use wordforge_protocol::{PlayerId, SessionId};

    use super::*;

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidValue("mode `solo`".into());
        let wordforge_err: WordforgeError = err.into();
        assert!(matches!(wordforge_err, WordforgeError::Protocol(_)));
        assert!(wordforge_err.to_string().contains("solo"));
    }

    #[test]
    fn test_from_store_error() {
        let err = StoreError::Unavailable("disk full".into());
        let wordforge_err: WordforgeError = err.into();
        assert!(matches!(wordforge_err, WordforgeError::Store(_)));
    }

    #[test]
    fn test_from_oracle_error() {
        let err = OracleError::Unavailable("timeout".into());
        let wordforge_err: WordforgeError = err.into();
        assert!(matches!(wordforge_err, WordforgeError::Oracle(_)));
    }

    #[test]
    fn test_from_game_error() {
        let err = GameError::AlreadyInSession(PlayerId(1), SessionId(2));
        let wordforge_err: WordforgeError = err.into();
        assert!(matches!(wordforge_err, WordforgeError::Game(_)));
    }
}
