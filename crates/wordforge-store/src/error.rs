use wordforge_protocol::ProtocolError;

/// Errors that can occur in the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database rejected a statement or could not be opened.
    #[cfg(feature = "sqlite")]
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A structured column could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] ProtocolError),

    /// A row was read back but does not describe a valid record.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// Creating the database directory failed.
    #[error("io error: {0}")]
    Io(#[source] std::io::Error),

    /// The blocking storage task panicked or was cancelled.
    #[error("storage task failed: {0}")]
    Task(String),

    /// The backend is temporarily unreachable.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
