use thiserror::Error;

/// Token storage failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read token from {location}: {source}")]
    Read {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write token to {location}: {source}")]
    Write {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to clear token at {location}: {source}")]
    Clear {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("token store lock poisoned")]
    Poisoned,
}

/// Session transition failure.
///
/// Decoding problems never surface here; an undecodable token simply
/// yields a signed-out snapshot.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("refusing to log in with a blank token")]
    BlankToken,

    #[error(transparent)]
    Store(#[from] StoreError),
}
