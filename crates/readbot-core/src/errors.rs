/// Core error type for readbot.
///
/// Adapter crates map their specific errors into this type so the consumer and
/// processor can apply one failure policy (fatal vs per-update vs user-facing).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    /// Provider/network failure. Fatal when fetching, non-fatal when replying.
    #[error("transport error: {0}")]
    Transport(String),

    /// Backing-store failure other than the expected duplicate no-op.
    #[error("storage error: {0}")]
    Storage(String),

    /// Expected outcome (empty list, missing row). Rendered as a normal reply.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
