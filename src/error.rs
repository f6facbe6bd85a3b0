use thiserror::Error;

pub(crate) type Result<T> = std::result::Result<T, OrbitError>;

#[derive(Debug, Error)]
pub(crate) enum OrbitError {
    #[error("failed to fetch element sets from {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("failed to read element sets: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid element set for {name}: {reason}")]
    InvalidElements { name: String, reason: String },

    #[error("no usable element sets in catalog")]
    EmptyCatalog,

    #[error("satellite not found: {0}")]
    NotFound(String),

    #[error("propagation failed for {name}: {reason}")]
    Propagation { name: String, reason: String },

    #[error("current time unavailable: {0}")]
    Clock(String),

    #[error("render surface unavailable: {0}")]
    Surface(String),

    #[error("clipboard error: {0}")]
    Clipboard(String),
}
