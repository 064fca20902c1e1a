use thiserror::Error;

/// Stable classification of every failure the core can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthenticated,
    Forbidden,
    NotFound,
    Conflict,
    InvalidInput,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::InvalidInput => "invalid_input",
            Self::Internal => "internal",
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid API key")]
    InvalidCredential,

    #[error("forbidden")]
    Forbidden,

    #[error("insufficient permissions: {0} required")]
    MissingCapability(&'static str),

    #[error("access denied: path escapes bucket root")]
    PathTraversal,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("upload exceeds maximum size of {limit} bytes")]
    TooLarge { limit: u64 },
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCredential => ErrorKind::Unauthenticated,
            Self::Forbidden | Self::MissingCapability(_) | Self::PathTraversal => {
                ErrorKind::Forbidden
            }
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::BadRequest(_) | Self::TooLarge { .. } => ErrorKind::InvalidInput,
            Self::Database(_) | Self::Io(_) | Self::Config(_) => ErrorKind::Internal,
        }
    }

    /// Maps an I/O error to `NotFound` when the entry is missing.
    pub(crate) fn from_io(e: std::io::Error, what: &'static str) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(what)
        } else {
            Self::Io(e)
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
