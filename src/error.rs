use thiserror::Error;

/// Failure reported by a storage port
#[derive(Debug, Error)]
pub enum StoreError {
    /// The write would break a unique index; carries the index name
    #[error("unique constraint violated: {0}")]
    UniqueViolation(&'static str),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Error returned by every voting operation
#[derive(Debug, Error)]
pub enum VoteError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    LimitExceeded(String),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    InvalidState,
    Forbidden,
    Conflict,
    LimitExceeded,
    Storage,
}

impl ErrorKind {
    /// Status code the API layer answers with for this kind
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::InvalidInput | ErrorKind::InvalidState | ErrorKind::LimitExceeded => 400,
            ErrorKind::Forbidden => 403,
            ErrorKind::Conflict => 409,
            ErrorKind::Storage => 500,
        }
    }
}

impl VoteError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VoteError::NotFound(_) => ErrorKind::NotFound,
            VoteError::InvalidInput(_) => ErrorKind::InvalidInput,
            VoteError::InvalidState(_) => ErrorKind::InvalidState,
            VoteError::Forbidden(_) => ErrorKind::Forbidden,
            VoteError::Conflict(_) => ErrorKind::Conflict,
            VoteError::LimitExceeded(_) => ErrorKind::LimitExceeded,
            VoteError::Storage(_) => ErrorKind::Storage,
        }
    }

    pub(crate) fn not_found(msg: impl Into<String>) -> Self {
        VoteError::NotFound(msg.into())
    }

    pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
        VoteError::InvalidInput(msg.into())
    }

    pub(crate) fn invalid_state(msg: impl Into<String>) -> Self {
        VoteError::InvalidState(msg.into())
    }

    pub(crate) fn forbidden(msg: impl Into<String>) -> Self {
        VoteError::Forbidden(msg.into())
    }

    pub(crate) fn conflict(msg: impl Into<String>) -> Self {
        VoteError::Conflict(msg.into())
    }
}
