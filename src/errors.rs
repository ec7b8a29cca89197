use axum::http::StatusCode;
use thiserror::Error;

/// CollaboratorError
///
/// Error taxonomy for every outbound BaaS call (identity, row store, file
/// storage). The variants matter because the callers treat them differently:
/// authentication failures become redirects, not-found becomes a null result,
/// and everything else is logged and converted to a generic response.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// The session secret was absent, expired, or anonymous. The access gate
    /// treats this as "not authenticated" and fails closed.
    #[error("authentication rejected by the identity collaborator")]
    Unauthenticated,

    /// The named row, file, or collection does not exist.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The call exceeded the configured collaborator timeout.
    #[error("collaborator call timed out")]
    Timeout,

    /// Network-level failure (DNS, connect, TLS, reset).
    #[error("collaborator transport failure: {0}")]
    Transport(String),

    /// The collaborator answered, but the payload did not deserialize into
    /// the expected shape.
    #[error("unexpected collaborator payload: {0}")]
    Payload(String),
}

impl CollaboratorError {
    /// classify_status
    ///
    /// Maps a non-success HTTP status from the BaaS onto the taxonomy.
    pub fn classify_status(status: StatusCode, context: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthenticated,
            StatusCode::NOT_FOUND => Self::NotFound(context.to_string()),
            other => Self::Transport(format!("{context}: upstream returned {other}")),
        }
    }
}

impl From<reqwest::Error> for CollaboratorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Payload(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
