use std::fmt;

use serde::Deserialize;

/// Core error type for affiliate-program operations.
///
/// Local failures (`Validation`, `Eligibility`, `Access`) are produced before
/// anything is dispatched. `Protocol` and `Remote` only ever come back from a
/// query adapter after its request went out.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Eligibility(String),

    #[error("{0}")]
    Access(String),

    #[error("{0}")]
    NotFound(String),

    /// The response shape did not match what the request promises.
    #[error("{0}")]
    Protocol(String),

    #[error("remote error: {0}")]
    Remote(RemoteError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    pub fn invalid_response() -> Self {
        Error::Protocol("Receive invalid response".to_string())
    }

    /// Numeric status in the remote service's convention.
    pub fn code(&self) -> i32 {
        match self {
            Error::Validation(_)
            | Error::Eligibility(_)
            | Error::Access(_)
            | Error::NotFound(_) => 400,
            Error::Remote(e) => e.code,
            Error::Protocol(_)
            | Error::Config(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::External(_) => 500,
        }
    }
}

/// Error status returned by the remote service or the transport.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RemoteError {
    pub code: i32,
    pub message: String,
}

impl RemoteError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<RemoteError> for Error {
    fn from(e: RemoteError) -> Self {
        Error::Remote(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_remote_convention() {
        assert_eq!(Error::Validation("x".into()).code(), 400);
        assert_eq!(Error::NotFound("Chat not found".into()).code(), 400);
        assert_eq!(Error::invalid_response().code(), 500);
        assert_eq!(Error::from(RemoteError::new(403, "CHAT_ADMIN_REQUIRED")).code(), 403);
    }

    #[test]
    fn user_facing_messages_are_unprefixed() {
        assert_eq!(
            Error::Validation("Limit must be positive".into()).to_string(),
            "Limit must be positive"
        );
        assert_eq!(
            Error::from(RemoteError::new(400, "BOT_INVALID")).to_string(),
            "remote error: [400] BOT_INVALID"
        );
    }
}
