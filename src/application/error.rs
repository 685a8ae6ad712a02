use folio_api_types::ErrorBody;
use thiserror::Error;

use crate::{application::session::StoreError, domain::error::DomainError, infra::error::InfraError};

/// Failure talking to the posts API.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("server responded with status {status}")]
    Status { status: u16, body: String },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable message carried by the error body, when the server sent one.
    pub fn server_message(&self) -> Option<String> {
        let Self::Status { body, .. } = self else {
            return None;
        };
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        parsed.message.or_else(|| match parsed.error? {
            serde_json::Value::String(s) => Some(s),
            _ => None,
        })
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error("{message}")]
    Request {
        message: String,
        #[source]
        source: FetchError,
    },
    /// A listing view that could not be shown; carries the banner text.
    #[error("{0}")]
    Listing(String),
    #[error("not signed in (run `folio login` first)")]
    Unauthenticated,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn request(message: impl Into<String>, source: FetchError) -> Self {
        Self::Request {
            message: message.into(),
            source,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    pub fn fetch_source(&self) -> Option<&FetchError> {
        match self {
            Self::Request { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_prefers_message_then_error_string() {
        let err = FetchError::status(401, r#"{"message":"bad credentials"}"#);
        assert_eq!(err.server_message().as_deref(), Some("bad credentials"));

        let err = FetchError::status(401, r#"{"error":"invalid token"}"#);
        assert_eq!(err.server_message().as_deref(), Some("invalid token"));

        let err = FetchError::status(500, r#"{"error":{"DatabaseError":"x"}}"#);
        assert_eq!(err.server_message(), None);

        assert_eq!(FetchError::transport("reset").server_message(), None);
    }

    #[test]
    fn request_error_displays_public_message() {
        let err = AppError::request("Failed to save post", FetchError::status(403, ""));
        assert_eq!(err.to_string(), "Failed to save post");
        assert_eq!(err.fetch_source().and_then(FetchError::status_code), Some(403));
    }
}
