//! Error types for MailReach

use thiserror::Error;

/// Main error type for MailReach
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request never produced an HTTP response
    #[error("Network error: {0}")]
    Transport(String),

    /// The backend answered with a non-2xx status
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        body: Option<serde_json::Value>,
    },

    /// The backend answered 401
    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
        body: Option<serde_json::Value>,
    },

    /// A response envelope matched none of the known collection shapes
    #[error("Unrecognized response shape for '{key}': {shape}")]
    UnrecognizedShape { key: String, shape: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Session storage error: {0}")]
    Session(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for MailReach
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the HTTP status carried by this error, if the backend answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Unauthorized { .. } => Some(401),
            _ => None,
        }
    }

    /// Returns the response body carried by this error, if any
    pub fn response_body(&self) -> Option<&serde_json::Value> {
        match self {
            Error::Api { body, .. } | Error::Unauthorized { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Returns the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "CONFIG_ERROR",
            Error::Transport(_) => "NETWORK_ERROR",
            Error::Api { status, .. } if *status >= 500 => "SERVER_ERROR",
            Error::Api { .. } => "REQUEST_ERROR",
            Error::Unauthorized { .. } => "UNAUTHORIZED",
            Error::UnrecognizedShape { .. } => "UNRECOGNIZED_SHAPE",
            Error::Decode(_) => "DECODE_ERROR",
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::Session(_) => "SESSION_ERROR",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the caller should send the user back to the login flow
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_code() {
        let err = Error::Api {
            status: 422,
            message: "name is required".to_string(),
            body: None,
        };
        assert_eq!(err.status_code(), Some(422));
        assert_eq!(err.code(), "REQUEST_ERROR");
        assert_eq!(err.to_string(), "name is required");

        let err = Error::Api {
            status: 503,
            message: "down".to_string(),
            body: None,
        };
        assert_eq!(err.code(), "SERVER_ERROR");

        let err = Error::Transport("connection refused".to_string());
        assert_eq!(err.status_code(), None);
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_unauthorized() {
        let err = Error::Unauthorized {
            message: "Token expired".to_string(),
            body: Some(serde_json::json!({"detail": "Token expired"})),
        };
        assert!(err.is_unauthorized());
        assert_eq!(err.status_code(), Some(401));
        assert_eq!(err.response_body().unwrap()["detail"], "Token expired");
    }
}
