//! Vault error types using thiserror 2.0.
//!
//! Every non-2xx response is classified into exactly one variant here, so
//! callers can match on the kind of failure rather than on status codes or
//! message text.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Service specific reason attached to a 400 response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidDataCode {
    /// A secret or auth engine is already mounted at the requested path.
    MountAlreadyExists,
    /// A check-and-set save supplied a version that does not match.
    CheckAndSetMismatch,
    /// The mount requires check-and-set but no version was supplied.
    CheckAndSetRequired,
    /// Any other invalid request.
    Unclassified,
}

impl InvalidDataCode {
    /// Derive the code from the `errors` strings of a 400 body.
    #[must_use]
    pub fn from_messages(errors: &[String]) -> Self {
        let matches = |needle: &str| errors.iter().any(|e| e.contains(needle));

        if matches("path is already in use") {
            Self::MountAlreadyExists
        } else if matches("check-and-set parameter did not match") {
            Self::CheckAndSetMismatch
        } else if matches("check-and-set parameter required") {
            Self::CheckAndSetRequired
        } else {
            Self::Unclassified
        }
    }
}

/// Vault client errors.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Backend reported 404
    #[error("Object not found at path: {path}")]
    NotFound {
        /// Requested path
        path: String,
    },

    /// Backend reported 403
    #[error("Permission denied at path {path}: {}", errors.join("; "))]
    Forbidden {
        /// Requested path
        path: String,
        /// Messages from the error envelope
        errors: Vec<String>,
    },

    /// Backend reported 400
    #[error("Invalid data sent to {path} ({code:?}): {}", errors.join("; "))]
    InvalidData {
        /// Requested path
        path: String,
        /// Service specific reason
        code: InvalidDataCode,
        /// Messages from the error envelope
        errors: Vec<String>,
    },

    /// Response body could not be read as the expected JSON shape
    #[error("Failed to parse {context}: {source}")]
    Parse {
        /// What was being parsed
        context: String,
        /// Underlying decoder error
        #[source]
        source: serde_json::Error,
    },

    /// Any other non-2xx status
    #[error("Vault returned status {status} for {path}: {body}")]
    Backend {
        /// Requested path
        path: String,
        /// Raw HTTP status
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The request did not complete within the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The request never produced an HTTP status (connect, TLS, DNS)
    #[error("Vault unavailable: {0}")]
    Transport(String),

    /// A member the caller requires is absent from the envelope
    #[error("Response from {path} has no `{member}` member")]
    MissingData {
        /// Requested path
        path: String,
        /// Missing envelope member
        member: String,
    },

    /// Caller supplied arguments that cannot be combined
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An operation needed the active token but none is set
    #[error("No active token in session")]
    NoActiveToken,

    /// HTTP client construction error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type for Vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    errors: Vec<String>,
}

/// Classify a non-2xx response into a [`VaultError`].
///
/// Total over all statuses. A 400 or 403 is only given its own kind when
/// the body is an `{"errors": [...]}` envelope; any other body, such as an
/// HTML page from a proxy, falls back to [`VaultError::Backend`] with the
/// raw status and text.
#[must_use]
pub fn classify(status: StatusCode, path: &str, body: &str) -> VaultError {
    let envelope = serde_json::from_str::<ErrorBody>(body).ok();

    match (status, envelope) {
        (StatusCode::NOT_FOUND, _) => VaultError::not_found(path),
        (StatusCode::FORBIDDEN, Some(ErrorBody { errors })) => VaultError::Forbidden {
            path: path.to_string(),
            errors,
        },
        (StatusCode::BAD_REQUEST, Some(ErrorBody { errors })) => VaultError::InvalidData {
            path: path.to_string(),
            code: InvalidDataCode::from_messages(&errors),
            errors,
        },
        _ => VaultError::Backend {
            path: path.to_string(),
            status: status.as_u16(),
            body: body.to_string(),
        },
    }
}

impl VaultError {
    /// Check if error is retryable.
    ///
    /// This crate never retries; the flag is for callers that do.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Transport(_) => true,
            Self::Backend { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Whether the backend reported that the object does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether the backend refused the caller's token.
    #[must_use]
    pub const fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden { .. })
    }

    /// The service specific code of a 400 response, if this is one.
    #[must_use]
    pub const fn invalid_data_code(&self) -> Option<InvalidDataCode> {
        match self {
            Self::InvalidData { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create an invalid argument error.
    #[must_use]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a parse error.
    #[must_use]
    pub fn parse(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Parse {
            context: context.into(),
            source,
        }
    }

    /// Create a missing data error.
    #[must_use]
    pub fn missing_data(path: impl Into<String>, member: impl Into<String>) -> Self {
        Self::MissingData {
            path: path.into(),
            member: member.into(),
        }
    }

    /// Map a send failure from reqwest onto a transport level variant.
    #[must_use]
    pub fn from_send(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VaultError::not_found("secret/app");
        assert_eq!(err.to_string(), "Object not found at path: secret/app");
    }

    #[test]
    fn test_classify_not_found() {
        let err = classify(StatusCode::NOT_FOUND, "secret/app", r#"{"errors":[]}"#);
        assert!(err.is_not_found());
    }

    #[test]
    fn test_classify_forbidden_keeps_messages() {
        let err = classify(StatusCode::FORBIDDEN, "sys/mounts", r#"{"errors":["permission denied"]}"#);
        match err {
            VaultError::Forbidden { path, errors } => {
                assert_eq!(path, "sys/mounts");
                assert_eq!(errors, vec!["permission denied".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_classify_mount_exists() {
        let body = r#"{"errors":["path is already in use at transit/"]}"#;
        let err = classify(StatusCode::BAD_REQUEST, "sys/mounts/transit", body);
        assert_eq!(err.invalid_data_code(), Some(InvalidDataCode::MountAlreadyExists));
    }

    #[test]
    fn test_classify_cas_codes() {
        let mismatch = classify(
            StatusCode::BAD_REQUEST,
            "secret/data/app",
            r#"{"errors":["check-and-set parameter did not match the current version"]}"#,
        );
        assert_eq!(mismatch.invalid_data_code(), Some(InvalidDataCode::CheckAndSetMismatch));

        let required = classify(
            StatusCode::BAD_REQUEST,
            "secret/data/app",
            r#"{"errors":["check-and-set parameter required for this call"]}"#,
        );
        assert_eq!(required.invalid_data_code(), Some(InvalidDataCode::CheckAndSetRequired));
    }

    #[test]
    fn test_classify_unparseable_body_falls_back() {
        let err = classify(StatusCode::BAD_GATEWAY, "sys/health", "<html>bad gateway</html>");
        match err {
            VaultError::Backend { status, body, .. } => {
                assert_eq!(status, 502);
                assert!(body.contains("bad gateway"));
            }
            other => panic!("unexpected {other:?}"),
        }

        let proxy_page = "<html>502 from proxy: upstream reset</html>";
        for status in [StatusCode::BAD_REQUEST, StatusCode::FORBIDDEN] {
            match classify(status, "sys/mounts/x", proxy_page) {
                VaultError::Backend { status: code, body, .. } => {
                    assert_eq!(code, status.as_u16());
                    assert_eq!(body, proxy_page);
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_classify_requires_errors_member() {
        let err = classify(StatusCode::FORBIDDEN, "sys/audit", r#"{"message":"denied"}"#);
        assert!(!err.is_forbidden());
        assert!(err.to_string().contains(r#"{"message":"denied"}"#));

        let empty = classify(StatusCode::BAD_REQUEST, "x", r#"{"errors":[]}"#);
        assert_eq!(empty.invalid_data_code(), Some(InvalidDataCode::Unclassified));
    }

    #[test]
    fn test_retryable_errors() {
        assert!(VaultError::Timeout("slow".to_string()).is_retryable());
        assert!(VaultError::Transport("refused".to_string()).is_retryable());
        assert!(classify(StatusCode::SERVICE_UNAVAILABLE, "x", "").is_retryable());
        assert!(classify(StatusCode::TOO_MANY_REQUESTS, "x", "").is_retryable());
        assert!(!VaultError::not_found("path").is_retryable());
        assert!(!VaultError::NoActiveToken.is_retryable());
    }
}
