//! Client error taxonomy.

use thiserror::Error;

use ridebook_auth::{IdentityError, PermissionError};
use ridebook_core::DomainError;

pub type ClientResult<T> = Result<T, ClientError>;

/// Every failure a view can observe.
///
/// Only `Unauthenticated` is ever recovered (once, by the transport); the
/// rest surface unchanged into the resource `error` field.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),

    /// 401 that survived the refresh protocol, or a failed refresh.
    ///
    /// `message` is the backend's own explanation, e.g. rejected credentials.
    #[error("not authenticated")]
    Unauthenticated { message: Option<String> },

    /// 403: the identity may not perform this action.
    #[error("forbidden")]
    Forbidden { message: Option<String> },

    /// Malformed request, rejected locally (`status: None`) or by the backend (400/422).
    #[error("validation failed")]
    Validation {
        status: Option<u16>,
        message: Option<String>,
    },

    /// Any other non-success status (business-rule conflicts, server errors).
    #[error("API error ({status})")]
    Api {
        status: u16,
        message: Option<String>,
    },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("invalid sign-in callback: {0}")]
    InvalidCallback(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Classify a non-success, non-401 response.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let message = backend_message(body);
        match status {
            401 => ClientError::Unauthenticated { message },
            403 => ClientError::Forbidden { message },
            400 | 422 => ClientError::Validation {
                status: Some(status),
                message,
            },
            _ => ClientError::Api { status, message },
        }
    }

    /// `Unauthenticated` with no backend message.
    pub fn unauthenticated() -> Self {
        ClientError::Unauthenticated { message: None }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation {
            status: None,
            message: Some(message.into()),
        }
    }

    /// Human-readable message for the resource `error` field.
    ///
    /// Prefers the backend's own message; `fallback` covers everything else.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Network(_) => {
                "Unable to reach the server. Check your connection and try again.".to_string()
            }
            ClientError::Unauthenticated { message } => message
                .clone()
                .unwrap_or_else(|| "Your session has expired. Please sign in again.".to_string()),
            ClientError::Forbidden { message } => message
                .clone()
                .unwrap_or_else(|| "You do not have permission to do that.".to_string()),
            ClientError::Validation { message, .. } | ClientError::Api { message, .. } => {
                message.clone().unwrap_or_else(|| fallback.to_string())
            }
            ClientError::Decode(_) | ClientError::InvalidCallback(_) | ClientError::Config(_) => {
                fallback.to_string()
            }
        }
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, ClientError::Unauthenticated { .. })
    }
}

/// Pull a message out of a backend error body.
///
/// Looks at `message` (a string, or a list of validation messages) and then
/// `error`. Non-JSON bodies yield nothing.
pub fn backend_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;

    let from_message = match value.get("message") {
        Some(serde_json::Value::String(s)) => Some(s.trim().to_string()),
        Some(serde_json::Value::Array(items)) => {
            let parts: Vec<&str> = items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect();
            Some(parts.join(", "))
        }
        _ => None,
    };

    from_message
        .filter(|s| !s.is_empty())
        .or_else(|| {
            value
                .get("error")
                .and_then(|v| v.as_str())
                .map(|s| s.trim().to_string())
        })
        .filter(|s| !s.is_empty())
}

impl From<DomainError> for ClientError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => ClientError::validation(msg),
        }
    }
}

impl From<PermissionError> for ClientError {
    fn from(value: PermissionError) -> Self {
        ClientError::validation(value.to_string())
    }
}

impl From<IdentityError> for ClientError {
    fn from(value: IdentityError) -> Self {
        ClientError::Decode(value.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            ClientError::Decode(value.to_string())
        } else {
            ClientError::Network(value.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_statuses() {
        assert_eq!(ClientError::from_status(401, b""), ClientError::unauthenticated());
        assert_eq!(
            ClientError::from_status(401, br#"{"message":"Invalid credentials"}"#),
            ClientError::Unauthenticated {
                message: Some("Invalid credentials".to_string())
            }
        );
        assert!(matches!(ClientError::from_status(403, b""), ClientError::Forbidden { .. }));
        assert!(matches!(
            ClientError::from_status(422, b""),
            ClientError::Validation { status: Some(422), .. }
        ));
        assert_eq!(
            ClientError::from_status(409, br#"{"message":"Vehicle already exists"}"#),
            ClientError::Api {
                status: 409,
                message: Some("Vehicle already exists".to_string())
            }
        );
    }

    #[test]
    fn backend_message_shapes() {
        assert_eq!(
            backend_message(br#"{"message":["name is required"," seats must be positive"]}"#),
            Some("name is required, seats must be positive".to_string())
        );
        assert_eq!(
            backend_message(br#"{"message":"","error":"Conflict"}"#),
            Some("Conflict".to_string())
        );
        assert_eq!(backend_message(b"<html>Bad Gateway</html>"), None);
        assert_eq!(backend_message(br#"{"statusCode":500}"#), None);
    }

    #[test]
    fn user_message_falls_back() {
        let err = ClientError::from_status(500, b"");
        assert_eq!(err.user_message("Failed to load rides"), "Failed to load rides");

        let err = ClientError::from_status(409, br#"{"message":"Route already exists"}"#);
        assert_eq!(err.user_message("Failed to create route"), "Route already exists");

        assert!(ClientError::unauthenticated()
            .user_message("x")
            .contains("sign in again"));
        let rejected = ClientError::from_status(401, br#"{"error":"Invalid credentials"}"#);
        assert_eq!(rejected.user_message("x"), "Invalid credentials");
    }
}
