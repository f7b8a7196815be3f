//! Error types shared by the transport and the stores.
//!
//! The backend rejects requests with either a bare string or an object
//! carrying a `message` field. Both are folded into [`Rejection`] as soon as
//! a response is received, so nothing past the transport has to care which
//! shape arrived.

use serde_json::{Map, Value};
use thiserror::Error;

/// A rejection payload returned by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// The body was a bare string.
    Plain(String),

    /// The body was an object with a message; remaining fields are kept
    /// for callers that want to inspect them.
    Structured {
        /// Human readable message from the server.
        message: String,
        /// Every other field of the payload.
        fields: Map<String, Value>,
    },
}

impl Rejection {
    /// Normalizes a response body into a rejection.
    ///
    /// Returns `None` when the body carries nothing a user could read, in
    /// which case callers fall back to a generic message.
    pub fn from_body(body: &Value) -> Option<Self> {
        match body {
            Value::String(text) if !text.trim().is_empty() => Some(Self::Plain(text.clone())),
            Value::Object(object) => {
                let key = ["message", "error"]
                    .into_iter()
                    .find(|key| object.get(*key).is_some_and(Value::is_string))?;

                let mut fields = object.clone();
                let message = match fields.remove(key) {
                    Some(Value::String(message)) => message,
                    _ => return None,
                };

                Some(Self::Structured { message, fields })
            }
            _ => None,
        }
    }

    /// The user facing message, whichever shape the payload had.
    pub fn message(&self) -> &str {
        match self {
            Self::Plain(message) | Self::Structured { message, .. } => message,
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Errors raised while talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure: connection, timeout, TLS, body read.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("request rejected with status {status}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Normalized payload, when the body carried one.
        rejection: Option<Rejection>,
    },

    /// The bearer credential is no longer accepted.
    #[error("session expired: {message}")]
    SessionExpired {
        /// Message published to session subscribers.
        message: String,
    },

    /// A success response did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Message to record in a store's error field.
    ///
    /// Server provided messages win; transport and decoding failures use
    /// the operation's `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Rejected {
                rejection: Some(rejection),
                ..
            } => rejection.message().to_string(),
            Self::SessionExpired { message } => message.clone(),
            _ => fallback.to_string(),
        }
    }

    /// The normalized rejection, if the server sent one.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected { rejection, .. } => rejection.as_ref(),
            _ => None,
        }
    }
}

/// Errors returned by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("coupon code cannot be empty")]
    EmptyCouponCode,

    #[error("coupon {0} is already applied, remove it first")]
    CouponAlreadyApplied(String),

    #[error("{0}")]
    Unsuccessful(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        Self::Api(ApiError::Decode(error))
    }
}

impl StoreError {
    /// Message to record in a store's error field.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Api(error) => error.user_message(fallback),
            other => other.to_string(),
        }
    }

    /// True when the failure was a session expiry.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::Api(ApiError::SessionExpired { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn structured_payload_keeps_message_and_extra_fields() {
        let rejection = Rejection::from_body(&json!({
            "success": false,
            "message": "Coupon expired"
        }))
        .unwrap();

        assert_eq!(rejection.message(), "Coupon expired");
        match rejection {
            Rejection::Structured { fields, .. } => {
                assert_eq!(fields.get("success"), Some(&json!(false)));
                assert!(!fields.contains_key("message"));
            }
            Rejection::Plain(_) => panic!("expected structured rejection"),
        }
    }

    #[test]
    fn bare_string_becomes_plain() {
        let rejection = Rejection::from_body(&json!("Out of stock")).unwrap();
        assert_eq!(rejection, Rejection::Plain("Out of stock".into()));
    }

    #[test]
    fn error_field_is_used_when_message_is_missing() {
        let rejection = Rejection::from_body(&json!({ "error": "Not found" })).unwrap();
        assert_eq!(rejection.message(), "Not found");
    }

    #[test]
    fn unreadable_bodies_fall_back() {
        assert!(Rejection::from_body(&Value::Null).is_none());
        assert!(Rejection::from_body(&json!({ "code": 42 })).is_none());
        assert!(Rejection::from_body(&json!("   ")).is_none());

        let error = ApiError::Rejected {
            status: 500,
            rejection: None,
        };
        assert_eq!(error.user_message("Failed to fetch cart"), "Failed to fetch cart");
    }
}
