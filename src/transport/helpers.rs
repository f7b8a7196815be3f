//! Response Normalization Helpers
//!
//! The backend is not consistent about envelopes: the same resource may
//! arrive bare or wrapped under a key, and lists may arrive as arrays or
//! as `{ "orders": [...] }`. These helpers reduce every variant to one
//! canonical shape at the I/O boundary.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Message published when the server does not provide one.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Decodes a raw response body.
///
/// Empty bodies become `null` and non-JSON text becomes a JSON string, so a
/// plain-text rejection still reaches [`crate::error::Rejection`].
pub fn parse_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }

    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// Returns the expiry message when a response signals a dead credential.
///
/// A 401 status, an `error` of `"jwt expired"` or a `message` of
/// `"Invalid token"` all count, whatever the status code.
pub fn detect_session_expiry(status: u16, body: &Value) -> Option<String> {
    let embedded = body.get("error").and_then(Value::as_str) == Some("jwt expired")
        || body.get("message").and_then(Value::as_str) == Some("Invalid token");

    if status != 401 && !embedded {
        return None;
    }

    let message = body
        .get("message")
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .unwrap_or(SESSION_EXPIRED_MESSAGE);

    Some(message.to_string())
}

/// Unwraps `body[key]` when present, otherwise returns the body itself.
pub fn unwrap_key(body: Value, key: &str) -> Value {
    match body {
        Value::Object(mut object) => match object.remove(key) {
            Some(inner) if !inner.is_null() => inner,
            Some(_) | None => Value::Object(object),
        },
        other => other,
    }
}

/// Decodes a list that may be bare or wrapped under `key`.
///
/// A missing list decodes as empty.
pub fn decode_list<T: DeserializeOwned>(body: Value, key: &str) -> Result<Vec<T>, serde_json::Error> {
    match unwrap_key(body, key) {
        list @ Value::Array(_) => serde_json::from_value(list),
        _ => Ok(Vec::new()),
    }
}
