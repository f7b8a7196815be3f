//! Transport Module
//!
//! Everything that touches the network lives here:
//! - The `RemoteApi` seam the stores are written against
//! - `HttpApi`, the reqwest implementation with the session interceptor
//! - `Session` and its event bus
//! - Response body normalization helpers

pub mod client;
pub mod helpers;
pub mod session;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::error::ApiError;

pub use client::HttpApi;
pub use session::{Session, SessionEvent};

/// A backend that answers JSON requests.
///
/// Successful responses come back as raw JSON; shape normalization is the
/// caller's job. Non-success statuses and session expiry are errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError>;
}
