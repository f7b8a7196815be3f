//! HTTP transport for the storefront backend.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    helpers::{detect_session_expiry, parse_body},
    RemoteApi, Session,
};
use crate::error::{ApiError, Rejection};

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// reqwest-backed [`RemoteApi`].
///
/// Attaches the session's bearer credential to every request and turns a
/// rejected credential into a session-wide expiry.
#[derive(Debug, Clone)]
pub struct HttpApi {
    http: Client,
    base_url: String,
    session: Arc<Session>,
}

impl HttpApi {
    /// Builds a client for `base_url` with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration, session: Arc<Session>) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl RemoteApi for HttpApi {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let request_id = Uuid::new_v4().simple().to_string();
        debug!(%method, path, %request_id, "sending request");

        let mut request = self
            .http
            .request(method.clone(), self.url(path))
            .header(REQUEST_ID_HEADER, &request_id);

        if let Some(token) = self.session.token().await {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let payload = parse_body(&response.bytes().await?);

        if let Some(message) = detect_session_expiry(status.as_u16(), &payload) {
            self.session.expire(message.clone()).await;
            return Err(ApiError::SessionExpired { message });
        }

        if !status.is_success() {
            let rejection = Rejection::from_body(&payload);
            warn!(%method, path, %request_id, status = status.as_u16(), ?rejection, "request rejected");

            return Err(ApiError::Rejected {
                status: status.as_u16(),
                rejection,
            });
        }

        debug!(%method, path, %request_id, status = status.as_u16(), "request completed");
        Ok(payload)
    }
}
