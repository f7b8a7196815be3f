//! Authentication State
//!
//! `AuthStore` drives the login, registration and profile endpoints and
//! writes the outcome into the shared [`Session`]. The session, not the
//! store, owns the credential, so the transport sees a new token as soon as
//! a login completes.

use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::models::{AuthResponse, Credentials, ProfileUpdate, Registration, User};
use crate::{
    error::StoreError,
    tracker::{Operation, OperationStatus, OperationTracker},
    transport::{helpers::unwrap_key, RemoteApi, Session},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthOperation {
    Register,
    Login,
    AdminLogin,
    FetchProfile,
    UpdateProfile,
}

impl Operation for AuthOperation {
    fn fallback_message(self) -> &'static str {
        match self {
            Self::Register => "Registration failed",
            Self::Login => "Login failed",
            Self::AdminLogin => "Admin login failed",
            Self::FetchProfile => "Failed to fetch user profile",
            Self::UpdateProfile => "Failed to update user profile",
        }
    }
}

pub struct AuthStore {
    api: Arc<dyn RemoteApi>,
    session: Arc<Session>,
    operations: OperationTracker<AuthOperation>,
}

impl std::fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStore")
            .field("session", &self.session)
            .field("operations", &self.operations)
            .finish_non_exhaustive()
    }
}

impl AuthStore {
    pub fn new(api: Arc<dyn RemoteApi>, session: Arc<Session>) -> Self {
        Self {
            api,
            session,
            operations: OperationTracker::new(),
        }
    }

    pub async fn user(&self) -> Option<User> {
        self.session.user().await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.is_authenticated().await
    }

    pub async fn error(&self) -> Option<String> {
        self.operations.error().await
    }

    pub async fn clear_error(&self) {
        self.operations.clear_error().await;
    }

    pub fn status(&self, op: AuthOperation) -> OperationStatus {
        self.operations.status(op)
    }

    pub fn is_loading(&self) -> bool {
        self.operations.is_loading()
    }

    pub async fn register(&self, registration: &Registration) -> Result<User, StoreError> {
        self.authenticate(AuthOperation::Register, "/auth/register", registration)
            .await
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<User, StoreError> {
        self.authenticate(AuthOperation::Login, "/auth/login", credentials)
            .await
    }

    pub async fn login_admin(&self, credentials: &Credentials) -> Result<User, StoreError> {
        self.authenticate(AuthOperation::AdminLogin, "/admin/login", credentials)
            .await
    }

    /// Forgets the credential locally. The backend keeps no session state.
    pub async fn logout(&self) {
        self.session.sign_out().await;
    }

    /// Reloads the signed-in user.
    pub async fn fetch_profile(&self) -> Result<User, StoreError> {
        let op = AuthOperation::FetchProfile;
        let call = self.operations.begin(op).await;

        let result = self.request_user(Method::GET, None).await;
        let user = call.finish(result).await?;

        self.session.set_user(user.clone()).await;
        Ok(user)
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, StoreError> {
        let op = AuthOperation::UpdateProfile;
        let call = self.operations.begin(op).await;

        let result = match serde_json::to_value(update) {
            Ok(body) => self.request_user(Method::PUT, Some(body)).await,
            Err(error) => Err(error.into()),
        };
        let user = call.finish(result).await?;

        self.session.set_user(user.clone()).await;
        info!(user_id = %user.id, "profile updated");
        Ok(user)
    }

    async fn authenticate<B: Serialize>(
        &self,
        op: AuthOperation,
        path: &str,
        body: &B,
    ) -> Result<User, StoreError> {
        let call = self.operations.begin(op).await;

        let result = self.exchange(path, body).await;
        let response = call.finish(result).await?;

        let user = response.user.clone();
        self.session.sign_in(response.token, response.user).await;
        Ok(user)
    }

    async fn exchange<B: Serialize>(&self, path: &str, body: &B) -> Result<AuthResponse, StoreError> {
        let body = serde_json::to_value(body)?;
        let response = self.api.send(Method::POST, path, Some(body)).await?;
        Ok(serde_json::from_value(response)?)
    }

    async fn request_user(&self, method: Method, body: Option<Value>) -> Result<User, StoreError> {
        let path = if method == Method::GET { "/auth/me" } else { "/auth/profile" };
        let response = self.api.send(method, path, body).await?;
        Ok(serde_json::from_value(unwrap_key(response, "user"))?)
    }
}
