//! The `Storefront` facade: one transport, one session, every store.

use std::{sync::Arc, time::Duration};

use tokio::sync::broadcast;

use crate::{
    admin::{AdminCouponStore, AdminOrderStore, AdminProductStore, DashboardStore},
    auth::AuthStore,
    cart::CartStore,
    catalog::CatalogStore,
    config::ApiConfig,
    error::ApiError,
    orders::OrderStore,
    transport::{HttpApi, RemoteApi, Session, SessionEvent},
};

/// Every store of the client, wired to a shared backend and session.
#[derive(Debug)]
pub struct Storefront {
    pub session: Arc<Session>,
    pub auth: AuthStore,
    pub catalog: CatalogStore,
    pub cart: CartStore,
    pub orders: OrderStore,
    pub admin_orders: AdminOrderStore,
    pub admin_coupons: AdminCouponStore,
    pub admin_products: AdminProductStore,
    pub dashboard: DashboardStore,
}

impl Storefront {
    /// Connects to `base_url` over HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn connect(base_url: &str, timeout: Duration, token: Option<String>) -> Result<Self, ApiError> {
        let session = Arc::new(Session::with_token(token));
        let api = HttpApi::new(base_url, timeout, session.clone())?;
        Ok(Self::with_api(Arc::new(api), session))
    }

    /// Connects using the command line settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::connect(&config.api_url, config.timeout(), config.token.clone())
    }

    /// Builds the stores over any backend. `session` must be the one the
    /// backend reports expiry to.
    pub fn with_api(api: Arc<dyn RemoteApi>, session: Arc<Session>) -> Self {
        Self {
            auth: AuthStore::new(api.clone(), session.clone()),
            catalog: CatalogStore::new(api.clone()),
            cart: CartStore::new(api.clone()),
            orders: OrderStore::new(api.clone()),
            admin_orders: AdminOrderStore::new(api.clone()),
            admin_coupons: AdminCouponStore::new(api.clone()),
            admin_products: AdminProductStore::new(api.clone()),
            dashboard: DashboardStore::new(api),
            session,
        }
    }

    /// Registers an observer of sign-in, sign-out and expiry.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.session.subscribe()
    }
}
