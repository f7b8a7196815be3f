//! Admin dashboard metrics.

use std::sync::Arc;

use reqwest::Method;
use tokio::sync::RwLock;

use super::models::{DashboardMetrics, DashboardResponse};
use crate::{
    error::StoreError,
    tracker::{Operation, OperationStatus, OperationTracker},
    transport::RemoteApi,
};

const DASHBOARD_FAILURE: &str = "Failed to fetch dashboard data";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashboardOperation {
    FetchMetrics,
}

impl Operation for DashboardOperation {
    fn fallback_message(self) -> &'static str {
        DASHBOARD_FAILURE
    }
}

pub struct DashboardStore {
    api: Arc<dyn RemoteApi>,
    metrics: RwLock<DashboardMetrics>,
    operations: OperationTracker<DashboardOperation>,
}

impl std::fmt::Debug for DashboardStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardStore")
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl DashboardStore {
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self {
            api,
            metrics: RwLock::new(DashboardMetrics::default()),
            operations: OperationTracker::new(),
        }
    }

    /// Last fetched metrics; all zero until the first success.
    pub async fn metrics(&self) -> DashboardMetrics {
        self.metrics.read().await.clone()
    }

    pub async fn error(&self) -> Option<String> {
        self.operations.error().await
    }

    pub async fn clear_error(&self) {
        self.operations.clear_error().await;
    }

    pub fn status(&self) -> OperationStatus {
        self.operations.status(DashboardOperation::FetchMetrics)
    }

    pub async fn fetch_metrics(&self) -> Result<DashboardMetrics, StoreError> {
        let op = DashboardOperation::FetchMetrics;
        let call = self.operations.begin(op).await;

        let result = self.load_metrics().await;
        let metrics = call.finish(result).await?;

        *self.metrics.write().await = metrics.clone();
        Ok(metrics)
    }

    async fn load_metrics(&self) -> Result<DashboardMetrics, StoreError> {
        let body = self.api.send(Method::GET, "/admin/dashboard", None).await?;
        let response: DashboardResponse = serde_json::from_value(body)?;

        if !response.success {
            return Err(StoreError::Unsuccessful(DASHBOARD_FAILURE.to_string()));
        }
        Ok(response.metrics)
    }
}
