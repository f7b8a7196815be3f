//! Admin coupon console.

use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use super::{helpers::RecordList, models::CouponInput};
use crate::{
    cart::models::Coupon,
    error::StoreError,
    tracker::{Operation, OperationStatus, OperationTracker},
    transport::{
        helpers::{decode_list, unwrap_key},
        RemoteApi,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminCouponOperation {
    FetchAll,
    Create,
    Update,
    Delete,
}

impl Operation for AdminCouponOperation {
    fn fallback_message(self) -> &'static str {
        match self {
            Self::FetchAll => "Failed to fetch coupons",
            Self::Create => "Failed to add coupon",
            Self::Update => "Failed to update coupon",
            Self::Delete => "Failed to delete coupon",
        }
    }
}

pub struct AdminCouponStore {
    api: Arc<dyn RemoteApi>,
    coupons: RwLock<RecordList<Coupon>>,
    operations: OperationTracker<AdminCouponOperation>,
}

impl std::fmt::Debug for AdminCouponStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCouponStore")
            .field("coupons", &self.coupons)
            .finish_non_exhaustive()
    }
}

impl AdminCouponStore {
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self {
            api,
            coupons: RwLock::new(RecordList::default()),
            operations: OperationTracker::new(),
        }
    }

    pub async fn coupons(&self) -> Vec<Coupon> {
        self.coupons.read().await.items.clone()
    }

    pub async fn selected(&self) -> Option<Coupon> {
        self.coupons.read().await.selected.clone()
    }

    pub async fn select(&self, coupon_id: &str) -> bool {
        self.coupons.write().await.select(coupon_id)
    }

    pub async fn clear_selected(&self) {
        self.coupons.write().await.selected = None;
    }

    pub async fn error(&self) -> Option<String> {
        self.operations.error().await
    }

    pub async fn clear_error(&self) {
        self.operations.clear_error().await;
    }

    pub fn status(&self, op: AdminCouponOperation) -> OperationStatus {
        self.operations.status(op)
    }

    pub fn is_loading(&self) -> bool {
        self.operations.is_loading()
    }

    pub async fn fetch_coupons(&self) -> Result<Vec<Coupon>, StoreError> {
        let op = AdminCouponOperation::FetchAll;
        let call = self.operations.begin(op).await;

        let result = self.load_coupons().await;
        let coupons = call.finish(result).await?;

        self.coupons.write().await.items = coupons.clone();
        Ok(coupons)
    }

    pub async fn create_coupon(&self, input: &CouponInput) -> Result<Coupon, StoreError> {
        let op = AdminCouponOperation::Create;
        let call = self.operations.begin(op).await;

        let result = self.submit(Method::POST, "/admin/coupons".to_string(), input).await;
        let coupon = call.finish(result).await?;

        self.coupons.write().await.insert(coupon.clone());
        info!(code = %coupon.code, "coupon created");
        Ok(coupon)
    }

    pub async fn update_coupon(&self, coupon_id: &str, input: &CouponInput) -> Result<Coupon, StoreError> {
        let op = AdminCouponOperation::Update;
        let call = self.operations.begin(op).await;

        let result = self
            .submit(Method::PUT, format!("/admin/coupons/{coupon_id}"), input)
            .await;
        let coupon = call.finish(result).await?;

        self.coupons.write().await.replace(coupon.clone());
        Ok(coupon)
    }

    pub async fn delete_coupon(&self, coupon_id: &str) -> Result<(), StoreError> {
        let op = AdminCouponOperation::Delete;
        let call = self.operations.begin(op).await;

        let result = self
            .api
            .send(Method::DELETE, &format!("/admin/coupons/{coupon_id}"), None)
            .await
            .map_err(StoreError::from);
        call.finish(result).await?;

        self.coupons.write().await.remove(coupon_id);
        info!(coupon_id, "coupon deleted");
        Ok(())
    }

    async fn load_coupons(&self) -> Result<Vec<Coupon>, StoreError> {
        let body = self.api.send(Method::GET, "/admin/coupons", None).await?;
        Ok(decode_list(body, "coupons")?)
    }

    async fn submit(&self, method: Method, path: String, input: &CouponInput) -> Result<Coupon, StoreError> {
        let body: Value = serde_json::to_value(input)?;
        let response = self.api.send(method, &path, Some(body)).await?;
        Ok(serde_json::from_value(unwrap_key(response, "coupon"))?)
    }
}
