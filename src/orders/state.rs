//! Customer Order State Management
//!
//! `OrderStore` caches the signed-in customer's orders and the one being
//! viewed. Placing an order sends whatever address it is given; checking
//! that the cart and address are non-empty is the caller's job.

use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use super::models::{Order, PlaceOrderRequest};
use crate::{
    error::StoreError,
    tracker::{Operation, OperationStatus, OperationTracker},
    transport::{
        helpers::{decode_list, unwrap_key},
        RemoteApi,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderOperation {
    FetchAll,
    FetchOne,
    Place,
    Cancel,
}

impl Operation for OrderOperation {
    fn fallback_message(self) -> &'static str {
        match self {
            Self::FetchAll => "Failed to fetch orders",
            Self::FetchOne => "Failed to fetch order",
            Self::Place => "Failed to place order",
            Self::Cancel => "Failed to cancel order",
        }
    }
}

#[derive(Debug, Default)]
struct OrderState {
    orders: Vec<Order>,
    selected: Option<Order>,
}

impl OrderState {
    /// Swaps in the server's copy of an order wherever it is cached.
    fn replace(&mut self, order: &Order) {
        if let Some(cached) = self.orders.iter_mut().find(|cached| cached.id == order.id) {
            *cached = order.clone();
        }
        if self.selected.as_ref().is_some_and(|selected| selected.id == order.id) {
            self.selected = Some(order.clone());
        }
    }
}

/// Local cache of the customer's orders.
pub struct OrderStore {
    api: Arc<dyn RemoteApi>,
    state: RwLock<OrderState>,
    operations: OperationTracker<OrderOperation>,
}

impl std::fmt::Debug for OrderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderStore")
            .field("state", &self.state)
            .field("operations", &self.operations)
            .finish_non_exhaustive()
    }
}

/// Decodes an order that may be wrapped under `order`.
fn decode_order(body: Value) -> Result<Order, StoreError> {
    Ok(serde_json::from_value(unwrap_key(body, "order"))?)
}

impl OrderStore {
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self {
            api,
            state: RwLock::new(OrderState::default()),
            operations: OperationTracker::new(),
        }
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.state.read().await.orders.clone()
    }

    pub async fn selected(&self) -> Option<Order> {
        self.state.read().await.selected.clone()
    }

    pub async fn error(&self) -> Option<String> {
        self.operations.error().await
    }

    pub async fn clear_error(&self) {
        self.operations.clear_error().await;
    }

    pub async fn clear_selected(&self) {
        self.state.write().await.selected = None;
    }

    pub fn status(&self, op: OrderOperation) -> OperationStatus {
        self.operations.status(op)
    }

    pub fn is_loading(&self) -> bool {
        self.operations.is_loading()
    }

    /// Replaces the order list. Accepts a bare array or `{ orders: [...] }`.
    pub async fn fetch_orders(&self) -> Result<Vec<Order>, StoreError> {
        let op = OrderOperation::FetchAll;
        let call = self.operations.begin(op).await;

        let result = self.load_orders().await;
        let orders = call.finish(result).await?;

        self.state.write().await.orders = orders.clone();
        Ok(orders)
    }

    /// Loads one order and selects it.
    pub async fn fetch_order(&self, order_id: &str) -> Result<Order, StoreError> {
        let op = OrderOperation::FetchOne;
        let call = self.operations.begin(op).await;

        let result = self.request_order(Method::GET, &format!("/orders/{order_id}"), None).await;
        let order = call.finish(result).await?;

        self.state.write().await.selected = Some(order.clone());
        Ok(order)
    }

    /// Checks out the current cart.
    ///
    /// The new order is appended and selected. The cart is not touched
    /// here; whatever the server does to it shows up on the next fetch.
    /// No idempotency key is sent, so retrying after a timeout may create
    /// a second order.
    pub async fn place_order(&self, address: Option<String>) -> Result<Order, StoreError> {
        let op = OrderOperation::Place;
        let call = self.operations.begin(op).await;

        let result = match serde_json::to_value(PlaceOrderRequest { address }) {
            Ok(body) => self.request_order(Method::POST, "/orders", Some(body)).await,
            Err(error) => Err(error.into()),
        };
        let order = call.finish(result).await?;

        let mut state = self.state.write().await;
        state.orders.push(order.clone());
        state.selected = Some(order.clone());
        info!(order_id = %order.id, total = order.total, "order placed");

        Ok(order)
    }

    /// Cancels an order and refreshes every cached copy of it.
    ///
    /// The store does not check [`super::models::OrderStatus::is_cancellable`];
    /// the server rejects orders past the cancellable states.
    pub async fn cancel_order(&self, order_id: &str) -> Result<Order, StoreError> {
        let op = OrderOperation::Cancel;
        let call = self.operations.begin(op).await;

        let result = self
            .request_order(Method::PUT, &format!("/orders/{order_id}/cancel"), None)
            .await;
        let order = call.finish(result).await?;

        self.state.write().await.replace(&order);
        info!(order_id = %order.id, status = %order.status, "order cancelled");

        Ok(order)
    }

    async fn load_orders(&self) -> Result<Vec<Order>, StoreError> {
        let body = self.api.send(Method::GET, "/orders", None).await?;
        Ok(decode_list(body, "orders")?)
    }

    async fn request_order(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Order, StoreError> {
        decode_order(self.api.send(method, path, body).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{ApiError, Rejection},
        orders::models::OrderStatus,
        transport::MockRemoteApi,
    };
    use serde_json::json;

    fn order_json(id: &str, status: &str) -> Value {
        json!({
            "id": id,
            "items": [{ "id": "l1", "name": "Kettle", "price": 100.0, "quantity": 1 }],
            "status": status,
            "subtotal": 100.0,
            "tax": 18.0,
            "discount": 0,
            "total": 118.0,
            "shippingAddress": "12 MG Road",
            "createdAt": "2024-05-01T10:00:00Z"
        })
    }

    #[tokio::test]
    async fn list_accepts_array_and_envelope() {
        let mut api = MockRemoteApi::new();
        let mut calls = 0;
        api.expect_send()
            .withf(|method, path, _| *method == Method::GET && path == "/orders")
            .times(2)
            .returning(move |_, _, _| {
                calls += 1;
                if calls == 1 {
                    Ok(json!([order_json("o1", "Packed")]))
                } else {
                    Ok(json!({ "success": true, "count": 1, "orders": [order_json("o1", "Packed")] }))
                }
            });

        let store = OrderStore::new(Arc::new(api));
        let bare = store.fetch_orders().await.unwrap();
        let wrapped = store.fetch_orders().await.unwrap();

        assert_eq!(bare, wrapped);
        assert_eq!(bare[0].status, OrderStatus::Packed);
    }

    #[tokio::test]
    async fn placing_appends_exactly_one_order_and_selects_it() {
        let mut api = MockRemoteApi::new();
        api.expect_send()
            .withf(|method, path, body| {
                *method == Method::POST
                    && path == "/orders"
                    && body == &Some(json!({ "address": "X" }))
            })
            .times(1)
            .returning(|_, _, _| Ok(json!({ "success": true, "order": order_json("o9", "Order Placed") })));

        let store = OrderStore::new(Arc::new(api));
        let order = store.place_order(Some("X".into())).await.unwrap();

        assert_eq!(store.orders().await, vec![order.clone()]);
        assert_eq!(store.selected().await, Some(order));
    }

    #[tokio::test]
    async fn placing_without_address_sends_an_empty_body() {
        let mut api = MockRemoteApi::new();
        api.expect_send()
            .withf(|_, _, body| body == &Some(json!({})))
            .returning(|_, _, _| Ok(order_json("o1", "Order Placed")));

        let store = OrderStore::new(Arc::new(api));
        store.place_order(None).await.unwrap();
    }

    #[tokio::test]
    async fn failed_placement_records_structured_message() {
        let mut api = MockRemoteApi::new();
        api.expect_send().returning(|_, _, _| {
            Err(ApiError::Rejected {
                status: 400,
                rejection: Rejection::from_body(&json!({ "message": "Cart is empty" })),
            })
        });

        let store = OrderStore::new(Arc::new(api));
        assert!(store.place_order(Some("X".into())).await.is_err());

        assert!(store.orders().await.is_empty());
        assert_eq!(store.error().await.as_deref(), Some("Cart is empty"));
    }

    #[tokio::test]
    async fn cancelling_refreshes_list_and_selection() {
        let mut api = MockRemoteApi::new();
        let mut calls = 0;
        api.expect_send().times(3).returning(move |_, path, _| {
            calls += 1;
            match calls {
                1 => Ok(json!([order_json("o1", "Packed"), order_json("o2", "Delivered")])),
                2 => Ok(json!({ "order": order_json("o1", "Packed") })),
                _ => {
                    assert_eq!(path, "/orders/o1/cancel");
                    Ok(json!({ "order": order_json("o1", "Cancelled") }))
                }
            }
        });

        let store = OrderStore::new(Arc::new(api));
        store.fetch_orders().await.unwrap();
        store.fetch_order("o1").await.unwrap();
        store.cancel_order("o1").await.unwrap();

        let orders = store.orders().await;
        assert_eq!(orders[0].status, OrderStatus::Cancelled);
        assert_eq!(orders[1].status, OrderStatus::Delivered);
        assert_eq!(store.selected().await.unwrap().status, OrderStatus::Cancelled);
    }

    #[test]
    fn only_pre_delivery_orders_are_cancellable() {
        assert!(OrderStatus::Placed.is_cancellable());
        assert!(OrderStatus::Packed.is_cancellable());
        assert!(OrderStatus::Shipping.is_cancellable());
        assert!(!OrderStatus::Delivered.is_cancellable());
        assert!(!OrderStatus::Cancelled.is_cancellable());
    }

    #[test]
    fn statuses_parse_from_labels_and_names() {
        assert_eq!("Order Placed".parse::<OrderStatus>(), Ok(OrderStatus::Placed));
        assert_eq!("shipping".parse::<OrderStatus>(), Ok(OrderStatus::Shipping));
        assert_eq!("placed".parse::<OrderStatus>(), Ok(OrderStatus::Placed));
        assert!("lost".parse::<OrderStatus>().is_err());
    }
}
