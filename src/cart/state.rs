//! Shopping Cart State Management
//!
//! `CartStore` mirrors one user's remote cart. Every mutation goes to the
//! server; the local copy is only ever replaced from a response and is left
//! as it was when a call fails.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use reqwest::Method;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::{
    helpers::{
        decode_cart_payload, merge_applied_coupon, merge_removed_coupon, nested_cart_payload,
        normalize_coupon_code, replace_cart, top_level_coupon,
    },
    models::{AddItemRequest, ApplyCouponRequest, Cart, CartPayload, Coupon, UpdateQuantityRequest},
};
use crate::{
    error::StoreError,
    tracker::{InFlight, Operation, OperationStatus, OperationTracker},
    transport::RemoteApi,
};

/// Operations of the cart store, each tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartOperation {
    Fetch,
    AddItem,
    UpdateQuantity,
    RemoveItem,
    Clear,
    ApplyCoupon,
    RemoveCoupon,
}

impl Operation for CartOperation {
    fn fallback_message(self) -> &'static str {
        match self {
            Self::Fetch => "Failed to fetch cart",
            Self::AddItem => "Failed to add item to cart",
            Self::UpdateQuantity => "Failed to update cart item",
            Self::RemoveItem => "Failed to remove item from cart",
            Self::Clear => "Failed to clear cart",
            Self::ApplyCoupon => "Failed to apply coupon",
            Self::RemoveCoupon => "Failed to remove coupon",
        }
    }
}

/// Where the coupon flow stands.
///
/// `NoCoupon -> Applying -> Applied | NoCoupon`, `Applied -> Removing -> NoCoupon`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CouponPhase {
    #[default]
    NoCoupon,
    Applying,
    Applied,
    Removing,
}

impl CouponPhase {
    fn settled(cart: &Cart) -> Self {
        if cart.applied_coupon.is_some() {
            Self::Applied
        } else {
            Self::NoCoupon
        }
    }
}

/// Markers of calls in flight.
///
/// Kept behind a blocking lock so a call that is dropped before it
/// completes can still reset them.
#[derive(Debug, Default)]
struct Pending {
    updating_item: Option<String>,
    coupon_phase: CouponPhase,
}

fn lock(pending: &Mutex<Pending>) -> MutexGuard<'_, Pending> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Names a product as updating until dropped.
struct UpdatingItem<'a> {
    pending: &'a Mutex<Pending>,
    product_id: String,
}

impl<'a> UpdatingItem<'a> {
    fn mark(pending: &'a Mutex<Pending>, product_id: &str) -> Self {
        lock(pending).updating_item = Some(product_id.to_string());
        Self {
            pending,
            product_id: product_id.to_string(),
        }
    }
}

impl Drop for UpdatingItem<'_> {
    fn drop(&mut self) {
        let mut pending = lock(self.pending);
        // A later update of the same product may own the marker by now.
        if pending.updating_item.as_deref() == Some(self.product_id.as_str()) {
            pending.updating_item = None;
        }
    }
}

/// Holds the coupon flow in `Applying` or `Removing` for one call.
///
/// On drop the phase becomes the one passed to [`Self::settle`], or the
/// phase held before the call if it never settled.
struct CouponTransition<'a> {
    pending: &'a Mutex<Pending>,
    settled: CouponPhase,
}

impl<'a> CouponTransition<'a> {
    fn enter(pending: &'a Mutex<Pending>, phase: CouponPhase) -> Self {
        let settled = std::mem::replace(&mut lock(pending).coupon_phase, phase);
        Self { pending, settled }
    }

    fn settle(mut self, phase: CouponPhase) {
        self.settled = phase;
    }
}

impl Drop for CouponTransition<'_> {
    fn drop(&mut self) {
        lock(self.pending).coupon_phase = self.settled;
    }
}

/// Local mirror of the remote cart.
pub struct CartStore {
    api: Arc<dyn RemoteApi>,
    cart: RwLock<Cart>,
    pending: Mutex<Pending>,
    operations: OperationTracker<CartOperation>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &self.cart)
            .field("pending", &self.pending)
            .field("operations", &self.operations)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self {
            api,
            cart: RwLock::new(Cart::default()),
            pending: Mutex::new(Pending::default()),
            operations: OperationTracker::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    pub async fn cart(&self) -> Cart {
        self.cart.read().await.clone()
    }

    /// Message of the most recent failed operation.
    pub async fn error(&self) -> Option<String> {
        self.operations.error().await
    }

    /// Product whose quantity update is in flight, if any.
    pub async fn updating_item(&self) -> Option<String> {
        lock(&self.pending).updating_item.clone()
    }

    pub async fn coupon_phase(&self) -> CouponPhase {
        lock(&self.pending).coupon_phase
    }

    pub fn status(&self, op: CartOperation) -> OperationStatus {
        self.operations.status(op)
    }

    pub fn is_loading(&self) -> bool {
        self.operations.is_loading()
    }

    pub async fn clear_error(&self) {
        self.operations.clear_error().await;
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    /// Replaces the local cart with the server's.
    ///
    /// Accepts the snapshot nested under `cart` or flat.
    pub async fn fetch_cart(&self) -> Result<Cart, StoreError> {
        let op = CartOperation::Fetch;
        let call = self.operations.begin(op).await;

        let result = self.load_cart().await;

        let cart = call.finish(result).await?;
        let mut local = self.cart.write().await;
        *local = cart.clone();
        lock(&self.pending).coupon_phase = CouponPhase::settled(&cart);

        Ok(cart)
    }

    /// Adds `quantity` units of a product.
    ///
    /// Stock is not checked here; the server may refuse. The local cart
    /// changes only if the response carries a `cart` snapshot.
    pub async fn add_item(&self, product_id: &str, quantity: u32) -> Result<Cart, StoreError> {
        let call = self.operations.begin(CartOperation::AddItem).await;
        if quantity == 0 {
            return call.finish(Err(StoreError::InvalidQuantity)).await;
        }

        let body = AddItemRequest {
            product_id,
            quantity,
        };
        self.mutate_items(call, Method::POST, "/cart/items".into(), Some(body))
            .await
    }

    /// Sets the quantity of one line.
    ///
    /// While the call is in flight, [`Self::updating_item`] names the
    /// product so its controls can be disabled. Other lines are unaffected.
    pub async fn update_item_quantity(
        &self,
        product_id: &str,
        quantity: u32,
    ) -> Result<Cart, StoreError> {
        let call = self.operations.begin(CartOperation::UpdateQuantity).await;
        if quantity == 0 {
            return call.finish(Err(StoreError::InvalidQuantity)).await;
        }

        let _marker = UpdatingItem::mark(&self.pending, product_id);
        self.mutate_items(
            call,
            Method::PUT,
            format!("/cart/items/{product_id}"),
            Some(UpdateQuantityRequest { quantity }),
        )
        .await
    }

    pub async fn remove_item(&self, product_id: &str) -> Result<Cart, StoreError> {
        let call = self.operations.begin(CartOperation::RemoveItem).await;
        self.mutate_items::<()>(call, Method::DELETE, format!("/cart/items/{product_id}"), None)
            .await
    }

    /// Empties the cart remotely, then locally.
    pub async fn clear_cart(&self) -> Result<(), StoreError> {
        let op = CartOperation::Clear;
        let call = self.operations.begin(op).await;

        let result = self
            .api
            .send(Method::DELETE, "/cart", None)
            .await
            .map(drop)
            .map_err(StoreError::from);
        call.finish(result).await?;

        *self.cart.write().await = Cart::default();
        lock(&self.pending).coupon_phase = CouponPhase::NoCoupon;
        info!("cart cleared");

        Ok(())
    }

    /// Submits a coupon code, upper-cased.
    ///
    /// Only one coupon can be applied at a time; a second code is refused
    /// locally until the first is removed. On rejection the applied coupon
    /// is left as it was and the server's message becomes the error.
    pub async fn apply_coupon(&self, code: &str) -> Result<Cart, StoreError> {
        let op = CartOperation::ApplyCoupon;
        let call = self.operations.begin(op).await;

        let code = match self.coupon_to_apply(code).await {
            Ok(code) => code,
            Err(error) => return call.finish(Err(error)).await,
        };
        let transition = CouponTransition::enter(&self.pending, CouponPhase::Applying);

        let result = self.submit_coupon(&code).await;

        let outcome = call.finish(result).await;
        let mut cart = self.cart.write().await;

        match outcome {
            Ok((payload, top_level)) => {
                *cart = merge_applied_coupon(&cart, payload, top_level);
                transition.settle(CouponPhase::settled(&cart));
                info!(%code, discount = cart.discount, "coupon applied");
                Ok(cart.clone())
            }
            Err(error) => {
                transition.settle(CouponPhase::settled(&cart));
                Err(error)
            }
        }
    }

    /// Removes the applied coupon.
    pub async fn remove_coupon(&self) -> Result<Cart, StoreError> {
        let op = CartOperation::RemoveCoupon;
        let call = self.operations.begin(op).await;
        let transition = CouponTransition::enter(&self.pending, CouponPhase::Removing);

        let result = self.request_coupon_removal().await;

        let outcome = call.finish(result).await;
        let mut cart = self.cart.write().await;

        match outcome {
            Ok(payload) => {
                *cart = merge_removed_coupon(&cart, payload);
                transition.settle(CouponPhase::NoCoupon);
                info!("coupon removed");
                Ok(cart.clone())
            }
            Err(error) => {
                transition.settle(CouponPhase::settled(&cart));
                Err(error)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Sends an item mutation and applies the nested snapshot, if any.
    async fn mutate_items<B: Serialize>(
        &self,
        call: InFlight<'_, CartOperation>,
        method: Method,
        path: String,
        body: Option<B>,
    ) -> Result<Cart, StoreError> {
        let op = call.op();
        let result = self.send_item_mutation(method, &path, body).await;

        let snapshot = call.finish(result).await?;
        let mut cart = self.cart.write().await;

        match snapshot {
            Some(payload) => {
                *cart = replace_cart(payload);
                lock(&self.pending).coupon_phase = CouponPhase::settled(&cart);
            }
            None => warn!(?op, "response carried no cart snapshot, keeping local cart"),
        }

        Ok(cart.clone())
    }

    /// Normalises `code`, refusing a blank code or a second coupon.
    async fn coupon_to_apply(&self, code: &str) -> Result<String, StoreError> {
        let code = normalize_coupon_code(code);
        if code.is_empty() {
            return Err(StoreError::EmptyCouponCode);
        }

        match &self.cart.read().await.applied_coupon {
            Some(applied) => Err(StoreError::CouponAlreadyApplied(applied.code.clone())),
            None => Ok(code),
        }
    }

    async fn load_cart(&self) -> Result<Cart, StoreError> {
        let body = self.api.send(Method::GET, "/cart", None).await?;
        Ok(replace_cart(decode_cart_payload(body)?))
    }

    async fn submit_coupon(&self, code: &str) -> Result<(CartPayload, Option<Coupon>), StoreError> {
        let body = serde_json::to_value(ApplyCouponRequest { code })?;
        let response = self.api.send(Method::POST, "/cart/coupon", Some(body)).await?;
        let top_level = top_level_coupon(&response);
        Ok((decode_cart_payload(response)?, top_level))
    }

    async fn request_coupon_removal(&self) -> Result<CartPayload, StoreError> {
        let response = self.api.send(Method::DELETE, "/cart/coupon", None).await?;
        Ok(decode_cart_payload(response)?)
    }

    async fn send_item_mutation<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<Option<CartPayload>, StoreError> {
        let body = body.map(serde_json::to_value).transpose()?;
        let response = self.api.send(method, path, body).await?;
        Ok(nested_cart_payload(&response)?)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        error::{ApiError, Rejection},
        transport::MockRemoteApi,
    };
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::time::timeout;

    /// A backend that never answers.
    struct Unresponsive;

    #[async_trait]
    impl RemoteApi for Unresponsive {
        async fn send(&self, _: Method, _: &str, _: Option<Value>) -> Result<Value, ApiError> {
            std::future::pending().await
        }
    }

    fn snapshot() -> Value {
        json!({
            "items": [
                { "id": "i1", "product": { "id": "pA", "name": "Kettle", "price": 100.0, "stock": 5 }, "quantity": 1 },
                { "id": "i2", "product": { "id": "pB", "name": "Mug", "price": 50.0, "stock": 10 }, "quantity": 2 }
            ],
            "subtotal": 200.0,
            "tax": 36.0,
            "discount": 0.0,
            "total": 236.0
        })
    }

    fn store_with(api: MockRemoteApi) -> CartStore {
        CartStore::new(Arc::new(api))
    }

    fn rejected(body: Value) -> ApiError {
        ApiError::Rejected {
            status: 400,
            rejection: Rejection::from_body(&body),
        }
    }

    #[tokio::test]
    async fn fetch_keeps_server_numbers_verbatim() {
        let mut api = MockRemoteApi::new();
        api.expect_send()
            .withf(|method, path, body| *method == Method::GET && path == "/cart" && body.is_none())
            .times(1)
            .returning(|_, _, _| Ok(json!({ "cart": snapshot() })));

        let store = store_with(api);
        let cart = store.fetch_cart().await.unwrap();

        assert_eq!(cart.items.len(), 2);
        assert_eq!(
            (cart.subtotal, cart.tax, cart.discount, cart.total),
            (200.0, 36.0, 0.0, 236.0)
        );
        assert_eq!(store.cart().await, cart);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn failed_fetch_leaves_cart_and_records_error() {
        let mut api = MockRemoteApi::new();
        let mut calls = 0;
        api.expect_send().times(2).returning(move |_, _, _| {
            calls += 1;
            if calls == 1 {
                Ok(snapshot())
            } else {
                Err(rejected(json!({})))
            }
        });

        let store = store_with(api);
        let before = store.fetch_cart().await.unwrap();
        assert!(store.fetch_cart().await.is_err());

        assert_eq!(store.cart().await, before);
        assert_eq!(store.error().await.as_deref(), Some("Failed to fetch cart"));
        assert_eq!(
            store.status(CartOperation::Fetch).last_error.as_deref(),
            Some("Failed to fetch cart")
        );
    }

    #[tokio::test]
    async fn add_item_without_snapshot_keeps_local_cart() {
        let mut api = MockRemoteApi::new();
        api.expect_send()
            .withf(|method, path, body| {
                *method == Method::POST
                    && path == "/cart/items"
                    && body == &Some(json!({ "productId": "pA", "quantity": 2 }))
            })
            .returning(|_, _, _| Ok(json!({ "success": true, "message": "Added" })));

        let store = store_with(api);
        let cart = store.add_item("pA", 2).await.unwrap();

        assert_eq!(cart, Cart::default());
    }

    #[tokio::test]
    async fn add_item_applies_nested_snapshot() {
        let mut api = MockRemoteApi::new();
        api.expect_send()
            .withf(|method, path, _| *method == Method::POST && path == "/cart/items")
            .times(1)
            .returning(|_, _, _| Ok(json!({ "success": true, "cart": snapshot() })));

        let store = store_with(api);
        let cart = store.add_item("pB", 2).await.unwrap();

        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.items[1].product.name, "Mug");
        assert_eq!(cart.total, 236.0);
        assert_eq!(store.cart().await, cart);
    }

    #[tokio::test]
    async fn add_item_rejects_zero_quantity_without_a_request() {
        let store = store_with(MockRemoteApi::new());
        assert!(matches!(
            store.add_item("pA", 0).await,
            Err(StoreError::InvalidQuantity)
        ));

        assert_eq!(store.error().await.as_deref(), Some("quantity must be at least 1"));
        assert_eq!(
            store.status(CartOperation::AddItem).last_error.as_deref(),
            Some("quantity must be at least 1")
        );
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn update_clears_marker_after_failure() {
        let mut api = MockRemoteApi::new();
        api.expect_send()
            .withf(|method, path, body| {
                *method == Method::PUT
                    && path == "/cart/items/pA"
                    && body == &Some(json!({ "quantity": 3 }))
            })
            .returning(|_, _, _| Err(rejected(json!("Only 2 left in stock"))));

        let store = store_with(api);
        assert!(store.update_item_quantity("pA", 3).await.is_err());

        assert_eq!(store.updating_item().await, None);
        assert_eq!(store.error().await.as_deref(), Some("Only 2 left in stock"));
    }

    #[tokio::test]
    async fn abandoned_update_releases_marker() {
        let store = CartStore::new(Arc::new(Unresponsive));

        let result = timeout(Duration::from_millis(50), store.update_item_quantity("pA", 2)).await;

        assert!(result.is_err());
        assert_eq!(store.updating_item().await, None);
        assert!(!store.status(CartOperation::UpdateQuantity).is_loading());
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn abandoned_coupon_call_restores_phase() {
        let store = CartStore::new(Arc::new(Unresponsive));

        let result = timeout(Duration::from_millis(50), store.apply_coupon("SAVE10")).await;

        assert!(result.is_err());
        assert_eq!(store.coupon_phase().await, CouponPhase::NoCoupon);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn remove_item_replaces_cart_from_snapshot() {
        let mut api = MockRemoteApi::new();
        api.expect_send()
            .withf(|method, path, _| *method == Method::DELETE && path == "/cart/items/pB")
            .returning(|_, _, _| {
                Ok(json!({ "cart": { "items": [], "subtotal": 0, "tax": 0, "total": 0 } }))
            });

        let store = store_with(api);
        let cart = store.remove_item("pB").await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn apply_coupon_uses_server_discount_and_upper_cases_code() {
        let mut api = MockRemoteApi::new();
        api.expect_send()
            .withf(|method, path, body| {
                *method == Method::POST
                    && path == "/cart/coupon"
                    && body == &Some(json!({ "code": "SAVE10" }))
            })
            .returning(|_, _, _| {
                Ok(json!({
                    "cart": {
                        "subtotal": 200.0, "tax": 36.0, "discount": 23.6, "total": 212.4,
                        "coupon": { "code": "SAVE10", "discountPercentage": 10 }
                    }
                }))
            });

        let store = store_with(api);
        let cart = store.apply_coupon("save10").await.unwrap();

        assert_eq!(cart.discount, 23.6);
        assert_eq!(cart.applied_coupon.unwrap().code, "SAVE10");
        assert_eq!(store.coupon_phase().await, CouponPhase::Applied);
    }

    #[tokio::test]
    async fn structured_coupon_rejection_surfaces_its_message() {
        let mut api = MockRemoteApi::new();
        api.expect_send()
            .returning(|_, _, _| Err(rejected(json!({ "message": "Coupon expired" }))));

        let store = store_with(api);
        let error = store.apply_coupon("bad").await.unwrap_err();

        assert_eq!(error.user_message("x"), "Coupon expired");
        assert_eq!(store.error().await.as_deref(), Some("Coupon expired"));
        assert!(store.cart().await.applied_coupon.is_none());
        assert_eq!(store.coupon_phase().await, CouponPhase::NoCoupon);
    }

    #[tokio::test]
    async fn second_coupon_is_refused_until_removed() {
        let mut api = MockRemoteApi::new();
        let mut calls = 0;
        api.expect_send().times(3).returning(move |method, _, _| {
            calls += 1;
            match (calls, method) {
                (1, _) => Ok(json!({ "coupon": { "code": "SAVE10" }, "discount": 10.0 })),
                (2, m) if m == Method::DELETE => {
                    Ok(json!({ "subtotal": 200.0, "tax": 36.0, "discount": 0 }))
                }
                _ => Ok(json!({ "coupon": { "code": "FEST5" }, "discount": 5.0 })),
            }
        });

        let store = store_with(api);
        store.apply_coupon("SAVE10").await.unwrap();

        assert!(matches!(
            store.apply_coupon("FEST5").await,
            Err(StoreError::CouponAlreadyApplied(code)) if code == "SAVE10"
        ));
        assert_eq!(
            store.error().await.as_deref(),
            Some("coupon SAVE10 is already applied, remove it first")
        );
        assert_eq!(
            store.status(CartOperation::ApplyCoupon).last_error.as_deref(),
            Some("coupon SAVE10 is already applied, remove it first")
        );
        assert_eq!(store.coupon_phase().await, CouponPhase::Applied);

        let cart = store.remove_coupon().await.unwrap();
        assert!(cart.applied_coupon.is_none());
        assert_eq!(cart.discount, 0.0);
        assert_eq!(cart.total, 236.0);

        let cart = store.apply_coupon("fest5").await.unwrap();
        assert_eq!(cart.applied_coupon.unwrap().code, "FEST5");
    }

    #[tokio::test]
    async fn failed_removal_keeps_coupon_applied() {
        let mut api = MockRemoteApi::new();
        let mut calls = 0;
        api.expect_send().times(2).returning(move |_, _, _| {
            calls += 1;
            if calls == 1 {
                Ok(json!({ "coupon": { "code": "SAVE10" }, "discount": 10.0 }))
            } else {
                Err(rejected(Value::Null))
            }
        });

        let store = store_with(api);
        store.apply_coupon("SAVE10").await.unwrap();
        assert!(store.remove_coupon().await.is_err());

        assert_eq!(store.coupon_phase().await, CouponPhase::Applied);
        assert_eq!(store.error().await.as_deref(), Some("Failed to remove coupon"));
        assert_eq!(store.cart().await.discount, 10.0);
    }

    #[tokio::test]
    async fn clear_empties_cart_only_after_success() {
        let mut api = MockRemoteApi::new();
        let mut calls = 0;
        api.expect_send().times(3).returning(move |method, _, _| {
            calls += 1;
            match calls {
                1 => Ok(snapshot()),
                2 => Err(rejected(json!("Server busy"))),
                _ => {
                    assert_eq!(method, Method::DELETE);
                    Ok(Value::Null)
                }
            }
        });

        let store = store_with(api);
        store.fetch_cart().await.unwrap();

        assert!(store.clear_cart().await.is_err());
        assert_eq!(store.cart().await.items.len(), 2);

        store.clear_cart().await.unwrap();
        assert_eq!(store.cart().await, Cart::default());
    }
}
