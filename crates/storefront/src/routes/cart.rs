//! Cart route handlers.
//!
//! Every handler answers with JSON. Mutations also send an
//! `HX-Trigger: cart-updated` header so other widgets on the page (the count
//! badge, the checkout summary) can refresh themselves.

use axum::{
    Json,
    extract::State,
    response::{AppendHeaders, IntoResponse},
};
use serde::{Deserialize, Serialize};
use sleek_shop_core::{CartLine, CartState, Price, ProductId};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::routes::{current_shopper, resume_or_start_shopper};
use crate::state::AppState;

/// Header pair announcing a cart change to the page.
const CART_UPDATED: AppendHeaders<[(&str, &str); 1]> =
    AppendHeaders([("HX-Trigger", "cart-updated")]);

/// One cart line as sent to the client.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub name: String,
    pub image_ref: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_price: Price,
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            name: line.name.clone(),
            image_ref: line.image_ref.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_price: line.line_total,
        }
    }
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u64,
    pub subtotal: Price,
    /// `subtotal` formatted for display, e.g. `$11.00`.
    pub subtotal_display: String,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self::from(&CartState::new())
    }
}

impl From<&CartState> for CartView {
    fn from(cart: &CartState) -> Self {
        Self {
            items: cart.lines().iter().map(CartItemView::from).collect(),
            item_count: cart.total_item_count(),
            subtotal: cart.total_price(),
            subtotal_display: cart.total_price().to_string(),
        }
    }
}

/// Cart count badge data.
#[derive(Debug, Serialize)]
pub struct CartCountView {
    pub count: u64,
}

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    #[serde(default)]
    pub image_ref: String,
}

/// Update cart request body.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Remove from cart request body.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub product_id: ProductId,
}

/// Display the cart.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let cart = match current_shopper(&state, &session).await? {
        Some(shopper) => CartView::from(&shopper.lock().await.cart),
        None => CartView::empty(),
    };
    Ok(Json(cart))
}

/// Add one unit of a product to the cart.
///
/// Adding a product that is already in the cart bumps its quantity and keeps
/// the name, price and image recorded on the first add. Like every cart
/// mutation it answers 409 while a payment is in flight and reopens a
/// checkout that was awaiting payment.
#[instrument(skip_all, fields(product_id = %request.product_id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddToCartRequest>,
) -> Result<impl IntoResponse> {
    let shopper = resume_or_start_shopper(&state, &session).await?;
    let mut guard = shopper.lock().await;
    guard.edit_cart(|cart| {
        cart.add_item(
            request.product_id.clone(),
            request.name,
            request.unit_price,
            request.image_ref,
        )
    })??;

    add_breadcrumb(
        "cart",
        "Added item",
        &[("product_id", request.product_id.into_inner())],
    );
    Ok((CART_UPDATED, Json(CartView::from(&guard.cart))))
}

/// Set a line's quantity. Zero or less removes the line; unknown products
/// are ignored.
#[instrument(skip_all, fields(product_id = %request.product_id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<UpdateCartRequest>,
) -> Result<impl IntoResponse> {
    let shopper = resume_or_start_shopper(&state, &session).await?;
    let mut guard = shopper.lock().await;
    guard.edit_cart(|cart| cart.update_quantity(&request.product_id, request.quantity))??;

    Ok((CART_UPDATED, Json(CartView::from(&guard.cart))))
}

/// Remove a line from the cart.
#[instrument(skip_all, fields(product_id = %request.product_id))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<impl IntoResponse> {
    let shopper = resume_or_start_shopper(&state, &session).await?;
    let mut guard = shopper.lock().await;
    guard.edit_cart(|cart| cart.remove_item(&request.product_id))?;

    Ok((CART_UPDATED, Json(CartView::from(&guard.cart))))
}

/// Get the cart count badge.
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> Result<Json<CartCountView>> {
    let count = match current_shopper(&state, &session).await? {
        Some(shopper) => shopper.lock().await.cart.total_item_count(),
        None => 0,
    };
    Ok(Json(CartCountView { count }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::config::StorefrontConfig;
    use crate::testing::Shopper;

    #[tokio::test]
    async fn test_empty_cart_without_session() {
        let mut client = Shopper::new(StorefrontConfig::local());

        let response = client.get("/cart").await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["item_count"], 0);
        assert_eq!(response.body["subtotal_display"], "$0.00");
        assert!(response.body["items"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_merges_and_triggers_update() {
        let mut client = Shopper::new(StorefrontConfig::local());

        client.add("A", "3.00").await;
        client.add("A", "9.99").await;
        let response = client.add("B", "5.00").await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(
            response.headers.get("HX-Trigger").unwrap(),
            "cart-updated"
        );
        let items = response.body["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["product_id"], "A");
        assert_eq!(items[0]["quantity"], 2);
        assert_eq!(items[0]["unit_price"], "3.00");
        assert_eq!(response.body["item_count"], 3);
        assert_eq!(response.body["subtotal_display"], "$11.00");

        let count = client.get("/cart/count").await;
        assert_eq!(count.body["count"], 3);
    }

    #[tokio::test]
    async fn test_update_and_remove() {
        let mut client = Shopper::new(StorefrontConfig::local());
        client.add("A", "3.00").await;
        client.add("B", "5.00").await;

        let response = client
            .post("/cart/update", &json!({"product_id": "A", "quantity": 4}))
            .await;
        assert_eq!(response.body["item_count"], 5);
        assert_eq!(response.body["subtotal_display"], "$17.00");

        let response = client
            .post("/cart/update", &json!({"product_id": "missing", "quantity": 2}))
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["item_count"], 5);

        let response = client
            .post("/cart/update", &json!({"product_id": "A", "quantity": 0}))
            .await;
        assert_eq!(response.body["items"].as_array().unwrap().len(), 1);

        let response = client
            .post("/cart/remove", &json!({"product_id": "B"}))
            .await;
        assert_eq!(response.body["item_count"], 0);
        assert_eq!(response.body["subtotal_display"], "$0.00");
    }

    #[tokio::test]
    async fn test_negative_price_rejected() {
        let mut client = Shopper::new(StorefrontConfig::local());

        let response = client.add("A", "-1.00").await;

        assert!(response.status.is_client_error());
        assert_eq!(client.get("/cart/count").await.body["count"], 0);
    }

    #[tokio::test]
    async fn test_carts_are_per_session() {
        let mut alice = Shopper::new(StorefrontConfig::local());
        alice.add("A", "3.00").await;

        let mut bob = alice.another();
        assert_eq!(bob.get("/cart/count").await.body["count"], 0);
        assert_eq!(alice.get("/cart/count").await.body["count"], 1);
    }

    #[tokio::test]
    async fn test_oversized_totals_rejected_and_cart_kept() {
        let mut client = Shopper::new(StorefrontConfig::local());
        client.add("A", "100000000000000000000").await;

        let response = client
            .post(
                "/cart/update",
                &json!({"product_id": "A", "quantity": 4_294_967_295_u64}),
            )
            .await;
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.headers.get("HX-Trigger").is_none());
        assert!(response.body["error"].as_str().unwrap().contains("too large"));

        let response = client.add("B", "79228162514264337593543950335").await;
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

        let cart = client.get("/cart").await;
        assert_eq!(cart.body["item_count"], 1);
        assert_eq!(cart.body["items"][0]["quantity"], 1);
        assert_eq!(cart.body["subtotal"], "100000000000000000000");
        assert_eq!(cart.body["items"][0]["line_price"], "100000000000000000000");

        let response = client.add("C", "1.00").await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body["subtotal"], "100000000000000000001.00");
    }
}
