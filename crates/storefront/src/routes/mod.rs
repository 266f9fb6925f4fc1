//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Health check
//!
//! # Cart (JSON, mutations trigger cart-updated)
//! GET  /cart                          - Cart view
//! POST /cart/add                      - Add one unit of a product
//! POST /cart/update                   - Set a line's quantity (<= 0 removes)
//! POST /cart/remove                   - Remove a line
//! GET  /cart/count                    - Total item count
//!
//! # Checkout
//! GET  /checkout                      - Checkout view
//! POST /checkout                      - Submit customer details
//! POST /checkout/payment              - Charge through the server-side provider
//! POST /checkout/payment/callback     - Relay a browser widget outcome
//! GET  /order-confirmation            - Last placed order
//! ```

pub mod cart;
pub mod checkout;

use axum::{
    Router,
    routing::{get, post},
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::Result;
use crate::models::session_keys;
use crate::services::SharedShopperSession;
use crate::state::AppState;

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the shopper id from the session.
async fn get_shopper_id(session: &Session) -> Result<Option<Uuid>> {
    session
        .get::<Uuid>(session_keys::SHOPPER_ID)
        .await
        .map_err(Into::into)
}

/// The shopper session for this browser, if one has been started and has
/// not expired.
pub(crate) async fn current_shopper(
    state: &AppState,
    session: &Session,
) -> Result<Option<SharedShopperSession>> {
    Ok(match get_shopper_id(session).await? {
        Some(id) => state.sessions().get(id).await,
        None => None,
    })
}

/// The shopper session for this browser, starting one if needed.
pub(crate) async fn resume_or_start_shopper(
    state: &AppState,
    session: &Session,
) -> Result<SharedShopperSession> {
    let id = if let Some(id) = get_shopper_id(session).await? {
        id
    } else {
        let id = Uuid::new_v4();
        session.insert(session_keys::SHOPPER_ID, id).await?;
        tracing::debug!(shopper = %id, "assigned shopper id");
        id
    };
    Ok(state.sessions().get_or_create(id).await)
}

// =============================================================================
// Routers
// =============================================================================

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show).post(checkout::submit))
        .route("/payment", post(checkout::pay))
        .route("/payment/callback", post(checkout::payment_callback))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .route("/order-confirmation", get(checkout::confirmation))
}
