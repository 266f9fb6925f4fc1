//! Checkout route handlers.
//!
//! Customer details are submitted as JSON and validated in one pass; a 422
//! response lists every violation. Payment then completes in one of two ways
//! depending on the configured gateway:
//!
//! - `sandbox`: `POST /checkout/payment` charges server-side.
//! - `widget`: the browser captures payment and relays the outcome to
//!   `POST /checkout/payment/callback`.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use sleek_shop_core::{
    CheckoutAction, CheckoutError, CheckoutPhase, CustomerInfo, OrderRecord, PaymentFailure,
    PaymentProvider, PaymentReference, PaymentResult, Price,
};
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::routes::cart::CartView;
use crate::routes::{current_shopper, resume_or_start_shopper};
use crate::services::{PaymentInFlight, ShopperSession};
use crate::state::AppState;

/// Checkout display data.
#[derive(Debug, Serialize)]
pub struct CheckoutView {
    pub phase: CheckoutPhase,
    pub cart: CartView,
    pub customer: Option<CustomerInfo>,
    /// Amount frozen at submit, while awaiting payment.
    pub payment_amount: Option<Price>,
    /// Reason of the last declined attempt.
    pub last_failure: Option<String>,
    pub payment_in_flight: bool,
    pub payment_provider: &'static str,
    pub widget_client_id: Option<String>,
}

impl CheckoutView {
    fn build(state: &AppState, shopper: Option<&ShopperSession>) -> Self {
        let payments = state.payments();
        let mut view = Self {
            phase: CheckoutPhase::Editing,
            cart: CartView::empty(),
            customer: None,
            payment_amount: None,
            last_failure: None,
            payment_in_flight: false,
            payment_provider: payments.name(),
            widget_client_id: payments.widget_client_id().map(String::from),
        };
        if let Some(shopper) = shopper {
            view.phase = shopper.checkout.phase();
            view.cart = CartView::from(&shopper.cart);
            view.customer = shopper.checkout.customer().cloned();
            view.payment_amount = shopper.checkout.payment_amount();
            view.last_failure = shopper
                .checkout
                .last_failure()
                .map(|failure| failure.reason.clone());
            view.payment_in_flight = shopper.payment_in_flight;
        }
        view
    }
}

/// Result of a payment attempt.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentOutcomeView {
    Placed { order: OrderRecord },
    Declined { reason: String },
}

impl From<PaymentResult> for PaymentOutcomeView {
    fn from(result: PaymentResult) -> Self {
        match result {
            PaymentResult::Placed(order) => Self::Placed { order },
            PaymentResult::Declined(failure) => Self::Declined {
                reason: failure.reason,
            },
        }
    }
}

/// Outcome reported by the browser payment widget.
#[derive(Debug, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PaymentCallback {
    Approved { reference: String },
    Failed { reason: String },
}

/// Display the checkout.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CheckoutView>> {
    let view = match current_shopper(&state, &session).await? {
        Some(shopper) => CheckoutView::build(&state, Some(&*shopper.lock().await)),
        None => CheckoutView::build(&state, None),
    };
    Ok(Json(view))
}

/// Submit customer details and freeze the amount to charge.
#[instrument(skip_all)]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Json(customer): Json<CustomerInfo>,
) -> Result<Json<CheckoutView>> {
    let shopper = resume_or_start_shopper(&state, &session).await?;
    let mut guard = shopper.lock().await;
    let session_state = &mut *guard;

    if session_state.payment_in_flight {
        return Err(PaymentInFlight.into());
    }

    let amount = session_state
        .checkout
        .submit(customer, &session_state.cart)?;
    add_breadcrumb("checkout", "Submitted details", &[("amount", amount.to_string())]);

    Ok(Json(CheckoutView::build(&state, Some(&*session_state))))
}

/// Charge the frozen amount through the server-side provider.
///
/// The shopper session is unlocked while the provider runs, so cart routes
/// stay responsive. The charge runs on its own task and its outcome is
/// applied even if the client goes away.
#[instrument(skip_all)]
pub async fn pay(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<PaymentOutcomeView>> {
    let Some(provider) = state.payments().server_side().cloned() else {
        return Err(AppError::Conflict(
            "payment is captured by the browser widget".to_string(),
        ));
    };

    let shopper = resume_or_start_shopper(&state, &session).await?;
    let amount = {
        let mut guard = shopper.lock().await;
        if guard.payment_in_flight {
            return Err(PaymentInFlight.into());
        }
        let Some(amount) = guard.checkout.payment_amount() else {
            let phase = guard.checkout.phase();
            warn!(%phase, "payment requested outside awaiting payment");
            return Err(CheckoutError::InvalidTransition {
                phase,
                action: CheckoutAction::Pay,
            }
            .into());
        };
        guard.payment_in_flight = true;
        amount
    };

    info!(%amount, provider = state.payments().name(), "charging");
    let task_shopper = Arc::clone(&shopper);
    let charge = tokio::spawn(async move {
        let outcome = provider.initiate(amount).await;
        let mut guard = task_shopper.lock().await;
        guard.payment_in_flight = false;
        guard.apply_payment(outcome)
    });

    match charge.await {
        Ok(result) => Ok(Json(result?.into())),
        Err(e) => {
            shopper.lock().await.payment_in_flight = false;
            Err(AppError::Internal(format!("payment task failed: {e}")))
        }
    }
}

/// Apply a payment outcome relayed by the browser widget.
///
/// The reference is recorded as sent; it is not confirmed with the payment
/// processor. Any client holding a session can post an approval and have its
/// order placed, so `widget` mode must only be deployed where orders are
/// reconciled against the processor before fulfilment.
#[instrument(skip_all)]
pub async fn payment_callback(
    State(state): State<AppState>,
    session: Session,
    Json(callback): Json<PaymentCallback>,
) -> Result<Json<PaymentOutcomeView>> {
    if state.payments().server_side().is_some() {
        return Err(AppError::Conflict(
            "payment is captured server-side".to_string(),
        ));
    }

    let outcome = match callback {
        PaymentCallback::Approved { reference } => {
            let reference = reference.trim();
            if reference.is_empty() {
                return Err(AppError::BadRequest(
                    "payment reference is required".to_string(),
                ));
            }
            Ok(PaymentReference::new(reference))
        }
        PaymentCallback::Failed { reason } => Err(PaymentFailure::new(reason)),
    };

    let shopper = resume_or_start_shopper(&state, &session).await?;
    let mut guard = shopper.lock().await;
    if guard.payment_in_flight {
        return Err(PaymentInFlight.into());
    }
    let result = guard.apply_payment(outcome)?;
    Ok(Json(result.into()))
}

/// Show the most recent order placed in this session.
#[instrument(skip(state, session))]
pub async fn confirmation(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<OrderRecord>> {
    let order = match current_shopper(&state, &session).await? {
        Some(shopper) => shopper.lock().await.last_order.clone(),
        None => None,
    };
    order
        .map(Json)
        .ok_or_else(|| AppError::NotFound("no order has been placed".to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sleek_shop_core::Price;

    use crate::config::{PaymentConfig, PaymentProviderKind, StorefrontConfig};
    use crate::testing::Shopper;

    fn customer() -> Value {
        json!({
            "full_name": "Jane Doe",
            "email": "jane@example.com",
            "address1": "1 Main St",
            "city": "Springfield",
            "state": "IL",
            "zip_code": "62701",
            "country": "US",
        })
    }

    fn widget_config() -> StorefrontConfig {
        StorefrontConfig {
            payments: PaymentConfig {
                provider: PaymentProviderKind::Widget,
                sandbox_decline_above: None,
                paypal_client_id: Some("client-abc".to_string()),
            },
            ..StorefrontConfig::local()
        }
    }

    async fn filled_client(config: StorefrontConfig) -> Shopper {
        let mut client = Shopper::new(config);
        for (id, price) in [("A", "3.00"), ("A", "3.00"), ("B", "5.00")] {
            client
                .post(
                    "/cart/add",
                    &json!({"product_id": id, "name": id, "unit_price": price}),
                )
                .await;
        }
        client
    }

    #[tokio::test]
    async fn test_submit_empty_cart_is_422() {
        let mut client = Shopper::new(StorefrontConfig::local());

        let response = client.post("/checkout", &customer()).await;

        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.body["violations"][0]["code"], "empty_cart");
    }

    #[tokio::test]
    async fn test_submit_lists_missing_fields() {
        let mut client = filled_client(StorefrontConfig::local()).await;

        let response = client
            .post("/checkout", &json!({"full_name": "Jane", "email": "not-an-email"}))
            .await;

        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        let fields: Vec<&str> = response.body["violations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["field"].as_str().unwrap())
            .collect();
        assert_eq!(
            fields,
            vec!["address1", "city", "state", "zip_code", "country", "email"]
        );
        assert_eq!(client.get("/checkout").await.body["phase"], "editing");
    }

    #[tokio::test]
    async fn test_sandbox_payment_places_order() {
        let mut client = filled_client(StorefrontConfig::local()).await;

        let submitted = client.post("/checkout", &customer()).await;
        assert_eq!(submitted.status, StatusCode::OK);
        assert_eq!(submitted.body["phase"], "awaiting_payment");
        assert_eq!(submitted.body["payment_amount"], "11.00");

        let paid = client.post("/checkout/payment", &Value::Null).await;
        assert_eq!(paid.status, StatusCode::OK);
        assert_eq!(paid.body["status"], "placed");
        assert_eq!(paid.body["order"]["order_total"], "11.00");
        assert!(
            paid.body["order"]["payment_reference"]
                .as_str()
                .unwrap()
                .starts_with("SANDBOX-")
        );

        assert_eq!(client.get("/cart/count").await.body["count"], 0);
        let confirmation = client.get("/order-confirmation").await;
        assert_eq!(confirmation.status, StatusCode::OK);
        assert_eq!(
            confirmation.body["order_number"],
            paid.body["order"]["order_number"]
        );
    }

    #[tokio::test]
    async fn test_sandbox_decline_keeps_cart() {
        let config = StorefrontConfig {
            payments: PaymentConfig {
                sandbox_decline_above: Some(Price::from_cents(1000).unwrap()),
                ..PaymentConfig::default()
            },
            ..StorefrontConfig::local()
        };
        let mut client = filled_client(config).await;
        client.post("/checkout", &customer()).await;

        let paid = client.post("/checkout/payment", &Value::Null).await;

        assert_eq!(paid.status, StatusCode::OK);
        assert_eq!(paid.body["status"], "declined");
        let checkout = client.get("/checkout").await;
        assert_eq!(checkout.body["phase"], "awaiting_payment");
        assert_eq!(checkout.body["cart"]["item_count"], 3);
        assert!(checkout.body["last_failure"].as_str().is_some());
        assert_eq!(
            client.get("/order-confirmation").await.status,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_pay_before_submit_is_conflict() {
        let mut client = filled_client(StorefrontConfig::local()).await;

        let paid = client.post("/checkout/payment", &Value::Null).await;

        assert_eq!(paid.status, StatusCode::CONFLICT);
        assert_eq!(client.get("/cart/count").await.body["count"], 3);
    }

    #[tokio::test]
    async fn test_widget_mode_refuses_server_charge() {
        let mut client = filled_client(widget_config()).await;
        client.post("/checkout", &customer()).await;

        let paid = client.post("/checkout/payment", &Value::Null).await;

        assert_eq!(paid.status, StatusCode::CONFLICT);
        let checkout = client.get("/checkout").await;
        assert_eq!(checkout.body["payment_provider"], "widget");
        assert_eq!(checkout.body["widget_client_id"], "client-abc");
    }

    #[tokio::test]
    async fn test_widget_callback_replay_rejected() {
        let mut client = filled_client(widget_config()).await;
        client.post("/checkout", &customer()).await;
        let approved = json!({"outcome": "approved", "reference": "PAY123"});

        let first = client.post("/checkout/payment/callback", &approved).await;
        assert_eq!(first.status, StatusCode::OK);
        assert_eq!(first.body["order"]["payment_reference"], "PAY123");

        let replay = client.post("/checkout/payment/callback", &approved).await;
        assert_eq!(replay.status, StatusCode::CONFLICT);

        let confirmation = client.get("/order-confirmation").await;
        assert_eq!(
            confirmation.body["order_number"],
            first.body["order"]["order_number"]
        );
    }

    #[tokio::test]
    async fn test_widget_callback_blank_reference_rejected() {
        let mut client = filled_client(widget_config()).await;
        client.post("/checkout", &customer()).await;

        let response = client
            .post(
                "/checkout/payment/callback",
                &json!({"outcome": "approved", "reference": "  "}),
            )
            .await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(client.get("/checkout").await.body["phase"], "awaiting_payment");
    }

    #[tokio::test]
    async fn test_new_purchase_after_order() {
        let mut client = filled_client(StorefrontConfig::local()).await;
        client.post("/checkout", &customer()).await;
        client.post("/checkout/payment", &Value::Null).await;

        client
            .post(
                "/cart/add",
                &json!({"product_id": "C", "name": "C", "unit_price": "1.00"}),
            )
            .await;
        assert_eq!(client.get("/checkout").await.body["phase"], "editing");

        let submitted = client.post("/checkout", &customer()).await;
        assert_eq!(submitted.status, StatusCode::OK);
        assert_eq!(submitted.body["payment_amount"], "1.00");
    }

    #[tokio::test]
    async fn test_cart_edit_after_submit_requires_resubmit() {
        let mut client = Shopper::new(widget_config());
        client.add("A", "3.00").await;
        let submitted = client.post("/checkout", &customer()).await;
        assert_eq!(submitted.body["payment_amount"], "3.00");

        let added = client.add("B", "500.00").await;
        assert_eq!(added.status, StatusCode::OK);
        let checkout = client.get("/checkout").await;
        assert_eq!(checkout.body["phase"], "editing");
        assert!(checkout.body["payment_amount"].is_null());

        let approved = json!({"outcome": "approved", "reference": "PAY123"});
        let stale = client.post("/checkout/payment/callback", &approved).await;
        assert_eq!(stale.status, StatusCode::CONFLICT);
        assert_eq!(client.get("/cart/count").await.body["count"], 2);

        let resubmitted = client.post("/checkout", &customer()).await;
        assert_eq!(resubmitted.body["payment_amount"], "503.00");
        let placed = client.post("/checkout/payment/callback", &approved).await;
        assert_eq!(placed.status, StatusCode::OK);
        assert_eq!(placed.body["order"]["order_total"], "503.00");
        assert_eq!(placed.body["order"]["lines"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unchanged_cart_keeps_pending_checkout() {
        let mut client = Shopper::new(widget_config());
        client.add("A", "3.00").await;
        client.post("/checkout", &customer()).await;

        let response = client
            .post("/cart/update", &json!({"product_id": "ghost", "quantity": 2}))
            .await;
        assert_eq!(response.status, StatusCode::OK);

        let checkout = client.get("/checkout").await;
        assert_eq!(checkout.body["phase"], "awaiting_payment");
        assert_eq!(checkout.body["payment_amount"], "3.00");
    }

    #[tokio::test]
    async fn test_widget_reference_recorded_as_sent() {
        let mut client = Shopper::new(widget_config());
        client.add("A", "3.00").await;
        client.post("/checkout", &customer()).await;

        let placed = client
            .post(
                "/checkout/payment/callback",
                &json!({"outcome": "approved", "reference": "  x  "}),
            )
            .await;

        assert_eq!(placed.status, StatusCode::OK);
        assert_eq!(placed.body["order"]["payment_reference"], "x");
    }
}
