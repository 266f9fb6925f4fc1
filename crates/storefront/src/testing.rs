//! In-process test harness.
//!
//! Used by this crate's route tests and, through the `test-support`
//! feature, by the integration tests. The router is driven with
//! `tower::ServiceExt::oneshot`; no server or network is needed.

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header, request::Builder},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::config::StorefrontConfig;
use crate::state::AppState;

/// A response with its body decoded as JSON (`Null` when not JSON).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// One browser talking to an in-process storefront.
///
/// Keeps the session cookie between requests.
pub struct Shopper {
    app: Router,
    cookie: Option<String>,
}

impl Shopper {
    /// Start a storefront with `config` and return its first shopper.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        Self {
            app: crate::app(AppState::new(config)),
            cookie: None,
        }
    }

    /// Another shopper on the same storefront, with no session yet.
    #[must_use]
    pub fn another(&self) -> Self {
        Self {
            app: self.app.clone(),
            cookie: None,
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Request::get(uri), Body::empty()).await
    }

    pub async fn post(&mut self, uri: &str, body: &Value) -> TestResponse {
        let request = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
        self.send(request, Body::from(body.to_string())).await
    }

    /// Add one unit of a product priced as a decimal string.
    pub async fn add(&mut self, product_id: &str, unit_price: &str) -> TestResponse {
        let body = json!({
            "product_id": product_id,
            "name": format!("Product {product_id}"),
            "unit_price": unit_price,
            "image_ref": format!("/images/{product_id}.jpg"),
        });
        self.post("/cart/add", &body).await
    }

    async fn send(&mut self, mut request: Builder, body: Body) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = request.body(body).expect("Failed to build request");
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let cookie = set_cookie
                .to_str()
                .expect("Cookie header is ASCII")
                .split(';')
                .next()
                .unwrap_or_default();
            self.cookie = Some(cookie.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        TestResponse {
            status,
            headers,
            body: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
        }
    }
}
