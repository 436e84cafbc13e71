//! HTTP surface of the storefront.
//!
//! ## Routes (prefix `/api/v1`)
//! - catalog: `GET /products`, `GET /products/:slug`, `GET /categories`, `POST /basket/quote`
//! - checkout: `POST /checkout`, `POST /webhooks/payments`
//! - account: `GET /orders`, `GET /orders/:order_number`, `GET|POST /wishlist`,
//!   `DELETE /wishlist/:product_id`
//! - reviews: `GET|POST /reviews`, `POST /reviews/:id/helpful`
//! - `POST /newsletter`
//!
//! `GET /health` and `GET /ready` sit at the root.

use axum::{
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::checkout::{CheckoutService, CheckoutSettings};
use crate::ports::{ContentStore, EventPublisher, InstallmentStore, PaymentGateway};
use crate::webhook::{SignatureVerifier, WebhookProcessor};

pub mod account;
pub mod catalog;
pub mod checkout;
pub mod extract;
pub mod health;
pub mod reviews;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub content: Arc<dyn ContentStore>,
    pub checkout: CheckoutService,
    pub webhooks: WebhookProcessor,
    pub verifier: SignatureVerifier,
}

/// The external systems the state is wired to.
pub struct Backends {
    pub content: Arc<dyn ContentStore>,
    pub payments: Arc<dyn PaymentGateway>,
    pub installments: Arc<dyn InstallmentStore>,
    pub events: Arc<dyn EventPublisher>,
}

impl AppState {
    pub fn new(db: PgPool, backends: Backends, settings: CheckoutSettings, verifier: SignatureVerifier) -> Self {
        let webhooks = WebhookProcessor::new(
            backends.content.clone(),
            backends.payments.clone(),
            backends.installments,
            backends.events,
            settings.currency.clone(),
        );
        let checkout = CheckoutService::new(backends.content.clone(), backends.payments, settings);
        Self { db, content: backends.content, checkout, webhooks, verifier }
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/products", get(catalog::list_products))
        .route("/products/:slug", get(catalog::get_product))
        .route("/categories", get(catalog::list_categories))
        .route("/basket/quote", post(catalog::quote_basket))
        .route("/checkout", post(checkout::create_checkout))
        .route("/webhooks/payments", post(checkout::payment_webhook))
        .route("/orders", get(account::list_orders))
        .route("/orders/:order_number", get(account::get_order))
        .route("/wishlist", get(account::get_wishlist).post(account::add_wishlist_item))
        .route("/wishlist/:product_id", delete(account::remove_wishlist_item))
        .route("/reviews", get(reviews::list_reviews).post(reviews::create_review))
        .route("/reviews/:id/helpful", post(reviews::vote_helpful))
        .route("/newsletter", post(account::subscribe_newsletter));

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
