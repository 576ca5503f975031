//! HTTP API

pub mod contact;
pub mod health;
pub mod orders;
pub mod payments;
pub mod webhooks;

use axum::routing::{get, post};
use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::rate_limit::contact_rate_limit;
use crate::state::AppState;

/// Build the public router
pub fn create_router(state: AppState) -> Router {
    // Contact/booking submissions sit behind the fixed-window limiter
    let contact = Router::new()
        .route("/api/contact", post(contact::submit))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            contact_rate_limit,
        ));

    // Provider webhooks authenticate themselves by signature
    let webhooks = Router::new()
        .route("/api/webhooks/stripe", post(webhooks::stripe_webhook))
        .route("/api/webhooks/liqpay", post(webhooks::liqpay_webhook));

    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/api/orders",
            post(orders::create_order).get(orders::get_order),
        )
        .route("/api/payments/stripe", post(payments::create_card_payment))
        .route(
            "/api/payments/liqpay",
            post(payments::create_redirect_checkout),
        )
        .merge(webhooks)
        .merge(contact)
        .layer(TraceLayer::new_for_http())
        // The site frontend is served from another origin
        .layer(CorsLayer::permissive())
        .with_state(state)
}
