//! Provider webhook receivers
//!
//! Both follow the same skeleton: authenticate, decode, map the provider
//! vocabulary onto the order lifecycle, apply via [`crate::reconcile`], ack.
//! Providers only look at the status code: 2xx stops their retries, so
//! signature/parse failures answer 4xx and anything transient answers 5xx.
//! No order is ever touched before authentication succeeds.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Form;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;

use crate::order::OrderStatus;
use crate::payments::{liqpay, stripe};
use crate::reconcile::{apply_payment_event, ReconcileError};
use crate::state::AppState;

/// POST /api/webhooks/stripe — raw body, `Stripe-Signature` header
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let Some(secret) = state.card_webhook_secret.as_deref() else {
        tracing::warn!("Stripe webhook received but no signing secret configured");
        return StatusCode::SERVICE_UNAVAILABLE;
    };

    let sig_header = match headers.get("stripe-signature").and_then(|v| v.to_str().ok()) {
        Some(s) => s,
        None => {
            tracing::warn!("Missing Stripe-Signature header");
            return StatusCode::BAD_REQUEST;
        }
    };

    if let Err(e) = stripe::verify_webhook_signature(&body, sig_header, secret) {
        tracing::warn!(error = e, "Stripe webhook signature verification failed");
        return StatusCode::BAD_REQUEST;
    }

    let event: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(%e, "Failed to parse Stripe webhook JSON");
            return StatusCode::BAD_REQUEST;
        }
    };

    let event_type = event["type"].as_str().unwrap_or("");
    let Some(status) = stripe::map_event_type(event_type) else {
        tracing::debug!(event_type = event_type, "Unhandled Stripe event type");
        return StatusCode::OK;
    };

    // payment_intent.* events embed the intent; charge.refunded embeds the
    // charge — both carry our order id in metadata.
    let object = &event["data"]["object"];
    let Some(order_id) = object["metadata"]["order_id"].as_str() else {
        tracing::warn!(event_type = event_type, "Stripe event missing metadata.order_id");
        return StatusCode::BAD_REQUEST;
    };
    let payment_id = object["id"].as_str();

    finish(
        apply_payment_event(
            &state.store,
            &state.notifier,
            order_id,
            status,
            event_type,
            payment_id,
        )
        .await,
    )
}

#[derive(Debug, Deserialize)]
pub struct LiqpayCallback {
    pub data: Option<String>,
    pub signature: Option<String>,
}

/// Decoded fields of interest from the base64 callback envelope
#[derive(Debug, Deserialize)]
struct LiqpayCallbackData {
    order_id: String,
    status: String,
    payment_id: Option<serde_json::Value>,
}

/// POST /api/webhooks/liqpay — form-encoded `data` + `signature`
pub async fn liqpay_webhook(
    State(state): State<AppState>,
    Form(callback): Form<LiqpayCallback>,
) -> StatusCode {
    let Some(gateway) = state.liqpay.as_ref() else {
        tracing::warn!("LiqPay callback received but provider not configured");
        return StatusCode::SERVICE_UNAVAILABLE;
    };

    let (Some(data), Some(signature)) = (callback.data, callback.signature) else {
        tracing::warn!("LiqPay callback missing data or signature");
        return StatusCode::BAD_REQUEST;
    };

    if !gateway.verify(&data, &signature) {
        tracing::warn!("LiqPay callback signature verification failed");
        return StatusCode::BAD_REQUEST;
    }

    let decoded = match BASE64.decode(&data) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(%e, "LiqPay callback data is not valid base64");
            return StatusCode::BAD_REQUEST;
        }
    };
    let payload: LiqpayCallbackData = match serde_json::from_slice(&decoded) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(%e, "Failed to parse LiqPay callback JSON");
            return StatusCode::BAD_REQUEST;
        }
    };

    let status = liqpay::map_status(&payload.status);
    if status == OrderStatus::Pending {
        // Unknown vocabulary deliberately falls back to pending; make the
        // fallback visible instead of silent.
        tracing::warn!(
            raw_status = %payload.status,
            order_id = %payload.order_id,
            "Unrecognized LiqPay status, order left pending"
        );
    }

    let payment_id = payload.payment_id.as_ref().map(|v| match v {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    });

    finish(
        apply_payment_event(
            &state.store,
            &state.notifier,
            &payload.order_id,
            status,
            &payload.status,
            payment_id.as_deref(),
        )
        .await,
    )
}

fn finish(result: Result<crate::reconcile::ReconcileOutcome, ReconcileError>) -> StatusCode {
    match result {
        Ok(_) => StatusCode::OK,
        Err(ReconcileError::OrderNotFound(id)) => {
            // Creation may be racing the webhook; a non-2xx makes the
            // provider retry later.
            tracing::warn!(order_id = %id, "Webhook references unknown order");
            StatusCode::NOT_FOUND
        }
        Err(ReconcileError::Store(e)) => {
            tracing::error!(%e, "Store error applying webhook");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
