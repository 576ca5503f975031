//! Payment request handlers
//!
//! Both create a provider payment request for an existing order and mark it
//! `processing` with the provider attached. Neither ever reports `paid` —
//! the final state is driven exclusively by the webhooks. A retry from
//! `pending` or `processing` may switch providers (the later request
//! overwrites `payment_provider`); an order in a terminal status is settled
//! and answers 409.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::order::{Order, OrderStatus, OrderUpdate, PaymentProvider};
use crate::payments::liqpay::CheckoutRequest;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPaymentBody {
    pub order_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPaymentResponse {
    pub client_secret: String,
    pub payment_intent_id: String,
}

/// Look up the order and check it can still accept a payment request.
///
/// A terminal order is settled; issuing a fresh payment request for it would
/// move it back to `processing` and open a double-charge window. Retrying
/// from `pending`/`processing` is allowed (a failed attempt may switch
/// providers).
async fn load_payable_order(
    state: &AppState,
    order_id: Option<String>,
) -> Result<Order, AppError> {
    let id = order_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::validation("Missing orderId"))?;
    let order = state
        .store
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))?;

    if order.status.is_terminal() {
        tracing::warn!(order_id = %order.id, status = ?order.status, "Payment request for settled order rejected");
        return Err(AppError::conflict(format!(
            "Order {id} is already settled"
        )));
    }

    Ok(order)
}

/// POST /api/payments/stripe
pub async fn create_card_payment(
    State(state): State<AppState>,
    Json(body): Json<CardPaymentBody>,
) -> AppResult<Json<CardPaymentResponse>> {
    let order = load_payable_order(&state, body.order_id).await?;

    let gateway = state
        .cards
        .as_ref()
        .ok_or(AppError::NotConfigured("stripe".into()))?;

    let request = gateway.create_payment_intent(&order).await?;

    state
        .store
        .update(
            &order.id,
            OrderUpdate {
                status: Some(OrderStatus::Processing),
                payment_provider: Some(PaymentProvider::Stripe),
                payment_intent_id: Some(request.payment_intent_id.clone()),
                ..Default::default()
            },
        )
        .await?;

    tracing::info!(
        order_id = %order.id,
        payment_intent_id = %request.payment_intent_id,
        "Card payment request created"
    );

    Ok(Json(CardPaymentResponse {
        client_secret: request.client_secret,
        payment_intent_id: request.payment_intent_id,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectCheckoutBody {
    pub order_id: Option<String>,
    pub language: Option<String>,
}

/// POST /api/payments/liqpay
pub async fn create_redirect_checkout(
    State(state): State<AppState>,
    Json(body): Json<RedirectCheckoutBody>,
) -> AppResult<Json<CheckoutRequest>> {
    let order = load_payable_order(&state, body.order_id).await?;

    let gateway = state
        .liqpay
        .as_ref()
        .ok_or(AppError::NotConfigured("liqpay".into()))?;

    let request = gateway.create_payment_request(&order, body.language.as_deref())?;

    state
        .store
        .update(
            &order.id,
            OrderUpdate {
                status: Some(OrderStatus::Processing),
                payment_provider: Some(PaymentProvider::Liqpay),
                ..Default::default()
            },
        )
        .await?;

    tracing::info!(order_id = %order.id, "Redirect checkout request created");

    Ok(Json(request))
}
