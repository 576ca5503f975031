//! Stripe card payments via REST API (no SDK dependency)
//!
//! Creates PaymentIntents for the card checkout path and verifies the
//! `Stripe-Signature` header on inbound webhook events.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use sha2::Sha256;

use crate::order::{Order, OrderStatus};

use super::GatewayError;

const API_BASE: &str = "https://api.stripe.com";

/// Opaque handles the client needs to confirm a card payment
#[derive(Debug, Clone)]
pub struct CardPaymentRequest {
    pub client_secret: String,
    pub payment_intent_id: String,
}

/// Card payment gateway, injected so tests can substitute a fake
#[async_trait]
pub trait CardGateway: Send + Sync {
    async fn create_payment_intent(&self, order: &Order)
        -> Result<CardPaymentRequest, GatewayError>;
}

pub struct StripeGateway {
    secret_key: String,
    client: reqwest::Client,
}

impl StripeGateway {
    pub fn new(secret_key: String) -> Self {
        Self {
            secret_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CardGateway for StripeGateway {
    /// Create a PaymentIntent for the order total.
    ///
    /// The intent id is persisted on the order by the caller and later
    /// correlated with the webhook event's `metadata.order_id`.
    async fn create_payment_intent(
        &self,
        order: &Order,
    ) -> Result<CardPaymentRequest, GatewayError> {
        let amount = to_minor_units(order.total)
            .ok_or_else(|| GatewayError::Upstream(format!("amount out of range: {}", order.total)))?;

        let resp: serde_json::Value = self
            .client
            .post(format!("{API_BASE}/v1/payment_intents"))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&[
                ("amount", amount.to_string().as_str()),
                ("currency", &order.currency.code().to_lowercase()),
                ("receipt_email", &order.customer.email),
                ("metadata[order_id]", &order.id),
                ("automatic_payment_methods[enabled]", "true"),
            ])
            .send()
            .await
            .map_err(|e| GatewayError::Upstream(e.to_string()))?
            .json()
            .await
            .map_err(|e| GatewayError::Upstream(e.to_string()))?;

        match (resp["id"].as_str(), resp["client_secret"].as_str()) {
            (Some(id), Some(secret)) => Ok(CardPaymentRequest {
                client_secret: secret.to_string(),
                payment_intent_id: id.to_string(),
            }),
            _ => Err(GatewayError::Upstream(format!(
                "payment_intents response missing id/client_secret: {resp}"
            ))),
        }
    }
}

/// Major units → smallest currency unit. Both supported currencies use two
/// decimal places; half-cent inputs round away from zero, never truncate.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Smallest currency unit → major units
pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

/// Map a Stripe event type onto the order status vocabulary.
/// Returns `None` for event types this service does not react to.
pub fn map_event_type(event_type: &str) -> Option<OrderStatus> {
    match event_type {
        "payment_intent.succeeded" => Some(OrderStatus::Paid),
        "payment_intent.payment_failed" => Some(OrderStatus::Failed),
        "charge.refunded" => Some(OrderStatus::Refunded),
        _ => None,
    }
}

/// Verify a Stripe webhook signature (HMAC-SHA256 over `"{t}.{body}"`).
///
/// Comparison happens inside `Mac::verify_slice`, which is constant-time.
/// Events older than 5 minutes are rejected to prevent replays.
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
) -> Result<(), &'static str> {
    let mut timestamp = "";
    let mut signature = "";
    for part in sig_header.split(',') {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signature = v;
        }
    }

    if timestamp.is_empty() || signature.is_empty() {
        return Err("Invalid Stripe-Signature header");
    }

    let signed_payload = format!("{timestamp}.{}", std::str::from_utf8(payload).unwrap_or(""));
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(signed_payload.as_bytes());

    let sig_bytes = hex::decode(signature).map_err(|_| "Invalid signature hex")?;
    mac.verify_slice(&sig_bytes)
        .map_err(|_| "Webhook signature mismatch")?;

    let ts: i64 = timestamp.parse().map_err(|_| "Invalid timestamp")?;
    let now = chrono::Utc::now().timestamp();
    if (now - ts).abs() > 300 {
        return Err("Webhook timestamp too old");
    }

    Ok(())
}
