//! Order model
//!
//! The order is the durable unit of truth for a checkout: created `pending`,
//! moved to `processing` when a payment request is issued, and resolved to a
//! terminal status exclusively by the provider webhooks.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order status
///
/// `Paid`, `Failed`, `Refunded` and `Cancelled` are terminal for the
/// webhook-driven path: once reached, no later webhook moves the order back
/// to a non-terminal status. The only terminal-to-terminal transition is
/// `Paid` → `Refunded` (provider reversal).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Paid,
    Failed,
    Refunded,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Paid | Self::Failed | Self::Refunded | Self::Cancelled
        )
    }
}

/// Payment provider used for an order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    Stripe,
    Liqpay,
}

/// Supported settlement currencies
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Uah,
    Eur,
}

impl Currency {
    /// ISO 4217 alphabetic code, as sent to both providers
    pub fn code(&self) -> &'static str {
        match self {
            Self::Uah => "UAH",
            Self::Eur => "EUR",
        }
    }
}

/// Order line item (service, product or booking slot)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    /// Unit price in major currency units
    pub price: Decimal,
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_time: Option<String>,
}

/// Customer details captured at checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub currency: Currency,
    pub customer: Customer,
    pub status: OrderStatus,
    pub payment_provider: Option<PaymentProvider>,
    /// Provider-assigned payment reference, opaque to us
    pub payment_intent_id: Option<String>,
    /// Raw provider status string from the last webhook, opaque to us
    pub payment_status: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Create-order payload accepted by the store
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub currency: Currency,
    pub customer: Customer,
    pub notes: Option<String>,
}

/// Partial order update; `None` fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    pub payment_provider: Option<PaymentProvider>,
    pub payment_intent_id: Option<String>,
    pub payment_status: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Public view of an order for unauthenticated status polling.
///
/// Payment internals (`payment_provider`, `payment_intent_id`,
/// `payment_status`) are deliberately absent.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: String,
    pub order_number: String,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl From<Order> for OrderView {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            order_number: o.order_number,
            status: o.status,
            items: o.items,
            subtotal: o.subtotal,
            total: o.total,
            currency: o.currency,
            created_at: o.created_at,
            paid_at: o.paid_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(OrderStatus::Paid.is_terminal());
        assert!(OrderStatus::Failed.is_terminal());
        assert!(OrderStatus::Refunded.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Processing).unwrap(),
            "\"processing\""
        );
        assert_eq!(serde_json::to_string(&Currency::Uah).unwrap(), "\"UAH\"");
    }

    #[test]
    fn view_hides_payment_internals() {
        let order = Order {
            id: "o1".into(),
            order_number: "ORD-1".into(),
            items: vec![],
            subtotal: Decimal::new(100000, 2),
            total: Decimal::new(100000, 2),
            currency: Currency::Uah,
            customer: Customer {
                first_name: "Olena".into(),
                last_name: "K".into(),
                email: "olena@example.com".into(),
                phone: "+380001112233".into(),
                address: None,
                city: None,
                country: None,
                postal_code: None,
            },
            status: OrderStatus::Processing,
            payment_provider: Some(PaymentProvider::Stripe),
            payment_intent_id: Some("pi_123".into()),
            payment_status: Some("requires_confirmation".into()),
            paid_at: None,
            notes: None,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(OrderView::from(order)).unwrap();
        assert!(json.get("paymentIntentId").is_none());
        assert!(json.get("paymentProvider").is_none());
        assert!(json.get("paymentStatus").is_none());
        assert_eq!(json["orderNumber"], "ORD-1");
    }
}
