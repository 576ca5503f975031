//! Outbound notifications
//!
//! The core only needs a fire-and-forget contract: given an order (or a
//! contact inquiry), send a message and report success or failure. The
//! production impl posts to an HTTP email API; without an API key the
//! service degrades to logging.

use async_trait::async_trait;
use serde_json::json;

use crate::order::Order;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("email request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("email API rejected the message: {0}")]
    Rejected(String),
}

/// Contact/booking inquiry forwarded to the studio inbox
#[derive(Debug, Clone)]
pub struct ContactInquiry {
    pub inquiry_type: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn order_confirmation(&self, order: &Order) -> Result<(), NotifyError>;
    async fn contact_inquiry(&self, inquiry: &ContactInquiry) -> Result<(), NotifyError>;
}

/// Email notifier over a Resend-style HTTP API (no SDK dependency)
pub struct EmailNotifier {
    api_url: String,
    api_key: String,
    from: String,
    inbox: String,
    client: reqwest::Client,
}

impl EmailNotifier {
    pub fn new(api_url: String, api_key: String, from: String, inbox: String) -> Self {
        Self {
            api_url,
            api_key,
            from,
            inbox,
            client: reqwest::Client::new(),
        }
    }

    async fn send(&self, to: &str, subject: &str, text: String) -> Result<(), NotifyError> {
        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": [to],
                "subject": subject,
                "text": text,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected(format!("{status}: {body}")));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn order_confirmation(&self, order: &Order) -> Result<(), NotifyError> {
        let items = order
            .items
            .iter()
            .map(|i| format!("  {} x{} — {} {}", i.name, i.quantity, i.price, order.currency.code()))
            .collect::<Vec<_>>()
            .join("\n");

        let text = format!(
            "Дякуємо за замовлення, {name}!\n\
             Замовлення {number} підтверджено.\n\n\
             Thank you for your order, {name}!\n\
             Order {number} is confirmed.\n\n\
             {items}\n\n\
             Total: {total} {currency}",
            name = order.customer.full_name(),
            number = order.order_number,
            items = items,
            total = order.total,
            currency = order.currency.code(),
        );

        self.send(
            &order.customer.email,
            &format!("Order {} confirmed", order.order_number),
            text,
        )
        .await?;

        tracing::info!(order_id = %order.id, to = %order.customer.email, "Order confirmation sent");
        Ok(())
    }

    async fn contact_inquiry(&self, inquiry: &ContactInquiry) -> Result<(), NotifyError> {
        let text = format!(
            "New {} inquiry\n\nName: {} {}\nEmail: {}\nPhone: {}\n\n{}",
            inquiry.inquiry_type,
            inquiry.first_name,
            inquiry.last_name,
            inquiry.email,
            inquiry.phone.as_deref().unwrap_or("—"),
            inquiry.message.as_deref().unwrap_or(""),
        );

        self.send(
            &self.inbox,
            &format!("New inquiry: {}", inquiry.inquiry_type),
            text,
        )
        .await?;

        tracing::info!(from = %inquiry.email, "Contact inquiry forwarded");
        Ok(())
    }
}

/// Fallback notifier used when no email API key is configured
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn order_confirmation(&self, order: &Order) -> Result<(), NotifyError> {
        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            to = %order.customer.email,
            "Email disabled, order confirmation logged only"
        );
        Ok(())
    }

    async fn contact_inquiry(&self, inquiry: &ContactInquiry) -> Result<(), NotifyError> {
        tracing::info!(
            inquiry_type = %inquiry.inquiry_type,
            from = %inquiry.email,
            "Email disabled, contact inquiry logged only"
        );
        Ok(())
    }
}
