//! Payment gateway adapters
//!
//! Two independent providers share one contract: turn an order into a
//! provider-specific payment request, and map the provider's webhook
//! vocabulary onto [`crate::order::OrderStatus`]. Neither adapter ever moves
//! an order to `paid` by itself — that is the webhook receivers' job.

pub mod liqpay;
pub mod stripe;

pub use liqpay::LiqpayGateway;
pub use stripe::{CardGateway, CardPaymentRequest, StripeGateway};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Provider credentials are absent — an operational condition, not a
    /// client error (mapped to 503).
    #[error("gateway not configured: {0}")]
    NotConfigured(&'static str),
    /// The provider rejected or failed the request (mapped to 502).
    #[error("provider request failed: {0}")]
    Upstream(String),
}

impl From<GatewayError> for crate::error::AppError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::NotConfigured(p) => crate::error::AppError::NotConfigured(p.to_string()),
            GatewayError::Upstream(msg) => crate::error::AppError::Upstream(msg),
        }
    }
}
