//! Application state
//!
//! Every collaborator is constructed once here from validated configuration
//! and injected; there are no process-global gateway clients, so tests build
//! an `AppState` by hand with fakes.

use sqlx::PgPool;
use std::sync::Arc;

use crate::config::Config;
use crate::notify::{EmailNotifier, LogNotifier, Notifier};
use crate::payments::{CardGateway, LiqpayGateway, StripeGateway};
use crate::rate_limit::RateLimiter;
use crate::store::{OrderStore, PgOrderStore};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    /// Durable order storage
    pub store: Arc<dyn OrderStore>,
    /// Confirmation / inquiry delivery
    pub notifier: Arc<dyn Notifier>,
    /// Card payments; `None` when the provider is not configured
    pub cards: Option<Arc<dyn CardGateway>>,
    /// Card provider webhook signing secret
    pub card_webhook_secret: Option<String>,
    /// Redirect checkout; `None` when the provider is not configured
    pub liqpay: Option<LiqpayGateway>,
    /// Counters shared by the public write endpoints
    pub rate_limiter: RateLimiter,
    pub contact_rate_limit: u32,
    pub contact_rate_window_ms: i64,
}

impl AppState {
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;

        let cards: Option<Arc<dyn CardGateway>> = match &config.stripe_secret_key {
            Some(key) => Some(Arc::new(StripeGateway::new(key.clone()))),
            None => {
                tracing::warn!("Stripe not configured, card payments disabled");
                None
            }
        };

        let liqpay = match (&config.liqpay_public_key, &config.liqpay_private_key) {
            (Some(public), Some(private)) => Some(LiqpayGateway::new(
                public.clone(),
                private.clone(),
                config.site_origin.clone(),
            )),
            _ => {
                tracing::warn!("LiqPay not configured, redirect checkout disabled");
                None
            }
        };

        let notifier: Arc<dyn Notifier> = match &config.email_api_key {
            Some(key) => Arc::new(EmailNotifier::new(
                config.email_api_url.clone(),
                key.clone(),
                config.email_from.clone(),
                config.contact_inbox.clone(),
            )),
            None => {
                tracing::warn!("Email API not configured, notifications will be logged only");
                Arc::new(LogNotifier)
            }
        };

        Ok(Self {
            store: Arc::new(PgOrderStore::new(pool)),
            notifier,
            cards,
            card_webhook_secret: config.stripe_webhook_secret.clone(),
            liqpay,
            rate_limiter: RateLimiter::new(),
            contact_rate_limit: config.contact_rate_limit,
            contact_rate_window_ms: config.contact_rate_window_ms,
        })
    }
}
