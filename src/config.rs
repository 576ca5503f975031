//! Service configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Service configuration, loaded once at startup from environment variables.
///
/// Payment providers are optional on purpose: a deployment may run with only
/// one of them, and the matching endpoints answer 503 for the other.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Public origin of the site, e.g. `https://studio.example.com`.
    /// Used to derive the redirect-checkout result and callback URLs.
    pub site_origin: String,
    /// Stripe secret key (card payments disabled when absent)
    pub stripe_secret_key: Option<String>,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: Option<String>,
    /// LiqPay public key (redirect checkout disabled when absent)
    pub liqpay_public_key: Option<String>,
    /// LiqPay private key
    pub liqpay_private_key: Option<String>,
    /// Email API key (confirmations logged instead of sent when absent)
    pub email_api_key: Option<String>,
    /// Email API endpoint
    pub email_api_url: String,
    /// Sender address for confirmations
    pub email_from: String,
    /// Address receiving contact/booking inquiries
    pub contact_inbox: String,
    /// Contact endpoint rate limit: requests per window per IP
    pub contact_rate_limit: u32,
    /// Contact endpoint rate-limit window (milliseconds)
    pub contact_rate_window_ms: i64,
}

impl Config {
    /// Optional secret: empty values count as unset. Outside development a
    /// missing value is logged so a misconfigured deployment is visible.
    fn optional_secret(name: &str, environment: &str) -> Option<String> {
        let val = std::env::var(name).ok().filter(|s| !s.is_empty());
        if val.is_none() && environment != "development" {
            tracing::warn!(var = name, "Secret not set, feature disabled");
        }
        val
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            site_origin: std::env::var("SITE_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            stripe_secret_key: Self::optional_secret("STRIPE_SECRET_KEY", &environment),
            stripe_webhook_secret: Self::optional_secret("STRIPE_WEBHOOK_SECRET", &environment),
            liqpay_public_key: Self::optional_secret("LIQPAY_PUBLIC_KEY", &environment),
            liqpay_private_key: Self::optional_secret("LIQPAY_PRIVATE_KEY", &environment),
            email_api_key: Self::optional_secret("EMAIL_API_KEY", &environment),
            email_api_url: std::env::var("EMAIL_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com/emails".into()),
            email_from: std::env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "bookings@studio.example.com".into()),
            contact_inbox: std::env::var("CONTACT_INBOX")
                .unwrap_or_else(|_| "hello@studio.example.com".into()),
            contact_rate_limit: std::env::var("CONTACT_RATE_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            contact_rate_window_ms: std::env::var("CONTACT_RATE_WINDOW_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60_000),
            environment,
        })
    }
}
