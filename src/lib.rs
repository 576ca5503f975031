//! studio-api — booking and payment backend for the styling studio site
//!
//! Long-running service that:
//! - Creates and serves orders for the public checkout flow
//! - Starts card payments (Stripe) and redirect checkouts (LiqPay)
//! - Reconciles provider webhooks onto the order lifecycle
//! - Forwards contact/booking inquiries to the studio inbox

pub mod api;
pub mod config;
pub mod error;
pub mod notify;
pub mod order;
pub mod payments;
pub mod rate_limit;
pub mod reconcile;
pub mod state;
pub mod store;

pub use config::Config;
pub use state::AppState;
