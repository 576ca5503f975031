//! Order persistence
//!
//! The core only depends on this contract: create, read-by-id, update-by-id,
//! each atomic per record. `PgOrderStore` is the production backend;
//! `MemoryOrderStore` backs tests and database-less local runs.

mod memory;
mod postgres;

pub use memory::MemoryOrderStore;
pub use postgres::PgOrderStore;

use async_trait::async_trait;

use crate::order::{NewOrder, Order, OrderUpdate};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new order with status `pending`; assigns id and order number.
    async fn create(&self, order: NewOrder) -> Result<Order, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Order>, StoreError>;

    /// Apply a partial update; returns the updated order, or `None` if the
    /// id is unknown.
    async fn update(&self, id: &str, update: OrderUpdate) -> Result<Option<Order>, StoreError>;
}

/// Human-facing order number: `ORD-{unix millis}-{4 digits}`
pub(crate) fn generate_order_number() -> String {
    use rand::Rng;
    let suffix: u32 = rand::thread_rng().gen_range(1000..10_000);
    format!(
        "ORD-{}-{}",
        chrono::Utc::now().timestamp_millis(),
        suffix
    )
}
