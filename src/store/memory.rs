//! In-memory order store for tests and database-less local runs

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;

use crate::order::{NewOrder, Order, OrderStatus, OrderUpdate};

use super::{generate_order_number, OrderStore, StoreError};

#[derive(Clone, Default)]
pub struct MemoryOrderStore {
    orders: Arc<DashMap<String, Order>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn create(&self, order: NewOrder) -> Result<Order, StoreError> {
        let order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            order_number: generate_order_number(),
            items: order.items,
            subtotal: order.subtotal,
            total: order.total,
            currency: order.currency,
            customer: order.customer,
            status: OrderStatus::Pending,
            payment_provider: None,
            payment_intent_id: None,
            payment_status: None,
            paid_at: None,
            notes: order.notes,
            created_at: Utc::now(),
        };
        self.orders.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.get(id).map(|o| o.clone()))
    }

    async fn update(&self, id: &str, update: OrderUpdate) -> Result<Option<Order>, StoreError> {
        // Entry-level lock makes the read-modify-write atomic per record
        let Some(mut entry) = self.orders.get_mut(id) else {
            return Ok(None);
        };
        if let Some(status) = update.status {
            entry.status = status;
        }
        if let Some(provider) = update.payment_provider {
            entry.payment_provider = Some(provider);
        }
        if let Some(intent) = update.payment_intent_id {
            entry.payment_intent_id = Some(intent);
        }
        if let Some(raw) = update.payment_status {
            entry.payment_status = Some(raw);
        }
        if update.paid_at.is_some() && entry.paid_at.is_none() {
            entry.paid_at = update.paid_at;
        }
        Ok(Some(entry.clone()))
    }
}
