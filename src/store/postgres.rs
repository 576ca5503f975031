//! PostgreSQL order store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::order::{
    Currency, Customer, NewOrder, Order, OrderItem, OrderStatus, OrderUpdate, PaymentProvider,
};

use super::{generate_order_number, OrderStore, StoreError};

#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Row shape; enum-ish columns are stored as text and JSON blobs as jsonb
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    order_number: String,
    items: Json<Vec<OrderItem>>,
    subtotal: Decimal,
    total: Decimal,
    currency: String,
    customer: Json<Customer>,
    status: String,
    payment_provider: Option<String>,
    payment_intent_id: Option<String>,
    payment_status: Option<String>,
    paid_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

fn currency_from_db(code: &str) -> Currency {
    match code {
        "EUR" => Currency::Eur,
        _ => Currency::Uah,
    }
}

fn status_to_db(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "pending",
        OrderStatus::Processing => "processing",
        OrderStatus::Paid => "paid",
        OrderStatus::Failed => "failed",
        OrderStatus::Refunded => "refunded",
        OrderStatus::Cancelled => "cancelled",
    }
}

fn status_from_db(status: &str) -> OrderStatus {
    match status {
        "processing" => OrderStatus::Processing,
        "paid" => OrderStatus::Paid,
        "failed" => OrderStatus::Failed,
        "refunded" => OrderStatus::Refunded,
        "cancelled" => OrderStatus::Cancelled,
        _ => OrderStatus::Pending,
    }
}

fn provider_to_db(provider: PaymentProvider) -> &'static str {
    match provider {
        PaymentProvider::Stripe => "stripe",
        PaymentProvider::Liqpay => "liqpay",
    }
}

fn provider_from_db(provider: &str) -> Option<PaymentProvider> {
    match provider {
        "stripe" => Some(PaymentProvider::Stripe),
        "liqpay" => Some(PaymentProvider::Liqpay),
        _ => None,
    }
}

impl From<OrderRow> for Order {
    fn from(r: OrderRow) -> Self {
        Order {
            id: r.id,
            order_number: r.order_number,
            items: r.items.0,
            subtotal: r.subtotal,
            total: r.total,
            currency: currency_from_db(&r.currency),
            customer: r.customer.0,
            status: status_from_db(&r.status),
            payment_provider: r.payment_provider.as_deref().and_then(provider_from_db),
            payment_intent_id: r.payment_intent_id,
            payment_status: r.payment_status,
            paid_at: r.paid_at,
            notes: r.notes,
            created_at: r.created_at,
        }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create(&self, order: NewOrder) -> Result<Order, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let order_number = generate_order_number();
        let created_at = Utc::now();

        let row: OrderRow = sqlx::query_as(
            "INSERT INTO orders
               (id, order_number, items, subtotal, total, currency, customer,
                status, notes, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8, $9)
             RETURNING *",
        )
        .bind(&id)
        .bind(&order_number)
        .bind(Json(&order.items))
        .bind(order.subtotal)
        .bind(order.total)
        .bind(order.currency.code())
        .bind(Json(&order.customer))
        .bind(&order.notes)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Order>, StoreError> {
        let row: Option<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn update(&self, id: &str, update: OrderUpdate) -> Result<Option<Order>, StoreError> {
        // paid_at is written at most once; later webhooks never move it
        let row: Option<OrderRow> = sqlx::query_as(
            "UPDATE orders SET
               status            = COALESCE($2, status),
               payment_provider  = COALESCE($3, payment_provider),
               payment_intent_id = COALESCE($4, payment_intent_id),
               payment_status    = COALESCE($5, payment_status),
               paid_at           = COALESCE(paid_at, $6)
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(update.status.map(status_to_db))
        .bind(update.payment_provider.map(provider_to_db))
        .bind(update.payment_intent_id)
        .bind(update.payment_status)
        .bind(update.paid_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }
}
