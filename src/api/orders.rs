//! Order API handlers
//!
//! POST /api/orders      — create an order with status `pending`
//! GET  /api/orders?id=  — public status view (payment internals excluded)

use axum::extract::{Query, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::order::{Currency, Customer, NewOrder, OrderItem, OrderView};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub total: Decimal,
    #[serde(default)]
    pub currency: Currency,
    pub customer: Customer,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub id: String,
    pub order_number: String,
}

fn validate(req: &CreateOrderRequest) -> Result<(), AppError> {
    if req.items.is_empty() {
        return Err(AppError::validation("Order must contain at least one item"));
    }
    for item in &req.items {
        if item.quantity < 1 {
            return Err(AppError::validation("Item quantity must be at least 1"));
        }
        if item.price.is_sign_negative() {
            return Err(AppError::validation("Item price must be non-negative"));
        }
    }

    let c = &req.customer;
    if c.first_name.trim().is_empty()
        || c.last_name.trim().is_empty()
        || c.email.trim().is_empty()
        || c.phone.trim().is_empty()
    {
        return Err(AppError::validation(
            "Customer first name, last name, email and phone are required",
        ));
    }
    if !c.email.contains('@') {
        return Err(AppError::validation("Invalid email"));
    }

    if req.subtotal.is_sign_negative() || req.total.is_sign_negative() {
        return Err(AppError::validation("Amounts must be non-negative"));
    }

    Ok(())
}

pub async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> AppResult<Json<CreateOrderResponse>> {
    validate(&req)?;

    // Totals are accepted as sent by the client and are not recomputed
    // before charging; a mismatch is logged so it can be audited.
    let derived: Decimal = req
        .items
        .iter()
        .map(|i| i.price * Decimal::from(i.quantity))
        .sum();
    if derived != req.subtotal {
        tracing::warn!(
            client_subtotal = %req.subtotal,
            derived_subtotal = %derived,
            "Client subtotal does not match item sum"
        );
    }

    let order = state
        .store
        .create(NewOrder {
            items: req.items,
            subtotal: req.subtotal,
            total: req.total,
            currency: req.currency,
            customer: req.customer,
            notes: req.notes,
        })
        .await?;

    tracing::info!(order_id = %order.id, order_number = %order.order_number, "Order created");

    Ok(Json(CreateOrderResponse {
        id: order.id,
        order_number: order.order_number,
    }))
}

#[derive(Debug, Deserialize)]
pub struct GetOrderQuery {
    pub id: Option<String>,
}

pub async fn get_order(
    State(state): State<AppState>,
    Query(query): Query<GetOrderQuery>,
) -> AppResult<Json<OrderView>> {
    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::validation("Missing order id"))?;

    let order = state
        .store
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))?;

    Ok(Json(order.into()))
}
