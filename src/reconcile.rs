//! Webhook-driven order reconciliation
//!
//! Both providers retry and may deliver events out of order or more than
//! once, so this path is idempotent by construction:
//!
//! - a terminal status is sticky; the only terminal transition applied
//!   afterwards is `paid` → `refunded` (provider reversal)
//! - re-applying the same status is a harmless no-op
//! - `paid_at` is written exactly once, on the first transition into `paid`
//! - the confirmation notification fires only on that first transition

use std::sync::Arc;

use crate::notify::Notifier;
use crate::order::{Order, OrderStatus, OrderUpdate};
use crate::store::{OrderStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The order referenced by the webhook does not exist (yet). Receivers
    /// answer non-2xx so the provider retries — creation may race the
    /// webhook.
    #[error("order not found: {0}")]
    OrderNotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Status the order ended up with
    pub status: OrderStatus,
    /// Whether the confirmation notification was sent by this delivery
    pub notified: bool,
}

/// Decide which status the order moves to given the webhook verdict.
///
/// Transition table for the webhook path: non-terminal statuses take the
/// incoming one; terminal statuses stay, except `paid` → `refunded`.
pub fn resolve_status(current: OrderStatus, incoming: OrderStatus) -> OrderStatus {
    // A reversal only makes sense for money that moved (or is moving)
    if incoming == OrderStatus::Refunded {
        return if matches!(current, OrderStatus::Paid | OrderStatus::Processing) {
            OrderStatus::Refunded
        } else {
            current
        };
    }
    if current.is_terminal() {
        return current;
    }
    incoming
}

/// Apply an authenticated provider verdict to an order.
///
/// `incoming` is the already-mapped order status; `raw_status` is the
/// provider's original vocabulary, stored verbatim for audit.
pub async fn apply_payment_event(
    store: &Arc<dyn OrderStore>,
    notifier: &Arc<dyn Notifier>,
    order_id: &str,
    incoming: OrderStatus,
    raw_status: &str,
    payment_id: Option<&str>,
) -> Result<ReconcileOutcome, ReconcileError> {
    let order = store
        .find_by_id(order_id)
        .await?
        .ok_or_else(|| ReconcileError::OrderNotFound(order_id.to_string()))?;

    let next = resolve_status(order.status, incoming);
    if next != incoming {
        tracing::info!(
            order_id = %order_id,
            current = ?order.status,
            incoming = ?incoming,
            "Terminal status retained, webhook transition suppressed"
        );
    }

    // Guard on both the previous status and paid_at: a duplicate delivery of
    // the same success event must not notify twice.
    let fresh_paid =
        next == OrderStatus::Paid && order.status != OrderStatus::Paid && order.paid_at.is_none();

    let update = OrderUpdate {
        status: Some(next),
        payment_status: Some(raw_status.to_string()),
        payment_intent_id: payment_id.map(str::to_string),
        paid_at: fresh_paid.then(chrono::Utc::now),
        ..Default::default()
    };

    let updated = store
        .update(order_id, update)
        .await?
        .ok_or_else(|| ReconcileError::OrderNotFound(order_id.to_string()))?;

    let mut notified = false;
    if fresh_paid {
        notified = true;
        notify_confirmation(notifier, &updated).await;
    }

    tracing::info!(
        order_id = %order_id,
        status = ?next,
        raw_status = raw_status,
        notified = notified,
        "Payment event applied"
    );

    Ok(ReconcileOutcome {
        status: next,
        notified,
    })
}

/// Fire-and-forget: a failed confirmation email is logged, never retried
/// synchronously, and never changes the webhook response.
async fn notify_confirmation(notifier: &Arc<dyn Notifier>, order: &Order) {
    if let Err(e) = notifier.order_confirmation(order).await {
        tracing::error!(
            order_id = %order.id,
            error = %e,
            "Failed to send order confirmation"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{NotifyError, Notifier};
    use crate::order::{Currency, Customer, NewOrder, OrderItem};
    use crate::store::MemoryOrderStore;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingNotifier {
        confirmations: AtomicUsize,
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn order_confirmation(&self, _order: &Order) -> Result<(), NotifyError> {
            self.confirmations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn contact_inquiry(
            &self,
            _inquiry: &crate::notify::ContactInquiry,
        ) -> Result<(), NotifyError> {
            Ok(())
        }
    }

    async fn seeded_store() -> (Arc<dyn OrderStore>, String) {
        let store = MemoryOrderStore::new();
        let order = store
            .create(NewOrder {
                items: vec![OrderItem {
                    name: "Consultation".into(),
                    item_type: "service".into(),
                    price: Decimal::new(100000, 2),
                    quantity: 1,
                    booking_date: None,
                    booking_time: None,
                }],
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
                notes: None,
            })
            .await
            .unwrap();
        let id = order.id.clone();
        // Orders normally reach the webhook path in processing state
        store
            .update(
                &id,
                OrderUpdate {
                    status: Some(OrderStatus::Processing),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        (Arc::new(store), id)
    }

    #[test]
    fn resolve_respects_transition_table() {
        use OrderStatus::*;
        assert_eq!(resolve_status(Pending, Processing), Processing);
        assert_eq!(resolve_status(Processing, Paid), Paid);
        assert_eq!(resolve_status(Processing, Failed), Failed);
        assert_eq!(resolve_status(Processing, Refunded), Refunded);
        assert_eq!(resolve_status(Paid, Refunded), Refunded);
        // Terminal statuses never move back to non-terminal
        assert_eq!(resolve_status(Paid, Processing), Paid);
        assert_eq!(resolve_status(Paid, Pending), Paid);
        assert_eq!(resolve_status(Failed, Paid), Failed);
        assert_eq!(resolve_status(Refunded, Paid), Refunded);
        assert_eq!(resolve_status(Cancelled, Paid), Cancelled);
        // Refund only applies where money moved (or is moving)
        assert_eq!(resolve_status(Pending, Refunded), Pending);
        assert_eq!(resolve_status(Failed, Refunded), Failed);
        assert_eq!(resolve_status(Cancelled, Refunded), Cancelled);
    }

    #[tokio::test]
    async fn success_event_pays_order_and_notifies_once() {
        let (store, id) = seeded_store().await;
        let notifier = Arc::new(CountingNotifier::default());
        let as_notifier: Arc<dyn Notifier> = notifier.clone();

        let outcome =
            apply_payment_event(&store, &as_notifier, &id, OrderStatus::Paid, "success", None)
                .await
                .unwrap();
        assert_eq!(outcome.status, OrderStatus::Paid);
        assert!(outcome.notified);

        let order = store.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        assert!(order.paid_at.is_some());
        assert_eq!(order.payment_status.as_deref(), Some("success"));
        assert_eq!(notifier.confirmations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn duplicate_success_event_is_idempotent() {
        let (store, id) = seeded_store().await;
        let notifier = Arc::new(CountingNotifier::default());
        let as_notifier: Arc<dyn Notifier> = notifier.clone();

        apply_payment_event(&store, &as_notifier, &id, OrderStatus::Paid, "success", None)
            .await
            .unwrap();
        let first_paid_at = store.find_by_id(&id).await.unwrap().unwrap().paid_at;

        let second =
            apply_payment_event(&store, &as_notifier, &id, OrderStatus::Paid, "success", None)
                .await
                .unwrap();
        assert_eq!(second.status, OrderStatus::Paid);
        assert!(!second.notified);

        let order = store.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(order.paid_at, first_paid_at);
        assert_eq!(notifier.confirmations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn late_processing_event_never_downgrades_paid() {
        let (store, id) = seeded_store().await;
        let notifier: Arc<dyn Notifier> = Arc::new(CountingNotifier::default());

        apply_payment_event(&store, &notifier, &id, OrderStatus::Paid, "success", None)
            .await
            .unwrap();
        let outcome = apply_payment_event(
            &store,
            &notifier,
            &id,
            OrderStatus::Processing,
            "wait_accept",
            None,
        )
        .await
        .unwrap();

        assert_eq!(outcome.status, OrderStatus::Paid);
        let order = store.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn reversal_moves_paid_to_refunded() {
        let (store, id) = seeded_store().await;
        let notifier: Arc<dyn Notifier> = Arc::new(CountingNotifier::default());

        apply_payment_event(&store, &notifier, &id, OrderStatus::Paid, "success", None)
            .await
            .unwrap();
        let outcome =
            apply_payment_event(&store, &notifier, &id, OrderStatus::Refunded, "reversed", None)
                .await
                .unwrap();

        assert_eq!(outcome.status, OrderStatus::Refunded);
        assert!(!outcome.notified);
    }

    #[tokio::test]
    async fn unknown_order_is_reported() {
        let (store, _) = seeded_store().await;
        let notifier: Arc<dyn Notifier> = Arc::new(CountingNotifier::default());

        let err = apply_payment_event(
            &store,
            &notifier,
            "missing",
            OrderStatus::Paid,
            "success",
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ReconcileError::OrderNotFound(_)));
    }
}
