//! Buyer side of the order lifecycle: creation and proof submission.

use fluent_templates::fluent_bundle::FluentArgs;
use std::sync::Arc;

use crate::catalog::{self, PaymentMethod};
use crate::i18n;
use crate::messaging::{Evidence, Messenger};
use crate::orders::arbitration::control_panel;
use crate::orders::error::{OrderError, OrderResult};
use crate::orders::model::{NewOrder, Order, OrderId, OrderStatus};
use crate::orders::Operator;
use crate::storage::db::DbPool;
use crate::storage::{get_connection, orders as store};

/// Moves `order_id` to `to`, checking the edge and the stored origin state.
///
/// The update is guarded by the status read just before it, so a concurrent
/// transition makes this one fail with `InvalidTransition` instead of
/// overwriting.
pub(crate) fn apply_transition(db_pool: &DbPool, order_id: OrderId, to: OrderStatus) -> OrderResult<Order> {
    let conn = get_connection(db_pool)?;
    let order = store::get_order(&conn, order_id)?.ok_or(OrderError::NotFound(order_id))?;

    if !order.status.can_transition_to(to) {
        return Err(OrderError::InvalidTransition {
            order_id,
            from: order.status,
            to,
        });
    }

    if !store::transition_status(&conn, order_id, order.status, to)? {
        let current = store::get_order(&conn, order_id)?
            .map(|o| o.status)
            .unwrap_or(order.status);
        return Err(OrderError::InvalidTransition {
            order_id,
            from: current,
            to,
        });
    }

    log::info!("Order #{}: {} -> {}", order_id, order.status, to);
    Ok(Order { status: to, ..order })
}

/// Creates orders and records proof submissions.
pub struct LifecycleEngine {
    db_pool: Arc<DbPool>,
    messenger: Arc<dyn Messenger>,
    operator: Operator,
}

impl LifecycleEngine {
    pub fn new(db_pool: Arc<DbPool>, messenger: Arc<dyn Messenger>, operator: Operator) -> Self {
        Self {
            db_pool,
            messenger,
            operator,
        }
    }

    /// Inserts a new `pending` order. No check against the buyer's earlier orders.
    pub fn create(&self, new: NewOrder) -> OrderResult<Order> {
        let conn = get_connection(&self.db_pool)?;
        let order = store::insert_order(&conn, &new)?;
        log::info!(
            "Order #{} created: buyer={} product={} method={:?} cohort={}",
            order.id,
            order.buyer_id,
            order.product,
            order.payment_method,
            order.is_deferred_cohort
        );
        Ok(order)
    }

    /// Records a payment method decided after creation. Only `pending` orders accept one.
    pub fn set_payment_method(&self, order_id: OrderId, method: PaymentMethod) -> OrderResult<Order> {
        let conn = get_connection(&self.db_pool)?;
        let order = store::get_order(&conn, order_id)?.ok_or(OrderError::NotFound(order_id))?;
        if !store::set_payment_method(&conn, order_id, method)? {
            return Err(OrderError::Validation(format!(
                "order #{} is {}, payment method is fixed",
                order_id, order.status
            )));
        }
        Ok(Order {
            payment_method: Some(method),
            ..order
        })
    }

    /// Most recent order of `buyer_id`, if any.
    pub fn latest_order(&self, buyer_id: i64) -> OrderResult<Option<Order>> {
        let conn = get_connection(&self.db_pool)?;
        Ok(store::latest_order_for(&conn, buyer_id)?)
    }

    /// Marks the buyer's latest order as `proof_received` and hands the proof to the operator.
    ///
    /// Operator notification failures are logged; the transition stands.
    pub async fn attach_proof(&self, buyer_id: i64, evidence: Evidence) -> OrderResult<Order> {
        let latest = self
            .latest_order(buyer_id)?
            .ok_or(OrderError::NoOrderForBuyer(buyer_id))?;

        let order = apply_transition(&self.db_pool, latest.id, OrderStatus::ProofReceived)?;

        let summary = proof_summary(&order, self.operator);
        let panel = control_panel(order.id, self.operator.locale);
        if let Err(e) = self.messenger.send_text(self.operator.id, &summary, Some(&panel)).await {
            log::error!("Failed to notify operator about order #{}: {}", order.id, e);
        }
        if let Err(e) = self.messenger.copy_evidence(self.operator.id, &evidence).await {
            log::error!("Failed to copy proof of order #{} to operator: {}", order.id, e);
        }

        Ok(order)
    }
}

/// Operator-facing order summary sent with a new proof.
pub fn proof_summary(order: &Order, operator: Operator) -> String {
    let locale = operator.locale;
    let entry = catalog::entry(order.product);

    let mut args = FluentArgs::new();
    args.set("order_id", order.id.to_string());
    args.set("buyer_id", order.buyer_id.to_string());
    args.set("handle", order.handle_display());
    args.set("product", format!("{} ({})", entry.name(order.language), entry.price(order.language)));
    args.set(
        "method",
        order
            .payment_method
            .map(|m| m.label().to_string())
            .unwrap_or_else(|| "-".to_string()),
    );
    args.set("language", order.language.as_ref().to_string());
    args.set("cohort", if order.is_deferred_cohort { "✅" } else { "—" });
    i18n::t_args(locale, "admin-new-proof", &args)
}
