//! Operator desk: turns control-panel presses, free text and admin commands
//! into [`Arbiter`] calls and reports the result back to the operator.
//!
//! Error policy: `Unauthorized` and `StaleSession` are dropped without a
//! reply; `NotFound`, `InvalidTransition` and `Validation` become a plain
//! message; store failures are logged and summarized.

use fluent_templates::fluent_bundle::FluentArgs;
use std::sync::Arc;

use crate::catalog;
use crate::core::error::AppResult;
use crate::i18n::{self, Locale};
use crate::messaging::Messenger;
use crate::orders::{AdminAction, Arbiter, Decision, Order, OrderError, OrderId, OrderStatus, ReleaseOutcome, ReleaseScheduler};

/// Orders listed by `/orders` when no limit is given.
pub const DEFAULT_LIST_LIMIT: usize = 20;

/// One-line order summary used in listings.
pub fn format_order_line(order: &Order) -> String {
    format!(
        "#{} · {} · {} · {} · {} · {}",
        order.id,
        order.status,
        catalog::entry(order.product).name(order.language),
        order.payment_method.map(|m| m.as_ref().to_string()).unwrap_or_else(|| "-".to_string()),
        order.handle_display(),
        order.created_at.format("%Y-%m-%d %H:%M")
    )
}

pub struct OperatorDesk {
    arbiter: Arc<Arbiter>,
    release: Arc<ReleaseScheduler>,
    messenger: Arc<dyn Messenger>,
}

impl OperatorDesk {
    pub fn new(arbiter: Arc<Arbiter>, release: Arc<ReleaseScheduler>, messenger: Arc<dyn Messenger>) -> Self {
        Self {
            arbiter,
            release,
            messenger,
        }
    }

    fn locale(&self) -> Locale {
        self.arbiter.operator().locale
    }

    pub fn is_operator(&self, user_id: i64) -> bool {
        self.arbiter.operator().is(user_id)
    }

    async fn reply(&self, text: &str) -> AppResult<()> {
        self.messenger.send_text(self.arbiter.operator().id, text, None).await
    }

    fn text_with_order(&self, key: &str, order_id: OrderId) -> String {
        let mut args = FluentArgs::new();
        args.set("order_id", order_id.to_string());
        i18n::t_args(self.locale(), key, &args)
    }

    /// Reports an arbitration failure according to the error policy.
    async fn report(&self, err: OrderError) -> AppResult<()> {
        let locale = self.locale();
        let text = match err {
            OrderError::Unauthorized | OrderError::StaleSession => return Ok(()),
            OrderError::NotFound(id) => self.text_with_order("admin-order-not-found", id),
            OrderError::NoOrderForBuyer(_) => i18n::t(locale, "admin-no-orders"),
            OrderError::InvalidTransition { order_id, from, to } => {
                let mut args = FluentArgs::new();
                args.set("order_id", order_id.to_string());
                args.set("from", from.to_string());
                args.set("to", to.to_string());
                i18n::t_args(locale, "admin-invalid-transition", &args)
            }
            OrderError::Validation(reason) => {
                let mut args = FluentArgs::new();
                args.set("reason", reason);
                i18n::t_args(locale, "admin-validation", &args)
            }
            OrderError::Store(e) => {
                log::error!("Order store failure during arbitration: {}", e);
                i18n::t(locale, "admin-store-error")
            }
        };
        self.reply(&text).await
    }

    async fn confirm_decision(&self, key: &str, decision: &Decision) -> AppResult<()> {
        self.reply(&self.text_with_order(key, decision.order.id)).await?;
        if !decision.buyer_notified {
            self.reply(&self.text_with_order("admin-buyer-unreachable", decision.order.id))
                .await?;
        }
        Ok(())
    }

    /// Control-panel button press `admin_<action>_<order_id>`.
    pub async fn handle_action(&self, actor_id: i64, action: AdminAction, order_id: OrderId) -> AppResult<()> {
        match action {
            AdminAction::Approve => match self.arbiter.approve(actor_id, order_id).await {
                Ok(decision) => self.confirm_decision("admin-approved", &decision).await,
                Err(e) => self.report(e).await,
            },
            AdminAction::Reject => match self.arbiter.reject(actor_id, order_id).await {
                Ok(decision) => self.confirm_decision("admin-rejected", &decision).await,
                Err(e) => self.report(e).await,
            },
            AdminAction::Link => match self.arbiter.request_link_entry(actor_id, order_id) {
                Ok(arming) => {
                    if let Some(previous) = arming.replaced {
                        let mut args = FluentArgs::new();
                        args.set("previous", previous.to_string());
                        self.reply(&i18n::t_args(self.locale(), "admin-link-replaced", &args))
                            .await?;
                    }
                    self.reply(&self.text_with_order("admin-link-armed", arming.order.id))
                        .await
                }
                Err(e) => self.report(e).await,
            },
        }
    }

    /// Free text from the operator. Returns `true` when it was consumed as a link.
    pub async fn handle_text(&self, actor_id: i64, text: &str) -> AppResult<bool> {
        match self.arbiter.deliver_armed_link(actor_id, text).await {
            Ok(decision) => {
                self.confirm_decision("admin-link-sent", &decision).await?;
                Ok(true)
            }
            Err(OrderError::StaleSession) | Err(OrderError::Unauthorized) => Ok(false),
            Err(e) => {
                self.report(e).await?;
                Ok(true)
            }
        }
    }

    /// `/cancel`: disarm pending link entry.
    pub async fn cancel_link(&self, actor_id: i64) -> AppResult<()> {
        match self.arbiter.cancel_link_entry(actor_id) {
            Ok(Some(order_id)) => self.reply(&self.text_with_order("admin-link-cancelled", order_id)).await,
            Ok(None) => self.reply(&i18n::t(self.locale(), "admin-nothing-armed")).await,
            Err(e) => self.report(e).await,
        }
    }

    /// `/orders [status]`
    pub async fn list_orders(&self, actor_id: i64, args: &str) -> AppResult<()> {
        if !self.is_operator(actor_id) {
            return Ok(());
        }

        let arg = args.trim();
        let status = if arg.is_empty() {
            None
        } else {
            match arg.parse::<OrderStatus>() {
                Ok(status) => Some(status),
                Err(_) => return self.reply(&i18n::t(self.locale(), "admin-orders-usage")).await,
            }
        };

        match self.arbiter.recent_orders(actor_id, status, DEFAULT_LIST_LIMIT) {
            Ok(orders) if orders.is_empty() => self.reply(&i18n::t(self.locale(), "admin-no-orders")).await,
            Ok(orders) => {
                let lines: Vec<String> = orders.iter().map(format_order_line).collect();
                self.reply(&lines.join("\n")).await
            }
            Err(e) => self.report(e).await,
        }
    }

    /// `/order <id>`
    pub async fn show_order(&self, actor_id: i64, args: &str) -> AppResult<()> {
        if !self.is_operator(actor_id) {
            return Ok(());
        }

        let Ok(order_id) = args.parse::<OrderId>() else {
            return self.reply(&i18n::t(self.locale(), "admin-order-usage")).await;
        };

        match self.arbiter.order(actor_id, order_id) {
            Ok(order) => {
                let summary = crate::orders::lifecycle::proof_summary(&order, self.arbiter.operator());
                self.reply(&format!("{}\n\n{}", format_order_line(&order), summary)).await
            }
            Err(e) => self.report(e).await,
        }
    }

    /// `/release_check`: run the release trigger now. Still fires at most once.
    pub async fn release_check(&self, actor_id: i64) -> AppResult<()> {
        if !self.is_operator(actor_id) {
            return Ok(());
        }

        let mut args = FluentArgs::new();
        args.set(
            "date",
            catalog::format_release_date(self.locale(), self.release.release_date()),
        );
        match self.release.check_now().await? {
            // The scheduler already sent the operator its own summary
            ReleaseOutcome::Fired { .. } => Ok(()),
            ReleaseOutcome::NotDue => self.reply(&i18n::t_args(self.locale(), "admin-release-not-due", &args)).await,
            ReleaseOutcome::AlreadyFired => {
                self.reply(&i18n::t_args(self.locale(), "admin-release-already", &args))
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{PaymentMethod, ProductId};
    use chrono::{TimeZone, Utc};

    #[test]
    fn order_line_contains_key_fields() {
        let order = Order {
            id: OrderId(7),
            buyer_id: 100,
            buyer_handle: Some("alice".to_string()),
            language: Locale::En,
            product: ProductId::Channel2026,
            payment_method: Some(PaymentMethod::Wise),
            status: OrderStatus::ProofReceived,
            is_deferred_cohort: true,
            created_at: Utc.with_ymd_and_hms(2025, 12, 1, 10, 30, 0).unwrap(),
        };

        assert_eq!(
            format_order_line(&order),
            "#7 · proof_received · Channel 2026 · wise · @alice · 2025-12-01 10:30"
        );
    }
}
