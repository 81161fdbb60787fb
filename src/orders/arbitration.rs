//! Operator arbitration: approve / reject a proof, then hand-deliver an access link.
//!
//! Every entry point takes the acting user id first and refuses anyone but the
//! configured operator with [`OrderError::Unauthorized`] before touching the store.

use fluent_templates::fluent_bundle::FluentArgs;
use std::sync::Arc;
use strum::{AsRefStr, Display, EnumString};

use crate::catalog;
use crate::i18n::{self, Locale};
use crate::messaging::{Button, Keyboard, Messenger};
use crate::orders::error::{OrderError, OrderResult};
use crate::orders::lifecycle::apply_transition;
use crate::orders::model::{Order, OrderId, OrderStatus};
use crate::orders::Operator;
use crate::session::SessionStore;
use crate::storage::db::DbPool;
use crate::storage::{get_connection, orders as store};

/// Control-panel actions, addressed as `admin_<action>_<order_id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, AsRefStr, Display)]
#[strum(serialize_all = "lowercase")]
pub enum AdminAction {
    Approve,
    Reject,
    Link,
}

impl AdminAction {
    pub const CALLBACK_PREFIX: &'static str = "admin_";

    pub fn callback_data(self, order_id: OrderId) -> String {
        format!("{}{}_{}", Self::CALLBACK_PREFIX, self.as_ref(), order_id)
    }

    /// Parses `admin_<action>_<order_id>`.
    pub fn parse_callback(data: &str) -> Option<(AdminAction, OrderId)> {
        let rest = data.strip_prefix(Self::CALLBACK_PREFIX)?;
        let (action, id) = rest.split_once('_')?;
        Some((action.parse().ok()?, id.parse().ok()?))
    }
}

/// Approve / reject / send-link buttons attached to a proof notification.
pub fn control_panel(order_id: OrderId, locale: Locale) -> Keyboard {
    Keyboard::new(vec![
        vec![
            Button::callback(
                i18n::t(locale, "admin-button-approve"),
                AdminAction::Approve.callback_data(order_id),
            ),
            Button::callback(
                i18n::t(locale, "admin-button-reject"),
                AdminAction::Reject.callback_data(order_id),
            ),
        ],
        vec![Button::callback(
            i18n::t(locale, "admin-button-link"),
            AdminAction::Link.callback_data(order_id),
        )],
    ])
}

/// Result of a decision that notifies the buyer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub order: Order,
    /// `false` when the buyer message could not be delivered
    pub buyer_notified: bool,
}

/// Result of arming an order for link delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkArming {
    pub order: Order,
    /// Previously armed order that no longer waits for a link
    pub replaced: Option<OrderId>,
}

pub struct Arbiter {
    db_pool: Arc<DbPool>,
    messenger: Arc<dyn Messenger>,
    sessions: Arc<SessionStore>,
    operator: Operator,
}

impl Arbiter {
    pub fn new(
        db_pool: Arc<DbPool>,
        messenger: Arc<dyn Messenger>,
        sessions: Arc<SessionStore>,
        operator: Operator,
    ) -> Self {
        Self {
            db_pool,
            messenger,
            sessions,
            operator,
        }
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    fn authorize(&self, actor_id: i64) -> OrderResult<()> {
        if self.operator.is(actor_id) {
            Ok(())
        } else {
            log::debug!("Ignoring arbitration attempt from non-operator {}", actor_id);
            Err(OrderError::Unauthorized)
        }
    }

    async fn notify_buyer(&self, order: &Order, text: &str) -> bool {
        match self.messenger.send_text(order.buyer_id, text, None).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to notify buyer {} about order #{}: {}", order.buyer_id, order.id, e);
                false
            }
        }
    }

    fn order_args(order: &Order) -> FluentArgs<'static> {
        let mut args = FluentArgs::new();
        args.set("order_id", order.id.to_string());
        args.set("product", catalog::entry(order.product).name(order.language));
        args
    }

    /// `proof_received -> approved`; the buyer is told in the order's language.
    pub async fn approve(&self, actor_id: i64, order_id: OrderId) -> OrderResult<Decision> {
        self.authorize(actor_id)?;
        let order = apply_transition(&self.db_pool, order_id, OrderStatus::Approved)?;

        let text = i18n::t_args(order.language, "order-approved", &Self::order_args(&order));
        let buyer_notified = self.notify_buyer(&order, &text).await;
        Ok(Decision { order, buyer_notified })
    }

    /// `proof_received -> rejected`; the buyer is told to restart and resubmit.
    pub async fn reject(&self, actor_id: i64, order_id: OrderId) -> OrderResult<Decision> {
        self.authorize(actor_id)?;
        let order = apply_transition(&self.db_pool, order_id, OrderStatus::Rejected)?;

        let text = i18n::t_args(order.language, "order-rejected", &Self::order_args(&order));
        let buyer_notified = self.notify_buyer(&order, &text).await;
        Ok(Decision { order, buyer_notified })
    }

    /// Arms the operator's link slot for an `approved` order. Status is unchanged.
    pub fn request_link_entry(&self, actor_id: i64, order_id: OrderId) -> OrderResult<LinkArming> {
        self.authorize(actor_id)?;
        let conn = get_connection(&self.db_pool)?;
        let order = store::get_order(&conn, order_id)?.ok_or(OrderError::NotFound(order_id))?;

        if order.status != OrderStatus::Approved {
            return Err(OrderError::InvalidTransition {
                order_id,
                from: order.status,
                to: OrderStatus::Delivered,
            });
        }

        let replaced = self.sessions.arm(order_id);
        if let Some(previous) = replaced {
            log::info!("Link entry for order #{} replaced by #{}", previous, order_id);
        }
        Ok(LinkArming { order, replaced })
    }

    /// Clears the armed slot, returning the order that was waiting.
    pub fn cancel_link_entry(&self, actor_id: i64) -> OrderResult<Option<OrderId>> {
        self.authorize(actor_id)?;
        Ok(self.sessions.disarm())
    }

    /// `approved -> delivered`, sending `link_text` to the buyer.
    ///
    /// Valid only while the slot is armed for `order_id`; the marker is consumed
    /// once the order is delivered. Blank text and storage failures keep it.
    pub async fn deliver_link(&self, actor_id: i64, order_id: OrderId, link_text: &str) -> OrderResult<Decision> {
        self.authorize(actor_id)?;
        if self.sessions.armed() != Some(order_id) {
            return Err(OrderError::StaleSession);
        }

        let link = link_text.trim();
        if link.is_empty() {
            return Err(OrderError::Validation("link text is empty".to_string()));
        }

        let order = match apply_transition(&self.db_pool, order_id, OrderStatus::Delivered) {
            Ok(order) => order,
            Err(e @ OrderError::Store(_)) => return Err(e),
            Err(e) => {
                self.sessions.disarm_if(order_id);
                return Err(e);
            }
        };
        self.sessions.disarm_if(order_id);

        let mut args = FluentArgs::new();
        args.set("link", link.to_string());
        let text = i18n::t_args(order.language, "link-delivered", &args);
        let buyer_notified = self.notify_buyer(&order, &text).await;
        Ok(Decision { order, buyer_notified })
    }

    /// Free-text entry point: delivers `text` to whichever order is armed.
    pub async fn deliver_armed_link(&self, actor_id: i64, text: &str) -> OrderResult<Decision> {
        self.authorize(actor_id)?;
        let order_id = self.sessions.armed().ok_or(OrderError::StaleSession)?;
        self.deliver_link(actor_id, order_id, text).await
    }

    /// Read-only lookup for `/order <id>`.
    pub fn order(&self, actor_id: i64, order_id: OrderId) -> OrderResult<Order> {
        self.authorize(actor_id)?;
        let conn = get_connection(&self.db_pool)?;
        store::get_order(&conn, order_id)?.ok_or(OrderError::NotFound(order_id))
    }

    /// Read-only listing for `/orders [status]`, newest first.
    pub fn recent_orders(&self, actor_id: i64, status: Option<OrderStatus>, limit: usize) -> OrderResult<Vec<Order>> {
        self.authorize(actor_id)?;
        let conn = get_connection(&self.db_pool)?;
        Ok(store::recent_orders(&conn, status, limit)?)
    }
}
