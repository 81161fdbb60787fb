//! Order lifecycle: buyer-driven creation and proof submission, operator
//! arbitration, and the deferred-release scheduler.
//!
//! Nothing in here depends on teloxide; user-facing output goes through
//! [`crate::messaging::Messenger`].

pub mod arbitration;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod release;

pub use arbitration::{AdminAction, Arbiter, Decision, LinkArming};
pub use error::{OrderError, OrderResult};
pub use lifecycle::LifecycleEngine;
pub use model::{NewOrder, Order, OrderId, OrderStatus};
pub use release::{Clock, FixedClock, ReleaseOutcome, ReleaseScheduler, SystemClock};

use crate::core::config;
use crate::i18n::Locale;

/// The single human allowed to arbitrate orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operator {
    pub id: i64,
    /// Language of operator-facing messages
    pub locale: Locale,
}

impl Operator {
    pub fn new(id: i64, locale: Locale) -> Self {
        Self { id, locale }
    }

    /// Operator from `ADMIN_CHAT_ID` / `ADMIN_LOCALE`.
    pub fn from_config() -> Self {
        Self::new(*config::admin::ADMIN_CHAT_ID, *config::admin::ADMIN_LOCALE)
    }

    /// `true` only for the configured operator; an unset id (0) matches nobody.
    pub fn is(&self, actor_id: i64) -> bool {
        self.id != 0 && self.id == actor_id
    }
}
