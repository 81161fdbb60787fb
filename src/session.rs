//! Conversation state kept between updates.
//!
//! Buyer sessions live in a bounded in-memory cache with idle expiry and are
//! lost on restart. A pending order in storage still accepts its proof, but
//! menu navigation starts over at `/start`.
//! The operator session holds the single "armed for link delivery" slot.

use moka::future::Cache;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::catalog::ProductId;
use crate::core::config;
use crate::i18n::Locale;
use crate::orders::model::OrderId;

/// Per-buyer flow state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuyerSession {
    pub locale: Option<Locale>,
    pub product: Option<ProductId>,
    /// Set once an order is created; the next photo/document is treated as proof.
    pub awaiting_proof: bool,
}

/// Operator-only state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatorSession {
    /// Order the operator's next free-text message is delivered to.
    pub armed_order_id: Option<OrderId>,
}

pub struct SessionStore {
    buyers: Cache<i64, BuyerSession>,
    operator: Mutex<OperatorSession>,
}

impl SessionStore {
    pub fn new(ttl: Duration, max_sessions: u64) -> Self {
        Self {
            buyers: Cache::builder().max_capacity(max_sessions).time_to_idle(ttl).build(),
            operator: Mutex::new(OperatorSession::default()),
        }
    }

    /// Store sized and timed from `SESSION_TTL_SECS`.
    pub fn from_config() -> Self {
        Self::new(config::session::ttl(), config::session::MAX_SESSIONS)
    }

    /// Current session of `buyer_id`, or a fresh one.
    pub async fn buyer(&self, buyer_id: i64) -> BuyerSession {
        self.buyers.get(&buyer_id).await.unwrap_or_default()
    }

    /// Applies `f` to the buyer's session and stores the result.
    pub async fn update_buyer<F>(&self, buyer_id: i64, f: F) -> BuyerSession
    where
        F: FnOnce(&mut BuyerSession),
    {
        let mut session = self.buyer(buyer_id).await;
        f(&mut session);
        self.buyers.insert(buyer_id, session.clone()).await;
        session
    }

    /// Drops the buyer's session (e.g. on `/start`).
    pub async fn reset_buyer(&self, buyer_id: i64) {
        self.buyers.invalidate(&buyer_id).await;
    }

    fn operator(&self) -> MutexGuard<'_, OperatorSession> {
        match self.operator.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Operator session lock was poisoned, recovering...");
                poisoned.into_inner()
            }
        }
    }

    /// Arms `order_id`, returning the previously armed order if it was a different one.
    pub fn arm(&self, order_id: OrderId) -> Option<OrderId> {
        let previous = self.operator().armed_order_id.replace(order_id);
        previous.filter(|prev| *prev != order_id)
    }

    pub fn armed(&self) -> Option<OrderId> {
        self.operator().armed_order_id
    }

    /// Clears the armed slot, returning what was armed.
    pub fn disarm(&self) -> Option<OrderId> {
        self.operator().armed_order_id.take()
    }

    /// Clears the slot only if it still targets `order_id`.
    pub fn disarm_if(&self, order_id: OrderId) -> bool {
        let mut operator = self.operator();
        if operator.armed_order_id == Some(order_id) {
            operator.armed_order_id = None;
            true
        } else {
            false
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::from_config()
    }
}
