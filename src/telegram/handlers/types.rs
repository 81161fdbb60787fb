//! Handler types and dependencies

use std::sync::Arc;

use teloxide::types::User;

use crate::operator::OperatorDesk;
use crate::storefront::Storefront;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub storefront: Arc<Storefront>,
    pub desk: Arc<OperatorDesk>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(storefront: Arc<Storefront>, desk: Arc<OperatorDesk>) -> Self {
        Self { storefront, desk }
    }
}

/// Telegram user id as stored in orders; 0 when absent or out of range.
pub fn sender_id(user: Option<&User>) -> i64 {
    user.and_then(|u| i64::try_from(u.id.0).ok()).unwrap_or(0)
}
