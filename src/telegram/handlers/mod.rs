//! Telegram bot handler tree configuration
//!
//! The handlers only translate updates into storefront and operator-desk
//! calls, so integration tests can drive the same flow without Telegram.

mod schema;
mod types;

pub use schema::schema;
pub use types::{sender_id, HandlerDeps, HandlerError};
