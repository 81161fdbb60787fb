//! Channelshop - Telegram storefront selling access to private channels
//!
//! Buyers pick a language, a product and a payment method, then send a
//! payment receipt. A single operator approves or rejects each receipt and
//! hand-delivers the access link. Pre-sale buyers are notified once the
//! release date arrives.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors and logging
//! - `storage`: SQLite pool, migrations and the order store
//! - `orders`: lifecycle state machine, arbitration and release scheduler
//! - `storefront` / `operator`: buyer and operator conversations
//! - `telegram`: Telegram bot integration and handlers

pub mod catalog;
pub mod cli;
pub mod core;
pub mod i18n;
pub mod messaging;
pub mod operator;
pub mod orders;
pub mod session;
pub mod storage;
pub mod storefront;
pub mod telegram;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult};
pub use storage::{create_pool, get_connection, DbConnection, DbPool};
