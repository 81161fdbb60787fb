//! SQLite order store: connection pool, migrations and queries

pub mod db;
pub mod migrations;
pub mod orders;

// Re-exports for convenience
pub use db::{create_pool, get_connection, DbConnection, DbPool};
