//! `orders` and `release_runs` queries.
//!
//! Status changes are single guarded statements (`... WHERE id = ? AND status = ?`),
//! so a transition from a stale state affects zero rows instead of clobbering.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::str::FromStr;

use crate::catalog;
use crate::orders::model::{NewOrder, Order, OrderId, OrderStatus};

const ORDER_COLUMNS: &str =
    "id, buyer_id, buyer_handle, language, product, payment_method, status, is_deferred_cohort, created_at";

fn parse_column<T: FromStr>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    let payment_method = match row.get::<_, Option<String>>(5)? {
        Some(raw) => Some(
            raw.parse()
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?,
        ),
        None => None,
    };
    let created_at: String = row.get(8)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?;

    Ok(Order {
        id: OrderId(row.get(0)?),
        buyer_id: row.get(1)?,
        buyer_handle: row.get(2)?,
        language: parse_column(row, 3)?,
        product: parse_column(row, 4)?,
        payment_method,
        status: parse_column(row, 6)?,
        is_deferred_cohort: row.get::<_, i64>(7)? != 0,
        created_at,
    })
}

/// Inserts a new order in `pending`. The cohort flag comes from the catalog.
pub fn insert_order(conn: &Connection, new: &NewOrder) -> rusqlite::Result<Order> {
    let created_at = Utc::now();
    let is_deferred_cohort = catalog::entry(new.product).deferred_release;

    conn.execute(
        "INSERT INTO orders
            (buyer_id, buyer_handle, language, product, payment_method, status, is_deferred_cohort, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            new.buyer_id,
            new.buyer_handle,
            new.language.as_ref(),
            new.product.as_ref(),
            new.payment_method.map(|m| m.as_ref().to_string()),
            OrderStatus::Pending.as_ref(),
            is_deferred_cohort as i64,
            created_at.to_rfc3339(),
        ],
    )?;

    Ok(Order {
        id: OrderId(conn.last_insert_rowid()),
        buyer_id: new.buyer_id,
        buyer_handle: new.buyer_handle.clone(),
        language: new.language,
        product: new.product,
        payment_method: new.payment_method,
        status: OrderStatus::Pending,
        is_deferred_cohort,
        created_at,
    })
}

pub fn get_order(conn: &Connection, id: OrderId) -> rusqlite::Result<Option<Order>> {
    conn.query_row(
        &format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLUMNS),
        params![id.0],
        order_from_row,
    )
    .optional()
}

/// The buyer's most recently created order. Older orders are not addressable here.
pub fn latest_order_for(conn: &Connection, buyer_id: i64) -> rusqlite::Result<Option<Order>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM orders WHERE buyer_id = ?1 ORDER BY id DESC LIMIT 1",
            ORDER_COLUMNS
        ),
        params![buyer_id],
        order_from_row,
    )
    .optional()
}

/// Moves `id` from `from` to `to`. Returns `false` when the order is not in `from`.
pub fn transition_status(conn: &Connection, id: OrderId, from: OrderStatus, to: OrderStatus) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE orders SET status = ?1 WHERE id = ?2 AND status = ?3",
        params![to.as_ref(), id.0, from.as_ref()],
    )?;
    Ok(changed == 1)
}

/// Records the payment method on a `pending` order.
pub fn set_payment_method(conn: &Connection, id: OrderId, method: catalog::PaymentMethod) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE orders SET payment_method = ?1 WHERE id = ?2 AND status = ?3",
        params![method.as_ref(), id.0, OrderStatus::Pending.as_ref()],
    )?;
    Ok(changed == 1)
}

/// Deferred-release orders whose buyers must hear about the release.
pub fn release_cohort(conn: &Connection) -> rusqlite::Result<Vec<Order>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM orders
         WHERE is_deferred_cohort = 1 AND status IN (?1, ?2)
         ORDER BY id",
        ORDER_COLUMNS
    ))?;
    let rows = stmt.query_map(
        params![OrderStatus::Approved.as_ref(), OrderStatus::Delivered.as_ref()],
        order_from_row,
    )?;
    rows.collect()
}

/// Newest orders first, optionally filtered by status.
pub fn recent_orders(conn: &Connection, status: Option<OrderStatus>, limit: usize) -> rusqlite::Result<Vec<Order>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    match status {
        Some(status) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM orders WHERE status = ?1 ORDER BY id DESC LIMIT ?2",
                ORDER_COLUMNS
            ))?;
            let rows = stmt.query_map(params![status.as_ref(), limit], order_from_row)?;
            rows.collect()
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM orders ORDER BY id DESC LIMIT ?1",
                ORDER_COLUMNS
            ))?;
            let rows = stmt.query_map(params![limit], order_from_row)?;
            rows.collect()
        }
    }
}

/// Claims the release batch for `release_date`.
///
/// Returns `true` for exactly one caller per date; later calls get `false`.
pub fn claim_release_run(conn: &Connection, release_date: NaiveDate) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO release_runs (release_date, fired_at) VALUES (?1, ?2)",
        params![release_date.format("%Y-%m-%d").to_string(), Utc::now().to_rfc3339()],
    )?;
    Ok(changed == 1)
}

pub fn release_run_exists(conn: &Connection, release_date: NaiveDate) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM release_runs WHERE release_date = ?1)",
        params![release_date.format("%Y-%m-%d").to_string()],
        |row| row.get(0),
    )
}
