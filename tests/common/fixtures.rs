//! Test fixtures for integration tests
//!
//! Provides TestEnvironment that wires the whole order flow the same way
//! `run_bot` does, but on a temporary SQLite file and a recording messenger.

#![allow(dead_code)]

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use channelshop::catalog::{PaymentMethod, ProductId};
use channelshop::i18n::Locale;
use channelshop::messaging::{Evidence, Messenger};
use channelshop::operator::OperatorDesk;
use channelshop::orders::{Arbiter, LifecycleEngine, NewOrder, Operator, Order, OrderStatus, ReleaseScheduler};
use channelshop::session::SessionStore;
use channelshop::storage::{create_pool, get_connection, orders as store, DbPool};
use channelshop::storefront::Storefront;

use super::RecordingMessenger;

pub const OPERATOR_ID: i64 = 9_000;
pub const BUYER_ID: i64 = 1_001;

pub fn release_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 2).unwrap()
}

/// Complete test environment
///
/// # Example
/// ```ignore
/// let env = TestEnvironment::new();
/// env.storefront.start(BUYER_ID).await?;
/// assert_eq!(env.messenger.texts_to(BUYER_ID).len(), 1);
/// ```
pub struct TestEnvironment {
    /// Keeps the database file alive for the test duration
    _dir: TempDir,
    pub db_pool: Arc<DbPool>,
    pub messenger: Arc<RecordingMessenger>,
    pub sessions: Arc<SessionStore>,
    pub operator: Operator,
    pub engine: Arc<LifecycleEngine>,
    pub arbiter: Arc<Arbiter>,
    pub release: Arc<ReleaseScheduler>,
    pub storefront: Arc<Storefront>,
    pub desk: Arc<OperatorDesk>,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.sqlite");
        let db_pool = Arc::new(create_pool(path.to_str().unwrap()).unwrap());

        let messenger = Arc::new(RecordingMessenger::new());
        let as_messenger: Arc<dyn Messenger> = messenger.clone();
        let operator = Operator::new(OPERATOR_ID, Locale::En);

        let sessions = Arc::new(SessionStore::new(Duration::from_secs(3600), 1_000));
        let engine = Arc::new(LifecycleEngine::new(db_pool.clone(), as_messenger.clone(), operator));
        let arbiter = Arc::new(Arbiter::new(
            db_pool.clone(),
            as_messenger.clone(),
            sessions.clone(),
            operator,
        ));
        let release = Arc::new(ReleaseScheduler::new(
            db_pool.clone(),
            as_messenger.clone(),
            operator,
            release_date(),
        ));
        let storefront = Arc::new(Storefront::new(
            sessions.clone(),
            engine.clone(),
            as_messenger.clone(),
            release_date(),
        ));
        let desk = Arc::new(OperatorDesk::new(arbiter.clone(), release.clone(), as_messenger));

        Self {
            _dir: dir,
            db_pool,
            messenger,
            sessions,
            operator,
            engine,
            arbiter,
            release,
            storefront,
            desk,
        }
    }

    /// Inserts an order and walks it along the lifecycle up to `status`.
    pub fn seed_order(&self, buyer_id: i64, product: ProductId, language: Locale, status: OrderStatus) -> Order {
        let conn = get_connection(&self.db_pool).unwrap();
        let order = store::insert_order(
            &conn,
            &NewOrder {
                buyer_id,
                buyer_handle: Some(format!("buyer{}", buyer_id)),
                language,
                product,
                payment_method: Some(PaymentMethod::Wise),
            },
        )
        .unwrap();

        let path: &[OrderStatus] = match status {
            OrderStatus::Pending => &[],
            OrderStatus::ProofReceived => &[OrderStatus::ProofReceived],
            OrderStatus::Approved => &[OrderStatus::ProofReceived, OrderStatus::Approved],
            OrderStatus::Rejected => &[OrderStatus::ProofReceived, OrderStatus::Rejected],
            OrderStatus::Delivered => &[
                OrderStatus::ProofReceived,
                OrderStatus::Approved,
                OrderStatus::Delivered,
            ],
        };
        let mut current = OrderStatus::Pending;
        for next in path {
            assert!(store::transition_status(&conn, order.id, current, *next).unwrap());
            current = *next;
        }

        store::get_order(&conn, order.id).unwrap().unwrap()
    }

    pub fn status_of(&self, order: &Order) -> OrderStatus {
        let conn = get_connection(&self.db_pool).unwrap();
        store::get_order(&conn, order.id).unwrap().unwrap().status
    }

    /// Buyer conversation up to the payment instructions.
    pub async fn buy(&self, buyer_id: i64, locale: Locale, product: ProductId, method: PaymentMethod) -> Order {
        self.storefront.start(buyer_id).await.unwrap();
        self.storefront.choose_language(buyer_id, locale).await.unwrap();
        self.storefront.choose_product(buyer_id, product).await.unwrap();
        self.storefront
            .choose_payment(buyer_id, Some(format!("buyer{}", buyer_id)), method)
            .await
            .unwrap()
            .unwrap()
    }

    pub fn evidence(buyer_id: i64, message_id: i32) -> Evidence {
        Evidence {
            chat_id: buyer_id,
            message_id,
        }
    }
}
