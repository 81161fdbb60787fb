//! Deferred-release scheduler.
//!
//! Runs as a `tokio::spawn`ed task polling the calendar. Once the release
//! date is reached it notifies every pre-sale buyer whose order is approved
//! or delivered, then tells the operator to start distributing links.
//! A `release_runs` row claimed before sending makes the batch fire at most
//! once per release date, whatever the polling interval or number of restarts.

use chrono::{NaiveDate, Utc};
use fluent_templates::fluent_bundle::FluentArgs;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::catalog;
use crate::core::error::AppResult;
use crate::i18n;
use crate::messaging::Messenger;
use crate::orders::Operator;
use crate::storage::db::DbPool;
use crate::storage::{get_connection, orders as store};

/// Source of "today".
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Calendar date in UTC.
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Always returns the same date (one-shot CLI runs, tests).
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Release date is still in the future
    NotDue,
    /// The batch for this release date was already sent
    AlreadyFired,
    Fired { notified: usize, failed: usize },
}

pub struct ReleaseScheduler {
    db_pool: Arc<DbPool>,
    messenger: Arc<dyn Messenger>,
    operator: Operator,
    release_date: NaiveDate,
    clock: Arc<dyn Clock>,
}

impl ReleaseScheduler {
    pub fn new(db_pool: Arc<DbPool>, messenger: Arc<dyn Messenger>, operator: Operator, release_date: NaiveDate) -> Self {
        Self {
            db_pool,
            messenger,
            operator,
            release_date,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn release_date(&self) -> NaiveDate {
        self.release_date
    }

    /// Runs the trigger against the scheduler's clock.
    pub async fn check_now(&self) -> AppResult<ReleaseOutcome> {
        self.run_once(self.clock.today()).await
    }

    /// Fires the release batch if `today` has reached the release date and it has not fired yet.
    ///
    /// Individual send failures are logged and counted, never propagated.
    pub async fn run_once(&self, today: NaiveDate) -> AppResult<ReleaseOutcome> {
        if today < self.release_date {
            return Ok(ReleaseOutcome::NotDue);
        }

        let cohort = {
            let conn = get_connection(&self.db_pool)?;
            if store::release_run_exists(&conn, self.release_date)? || !store::claim_release_run(&conn, self.release_date)? {
                return Ok(ReleaseOutcome::AlreadyFired);
            }
            store::release_cohort(&conn)?
        };

        log::info!(
            "Release date {} reached, notifying {} pre-sale buyer(s)",
            self.release_date,
            cohort.len()
        );

        let mut notified = 0;
        let mut failed = 0;
        for order in &cohort {
            let mut args = FluentArgs::new();
            args.set("product", catalog::entry(order.product).name(order.language));
            let text = i18n::t_args(order.language, "release-available", &args);

            match self.messenger.send_text(order.buyer_id, &text, None).await {
                Ok(()) => notified += 1,
                Err(e) => {
                    failed += 1;
                    log::warn!(
                        "Release notice for order #{} to buyer {} failed: {}",
                        order.id,
                        order.buyer_id,
                        e
                    );
                }
            }
        }

        let mut args = FluentArgs::new();
        args.set(
            "date",
            catalog::format_release_date(self.operator.locale, self.release_date),
        );
        args.set("notified", notified.to_string());
        args.set("failed", failed.to_string());
        let summary = i18n::t_args(self.operator.locale, "admin-release-arrived", &args);
        if let Err(e) = self.messenger.send_text(self.operator.id, &summary, None).await {
            log::error!("Failed to notify operator about release: {}", e);
        }

        log::info!("Release batch done: {} notified, {} failed", notified, failed);
        Ok(ReleaseOutcome::Fired { notified, failed })
    }

    /// Starts the polling loop. The first check runs immediately.
    pub fn start(self: Arc<Self>, check_interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(check_interval);

            log::info!(
                "Release scheduler started (release date: {}, interval: {}s)",
                self.release_date,
                check_interval.as_secs()
            );

            loop {
                ticker.tick().await;

                match self.check_now().await {
                    Ok(ReleaseOutcome::Fired { notified, failed }) => {
                        log::info!("Release fired: {} notified, {} failed", notified, failed);
                    }
                    Ok(outcome) => log::debug!("Release check: {:?}", outcome),
                    Err(e) => log::error!("Release check failed: {}", e),
                }
            }
        })
    }
}
