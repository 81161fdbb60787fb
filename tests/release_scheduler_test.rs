//! Deferred-release trigger: cohort selection, idempotence and failure isolation
//!
//! Run with: cargo test --test release_scheduler_test

mod common;

use chrono::Duration;
use std::sync::Arc;

use channelshop::catalog::ProductId;
use channelshop::i18n::Locale;
use channelshop::orders::{FixedClock, OrderStatus, ReleaseOutcome, ReleaseScheduler};
use channelshop::storage::{get_connection, orders as store};
use common::{release_date, TestEnvironment, OPERATOR_ID};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn notifies_only_approved_and_delivered_presale_buyers() {
    let env = TestEnvironment::new();
    env.seed_order(1, ProductId::Channel2026, Locale::En, OrderStatus::Approved);
    env.seed_order(2, ProductId::Brazil2026, Locale::Pt, OrderStatus::Delivered);
    env.seed_order(3, ProductId::Channel2026, Locale::En, OrderStatus::Pending);
    env.seed_order(4, ProductId::Channel2026, Locale::En, OrderStatus::ProofReceived);
    env.seed_order(5, ProductId::Brazil2026, Locale::Pt, OrderStatus::Rejected);
    env.seed_order(6, ProductId::Premium, Locale::En, OrderStatus::Approved);

    let outcome = env.release.run_once(release_date()).await.unwrap();

    assert_eq!(outcome, ReleaseOutcome::Fired { notified: 2, failed: 0 });
    assert_eq!(env.messenger.texts_to(1).len(), 1);
    assert!(env.messenger.texts_to(1)[0].contains("Channel 2026"));
    assert_eq!(env.messenger.texts_to(2).len(), 1);
    assert!(env.messenger.texts_to(2)[0].contains("Brasil 2026"));
    for buyer in 3..=6 {
        assert!(env.messenger.texts_to(buyer).is_empty(), "buyer {} was notified", buyer);
    }

    let summary = env.messenger.last_text_to(OPERATOR_ID).unwrap();
    assert!(summary.contains("2 buyer(s) notified, 0 failure(s)"));
}

#[tokio::test]
async fn nothing_happens_before_release_date() {
    let env = TestEnvironment::new();
    env.seed_order(1, ProductId::Channel2026, Locale::En, OrderStatus::Approved);

    let day_before = release_date() - Duration::days(1);
    assert_eq!(env.release.run_once(day_before).await.unwrap(), ReleaseOutcome::NotDue);
    assert!(env.messenger.sent().is_empty());

    // Nothing was claimed, so the real date still fires
    assert_eq!(
        env.release.run_once(release_date()).await.unwrap(),
        ReleaseOutcome::Fired { notified: 1, failed: 0 }
    );
}

#[tokio::test]
async fn fires_at_most_once_per_release_date() {
    let env = TestEnvironment::new();
    env.seed_order(1, ProductId::Channel2026, Locale::En, OrderStatus::Approved);

    let first = env.release.run_once(release_date()).await.unwrap();
    assert_eq!(first, ReleaseOutcome::Fired { notified: 1, failed: 0 });
    let sent_after_first = env.messenger.sent().len();

    assert_eq!(
        env.release.run_once(release_date()).await.unwrap(),
        ReleaseOutcome::AlreadyFired
    );
    assert_eq!(
        env.release.run_once(release_date() + Duration::days(3)).await.unwrap(),
        ReleaseOutcome::AlreadyFired
    );
    assert_eq!(env.messenger.sent().len(), sent_after_first);

    let conn = get_connection(&env.db_pool).unwrap();
    assert!(store::release_run_exists(&conn, release_date()).unwrap());
}

#[tokio::test]
async fn late_start_still_fires() {
    let env = TestEnvironment::new();
    env.seed_order(1, ProductId::Brazil2026, Locale::Pt, OrderStatus::Approved);

    let outcome = env
        .release
        .run_once(release_date() + Duration::days(10))
        .await
        .unwrap();
    assert_eq!(outcome, ReleaseOutcome::Fired { notified: 1, failed: 0 });
}

#[tokio::test]
async fn failed_send_does_not_stop_the_batch() {
    let env = TestEnvironment::new();
    env.seed_order(1, ProductId::Channel2026, Locale::En, OrderStatus::Approved);
    env.seed_order(2, ProductId::Channel2026, Locale::En, OrderStatus::Approved);
    env.seed_order(3, ProductId::Brazil2026, Locale::Pt, OrderStatus::Delivered);
    env.messenger.fail_for(2);

    let outcome = env.release.run_once(release_date()).await.unwrap();

    assert_eq!(outcome, ReleaseOutcome::Fired { notified: 2, failed: 1 });
    assert_eq!(env.messenger.texts_to(1).len(), 1);
    assert_eq!(env.messenger.texts_to(3).len(), 1);
    assert!(env
        .messenger
        .last_text_to(OPERATOR_ID)
        .unwrap()
        .contains("1 failure(s)"));
}

#[tokio::test]
async fn check_now_uses_the_configured_clock() {
    let env = TestEnvironment::new();
    env.seed_order(1, ProductId::Channel2026, Locale::En, OrderStatus::Approved);

    let messenger = env.messenger.clone();
    let scheduler = ReleaseScheduler::new(env.db_pool.clone(), messenger, env.operator, release_date())
        .with_clock(Arc::new(FixedClock(release_date())));

    assert_eq!(
        scheduler.check_now().await.unwrap(),
        ReleaseOutcome::Fired { notified: 1, failed: 0 }
    );
    // Shares the marker with every other scheduler on the same database
    assert_eq!(
        env.release.run_once(release_date()).await.unwrap(),
        ReleaseOutcome::AlreadyFired
    );
}

#[tokio::test]
async fn operator_release_check_reports_state() {
    let env = TestEnvironment::new();
    env.seed_order(1, ProductId::Channel2026, Locale::En, OrderStatus::Approved);

    let clock = Arc::new(FixedClock(release_date()));
    let scheduler = Arc::new(
        ReleaseScheduler::new(env.db_pool.clone(), env.messenger.clone(), env.operator, release_date())
            .with_clock(clock),
    );
    let desk = channelshop::operator::OperatorDesk::new(env.arbiter.clone(), scheduler, env.messenger.clone());

    desk.release_check(OPERATOR_ID).await.unwrap();
    assert!(env
        .messenger
        .last_text_to(OPERATOR_ID)
        .unwrap()
        .contains("1 buyer(s) notified"));

    desk.release_check(OPERATOR_ID).await.unwrap();
    assert_eq!(
        env.messenger.last_text_to(OPERATOR_ID).unwrap(),
        "📅 Release notices for Jan 2, 2026 were already sent."
    );

    // Non-operators get nothing
    let before = env.messenger.sent().len();
    desk.release_check(1).await.unwrap();
    assert_eq!(env.messenger.sent().len(), before);
}
