//! End-to-end tests of the queue-then-dispatch flow against a real SQLite
//! database and mock publishers.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use libslotcast::db::Database;
use libslotcast::dispatch::Dispatcher;
use libslotcast::error::PublishError;
use libslotcast::publish::mock::MockPublisher;
use libslotcast::publish::PublisherRegistry;
use libslotcast::queue::enqueue_scheduled;
use libslotcast::schedule::{to_epoch, Weekday, WeeklySlot};
use libslotcast::types::{Platform, PlatformCredential, PostStatus};

// 2024-01-03 was a Wednesday
fn wednesday_at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 3)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

async fn setup() -> (Database, MockPublisher, Dispatcher) {
    let db = Database::new(":memory:").await.unwrap();
    let mock = MockPublisher::success(Platform::Mastodon);

    let mut registry = PublisherRegistry::new();
    registry.insert(Box::new(mock.clone()));

    let dispatcher = Dispatcher::new(db.clone(), registry);
    (db, mock, dispatcher)
}

async fn connect(db: &Database, user_id: &str, platform: Platform) {
    db.set_credential(&PlatformCredential {
        id: None,
        user_id: user_id.to_string(),
        platform,
        access_token: "token".to_string(),
        author_urn: None,
        issued_at: 0,
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn queued_post_is_published_when_its_slot_arrives() {
    let (db, mock, dispatcher) = setup().await;
    connect(&db, "alice", Platform::Mastodon).await;

    db.add_slot(&WeeklySlot::new(
        "alice",
        Weekday::Wed,
        NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
    ))
    .await
    .unwrap();

    // Enqueued at 10:00, so it resolves to today's 14:00 slot
    let post = enqueue_scheduled(
        &db,
        "alice",
        Platform::Mastodon,
        "Release notes",
        "Version 0.2 is out.",
        wednesday_at(10, 0),
    )
    .await
    .unwrap();
    assert_eq!(post.scheduled_at, to_epoch(wednesday_at(14, 0)));

    // Before the slot nothing happens
    let report = dispatcher.run_tick(wednesday_at(13, 59)).await.unwrap();
    assert_eq!(report.due, 0);

    // At the slot the post goes out exactly once
    let report = dispatcher.run_tick(wednesday_at(14, 0)).await.unwrap();
    assert_eq!(report.published, 1);

    let published = mock.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].title, "Release notes");

    let fetched = db.get_post(&post.id).await.unwrap().unwrap();
    assert_eq!(fetched.status, PostStatus::Published);
    assert!(fetched.published_at.unwrap() >= fetched.scheduled_at);
}

#[tokio::test]
async fn disconnected_user_post_waits_across_ticks() {
    let (db, mock, dispatcher) = setup().await;
    // No credential for bob

    db.add_slot(&WeeklySlot::new(
        "bob",
        Weekday::Wed,
        NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
    ))
    .await
    .unwrap();

    let post = enqueue_scheduled(
        &db,
        "bob",
        Platform::Mastodon,
        "Title",
        "Body",
        wednesday_at(10, 0),
    )
    .await
    .unwrap();

    // Several ticks pass without a connection; the post survives them all
    for hour in [14, 15, 16] {
        let report = dispatcher.run_tick(wednesday_at(hour, 0)).await.unwrap();
        assert_eq!(report.not_connected, 1);
    }
    assert_eq!(mock.call_count(), 0);

    // Once bob connects, the next tick delivers
    connect(&db, "bob", Platform::Mastodon).await;
    let report = dispatcher.run_tick(wednesday_at(17, 0)).await.unwrap();
    assert_eq!(report.published, 1);

    let fetched = db.get_post(&post.id).await.unwrap().unwrap();
    assert_eq!(fetched.status, PostStatus::Published);
}

#[tokio::test]
async fn rejected_post_is_retried_next_tick() {
    let db = Database::new(":memory:").await.unwrap();
    connect(&db, "alice", Platform::Mastodon).await;

    db.add_slot(&WeeklySlot::new(
        "alice",
        Weekday::Wed,
        NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
    ))
    .await
    .unwrap();

    let post = enqueue_scheduled(
        &db,
        "alice",
        Platform::Mastodon,
        "Title",
        "Body",
        wednesday_at(10, 0),
    )
    .await
    .unwrap();

    // First dispatcher rejects everything
    let failing = MockPublisher::failing(
        Platform::Mastodon,
        PublishError::RemoteRejected("instance down".to_string()),
    );
    let mut registry = PublisherRegistry::new();
    registry.insert(Box::new(failing.clone()));
    let dispatcher = Dispatcher::new(db.clone(), registry);

    let report = dispatcher.run_tick(wednesday_at(14, 0)).await.unwrap();
    assert_eq!(report.rejected, 1);
    assert_eq!(failing.call_count(), 1);
    assert_eq!(
        db.get_post(&post.id).await.unwrap().unwrap().status,
        PostStatus::Queued
    );

    // A healthy dispatcher picks the same post up on the next tick
    let ok = MockPublisher::success(Platform::Mastodon);
    let mut registry = PublisherRegistry::new();
    registry.insert(Box::new(ok.clone()));
    let dispatcher = Dispatcher::new(db.clone(), registry);

    let report = dispatcher.run_tick(wednesday_at(14, 1)).await.unwrap();
    assert_eq!(report.published, 1);
    assert_eq!(ok.call_count(), 1);
}

#[tokio::test]
async fn user_queue_reflects_dispatch_progress() {
    let (db, _mock, dispatcher) = setup().await;
    connect(&db, "alice", Platform::Mastodon).await;

    db.add_slot(&WeeklySlot::new(
        "alice",
        Weekday::Wed,
        NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
    ))
    .await
    .unwrap();
    db.add_slot(&WeeklySlot::new(
        "alice",
        Weekday::Thu,
        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
    ))
    .await
    .unwrap();

    // First post lands on Wed 14:00; the second, enqueued after that slot has
    // passed, lands on Thu 09:00
    let first = enqueue_scheduled(
        &db,
        "alice",
        Platform::Mastodon,
        "First",
        "Body",
        wednesday_at(10, 0),
    )
    .await
    .unwrap();
    let second = enqueue_scheduled(
        &db,
        "alice",
        Platform::Mastodon,
        "Second",
        "Body",
        wednesday_at(15, 0),
    )
    .await
    .unwrap();
    assert!(second.scheduled_at > first.scheduled_at);

    dispatcher.run_tick(wednesday_at(14, 30)).await.unwrap();

    let queue = db.list_by_user("alice").await.unwrap();
    assert_eq!(queue.published.len(), 1);
    assert_eq!(queue.published[0].id, first.id);
    assert_eq!(queue.pending.len(), 1);
    assert_eq!(queue.pending[0].id, second.id);
}

#[tokio::test]
async fn failure_for_one_user_does_not_block_others() {
    let (db, mock, dispatcher) = setup().await;
    connect(&db, "alice", Platform::Mastodon).await;
    // carol queues to a platform with no registered publisher
    connect(&db, "carol", Platform::Linkedin).await;

    let slot_time = NaiveTime::from_hms_opt(14, 0, 0).unwrap();
    for user in ["alice", "bob", "carol"] {
        db.add_slot(&WeeklySlot::new(user, Weekday::Wed, slot_time))
            .await
            .unwrap();
    }

    let alice_post = enqueue_scheduled(
        &db,
        "alice",
        Platform::Mastodon,
        "Alice",
        "Body",
        wednesday_at(10, 0),
    )
    .await
    .unwrap();
    // bob never connected Mastodon
    enqueue_scheduled(
        &db,
        "bob",
        Platform::Mastodon,
        "Bob",
        "Body",
        wednesday_at(10, 0),
    )
    .await
    .unwrap();
    enqueue_scheduled(
        &db,
        "carol",
        Platform::Linkedin,
        "Carol",
        "Body",
        wednesday_at(10, 0),
    )
    .await
    .unwrap();

    let report = dispatcher.run_tick(wednesday_at(14, 0)).await.unwrap();
    assert_eq!(report.due, 3);
    assert_eq!(report.published, 1);
    assert_eq!(report.not_connected, 1);
    assert_eq!(report.unsupported, 1);

    assert_eq!(mock.published()[0].title, "Alice");
    assert_eq!(
        db.get_post(&alice_post.id).await.unwrap().unwrap().status,
        PostStatus::Published
    );
}
