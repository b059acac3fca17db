//! Integration tests for the dispatcher against the in-memory broker.
//!
//! Every run is bounded by a timeout; a hang means the dispatcher failed to
//! notice the end of its stream or to drain in-flight handlers.

#![cfg(all(feature = "sqlite", feature = "migrate"))]

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{Value, json};
use syncwright::dispatch::memory::{Outcome, Settlement};
use syncwright::dispatch::subject::repository_subject;
use syncwright::dispatch::{
    DispatchStats, Dispatcher, Disposition, MemoryBroker, MessageSource, Subscription,
};
use syncwright::entity::prelude::*;
use syncwright::settings::BrokerSettings;
use syncwright::webhook::{EventType, HandlerRegistry};
use syncwright::EngineContext;
use tokio_util::sync::CancellationToken;

use common::*;

/// If exceeded, the dispatcher is likely stuck.
const RUN_TIMEOUT: Duration = Duration::from_secs(10);

fn broker_settings() -> BrokerSettings {
    BrokerSettings {
        max_in_flight: 1,
        max_deliver: 3,
        ..BrokerSettings::default()
    }
}

fn subject(event_type: EventType) -> String {
    repository_subject("github", ORG, REPO, event_type)
}

fn publish(broker: &MemoryBroker, event_type: EventType, payload: &Value) {
    broker.publish(subject(event_type), body(payload));
}

async fn run(ctx: &EngineContext, broker: &MemoryBroker) -> DispatchStats {
    let registry = Arc::new(HandlerRegistry::standard().expect("standard registry"));
    let dispatcher =
        Dispatcher::new(ctx.clone(), registry, Arc::new(broker.clone()), broker_settings());
    broker.close();
    tokio::time::timeout(RUN_TIMEOUT, dispatcher.run(CancellationToken::new()))
        .await
        .expect("dispatcher should stop once the stream ends")
        .expect("dispatcher run")
}

fn settlements_for(outcomes: &[Outcome], subject: &str) -> Vec<(u32, Settlement)> {
    outcomes
        .iter()
        .filter(|o| o.subject == subject)
        .map(|o| (o.delivered, o.settlement))
        .collect()
}

#[tokio::test]
async fn test_events_are_applied_and_acked() {
    let ctx = setup_context().await;
    let broker = MemoryBroker::new();
    publish(&broker, EventType::Issues, &issues_event("opened", issue(101, 1, "Crash on start")));
    publish(&broker, EventType::Issues, &issues_event("edited", issue(101, 1, "Crash on startup")));

    let stats = run(&ctx, &broker).await;

    assert_eq!(stats.acked, 2);
    assert_eq!(stats.nakked, 0);
    assert_eq!(stats.subscriptions, 1);
    let stored = IssueEntity::find_by_id(101).one(&ctx.db).await.unwrap().unwrap();
    assert_eq!(stored.title, "Crash on startup");
}

#[tokio::test]
async fn test_subscription_covers_monitored_repositories() {
    let ctx = setup_context().await;
    let broker = MemoryBroker::new();
    run(&ctx, &broker).await;

    let subscriptions = broker.subscriptions();
    assert_eq!(subscriptions.len(), 1);
    let filters = &subscriptions[0].filter_subjects;
    assert!(filters.contains(&"github.acme.api.issues".to_string()));
    assert!(filters.contains(&"github.acme.?.installation".to_string()));
    assert!(!filters.contains(&"github.acme.?.issues".to_string()));
    assert_eq!(subscriptions[0].durable_name, "syncwright");
    assert_eq!(subscriptions[0].max_deliver, 3);
}

#[tokio::test]
async fn test_out_of_order_thread_resolution_converges() {
    let ctx = setup_context().await;
    let broker = MemoryBroker::new();
    let root = review_comment(2001, None, "2026-03-01T12:00:00Z");
    publish(
        &broker,
        EventType::PullRequestReviewThread,
        &review_thread_event("resolved", vec![root.clone()]),
    );
    publish(
        &broker,
        EventType::PullRequestReviewComment,
        &review_comment_event("created", root, 300),
    );

    let stats = run(&ctx, &broker).await;

    assert_eq!(stats.nakked, 1);
    assert_eq!(stats.acked, 2);
    let thread_subject = subject(EventType::PullRequestReviewThread);
    let settlements = settlements_for(&broker.outcomes(), &thread_subject);
    assert_eq!(settlements.len(), 2);
    assert!(matches!(settlements[0], (1, Settlement::Nakked { delay: Some(_) })));
    assert_eq!(settlements[1], (2, Settlement::Acked));

    let thread = ReviewThread::find_by_id(2001).one(&ctx.db).await.unwrap().unwrap();
    assert_eq!(thread.state, ThreadState::Resolved);
}

/// Comment and review rows as `(id, review, thread)` and `(id, state)`.
async fn review_snapshot(
    ctx: &EngineContext,
) -> (Vec<(i64, Option<i64>, i64)>, Vec<(i64, ReviewState)>) {
    let comments = ReviewComment::find()
        .all(&ctx.db)
        .await
        .unwrap()
        .into_iter()
        .map(|c| (c.id, c.review_id, c.thread_id))
        .collect();
    let reviews = PullRequestReview::find()
        .all(&ctx.db)
        .await
        .unwrap()
        .into_iter()
        .map(|r| (r.id, r.state))
        .collect();
    (comments, reviews)
}

#[tokio::test]
async fn test_comment_before_its_review_converges() {
    let mut comment = review_comment(2001, None, "2026-03-01T12:00:00Z");
    comment["pull_request_review_id"] = json!(1001);
    let comment_event = review_comment_event("created", comment, 300);
    let review = review_event("submitted", 1001, "commented", 300);

    let ctx = setup_context().await;
    let broker = MemoryBroker::new();
    publish(&broker, EventType::PullRequestReviewComment, &comment_event);
    publish(&broker, EventType::PullRequestReview, &review);

    let stats = run(&ctx, &broker).await;

    assert_eq!(stats.nakked, 1);
    assert_eq!(stats.acked, 2);
    let comment_subject = subject(EventType::PullRequestReviewComment);
    let settlements = settlements_for(&broker.outcomes(), &comment_subject);
    assert_eq!(settlements.len(), 2);
    assert!(matches!(settlements[0], (1, Settlement::Nakked { delay: Some(_) })));
    assert_eq!(settlements[1], (2, Settlement::Acked));

    let in_order = setup_context().await;
    let in_order_broker = MemoryBroker::new();
    publish(&in_order_broker, EventType::PullRequestReview, &review);
    publish(&in_order_broker, EventType::PullRequestReviewComment, &comment_event);
    let in_order_stats = run(&in_order, &in_order_broker).await;
    assert_eq!(in_order_stats.nakked, 0);

    let converged = review_snapshot(&ctx).await;
    assert_eq!(converged, review_snapshot(&in_order).await);
    assert_eq!(converged.0, vec![(2001, Some(1001), 2001)]);
}

#[tokio::test]
async fn test_replayed_review_is_counted_once() {
    let ctx = setup_context().await;
    let broker = MemoryBroker::new();
    let event = review_event("submitted", 1001, "approved", 300);
    publish(&broker, EventType::PullRequestReview, &event);
    publish(&broker, EventType::PullRequestReview, &event);

    let stats = run(&ctx, &broker).await;

    assert_eq!(stats.acked, 2);
    assert_eq!(PullRequestReview::find().count(&ctx.db).await.unwrap(), 1);
    assert_eq!(ContributionEvent::find().count(&ctx.db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_permanent_failures_are_dropped() {
    let ctx = setup_context().await;
    let broker = MemoryBroker::new();
    publish(&broker, EventType::Issues, &json!({"action": "opened"}));

    let stats = run(&ctx, &broker).await;

    assert_eq!(stats.dropped, 1);
    assert_eq!(stats.nakked, 0);
    let settlements = settlements_for(&broker.outcomes(), &subject(EventType::Issues));
    assert_eq!(settlements, vec![(1, Settlement::Acked)]);
}

#[tokio::test]
async fn test_retryable_failure_stops_at_max_deliver() {
    let ctx = setup_context().await;
    let broker = MemoryBroker::new();
    let orphan = review_comment(2002, Some(2001), "2026-03-01T12:05:00Z");
    publish(
        &broker,
        EventType::PullRequestReviewComment,
        &review_comment_event("created", orphan, 300),
    );

    let stats = run(&ctx, &broker).await;

    assert_eq!(stats.nakked, 3);
    let comment_subject = subject(EventType::PullRequestReviewComment);
    let delivered: Vec<u32> = settlements_for(&broker.outcomes(), &comment_subject)
        .into_iter()
        .map(|(delivered, _)| delivered)
        .collect();
    assert_eq!(delivered, vec![1, 2, 3]);
    assert_eq!(ReviewComment::find().count(&ctx.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_event_on_subject_is_dropped() {
    let ctx = setup_context().await;
    let broker = MemoryBroker::new();
    let registry = Arc::new(HandlerRegistry::standard().unwrap());
    let dispatcher =
        Dispatcher::new(ctx.clone(), registry, Arc::new(broker.clone()), broker_settings());

    broker.publish("github.acme.api.star", "{}");
    broker.publish("not-a-subject", "{}");
    broker.close();

    // Neither subject is in the dispatcher's filter, so route them directly.
    let mut stream = broker
        .subscribe(&Subscription {
            durable_name: "drain".into(),
            filter_subjects: vec![">".into()],
            start_time: Utc::now() - chrono::Duration::days(1),
            max_deliver: 1,
        })
        .await
        .unwrap();
    let mut dropped = 0;
    while let Some(message) = stream.next().await {
        let message = message.unwrap();
        let disposition = dispatcher.process(&message).await;
        assert!(matches!(disposition, Disposition::Drop { .. }));
        message.ack().await.unwrap();
        dropped += 1;
    }
    assert_eq!(dropped, 2);
}

#[tokio::test]
async fn test_cancellation_stops_an_idle_dispatcher() {
    let ctx = setup_context().await;
    let broker = MemoryBroker::new();
    let registry = Arc::new(HandlerRegistry::standard().unwrap());
    let dispatcher =
        Dispatcher::new(ctx.clone(), registry, Arc::new(broker.clone()), broker_settings());
    let cancel = CancellationToken::new();

    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { dispatcher.run(cancel).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let stats = tokio::time::timeout(RUN_TIMEOUT, handle)
        .await
        .expect("dispatcher should honour cancellation")
        .unwrap()
        .unwrap();
    assert_eq!(stats.subscriptions, 1);
    assert_eq!(stats.acked, 0);
}
