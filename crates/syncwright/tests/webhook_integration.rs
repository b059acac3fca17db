//! Integration tests for webhook handlers.
//!
//! These tests require the `sqlite` and `migrate` features to be enabled
//! and use an in-memory SQLite database.

#![cfg(all(feature = "sqlite", feature = "migrate"))]

mod common;

use std::collections::BTreeSet;

use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;
use syncwright::entity::prelude::*;
use syncwright::processor::{contribution, issue_link, sync_metadata};
use syncwright::webhook::{EventType, HandlerRegistry};
use syncwright::{EngineContext, HandlerFailure, SyncError};

use common::*;

async fn deliver(
    ctx: &EngineContext,
    event_type: EventType,
    payload: &serde_json::Value,
) -> Result<(), HandlerFailure> {
    let registry = HandlerRegistry::standard().expect("standard registry");
    let handler = registry.get(event_type).expect("handler registered");
    handler.handle(ctx, &body(payload)).await
}

#[tokio::test]
async fn test_issue_upsert_is_idempotent() {
    let ctx = setup_context().await;
    let event = issues_event("opened", issue(101, 1, "Crash on start"));

    deliver(&ctx, EventType::Issues, &event).await.unwrap();
    deliver(&ctx, EventType::Issues, &event).await.unwrap();

    assert_eq!(IssueEntity::find().count(&ctx.db).await.unwrap(), 1);
    assert_eq!(Repository::find().count(&ctx.db).await.unwrap(), 1);
    assert_eq!(Organization::find().count(&ctx.db).await.unwrap(), 1);

    let stored = IssueEntity::find_by_id(101).one(&ctx.db).await.unwrap().unwrap();
    assert_eq!(stored.repository_id, REPO_ID);
    assert_eq!(stored.title, "Crash on start");
    assert_eq!(stored.author_id, Some(7));
}

#[tokio::test]
async fn test_partial_payload_does_not_erase_fields() {
    let ctx = setup_context().await;
    let mut full = issue(101, 1, "Crash on start");
    full["html_url"] = json!("https://github.com/acme/api/issues/1");
    deliver(&ctx, EventType::Issues, &issues_event("opened", full))
        .await
        .unwrap();

    // Sub-issue events carry a slimmer issue shape.
    let minimal = json!({"id": 101, "number": 1, "title": "Crash on start", "state": "closed"});
    let event = json!({
        "action": "sub_issue_added",
        "parent_issue": issue(100, 9, "Epic"),
        "parent_issue_repo": repository(),
        "sub_issue": minimal,
        "sub_issue_repo": repository()
    });
    deliver(&ctx, EventType::SubIssues, &event).await.unwrap();

    let stored = IssueEntity::find_by_id(101).one(&ctx.db).await.unwrap().unwrap();
    assert_eq!(stored.state, IssueState::Closed);
    assert_eq!(
        stored.html_url.as_deref(),
        Some("https://github.com/acme/api/issues/1")
    );
    assert_eq!(stored.author_id, Some(7));
}

#[tokio::test]
async fn test_review_replay_records_one_contribution() {
    let ctx = setup_context().await;
    let event = review_event("submitted", 1001, "approved", 300);

    for _ in 0..3 {
        deliver(&ctx, EventType::PullRequestReview, &event)
            .await
            .unwrap();
    }

    let reviews = PullRequestReview::find().all(&ctx.db).await.unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].id, 1001);
    assert_eq!(reviews[0].state, ReviewState::Approved);
    assert_eq!(reviews[0].author_id, Some(42));
    assert_eq!(reviews[0].pull_request_id, 300);

    let recorded = contribution::list_for_actor(&ctx.db, 42).await.unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].source_type, ContributionSource::PullRequestReview);
    assert_eq!(recorded[0].source_id, 1001);
    assert_eq!(recorded[0].repository_id, Some(REPO_ID));
}

#[tokio::test]
async fn test_stale_submission_after_dismissal_keeps_dismissed() {
    let ctx = setup_context().await;
    let submitted = review_event("submitted", 1001, "approved", 300);

    deliver(&ctx, EventType::PullRequestReview, &submitted).await.unwrap();
    deliver(&ctx, EventType::PullRequestReview, &review_event("dismissed", 1001, "dismissed", 300))
        .await
        .unwrap();
    // Broker redelivery of the original submission.
    deliver(&ctx, EventType::PullRequestReview, &submitted).await.unwrap();

    let review = PullRequestReview::find_by_id(1001).one(&ctx.db).await.unwrap().unwrap();
    assert_eq!(review.state, ReviewState::Dismissed);
    assert!(review.is_dismissed);
    assert_eq!(contribution::list_for_actor(&ctx.db, 42).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_pull_request_stored_with_detail_row() {
    let ctx = setup_context().await;
    deliver(&ctx, EventType::PullRequestReview, &review_event("submitted", 1001, "commented", 300))
        .await
        .unwrap();

    let stored = syncwright::processor::issue::find(&ctx.db, 300)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_pull_request());
    let details = stored.pull_request().unwrap();
    assert_eq!(details.head_ref.as_deref(), Some("feature"));
}

#[tokio::test]
async fn test_pending_review_records_no_contribution() {
    let ctx = setup_context().await;
    deliver(&ctx, EventType::PullRequestReview, &review_event("submitted", 1002, "pending", 300))
        .await
        .unwrap();

    assert_eq!(PullRequestReview::find().count(&ctx.db).await.unwrap(), 1);
    assert!(
        contribution::find(&ctx.db, ContributionSource::PullRequestReview, 1002)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_unknown_review_state_is_permanent() {
    let ctx = setup_context().await;
    let event = review_event("submitted", 1003, "bogus", 300);
    let failure = deliver(&ctx, EventType::PullRequestReview, &event).await.unwrap_err();

    assert!(!failure.retryable);
    // The transaction rolled back, including the parent upserts.
    assert_eq!(IssueEntity::find().count(&ctx.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_malformed_payload_is_permanent() {
    let ctx = setup_context().await;
    let failure = deliver(&ctx, EventType::Issues, &json!({"action": "opened"}))
        .await
        .unwrap_err();

    assert!(!failure.retryable);
    assert!(matches!(failure.error, SyncError::Payload(_)));
}

#[tokio::test]
async fn test_thread_resolution_before_comment_is_retryable() {
    let ctx = setup_context().await;
    let root = review_comment(2001, None, "2026-03-01T12:00:00Z");
    let resolved = review_thread_event("resolved", vec![root.clone()]);

    let failure = deliver(&ctx, EventType::PullRequestReviewThread, &resolved)
        .await
        .unwrap_err();
    assert!(failure.retryable);
    assert!(matches!(failure.error, SyncError::ParentNotFound { .. }));

    deliver(&ctx, EventType::PullRequestReviewComment, &review_comment_event("created", root, 300))
        .await
        .unwrap();
    deliver(&ctx, EventType::PullRequestReviewThread, &resolved)
        .await
        .unwrap();

    let thread = ReviewThread::find_by_id(2001).one(&ctx.db).await.unwrap().unwrap();
    assert_eq!(thread.state, ThreadState::Resolved);
    assert_eq!(thread.resolved_by_id, Some(42));
    assert!(thread.resolved_at.is_some());
    assert_eq!(thread.node_id.as_deref(), Some("PRRT_1"));
}

#[tokio::test]
async fn test_thread_unresolve_clears_resolver() {
    let ctx = setup_context().await;
    let root = review_comment(2001, None, "2026-03-01T12:00:00Z");
    deliver(
        &ctx,
        EventType::PullRequestReviewComment,
        &review_comment_event("created", root.clone(), 300),
    )
        .await
        .unwrap();

    deliver(
        &ctx,
        EventType::PullRequestReviewThread,
        &review_thread_event("resolved", vec![root.clone()]),
    )
        .await
        .unwrap();
    deliver(
        &ctx,
        EventType::PullRequestReviewThread,
        &review_thread_event("unresolved", vec![root]),
    )
        .await
        .unwrap();

    let thread = ReviewThread::find_by_id(2001).one(&ctx.db).await.unwrap().unwrap();
    assert_eq!(thread.state, ThreadState::Unresolved);
    assert_eq!(thread.resolved_by_id, None);
    assert_eq!(thread.resolved_at, None);
}

#[tokio::test]
async fn test_reply_before_parent_is_retryable() {
    let ctx = setup_context().await;
    let reply = review_comment(2002, Some(2001), "2026-03-01T12:05:00Z");

    let event = review_comment_event("created", reply, 300);
    let failure = deliver(&ctx, EventType::PullRequestReviewComment, &event).await.unwrap_err();
    assert!(failure.retryable);
    assert_eq!(ReviewComment::find().count(&ctx.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_deleting_root_comment_re_anchors_thread() {
    let ctx = setup_context().await;
    let root = review_comment(2001, None, "2026-03-01T12:00:00Z");
    let first_reply = review_comment(2002, Some(2001), "2026-03-01T12:05:00Z");
    let second_reply = review_comment(2003, Some(2001), "2026-03-01T12:10:00Z");
    for comment in [root.clone(), first_reply, second_reply] {
        deliver(
            &ctx,
            EventType::PullRequestReviewComment,
            &review_comment_event("created", comment, 300),
        )
            .await
            .unwrap();
    }
    deliver(
        &ctx,
        EventType::PullRequestReviewThread,
        &review_thread_event("resolved", vec![root.clone()]),
    )
        .await
        .unwrap();

    deliver(&ctx, EventType::PullRequestReviewComment, &review_comment_event("deleted", root, 300))
        .await
        .unwrap();

    assert!(ReviewThread::find_by_id(2001).one(&ctx.db).await.unwrap().is_none());
    let thread = ReviewThread::find_by_id(2002).one(&ctx.db).await.unwrap().unwrap();
    assert_eq!(thread.state, ThreadState::Resolved);
    assert_eq!(thread.resolved_by_id, Some(42));

    let remaining: Vec<i64> = syncwright::processor::review_comment::list_for_thread(&ctx.db, 2002)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(remaining, vec![2002, 2003]);
}

#[tokio::test]
async fn test_deleting_last_comment_removes_thread() {
    let ctx = setup_context().await;
    let root = review_comment(2001, None, "2026-03-01T12:00:00Z");
    deliver(
        &ctx,
        EventType::PullRequestReviewComment,
        &review_comment_event("created", root.clone(), 300),
    )
        .await
        .unwrap();
    deliver(
        &ctx,
        EventType::PullRequestReviewComment,
        &review_comment_event("deleted", root.clone(), 300),
    )
        .await
        .unwrap();
    // Replayed deletion is a no-op.
    deliver(&ctx, EventType::PullRequestReviewComment, &review_comment_event("deleted", root, 300))
        .await
        .unwrap();

    assert_eq!(ReviewThread::find().count(&ctx.db).await.unwrap(), 0);
    assert_eq!(ReviewComment::find().count(&ctx.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_sub_issue_edges_follow_events() {
    let ctx = setup_context().await;
    let event = |action: &str, child: serde_json::Value| {
        json!({
            "action": action,
            "parent_issue": issue(100, 9, "Epic"),
            "parent_issue_repo": repository(),
            "sub_issue": child,
            "sub_issue_repo": repository()
        })
    };
    let mut closed = issue(102, 2, "Config loader");
    closed["state"] = json!("closed");

    deliver(&ctx, EventType::SubIssues, &event("sub_issue_added", issue(101, 1, "Crash on start")))
        .await
        .unwrap();
    deliver(
        &ctx,
        EventType::SubIssues,
        &event("parent_issue_added", issue(101, 1, "Crash on start")),
    )
        .await
        .unwrap();
    deliver(&ctx, EventType::SubIssues, &event("sub_issue_added", closed.clone()))
        .await
        .unwrap();
    assert_eq!(
        issue_link::targets(&ctx.db, 100, IssueLinkType::SubIssue).await.unwrap(),
        BTreeSet::from([101, 102])
    );
    let parent = IssueEntity::find_by_id(100).one(&ctx.db).await.unwrap().unwrap();
    assert_eq!(parent.sub_issues_total, 2);
    assert_eq!(parent.sub_issues_completed, 1);
    assert_eq!(parent.sub_issues_percent_completed, 50);

    deliver(
        &ctx,
        EventType::SubIssues,
        &event("sub_issue_removed", issue(101, 1, "Crash on start")),
    )
        .await
        .unwrap();
    assert_eq!(
        issue_link::targets(&ctx.db, 100, IssueLinkType::SubIssue).await.unwrap(),
        BTreeSet::from([102])
    );
    let parent = IssueEntity::find_by_id(100).one(&ctx.db).await.unwrap().unwrap();
    assert_eq!(parent.sub_issues_total, 1);
    assert_eq!(parent.sub_issues_completed, 1);
    assert_eq!(parent.sub_issues_percent_completed, 100);
}

#[tokio::test]
async fn test_sub_issue_payload_summary_wins_over_recount() {
    let ctx = setup_context().await;
    let mut parent = issue(100, 9, "Epic");
    parent["sub_issues_summary"] = json!({"total": 5, "completed": 2, "percent_completed": 40});
    let event = json!({
        "action": "sub_issue_added",
        "parent_issue": parent,
        "parent_issue_repo": repository(),
        "sub_issue": issue(101, 1, "Crash on start"),
        "sub_issue_repo": repository()
    });

    deliver(&ctx, EventType::SubIssues, &event).await.unwrap();

    let stored = IssueEntity::find_by_id(100).one(&ctx.db).await.unwrap().unwrap();
    assert_eq!(stored.sub_issues_total, 5);
    assert_eq!(stored.sub_issues_completed, 2);
}

#[tokio::test]
async fn test_sub_issue_in_unmonitored_repository_is_not_stored() {
    let ctx = setup_context().await;
    let event = json!({
        "action": "sub_issue_added",
        "parent_issue": issue(100, 9, "Epic"),
        "parent_issue_repo": repository(),
        "sub_issue": issue(801, 1, "Leaked roadmap"),
        "sub_issue_repo": foreign_repository()
    });

    deliver(&ctx, EventType::SubIssues, &event).await.unwrap();

    assert_eq!(Repository::find().count(&ctx.db).await.unwrap(), 1);
    assert!(IssueEntity::find_by_id(100).one(&ctx.db).await.unwrap().is_some());
    assert!(IssueEntity::find_by_id(801).one(&ctx.db).await.unwrap().is_none());
    assert_eq!(IssueLink::find().count(&ctx.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_dependency_on_unmonitored_repository_is_skipped() {
    let ctx = setup_context().await;
    let event = json!({
        "action": "blocked_by_added",
        "blocked_issue": issue(101, 1, "Crash on start"),
        "blocking_issue": issue(801, 1, "Leaked roadmap"),
        "blocking_issue_repo": foreign_repository(),
        "repository": repository()
    });

    deliver(&ctx, EventType::IssueDependencies, &event).await.unwrap();

    assert!(IssueEntity::find_by_id(801).one(&ctx.db).await.unwrap().is_none());
    assert_eq!(IssueLink::find().count(&ctx.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_team_in_unmonitored_organization_is_ignored() {
    let ctx = setup_context().await;
    let event = json!({
        "action": "created",
        "team": {"id": 901, "name": "Skunkworks", "slug": "skunkworks", "privacy": "secret"},
        "organization": {"id": 600, "login": "initech"}
    });

    deliver(&ctx, EventType::Team, &event).await.unwrap();

    assert_eq!(Organization::find().count(&ctx.db).await.unwrap(), 0);
    assert_eq!(Team::find().count(&ctx.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_dependency_edges_are_stored_both_ways() {
    let ctx = setup_context().await;
    let event = |action: &str| {
        json!({
            "action": action,
            "blocked_issue": issue(101, 1, "Crash on start"),
            "blocking_issue": issue(102, 2, "Config loader"),
            "repository": repository()
        })
    };

    deliver(&ctx, EventType::IssueDependencies, &event("blocked_by_added"))
        .await
        .unwrap();
    assert_eq!(
        issue_link::targets(&ctx.db, 101, IssueLinkType::DependsOn).await.unwrap(),
        BTreeSet::from([102])
    );
    assert_eq!(
        issue_link::targets(&ctx.db, 102, IssueLinkType::Blocks).await.unwrap(),
        BTreeSet::from([101])
    );

    deliver(&ctx, EventType::IssueDependencies, &event("blocked_by_removed"))
        .await
        .unwrap();
    assert_eq!(IssueLink::find().count(&ctx.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_membership_preserves_existing_role() {
    let ctx = setup_context().await;
    let team = json!({"id": 900, "name": "Core", "slug": "core", "privacy": "closed"});
    let organization = json!({"id": ORG_ID, "login": ORG});

    deliver(
        &ctx,
        EventType::Team,
        &json!({"action": "created", "team": team, "organization": organization}),
    )
        .await
        .unwrap();

    let membership = |action: &str| {
        json!({
            "action": action,
            "scope": "team",
            "member": user(42, "reviewer"),
            "team": team,
            "organization": organization
        })
    };
    deliver(&ctx, EventType::Membership, &membership("added")).await.unwrap();
    deliver(&ctx, EventType::Membership, &membership("added")).await.unwrap();

    let rows = TeamMembership::find().all(&ctx.db).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].role, TeamRole::Member);

    deliver(&ctx, EventType::Membership, &membership("removed")).await.unwrap();
    assert_eq!(TeamMembership::find().count(&ctx.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_installation_removal_evicts_tenant_state() {
    let ctx = setup_context().await;
    sync_metadata::record(&ctx.db, TENANT_ID, SyncType::Labels, chrono::Utc::now())
        .await
        .unwrap();
    ctx.circuits.record_failure(TENANT_ID);

    let event = json!({
        "action": "deleted",
        "installation": {
            "id": INSTALLATION_ID,
            "account": {"id": ORG_ID, "login": ORG, "type": "Organization"}
        }
    });
    let failure = deliver(&ctx, EventType::Installation, &event).await.unwrap_err();

    assert!(!failure.retryable);
    assert!(matches!(
        failure.error,
        SyncError::InstallationGone { installation_id: INSTALLATION_ID, .. }
    ));
    assert!(
        sync_metadata::last_synced_at(&ctx.db, TENANT_ID, SyncType::Labels)
            .await
            .unwrap()
            .is_none()
    );
    let tenant = ctx.tenants.get(TENANT_ID).unwrap();
    assert_eq!(tenant.installation_id, None);
}

#[tokio::test]
async fn test_installation_created_attaches_tenant() {
    let ctx = setup_context().await;
    ctx.tenants.set_installation(ORG, None);

    let event = json!({
        "action": "created",
        "installation": {"id": 88, "account": {"id": ORG_ID, "login": ORG, "type": "Organization"}}
    });
    deliver(&ctx, EventType::Installation, &event).await.unwrap();

    assert_eq!(ctx.tenants.get(TENANT_ID).unwrap().installation_id, Some(88));
    assert!(Organization::find_by_id(ORG_ID).one(&ctx.db).await.unwrap().is_some());
}
