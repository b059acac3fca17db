//! Integration tests for GraphQL reconciliation.
//!
//! Upstream responses come from a scripted client keyed by operation name
//! and cursor, so paging behaviour is fully deterministic.

#![cfg(all(feature = "sqlite", feature = "migrate"))]

mod common;

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{Value, json};
use syncwright::entity::prelude::*;
use syncwright::graphql::{GraphQlClient, GraphQlQuery};
use syncwright::webhook::{EventType, HandlerRegistry};
use syncwright::payload::{LabelPayload, RepositoryPayload};
use syncwright::processor::{issue_link, label, sync_metadata};
use syncwright::reconcile::{ReconcileOutcome, Reconciler};
use syncwright::settings::ReconcileSettings;
use syncwright::{EngineContext, SyncError, Tenant};

use common::*;

type PageKey = (&'static str, Option<String>);

#[derive(Default)]
struct ScriptedClient {
    pages: Mutex<HashMap<PageKey, Value>>,
    calls: Mutex<Vec<PageKey>>,
}

impl ScriptedClient {
    fn page(self, name: &'static str, after: Option<&str>, data: Value) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert((name, after.map(str::to_string)), data);
        self
    }

    fn calls(&self) -> Vec<PageKey> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphQlClient for ScriptedClient {
    async fn execute(&self, _tenant: &Tenant, query: &GraphQlQuery) -> syncwright::Result<Value> {
        let after = query.variables["after"].as_str().map(str::to_string);
        let key = (query.name, after);
        self.calls.lock().unwrap().push(key.clone());
        self.pages
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| SyncError::GraphQl {
                query: query.name.to_string(),
                messages: vec![format!("no scripted page for {key:?}")],
            })
    }
}

fn settings(max_pages: u32) -> ReconcileSettings {
    ReconcileSettings {
        max_pages,
        ..ReconcileSettings::default()
    }
}

async fn seed_repository(ctx: &EngineContext) {
    let payload: RepositoryPayload = serde_json::from_value(repository()).unwrap();
    syncwright::processor::repository::find_or_create(&ctx.db, &payload).await.unwrap();
}

async fn seed_label(ctx: &EngineContext, id: i64, name: &str) {
    let payload = LabelPayload {
        id,
        name: name.to_string(),
        color: Some("ffffff".to_string()),
        description: None,
    };
    label::find_or_create(&ctx.db, REPO_ID, &payload).await.unwrap();
}

fn labels_page(names: &[&str], next: Option<&str>) -> Value {
    let nodes: Vec<Value> = names
        .iter()
        .map(|name| {
            json!({"name": name, "color": "D73A4A", "description": format!("{name} label")})
        })
        .collect();
    json!({
        "repository": {
            "databaseId": REPO_ID,
            "labels": {
                "nodes": nodes,
                "pageInfo": {"hasNextPage": next.is_some(), "endCursor": next}
            }
        }
    })
}

fn related_issue(id: i64, title: &str, repository: Value) -> Value {
    json!({
        "databaseId": id,
        "number": id,
        "title": title,
        "state": "OPEN",
        "repository": repository
    })
}

fn graph_repository(id: i64, owner: &str, name: &str) -> Value {
    json!({
        "databaseId": id,
        "name": name,
        "nameWithOwner": format!("{owner}/{name}"),
        "isPrivate": true,
        "owner": {"__typename": "Organization", "login": owner, "databaseId": ORG_ID}
    })
}

fn id_connection(ids: &[i64]) -> Value {
    let nodes: Vec<Value> = ids.iter().map(|id| json!({"databaseId": id})).collect();
    json!({"nodes": nodes, "pageInfo": {"hasNextPage": false, "endCursor": null}})
}

#[tokio::test]
async fn test_labels_pass_refreshes_and_prunes() {
    let ctx = setup_context().await;
    seed_repository(&ctx).await;
    seed_label(&ctx, 1, "bug").await;
    seed_label(&ctx, 2, "stale").await;

    let client = Arc::new(
        ScriptedClient::default()
            .page("Labels", None, labels_page(&["bug"], Some("c1")))
            .page("Labels", Some("c1"), labels_page(&["enhancement"], None)),
    );
    let reconciler = Reconciler::new(ctx.db.clone(), client.clone(), settings(10));

    let outcome = reconciler
        .run(&tenant(), SyncType::Labels, false, None)
        .await
        .unwrap();
    let stats = outcome.stats().unwrap();
    assert_eq!(stats.pages, 2);
    assert_eq!(stats.upserted, 1);
    assert_eq!(stats.pruned, 1);
    assert!(!stats.truncated);

    let bug = Label::find_by_id(1).one(&ctx.db).await.unwrap().unwrap();
    assert_eq!(bug.color.as_deref(), Some("d73a4a"));
    assert!(Label::find_by_id(2).one(&ctx.db).await.unwrap().is_none());
    assert_eq!(client.calls().len(), 2);
}

#[tokio::test]
async fn test_second_pass_within_cooldown_is_skipped() {
    let ctx = setup_context().await;
    seed_repository(&ctx).await;
    let client = Arc::new(ScriptedClient::default().page("Labels", None, labels_page(&[], None)));
    let reconciler = Reconciler::new(ctx.db.clone(), client.clone(), settings(10));

    let first = reconciler
        .run(&tenant(), SyncType::Labels, false, None)
        .await
        .unwrap();
    assert!(!first.is_skipped());
    assert!(
        sync_metadata::last_synced_at(&ctx.db, TENANT_ID, SyncType::Labels)
            .await
            .unwrap()
            .is_some()
    );

    let second = reconciler
        .run(&tenant(), SyncType::Labels, false, None)
        .await
        .unwrap();
    match second {
        ReconcileOutcome::Skipped {
            last_synced_at,
            next_eligible_at,
        } => assert_eq!(next_eligible_at - last_synced_at, chrono::Duration::hours(1)),
        other => panic!("expected a skipped pass, got {other:?}"),
    }
    assert_eq!(client.calls().len(), 1);

    let forced = reconciler
        .run(&tenant(), SyncType::Labels, true, None)
        .await
        .unwrap();
    assert!(!forced.is_skipped());
    assert_eq!(client.calls().len(), 2);
}

#[tokio::test]
async fn test_page_ceiling_truncates_without_pruning() {
    let ctx = setup_context().await;
    seed_repository(&ctx).await;
    seed_label(&ctx, 1, "bug").await;
    seed_label(&ctx, 2, "docs").await;

    let client = Arc::new(
        ScriptedClient::default()
            .page("Labels", None, labels_page(&["bug"], Some("c1")))
            .page("Labels", Some("c1"), labels_page(&["docs"], None)),
    );
    let reconciler = Reconciler::new(ctx.db.clone(), client.clone(), settings(1));

    let outcome = reconciler
        .run(&tenant(), SyncType::Labels, false, None)
        .await
        .unwrap();
    let stats = outcome.stats().unwrap();
    assert!(stats.truncated);
    assert_eq!(stats.pages, 1);
    assert_eq!(stats.pruned, 0);

    // "docs" was on the unfetched page and must survive.
    assert_eq!(Label::find().count(&ctx.db).await.unwrap(), 2);
    assert_eq!(client.calls().len(), 1);
}

#[tokio::test]
async fn test_failed_pass_does_not_record_timestamp() {
    let ctx = setup_context().await;
    seed_repository(&ctx).await;
    let client = Arc::new(ScriptedClient::default());
    let reconciler = Reconciler::new(ctx.db.clone(), client, settings(10));

    let err = reconciler
        .run(&tenant(), SyncType::Labels, false, None)
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::GraphQl { .. }));
    assert!(
        sync_metadata::last_synced_at(&ctx.db, TENANT_ID, SyncType::Labels)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_issue_relations_converge_to_upstream_set() {
    let ctx = setup_context().await;
    seed_repository(&ctx).await;
    let registry = HandlerRegistry::standard().unwrap();
    let issues = registry.get(EventType::Issues).unwrap();
    for (id, number, title) in [(1, 1, "A"), (2, 2, "B"), (3, 3, "C"), (4, 4, "D")] {
        issues
            .handle(&ctx, &body(&issues_event("opened", issue(id, number, title))))
            .await
            .unwrap();
    }
    // Local: A -> B, A -> D.
    issue_link::add(&ctx.db, 1, 2, IssueLinkType::SubIssue).await.unwrap();
    issue_link::add(&ctx.db, 1, 4, IssueLinkType::SubIssue).await.unwrap();

    // Upstream: A -> B, A -> C, and A is blocked by 999 which is not synced.
    let page = json!({
        "repository": {
            "databaseId": REPO_ID,
            "issues": {
                "nodes": [{
                    "databaseId": 1,
                    "number": 1,
                    "title": "A",
                    "state": "OPEN",
                    "subIssuesSummary": {"total": 2, "completed": 0, "percentCompleted": 0},
                    "subIssues": id_connection(&[2, 3]),
                    "blockedBy": id_connection(&[999])
                }],
                "pageInfo": {"hasNextPage": false, "endCursor": null}
            }
        }
    });
    let client = Arc::new(ScriptedClient::default().page("IssueRelations", None, page));
    let reconciler = Reconciler::new(ctx.db.clone(), client, settings(10));

    let outcome = reconciler
        .run(&tenant(), SyncType::IssueRelations, false, None)
        .await
        .unwrap();
    let stats = outcome.stats().unwrap();
    assert_eq!(stats.links_added, 1);
    assert_eq!(stats.links_removed, 1);

    assert_eq!(
        issue_link::targets(&ctx.db, 1, IssueLinkType::SubIssue).await.unwrap(),
        BTreeSet::from([2, 3])
    );
    assert!(
        issue_link::targets(&ctx.db, 1, IssueLinkType::DependsOn)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_truncated_inner_connection_only_adds() {
    let ctx = setup_context().await;
    seed_repository(&ctx).await;
    let registry = HandlerRegistry::standard().unwrap();
    let issues = registry.get(EventType::Issues).unwrap();
    for (id, number, title) in [(1, 1, "A"), (2, 2, "B"), (3, 3, "C")] {
        issues
            .handle(&ctx, &body(&issues_event("opened", issue(id, number, title))))
            .await
            .unwrap();
    }
    issue_link::add(&ctx.db, 1, 3, IssueLinkType::SubIssue).await.unwrap();

    let page = json!({
        "repository": {
            "databaseId": REPO_ID,
            "issues": {
                "nodes": [{
                    "databaseId": 1,
                    "number": 1,
                    "title": "A",
                    "state": "OPEN",
                    "subIssues": {
                        "nodes": [{"databaseId": 2}],
                        "pageInfo": {"hasNextPage": true, "endCursor": "inner"}
                    }
                }],
                "pageInfo": {"hasNextPage": false, "endCursor": null}
            }
        }
    });
    let client = Arc::new(ScriptedClient::default().page("IssueRelations", None, page));
    let reconciler = Reconciler::new(ctx.db.clone(), client, settings(10));
    reconciler
        .run(&tenant(), SyncType::IssueRelations, false, None)
        .await
        .unwrap();

    assert_eq!(
        issue_link::targets(&ctx.db, 1, IssueLinkType::SubIssue).await.unwrap(),
        BTreeSet::from([2, 3])
    );
}

#[tokio::test]
async fn test_unsynced_repository_is_skipped() {
    let ctx = setup_context().await;
    let client = Arc::new(ScriptedClient::default());
    let reconciler = Reconciler::new(ctx.db.clone(), client.clone(), settings(10));

    let outcome = reconciler
        .run(&tenant(), SyncType::Labels, false, None)
        .await
        .unwrap();
    assert_eq!(outcome.stats().unwrap().pages, 0);
    assert!(client.calls().is_empty());
    assert_eq!(Repository::find().count(&ctx.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_relation_targets_in_scope_are_created() {
    let ctx = setup_context().await;
    seed_repository(&ctx).await;
    let registry = HandlerRegistry::standard().unwrap();
    let issues = registry.get(EventType::Issues).unwrap();
    for (id, number, title) in [(1, 1, "A"), (2, 2, "B")] {
        issues
            .handle(&ctx, &body(&issues_event("opened", issue(id, number, title))))
            .await
            .unwrap();
    }

    let complete = |nodes: Vec<Value>| {
        json!({"nodes": nodes, "pageInfo": {"hasNextPage": false, "endCursor": null}})
    };
    let page = json!({
        "repository": {
            "databaseId": REPO_ID,
            "issues": {
                "nodes": [{
                    "databaseId": 1,
                    "number": 1,
                    "title": "A",
                    "state": "OPEN",
                    "subIssues": complete(vec![
                        related_issue(2, "B", graph_repository(REPO_ID, ORG, REPO)),
                        related_issue(5, "Retry budget", graph_repository(REPO_ID, ORG, REPO)),
                    ]),
                    "blockedBy": complete(vec![
                        related_issue(
                            777,
                            "Secret plan",
                            graph_repository(20, "initech", "secret"),
                        ),
                    ])
                }],
                "pageInfo": {"hasNextPage": false, "endCursor": null}
            }
        }
    });
    let client = Arc::new(ScriptedClient::default().page("IssueRelations", None, page));
    let reconciler = Reconciler::new(ctx.db.clone(), client, settings(10));

    let outcome = reconciler
        .run(&tenant(), SyncType::IssueRelations, false, None)
        .await
        .unwrap();
    assert_eq!(outcome.stats().unwrap().links_added, 2);

    assert_eq!(
        issue_link::targets(&ctx.db, 1, IssueLinkType::SubIssue).await.unwrap(),
        BTreeSet::from([2, 5])
    );
    let created = IssueEntity::find_by_id(5).one(&ctx.db).await.unwrap().unwrap();
    assert_eq!(created.title, "Retry budget");
    assert_eq!(created.repository_id, REPO_ID);

    assert!(IssueEntity::find_by_id(777).one(&ctx.db).await.unwrap().is_none());
    assert!(
        issue_link::targets(&ctx.db, 1, IssueLinkType::DependsOn)
            .await
            .unwrap()
            .is_empty()
    );
    assert_eq!(Repository::find().count(&ctx.db).await.unwrap(), 1);
}

#[tokio::test]
async fn test_review_threads_pass_backfills_missing_threads() {
    let ctx = setup_context().await;
    let registry = HandlerRegistry::standard().unwrap();
    registry
        .get(EventType::PullRequestReview)
        .unwrap()
        .handle(&ctx, &body(&review_event("submitted", 1001, "approved", 300)))
        .await
        .unwrap();

    let comment = |id: i64, reply_to: Option<i64>| {
        json!({
            "databaseId": id,
            "body": format!("comment {id}"),
            "path": "src/lib.rs",
            "line": 12,
            "createdAt": "2026-03-01T12:00:00Z",
            "author": {"databaseId": 42, "login": "reviewer"},
            "replyTo": reply_to.map(|parent| json!({"databaseId": parent})),
            "pullRequestReview": {"databaseId": 1002, "state": "COMMENTED"}
        })
    };
    let page = json!({
        "repository": {
            "databaseId": REPO_ID,
            "pullRequests": {
                "nodes": [{
                    "databaseId": 300,
                    "number": 3,
                    "reviewThreads": {
                        "nodes": [{
                            "id": "PRRT_9",
                            "isResolved": true,
                            "resolvedBy": {"databaseId": 42, "login": "reviewer"},
                            "comments": {
                                "nodes": [comment(2101, None), comment(2102, Some(2101))],
                                "pageInfo": {"hasNextPage": false, "endCursor": null}
                            }
                        }],
                        "pageInfo": {"hasNextPage": false, "endCursor": null}
                    }
                }],
                "pageInfo": {"hasNextPage": false, "endCursor": null}
            }
        }
    });
    let client = Arc::new(ScriptedClient::default().page("ReviewThreads", None, page));
    let reconciler = Reconciler::new(ctx.db.clone(), client, settings(10));

    let outcome = reconciler
        .run(&tenant(), SyncType::ReviewThreads, false, None)
        .await
        .unwrap();
    assert_eq!(outcome.stats().unwrap().upserted, 1);

    let thread = ReviewThread::find_by_id(2101).one(&ctx.db).await.unwrap().unwrap();
    assert_eq!(thread.pull_request_id, 300);
    assert_eq!(thread.state, ThreadState::Resolved);
    assert_eq!(thread.resolved_by_id, Some(42));
    assert_eq!(thread.node_id.as_deref(), Some("PRRT_9"));

    let comments = syncwright::processor::review_comment::list_for_thread(&ctx.db, 2101)
        .await
        .unwrap();
    let ids: Vec<(i64, Option<i64>)> = comments.iter().map(|c| (c.id, c.review_id)).collect();
    assert_eq!(ids, vec![(2101, Some(1002)), (2102, Some(1002))]);

    let backfilled = PullRequestReview::find_by_id(1002).one(&ctx.db).await.unwrap().unwrap();
    assert_eq!(backfilled.state, ReviewState::Commented);
}
