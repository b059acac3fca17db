//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{Value, json};
use syncwright::provider::{CircuitRegistry, StaticTokenProvider};
use syncwright::{EngineContext, Tenant, TenantDirectory, connect_and_migrate};

pub const ORG_ID: i64 = 500;
pub const ORG: &str = "acme";
pub const REPO_ID: i64 = 10;
pub const REPO: &str = "api";
pub const TENANT_ID: i64 = 1;
pub const INSTALLATION_ID: i64 = 77;

pub fn tenant() -> Tenant {
    Tenant {
        id: TENANT_ID,
        organization: ORG.to_string(),
        installation_id: Some(INSTALLATION_ID),
        repositories: vec![format!("{ORG}/{REPO}")],
    }
}

pub async fn setup_context() -> EngineContext {
    let db = connect_and_migrate("sqlite::memory:")
        .await
        .expect("Failed to create test database");
    EngineContext::new(
        db,
        Arc::new(TenantDirectory::new([tenant()])),
        Arc::new(StaticTokenProvider::new("ghp_test")),
        Arc::new(CircuitRegistry::default()),
    )
}

pub fn user(id: i64, login: &str) -> Value {
    json!({"id": id, "login": login, "type": "User"})
}

pub fn repository() -> Value {
    json!({
        "id": REPO_ID,
        "name": REPO,
        "full_name": format!("{ORG}/{REPO}"),
        "owner": {"id": ORG_ID, "login": ORG, "type": "Organization"},
        "private": false,
        "default_branch": "main"
    })
}

/// A private repository no tenant monitors.
pub fn foreign_repository() -> Value {
    json!({
        "id": 20,
        "name": "secret",
        "full_name": "initech/secret",
        "owner": {"id": 600, "login": "initech", "type": "Organization"},
        "private": true,
        "default_branch": "main"
    })
}

pub fn issue(id: i64, number: i32, title: &str) -> Value {
    json!({
        "id": id,
        "number": number,
        "title": title,
        "state": "open",
        "user": user(7, "octo")
    })
}

pub fn pull_request(id: i64, number: i32) -> Value {
    json!({
        "id": id,
        "number": number,
        "title": "Add retries",
        "state": "open",
        "user": user(7, "octo"),
        "draft": false,
        "head": {"ref": "feature", "sha": "abc123"},
        "base": {"ref": "main", "sha": "def456"}
    })
}

pub fn review_comment(id: i64, in_reply_to: Option<i64>, created_at: &str) -> Value {
    json!({
        "id": id,
        "in_reply_to_id": in_reply_to,
        "user": user(42, "reviewer"),
        "body": format!("comment {id}"),
        "path": "src/lib.rs",
        "line": 12,
        "created_at": created_at,
        "updated_at": created_at
    })
}

pub fn issues_event(action: &str, issue: Value) -> Value {
    json!({"action": action, "issue": issue, "repository": repository()})
}

pub fn review_event(action: &str, review_id: i64, state: &str, pull_request_id: i64) -> Value {
    json!({
        "action": action,
        "review": {
            "id": review_id,
            "user": user(42, "reviewer"),
            "state": state,
            "submitted_at": "2026-03-01T12:00:00Z"
        },
        "pull_request": pull_request(pull_request_id, 3),
        "repository": repository()
    })
}

pub fn review_comment_event(action: &str, comment: Value, pull_request_id: i64) -> Value {
    json!({
        "action": action,
        "comment": comment,
        "pull_request": pull_request(pull_request_id, 3),
        "repository": repository()
    })
}

pub fn review_thread_event(action: &str, comments: Vec<Value>) -> Value {
    json!({
        "action": action,
        "thread": {"node_id": "PRRT_1", "comments": comments},
        "repository": repository(),
        "sender": user(42, "reviewer")
    })
}

pub fn body(value: &Value) -> Vec<u8> {
    serde_json::to_vec(value).expect("serializable fixture")
}
