//! Query documents used by reconciliation.
//!
//! Every paginated query takes `$first` and `$after`; `$after` is null on the
//! first page.

use serde_json::{Value, json};

/// A named GraphQL document with its variables.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQlQuery {
    /// Operation name, used in logs and errors.
    pub name: &'static str,
    pub document: &'static str,
    pub variables: Value,
}

impl GraphQlQuery {
    pub fn body(&self) -> Value {
        json!({"query": self.document, "variables": self.variables})
    }
}

pub const ISSUE_TYPES: &str = r#"
query IssueTypes($org: String!, $first: Int!, $after: String) {
    organization(login: $org) {
        databaseId
        login
        name
        issueTypes(first: $first, after: $after) {
            nodes { id name description color isEnabled }
            pageInfo { hasNextPage endCursor }
        }
    }
}
"#;

pub const LABELS: &str = r#"
query Labels($owner: String!, $name: String!, $first: Int!, $after: String) {
    repository(owner: $owner, name: $name) {
        databaseId
        labels(first: $first, after: $after) {
            nodes { name color description }
            pageInfo { hasNextPage endCursor }
        }
    }
}
"#;

pub const TEAMS: &str = r#"
query Teams($org: String!, $first: Int!, $after: String, $membersFirst: Int!) {
    organization(login: $org) {
        databaseId
        login
        name
        teams(first: $first, after: $after) {
            nodes {
                databaseId name slug description privacy url
                parentTeam { databaseId }
                members(first: $membersFirst, membership: IMMEDIATE) {
                    edges { role node { databaseId login name avatarUrl url } }
                    pageInfo { hasNextPage endCursor }
                }
            }
            pageInfo { hasNextPage endCursor }
        }
    }
}
"#;

pub const ISSUE_RELATIONS: &str = r#"
query IssueRelations(
    $owner: String!, $name: String!, $first: Int!, $after: String, $innerFirst: Int!
) {
    repository(owner: $owner, name: $name) {
        databaseId
        issues(first: $first, after: $after, states: OPEN) {
            nodes {
                databaseId number title state
                subIssuesSummary { total completed percentCompleted }
                subIssues(first: $innerFirst) {
                    nodes { ...RelatedIssue }
                    pageInfo { hasNextPage endCursor }
                }
                blockedBy(first: $innerFirst) {
                    nodes { ...RelatedIssue }
                    pageInfo { hasNextPage endCursor }
                }
            }
            pageInfo { hasNextPage endCursor }
        }
    }
}

fragment RelatedIssue on Issue {
    databaseId number title state
    repository {
        databaseId name nameWithOwner isPrivate
        owner {
            __typename login
            ... on Organization { databaseId }
            ... on User { databaseId }
        }
    }
}
"#;

pub const REVIEW_THREADS: &str = r#"
query ReviewThreads(
    $owner: String!, $name: String!, $first: Int!, $after: String, $innerFirst: Int!
) {
    repository(owner: $owner, name: $name) {
        databaseId
        pullRequests(first: $first, after: $after, states: OPEN) {
            nodes {
                databaseId number
                reviewThreads(first: $innerFirst) {
                    nodes {
                        id isResolved
                        resolvedBy { databaseId login }
                        comments(first: $innerFirst) {
                            nodes {
                                databaseId body path line originalLine startLine diffHunk url
                                createdAt updatedAt
                                author { login ... on User { databaseId name avatarUrl url } }
                                replyTo { databaseId }
                                pullRequestReview {
                                    databaseId state submittedAt
                                    author { login ... on User { databaseId } }
                                }
                                commit { oid }
                            }
                            pageInfo { hasNextPage endCursor }
                        }
                    }
                    pageInfo { hasNextPage endCursor }
                }
            }
            pageInfo { hasNextPage endCursor }
        }
    }
}
"#;

pub fn issue_types(org: &str, first: u32, after: Option<&str>) -> GraphQlQuery {
    GraphQlQuery {
        name: "IssueTypes",
        document: ISSUE_TYPES,
        variables: json!({"org": org, "first": first, "after": after}),
    }
}

pub fn labels(owner: &str, name: &str, first: u32, after: Option<&str>) -> GraphQlQuery {
    GraphQlQuery {
        name: "Labels",
        document: LABELS,
        variables: json!({"owner": owner, "name": name, "first": first, "after": after}),
    }
}

pub fn teams(org: &str, first: u32, after: Option<&str>, members_first: u32) -> GraphQlQuery {
    GraphQlQuery {
        name: "Teams",
        document: TEAMS,
        variables: json!({
            "org": org,
            "first": first,
            "after": after,
            "membersFirst": members_first,
        }),
    }
}

pub fn issue_relations(
    owner: &str,
    name: &str,
    first: u32,
    after: Option<&str>,
    inner_first: u32,
) -> GraphQlQuery {
    GraphQlQuery {
        name: "IssueRelations",
        document: ISSUE_RELATIONS,
        variables: json!({
            "owner": owner,
            "name": name,
            "first": first,
            "after": after,
            "innerFirst": inner_first,
        }),
    }
}

pub fn review_threads(
    owner: &str,
    name: &str,
    first: u32,
    after: Option<&str>,
    inner_first: u32,
) -> GraphQlQuery {
    GraphQlQuery {
        name: "ReviewThreads",
        document: REVIEW_THREADS,
        variables: json!({
            "owner": owner,
            "name": name,
            "first": first,
            "after": after,
            "innerFirst": inner_first,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_passes_null_cursor() {
        let query = labels("acme", "api", 50, None);
        let body = query.body();
        assert_eq!(body["variables"]["after"], Value::Null);
        assert_eq!(body["variables"]["first"], 50);
        assert!(body["query"].as_str().unwrap().contains("labels(first: $first, after: $after)"));
    }

    #[test]
    fn every_document_is_paginated() {
        for doc in [ISSUE_TYPES, LABELS, TEAMS, ISSUE_RELATIONS, REVIEW_THREADS] {
            assert!(doc.contains("$first: Int!"));
            assert!(doc.contains("$after: String"));
            assert!(doc.contains("pageInfo { hasNextPage endCursor }"));
        }
    }
}
