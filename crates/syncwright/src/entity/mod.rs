//! SeaORM entity definitions for the mirrored provider state.

pub mod contribution_event;
pub mod contribution_source;
pub mod issue;
pub mod issue_assignee;
pub mod issue_kind;
pub mod issue_label;
pub mod issue_link;
pub mod issue_type;
pub mod label;
pub mod link_type;
pub mod milestone;
pub mod organization;
pub mod prelude;
pub mod pull_request;
pub mod pull_request_review;
pub mod pull_request_review_comment;
pub mod pull_request_review_thread;
pub mod repository;
pub mod state;
pub mod sync_metadata;
pub mod sync_type;
pub mod team;
pub mod team_membership;
pub mod team_role;
pub mod user;
pub mod visibility;
