//! Common re-exports for convenient entity usage.

pub use super::contribution_event::{
    ActiveModel as ContributionEventActiveModel, Column as ContributionEventColumn,
    Entity as ContributionEvent, Model as ContributionEventModel,
};
pub use super::contribution_source::ContributionSource;
pub use super::issue::{
    ActiveModel as IssueActiveModel, Column as IssueColumn, Entity as IssueEntity,
    Model as IssueModel,
};
pub use super::issue_assignee::{Column as IssueAssigneeColumn, Entity as IssueAssignee};
pub use super::issue_kind::{Issue, IssueKind};
pub use super::issue_label::{Column as IssueLabelColumn, Entity as IssueLabel};
pub use super::issue_link::{
    Column as IssueLinkColumn, Entity as IssueLink, Model as IssueLinkModel,
};
pub use super::issue_type::{
    Column as IssueTypeColumn, Entity as IssueType, Model as IssueTypeModel,
};
pub use super::label::{Column as LabelColumn, Entity as Label, Model as LabelModel};
pub use super::link_type::IssueLinkType;
pub use super::milestone::{Column as MilestoneColumn, Entity as Milestone, Model as MilestoneModel};
pub use super::organization::{
    Column as OrganizationColumn, Entity as Organization, Model as OrganizationModel,
};
pub use super::pull_request::{
    Column as PullRequestColumn, Entity as PullRequest, Model as PullRequestModel,
};
pub use super::pull_request_review::{
    Column as PullRequestReviewColumn, Entity as PullRequestReview,
    Model as PullRequestReviewModel,
};
pub use super::pull_request_review_comment::{
    Column as ReviewCommentColumn, Entity as ReviewComment, Model as ReviewCommentModel,
};
pub use super::pull_request_review_thread::{
    Column as ReviewThreadColumn, Entity as ReviewThread, Model as ReviewThreadModel,
};
pub use super::repository::{
    Column as RepositoryColumn, Entity as Repository, Model as RepositoryModel,
};
pub use super::state::{IssueState, MilestoneState, ReviewState, ThreadState};
pub use super::sync_metadata::{
    Column as SyncMetadataColumn, Entity as SyncMetadata, Model as SyncMetadataModel,
};
pub use super::sync_type::SyncType;
pub use super::team::{Column as TeamColumn, Entity as Team, Model as TeamModel};
pub use super::team_membership::{
    Column as TeamMembershipColumn, Entity as TeamMembership, Model as TeamMembershipModel,
};
pub use super::team_role::TeamRole;
pub use super::user::{Column as UserColumn, Entity as User, Model as UserModel};
pub use super::visibility::RepositoryVisibility;
