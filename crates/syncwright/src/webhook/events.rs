//! Webhook event types carried in the subject's last token.

use std::fmt;
use std::str::FromStr;

/// Whether an event is addressed by repository or by organization only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventScope {
    Repository,
    Organization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventType {
    Installation,
    InstallationRepositories,
    Repository,
    Label,
    Milestone,
    Issues,
    PullRequest,
    PullRequestReview,
    PullRequestReviewComment,
    PullRequestReviewThread,
    SubIssues,
    IssueDependencies,
    Team,
    Membership,
    Organization,
}

impl EventType {
    pub const ALL: [EventType; 15] = [
        EventType::Installation,
        EventType::InstallationRepositories,
        EventType::Repository,
        EventType::Label,
        EventType::Milestone,
        EventType::Issues,
        EventType::PullRequest,
        EventType::PullRequestReview,
        EventType::PullRequestReviewComment,
        EventType::PullRequestReviewThread,
        EventType::SubIssues,
        EventType::IssueDependencies,
        EventType::Team,
        EventType::Membership,
        EventType::Organization,
    ];

    /// The `X-GitHub-Event` name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Installation => "installation",
            Self::InstallationRepositories => "installation_repositories",
            Self::Repository => "repository",
            Self::Label => "label",
            Self::Milestone => "milestone",
            Self::Issues => "issues",
            Self::PullRequest => "pull_request",
            Self::PullRequestReview => "pull_request_review",
            Self::PullRequestReviewComment => "pull_request_review_comment",
            Self::PullRequestReviewThread => "pull_request_review_thread",
            Self::SubIssues => "sub_issues",
            Self::IssueDependencies => "issue_dependencies",
            Self::Team => "team",
            Self::Membership => "membership",
            Self::Organization => "organization",
        }
    }

    pub fn scope(self) -> EventScope {
        match self {
            Self::Installation
            | Self::InstallationRepositories
            | Self::Team
            | Self::Membership
            | Self::Organization => EventScope::Organization,
            _ => EventScope::Repository,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an event name this engine does not know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event type: {0}")]
pub struct UnknownEventType(pub String);

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownEventType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names_only() {
        assert_eq!("pull_request_review".parse(), Ok(EventType::PullRequestReview));
        assert_eq!(
            "star".parse::<EventType>(),
            Err(UnknownEventType("star".to_string()))
        );
    }

    #[test]
    fn organization_scoped_events() {
        let org: Vec<_> = EventType::ALL
            .into_iter()
            .filter(|t| t.scope() == EventScope::Organization)
            .map(EventType::as_str)
            .collect();
        assert_eq!(
            org,
            ["installation", "installation_repositories", "team", "membership", "organization"]
        );
    }
}
