//! Event type → handler routing, built once from an explicit table.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use super::events::EventType;
use super::handler::WebhookHandler;
use super::handlers::*;

/// Builds one handler instance.
pub type HandlerFactory = fn() -> Arc<dyn WebhookHandler>;

/// Every handler the engine ships with.
pub const REGISTRATIONS: &[(EventType, HandlerFactory)] = &[
    (EventType::Installation, || Arc::new(InstallationHandler)),
    (EventType::InstallationRepositories, || Arc::new(InstallationRepositoriesHandler)),
    (EventType::Repository, || Arc::new(RepositoryHandler)),
    (EventType::Label, || Arc::new(LabelHandler)),
    (EventType::Milestone, || Arc::new(MilestoneHandler)),
    (EventType::Issues, || Arc::new(IssuesHandler)),
    (EventType::PullRequest, || Arc::new(PullRequestHandler)),
    (EventType::PullRequestReview, || Arc::new(PullRequestReviewHandler)),
    (EventType::PullRequestReviewComment, || Arc::new(PullRequestReviewCommentHandler)),
    (EventType::PullRequestReviewThread, || Arc::new(PullRequestReviewThreadHandler)),
    (EventType::SubIssues, || Arc::new(SubIssuesHandler)),
    (EventType::IssueDependencies, || Arc::new(IssueDependenciesHandler)),
    (EventType::Team, || Arc::new(TeamHandler)),
    (EventType::Membership, || Arc::new(MembershipHandler)),
    (EventType::Organization, || Arc::new(OrganizationHandler)),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("event type {0} registered twice")]
    Duplicate(EventType),
    #[error("handler registered for {registered} reports {reported}")]
    Mismatch {
        registered: EventType,
        reported: EventType,
    },
}

#[derive(Clone)]
pub struct HandlerRegistry {
    handlers: BTreeMap<EventType, Arc<dyn WebhookHandler>>,
}

impl HandlerRegistry {
    pub fn from_registrations(
        table: &[(EventType, HandlerFactory)],
    ) -> Result<Self, RegistryError> {
        let mut handlers = BTreeMap::new();
        for (event_type, factory) in table {
            let handler = factory();
            if handler.event_type() != *event_type {
                return Err(RegistryError::Mismatch {
                    registered: *event_type,
                    reported: handler.event_type(),
                });
            }
            if handlers.insert(*event_type, handler).is_some() {
                return Err(RegistryError::Duplicate(*event_type));
            }
        }
        Ok(Self { handlers })
    }

    /// Registry over [`REGISTRATIONS`].
    pub fn standard() -> Result<Self, RegistryError> {
        Self::from_registrations(REGISTRATIONS)
    }

    pub fn get(&self, event_type: EventType) -> Option<Arc<dyn WebhookHandler>> {
        self.handlers.get(&event_type).cloned()
    }

    /// Supported event types in a stable order.
    pub fn supported_event_types(&self) -> Vec<EventType> {
        self.handlers.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("event_types", &self.supported_event_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_covers_every_event_type() {
        let registry = HandlerRegistry::standard().unwrap();
        assert_eq!(registry.supported_event_types(), EventType::ALL.to_vec());
        for event_type in EventType::ALL {
            assert_eq!(registry.get(event_type).unwrap().event_type(), event_type);
        }
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let table: &[(EventType, HandlerFactory)] = &[
            (EventType::Label, || Arc::new(LabelHandler)),
            (EventType::Label, || Arc::new(LabelHandler)),
        ];
        let err = HandlerRegistry::from_registrations(table).unwrap_err();
        assert_eq!(err, RegistryError::Duplicate(EventType::Label));
    }

    #[test]
    fn mismatched_registration_is_rejected() {
        let table: &[(EventType, HandlerFactory)] = &[(EventType::Team, || Arc::new(LabelHandler))];
        let err = HandlerRegistry::from_registrations(table).unwrap_err();
        assert_eq!(
            err,
            RegistryError::Mismatch {
                registered: EventType::Team,
                reported: EventType::Label,
            }
        );
    }

    #[test]
    fn subset_registry_only_routes_registered_types() {
        let table: &[(EventType, HandlerFactory)] =
            &[(EventType::Issues, || Arc::new(IssuesHandler))];
        let registry = HandlerRegistry::from_registrations(table).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.get(EventType::PullRequest).is_none());
    }
}
