//! Broker subjects: `<namespace>.<owner>.<repo>.<eventType>`.
//!
//! Organization-scoped events use `?` in the repository position. Dots in
//! owner or repository names are encoded as `~` so every name stays one token.

use crate::tenant::TenantDirectory;
use crate::webhook::{EventScope, EventType};

/// Placeholder for the repository token of organization-scoped subjects.
pub const NO_REPOSITORY: &str = "?";

pub fn encode_token(name: &str) -> String {
    name.replace('.', "~")
}

pub fn decode_token(token: &str) -> String {
    token.replace('~', ".")
}

pub fn repository_subject(
    namespace: &str,
    owner: &str,
    repository: &str,
    event_type: EventType,
) -> String {
    format!(
        "{namespace}.{}.{}.{event_type}",
        encode_token(owner),
        encode_token(repository)
    )
}

pub fn organization_subject(namespace: &str, organization: &str, event_type: EventType) -> String {
    format!("{namespace}.{}.{NO_REPOSITORY}.{event_type}", encode_token(organization))
}

/// A subject split into its four tokens, names decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSubject {
    pub namespace: String,
    pub owner: String,
    /// `None` for organization-scoped subjects.
    pub repository: Option<String>,
    /// Raw event type token; may name an unsupported event.
    pub event: String,
}

impl ParsedSubject {
    pub fn full_name(&self) -> Option<String> {
        self.repository
            .as_ref()
            .map(|repo| format!("{}/{repo}", self.owner))
    }
}

pub fn parse_subject(subject: &str) -> Option<ParsedSubject> {
    let mut tokens = subject.split('.');
    let (namespace, owner, repository, event) =
        (tokens.next()?, tokens.next()?, tokens.next()?, tokens.next()?);
    if tokens.next().is_some() || event.is_empty() {
        return None;
    }
    Some(ParsedSubject {
        namespace: namespace.to_string(),
        owner: decode_token(owner),
        repository: (repository != NO_REPOSITORY).then(|| decode_token(repository)),
        event: event.to_string(),
    })
}

/// NATS-style matching: `*` matches one token, a trailing `>` one or more.
pub fn subject_matches(pattern: &str, subject: &str) -> bool {
    let mut subject_tokens = subject.split('.');
    for token in pattern.split('.') {
        match (token, subject_tokens.next()) {
            (">", Some(_)) => return true,
            ("*", Some(_)) => {}
            (literal, Some(actual)) if literal == actual => {}
            _ => return false,
        }
    }
    subject_tokens.next().is_none()
}

/// Filter subjects for every monitored repository and organization.
///
/// Repository-scoped event types are crossed with monitored repositories,
/// organization-scoped ones with tenant organizations. Sorted and deduplicated.
pub fn filter_subjects(
    namespace: &str,
    tenants: &TenantDirectory,
    event_types: &[EventType],
) -> Vec<String> {
    let repositories = tenants.monitored_repositories();
    let organizations = tenants.organizations();
    let mut subjects = Vec::new();
    for &event_type in event_types {
        match event_type.scope() {
            EventScope::Repository => {
                for full_name in &repositories {
                    if let Some((owner, name)) = full_name.split_once('/') {
                        subjects.push(repository_subject(namespace, owner, name, event_type));
                    }
                }
            }
            EventScope::Organization => {
                for org in &organizations {
                    subjects.push(organization_subject(namespace, org, event_type));
                }
            }
        }
    }
    subjects.sort();
    subjects.dedup();
    subjects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenant::Tenant;

    #[test]
    fn dots_in_names_stay_inside_one_token() {
        let subject = repository_subject("github", "acme", "site.io", EventType::PullRequest);
        assert_eq!(subject, "github.acme.site~io.pull_request");
        let parsed = parse_subject(&subject).unwrap();
        assert_eq!(parsed.full_name().as_deref(), Some("acme/site.io"));
        assert_eq!(parsed.event, "pull_request");
    }

    #[test]
    fn organization_subjects_have_no_repository() {
        let subject = organization_subject("github", "acme", EventType::Team);
        assert_eq!(subject, "github.acme.?.team");
        let parsed = parse_subject(&subject).unwrap();
        assert_eq!(parsed.repository, None);
        assert_eq!(parsed.full_name(), None);
    }

    #[test]
    fn malformed_subjects_do_not_parse() {
        assert!(parse_subject("github.acme.repo").is_none());
        assert!(parse_subject("github.acme.repo.issues.extra").is_none());
        assert!(parse_subject("github.acme.repo.").is_none());
    }

    #[test]
    fn wildcards() {
        assert!(subject_matches("github.*.*.issues", "github.acme.api.issues"));
        assert!(subject_matches("github.acme.>", "github.acme.api.issues"));
        assert!(!subject_matches("github.acme.>", "github.acme"));
        assert!(!subject_matches("github.*.issues", "github.acme.api.issues"));
        assert!(subject_matches("github.acme.?.team", "github.acme.?.team"));
        assert!(!subject_matches("github.acme.api.issues", "github.acme.api.label"));
    }

    #[test]
    fn filter_subjects_cross_scope_with_event_types() {
        let tenants = TenantDirectory::new([Tenant {
            id: 1,
            organization: "acme".into(),
            installation_id: Some(5),
            repositories: vec!["acme/api".into(), "acme/web".into()],
        }]);
        let subjects = filter_subjects("github", &tenants, &[EventType::Issues, EventType::Team]);
        assert_eq!(
            subjects,
            vec![
                "github.acme.?.team".to_string(),
                "github.acme.api.issues".to_string(),
                "github.acme.web.issues".to_string(),
            ]
        );
    }
}
