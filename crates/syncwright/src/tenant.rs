//! Tenants and the live set of monitored repositories.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Identifier of a tenant (one organization's workspace).
pub type TenantId = i64;

/// A tenant: one provider organization plus the repositories it monitors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    /// Organization (or user account) login on the provider.
    pub organization: String,
    /// GitHub App installation backing this tenant, if any.
    #[serde(default)]
    pub installation_id: Option<i64>,
    /// Repositories in `owner/name` form.
    #[serde(default)]
    pub repositories: Vec<String>,
}

impl Tenant {
    pub fn monitors(&self, full_name: &str) -> bool {
        self.repositories
            .iter()
            .any(|r| r.eq_ignore_ascii_case(full_name))
    }

    /// Monitored repositories split into `(owner, name)`.
    pub fn repository_names(&self) -> impl Iterator<Item = (&str, &str)> {
        self.repositories.iter().filter_map(|r| r.split_once('/'))
    }
}

/// Decides whether an incoming entity belongs to any tenant.
pub trait ScopeFilter: Send + Sync {
    fn is_repository_in_scope(&self, full_name: &str) -> bool;
    fn is_organization_in_scope(&self, login: &str) -> bool;
}

impl ScopeFilter for Tenant {
    fn is_repository_in_scope(&self, full_name: &str) -> bool {
        self.monitors(full_name)
    }

    fn is_organization_in_scope(&self, login: &str) -> bool {
        self.organization.eq_ignore_ascii_case(login)
    }
}

/// Configuration-backed tenant registry whose monitored set can change at runtime.
///
/// Every mutation bumps a version published on a watch channel so the
/// dispatcher can rebuild its subscription.
pub struct TenantDirectory {
    tenants: RwLock<BTreeMap<TenantId, Tenant>>,
    version: watch::Sender<u64>,
}

impl TenantDirectory {
    pub fn new(tenants: impl IntoIterator<Item = Tenant>) -> Self {
        let tenants = tenants.into_iter().map(|t| (t.id, t)).collect();
        let (version, _) = watch::channel(0);
        Self {
            tenants: RwLock::new(tenants),
            version,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<TenantId, Tenant>> {
        self.tenants.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<TenantId, Tenant>> {
        self.tenants.write().unwrap_or_else(|e| e.into_inner())
    }

    fn bump(&self) {
        self.version.send_modify(|v| *v += 1);
    }

    /// Receiver notified whenever the monitored set changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    pub fn tenants(&self) -> Vec<Tenant> {
        self.read().values().cloned().collect()
    }

    pub fn get(&self, id: TenantId) -> Option<Tenant> {
        self.read().get(&id).cloned()
    }

    pub fn find_by_installation(&self, installation_id: i64) -> Option<Tenant> {
        self.read()
            .values()
            .find(|t| t.installation_id == Some(installation_id))
            .cloned()
    }

    pub fn find_by_organization(&self, login: &str) -> Option<Tenant> {
        self.read()
            .values()
            .find(|t| t.organization.eq_ignore_ascii_case(login))
            .cloned()
    }

    pub fn tenant_for_repository(&self, full_name: &str) -> Option<Tenant> {
        self.read().values().find(|t| t.monitors(full_name)).cloned()
    }

    /// All monitored repositories across tenants, deduplicated and sorted.
    pub fn monitored_repositories(&self) -> Vec<String> {
        let mut repos: Vec<String> = self
            .read()
            .values()
            .flat_map(|t| t.repositories.iter().cloned())
            .collect();
        repos.sort();
        repos.dedup();
        repos
    }

    pub fn organizations(&self) -> Vec<String> {
        let mut orgs: Vec<String> = self
            .read()
            .values()
            .map(|t| t.organization.clone())
            .collect();
        orgs.sort();
        orgs.dedup();
        orgs
    }

    /// Start monitoring a repository. Returns false if it was already monitored.
    pub fn add_repository(&self, tenant_id: TenantId, full_name: &str) -> bool {
        let added = {
            let mut tenants = self.write();
            match tenants.get_mut(&tenant_id) {
                Some(tenant) if !tenant.monitors(full_name) => {
                    tenant.repositories.push(full_name.to_string());
                    true
                }
                _ => false,
            }
        };
        if added {
            self.bump();
        }
        added
    }

    /// Stop monitoring a repository in every tenant. Returns true if anything changed.
    pub fn remove_repository(&self, full_name: &str) -> bool {
        let removed = {
            let mut tenants = self.write();
            let mut removed = false;
            for tenant in tenants.values_mut() {
                let before = tenant.repositories.len();
                tenant
                    .repositories
                    .retain(|r| !r.eq_ignore_ascii_case(full_name));
                removed |= tenant.repositories.len() != before;
            }
            removed
        };
        if removed {
            self.bump();
        }
        removed
    }

    pub fn rename_repository(&self, old_full_name: &str, new_full_name: &str) -> bool {
        let renamed = {
            let mut tenants = self.write();
            let mut renamed = false;
            for tenant in tenants.values_mut() {
                for repo in tenant.repositories.iter_mut() {
                    if repo.eq_ignore_ascii_case(old_full_name) {
                        *repo = new_full_name.to_string();
                        renamed = true;
                    }
                }
            }
            renamed
        };
        if renamed {
            self.bump();
        }
        renamed
    }

    /// Attach or detach an installation for the tenant owning `organization`.
    pub fn set_installation(
        &self,
        organization: &str,
        installation_id: Option<i64>,
    ) -> Option<TenantId> {
        let mut tenants = self.write();
        let tenant = tenants
            .values_mut()
            .find(|t| t.organization.eq_ignore_ascii_case(organization))?;
        tenant.installation_id = installation_id;
        Some(tenant.id)
    }
}

impl ScopeFilter for TenantDirectory {
    fn is_repository_in_scope(&self, full_name: &str) -> bool {
        self.read().values().any(|t| t.monitors(full_name))
    }

    fn is_organization_in_scope(&self, login: &str) -> bool {
        self.read()
            .values()
            .any(|t| t.organization.eq_ignore_ascii_case(login))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> TenantDirectory {
        TenantDirectory::new([
            Tenant {
                id: 1,
                organization: "acme".into(),
                installation_id: Some(100),
                repositories: vec!["acme/api".into(), "acme/web".into()],
            },
            Tenant {
                id: 2,
                organization: "globex".into(),
                installation_id: None,
                repositories: vec!["globex/core".into()],
            },
        ])
    }

    #[test]
    fn lookups() {
        let dir = directory();
        assert_eq!(dir.find_by_installation(100).map(|t| t.id), Some(1));
        assert_eq!(dir.find_by_organization("GLOBEX").map(|t| t.id), Some(2));
        assert_eq!(dir.tenant_for_repository("Acme/Web").map(|t| t.id), Some(1));
        assert!(dir.tenant_for_repository("acme/other").is_none());
        assert_eq!(
            dir.monitored_repositories(),
            vec!["acme/api", "acme/web", "globex/core"]
        );
        assert_eq!(dir.organizations(), vec!["acme", "globex"]);
    }

    #[test]
    fn scope_filter() {
        let dir = directory();
        assert!(dir.is_repository_in_scope("acme/api"));
        assert!(!dir.is_repository_in_scope("initech/api"));
        assert!(dir.is_organization_in_scope("Acme"));
        assert!(!dir.is_organization_in_scope("initech"));

        let tenant = dir.get(2).unwrap();
        assert!(tenant.is_repository_in_scope("Globex/Core"));
        assert!(!tenant.is_repository_in_scope("acme/api"));
        assert!(!tenant.is_organization_in_scope("acme"));
    }

    #[test]
    fn mutations_bump_version() {
        let dir = directory();
        let rx = dir.subscribe();
        assert_eq!(*rx.borrow(), 0);

        assert!(dir.add_repository(2, "globex/docs"));
        assert!(!dir.add_repository(2, "globex/docs"));
        assert_eq!(*rx.borrow(), 1);

        assert!(dir.rename_repository("globex/docs", "globex/handbook"));
        assert!(dir.is_repository_in_scope("globex/handbook"));
        assert_eq!(*rx.borrow(), 2);

        assert!(dir.remove_repository("globex/handbook"));
        assert!(!dir.remove_repository("globex/handbook"));
        assert_eq!(*rx.borrow(), 3);
    }

    #[test]
    fn set_installation_targets_organization() {
        let dir = directory();
        assert_eq!(dir.set_installation("globex", Some(7)), Some(2));
        assert_eq!(dir.find_by_installation(7).map(|t| t.id), Some(2));
        assert_eq!(dir.set_installation("nobody", Some(8)), None);
    }

    #[test]
    fn repository_names_split_owner() {
        let dir = directory();
        let tenant = dir.get(1).unwrap();
        let names: Vec<_> = tenant.repository_names().collect();
        assert_eq!(names, vec![("acme", "api"), ("acme", "web")]);
    }
}
