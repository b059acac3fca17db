use async_trait::async_trait;
use sea_orm::DatabaseTransaction;
use serde::Deserialize;

use crate::context::EngineContext;
use crate::error::Result;
use crate::payload::{InstallationPayload, InstallationRepositoryPayload};
use crate::webhook::events::EventType;
use crate::webhook::handler::{FollowUp, TypedWebhookHandler};

#[derive(Debug, Deserialize)]
pub struct InstallationRepositoriesEvent {
    pub action: String,
    pub installation: InstallationPayload,
    #[serde(default)]
    pub repositories_added: Vec<InstallationRepositoryPayload>,
    #[serde(default)]
    pub repositories_removed: Vec<InstallationRepositoryPayload>,
}

/// Keeps the monitored repository set in step with the installation.
pub struct InstallationRepositoriesHandler;

#[async_trait]
impl TypedWebhookHandler for InstallationRepositoriesHandler {
    type Event = InstallationRepositoriesEvent;

    const EVENT_TYPE: EventType = EventType::InstallationRepositories;

    async fn handle_event(
        &self,
        _txn: &DatabaseTransaction,
        ctx: &EngineContext,
        event: &InstallationRepositoriesEvent,
    ) -> Result<Vec<FollowUp>> {
        let tenant = ctx
            .tenants
            .find_by_installation(event.installation.id)
            .or_else(|| {
                let account = event.installation.account.as_ref()?;
                ctx.tenants.find_by_organization(&account.login)
            });
        let Some(tenant) = tenant else {
            tracing::debug!(installation_id = event.installation.id, "installation has no tenant");
            return Ok(Vec::new());
        };

        for repo in &event.repositories_added {
            if ctx.tenants.add_repository(tenant.id, &repo.full_name) {
                tracing::info!(
                    tenant = tenant.id,
                    repository = %repo.full_name,
                    "repository now monitored"
                );
            }
        }
        for repo in &event.repositories_removed {
            if ctx.tenants.remove_repository(&repo.full_name) {
                tracing::info!(
                    tenant = tenant.id,
                    repository = %repo.full_name,
                    "repository no longer monitored"
                );
            }
        }
        Ok(Vec::new())
    }
}
