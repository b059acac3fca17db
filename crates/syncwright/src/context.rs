//! Shared state handed to webhook handlers and the scheduler.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::error::Result;
use crate::processor::sync_metadata;
use crate::provider::{CircuitRegistry, TokenProvider};
use crate::tenant::TenantDirectory;

#[derive(Clone)]
pub struct EngineContext {
    pub db: DatabaseConnection,
    pub tenants: Arc<TenantDirectory>,
    pub tokens: Arc<dyn TokenProvider>,
    pub circuits: Arc<CircuitRegistry>,
}

impl EngineContext {
    pub fn new(
        db: DatabaseConnection,
        tenants: Arc<TenantDirectory>,
        tokens: Arc<dyn TokenProvider>,
        circuits: Arc<CircuitRegistry>,
    ) -> Self {
        Self {
            db,
            tenants,
            tokens,
            circuits,
        }
    }

    /// Drop every piece of cached state tied to an installation.
    ///
    /// Clears the token cache, the tenant's circuit breaker and cooldown
    /// metadata, and detaches the installation from the tenant.
    pub async fn evict_installation(&self, installation_id: i64) -> Result<()> {
        self.tokens.invalidate(installation_id).await;

        let Some(tenant) = self.tenants.find_by_installation(installation_id) else {
            tracing::debug!(installation_id, "no tenant for evicted installation");
            return Ok(());
        };
        self.circuits.reset(tenant.id);
        let cleared = sync_metadata::clear_tenant(&self.db, tenant.id).await?;
        self.tenants.set_installation(&tenant.organization, None);
        tracing::warn!(
            tenant = tenant.id,
            installation_id,
            cleared,
            "installation evicted"
        );
        Ok(())
    }
}
