//! Wiring shared by the commands that talk to GitHub.

use std::sync::Arc;

use syncwright::graphql::HttpGraphQlClient;
use syncwright::http::{HttpTransport, ReqwestTransport};
use syncwright::provider::{CircuitConfig, CircuitRegistry};
use syncwright::reconcile::Reconciler;
use syncwright::{EngineContext, EngineSettings, TenantDirectory};

use crate::config::Config;

/// Everything a running engine needs, built once from configuration.
pub(crate) struct Engine {
    pub context: EngineContext,
    pub reconciler: Reconciler,
    pub settings: EngineSettings,
}

pub(crate) async fn build_engine(
    config: &Config,
    database_url: &str,
) -> Result<Engine, Box<dyn std::error::Error>> {
    let db = syncwright::connect_and_migrate(database_url).await?;
    let settings = config.engine_settings();

    let transport: Arc<dyn HttpTransport> =
        Arc::new(ReqwestTransport::with_timeout(settings.graphql.request_timeout)?);
    let tokens = config.token_provider(Arc::clone(&transport))?;
    let circuits = Arc::new(CircuitRegistry::new(CircuitConfig {
        failure_threshold: settings.graphql.failure_threshold,
        open_duration: settings.graphql.open_duration,
    }));
    let tenants = Arc::new(TenantDirectory::new(config.tenants.clone()));

    let client = HttpGraphQlClient::new(
        transport,
        Arc::clone(&tokens),
        Arc::clone(&circuits),
        settings.graphql.clone(),
    );
    let reconciler = Reconciler::new(db.clone(), Arc::new(client), settings.reconcile.clone());
    let context = EngineContext::new(db, tenants, tokens, circuits);

    Ok(Engine {
        context,
        reconciler,
        settings,
    })
}
