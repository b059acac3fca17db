use std::sync::Arc;

use syncwright::dispatch::{BrokerError, Dispatcher, MessageSource};
use syncwright::reconcile::Scheduler;
use syncwright::settings::BrokerSettings;
use syncwright::webhook::HandlerRegistry;

use crate::commands::shared::build_engine;
use crate::config::Config;
use crate::progress::progress_callback;
use crate::shutdown::shutdown_token;

/// Run the dispatcher and the reconciliation scheduler until Ctrl+C.
pub(crate) async fn handle_serve(
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = build_engine(config, database_url).await?;
    let shutdown = shutdown_token();

    let registry = Arc::new(HandlerRegistry::standard()?);
    let source = connect_source(&engine.settings.broker).await?;
    let dispatcher = Dispatcher::new(
        engine.context.clone(),
        registry,
        source,
        engine.settings.broker.clone(),
    );

    let scheduler = Scheduler::new(engine.reconciler.clone(), engine.context.clone());
    let scheduler_task = tokio::spawn(scheduler.run(shutdown.clone(), Some(progress_callback())));

    tracing::info!(
        tenants = engine.context.tenants.tenants().len(),
        stream = %engine.settings.broker.stream,
        "syncwright serving"
    );
    let result = dispatcher.run(shutdown.clone()).await;

    shutdown.cancel();
    scheduler_task.await?;

    let stats = result?;
    tracing::info!(
        acked = stats.acked,
        dropped = stats.dropped,
        nakked = stats.nakked,
        "shutdown complete"
    );
    Ok(())
}

#[cfg(feature = "nats")]
async fn connect_source(settings: &BrokerSettings) -> Result<Arc<dyn MessageSource>, BrokerError> {
    let source =
        syncwright::dispatch::JetStreamSource::connect(&settings.url, settings.stream.clone())
            .await?;
    Ok(Arc::new(source))
}

#[cfg(not(feature = "nats"))]
async fn connect_source(settings: &BrokerSettings) -> Result<Arc<dyn MessageSource>, BrokerError> {
    Err(BrokerError::Connect(format!(
        "{} requires the `nats` feature",
        settings.url
    )))
}
