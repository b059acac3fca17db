use syncwright::TenantDirectory;
use syncwright::dispatch::subject::filter_subjects;
use syncwright::webhook::HandlerRegistry;

use crate::config::Config;

/// Print the filter subjects the dispatcher would subscribe to.
pub(crate) fn handle_subjects(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let registry = HandlerRegistry::standard()?;
    let tenants = TenantDirectory::new(config.tenants.clone());
    let subjects = filter_subjects(
        &config.broker.namespace,
        &tenants,
        &registry.supported_event_types(),
    );
    if subjects.is_empty() {
        eprintln!("No tenants configured; add [[tenants]] entries to subscribe to anything.");
    }
    for subject in subjects {
        println!("{subject}");
    }
    Ok(())
}
