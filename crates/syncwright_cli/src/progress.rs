//! Progress reporting for reconciliation passes.
//!
//! Events are turned into structured tracing lines; the subscriber decides
//! whether they end up on a terminal or in a log pipeline.

mod logging;

pub use logging::LoggingReporter;

use syncwright::reconcile::ProgressCallback;

/// Callback that forwards every event to a [`LoggingReporter`].
pub fn progress_callback() -> ProgressCallback {
    let reporter = LoggingReporter::new();
    Box::new(move |event| reporter.handle(event))
}
