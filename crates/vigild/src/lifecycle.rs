//! Shutdown sequencing.
//!
//! The registry snapshot is the daemon's only persisted state, so it is
//! written even when the scheduler cannot stop in time.

use std::path::Path;
use std::time::Duration;

use tracing::{error, info, warn};

use vigil_health::Scheduler;
use vigil_registry::Registry;

/// Time allowed for the scheduler to stop before its probes are abandoned.
pub const SCHEDULER_STOP_BUDGET: Duration = Duration::from_secs(5);

/// Time allowed for the API server to drain open connections.
pub const SERVER_DRAIN_BUDGET: Duration = Duration::from_secs(5);

/// Stop the scheduler within `stop_budget`, then dump the registry.
///
/// The dump runs whether or not the scheduler stopped in time. A dump
/// failure is logged and not returned.
pub async fn stop_and_dump(
    scheduler: &mut Scheduler,
    registry: &Registry,
    data_file: &Path,
    stop_budget: Duration,
) {
    if tokio::time::timeout(stop_budget, scheduler.stop())
        .await
        .is_err()
    {
        warn!(budget = ?stop_budget, "scheduler did not stop in time, abandoning running probes");
    }

    match registry.dump(data_file) {
        Ok(()) => info!(
            targets = registry.len(),
            path = %data_file.display(),
            "registry dumped"
        ),
        Err(e) => error!(error = %e, path = %data_file.display(), "failed to dump registry"),
    }
}
