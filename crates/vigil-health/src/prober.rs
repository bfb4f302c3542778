//! Single-attempt HTTP probe.
//!
//! `Prober::run` issues one GET against a target's endpoint under a timeout
//! and records the outcome on the target. It never retries and never fails:
//! construction, connection, and timeout errors become `status = "Error"`,
//! `code = 0`, and an error message.

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use tracing::debug;

use vigil_registry::{ERROR_STATUS, Target, epoch_secs, format_duration};

use crate::error::HealthResult;

/// Default per-probe timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

const USER_AGENT: &str = concat!("vigil-health/", env!("CARGO_PKG_VERSION"));

/// Executes HTTP probes with a shared client.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Prober {
    client: Client,
    default_timeout: Duration,
}

impl Prober {
    /// Create a prober with its own HTTP client.
    pub fn new(default_timeout: Duration) -> HealthResult<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::with_client(client, default_timeout))
    }

    /// Create a prober around an existing client.
    pub fn with_client(client: Client, default_timeout: Duration) -> Self {
        Self {
            client,
            default_timeout,
        }
    }

    /// Timeout used when a caller does not supply one.
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Probe `target.endpoint` once and return the target with its result
    /// fields updated. `id` and `endpoint` are left untouched.
    pub async fn run(&self, mut target: Target, timeout: Duration) -> Target {
        let started = Instant::now();
        let checked = epoch_secs();

        let request = self.client.get(&target.endpoint).timeout(timeout).send();
        match tokio::time::timeout(timeout, request).await {
            Ok(Ok(response)) => {
                let status = response.status();
                target.code = status.as_u16();
                target.status = status_line(status);
                target.checked = checked;
                target.error.clear();
            }
            Ok(Err(e)) => record_failure(&mut target, describe(&e)),
            Err(_) => record_failure(&mut target, format!("probe timed out after {timeout:?}")),
        }

        target.duration = format_duration(started.elapsed());
        target
    }
}

/// Status line in the `"200 OK"` form.
fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {reason}", status.as_u16()),
        None => status.as_u16().to_string(),
    }
}

fn record_failure(target: &mut Target, error: String) {
    debug!(id = %target.id, endpoint = %target.endpoint, %error, "probe failed");
    target.status = ERROR_STATUS.to_string();
    target.code = 0;
    target.error = error;
}

/// Render an error together with its source chain.
fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
