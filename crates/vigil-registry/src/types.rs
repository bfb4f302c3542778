//! Domain types for the Vigil registry.
//!
//! A [`Target`] is both the registration record and the latest probe
//! result. It is serialized as-is into registry snapshots and API responses.

use serde::{Deserialize, Serialize};

use crate::id::new_target_id;

/// Unique identifier for a registered target.
pub type TargetId = String;

/// Status line recorded when a probe could not complete.
pub const ERROR_STATUS: &str = "Error";

/// A registered endpoint and its most recent probe result.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Target {
    pub id: TargetId,
    /// HTTP status line of the last probe (`"200 OK"`), or `"Error"`.
    pub status: String,
    /// Numeric HTTP status of the last probe; 0 when it failed.
    pub code: u16,
    /// Absolute URL probed with GET.
    pub endpoint: String,
    /// Unix timestamp (seconds) of the last successful probe.
    pub checked: u64,
    /// Wall time of the last probe attempt (e.g. `"12.3ms"`).
    pub duration: String,
    /// Failure description of the last probe; empty on success.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl Target {
    /// Create an unprobed target with a freshly generated identifier.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            id: new_target_id(),
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// A copy carrying only the identity fields, with no probe history.
    pub fn blank_copy(&self) -> Self {
        Self {
            id: self.id.clone(),
            endpoint: self.endpoint.clone(),
            ..Self::default()
        }
    }

    /// Copy the probe result fields from `result`, keeping identity intact.
    pub fn apply_result(&mut self, result: &Target) {
        self.status.clone_from(&result.status);
        self.code = result.code;
        self.checked = result.checked;
        self.duration.clone_from(&result.duration);
        self.error.clone_from(&result.error);
    }

    /// Whether the last probe produced an HTTP response.
    pub fn is_reachable(&self) -> bool {
        self.code != 0 && self.error.is_empty()
    }
}

/// Current Unix time in whole seconds.
pub fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
