//! Request and response bodies for the REST API.

use serde::{Deserialize, Serialize};
use vigil_registry::Target;

/// Body of `POST /api/health/checks`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTargetRequest {
    #[serde(default)]
    pub endpoint: String,
}

/// Returned by a successful registration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateTargetResponse {
    pub id: String,
    pub endpoint: String,
}

/// One page of targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetList {
    pub items: Vec<Target>,
    pub page: usize,
    /// Number of registered targets across all pages.
    pub total: usize,
    /// Page size.
    pub size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Query string of the list route. Kept as raw text so a non-numeric page
/// is reported with the API's own error body.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
}

/// Query string of the try route.
#[derive(Debug, Default, Deserialize)]
pub struct TryQuery {
    /// Duration string such as `"2s"` or `"500ms"`.
    pub timeout: Option<String>,
}
