//! REST API handlers.
//!
//! Handlers read and write the shared `Registry`; the try route calls the
//! `Prober` directly on a private copy of the target.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::{debug, info};
use url::Url;

use vigil_registry::{Target, is_target_id, parse_duration};

use crate::ApiState;
use crate::models::{
    CreateTargetRequest, CreateTargetResponse, ErrorBody, ListQuery, TargetList, TryQuery,
};

/// Targets per page of the list route.
pub const PAGE_SIZE: usize = 10;

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ErrorBody {
            error: msg.to_string(),
        }),
    )
}

/// Slice bounds `[start, end)` for a page, clamped to `len`.
pub fn paginate(page: usize, size: usize, len: usize) -> (usize, usize) {
    let start = page.saturating_mul(size).min(len);
    let end = start.saturating_add(size).min(len);
    (start, end)
}

/// Accept only absolute http(s) URLs with a host.
fn validate_endpoint(endpoint: &str) -> Result<(), &'static str> {
    if endpoint.is_empty() {
        return Err("empty healthcheck endpoint");
    }
    match Url::parse(endpoint) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        _ => Err("invalid URL"),
    }
}

// ── Targets ────────────────────────────────────────────────────

/// GET /api/health/checks?page=N
pub async fn list_targets(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let page = match query.page.as_deref().map(str::parse::<usize>) {
        None => 0,
        Some(Ok(page)) => page,
        Some(Err(e)) => {
            return error_response(&format!("invalid page: {e}"), StatusCode::BAD_REQUEST)
                .into_response();
        }
    };

    let mut targets = state.registry.list();
    targets.sort_by(|a, b| a.endpoint.cmp(&b.endpoint));

    let total = targets.len();
    let (start, end) = paginate(page, PAGE_SIZE, total);
    let items = targets.drain(start..end).collect();

    Json(TargetList {
        items,
        page,
        total,
        size: PAGE_SIZE,
    })
    .into_response()
}

/// POST /api/health/checks
pub async fn create_target(
    State(state): State<ApiState>,
    payload: Result<Json<CreateTargetRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            return error_response(&rejection.body_text(), StatusCode::BAD_REQUEST)
                .into_response();
        }
    };

    if let Err(msg) = validate_endpoint(&req.endpoint) {
        return error_response(msg, StatusCode::BAD_REQUEST).into_response();
    }

    let target = Target::new(req.endpoint);
    let response = CreateTargetResponse {
        id: target.id.clone(),
        endpoint: target.endpoint.clone(),
    };

    match state.registry.create(target) {
        Ok(()) => {
            info!(id = %response.id, endpoint = %response.endpoint, "target registered");
            Json(response).into_response()
        }
        Err(e) => error_response(&e.to_string(), StatusCode::BAD_REQUEST).into_response(),
    }
}

/// GET /api/health/checks/{id}
pub async fn get_target(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.registry.get(&id) {
        Ok(target) => Json(target).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::NOT_FOUND).into_response(),
    }
}

/// DELETE /api/health/checks/{id}
///
/// Idempotent: removing an unknown id still succeeds.
pub async fn delete_target(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if state.registry.delete(&id) {
        info!(%id, "target removed");
    }
    StatusCode::OK
}

// ── Ad-hoc probe ───────────────────────────────────────────────

/// POST /api/health/checks/{id}/try?timeout=2s
///
/// Probes a copy holding only `{id, endpoint}` and returns it. The registry
/// is not touched.
pub async fn try_target(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Query(query): Query<TryQuery>,
) -> impl IntoResponse {
    if !is_target_id(&id) {
        return error_response("invalid uuid", StatusCode::BAD_REQUEST).into_response();
    }

    let timeout = match query.timeout.as_deref() {
        None => state.prober.default_timeout(),
        Some(raw) => match parse_duration(raw) {
            Ok(timeout) if !timeout.is_zero() => timeout,
            Ok(_) => {
                return error_response("timeout must be positive", StatusCode::BAD_REQUEST)
                    .into_response();
            }
            Err(e) => {
                return error_response(&e.to_string(), StatusCode::BAD_REQUEST).into_response();
            }
        },
    };

    let target = match state.registry.get(&id) {
        Ok(target) => target,
        Err(e) => return error_response(&e.to_string(), StatusCode::BAD_REQUEST).into_response(),
    };

    let result = state.prober.run(target.blank_copy(), timeout).await;
    debug!(%id, code = result.code, duration = %result.duration, "ad-hoc probe finished");
    Json(result).into_response()
}
