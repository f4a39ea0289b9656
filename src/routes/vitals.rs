use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::Value as JsonValue;

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::store::{self, StoredSample};
use crate::vitals::{self, Summary};
#[allow(unused_imports)] // referenced by name in `#[utoipa::path(request_body = Sample)]`
use crate::vitals::Sample;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct CreateVitalResponse {
    success: bool,
    id: i64,
}

#[derive(Debug, Clone, Default, serde::Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct HistoryQuery {
    /// 1-based page number (default 1)
    page: Option<String>,
    /// Page size, capped by the configured history limit
    limit: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct HistoryResponse {
    page: i64,
    limit: i64,
    total: i64,
    #[serde(rename = "totalPages")]
    total_pages: i64,
    data: Vec<StoredSample>,
}

#[derive(Debug, Clone, Default, serde::Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct AnalyticsQuery {
    /// Number of most recent samples to summarize
    window: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PageWindow {
    page: i64,
    limit: i64,
}

impl PageWindow {
    fn offset(self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    fn total_pages(self, total: i64) -> i64 {
        (total + self.limit - 1) / self.limit
    }
}

fn resolve_page(query: &HistoryQuery, max_limit: usize) -> PageWindow {
    let max_limit = i64::try_from(max_limit).unwrap_or(i64::MAX).max(1);
    let page = parse_positive(query.page.as_deref()).unwrap_or(1);
    let limit = parse_positive(query.limit.as_deref())
        .unwrap_or(max_limit)
        .min(max_limit);
    PageWindow { page, limit }
}

fn resolve_window(query: &AnalyticsQuery, default_window: usize, max_window: usize) -> usize {
    parse_positive(query.window.as_deref())
        .and_then(|value| usize::try_from(value).ok())
        .unwrap_or(default_window)
        .clamp(1, max_window.max(1))
}

fn parse_positive(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|value| *value > 0)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/vitals",
    tag = "vitals",
    request_body = Sample,
    responses(
        (status = 201, description = "Sample stored", body = CreateVitalResponse),
        (status = 400, description = "Sample rejected; `error` carries the reason"),
        (status = 500, description = "Database error")
    )
)]
pub(crate) async fn create_vital(
    State(state): State<AppState>,
    payload: Result<Json<JsonValue>, JsonRejection>,
) -> AppResult<(StatusCode, Json<CreateVitalResponse>)> {
    let Json(body) = payload.map_err(|err| {
        tracing::info!(error = %err, "rejected unreadable vitals body");
        AppError::bad_request("Invalid JSON body")
    })?;

    let sample = vitals::parse_sample(&body, Utc::now()).map_err(|err| {
        tracing::info!(reason = %err, "rejected vitals sample");
        AppError::from(err)
    })?;

    let id = store::insert_sample(&state.db, &sample).await?;
    tracing::debug!(id, device_id = %sample.device_id, "stored vitals sample");

    Ok((
        StatusCode::CREATED,
        Json(CreateVitalResponse { success: true, id }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/vitals",
    tag = "vitals",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Page of stored samples, newest first", body = HistoryResponse),
        (status = 500, description = "Database error")
    )
)]
pub(crate) async fn list_vitals(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<HistoryResponse>> {
    let window = resolve_page(&query, state.config.history_max_limit);

    let data = store::list_samples(&state.db, window.limit, window.offset()).await?;
    let total = store::count_samples(&state.db).await?;

    Ok(Json(HistoryResponse {
        page: window.page,
        limit: window.limit,
        total,
        total_pages: window.total_pages(total),
        data,
    }))
}

#[utoipa::path(
    get,
    path = "/api/vitals/analytics",
    tag = "vitals",
    params(AnalyticsQuery),
    responses(
        (status = 200, description = "Rolling summary over the most recent samples", body = Summary),
        (status = 500, description = "Database error")
    )
)]
pub(crate) async fn vitals_analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> AppResult<Json<Summary>> {
    let window = resolve_window(
        &query,
        state.config.analytics_window,
        state.config.history_max_limit,
    );

    let readings = store::recent_readings(&state.db, window as i64).await?;
    Ok(Json(vitals::summarize(readings, window)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/vitals", get(list_vitals).post(create_vital))
        .route("/vitals/analytics", get(vitals_analytics))
}
