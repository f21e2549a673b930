//! `POST /api/v1/search`: run one grid search and return its results.

use std::path::Path;

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use bizfinder_core::{BusinessRecord, Coordinates};
use bizfinder_search::{
    SearchError, SearchLogEvent, SearchRequest, SearchResult, SearchStats, SubTaskFailure,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

const DEFAULT_SEARCH_TERM: &str = "business";
const DEFAULT_RADIUS_M: f64 = 1_000.0;
const LATEST_RESULTS_FILE: &str = "latest_search_results.json";

#[derive(Debug, Deserialize)]
pub(super) struct SearchBody {
    pub search_term: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub radius: Option<f64>,
    pub sub_radius: Option<f64>,
    pub max_workers: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(super) struct SearchData {
    pub request_id: String,
    pub records: Vec<BusinessRecord>,
    pub stats: SearchStats,
    pub failures: Vec<SubTaskFailure>,
    pub events: Vec<SearchLogEvent>,
}

impl From<SearchResult> for SearchData {
    fn from(result: SearchResult) -> Self {
        Self {
            request_id: result.request_id.to_string(),
            records: result.records,
            stats: result.stats,
            failures: result.failures,
            events: result.events,
        }
    }
}

pub(super) async fn run_search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<SearchBody>, JsonRejection>,
) -> Result<Json<ApiResponse<SearchData>>, ApiError> {
    let Json(body) =
        body.map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.body_text()))?;

    let Some(orchestrator) = state.search.as_ref() else {
        return Err(ApiError::new(
            req_id.0,
            "unavailable",
            "search is unavailable: no Google API key is configured",
        ));
    };

    let request = SearchRequest::new(
        body.search_term.unwrap_or_else(|| DEFAULT_SEARCH_TERM.to_owned()),
        Coordinates::new(body.latitude, body.longitude),
        body.radius.unwrap_or(DEFAULT_RADIUS_M),
    )
    .with_sub_radius(body.sub_radius)
    .with_max_workers(body.max_workers);

    tracing::info!(
        request_id = %req_id.0,
        search_id = %request.id(),
        term = request.search_term(),
        radius_m = request.radius_m(),
        "search requested"
    );

    let result = orchestrator.search(&request).await.map_err(|e| match e {
        SearchError::InvalidParameter { .. } => {
            ApiError::new(req_id.0.clone(), "validation_error", e.to_string())
        }
    })?;

    let data = SearchData::from(result);
    save_latest(&state.results_dir, &data).await;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Best-effort write of the latest result set; failures are only logged.
async fn save_latest(dir: &Path, data: &SearchData) {
    let path = dir.join(LATEST_RESULTS_FILE);
    let bytes = match serde_json::to_vec_pretty(data) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "failed to serialize latest search results");
            return;
        }
    };
    if let Err(e) = tokio::fs::create_dir_all(dir).await {
        tracing::warn!(path = %dir.display(), error = %e, "failed to create results directory");
        return;
    }
    if let Err(e) = tokio::fs::write(&path, bytes).await {
        tracing::warn!(path = %path.display(), error = %e, "failed to save latest search results");
    }
}
