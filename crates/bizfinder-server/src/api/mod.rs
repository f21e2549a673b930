mod search;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use bizfinder_search::SearchOrchestrator;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{request_id, RequestId};

#[derive(Clone)]
pub struct AppState {
    /// `None` when no API key is configured; searches then answer 503.
    pub search: Option<Arc<SearchOrchestrator>>,
    pub results_dir: Arc<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    places: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "validation_error" => StatusCode::BAD_REQUEST,
            "unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/search", post(search::run_search))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let places = if state.search.is_some() {
        "configured"
    } else {
        "missing_api_key"
    };
    (
        StatusCode::OK,
        Json(ApiResponse {
            data: HealthData {
                status: "ok",
                places,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use bizfinder_core::BusinessRecord;
    use bizfinder_places::{LookupPage, LookupQuery, PlaceLookup, PlacesError};
    use bizfinder_search::{FetchPolicy, SearchSettings};
    use tower::ServiceExt;

    /// Every disc answers with the same two businesses.
    struct FixedLookup;

    #[async_trait]
    impl PlaceLookup for FixedLookup {
        async fn lookup(&self, _query: LookupQuery<'_>) -> Result<LookupPage, PlacesError> {
            let mut cafe = BusinessRecord::new("cafe-1");
            cafe.name = Some("Corner Cafe".to_owned());
            let mut bakery = BusinessRecord::new("bakery-1");
            bakery.name = Some("Bread Co".to_owned());
            Ok(LookupPage {
                results: vec![cafe, bakery],
                next_page_token: None,
            })
        }
    }

    fn state_with_search(results_dir: PathBuf) -> AppState {
        let settings = SearchSettings {
            fetch: FetchPolicy::immediate(),
            ..SearchSettings::default()
        };
        AppState {
            search: Some(Arc::new(SearchOrchestrator::new(Arc::new(FixedLookup), settings))),
            results_dir: Arc::new(results_dir),
        }
    }

    fn state_without_search() -> AppState {
        AppState {
            search: None,
            results_dir: Arc::new(PathBuf::from("unused")),
        }
    }

    fn post_search(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/search")
            .header("content-type", "application/json")
            .body(Body::from(body.to_owned()))
            .expect("request")
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&body).expect("json parse")
    }

    #[test]
    fn api_error_validation_error_maps_to_bad_request() {
        let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_unavailable_maps_to_service_unavailable() {
        let response = ApiError::new("req-1", "unavailable", "no key").into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn health_reports_missing_api_key() {
        let app = build_app(state_without_search());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["data"]["places"], "missing_api_key");
    }

    #[tokio::test]
    async fn request_id_header_is_echoed() {
        let app = build_app(state_without_search());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(
            response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
            Some("abc-123")
        );
        let json = json_body(response).await;
        assert_eq!(json["meta"]["request_id"], "abc-123");
    }

    #[tokio::test]
    async fn search_without_api_key_is_unavailable() {
        let app = build_app(state_without_search());
        let response = app
            .oneshot(post_search(r#"{"latitude": 37.7749, "longitude": -122.4194}"#))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "unavailable");
    }

    #[tokio::test]
    async fn search_returns_merged_records_stats_and_events() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = build_app(state_with_search(dir.path().join("data")));
        let response = app
            .oneshot(post_search(
                r#"{"search_term": "coffee", "latitude": 37.7749, "longitude": -122.4194,
                    "radius": 6000, "sub_radius": 2000, "max_workers": 3}"#,
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        let records = json["data"]["records"].as_array().expect("records array");
        assert_eq!(records.len(), 2, "duplicates across discs are merged");
        let stats = &json["data"]["stats"];
        assert!(stats["sub_task_count"].as_u64().expect("count") > 1);
        assert_eq!(stats["final_count"], 2);
        assert!(json["data"]["events"]
            .as_array()
            .expect("events array")
            .iter()
            .any(|e| e["category"] == "grid-generation"));

        let saved = std::fs::read_to_string(dir.path().join("data/latest_search_results.json"))
            .expect("latest results saved");
        let saved: serde_json::Value = serde_json::from_str(&saved).expect("saved json");
        assert_eq!(saved["records"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn search_defaults_term_and_radius() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = build_app(state_with_search(dir.path().to_path_buf()));
        let response = app
            .oneshot(post_search(r#"{"latitude": 1.0, "longitude": 2.0}"#))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["data"]["stats"]["sub_task_count"], 1);
        assert_eq!(json["data"]["stats"]["grid_used"], false);
    }

    #[tokio::test]
    async fn invalid_radius_is_a_validation_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = build_app(state_with_search(dir.path().to_path_buf()));
        let response = app
            .oneshot(post_search(r#"{"latitude": 1.0, "longitude": 2.0, "radius": -5}"#))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "validation_error");
        assert!(json["error"]["message"]
            .as_str()
            .expect("message")
            .contains("radius"));
    }

    #[tokio::test]
    async fn blank_search_term_is_a_validation_error() {
        for body in [
            r#"{"search_term": "", "latitude": 1.0, "longitude": 2.0}"#,
            r#"{"search_term": "   ", "latitude": 1.0, "longitude": 2.0}"#,
        ] {
            let dir = tempfile::tempdir().expect("tempdir");
            let app = build_app(state_with_search(dir.path().to_path_buf()));
            let response = app.oneshot(post_search(body)).await.expect("response");

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
            let json = json_body(response).await;
            assert_eq!(json["error"]["code"], "validation_error");
            assert!(json["error"]["message"]
                .as_str()
                .expect("message")
                .contains("search_term"));
            assert!(
                !dir.path().join("latest_search_results.json").exists(),
                "rejected searches save nothing"
            );
        }
    }

    #[tokio::test]
    async fn malformed_body_is_a_validation_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = build_app(state_with_search(dir.path().to_path_buf()));
        let response = app
            .oneshot(post_search(r#"{"latitude": "north"}"#))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "validation_error");
    }
}
