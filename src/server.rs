//! HTTP surface: router, handlers and error mapping.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;

use crate::models::{CatalogFilter, ThemeProfile};
use crate::service;
use crate::upstream::{UpstreamClient, UpstreamError};

/// Reports and category trees are expensive aggregate queries; downstreams
/// may cache them for fifteen minutes.
const FIFTEEN_MIN_CACHE: &str = "max-age=900";

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<UpstreamClient>,
}

/// Request-level failure mapped onto an HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid value for {0} parameter")]
    InvalidParam(&'static str),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::InvalidParam(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
struct CatalogParams {
    filter: Option<String>,
    #[serde(rename = "includeEmpty")]
    include_empty: Option<String>,
}

impl CatalogParams {
    fn filter(&self) -> Result<CatalogFilter, ApiError> {
        CatalogFilter::from_param(self.filter.as_deref())
            .ok_or(ApiError::InvalidParam("filter"))
    }

    fn include_empty(&self) -> bool {
        self.include_empty.as_deref() == Some("true")
    }
}

#[derive(Debug, Default, Deserialize)]
struct ReportParams {
    #[serde(rename = "orgPath")]
    org_path: Option<String>,
    themeprofile: Option<String>,
}

impl ReportParams {
    fn theme_profile(&self) -> Result<Option<ThemeProfile>, ApiError> {
        ThemeProfile::from_param(self.themeprofile.as_deref())
            .map_err(|_| ApiError::InvalidParam("themeprofile"))
    }
}

pub fn build_router(client: Arc<UpstreamClient>) -> Router {
    let state = AppState { client };

    Router::new()
        .route("/ping", get(ping))
        .route("/ready", get(ready))
        .route("/organizationcatalogs", get(organization_catalogs))
        .route("/organizationcatalogs/{id}", get(organization_catalog))
        .route("/organizationcategories/state", get(state_categories))
        .route(
            "/organizationcategories/municipality",
            get(municipality_categories),
        )
        .route("/report/datasets", get(dataset_report))
        .route("/report/dataservices", get(data_service_report))
        .route("/report/concepts", get(concept_report))
        .route("/report/informationmodels", get(information_model_report))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn ping() -> &'static str {
    "OK"
}

async fn ready(State(state): State<AppState>) -> Response {
    let report = state.client.check_ready().await;
    if !report.is_ready() {
        (StatusCode::SERVICE_UNAVAILABLE, Json(report)).into_response()
    } else if !report.warnings.is_empty() {
        Json(report).into_response()
    } else {
        "OK".into_response()
    }
}

async fn organization_catalogs(
    State(state): State<AppState>,
    Query(params): Query<CatalogParams>,
) -> Result<Response, ApiError> {
    let filter = params.filter()?;
    let catalogs =
        service::get_organization_catalogs(&state.client, filter, params.include_empty()).await?;
    Ok(Json(catalogs).into_response())
}

async fn organization_catalog(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<CatalogParams>,
) -> Result<Response, ApiError> {
    let filter = params.filter()?;
    match service::get_organization_catalog(&state.client, &id, filter).await? {
        Some(catalog) => Ok(Json(catalog).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

async fn state_categories(
    State(state): State<AppState>,
    Query(params): Query<CatalogParams>,
) -> Result<Response, ApiError> {
    let filter = params.filter()?;
    let categories =
        service::get_state_categories(&state.client, filter, params.include_empty()).await?;
    Ok(cached(categories))
}

async fn municipality_categories(
    State(state): State<AppState>,
    Query(params): Query<CatalogParams>,
) -> Result<Response, ApiError> {
    let filter = params.filter()?;
    let categories =
        service::get_municipality_categories(&state.client, filter, params.include_empty())
            .await?;
    Ok(cached(categories))
}

async fn dataset_report(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> Result<Response, ApiError> {
    let theme_profile = params.theme_profile()?;
    let report =
        service::get_dataset_report(&state.client, params.org_path.as_deref(), theme_profile)
            .await;
    Ok(cached(report))
}

async fn data_service_report(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> Result<Response, ApiError> {
    let report =
        service::get_data_service_report(&state.client, params.org_path.as_deref()).await;
    Ok(cached(report))
}

async fn concept_report(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> Result<Response, ApiError> {
    let report = service::get_concept_report(&state.client, params.org_path.as_deref()).await;
    Ok(cached(report))
}

async fn information_model_report(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> Result<Response, ApiError> {
    let report =
        service::get_information_model_report(&state.client, params.org_path.as_deref()).await;
    Ok(cached(report))
}

fn cached<T: serde::Serialize>(body: T) -> Response {
    ([(header::CACHE_CONTROL, FIFTEEN_MIN_CACHE)], Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamConfig;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let client = UpstreamClient::new(UpstreamConfig::default()).unwrap();
        build_router(Arc::new(client))
    }

    #[tokio::test]
    async fn test_ping_returns_ok() {
        let response = test_router()
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn test_invalid_filter_is_rejected() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/organizationcatalogs?filter=bogus")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_theme_profile_is_rejected() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/report/datasets?themeprofile=bogus")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_category_filter_is_rejected() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/organizationcategories/state?filter=bogus")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_include_empty_defaults_to_false() {
        let params = CatalogParams::default();
        assert!(!params.include_empty());

        let params = CatalogParams {
            include_empty: Some("true".to_string()),
            ..Default::default()
        };
        assert!(params.include_empty());

        let params = CatalogParams {
            include_empty: Some("false".to_string()),
            ..Default::default()
        };
        assert!(!params.include_empty());
    }
}
