mod buyers;
mod companies;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use leadbridge_crm::{CompanyCache, CrmClient, CrmError};

use crate::middleware::request_id;

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<CrmClient>,
    pub cache: Arc<CompanyCache>,
    key_info: KeyInfo,
}

impl AppState {
    pub fn new(client: CrmClient, api_key: Option<&str>) -> Self {
        Self {
            client: Arc::new(client),
            cache: Arc::new(CompanyCache::new()),
            key_info: KeyInfo::from_key(api_key),
        }
    }
}

/// Diagnostic view of the upstream credential for the health probe; never
/// exposes more than a four-character prefix.
#[derive(Debug, Clone)]
struct KeyInfo {
    configured: bool,
    length: usize,
    preview: String,
}

impl KeyInfo {
    fn from_key(key: Option<&str>) -> Self {
        match key {
            Some(key) if !key.is_empty() => {
                let length = key.chars().count();
                let preview = if length > 4 {
                    format!("{}****", key.chars().take(4).collect::<String>())
                } else {
                    "****".to_owned()
                };
                Self {
                    configured: true,
                    length,
                    preview,
                }
            }
            _ => Self {
                configured: false,
                length: 0,
                preview: String::new(),
            },
        }
    }
}

/// Error shape all endpoints render: `{"error": message}` with the mapped
/// HTTP status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Converts an upstream failure into the generic 500 boundary response.
pub(super) fn map_crm_error(error: &CrmError) -> ApiError {
    tracing::error!(error = %error, "upstream CRM call failed");
    ApiError::internal(error.to_string())
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/buyers", get(buyers::list))
        .route("/buyers/raw", get(buyers::raw))
        .route("/buyers/all", get(buyers::all))
        .route("/companies", get(companies::list))
        .route("/companies/all", get(companies::all))
        .route("/companies/{id}", get(companies::lookup))
        .route("/cache/clear", post(companies::clear_cache))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthData {
    status: &'static str,
    api_key_configured: bool,
    api_key_length: usize,
    api_key_preview: String,
    cache_size: usize,
    timestamp: DateTime<Utc>,
}

async fn health(State(state): State<AppState>) -> Json<HealthData> {
    Json(HealthData {
        status: "ok",
        api_key_configured: state.key_info.configured,
        api_key_length: state.key_info.length,
        api_key_preview: state.key_info.preview.clone(),
        cache_size: state.cache.len(),
        timestamp: Utc::now(),
    })
}
