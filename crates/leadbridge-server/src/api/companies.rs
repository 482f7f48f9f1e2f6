use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use leadbridge_crm::{accumulate, to_records, CompanyCache};

use super::{map_crm_error, ApiError, AppState};

const COMPANIES_PER_PAGE: u32 = 100;
const COMPANIES_PAGE_CAP: u32 = 100;
const COMPANIES_INTER_PAGE_DELAY: Duration = Duration::from_millis(500);
const COMPANIES_DEFAULT_MAX: usize = 5_000;

#[derive(Debug, Deserialize)]
pub(super) struct CompaniesQuery {
    page: Option<u32>,
    per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CompaniesAllQuery {
    max: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(super) struct CompaniesAllResponse {
    total: usize,
    /// Records from this run that carried an id and were written to the cache.
    cached: usize,
    pages_processed: u32,
    data: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub(super) struct CacheClearResponse {
    cleared: usize,
}

/// `GET /companies` — one upstream page with custom fields, unmodified.
pub(super) async fn list(
    State(state): State<AppState>,
    Query(query): Query<CompaniesQuery>,
) -> Result<Json<Value>, ApiError> {
    let body = state
        .client
        .companies_page(
            query.page.unwrap_or(1),
            query.per_page.unwrap_or(COMPANIES_PER_PAGE),
        )
        .await
        .map_err(|e| map_crm_error(&e))?;
    Ok(Json(body))
}

/// `GET /companies/all` — accumulates company pages and primes the cache
/// with every record that carries an id.
pub(super) async fn all(
    State(state): State<AppState>,
    Query(query): Query<CompaniesAllQuery>,
) -> Result<Json<CompaniesAllResponse>, ApiError> {
    let max = query.max.unwrap_or(COMPANIES_DEFAULT_MAX);

    let fetch = |page: u32| {
        let client = Arc::clone(&state.client);
        async move {
            let body = client.companies_page(page, COMPANIES_PER_PAGE).await?;
            Ok(to_records(&body))
        }
    };

    let accumulation = accumulate(
        fetch,
        COMPANIES_PER_PAGE,
        max,
        COMPANIES_PAGE_CAP,
        COMPANIES_INTER_PAGE_DELAY,
    )
    .await
    .map_err(|e| map_crm_error(&e))?;

    let mut cached = 0usize;
    for record in &accumulation.records {
        if let Some(key) = record.get("id").and_then(CompanyCache::key_of) {
            state.cache.put(&key, record.clone());
            cached += 1;
        }
    }

    tracing::info!(
        total = accumulation.records.len(),
        cached,
        pages_processed = accumulation.pages_processed,
        per_page = accumulation.per_page,
        "company accumulation complete"
    );

    Ok(Json(CompaniesAllResponse {
        total: accumulation.records.len(),
        cached,
        pages_processed: accumulation.pages_processed,
        data: accumulation.records,
    }))
}

/// `GET /companies/{id}` — cached lookup. Any fetch failure is reported as
/// not-found; the underlying error is only logged.
pub(super) async fn lookup(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = id.trim().to_owned();
    if id.is_empty() {
        return Err(ApiError::bad_request("company id is required"));
    }

    match state.cache.get_or_fetch(&state.client, &id).await {
        Ok(record) => Ok(Json(record)),
        Err(error) => {
            tracing::warn!(company_id = %id, error = %error, "company lookup failed");
            Err(ApiError::not_found("company not found"))
        }
    }
}

/// `POST /cache/clear` — empties the company cache.
pub(super) async fn clear_cache(State(state): State<AppState>) -> Json<CacheClearResponse> {
    let cleared = state.cache.clear();
    tracing::info!(cleared, "company cache cleared");
    Json(CacheClearResponse { cleared })
}
