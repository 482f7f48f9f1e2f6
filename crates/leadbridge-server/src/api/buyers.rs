use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, RawQuery, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use leadbridge_core::CanonicalBuyer;
use leadbridge_crm::{accumulate, map_buyer, to_records};

use super::{map_crm_error, ApiError, AppState};

const BUYERS_PER_PAGE: u32 = 15;
const BUYERS_PAGE_CAP: u32 = 1_000;
const BUYERS_INTER_PAGE_DELAY: Duration = Duration::from_millis(800);
const BUYERS_DEFAULT_MAX: usize = 10_000;

#[derive(Debug, Serialize)]
pub(super) struct BuyersListResponse {
    count: usize,
    data: Vec<CanonicalBuyer>,
    raw: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BuyersAllQuery {
    search: Option<String>,
    max: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(super) struct BuyersAllResponse {
    total: usize,
    pages_processed: u32,
    per_page: u32,
    search: Option<String>,
    data: Vec<CanonicalBuyer>,
}

/// `GET /buyers` — forwards the query verbatim and returns both the
/// canonical and the raw records for one upstream page.
pub(super) async fn list(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<BuyersListResponse>, ApiError> {
    let body = state
        .client
        .buyers_passthrough(query.as_deref())
        .await
        .map_err(|e| map_crm_error(&e))?;

    let raw = to_records(&body);
    let data: Vec<CanonicalBuyer> = raw.iter().map(map_buyer).collect();

    Ok(Json(BuyersListResponse {
        count: data.len(),
        data,
        raw,
    }))
}

/// `GET /buyers/raw` — upstream JSON unmodified.
pub(super) async fn raw(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<Value>, ApiError> {
    let body = state
        .client
        .buyers_passthrough(query.as_deref())
        .await
        .map_err(|e| map_crm_error(&e))?;
    Ok(Json(body))
}

/// `GET /buyers/all` — accumulates every buyer page up to the caller's cap
/// and returns the canonical forms.
pub(super) async fn all(
    State(state): State<AppState>,
    Query(query): Query<BuyersAllQuery>,
) -> Result<Json<BuyersAllResponse>, ApiError> {
    let max = query.max.unwrap_or(BUYERS_DEFAULT_MAX);
    let search = query.search.filter(|s| !s.is_empty());

    let fetch = |page: u32| {
        let client = Arc::clone(&state.client);
        let search = search.clone();
        async move {
            let body = client
                .buyers_page(page, BUYERS_PER_PAGE, search.as_deref())
                .await?;
            Ok(to_records(&body))
        }
    };

    let accumulation = accumulate(
        fetch,
        BUYERS_PER_PAGE,
        max,
        BUYERS_PAGE_CAP,
        BUYERS_INTER_PAGE_DELAY,
    )
    .await
    .map_err(|e| map_crm_error(&e))?;

    let data: Vec<CanonicalBuyer> = accumulation.records.iter().map(map_buyer).collect();

    tracing::info!(
        total = data.len(),
        pages_processed = accumulation.pages_processed,
        per_page = accumulation.per_page,
        search = search.as_deref().unwrap_or(""),
        "buyer accumulation complete"
    );

    Ok(Json(BuyersAllResponse {
        total: data.len(),
        pages_processed: accumulation.pages_processed,
        per_page: accumulation.per_page,
        search,
        data,
    }))
}
