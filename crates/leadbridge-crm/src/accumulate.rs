//! Page-loop accumulation over the CRM's offset-paginated list endpoints.
//!
//! The CRM exposes no trustworthy total-count header, so the only natural
//! termination signal is an empty page. A caller-supplied cap bounds the
//! result size and a hard page cap guards against endless pagination.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;

use crate::error::CrmError;

/// Result of one accumulation run: the collected raw records plus the
/// figures the report endpoints echo back.
#[derive(Debug)]
pub struct Accumulation {
    pub records: Vec<Value>,
    /// Pages that contributed records (the terminal empty page not counted).
    pub pages_processed: u32,
    pub per_page: u32,
}

/// Repeatedly fetches pages until a stop condition, collecting raw records.
///
/// Starting at page 1, the loop runs while fewer than `max` records are
/// collected and the page number is within `hard_page_cap`. An empty page
/// ends the run. After every page that yielded records the loop sleeps for
/// `inter_page_delay` to stay under the CRM's rate limit; the delay is
/// skipped once the terminal empty page is seen. The result is truncated to
/// exactly `max` records.
///
/// **All-or-nothing semantics**: any page failure aborts the whole run and
/// already-collected records are discarded — there is no partial-success
/// mode, the caller re-issues the entire accumulation.
///
/// # Errors
///
/// Propagates the first error returned by `fetch_page`.
pub async fn accumulate<F, Fut>(
    mut fetch_page: F,
    per_page: u32,
    max: usize,
    hard_page_cap: u32,
    inter_page_delay: Duration,
) -> Result<Accumulation, CrmError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<Value>, CrmError>>,
{
    let mut records: Vec<Value> = Vec::new();
    let mut page = 1u32;
    let mut pages_processed = 0u32;

    while records.len() < max && page <= hard_page_cap {
        let batch = fetch_page(page).await?;
        if batch.is_empty() {
            break;
        }

        records.extend(batch);
        pages_processed += 1;
        page += 1;

        tracing::debug!(page = page - 1, collected = records.len(), "page accumulated");

        // Fixed preemptive back-off between pages; also runs after the last
        // page that yielded records.
        if !inter_page_delay.is_zero() {
            tokio::time::sleep(inter_page_delay).await;
        }
    }

    records.truncate(max);

    Ok(Accumulation {
        records,
        pages_processed,
        per_page,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use serde_json::json;

    use super::*;

    fn page_of(size: usize) -> Vec<Value> {
        (0..size).map(|i| json!({ "id": i })).collect()
    }

    #[tokio::test]
    async fn stops_on_empty_page_and_counts_contributing_pages() {
        let sizes = [15usize, 15, 15, 0];
        let fetches = Arc::new(AtomicU32::new(0));
        let fc = Arc::clone(&fetches);

        let result = accumulate(
            |page| {
                let fc = Arc::clone(&fc);
                async move {
                    fc.fetch_add(1, Ordering::SeqCst);
                    Ok(page_of(sizes[(page - 1) as usize]))
                }
            },
            15,
            1_000,
            1_000,
            Duration::ZERO,
        )
        .await
        .expect("accumulation should succeed");

        assert_eq!(result.records.len(), 45);
        assert_eq!(result.pages_processed, 3);
        assert_eq!(result.per_page, 15);
        // The terminal empty page is fetched to detect exhaustion.
        assert_eq!(fetches.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn truncates_to_max_and_stops_fetching_early() {
        let fetches = Arc::new(AtomicU32::new(0));
        let fc = Arc::clone(&fetches);

        let result = accumulate(
            |_page| {
                let fc = Arc::clone(&fc);
                async move {
                    fc.fetch_add(1, Ordering::SeqCst);
                    Ok(page_of(15))
                }
            },
            15,
            20,
            1_000,
            Duration::ZERO,
        )
        .await
        .expect("accumulation should succeed");

        // 15 + 15 >= 20, so exactly two fetches happen.
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
        assert_eq!(result.records.len(), 20);
        assert_eq!(result.pages_processed, 2);
    }

    #[tokio::test]
    async fn first_page_failure_aborts_with_no_partial_data() {
        let result = accumulate(
            |_page| async {
                Err::<Vec<Value>, _>(CrmError::Api {
                    method: "GET".to_owned(),
                    path: "/buyer".to_owned(),
                    status: 500,
                    message: "boom".to_owned(),
                })
            },
            15,
            1_000,
            1_000,
            Duration::ZERO,
        )
        .await;

        assert!(matches!(result, Err(CrmError::Api { status: 500, .. })));
    }

    #[tokio::test]
    async fn mid_run_failure_discards_earlier_pages() {
        let fetches = Arc::new(AtomicU32::new(0));
        let fc = Arc::clone(&fetches);

        let result = accumulate(
            |page| {
                let fc = Arc::clone(&fc);
                async move {
                    fc.fetch_add(1, Ordering::SeqCst);
                    if page < 3 {
                        Ok(page_of(15))
                    } else {
                        Err(CrmError::Api {
                            method: "GET".to_owned(),
                            path: "/buyer".to_owned(),
                            status: 429,
                            message: "Too Many Requests".to_owned(),
                        })
                    }
                }
            },
            15,
            1_000,
            1_000,
            Duration::ZERO,
        )
        .await;

        assert_eq!(fetches.load(Ordering::SeqCst), 3);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn hard_page_cap_bounds_the_run() {
        let result = accumulate(
            |_page| async { Ok(page_of(1)) },
            1,
            100,
            3,
            Duration::ZERO,
        )
        .await
        .expect("accumulation should succeed");

        assert_eq!(result.records.len(), 3);
        assert_eq!(result.pages_processed, 3);
    }

    #[tokio::test]
    async fn zero_max_fetches_nothing() {
        let fetches = Arc::new(AtomicU32::new(0));
        let fc = Arc::clone(&fetches);

        let result = accumulate(
            |_page| {
                let fc = Arc::clone(&fc);
                async move {
                    fc.fetch_add(1, Ordering::SeqCst);
                    Ok(page_of(15))
                }
            },
            15,
            0,
            1_000,
            Duration::ZERO,
        )
        .await
        .expect("accumulation should succeed");

        assert_eq!(fetches.load(Ordering::SeqCst), 0);
        assert!(result.records.is_empty());
        assert_eq!(result.pages_processed, 0);
    }
}
