//! In-memory company cache keyed by company id.
//!
//! One instance lives inside the server state for the lifetime of the
//! process — never a global — so tests get isolation from fresh instances.
//! Entries have no TTL: they live until an explicit clear or a wholesale
//! replacement by a fresh fetch.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde_json::Value;

use crate::client::CrmClient;
use crate::envelope;
use crate::error::CrmError;

/// Process-lifetime mapping from company id to the last-fetched raw record.
///
/// String and numeric ids compare by value: `5` and `"5"` address the same
/// entry. The lock is never held across an await point, so two concurrent
/// misses for the same id both fetch and the second store wins — harmless,
/// since both stores are snapshots of the same upstream record.
#[derive(Debug, Default)]
pub struct CompanyCache {
    entries: Mutex<HashMap<String, Value>>,
}

impl CompanyCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes a raw id value into a cache key. Non-scalar and blank ids
    /// yield `None` and are never cached.
    #[must_use]
    pub fn key_of(id: &Value) -> Option<String> {
        match id {
            Value::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_owned())
            }
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Pure lookup, no side effect.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Value> {
        self.lock().get(id.trim()).cloned()
    }

    /// Unconditional overwrite, used by bulk accumulation to prime the cache.
    pub fn put(&self, id: &str, record: Value) {
        self.lock().insert(id.trim().to_owned(), record);
    }

    /// Empties the cache and returns the number of entries removed.
    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        let removed = entries.len();
        entries.clear();
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns the cached record for `id`, fetching and storing it on a miss.
    ///
    /// The fetch requests the company's custom fields. Nothing is cached on
    /// failure; the error propagates so the HTTP boundary can conflate it
    /// with not-found.
    ///
    /// # Errors
    ///
    /// Propagates any [`CrmError`] from the upstream fetch, or
    /// [`CrmError::EmptyRecord`] when the response carries no record.
    pub async fn get_or_fetch(&self, client: &CrmClient, id: &str) -> Result<Value, CrmError> {
        if let Some(hit) = self.get(id) {
            return Ok(hit);
        }

        let body = client.company(id).await?;
        let record = envelope::to_record(body).ok_or_else(|| CrmError::EmptyRecord {
            path: format!("/company/{id}"),
        })?;

        self.put(id, record.clone());
        Ok(record)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        // A poisoned cache still holds valid snapshots; keep serving them.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
