//! Authenticated HTTP client for the upstream CRM's REST API.
//!
//! Wraps `reqwest` with bearer-credential handling, URL construction, and
//! CRM-specific error extraction. The generic [`CrmClient::call`] is the
//! contract the rest of the crate builds on; the typed helpers cover the
//! buyer and company endpoints the proxy exposes.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode, Url};
use serde_json::Value;

use crate::error::CrmError;

const BUYERS_PATH: &str = "/buyer";
const COMPANIES_PATH: &str = "/company";

/// Client for the upstream CRM.
///
/// Holds the one shared upstream credential. The credential is optional so
/// the server can start without it and report the gap from its health
/// endpoint; any actual call then fails with [`CrmError::MissingApiKey`]
/// before touching the network.
pub struct CrmClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CrmClient {
    /// Creates a client for the given base URL.
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`CrmError::InvalidUrl`] if `base_url` does not
    /// parse.
    pub fn new(
        api_key: Option<&str>,
        base_url: &str,
        timeout_secs: u64,
    ) -> Result<Self, CrmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("leadbridge/0.1 (lead-deduplication)")
            .build()?;

        let base_url = base_url.trim_end_matches('/').to_owned();
        Url::parse(&base_url).map_err(|e| CrmError::InvalidUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.map(ToOwned::to_owned),
        })
    }

    /// Issues one authenticated call against the CRM.
    ///
    /// Absolute `http(s)` paths pass through unchanged; relative paths are
    /// prefixed with the base URL. A bearer credential and JSON content type
    /// are attached; caller-supplied `headers` override either. An empty
    /// response body yields `Value::Null` rather than an error.
    ///
    /// # Errors
    ///
    /// - [`CrmError::MissingApiKey`] when no credential is configured (no
    ///   request is issued).
    /// - [`CrmError::Api`] on a non-success status, carrying the method,
    ///   path, status code, and the message from the body's `message` or
    ///   `error` field (status reason phrase as fallback).
    /// - [`CrmError::Http`] on transport failure.
    /// - [`CrmError::Deserialize`] when a non-empty body is not valid JSON.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        headers: Option<HeaderMap>,
        body: Option<&Value>,
    ) -> Result<Value, CrmError> {
        let url = self.endpoint_url(path, &[])?;
        self.request(method, url, headers, body).await
    }

    /// Fetches one page of buyers with an optional search term.
    ///
    /// # Errors
    ///
    /// Propagates any [`CrmError`] from [`Self::call`].
    pub async fn buyers_page(
        &self,
        page: u32,
        per_page: u32,
        search: Option<&str>,
    ) -> Result<Value, CrmError> {
        let mut query = vec![
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ];
        if let Some(term) = search.filter(|s| !s.is_empty()) {
            query.push(("search", term.to_owned()));
        }
        let url = self.endpoint_url(BUYERS_PATH, &query)?;
        self.request(Method::GET, url, None, None).await
    }

    /// Forwards a caller's query string verbatim to the buyers list endpoint.
    ///
    /// # Errors
    ///
    /// Propagates any [`CrmError`] from [`Self::call`].
    pub async fn buyers_passthrough(&self, raw_query: Option<&str>) -> Result<Value, CrmError> {
        let path = match raw_query.filter(|q| !q.is_empty()) {
            Some(query) => format!("{BUYERS_PATH}?{query}"),
            None => BUYERS_PATH.to_owned(),
        };
        self.call(Method::GET, &path, None, None).await
    }

    /// Fetches one page of companies, requesting custom fields.
    ///
    /// # Errors
    ///
    /// Propagates any [`CrmError`] from [`Self::call`].
    pub async fn companies_page(&self, page: u32, per_page: u32) -> Result<Value, CrmError> {
        let url = self.endpoint_url(
            COMPANIES_PATH,
            &[
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
                ("include", "custom_fields".to_owned()),
            ],
        )?;
        self.request(Method::GET, url, None, None).await
    }

    /// Fetches a single company by id, requesting custom fields.
    ///
    /// # Errors
    ///
    /// Propagates any [`CrmError`] from [`Self::call`].
    pub async fn company(&self, id: &str) -> Result<Value, CrmError> {
        let url = self.endpoint_url(
            &format!("{COMPANIES_PATH}/{id}"),
            &[("include", "custom_fields".to_owned())],
        )?;
        self.request(Method::GET, url, None, None).await
    }

    /// Builds the full request URL: absolute paths pass through, relative
    /// paths are joined onto the base URL, and `query` pairs are appended to
    /// any query already present in `path`.
    fn endpoint_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, CrmError> {
        let full = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_owned()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        };

        let mut url = Url::parse(&full).map_err(|e| CrmError::InvalidUrl {
            url: full.clone(),
            reason: e.to_string(),
        })?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    async fn request(
        &self,
        method: Method,
        url: Url,
        headers: Option<HeaderMap>,
        body: Option<&Value>,
    ) -> Result<Value, CrmError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(CrmError::MissingApiKey);
        };

        let path = url.path().to_owned();
        let mut builder = self
            .client
            .request(method.clone(), url)
            .bearer_auth(api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        if let Some(body) = body {
            builder = builder.json(body);
        }
        // Applied last so caller-supplied headers override the defaults,
        // including authorization and content type.
        if let Some(headers) = headers {
            builder = builder.headers(headers);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(CrmError::Api {
                method: method.to_string(),
                path,
                status: status.as_u16(),
                message: extract_error_message(&text, status),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| CrmError::Deserialize {
            context: format!("{method} {path}"),
            source: e,
        })
    }
}

/// Pulls a human-readable message out of a CRM error body: the `message`
/// field, then the `error` field, then the HTTP reason phrase.
fn extract_error_message(body: &str, status: StatusCode) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            ["message", "error"]
                .into_iter()
                .find_map(|key| json.get(key).and_then(Value::as_str).map(ToOwned::to_owned))
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> CrmClient {
        CrmClient::new(Some("test-key"), base_url, 30)
            .expect("client construction should not fail")
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let result = CrmClient::new(Some("k"), "not a url", 30);
        assert!(matches!(result, Err(CrmError::InvalidUrl { .. })));
    }

    #[test]
    fn endpoint_url_joins_relative_paths() {
        let client = test_client("https://openapi.keycrm.app/v1/");
        let url = client.endpoint_url("/buyer", &[]).unwrap();
        assert_eq!(url.as_str(), "https://openapi.keycrm.app/v1/buyer");
    }

    #[test]
    fn endpoint_url_passes_absolute_paths_through() {
        let client = test_client("https://openapi.keycrm.app/v1");
        let url = client
            .endpoint_url("https://elsewhere.example.com/hook", &[])
            .unwrap();
        assert_eq!(url.as_str(), "https://elsewhere.example.com/hook");
    }

    #[test]
    fn endpoint_url_appends_query_pairs() {
        let client = test_client("https://openapi.keycrm.app/v1");
        let url = client
            .endpoint_url(
                "/buyer",
                &[("page", "2".to_owned()), ("search", "анна к".to_owned())],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://openapi.keycrm.app/v1/buyer?page=2&search=%D0%B0%D0%BD%D0%BD%D0%B0+%D0%BA"
        );
    }

    #[test]
    fn endpoint_url_keeps_existing_query_from_passthrough() {
        let client = test_client("https://openapi.keycrm.app/v1");
        let url = client
            .endpoint_url("/buyer?status=active", &[("page", "1".to_owned())])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://openapi.keycrm.app/v1/buyer?status=active&page=1"
        );
    }

    #[test]
    fn error_message_prefers_message_field() {
        let msg = extract_error_message(
            r#"{"message": "Validation failed", "error": "other"}"#,
            StatusCode::UNPROCESSABLE_ENTITY,
        );
        assert_eq!(msg, "Validation failed");
    }

    #[test]
    fn error_message_falls_back_to_error_field() {
        let msg = extract_error_message(r#"{"error": "Unauthenticated"}"#, StatusCode::UNAUTHORIZED);
        assert_eq!(msg, "Unauthenticated");
    }

    #[test]
    fn error_message_falls_back_to_reason_phrase() {
        assert_eq!(
            extract_error_message("", StatusCode::INTERNAL_SERVER_ERROR),
            "Internal Server Error"
        );
        assert_eq!(
            extract_error_message("<html>busy</html>", StatusCode::SERVICE_UNAVAILABLE),
            "Service Unavailable"
        );
    }
}
