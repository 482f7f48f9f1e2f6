use thiserror::Error;

/// Errors returned by the CRM client and the layers built on top of it.
#[derive(Debug, Error)]
pub enum CrmError {
    /// No upstream credential is configured; raised before any I/O happens.
    #[error("CRM API key is not configured")]
    MissingApiKey,

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The CRM answered with a non-success HTTP status.
    #[error("CRM {method} {path} failed with status {status}: {message}")]
    Api {
        method: String,
        path: String,
        status: u16,
        message: String,
    },

    /// A non-empty response body was not valid JSON.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A request URL could not be constructed from the base URL and path.
    #[error("invalid request URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A successful response carried no usable record where one was required.
    #[error("no record in response from {path}")]
    EmptyRecord { path: String },
}
