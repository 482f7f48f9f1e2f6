use std::net::SocketAddr;

/// Runtime configuration for the proxy, sourced from environment variables.
///
/// `crm_api_key` is optional on purpose: the server starts without it so the
/// health endpoint can report the missing credential, and upstream calls fail
/// with a configuration error instead.
#[derive(Clone)]
pub struct AppConfig {
    pub crm_api_key: Option<String>,
    pub crm_base_url: String,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field(
                "crm_api_key",
                &self.crm_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("crm_base_url", &self.crm_base_url)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}
