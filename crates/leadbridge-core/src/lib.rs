mod app_config;
mod buyer;
mod config;

use thiserror::Error;

pub use app_config::AppConfig;
pub use buyer::CanonicalBuyer;
pub use config::{load_app_config, load_app_config_from_env};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
