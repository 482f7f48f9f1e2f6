mod api;
mod middleware;

use tracing_subscriber::EnvFilter;

use leadbridge_crm::CrmClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = leadbridge_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(config = ?config, "starting leadbridge");
    if config.crm_api_key.is_none() {
        tracing::warn!("CRM_API_KEY is not set; upstream calls will fail until it is configured");
    }

    let client = CrmClient::new(
        config.crm_api_key.as_deref(),
        &config.crm_base_url,
        config.request_timeout_secs,
    )?;
    let state = api::AppState::new(client, config.crm_api_key.as_deref());
    let app = api::build_app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
