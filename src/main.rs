use anyhow::{Context, Result};
use employee_search::{api, config, logging, processing::EmployeeService};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::init_config().context("failed to load configuration")?;
    logging::init_tracing(config);
    config.log_summary();

    let service =
        EmployeeService::new(config).context("failed to initialize Elasticsearch client")?;
    match service.ping().await {
        Ok(()) => tracing::info!(url = %config.elasticsearch_url, "Elasticsearch reachable"),
        Err(error) => tracing::warn!(
            url = %config.elasticsearch_url,
            error = %error,
            "Elasticsearch not reachable yet; requests will fail until it is"
        ),
    }

    let app = api::create_router(Arc::new(service));
    let port = config.server_port;
    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;
    tracing::info!("Server running on port {}", port);

    axum::serve(listener, app)
        .await
        .context("HTTP server terminated unexpectedly")?;
    Ok(())
}
