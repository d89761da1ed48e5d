use std::net::SocketAddr;

use campusly::router::init_router;
use campusly::state::init_app_state;
use campusly_config::ServerConfig;
use campusly_observability::{init_metrics, init_tracing, shutdown_tracer};
use dotenvy::dotenv;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    if let Err(e) = run().await {
        error!(error = %e, "Server exited with error");
        shutdown_tracer().await;
        std::process::exit(1);
    }

    shutdown_tracer().await;
}

async fn run() -> anyhow::Result<()> {
    let state = init_app_state().await?;
    let app = init_router(state, init_metrics());

    let server = ServerConfig::from_env();
    let listener = tokio::net::TcpListener::bind(server.address()).await?;
    info!(address = %server.address(), "Server running");
    info!("Swagger UI available at /swagger-ui, Scalar at /scalar");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
