//! Server entry point

use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use corretor_config::{load_settings, Settings};
use corretor_server::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Config file is optional; env vars and defaults cover everything it
    // would set. Priority: env vars > file > defaults.
    let config_path = std::env::var("CORRETOR_CONFIG").ok();
    let settings = match load_settings(config_path.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Tracing not yet initialized, use eprintln for early logging
            eprintln!("Warning: failed to load config: {}. Using defaults.", e);
            Settings::new()
        },
    };

    init_tracing();

    tracing::info!("Starting corretor server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config_path = config_path.as_deref().unwrap_or("defaults"),
        hyde_model = %settings.hyde_llm.model,
        correction_model = %settings.correction_llm.model,
        index_path = %settings.index.path,
        "Configuration loaded"
    );

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;

    // Fails fast on missing credentials or an unusable index path
    let state = AppState::from_settings(settings)?;
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,corretor_server=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
