// Tailor shop measurement server entry point.
//
// Startup sequence:
// 1. Initialize tracing
// 2. Load config (copying defaults into config/ on first run)
// 3. Open database and seed the reference catalog
// 4. Bind the listener and serve until Ctrl+C

use anyhow::Context;
use tracing::info;

use tailorbook_core::config;
use tailorbook_server::{http, startup};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Tailorbook server starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: listen={}, database={}",
        config.listen, config.db_path
    );

    // 3. Open database and seed the catalog
    let state = startup::build_state(&config)?;

    // 4. Serve
    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    info!("Listening on http://{}", config.listen);

    axum::serve(listener, http::build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Tailorbook server shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Initialize tracing to stdout, filtered by `RUST_LOG`.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("tailorbook_server=info,tailorbook_core=info,warn")
        }))
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
