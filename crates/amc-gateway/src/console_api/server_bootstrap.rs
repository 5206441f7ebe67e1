//! Console server bootstrap and router wiring.
use super::*;

/// Binds the configured address and serves the console API until ctrl-c.
pub async fn run_console_server(
    config: ConsoleServerConfig,
    store: Arc<dyn OpsStore>,
) -> Result<()> {
    let bind_addr = config
        .bind
        .parse::<SocketAddr>()
        .with_context(|| format!("invalid --bind '{}'", config.bind))?;

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind console server on {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve bound console server address")?;

    println!(
        "console server listening: endpoint={} addr={} auth_mode={}",
        DASHBOARD_STATS_ENDPOINT,
        local_addr,
        config.auth_mode.as_str()
    );

    let state = Arc::new(ConsoleServerState::new(config, store));
    let app = build_console_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("console server exited unexpectedly")?;

    Ok(())
}

pub fn build_console_router(state: Arc<ConsoleServerState>) -> Router {
    Router::new()
        .route(DASHBOARD_STATS_ENDPOINT, get(handle_dashboard_stats))
        .route(CONSOLE_STATUS_ENDPOINT, get(handle_console_status))
        .with_state(state)
}
