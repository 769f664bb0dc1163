mod api;
mod middleware;

use std::sync::Arc;
use std::time::Duration;

use chalkboards_core::CategoryTable;
use chalkboards_store::{spawn_refresh, Geocoder, SpecialsStore, Submitter};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, default_rate_limit_state, AppState, Clock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(chalkboards_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let categories = match &config.categories_path {
        Some(path) => chalkboards_core::load_categories(path)?,
        None => CategoryTable::builtin(),
    };
    tracing::info!(
        categories = categories.categories.len(),
        env = %config.env,
        "starting chalkboards server"
    );

    let store = SpecialsStore::from_config(&config)?;
    let geocoder = Geocoder::from_config(&config)?;

    let refresh = spawn_refresh(
        Arc::new(store.clone()),
        Duration::from_secs(config.refresh_interval_secs),
    );
    let submitter = Submitter::new(store, geocoder).with_refresh(refresh.trigger());

    let state = AppState {
        config: Arc::clone(&config),
        categories: Arc::new(categories),
        feed: refresh.subscribe(),
        submitter: Arc::new(submitter),
        clock: Clock::System,
    };
    let app = build_app(state, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    refresh.cancel();
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
