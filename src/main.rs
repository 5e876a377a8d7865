use shiny_tracker::state::Registry;
use shiny_tracker::{resolve_save_dir, router, scan_save_dir, storage, AppState};
use std::{env, net::SocketAddr};
use tokio::fs;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let save_dir = resolve_save_dir();
    fs::create_dir_all(&save_dir).await?;
    info!("loading saves from {}", save_dir.display());

    let mut registry = Registry::default();
    for collection in scan_save_dir(&save_dir).await? {
        registry.insert(collection);
    }

    let state = AppState::new(save_dir, registry);
    let app = router(state.clone());

    let port = env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    save_all_tabs(&state).await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("could not listen for shutdown signal: {err}");
    }
}

/// Quit-time snapshot of every open tab. Failures are reported and do not
/// block the shutdown.
async fn save_all_tabs(state: &AppState) {
    let registry = state.registry.lock().await;
    for (_, collection) in registry.iter() {
        match storage::save_tab(&state.save_dir, collection).await {
            Ok(path) => info!("saved tab '{}' to {}", collection.name, path.display()),
            Err(err) => error!("could not save tab '{}': {}", collection.name, err.message),
        }
    }
}
