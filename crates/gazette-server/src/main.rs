mod config;

use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use gazette_api::AppState;
use gazette_api::uploads::UploadStore;
use gazette_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "gazette=debug,gazette_api=debug,gazette_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    let db = Database::open(&config.db_path)?;
    let (articles, accounts) = (db.count_articles()?, db.count_users()?);
    info!(articles, accounts, "Database ready");
    if accounts == 0 {
        warn!("No admin account yet; visit /admin/setup-user to create one");
    }
    let uploads = UploadStore::new(config.upload_dir.clone()).await?;
    let state = AppState::new(db, uploads, &config.session_secret, config.settings)?;

    let app = gazette_api::router(state).layer(TraceLayer::new_for_http());

    info!("Gazette listening on {}", config.addr);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gazette stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(signal) => signal,
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
