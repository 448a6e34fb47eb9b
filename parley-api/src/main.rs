//! # Parley API Server
//!
//! Serves the profile and presence endpoints for the Parley support
//! platform: profile CRUD for the authenticated agent and per-account
//! presence state used by chat routing.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/parley \
//! JWT_SECRET=$(openssl rand -hex 32) \
//! cargo run -p parley-api
//! ```

use parley_api::app::{build_router, AppState};
use parley_api::config::Config;
use parley_shared::db::{migrations, pool};
use parley_shared::mailer::LogMailer;
use parley_shared::storage::FsAvatarStore;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Parley API v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    let db = pool::create_pool(config.database.clone()).await?;
    migrations::run_migrations(&db).await?;

    let mailer = Arc::new(LogMailer);
    let avatars = Arc::new(FsAvatarStore::new(config.avatar_storage_dir.clone()));

    let bind_address = config.bind_address();
    let state = AppState::new(db, config, mailer, avatars);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
