use std::net::SocketAddr;
use std::sync::Arc;

use soulmate_entitlements::config::Config;
use soulmate_entitlements::store::PgStore;
use soulmate_entitlements::{build_router, db, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .json()
        .init();

    let config = Config::from_env().map_err(|e| {
        tracing::error!("Refusing to start: {e}");
        e
    })?;

    let pool = db::create_pool(&config).await?;
    let store = Arc::new(PgStore::new(pool));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let state = AppState::new(config, store);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Entitlement service listening");
    axum::serve(listener, router).await?;
    Ok(())
}
