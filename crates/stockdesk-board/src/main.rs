use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result as AnyResult};
use stockdesk_board::{AppState, router};
use stockdesk_core::SheetStore;
use stockdesk_platform::{ServiceConfig, connect_database};
use stockdesk_sheets::{InMemorySheetStore, PgSheetStore};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> AnyResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "stockdesk_board=info".to_string()),
        )
        .init();

    let config = ServiceConfig::from_env("0.0.0.0:8090")?;

    let store: Arc<dyn SheetStore> = match &config.database_url {
        Some(database_url) => {
            let pool = connect_database(database_url, config.db_max_connections).await?;
            let store = PgSheetStore::new(pool);
            store
                .ensure_schema()
                .await
                .context("failed to prepare sheet tables")?;
            store
                .seed_default_headers()
                .await
                .context("failed to seed sheet header rows")?;
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set, serving an empty in-memory workbook");
            Arc::new(InMemorySheetStore::with_default_headers().await)
        }
    };

    let state = AppState::new(store, config.cache_ttl).with_session_idle(config.session_idle);
    let app = router(state);

    let addr: SocketAddr = config.http_addr.parse()?;
    info!(
        cache_ttl_secs = config.cache_ttl.as_secs(),
        session_idle_secs = config.session_idle.as_secs(),
        "board service listening on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
