use anyhow::Result;
use tracing::info;

use crate::cli::require_database;
use crate::config::DatabaseConfig;
use crate::store::open_store;

/// Create `songs`, `weekly_charts` and their indexes when missing.
pub async fn run(database: Option<&DatabaseConfig>) -> Result<()> {
    let cfg = require_database(database)?;
    let store = open_store(cfg).await?;
    let created = store.ensure_schema().await;
    let closed = store.close().await;
    created?;
    closed?;
    info!("schema ready");
    Ok(())
}
