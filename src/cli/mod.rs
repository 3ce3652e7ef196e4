//! Subcommands behind the `tj-chart-sync` binary.
//!
//! Each command exposes `run(...)` taking resolved configuration; the output
//! text is built by a separate `render_*` function so it can be tested without
//! a terminal.
use anyhow::{bail, Result};

use crate::config::DatabaseConfig;

pub mod fetch;
pub mod pending;
pub mod schema;
pub mod stats;
pub mod sync;

/// Commands other than `sync` treat a missing database as a hard error.
pub(crate) fn require_database(database: Option<&DatabaseConfig>) -> Result<&DatabaseConfig> {
    match database {
        Some(cfg) => Ok(cfg),
        None => bail!("TURSO_DATABASE_URL is not set (use --db-url or the environment)"),
    }
}
