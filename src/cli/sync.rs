use std::fmt::Write as _;

use anyhow::Result;
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::config::SyncConfig;
use crate::orchestrator::{Pipeline, RunOutcome};
use crate::util::env as env_util;

/// Environment keys included in the redacted startup snapshot.
const SNAPSHOT_KEYS: &[&str] = &[
    "TURSO_DATABASE_URL",
    "TURSO_AUTH_TOKEN",
    "TJ_CHART_API_URL",
    "ARTIST_ALIAS_PATH",
    "TRANS_SLEEP_SECONDS",
    "TRANSLATE_API_URL",
];

/// Full daily run. Fetch and configuration problems end in a logged abort
/// with a zero exit; database errors are returned.
pub async fn run(cfg: &SyncConfig, today: NaiveDate) -> Result<()> {
    env_util::preflight_check("tj-chart-sync", &[], SNAPSHOT_KEYS)?;
    info!(
        %today,
        chart_api = %cfg.chart_api_url,
        aliases = %cfg.alias_path.display(),
        sleep_ms = cfg.translation_sleep.as_millis() as u64,
        "starting chart sync"
    );

    let pipeline = Pipeline::from_config(cfg)?;
    let outcome = pipeline.run(today).await?;
    match &outcome {
        RunOutcome::Completed(_) => info!("{}", render_outcome(&outcome)),
        _ => warn!("{}", render_outcome(&outcome)),
    }
    Ok(())
}

pub fn render_outcome(outcome: &RunOutcome) -> String {
    let mut out = String::new();
    match outcome {
        RunOutcome::EmptyChart => {
            write!(out, "no chart data fetched; nothing updated").ok();
        }
        RunOutcome::MissingDatabaseConfig => {
            write!(out, "database not configured; nothing updated").ok();
        }
        RunOutcome::Completed(s) => {
            write!(
                out,
                "sync complete for {}: {} new, {} re-ranked, {} untranslated fields, {} songs total ({} unconfirmed)",
                s.day,
                s.new_songs,
                s.updated_songs,
                s.translation_gaps,
                s.total_songs,
                s.unconfirmed_songs
            )
            .ok();
        }
    }
    out
}
