use std::fmt::Write as _;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::chart::{ChartEntry, ChartFetcher};

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub chart_api_url: String,
    /// Print entries as a JSON array instead of a table.
    pub json: bool,
}

/// Fetch the chart and print it. Never touches the database.
pub async fn run(cfg: FetchConfig, today: NaiveDate) -> Result<()> {
    let fetcher = ChartFetcher::new(&cfg.chart_api_url)?;
    let entries = fetcher.fetch(today).await;
    let out = if cfg.json {
        serde_json::to_string_pretty(&entries).context("serialize chart entries")?
    } else {
        render_chart(today, &entries)
    };
    println!("{}", out);
    Ok(())
}

pub fn render_chart(today: NaiveDate, entries: &[ChartEntry]) -> String {
    let mut out = String::new();
    writeln!(out, "TJ J-POP TOP 100 ({today}): {} songs", entries.len()).ok();
    for e in entries {
        writeln!(
            out,
            "{:>3}  {:<6}  {} / {}",
            e.rank, e.tj_number, e.title_ja, e.artist_ja
        )
        .ok();
    }
    out
}
