use std::fmt::Write as _;

use anyhow::Result;

use crate::cli::require_database;
use crate::config::DatabaseConfig;
use crate::store::{open_store, ChartDay, ChartStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogStats {
    pub total_songs: i64,
    pub unconfirmed_songs: i64,
    pub latest_day: Option<ChartDay>,
}

pub async fn collect(store: &dyn ChartStore) -> Result<CatalogStats> {
    Ok(CatalogStats {
        total_songs: store.count_songs().await?,
        unconfirmed_songs: store.count_unconfirmed().await?,
        latest_day: store.latest_chart_day().await?,
    })
}

pub async fn run(database: Option<&DatabaseConfig>) -> Result<()> {
    let cfg = require_database(database)?;
    let store = open_store(cfg).await?;
    let stats = collect(store.as_ref()).await;
    let closed = store.close().await;
    let stats = stats?;
    closed?;
    println!("{}", render_stats(&stats));
    Ok(())
}

pub fn render_stats(stats: &CatalogStats) -> String {
    let mut out = String::new();
    writeln!(out, "CATALOG SUMMARY:").ok();
    writeln!(out, "songs: {}", stats.total_songs).ok();
    writeln!(out, "unconfirmed: {}", stats.unconfirmed_songs).ok();
    match &stats.latest_day {
        Some(day) => writeln!(out, "latest chart: {} ({} rows)", day.week, day.rows).ok(),
        None => writeln!(out, "latest chart: none").ok(),
    };
    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::store::sqlite::memory_store;
    use crate::store::NewSong;

    #[tokio::test]
    async fn collects_counts_and_latest_day() {
        let store = memory_store().await;
        let empty = collect(&store).await.unwrap();
        assert_eq!(
            empty,
            CatalogStats {
                total_songs: 0,
                unconfirmed_songs: 0,
                latest_day: None
            }
        );
        assert!(render_stats(&empty).contains("latest chart: none"));

        store
            .insert_song(&NewSong {
                tj_number: "68581".into(),
                title_ja: "アイドル".into(),
                title_ko_auto: Some("아이돌".into()),
                artist_ja: "YOASOBI".into(),
                artist_ko: Some("YOASOBI".into()),
            })
            .await
            .unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        store.insert_chart_row(day, "68581", 1).await.unwrap();

        let stats = collect(&store).await.unwrap();
        assert_eq!(stats.total_songs, 1);
        assert_eq!(stats.unconfirmed_songs, 1);
        let out = render_stats(&stats);
        assert!(out.contains("songs: 1"));
        assert!(out.contains("latest chart: 2026-10-16 (1 rows)"));
    }
}
