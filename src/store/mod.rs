//! Song catalog persistence (`songs` + `weekly_charts`).
//!
//! The pipeline only talks to [`ChartStore`]; the backend is picked from the
//! database URL scheme:
//! - `libsql://`, `https://`, `http://` → [`RemoteStore`] (libSQL/Turso over HTTP)
//! - `sqlite:`, `file:` → [`SqliteStore`] (local file or in-memory, via sqlx)
pub mod remote;
pub mod sql;
pub mod sqlite;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::Serialize;

use crate::config::DatabaseConfig;

pub use remote::RemoteStore;
pub use sqlite::SqliteStore;

/// Row written for a song seen for the first time.
///
/// `title_ko_llm` is always NULL and `is_confirmed` always false on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSong {
    pub tj_number: String,
    pub title_ja: String,
    pub title_ko_auto: Option<String>,
    pub artist_ja: String,
    pub artist_ko: Option<String>,
}

/// Unconfirmed song with its rank on the latest chart day (if charted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingSong {
    pub tj_number: String,
    pub title_ja: String,
    pub title_ko_auto: Option<String>,
    pub artist_ja: String,
    pub artist_ko: Option<String>,
    pub rank: Option<i64>,
}

/// Latest chart day and how many rows it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartDay {
    pub week: String,
    pub rows: i64,
}

#[async_trait::async_trait]
pub trait ChartStore: Send + Sync {
    /// Create tables and indexes if they do not exist.
    async fn ensure_schema(&self) -> Result<()>;
    /// Remove every chart row for `day`; returns the number removed.
    async fn delete_chart_day(&self, day: NaiveDate) -> Result<u64>;
    async fn find_song_id(&self, tj_number: &str) -> Result<Option<i64>>;
    async fn insert_song(&self, song: &NewSong) -> Result<()>;
    async fn insert_chart_row(&self, day: NaiveDate, tj_number: &str, rank: i64) -> Result<()>;
    async fn count_unconfirmed(&self) -> Result<i64>;
    async fn count_songs(&self) -> Result<i64>;
    async fn latest_chart_day(&self) -> Result<Option<ChartDay>>;
    async fn pending_songs(&self, limit: i64) -> Result<Vec<PendingSong>>;
    /// Release the connection. The store must not be used afterwards.
    async fn close(&self) -> Result<()>;
}

/// Where a [`DatabaseConfig`] points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Remote { base_url: String, auth_token: String },
    Sqlite { url: String },
}

impl DatabaseConfig {
    /// Classify the URL; remote databases require an auth token.
    pub fn backend(&self) -> Result<Backend> {
        let url = self.url.trim();
        let lower = url.to_ascii_lowercase();
        if lower.starts_with("sqlite:") || lower.starts_with("file:") {
            return Ok(Backend::Sqlite {
                url: url.to_string(),
            });
        }
        let base_url = if let Some(rest) = strip_prefix_ci(url, "libsql://") {
            format!("https://{rest}")
        } else if lower.starts_with("https://") || lower.starts_with("http://") {
            url.to_string()
        } else {
            bail!("unsupported database URL scheme (expected libsql://, https://, http://, sqlite: or file:)");
        };
        let Some(auth_token) = self.auth_token.clone() else {
            bail!("TURSO_AUTH_TOKEN must be set for remote databases");
        };
        Ok(Backend::Remote {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
        })
    }
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    match s.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => Some(&s[prefix.len()..]),
        _ => None,
    }
}

/// Open the store a configuration points at.
pub async fn open_store(cfg: &DatabaseConfig) -> Result<Box<dyn ChartStore>> {
    match cfg.backend()? {
        Backend::Remote {
            base_url,
            auth_token,
        } => Ok(Box::new(RemoteStore::new(&base_url, &auth_token)?)),
        Backend::Sqlite { url } => Ok(Box::new(SqliteStore::connect(&url).await?)),
    }
}

pub(crate) fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}
