use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::{info, instrument};

use super::{day_key, sql, ChartDay, ChartStore, NewSong, PendingSong};

/// Local SQLite catalog (`sqlite:` / `file:` URLs) over a single connection.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    #[instrument(skip_all)]
    pub async fn connect(url: &str) -> Result<Self> {
        let options = match url.strip_prefix("file:") {
            Some(path) => SqliteConnectOptions::new().filename(path),
            None => SqliteConnectOptions::from_str(url)
                .with_context(|| format!("parsing sqlite url {url}"))?,
        }
        .create_if_missing(true)
        .foreign_keys(false);

        // One connection for the whole run; also keeps `sqlite::memory:` alive.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("opening sqlite database")?;
        info!("connected to sqlite catalog");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl ChartStore for SqliteStore {
    async fn ensure_schema(&self) -> Result<()> {
        for stmt in sql::SCHEMA {
            sqlx::query(*stmt)
                .execute(&self.pool)
                .await
                .context("applying schema")?;
        }
        Ok(())
    }

    async fn delete_chart_day(&self, day: NaiveDate) -> Result<u64> {
        let res = sqlx::query(sql::DELETE_CHART_DAY)
            .bind(day_key(day))
            .execute(&self.pool)
            .await
            .context("deleting chart day")?;
        Ok(res.rows_affected())
    }

    async fn find_song_id(&self, tj_number: &str) -> Result<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>(sql::FIND_SONG_ID)
            .bind(tj_number)
            .fetch_optional(&self.pool)
            .await
            .context("looking up song")?;
        Ok(id)
    }

    async fn insert_song(&self, song: &NewSong) -> Result<()> {
        sqlx::query(sql::INSERT_SONG)
            .bind(&song.tj_number)
            .bind(&song.title_ja)
            .bind(song.title_ko_auto.as_deref())
            .bind(&song.artist_ja)
            .bind(song.artist_ko.as_deref())
            .execute(&self.pool)
            .await
            .with_context(|| format!("inserting song {}", song.tj_number))?;
        Ok(())
    }

    async fn insert_chart_row(&self, day: NaiveDate, tj_number: &str, rank: i64) -> Result<()> {
        sqlx::query(sql::INSERT_CHART_ROW)
            .bind(day_key(day))
            .bind(tj_number)
            .bind(rank)
            .execute(&self.pool)
            .await
            .with_context(|| format!("inserting chart row for {tj_number}"))?;
        Ok(())
    }

    async fn count_unconfirmed(&self) -> Result<i64> {
        Ok(sqlx::query_scalar::<_, i64>(sql::COUNT_UNCONFIRMED)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn count_songs(&self) -> Result<i64> {
        Ok(sqlx::query_scalar::<_, i64>(sql::COUNT_SONGS)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn latest_chart_day(&self) -> Result<Option<ChartDay>> {
        let row = sqlx::query(sql::LATEST_CHART_DAY)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| {
            Ok::<_, anyhow::Error>(ChartDay {
                week: r.try_get(0)?,
                rows: r.try_get(1)?,
            })
        })
        .transpose()
    }

    async fn pending_songs(&self, limit: i64) -> Result<Vec<PendingSong>> {
        let rows = sqlx::query(sql::PENDING_SONGS)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|r| {
                Ok::<_, anyhow::Error>(PendingSong {
                    tj_number: r.try_get(0)?,
                    title_ja: r.try_get(1)?,
                    title_ko_auto: r.try_get(2)?,
                    artist_ja: r.try_get(3)?,
                    artist_ko: r.try_get(4)?,
                    rank: r.try_get(5)?,
                })
            })
            .collect()
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) async fn memory_store() -> SqliteStore {
    let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
    store.ensure_schema().await.unwrap();
    store
}
