//! libSQL / Turso catalog over the Hrana-over-HTTP v2 pipeline API.
//!
//! Each call POSTs `{ baton, requests: [execute] }` to `<base>/v2/pipeline`.
//! The returned baton pins the next call to the same server-side stream, so a
//! run uses one logical connection until [`ChartStore::close`] sends `close`.
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{day_key, sql, ChartDay, ChartStore, NewSong, PendingSong};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Value {
    Null,
    /// Integers travel as decimal strings to survive JSON number precision.
    Integer { value: String },
    Float { value: f64 },
    Text { value: String },
    Blob { base64: String },
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text { value: s.into() }
    }

    pub fn integer(n: i64) -> Self {
        Value::Integer {
            value: n.to_string(),
        }
    }

    pub fn opt_text(s: Option<&str>) -> Self {
        s.map(Value::text).unwrap_or(Value::Null)
    }

    fn as_i64(&self) -> Result<i64> {
        match self {
            Value::Integer { value } => value
                .parse()
                .with_context(|| format!("bad integer value {value:?}")),
            other => Err(anyhow!("expected integer, got {other:?}")),
        }
    }

    fn as_opt_i64(&self) -> Result<Option<i64>> {
        match self {
            Value::Null => Ok(None),
            other => other.as_i64().map(Some),
        }
    }

    fn as_string(&self) -> Result<String> {
        match self {
            Value::Text { value } => Ok(value.clone()),
            other => Err(anyhow!("expected text, got {other:?}")),
        }
    }

    fn as_opt_string(&self) -> Result<Option<String>> {
        match self {
            Value::Null => Ok(None),
            other => other.as_string().map(Some),
        }
    }
}

#[derive(Debug, Serialize)]
struct PipelineRequest<'a> {
    baton: Option<&'a str>,
    requests: Vec<StreamRequest<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamRequest<'a> {
    Execute { stmt: Stmt<'a> },
    Close,
}

#[derive(Debug, Serialize)]
struct Stmt<'a> {
    sql: &'a str,
    args: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct PipelineResponse {
    baton: Option<String>,
    base_url: Option<String>,
    results: Vec<StreamResult>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamResult {
    Ok { response: StreamResponse },
    Error { error: StreamError },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamResponse {
    Execute { result: StmtResult },
    Close,
}

#[derive(Debug, Deserialize)]
struct StreamError {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

/// Rows and row count of one executed statement.
#[derive(Debug, Default, Deserialize)]
pub struct StmtResult {
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
    #[serde(default)]
    pub affected_row_count: u64,
}

impl StmtResult {
    fn first_i64(&self) -> Result<i64> {
        self.rows
            .first()
            .and_then(|r| r.first())
            .map(Value::as_i64)
            .unwrap_or(Ok(0))
    }
}

#[derive(Debug, Default)]
struct Stream {
    baton: Option<String>,
    base_url: Option<String>,
}

pub struct RemoteStore {
    base_url: String,
    auth_token: String,
    http: Client,
    stream: Mutex<Stream>,
}

impl RemoteStore {
    pub fn new(base_url: &str, auth_token: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("building database http client")?;
        info!(target = "db", "using remote libSQL catalog");
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: auth_token.to_string(),
            http,
            stream: Mutex::new(Stream::default()),
        })
    }

    /// Execute one statement on the run's stream.
    pub async fn execute(&self, sql: &str, args: Vec<Value>) -> Result<StmtResult> {
        let mut stream = self.stream.lock().await;
        let resp = self
            .pipeline(&stream, vec![StreamRequest::Execute { stmt: Stmt { sql, args } }])
            .await?;
        stream.baton = resp.baton;
        if resp.base_url.is_some() {
            stream.base_url = resp.base_url;
        }
        match resp.results.into_iter().next() {
            Some(StreamResult::Ok {
                response: StreamResponse::Execute { result },
            }) => Ok(result),
            Some(StreamResult::Ok { response }) => {
                bail!("unexpected pipeline response {response:?}")
            }
            Some(StreamResult::Error { error }) => Err(anyhow!(
                "libsql error{}: {}",
                error.code.map(|c| format!(" [{c}]")).unwrap_or_default(),
                error.message
            ))
            .with_context(|| format!("executing {}", first_line(sql))),
            None => bail!("empty pipeline response"),
        }
    }

    async fn pipeline(
        &self,
        stream: &Stream,
        requests: Vec<StreamRequest<'_>>,
    ) -> Result<PipelineResponse> {
        let base = stream.base_url.as_deref().unwrap_or(&self.base_url);
        let url = format!("{}/v2/pipeline", base.trim_end_matches('/'));
        let body = PipelineRequest {
            baton: stream.baton.as_deref(),
            requests,
        };
        debug!(target = "db", url = %url, has_baton = body.baton.is_some(), "hrana pipeline");
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.auth_token)
            .json(&body)
            .send()
            .await
            .context("sending database request")?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!(
                "database HTTP {status}: {}",
                crate::chart::truncate_chars(&text, 300)
            );
        }
        resp.json::<PipelineResponse>()
            .await
            .context("decoding database response")
    }
}

fn first_line(sql: &str) -> &str {
    sql.lines().next().unwrap_or(sql).trim()
}

#[async_trait::async_trait]
impl ChartStore for RemoteStore {
    async fn ensure_schema(&self) -> Result<()> {
        for stmt in sql::SCHEMA {
            self.execute(stmt, vec![]).await?;
        }
        Ok(())
    }

    async fn delete_chart_day(&self, day: NaiveDate) -> Result<u64> {
        let res = self
            .execute(sql::DELETE_CHART_DAY, vec![Value::text(day_key(day))])
            .await?;
        Ok(res.affected_row_count)
    }

    async fn find_song_id(&self, tj_number: &str) -> Result<Option<i64>> {
        let res = self
            .execute(sql::FIND_SONG_ID, vec![Value::text(tj_number)])
            .await?;
        res.rows
            .first()
            .and_then(|r| r.first())
            .map(Value::as_i64)
            .transpose()
    }

    async fn insert_song(&self, song: &NewSong) -> Result<()> {
        self.execute(
            sql::INSERT_SONG,
            vec![
                Value::text(song.tj_number.as_str()),
                Value::text(song.title_ja.as_str()),
                Value::opt_text(song.title_ko_auto.as_deref()),
                Value::text(song.artist_ja.as_str()),
                Value::opt_text(song.artist_ko.as_deref()),
            ],
        )
        .await?;
        Ok(())
    }

    async fn insert_chart_row(&self, day: NaiveDate, tj_number: &str, rank: i64) -> Result<()> {
        self.execute(
            sql::INSERT_CHART_ROW,
            vec![
                Value::text(day_key(day)),
                Value::text(tj_number),
                Value::integer(rank),
            ],
        )
        .await?;
        Ok(())
    }

    async fn count_unconfirmed(&self) -> Result<i64> {
        self.execute(sql::COUNT_UNCONFIRMED, vec![]).await?.first_i64()
    }

    async fn count_songs(&self) -> Result<i64> {
        self.execute(sql::COUNT_SONGS, vec![]).await?.first_i64()
    }

    async fn latest_chart_day(&self) -> Result<Option<ChartDay>> {
        let res = self.execute(sql::LATEST_CHART_DAY, vec![]).await?;
        let Some(row) = res.rows.first() else {
            return Ok(None);
        };
        match row.as_slice() {
            [week, rows, ..] => Ok(Some(ChartDay {
                week: week.as_string()?,
                rows: rows.as_i64()?,
            })),
            _ => bail!("short row for latest chart day"),
        }
    }

    async fn pending_songs(&self, limit: i64) -> Result<Vec<PendingSong>> {
        let res = self
            .execute(sql::PENDING_SONGS, vec![Value::integer(limit)])
            .await?;
        res.rows
            .iter()
            .map(|row| -> Result<PendingSong> {
                match row.as_slice() {
                    [tj, title_ja, title_ko_auto, artist_ja, artist_ko, rank, ..] => {
                        Ok(PendingSong {
                            tj_number: tj.as_string()?,
                            title_ja: title_ja.as_string()?,
                            title_ko_auto: title_ko_auto.as_opt_string()?,
                            artist_ja: artist_ja.as_string()?,
                            artist_ko: artist_ko.as_opt_string()?,
                            rank: rank.as_opt_i64()?,
                        })
                    }
                    _ => bail!("short row for pending song"),
                }
            })
            .collect()
    }

    async fn close(&self) -> Result<()> {
        let mut stream = self.stream.lock().await;
        if stream.baton.is_none() {
            return Ok(());
        }
        self.pipeline(&stream, vec![StreamRequest::Close]).await?;
        stream.baton = None;
        debug!(target = "db", "closed libSQL stream");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::serve_sequence;
    use serde_json::json;

    fn ok_execute(baton: &str, rows: serde_json::Value, affected: u64) -> (u16, String) {
        (
            200,
            json!({
                "baton": baton,
                "base_url": null,
                "results": [{
                    "type": "ok",
                    "response": {
                        "type": "execute",
                        "result": { "cols": [], "rows": rows, "affected_row_count": affected, "last_insert_rowid": null }
                    }
                }]
            })
            .to_string(),
        )
    }

    fn body_of(request: &str) -> serde_json::Value {
        let body = request.split("\r\n\r\n").nth(1).unwrap_or_default();
        serde_json::from_str(body).unwrap()
    }

    #[derive(Clone, Default)]
    struct CapturedLog(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn logs_tag_the_db_subsystem_as_a_field() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_target(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            RemoteStore::new("https://songs-acme.turso.io", "t").unwrap();
        });
        let out = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("using remote libSQL catalog"));
        assert!(out.contains("target=\"db\""));
    }

    #[test]
    fn values_use_hrana_tagging() {
        assert_eq!(
            serde_json::to_value(Value::integer(12)).unwrap(),
            json!({"type": "integer", "value": "12"})
        );
        assert_eq!(
            serde_json::to_value(Value::opt_text(None)).unwrap(),
            json!({"type": "null"})
        );
        assert_eq!(
            serde_json::to_value(StreamRequest::Close).unwrap(),
            json!({"type": "close"})
        );
    }

    #[tokio::test]
    async fn carries_baton_and_token_across_statements() {
        let mut server = serve_sequence(vec![
            ok_execute("b1", json!([[{"type": "integer", "value": "7"}]]), 0),
            ok_execute("b2", json!([]), 3),
            (200, json!({"baton": null, "base_url": null, "results": [{"type": "ok", "response": {"type": "close"}}]}).to_string()),
        ])
        .await;
        let store = RemoteStore::new(&server.url, "secret-token").unwrap();

        assert_eq!(store.find_song_id("12345").await.unwrap(), Some(7));
        let first = server.request().await;
        assert!(first.starts_with("POST /v2/pipeline "));
        assert!(first.to_ascii_lowercase().contains("authorization: bearer secret-token"));
        let first_body = body_of(&first);
        assert_eq!(first_body["baton"], json!(null));
        assert_eq!(first_body["requests"][0]["type"], "execute");
        assert_eq!(
            first_body["requests"][0]["stmt"]["args"][0],
            json!({"type": "text", "value": "12345"})
        );

        let day = NaiveDate::from_ymd_opt(2026, 5, 2).unwrap();
        assert_eq!(store.delete_chart_day(day).await.unwrap(), 3);
        let second = body_of(&server.request().await);
        assert_eq!(second["baton"], "b1");
        assert_eq!(
            second["requests"][0]["stmt"]["args"][0],
            json!({"type": "text", "value": "2026-05-02"})
        );

        store.close().await.unwrap();
        let third = body_of(&server.request().await);
        assert_eq!(third["baton"], "b2");
        assert_eq!(third["requests"][0]["type"], "close");
    }

    #[tokio::test]
    async fn statement_errors_become_database_errors() {
        let server = serve_sequence(vec![(
            200,
            json!({
                "baton": null,
                "base_url": null,
                "results": [{"type": "error", "error": {"message": "UNIQUE constraint failed: songs.tj_number", "code": "SQLITE_CONSTRAINT"}}]
            })
            .to_string(),
        )])
        .await;
        let store = RemoteStore::new(&server.url, "t").unwrap();
        let err = store
            .insert_song(&NewSong {
                tj_number: "1".into(),
                title_ja: "a".into(),
                title_ko_auto: None,
                artist_ja: "b".into(),
                artist_ko: None,
            })
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("UNIQUE constraint failed"));
    }

    #[tokio::test]
    async fn http_failures_are_errors() {
        let server = serve_sequence(vec![(401, r#"{"error":"Unauthorized"}"#.to_string())]).await;
        let store = RemoteStore::new(&server.url, "bad").unwrap();
        assert!(store.count_songs().await.is_err());
    }

    #[tokio::test]
    async fn count_decodes_integer_rows() {
        let server = serve_sequence(vec![ok_execute(
            "b",
            json!([[{"type": "integer", "value": "42"}]]),
            0,
        )])
        .await;
        let store = RemoteStore::new(&server.url, "t").unwrap();
        assert_eq!(store.count_unconfirmed().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn close_without_stream_is_a_no_op() {
        let store = RemoteStore::new("http://127.0.0.1:9", "t").unwrap();
        store.close().await.unwrap();
    }
}
