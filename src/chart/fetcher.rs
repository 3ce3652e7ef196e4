use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{error, info};

use super::headers::{chart_headers, FORM_CONTENT_TYPE};
use super::{parse_chart_response, truncate_chars, ChartEntry, ChartResponse};

pub const FETCH_TIMEOUT_SECS: u64 = 15;

/// Client for the TJ Media TOP 100 (J-POP) chart endpoint.
#[derive(Debug, Clone)]
pub struct ChartFetcher {
    url: String,
    http: Client,
}

impl ChartFetcher {
    pub fn new(url: &str) -> Result<Self> {
        let http = Client::builder()
            .default_headers(chart_headers())
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .context("building chart http client")?;
        Ok(Self {
            url: url.to_string(),
            http,
        })
    }

    /// Fetch the chart for the window ending on `today`.
    ///
    /// Every failure (network, timeout, HTTP status, bad body, rejected result
    /// code) is logged and reported as an empty chart.
    pub async fn fetch(&self, today: NaiveDate) -> Vec<ChartEntry> {
        let form = chart_form(today);
        info!(url = %self.url, params = ?form, "requesting TJ chart");

        let body = match self.request(&form).await {
            Ok(body) => body,
            Err(e) => {
                error!(error = ?e, "chart request failed");
                return Vec::new();
            }
        };

        match parse_chart_response(&body) {
            ChartResponse::Entries(entries) => {
                info!(songs = entries.len(), "chart response ok");
                entries
            }
            ChartResponse::Rejected { code } => {
                error!(
                    result_code = ?code,
                    body = truncate_chars(&body, 500),
                    "chart API returned an error code"
                );
                Vec::new()
            }
            ChartResponse::Malformed { item } => {
                error!(item = %item, "chart item could not be read; discarding the whole chart");
                Vec::new()
            }
            ChartResponse::NotJson => {
                error!(body = truncate_chars(&body, 1000), "chart response is not JSON");
                Vec::new()
            }
        }
    }

    async fn request(&self, form: &[(&'static str, String)]) -> Result<String> {
        let resp = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(encode_form(form))
            .send()
            .await
            .with_context(|| format!("POST {}", self.url))?
            .error_for_status()?;
        resp.text().await.context("reading chart response body")
    }
}

fn encode_form(form: &[(&'static str, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(form.iter().map(|(k, v)| (*k, v.as_str())))
        .finish()
}

/// Form fields for the J-POP TOP chart over yesterday..=today.
pub fn chart_form(today: NaiveDate) -> Vec<(&'static str, String)> {
    let yesterday = today.pred_opt().unwrap_or(today);
    vec![
        ("chartType", "TOP".to_string()),
        ("strType", "3".to_string()),
        ("searchStartDate", yesterday.format("%Y-%m-%d").to_string()),
        ("searchEndDate", today.format("%Y-%m-%d").to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{serve_once, unused_local_url};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    #[test]
    fn form_spans_yesterday_to_today() {
        let form = chart_form(day());
        assert_eq!(form[0], ("chartType", "TOP".to_string()));
        assert_eq!(form[1], ("strType", "3".to_string()));
        assert_eq!(form[2], ("searchStartDate", "2026-02-28".to_string()));
        assert_eq!(form[3], ("searchEndDate", "2026-03-01".to_string()));
    }

    #[tokio::test]
    async fn posts_form_and_maps_items() {
        let mut server = serve_once(
            200,
            r#"{"resultCode":"99","resultData":{"items":[{"rank":"1","pro":"12345","indexTitle":"こんにちは","indexSong":"テスト"}]}}"#,
        )
        .await;
        let fetcher = ChartFetcher::new(&server.url).unwrap();

        let entries = fetcher.fetch(day()).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tj_number, "12345");

        let request = server.request().await;
        let lower = request.to_ascii_lowercase();
        assert!(request.starts_with("POST "));
        assert!(lower.contains("x-requested-with: xmlhttprequest"));
        assert!(lower.contains("content-type: application/x-www-form-urlencoded; charset=utf-8"));
        assert!(request.contains("searchStartDate=2026-02-28"));
        assert!(request.contains("searchEndDate=2026-03-01"));
        assert!(request.contains("chartType=TOP"));
    }

    #[tokio::test]
    async fn one_bad_item_discards_the_chart() {
        let server = serve_once(
            200,
            r#"{"resultCode":"99","resultData":{"items":[
                {"rank":"1","pro":"12345","indexTitle":"こんにちは","indexSong":"テスト"},
                {"rank":"2","indexTitle":"さよなら","indexSong":"テスト"}
            ]}}"#,
        )
        .await;
        let fetcher = ChartFetcher::new(&server.url).unwrap();
        assert!(fetcher.fetch(day()).await.is_empty());
    }

    #[test]
    fn form_body_is_url_encoded() {
        assert_eq!(
            encode_form(&chart_form(day())),
            "chartType=TOP&strType=3&searchStartDate=2026-02-28&searchEndDate=2026-03-01"
        );
    }

    #[tokio::test]
    async fn rejected_code_yields_nothing() {
        let server = serve_once(200, r#"{"resultCode":"01","resultData":null}"#).await;
        let fetcher = ChartFetcher::new(&server.url).unwrap();
        assert!(fetcher.fetch(day()).await.is_empty());
    }

    #[tokio::test]
    async fn html_error_page_yields_nothing() {
        let server = serve_once(200, "<html>maintenance</html>").await;
        let fetcher = ChartFetcher::new(&server.url).unwrap();
        assert!(fetcher.fetch(day()).await.is_empty());
    }

    #[tokio::test]
    async fn server_error_status_yields_nothing() {
        let server = serve_once(503, r#"{"resultCode":"99","resultData":{"items":[]}}"#).await;
        let fetcher = ChartFetcher::new(&server.url).unwrap();
        assert!(fetcher.fetch(day()).await.is_empty());
    }

    #[tokio::test]
    async fn unreachable_endpoint_yields_nothing() {
        let url = unused_local_url().await;
        let fetcher = ChartFetcher::new(&url).unwrap();
        assert!(fetcher.fetch(day()).await.is_empty());
    }
}
