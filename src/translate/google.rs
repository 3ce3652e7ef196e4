use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde_json::Value;

use super::TranslationService;

/// Google Translate's public `translate_a/single` endpoint (`client=gtx`).
#[derive(Debug, Clone)]
pub struct GoogleTranslate {
    url: String,
    http: Client,
}

impl GoogleTranslate {
    pub fn new(url: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(crate::chart::headers::BROWSER_USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .context("building translate http client")?;
        Ok(Self {
            url: url.to_string(),
            http,
        })
    }
}

#[async_trait::async_trait]
impl TranslationService for GoogleTranslate {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let resp = self
            .http
            .get(&self.url)
            .query(&[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?
            .error_for_status()?;
        let v: Value = resp.json().await.context("decoding translate response")?;
        join_segments(&v).ok_or_else(|| anyhow!("translate response carried no text"))
    }
}

/// The body is `[[["<translated>", "<source>", ...], ...], ...]`; long input
/// comes back split into several sentence segments.
fn join_segments(v: &Value) -> Option<String> {
    let out: String = v
        .get(0)?
        .as_array()?
        .iter()
        .filter_map(|seg| seg.get(0).and_then(Value::as_str))
        .collect();
    if out.trim().is_empty() {
        None
    } else {
        Some(out)
    }
}
