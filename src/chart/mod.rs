pub mod fetcher;
pub mod headers;

use serde::Serialize;
use serde_json::Value;

pub use fetcher::ChartFetcher;

/// `resultCode` the TJ chart API returns on success.
pub const SUCCESS_CODE: &str = "99";

/// One ranked song as returned by the chart API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartEntry {
    pub rank: i64,
    pub tj_number: String,
    pub title_ja: String,
    pub artist_ja: String,
}

/// Outcome of interpreting a chart API body.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartResponse {
    Entries(Vec<ChartEntry>),
    /// Valid JSON carrying a `resultCode` other than [`SUCCESS_CODE`].
    Rejected { code: Option<String> },
    /// An item lacked a usable `rank`, `pro`, `indexTitle` or `indexSong`;
    /// carries the offending item, truncated.
    Malformed { item: String },
    NotJson,
}

/// Interpret the raw response body of the chart endpoint.
///
/// Expected shape: `{ resultCode, resultData: { items: [{ rank, pro, indexTitle, indexSong }] } }`.
pub fn parse_chart_response(body: &str) -> ChartResponse {
    let Ok(root) = serde_json::from_str::<Value>(body) else {
        return ChartResponse::NotJson;
    };

    let code = root.get("resultCode").and_then(scalar_text);
    if code.as_deref() != Some(SUCCESS_CODE) {
        return ChartResponse::Rejected { code };
    }

    let items = root
        .get("resultData")
        .and_then(|d| d.get("items"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        let Some(entry) = entry_from_item(item) else {
            return ChartResponse::Malformed {
                item: truncate_chars(&item.to_string(), 200).to_string(),
            };
        };
        entries.push(entry);
    }
    ChartResponse::Entries(entries)
}

fn entry_from_item(item: &Value) -> Option<ChartEntry> {
    let rank = match item.get("rank")? {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    Some(ChartEntry {
        rank,
        tj_number: item.get("pro").and_then(scalar_text)?,
        title_ja: item.get("indexTitle").and_then(scalar_text)?,
        artist_ja: item.get("indexSong").and_then(scalar_text)?,
    })
}

// The API is loose about strings vs numbers for codes and catalog numbers.
fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First `max` characters of `s` (never splits a code point).
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
