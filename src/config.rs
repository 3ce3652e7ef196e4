use std::path::PathBuf;
use std::time::Duration;

use crate::util::env as env_util;

pub const DEFAULT_CHART_API_URL: &str = "https://www.tjmedia.com/legacy/api/topAndHot100";
pub const DEFAULT_ALIAS_PATH: &str = "data/artist_aliases.tsv";
pub const DEFAULT_TRANSLATE_API_URL: &str = "https://translate.googleapis.com/translate_a/single";
pub const DEFAULT_TRANS_SLEEP_SECONDS: f64 = 0.5;

/// Connection settings for the song catalog database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub auth_token: Option<String>,
}

/// Everything a sync run reads from the environment.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// `None` when `TURSO_DATABASE_URL` is unset; the update step aborts in that case.
    pub database: Option<DatabaseConfig>,
    pub chart_api_url: String,
    pub alias_path: PathBuf,
    pub translate_api_url: String,
    pub translation_sleep: Duration,
}

impl SyncConfig {
    pub fn from_env() -> Self {
        let database = env_util::env_opt("TURSO_DATABASE_URL").map(|url| DatabaseConfig {
            url,
            auth_token: env_util::env_opt("TURSO_AUTH_TOKEN"),
        });
        let sleep_secs = env_util::env_parse("TRANS_SLEEP_SECONDS", DEFAULT_TRANS_SLEEP_SECONDS);

        Self {
            database,
            chart_api_url: env_util::env_opt("TJ_CHART_API_URL")
                .unwrap_or_else(|| DEFAULT_CHART_API_URL.to_string()),
            alias_path: env_util::env_opt("ARTIST_ALIAS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ALIAS_PATH)),
            translate_api_url: env_util::env_opt("TRANSLATE_API_URL")
                .unwrap_or_else(|| DEFAULT_TRANSLATE_API_URL.to_string()),
            translation_sleep: sleep_duration(sleep_secs),
        }
    }
}

/// Seconds → `Duration`, treating negative, NaN and infinite input as the default.
pub fn sleep_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs)
        .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_TRANS_SLEEP_SECONDS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sleep_duration_rejects_nonsense() {
        assert_eq!(sleep_duration(1.5), Duration::from_millis(1500));
        assert_eq!(sleep_duration(0.0), Duration::ZERO);
        assert_eq!(sleep_duration(-3.0), Duration::from_millis(500));
        assert_eq!(sleep_duration(f64::NAN), Duration::from_millis(500));
    }
}
