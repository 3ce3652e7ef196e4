//! Environment access for the sync binary. Every getter loads the dotenv
//! files on first use, so call order does not matter.
use std::str::FromStr;
use std::sync::Once;
use tracing::info;

static INIT: Once = Once::new();

/// Load `.env.local` / `.env` from the working directory exactly once.
pub fn init_env() {
    INIT.call_once(|| {
        if let Ok(dir) = std::env::current_dir() {
            crate::env_boot::ensure_dotenv(&dir);
        }
    });
}

/// Trimmed value of `key`, `None` when unset or blank.
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

/// Parse `key`, falling back to `default` when unset or unparsable.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    init_env();
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

pub(crate) fn redact_value(key: &str, val: &str) -> String {
    let k = key.to_ascii_uppercase();
    if k.contains("PASSWORD") || k.contains("SECRET") || k.contains("KEY") || k.contains("TOKEN") {
        return "***".to_string();
    }

    let val_trim = val.trim();

    // libsql/http DSNs may carry credentials in userinfo or an authToken query.
    if let Ok(mut u) = url::Url::parse(val_trim) {
        if !u.username().is_empty() || u.password().is_some() {
            let _ = u.set_username("***");
            let _ = u.set_password(Some("***"));
        }
        if u.query_pairs().any(|(k, _)| k.eq_ignore_ascii_case("authtoken")) {
            let kept: Vec<(String, String)> = u
                .query_pairs()
                .map(|(k, v)| {
                    if k.eq_ignore_ascii_case("authtoken") {
                        (k.into_owned(), "***".to_string())
                    } else {
                        (k.into_owned(), v.into_owned())
                    }
                })
                .collect();
            u.query_pairs_mut().clear().extend_pairs(kept);
        }
        return u.to_string();
    }

    val_trim.to_string()
}

/// Log a redacted snapshot of `also_log` and fail if any `required` key is unset.
pub fn preflight_check(title: &str, required: &[&str], also_log: &[&str]) -> anyhow::Result<()> {
    init_env();
    let missing: Vec<&str> = required.iter().copied().filter(|k| env_opt(k).is_none()).collect();
    let snapshot: Vec<(String, String)> = also_log
        .iter()
        .map(|&k| {
            let v = env_opt(k).unwrap_or_default();
            (k.to_string(), redact_value(k, &v))
        })
        .collect();
    info!(target = "preflight", title, snapshot = ?snapshot, "configuration snapshot");
    if !missing.is_empty() {
        return Err(anyhow::anyhow!("missing required env: {:?}", missing));
    }
    Ok(())
}
