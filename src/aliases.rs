//! Curated Japanese → Korean artist name overrides.
//!
//! File format: one `<japanese>\t<korean>` pair per line, `#` starts a comment
//! line. Checked before any machine translation of artist names.
use std::collections::HashMap;
use std::path::Path;

use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct AliasMap {
    entries: HashMap<String, String>,
}

impl AliasMap {
    /// Load the alias file. A missing file yields an empty map; so does an
    /// unreadable one, after a warning.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!(path = %path.display(), "artist alias file not found; continuing without aliases");
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let map = Self::parse(&text);
                info!(path = %path.display(), aliases = map.len(), "loaded artist aliases");
                map
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read artist alias file");
                Self::default()
            }
        }
    }

    pub fn parse(text: &str) -> Self {
        let mut entries = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((ja, ko)) = line.split_once('\t') else {
                continue;
            };
            entries.insert(ja.trim().to_string(), ko.trim().to_string());
        }
        Self { entries }
    }

    pub fn get(&self, artist_ja: &str) -> Option<&str> {
        self.entries.get(artist_ja).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for AliasMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
