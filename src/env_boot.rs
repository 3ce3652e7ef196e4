use std::path::{Path, PathBuf};

/// Files consulted at startup, highest precedence first.
pub const DOTENV_FILES: &[&str] = &[".env.local", ".env"];

/// Load the dotenv files found in `dir`; returns the ones that were read.
///
/// dotenv never overwrites a variable that is already set, so `.env.local`
/// beats `.env` and the process environment beats both.
pub fn ensure_dotenv(dir: &Path) -> Vec<PathBuf> {
    DOTENV_FILES
        .iter()
        .map(|name| dir.join(name))
        .filter(|path| path.is_file() && dotenv::from_path(path).is_ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_file_wins_over_plain() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env.local"), "TJ_SYNC_BOOT_A=local\n").unwrap();
        std::fs::write(
            dir.path().join(".env"),
            "TJ_SYNC_BOOT_A=plain\nTJ_SYNC_BOOT_B=plain\n",
        )
        .unwrap();

        let loaded = ensure_dotenv(dir.path());
        assert_eq!(loaded.len(), 2);
        assert_eq!(std::env::var("TJ_SYNC_BOOT_A").unwrap(), "local");
        assert_eq!(std::env::var("TJ_SYNC_BOOT_B").unwrap(), "plain");
    }

    #[test]
    fn missing_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ensure_dotenv(dir.path()).is_empty());
    }
}
