use std::fmt::Write as _;

use anyhow::Result;

use crate::cli::require_database;
use crate::config::DatabaseConfig;
use crate::store::{open_store, PendingSong};

pub const DEFAULT_PENDING_LIMIT: i64 = 50;

/// List unconfirmed songs, ranked ones first by their latest chart position.
pub async fn run(database: Option<&DatabaseConfig>, limit: i64) -> Result<()> {
    let cfg = require_database(database)?;
    let store = open_store(cfg).await?;
    let songs = store.pending_songs(limit.max(0)).await;
    let closed = store.close().await;
    let songs = songs?;
    closed?;
    println!("{}", render_pending(&songs));
    Ok(())
}

pub fn render_pending(songs: &[PendingSong]) -> String {
    let mut out = String::new();
    writeln!(out, "unconfirmed songs: {}", songs.len()).ok();
    for s in songs {
        let rank = s.rank.map(|r| r.to_string()).unwrap_or_else(|| "-".into());
        writeln!(
            out,
            "{:>3}  {:<6}  {} -> {}  |  {} -> {}",
            rank,
            s.tj_number,
            s.title_ja,
            s.title_ko_auto.as_deref().unwrap_or("?"),
            s.artist_ja,
            s.artist_ko.as_deref().unwrap_or("?"),
        )
        .ok();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unranked_and_untranslated_fields_are_marked() {
        let songs = vec![
            PendingSong {
                tj_number: "68581".into(),
                title_ja: "アイドル".into(),
                title_ko_auto: Some("아이돌".into()),
                artist_ja: "YOASOBI".into(),
                artist_ko: Some("YOASOBI".into()),
                rank: Some(1),
            },
            PendingSong {
                tj_number: "10001".into(),
                title_ja: "夜に駆ける".into(),
                title_ko_auto: None,
                artist_ja: "ヨルシカ".into(),
                artist_ko: None,
                rank: None,
            },
        ];
        let out = render_pending(&songs);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "unconfirmed songs: 2");
        assert_eq!(lines[1], "  1  68581   アイドル -> 아이돌  |  YOASOBI -> YOASOBI");
        assert_eq!(lines[2], "  -  10001   夜に駆ける -> ?  |  ヨルシカ -> ?");
    }
}
