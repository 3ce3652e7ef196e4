//! Statements shared by every backend. Placeholders are positional `?`.

pub const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS songs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        tj_number TEXT NOT NULL UNIQUE,
        title_ja TEXT NOT NULL,
        title_ko_main TEXT,
        title_ko_auto TEXT,
        title_ko_llm TEXT,
        artist_ja TEXT NOT NULL,
        artist_ko TEXT,
        is_confirmed INTEGER NOT NULL DEFAULT 0,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
    )",
    "CREATE TABLE IF NOT EXISTS weekly_charts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        week DATE NOT NULL,
        tj_number TEXT NOT NULL,
        rank INTEGER NOT NULL,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY (tj_number) REFERENCES songs(tj_number)
    )",
    "CREATE INDEX IF NOT EXISTS idx_songs_confirmed ON songs(is_confirmed)",
    "CREATE INDEX IF NOT EXISTS idx_weekly_charts_week ON weekly_charts(week)",
    "CREATE INDEX IF NOT EXISTS idx_weekly_charts_week_rank ON weekly_charts(week, rank)",
];

pub const DELETE_CHART_DAY: &str = "DELETE FROM weekly_charts WHERE week = ?";

pub const FIND_SONG_ID: &str = "SELECT id FROM songs WHERE tj_number = ?";

pub const INSERT_SONG: &str = "INSERT INTO songs
    (tj_number, title_ja, title_ko_auto, title_ko_llm, artist_ja, artist_ko, is_confirmed)
    VALUES (?, ?, ?, NULL, ?, ?, 0)";

pub const INSERT_CHART_ROW: &str = "INSERT INTO weekly_charts (week, tj_number, rank) VALUES (?, ?, ?)";

pub const COUNT_UNCONFIRMED: &str = "SELECT COUNT(*) FROM songs WHERE is_confirmed = 0";

pub const COUNT_SONGS: &str = "SELECT COUNT(*) FROM songs";

pub const LATEST_CHART_DAY: &str = "SELECT week, COUNT(*) FROM weekly_charts
    WHERE week = (SELECT MAX(week) FROM weekly_charts)
    GROUP BY week";

pub const PENDING_SONGS: &str = "SELECT s.tj_number, s.title_ja, s.title_ko_auto, s.artist_ja, s.artist_ko, w.rank
    FROM songs s
    LEFT JOIN weekly_charts w
        ON s.tj_number = w.tj_number AND w.week = (SELECT MAX(week) FROM weekly_charts)
    WHERE s.is_confirmed = 0
    ORDER BY w.rank IS NULL, w.rank ASC, s.id ASC
    LIMIT ?";
