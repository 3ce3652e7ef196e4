//! Reconcile a fetched chart with the song catalog.
//!
//! Today's chart rows are deleted first and rebuilt from the fetched entries,
//! so rerunning on the same day is safe. Songs are inserted once per
//! `tj_number` and never rewritten here.
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::chart::ChartEntry;
use crate::store::{ChartStore, NewSong};
use crate::translate::{KoreanTranslator, Translation};

/// Existing-song rank updates reported individually; the rest only count.
pub const REPORTED_RANK_UPDATES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub day: NaiveDate,
    pub new_songs: usize,
    pub updated_songs: usize,
    /// New songs stored with at least one NULL translation.
    pub translation_gaps: usize,
    pub total_songs: i64,
    pub unconfirmed_songs: i64,
}

/// Progress notifications emitted while the catalog is updated.
#[derive(Debug)]
pub enum SyncEvent<'a> {
    DayCleared { day: NaiveDate, removed: u64 },
    RankRecorded { entry: &'a ChartEntry },
    NewSong { entry: &'a ChartEntry },
    Translated {
        entry: &'a ChartEntry,
        title: &'a Translation,
        artist: &'a Translation,
    },
    Finished { summary: &'a SyncSummary },
}

pub trait SyncObserver: Send + Sync {
    fn on_event(&self, event: &SyncEvent<'_>);
}

/// Default observer: one `tracing` line per event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SyncObserver for TracingObserver {
    fn on_event(&self, event: &SyncEvent<'_>) {
        match event {
            SyncEvent::DayCleared { day, removed } => {
                info!(%day, removed, "cleared existing chart rows");
            }
            SyncEvent::RankRecorded { entry } => {
                info!(rank = entry.rank, title = %entry.title_ja, "rank recorded");
            }
            SyncEvent::NewSong { entry } => {
                info!(
                    rank = entry.rank,
                    tj_number = %entry.tj_number,
                    title = %entry.title_ja,
                    artist = %entry.artist_ja,
                    "new song"
                );
            }
            SyncEvent::Translated {
                title, artist, ..
            } => {
                info!(title = %title, artist = %artist, "machine translation");
            }
            SyncEvent::Finished { summary } => {
                info!(
                    day = %summary.day,
                    new_songs = summary.new_songs,
                    updated_songs = summary.updated_songs,
                    translation_gaps = summary.translation_gaps,
                    total_songs = summary.total_songs,
                    unconfirmed_songs = summary.unconfirmed_songs,
                    "catalog update finished"
                );
            }
        }
    }
}

pub struct ChartUpdater<'a> {
    store: &'a dyn ChartStore,
    translator: &'a KoreanTranslator,
    observer: &'a dyn SyncObserver,
    rate_limit: Duration,
}

impl<'a> ChartUpdater<'a> {
    pub fn new(
        store: &'a dyn ChartStore,
        translator: &'a KoreanTranslator,
        observer: &'a dyn SyncObserver,
        rate_limit: Duration,
    ) -> Self {
        Self {
            store,
            translator,
            observer,
            rate_limit,
        }
    }

    /// Rebuild `today`'s chart from `entries`, adding unseen songs.
    ///
    /// Writes are issued one statement at a time; a database error stops the
    /// run and leaves earlier writes in place.
    pub async fn run(&self, entries: &[ChartEntry], today: NaiveDate) -> Result<SyncSummary> {
        let removed = self.store.delete_chart_day(today).await?;
        self.observer.on_event(&SyncEvent::DayCleared {
            day: today,
            removed,
        });

        let mut new_songs = 0;
        let mut updated_songs = 0;
        let mut translation_gaps = 0;

        for entry in entries {
            if self.store.find_song_id(&entry.tj_number).await?.is_some() {
                self.store
                    .insert_chart_row(today, &entry.tj_number, entry.rank)
                    .await?;
                updated_songs += 1;
                if updated_songs <= REPORTED_RANK_UPDATES {
                    self.observer.on_event(&SyncEvent::RankRecorded { entry });
                }
                continue;
            }

            self.observer.on_event(&SyncEvent::NewSong { entry });
            let title = self.translator.translate_title(&entry.title_ja).await;
            let artist = self.translator.translate_artist(&entry.artist_ja).await;
            self.observer.on_event(&SyncEvent::Translated {
                entry,
                title: &title,
                artist: &artist,
            });
            if !self.rate_limit.is_zero() {
                tokio::time::sleep(self.rate_limit).await;
            }

            if title == Translation::Unavailable || artist == Translation::Unavailable {
                translation_gaps += 1;
            }
            let song = NewSong {
                tj_number: entry.tj_number.clone(),
                title_ja: entry.title_ja.clone(),
                title_ko_auto: title.into_option(),
                artist_ja: entry.artist_ja.clone(),
                artist_ko: artist.into_option(),
            };
            self.store.insert_song(&song).await?;
            self.store
                .insert_chart_row(today, &entry.tj_number, entry.rank)
                .await?;
            new_songs += 1;
        }

        let summary = SyncSummary {
            day: today,
            new_songs,
            updated_songs,
            translation_gaps,
            unconfirmed_songs: self.store.count_unconfirmed().await?,
            total_songs: self.store.count_songs().await?,
        };
        self.observer.on_event(&SyncEvent::Finished { summary: &summary });
        Ok(summary)
    }
}
