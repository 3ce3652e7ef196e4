//! Daily run: fetch the chart, then update the catalog.
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::aliases::AliasMap;
use crate::chart::ChartFetcher;
use crate::config::{DatabaseConfig, SyncConfig};
use crate::store::{open_store, ChartStore};
use crate::sync::{ChartUpdater, SyncObserver, SyncSummary, TracingObserver};
use crate::translate::{GoogleTranslate, KoreanTranslator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The chart came back empty (fetch failure or no items); nothing was written.
    EmptyChart,
    /// Database URL/token missing or unusable; nothing was written.
    MissingDatabaseConfig,
    Completed(SyncSummary),
}

pub struct Pipeline {
    fetcher: ChartFetcher,
    translator: KoreanTranslator,
    database: Option<DatabaseConfig>,
    rate_limit: Duration,
    observer: Box<dyn SyncObserver>,
}

impl Pipeline {
    pub fn new(
        fetcher: ChartFetcher,
        translator: KoreanTranslator,
        database: Option<DatabaseConfig>,
        rate_limit: Duration,
    ) -> Self {
        Self {
            fetcher,
            translator,
            database,
            rate_limit,
            observer: Box::new(TracingObserver),
        }
    }

    /// Production wiring from configuration: TJ chart client, Google
    /// translation, alias file.
    pub fn from_config(cfg: &SyncConfig) -> Result<Self> {
        let aliases = AliasMap::load(&cfg.alias_path);
        let service = Arc::new(GoogleTranslate::new(&cfg.translate_api_url)?);
        Ok(Self::new(
            ChartFetcher::new(&cfg.chart_api_url)?,
            KoreanTranslator::new(service, aliases),
            cfg.database.clone(),
            cfg.translation_sleep,
        ))
    }

    pub fn with_observer(mut self, observer: Box<dyn SyncObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// fetch → (abort if empty) → open database → update → close.
    ///
    /// Fetch problems end the run cleanly; database errors are returned.
    pub async fn run(&self, today: NaiveDate) -> Result<RunOutcome> {
        let entries = self.fetcher.fetch(today).await;
        if entries.is_empty() {
            warn!("chart fetch returned no songs; aborting");
            return Ok(RunOutcome::EmptyChart);
        }

        let Some(database) = &self.database else {
            error!("TURSO_DATABASE_URL and TURSO_AUTH_TOKEN must be set");
            return Ok(RunOutcome::MissingDatabaseConfig);
        };
        if let Err(e) = database.backend() {
            error!(error = %e, "database configuration unusable");
            return Ok(RunOutcome::MissingDatabaseConfig);
        }

        info!(songs = entries.len(), "starting translation and catalog update");
        let store = open_store(database).await?;
        let summary = self.update(store.as_ref(), &entries, today).await;
        let closed = store.close().await;
        let summary = summary?;
        closed?;
        Ok(RunOutcome::Completed(summary))
    }

    async fn update(
        &self,
        store: &dyn ChartStore,
        entries: &[crate::chart::ChartEntry],
        today: NaiveDate,
    ) -> Result<SyncSummary> {
        ChartUpdater::new(store, &self.translator, self.observer.as_ref(), self.rate_limit)
            .run(entries, today)
            .await
    }
}
