use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tj_chart_sync::cli;
use tj_chart_sync::config::{sleep_duration, DatabaseConfig, SyncConfig};
use tj_chart_sync::logging::init_tracing;
use tj_chart_sync::util::env as env_util;

#[derive(Parser, Debug)]
#[command(
    name = "tj-chart-sync",
    version,
    about = "Sync the TJ Media J-POP chart into the Korean song catalog"
)]
struct Cli {
    /// Chart API endpoint (overrides TJ_CHART_API_URL)
    #[arg(long, global = true)]
    chart_url: Option<String>,
    /// Artist alias TSV (overrides ARTIST_ALIAS_PATH)
    #[arg(long, global = true)]
    aliases: Option<PathBuf>,
    /// Pause after each new song, in seconds (overrides TRANS_SLEEP_SECONDS)
    #[arg(long, global = true)]
    sleep_secs: Option<f64>,
    /// Database URL (overrides TURSO_DATABASE_URL); sqlite:/file: URLs need no token
    #[arg(long, global = true)]
    db_url: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Fetch today's chart, translate new songs and update the catalog (default)
    Sync,
    /// Fetch and print today's chart without touching the database
    Fetch {
        /// Print entries as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Create the songs/weekly_charts tables if missing
    InitSchema,
    /// Print catalog counts and the latest chart day
    Stats,
    /// List unconfirmed songs by latest rank
    Pending {
        #[arg(long, default_value_t = cli::pending::DEFAULT_PENDING_LIMIT)]
        limit: i64,
    },
}

impl Cli {
    fn apply_overrides(&self, cfg: &mut SyncConfig) {
        if let Some(url) = &self.chart_url {
            cfg.chart_api_url = url.clone();
        }
        if let Some(path) = &self.aliases {
            cfg.alias_path = path.clone();
        }
        if let Some(secs) = self.sleep_secs {
            cfg.translation_sleep = sleep_duration(secs);
        }
        if let Some(url) = &self.db_url {
            cfg.database = Some(DatabaseConfig {
                url: url.clone(),
                auth_token: env_util::env_opt("TURSO_AUTH_TOKEN"),
            });
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_util::init_env();
    init_tracing("info")?;

    let args = Cli::parse();
    let mut cfg = SyncConfig::from_env();
    args.apply_overrides(&mut cfg);
    let today = chrono::Local::now().date_naive();

    match args.command.unwrap_or(Commands::Sync) {
        Commands::Sync => cli::sync::run(&cfg, today).await,
        Commands::Fetch { json } => {
            cli::fetch::run(
                cli::fetch::FetchConfig {
                    chart_api_url: cfg.chart_api_url.clone(),
                    json,
                },
                today,
            )
            .await
        }
        Commands::InitSchema => cli::schema::run(cfg.database.as_ref()).await,
        Commands::Stats => cli::stats::run(cfg.database.as_ref()).await,
        Commands::Pending { limit } => cli::pending::run(cfg.database.as_ref(), limit).await,
    }
}
