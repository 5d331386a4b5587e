use clap::Parser;
use clap::Subcommand;
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::path::PathBuf;

use ela_whales::config::Settings;
use ela_whales::core::types::Chain;
use ela_whales::framework::migrations;
use ela_whales::framework::store as pg;
use ela_whales::framework::JobWorker;
use ela_whales::monitor::Monitor;
use ela_whales::workers::correlations::Correlator;
use ela_whales::workers::labels::types::NewLabel;
use ela_whales::workers::labels::Labels;
use ela_whales::workers::snapshots::IngestOutcome;
use ela_whales::workers::snapshots::Ingestor;
use ela_whales::workers::snapshots::RawSnapshot;
use ela_whales::workers::supply::types::RawSupply;
use ela_whales::workers::supply::SupplyRecorder;
use ela_whales::workers::weekly::WeeklyRollup;
use ela_whales::Error;
use ela_whales::Result;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// ELA whale tracker analytics
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scheduled jobs (weekly roll-up, correlations) and the status server
    Run {
        /// Apply pending schema migrations on start
        #[arg(long)]
        allow_migrations: bool,
    },
    /// Create or migrate the schema and exit
    Migrate,
    /// Ingest snapshots from a JSON file (a single snapshot or a list)
    Ingest { file: PathBuf },
    /// Recompute derived data of all snapshots of a chain
    Backfill {
        #[arg(default_value = "mainchain")]
        chain: Chain,
    },
    /// Summarize complete weeks, or recompute a given week
    Rollup {
        /// Any date within the week to recompute, as YYYY-MM-DD
        #[arg(long, value_parser = parse_date)]
        week: Option<time::Date>,
    },
    /// Recompute wallet correlations
    Correlate {
        /// Trailing period in days, all configured periods if omitted
        #[arg(long)]
        period: Option<i32>,
    },
    /// Record cross-chain supply figures from a JSON file
    Supply { file: PathBuf },
    /// Manage address labels
    Label {
        #[command(subcommand)]
        command: LabelCommands,
    },
}

#[derive(Subcommand)]
enum LabelCommands {
    /// Create or replace the label of an address
    Set {
        address: String,
        label: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show the label of an address
    Get { address: String },
    /// List labels
    List {
        #[arg(long)]
        category: Option<String>,
    },
    /// Remove the label of an address
    Remove { address: String },
}

/// Snapshot files hold either one snapshot or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotFile {
    Many(Vec<RawSnapshot>),
    One(RawSnapshot),
}

fn parse_date(s: &str) -> std::result::Result<time::Date, String> {
    let format = time::macros::format_description!("[year]-[month]-[day]");
    time::Date::parse(s, format).map_err(|e| format!("invalid date `{s}`: {e}"))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Configure tracing subscriber
    let filter = env::var("EWT_LOG").unwrap_or(String::from("ela_whales=info,ewt=info"));
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .finish();
    let _guard = tracing::subscriber::set_global_default(subscriber);

    let cli = Cli::parse();
    tracing::info!("starting ewt v{VERSION}");

    let settings = Settings::from_env()?;
    let pgconf = &settings.postgres;

    match cli.command {
        Commands::Run { allow_migrations } => run(&settings, allow_migrations).await?,
        Commands::Migrate => {
            let client = pg::connect_and_init(pgconf, true).await?;
            let revision = migrations::get_revision(&client).await?;
            tracing::info!("schema is at revision {revision}");
        }
        Commands::Ingest { file } => {
            let snapshots = match read_json::<SnapshotFile>(&file)? {
                SnapshotFile::Many(snapshots) => snapshots,
                SnapshotFile::One(snapshot) => vec![snapshot],
            };
            let mut ingestor = Ingestor::new(pgconf).await?;
            let mut ingested = 0;
            for raw in &snapshots {
                if let IngestOutcome::Ingested(_) = ingestor.ingest(raw).await? {
                    ingested += 1;
                }
            }
            tracing::info!("ingested {ingested} of {} snapshot(s)", snapshots.len());
        }
        Commands::Backfill { chain } => {
            Ingestor::new(pgconf).await?.backfill(chain).await?;
        }
        Commands::Rollup { week } => {
            let mut rollup = WeeklyRollup::new(pgconf).await?;
            match week {
                Some(date) => {
                    rollup.run_week(date).await?;
                }
                None => {
                    let n = rollup.run_pending().await?;
                    tracing::info!("summarized {n} week(s)");
                }
            }
        }
        Commands::Correlate { period } => {
            let periods = match period {
                Some(days) => vec![days],
                None => settings.correlation_periods.clone(),
            };
            let mut correlator = Correlator::new(pgconf, periods.clone()).await?;
            for days in periods {
                correlator.run(days).await?;
            }
        }
        Commands::Supply { file } => {
            let raw: RawSupply = read_json(&file)?;
            SupplyRecorder::new(pgconf).await?.record(&raw).await?;
        }
        Commands::Label { command } => label(&settings, command).await?,
    }
    Ok(())
}

async fn run(settings: &Settings, allow_migrations: bool) -> Result<()> {
    let pgconf = &settings.postgres;
    // Prepare schema once, before the jobs connect
    pg::connect_and_init(pgconf, allow_migrations).await?;

    let mut monitor = Monitor::new(settings.monitor_port);

    let mut rollup = JobWorker::new(
        "weekly",
        WeeklyRollup::new(pgconf).await?,
        settings.rollup_interval,
        monitor.sender(),
    );
    let mut correlations = JobWorker::new(
        "correlations",
        Correlator::new(pgconf, settings.correlation_periods.clone()).await?,
        settings.correlation_interval,
        monitor.sender(),
    );

    tokio::spawn(async move {
        monitor.start().await;
    });
    let rollup = tokio::spawn(async move {
        rollup.start().await;
    });
    let correlations = tokio::spawn(async move {
        correlations.start().await;
    });

    // Workers return on ctrl-c
    let (r, c) = tokio::join!(rollup, correlations);
    if let Err(e) = r.and(c) {
        tracing::error!("worker task failed: {e}");
    }
    tracing::info!("exiting");
    Ok(())
}

async fn label(settings: &Settings, command: LabelCommands) -> Result<()> {
    let labels = Labels::new(&settings.postgres).await?;
    match command {
        LabelCommands::Set {
            address,
            label,
            category,
            notes,
        } => {
            labels
                .upsert(&NewLabel {
                    address,
                    label,
                    category,
                    notes,
                })
                .await?;
        }
        LabelCommands::Get { address } => match labels.get(&address).await? {
            Some(label) => println!("{}", serde_json::to_string_pretty(&label)?),
            None => return Err(Error::InvalidInput(format!("no label for {address}"))),
        },
        LabelCommands::List { category } => {
            let list = labels.list(category.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&list)?);
        }
        LabelCommands::Remove { address } => {
            if !labels.delete(&address).await? {
                tracing::warn!("no label for {address}");
            }
        }
    }
    Ok(())
}
