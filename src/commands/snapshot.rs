use std::path::PathBuf;

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Subcommand};

use snapdbx::{
    config::load_or_default,
    store::{ReviewSnapshot, SeriesStore},
};

#[derive(Subcommand)]
pub enum SnapshotCommands {
    /// Record a review-count snapshot for an app
    Record(RecordArgs),
    /// List snapshots for an app within a date range
    History(HistoryArgs),
}

#[derive(Args)]
pub struct RecordArgs {
    #[arg(long)]
    pub app_id: i64,

    /// Total review count at the time of the snapshot
    #[arg(long)]
    pub total: u64,

    /// Recent review count at the time of the snapshot
    #[arg(long, default_value_t = 0)]
    pub recent: u64,

    /// Snapshot timestamp (RFC 3339 or YYYY-MM-DD); defaults to now
    #[arg(long)]
    pub at: Option<String>,
}

#[derive(Args)]
pub struct HistoryArgs {
    #[arg(long)]
    pub app_id: i64,

    /// Start of the range (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub from: String,

    /// End of the range (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub to: String,
}

pub fn execute(config_path: Option<PathBuf>, command: SnapshotCommands) -> Result<()> {
    let (config, _) = load_or_default(config_path)?;
    let store: SeriesStore<ReviewSnapshot> = SeriesStore::open(config.series_store_path(), false)?;

    match command {
        SnapshotCommands::Record(args) => {
            let recorded_at = match args.at.as_deref() {
                Some(at) => parse_moment(at, false)?,
                None => Utc::now(),
            };
            let snapshot = ReviewSnapshot {
                app_id: args.app_id,
                recorded_at,
                total_reviews: args.total,
                recent_reviews: args.recent,
            };
            store.add(snapshot)?;
            println!(
                "recorded snapshot for app {} at {}",
                args.app_id,
                recorded_at.to_rfc3339()
            );
        }
        SnapshotCommands::History(args) => {
            let from = parse_moment(&args.from, false)?;
            let to = parse_moment(&args.to, true)?;
            let snapshots = store.load(args.app_id, from, to)?;
            for snapshot in &snapshots {
                println!("{}", serde_json::to_string(snapshot)?);
            }
            if snapshots.is_empty() {
                eprintln!("no snapshots for app {} in range", args.app_id);
            }
        }
    }

    Ok(())
}

/// Accepts an RFC 3339 timestamp or a bare date; bare dates expand to the
/// start of the day, or its last second when `end_of_day` is set.
fn parse_moment(input: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    if let Ok(timestamp) = input.parse::<DateTime<Utc>>() {
        return Ok(timestamp);
    }

    let date = input
        .parse::<NaiveDate>()
        .map_err(|_| anyhow!("invalid timestamp or date: {input}"))?;
    let naive = if end_of_day {
        date.and_hms_opt(23, 59, 59)
    } else {
        date.and_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| anyhow!("invalid timestamp or date: {input}"))?;
    Ok(naive.and_utc())
}
