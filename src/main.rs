//! Synheart Progress CLI
//!
//! Log health records and review progress, streaks and advice.

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use synheart_progress::{
    config::Config,
    core::{ProgressBuilder, ProgressSnapshot, RangeMode},
    input::{parse_count, parse_quantity, parse_weight},
    persistence::{JsonFileProvider, PersistenceProvider},
    records::{
        Activity, ActivityPatch, HydrationLog, HydrationPatch, Meal, MealPatch, Patch, Record,
        RecordId, RecordMeta, WeightEntry, WeightPatch,
    },
    session::{SessionError, Tracked, TrackerSession},
    transparency::{create_shared_log_with_persistence, LogEvent, SharedTransparencyLog},
    PRIVACY_DECLARATION, VERSION,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "synheart-progress")]
#[command(author = "Synheart")]
#[command(version = VERSION)]
#[command(about = "Activity, hydration, nutrition and weight progress tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a new record
    Log {
        #[command(subcommand)]
        entry: LogEntry,
    },

    /// Correct fields of a logged record
    Edit {
        #[command(subcommand)]
        entry: EditEntry,
    },

    /// Delete a record
    Delete {
        /// Collection holding the record (activities, hydration, meals, weights)
        collection: String,

        /// Record id
        id: RecordId,
    },

    /// Show totals, goal progress and advice for a period
    Summary {
        /// Period to summarize (today, week or month)
        #[arg(long, default_value = "week")]
        mode: RangeMode,

        /// Reference date (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Print the full snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the activity streak
    Streak,

    /// Show tracker status
    Status,

    /// Display privacy declaration
    Privacy,

    /// Write a progress snapshot to the export directory
    Export {
        /// Output directory for the snapshot
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Period to export (today, week or month)
        #[arg(long, default_value = "month")]
        mode: RangeMode,
    },

    /// Show configuration
    Config,

    /// Serve progress over HTTP on localhost
    #[cfg(feature = "server")]
    Serve {
        /// Port to bind to (0 for random)
        #[arg(long, default_value = "8787")]
        port: u16,
    },
}

#[derive(Subcommand)]
enum LogEntry {
    /// Log an activity
    Activity {
        /// Activity kind, such as walking or physio
        #[arg(long)]
        kind: String,

        /// Active minutes
        #[arg(long)]
        minutes: String,

        /// Steps taken
        #[arg(long, default_value = "0")]
        steps: String,

        /// Calories burned
        #[arg(long, default_value = "0")]
        calories: String,

        /// When it happened (RFC 3339, defaults to now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Log water intake in ounces
    Water {
        ounces: String,

        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Log a meal
    Meal {
        name: String,

        /// Protein in grams
        #[arg(long, default_value = "0")]
        protein: String,

        /// Reference to a photo of the meal
        #[arg(long)]
        image: Option<String>,

        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Log a weigh-in, such as "182.4" or "82.5 kg"
    Weight {
        value: String,

        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
}

#[derive(Subcommand)]
enum EditEntry {
    /// Edit an activity
    Activity {
        id: RecordId,

        #[arg(long)]
        kind: Option<String>,

        #[arg(long)]
        minutes: Option<String>,

        #[arg(long)]
        steps: Option<String>,

        #[arg(long)]
        calories: Option<String>,
    },

    /// Edit a water entry
    Water {
        id: RecordId,

        #[arg(long)]
        ounces: Option<String>,
    },

    /// Edit a meal
    Meal {
        id: RecordId,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        protein: Option<String>,

        #[arg(long)]
        image: Option<String>,
    },

    /// Edit a weigh-in
    Weight {
        id: RecordId,

        /// New value, such as "181" or "82 kg"
        #[arg(long)]
        value: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("loading configuration")?;

    match cli.command {
        Commands::Log { entry } => cmd_log(&config, entry).await,
        Commands::Edit { entry } => cmd_edit(&config, entry).await,
        Commands::Delete { collection, id } => cmd_delete(&config, &collection, id).await,
        Commands::Summary { mode, date, json } => cmd_summary(&config, mode, date, json).await,
        Commands::Streak => cmd_streak(&config).await,
        Commands::Status => cmd_status(&config).await,
        Commands::Privacy => {
            println!("{PRIVACY_DECLARATION}");
            Ok(())
        }
        Commands::Export { output, mode } => cmd_export(&config, output, mode).await,
        Commands::Config => cmd_config(&config),
        #[cfg(feature = "server")]
        Commands::Serve { port } => cmd_serve(&config, port).await,
    }
}

fn open_provider(config: &Config) -> anyhow::Result<Arc<dyn PersistenceProvider>> {
    #[cfg(feature = "remote")]
    if let Some(remote) = &config.remote {
        let provider = synheart_progress::persistence::RemoteProvider::new(remote.clone())?;
        return Ok(Arc::new(provider));
    }

    #[cfg(not(feature = "remote"))]
    if config.remote.is_some() {
        tracing::warn!("remote storage configured but not compiled in; using local files");
    }

    Ok(Arc::new(JsonFileProvider::new(config.data_path.clone())))
}

/// Open and load the configured user's session.
async fn open_session(config: &Config) -> anyhow::Result<(TrackerSession, SharedTransparencyLog)> {
    config.ensure_directories()?;
    let log = create_shared_log_with_persistence(config.data_path.join("transparency.json"));
    let mut session = TrackerSession::new(config.user_id.clone(), config.tz()?, open_provider(config)?)
        .with_transparency_log(log.clone());

    let report = session.load().await;
    for failure in report.failures() {
        eprintln!(
            "Warning: could not load {}: {}",
            failure.collection,
            failure.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok((session, log))
}

fn save_log(log: &SharedTransparencyLog) {
    if let Err(e) = log.save() {
        eprintln!("Warning: Could not save transparency log: {e}");
    }
}

fn builder(config: &Config) -> ProgressBuilder {
    ProgressBuilder::new(config.goals).with_weight_unit(config.weight_unit)
}

/// Report a mutation result; a sync failure still counts as logged locally.
fn report_mutation(result: Result<RecordId, SessionError>, verb: &str) -> anyhow::Result<()> {
    match result {
        Ok(id) => {
            println!("{verb} {id}");
            Ok(())
        }
        Err(SessionError::Sync { id, source }) => {
            println!("{verb} {id}");
            eprintln!("Warning: the change was not saved to storage: {source}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn cmd_log(config: &Config, entry: LogEntry) -> anyhow::Result<()> {
    let (mut session, log) = open_session(config).await?;
    let user_id = config.user_id.clone();
    let meta = |at: Option<DateTime<Utc>>| RecordMeta::new(user_id.clone(), at.unwrap_or_else(Utc::now));

    let result = match entry {
        LogEntry::Activity {
            kind,
            minutes,
            steps,
            calories,
            at,
        } => {
            let activity = Activity::new(
                meta(at)?,
                parse_count("steps", &steps)?,
                parse_count("active minutes", &minutes)?,
                parse_count("calories", &calories)?,
                kind,
            )?;
            session.append(activity).await
        }
        LogEntry::Water { ounces, at } => {
            let water = HydrationLog::new(meta(at)?, parse_quantity("ounces", &ounces)?)?;
            session.append(water).await
        }
        LogEntry::Meal {
            name,
            protein,
            image,
            at,
        } => {
            let meal = Meal::new(meta(at)?, name, parse_quantity("protein", &protein)?, image)?;
            session.append(meal).await
        }
        LogEntry::Weight { value, at } => {
            let (value, unit) = parse_weight(&value, config.weight_unit)?;
            session.append(WeightEntry::new(meta(at)?, value, unit)?).await
        }
    };

    let outcome = report_mutation(result, "Logged");
    save_log(&log);
    outcome?;

    let snapshot = builder(config).build(&session, RangeMode::Today, session.today());
    println!("{}", snapshot.message);
    Ok(())
}

async fn update_with<R, P>(
    session: &mut TrackerSession,
    id: RecordId,
    patch: P,
) -> anyhow::Result<Result<RecordId, SessionError>>
where
    R: Tracked,
    P: Patch<R>,
{
    if patch.is_empty() {
        anyhow::bail!("nothing to change; pass at least one field to edit");
    }
    Ok(session.update::<R, _>(id, |record| patch.apply(record)).await.map(|_| id))
}

async fn cmd_edit(config: &Config, entry: EditEntry) -> anyhow::Result<()> {
    let (mut session, log) = open_session(config).await?;
    let count = |field, text: Option<String>| text.map(|t| parse_count(field, &t)).transpose();
    let quantity = |field, text: Option<String>| text.map(|t| parse_quantity(field, &t)).transpose();

    let result = match entry {
        EditEntry::Activity {
            id,
            kind,
            minutes,
            steps,
            calories,
        } => {
            let patch = ActivityPatch {
                steps: count("steps", steps)?,
                active_minutes: count("active minutes", minutes)?,
                calories_burned: count("calories", calories)?,
                activity_type: kind,
            };
            update_with::<Activity, _>(&mut session, id, patch).await?
        }
        EditEntry::Water { id, ounces } => {
            let patch = HydrationPatch {
                ounces: quantity("ounces", ounces)?,
            };
            update_with::<HydrationLog, _>(&mut session, id, patch).await?
        }
        EditEntry::Meal {
            id,
            name,
            protein,
            image,
        } => {
            let patch = MealPatch {
                name,
                protein_grams: quantity("protein", protein)?,
                image_ref: image,
            };
            update_with::<Meal, _>(&mut session, id, patch).await?
        }
        EditEntry::Weight { id, value } => {
            let parsed = value
                .map(|v| parse_weight(&v, config.weight_unit))
                .transpose()?;
            let patch = WeightPatch {
                value: parsed.map(|(value, _)| value),
                unit: parsed.map(|(_, unit)| unit),
            };
            update_with::<WeightEntry, _>(&mut session, id, patch).await?
        }
    };

    let outcome = report_mutation(result, "Updated");
    save_log(&log);
    outcome
}

async fn cmd_delete(config: &Config, collection: &str, id: RecordId) -> anyhow::Result<()> {
    let (mut session, log) = open_session(config).await?;

    let result = match collection {
        "activities" => session.delete::<Activity>(id).await.map(|r| r.id()),
        "hydration" => session.delete::<HydrationLog>(id).await.map(|r| r.id()),
        "meals" => session.delete::<Meal>(id).await.map(|r| r.id()),
        "weights" => session.delete::<WeightEntry>(id).await.map(|r| r.id()),
        other => anyhow::bail!(
            "unknown collection '{other}' (expected activities, hydration, meals or weights)"
        ),
    };

    let outcome = report_mutation(result, "Deleted");
    save_log(&log);
    outcome
}

async fn cmd_summary(
    config: &Config,
    mode: RangeMode,
    date: Option<NaiveDate>,
    json: bool,
) -> anyhow::Result<()> {
    let (session, _log) = open_session(config).await?;
    let date = date.unwrap_or_else(|| session.today());
    let snapshot = builder(config).build(&session, mode, date);

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_summary(&snapshot);
    }
    Ok(())
}

fn print_summary(snapshot: &ProgressSnapshot) {
    use synheart_progress::records::Metric;

    println!(
        "Progress for {} ({} to {})",
        snapshot.mode, snapshot.range.start, snapshot.range.end
    );
    println!("================================");
    println!();
    println!("Activity:");
    println!("  Steps: {}", snapshot.activity.total(Metric::Steps));
    println!(
        "  Active minutes: {}",
        snapshot.activity.total(Metric::ActiveMinutes)
    );
    println!(
        "  Calories burned: {}",
        snapshot.activity.total(Metric::CaloriesBurned)
    );
    println!("Hydration: {} oz", snapshot.hydration.total(Metric::Ounces));
    println!(
        "Protein: {} g",
        snapshot.nutrition.total(Metric::ProteinGrams)
    );

    if let Some(weight) = &snapshot.weight {
        println!(
            "Weight: {:.1} {} ({:+.1} {} over {} weigh-ins)",
            weight.latest, weight.unit, weight.change, weight.unit, weight.entries
        );
    }

    println!();
    println!("Today ({}):", snapshot.today.date);
    println!(
        "  Active minutes: {} of {} ({:.0}%)",
        snapshot.today.active_minutes,
        snapshot.goals.daily_active_minutes,
        snapshot.today.goal_progress.active_minutes * 100.0
    );
    println!(
        "  Water: {} of {} oz ({:.0}%)",
        snapshot.today.ounces,
        snapshot.goals.daily_ounces,
        snapshot.today.goal_progress.hydration * 100.0
    );
    println!("  Streak: {} day(s)", snapshot.streak.current);
    println!();
    println!("{}", snapshot.message);
}

async fn cmd_streak(config: &Config) -> anyhow::Result<()> {
    let (session, _log) = open_session(config).await?;
    let snapshot = builder(config).build(&session, RangeMode::Today, session.today());

    println!("Current streak: {} day(s)", snapshot.streak.current);
    if snapshot.streak.days != snapshot.streak.current {
        if let Some(anchor) = snapshot.streak.anchor {
            println!(
                "Last run: {} day(s), ending {anchor}",
                snapshot.streak.days
            );
        }
    }
    println!(
        "Goal: {} active minutes per day",
        config.goals.daily_active_minutes
    );
    Ok(())
}

async fn cmd_status(config: &Config) -> anyhow::Result<()> {
    let (session, log) = open_session(config).await?;
    let stores = session.stores();

    println!("Synheart Progress Status");
    println!("========================");
    println!();
    println!("User: {}", session.user_id());
    println!("Timezone: {}", session.timezone());
    println!(
        "Storage: {}",
        if config.remote.is_some() {
            "remote"
        } else {
            "local files"
        }
    );
    println!();
    println!("Records:");
    println!("  Activities: {}", stores.activities.len());
    println!("  Hydration logs: {}", stores.hydration.len());
    println!("  Meals: {}", stores.meals.len());
    println!("  Weigh-ins: {}", stores.weights.len());
    println!();
    println!("{}", log.summary());
    save_log(&log);
    Ok(())
}

async fn cmd_export(config: &Config, output: Option<PathBuf>, mode: RangeMode) -> anyhow::Result<()> {
    let (session, log) = open_session(config).await?;
    let export_dir = output.unwrap_or_else(|| config.export_path.clone());
    std::fs::create_dir_all(&export_dir)
        .with_context(|| format!("creating {}", export_dir.display()))?;

    let json = builder(config).build_json(&session, mode, session.today())?;
    let export_path = export_dir.join(format!(
        "progress_{}_{}.json",
        mode,
        Utc::now().format("%Y%m%d_%H%M%S")
    ));
    std::fs::write(&export_path, json)
        .with_context(|| format!("writing {}", export_path.display()))?;

    log.record(LogEvent::SnapshotExported);
    save_log(&log);
    println!("Exported {mode} progress to {export_path:?}");
    Ok(())
}

fn cmd_config(config: &Config) -> anyhow::Result<()> {
    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config.redacted())?);
    Ok(())
}

#[cfg(feature = "server")]
async fn cmd_serve(config: &Config, port: u16) -> anyhow::Result<()> {
    use synheart_progress::server::{run, ServerConfig};

    let (session, log) = open_session(config).await?;
    let server_config = ServerConfig::new(port, config.goals, config.weight_unit);
    let (addr, shutdown_tx) = run(server_config, session).await?;

    println!("Serving progress for {} on http://{addr}", config.user_id);
    println!("Press Ctrl+C to stop");

    tokio::signal::ctrl_c().await?;
    let _ = shutdown_tx.send(());
    save_log(&log);
    println!();
    println!("{}", log.summary());
    Ok(())
}
