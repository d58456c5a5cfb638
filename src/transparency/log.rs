//! Record-handling transparency log.
//!
//! Counts what the tracker did with the patient's records without storing
//! any of the records' contents. Counts carry over between runs when the
//! log is given a file to persist to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Something the tracker did that the patient can audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogEvent {
    RecordLogged,
    RecordUpdated,
    RecordDeleted,
    SyncFailed,
    LoadFailed,
    SnapshotExported,
}

const EVENT_COUNT: usize = 6;

impl LogEvent {
    pub const ALL: [LogEvent; EVENT_COUNT] = [
        LogEvent::RecordLogged,
        LogEvent::RecordUpdated,
        LogEvent::RecordDeleted,
        LogEvent::SyncFailed,
        LogEvent::LoadFailed,
        LogEvent::SnapshotExported,
    ];

    fn slot(self) -> usize {
        self as usize
    }

    /// Human-readable label used in the summary.
    pub fn label(self) -> &'static str {
        match self {
            LogEvent::RecordLogged => "Records logged",
            LogEvent::RecordUpdated => "Records updated",
            LogEvent::RecordDeleted => "Records deleted",
            LogEvent::SyncFailed => "Failed syncs",
            LogEvent::LoadFailed => "Failed collection loads",
            LogEvent::SnapshotExported => "Snapshots exported",
        }
    }
}

/// Event counters for the tracker.
#[derive(Debug)]
pub struct TransparencyLog {
    counters: [AtomicU64; EVENT_COUNT],
    session_start: DateTime<Utc>,
    persist_path: Option<PathBuf>,
}

impl TransparencyLog {
    pub fn new() -> Self {
        Self {
            counters: Default::default(),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Log backed by `path`; counts saved there earlier are restored.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        match read_counts(&path) {
            Ok(counts) => {
                for (event, count) in counts {
                    log.counters[event.slot()].store(count, Ordering::Relaxed);
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "ignoring unreadable transparency counts: {e}")
            }
        }
        log.persist_path = Some(path);
        log
    }

    pub fn record(&self, event: LogEvent) {
        self.counters[event.slot()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self, event: LogEvent) -> u64 {
        self.counters[event.slot()].load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> TransparencyStats {
        TransparencyStats {
            records_logged: self.count(LogEvent::RecordLogged),
            records_updated: self.count(LogEvent::RecordUpdated),
            records_deleted: self.count(LogEvent::RecordDeleted),
            sync_failures: self.count(LogEvent::SyncFailed),
            load_failures: self.count(LogEvent::LoadFailed),
            snapshots_exported: self.count(LogEvent::SnapshotExported),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Counts and privacy notes, one per line.
    pub fn summary(&self) -> String {
        let mut lines = vec!["Record Statistics:".to_string()];
        for event in LogEvent::ALL {
            lines.push(format!("- {}: {}", event.label(), self.count(event)));
        }
        lines.push(format!(
            "- Session duration: {} seconds",
            self.stats().session_duration_secs
        ));
        lines.push(String::new());
        lines.push("Privacy Guarantee:".to_string());
        lines.push("- Records are stored only where you configured".to_string());
        lines.push("- Summaries are computed on this device".to_string());
        lines.push("- This log holds counts, never record contents".to_string());
        lines.join("\n")
    }

    /// Write the counts to the persistence file, if there is one.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let Some(path) = &self.persist_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = CountsFile {
            counts: LogEvent::ALL
                .into_iter()
                .map(|event| (event, self.count(event)))
                .collect(),
            last_updated: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(tmp, path)
    }

    pub fn reset(&self) {
        for counter in &self.counters {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for TransparencyLog {
    fn default() -> Self {
        Self::new()
    }
}

fn read_counts(path: &std::path::Path) -> Result<BTreeMap<LogEvent, u64>, std::io::Error> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let content = std::fs::read_to_string(path)?;
    let file: CountsFile = serde_json::from_str(&content).map_err(std::io::Error::other)?;
    Ok(file.counts)
}

/// Snapshot of transparency statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransparencyStats {
    pub records_logged: u64,
    pub records_updated: u64,
    pub records_deleted: u64,
    pub sync_failures: u64,
    pub load_failures: u64,
    pub snapshots_exported: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct CountsFile {
    #[serde(default)]
    counts: BTreeMap<LogEvent, u64>,
    last_updated: DateTime<Utc>,
}

pub type SharedTransparencyLog = Arc<TransparencyLog>;

pub fn create_shared_log() -> SharedTransparencyLog {
    Arc::new(TransparencyLog::new())
}

pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedTransparencyLog {
    Arc::new(TransparencyLog::with_persistence(path))
}
