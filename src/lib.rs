//! Synheart Progress - progress aggregation and streak engine for health tracking.
//!
//! This library turns a patient's logged activities, hydration, meals and
//! weights into period summaries, activity streaks and motivational feedback.
//!
//! # Privacy Guarantees
//!
//! - **Local computation**: Summaries and streaks are computed on-device
//! - **Owner-scoped**: A session only ever reads and writes one user's records
//! - **Explicit storage**: Records go only to the configured provider
//! - **Transparency**: All record handling is counted and auditable
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Synheart Progress                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐        │
//! │  │ Persistence │──▶│   Session   │──▶│ Aggregation │        │
//! │  │  Provider   │◀──│  (stores)   │   │   Streaks   │        │
//! │  └─────────────┘   └─────────────┘   └─────────────┘        │
//! │                           │                 │               │
//! │                           ▼                 ▼               │
//! │                    ┌─────────────┐   ┌─────────────┐        │
//! │                    │Transparency │   │  Progress   │        │
//! │                    │    Log      │   │  Snapshot   │        │
//! │                    └─────────────┘   └─────────────┘        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use synheart_progress::{core, persistence::MemoryProvider, session::TrackerSession};
//!
//! # async fn example() {
//! let provider = Arc::new(MemoryProvider::new());
//! let mut session = TrackerSession::new("patient-1", chrono_tz::UTC, provider);
//! let report = session.load().await;
//! assert!(report.is_complete());
//!
//! let snapshot = core::ProgressBuilder::default().build(
//!     &session,
//!     core::RangeMode::Week,
//!     session.today(),
//! );
//! println!("{}", snapshot.message);
//! # }
//! ```

pub mod config;
pub mod core;
pub mod input;
pub mod persistence;
pub mod records;
pub mod session;
pub mod transparency;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use config::{Config, Goals};
pub use core::{Advice, AggregateResult, ProgressBuilder, ProgressSnapshot, RangeMode, TimeRange};
pub use persistence::{LoadOutcome, PersistenceError, PersistenceProvider};
pub use records::{
    Activity, HydrationLog, Meal, RecordStore, StoreError, ValidationError, WeightEntry,
};
pub use session::{LoadReport, SessionError, TrackerSession};
pub use transparency::{LogEvent, SharedTransparencyLog, TransparencyLog, TransparencyStats};

#[cfg(feature = "remote")]
pub use persistence::RemoteProvider;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Privacy declaration that can be displayed to users.
pub const PRIVACY_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║             SYNHEART PROGRESS - PRIVACY DECLARATION              ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This tracker summarizes the health data you choose to log.      ║
║                                                                  ║
║  ✓ WHAT WE STORE:                                                ║
║    • Activities you log (steps, minutes, calories, type)         ║
║    • Water intake, meals with protein, and weigh-ins             ║
║    • When each entry was logged                                  ║
║                                                                  ║
║  ✗ WHAT WE NEVER DO:                                             ║
║    • Read data from other apps or sensors                        ║
║    • Send records anywhere but your configured storage           ║
║    • Share summaries with third parties                          ║
║    • Keep record contents in the transparency log                ║
║                                                                  ║
║  Summaries, streaks and advice are computed on this device.      ║
║  Deleting an entry removes it from storage as well.              ║
║                                                                  ║
║  You can view record-handling statistics anytime with:           ║
║    synheart-progress status                                      ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
