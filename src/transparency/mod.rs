//! Transparency module for the progress tracker.
//!
//! Tracks and exposes what the tracker did with the patient's records,
//! supporting user trust and regulatory compliance.

pub mod log;

pub use log::{
    create_shared_log, create_shared_log_with_persistence, LogEvent, SharedTransparencyLog,
    TransparencyLog, TransparencyStats,
};
