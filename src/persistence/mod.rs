//! Persistence providers for tracked records.
//!
//! Providers are document stores keyed by user and collection. The core
//! never assumes a particular backend: records travel as JSON documents and
//! are decoded into typed records at the boundary.
//!
//! Load failures are returned to the caller as [`LoadOutcome::LoadFailed`]
//! instead of being swallowed, so the session can decide what to surface.

mod file;
mod memory;
#[cfg(feature = "remote")]
mod remote;

pub use file::JsonFileProvider;
pub use memory::MemoryProvider;
#[cfg(feature = "remote")]
pub use remote::RemoteProvider;

use crate::records::types::{Record, RecordId};
use async_trait::async_trait;

/// A record as stored by a provider.
pub type Document = serde_json::Value;

/// Async document store holding every user's records.
#[async_trait]
pub trait PersistenceProvider: Send + Sync {
    /// Fetch every document of `collection` owned by `user_id`.
    async fn load_collection(
        &self,
        user_id: &str,
        collection: &str,
    ) -> Result<Vec<Document>, PersistenceError>;

    /// Create or replace the document with id `id`.
    async fn save_record(
        &self,
        user_id: &str,
        collection: &str,
        id: RecordId,
        document: Document,
    ) -> Result<(), PersistenceError>;

    /// Remove the document with id `id`. Removing a missing document succeeds.
    async fn delete_record(
        &self,
        user_id: &str,
        collection: &str,
        id: RecordId,
    ) -> Result<(), PersistenceError>;
}

/// Result of loading one typed collection.
#[derive(Debug)]
pub enum LoadOutcome<R> {
    Loaded(Vec<R>),
    LoadFailed(PersistenceError),
}

impl<R> LoadOutcome<R> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded(_))
    }

    /// Records on success, an empty list on failure.
    pub fn into_records(self) -> Vec<R> {
        match self {
            LoadOutcome::Loaded(records) => records,
            LoadOutcome::LoadFailed(_) => Vec::new(),
        }
    }
}

/// Load and decode one collection of `R` for `user_id`.
///
/// Documents that fail to decode are skipped with a warning; the rest of the
/// collection still loads.
pub async fn load_records<R: Record>(
    provider: &dyn PersistenceProvider,
    user_id: &str,
) -> LoadOutcome<R> {
    let documents = match provider.load_collection(user_id, R::COLLECTION).await {
        Ok(documents) => documents,
        Err(e) => return LoadOutcome::LoadFailed(e),
    };

    let mut records = Vec::with_capacity(documents.len());
    for document in documents {
        match serde_json::from_value::<R>(document) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(collection = R::COLLECTION, "skipping undecodable document: {e}");
            }
        }
    }
    LoadOutcome::Loaded(records)
}

/// Encode a record into the document form providers store.
pub fn encode_record<R: Record>(record: &R) -> Result<Document, PersistenceError> {
    serde_json::to_value(record).map_err(|e| PersistenceError::Serialization(e.to_string()))
}

/// Persistence error types.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistenceError {
    /// Local filesystem error
    Io(String),
    /// Document encoding or decoding error
    Serialization(String),
    /// Network/HTTP error
    Network(String),
    /// Remote store returned an error response
    Server { status: u16, message: String },
    /// Provider misconfiguration
    Config(String),
    /// Collection is currently unreachable
    Unavailable { collection: String },
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceError::Io(msg) => write!(f, "Storage IO error: {msg}"),
            PersistenceError::Serialization(msg) => write!(f, "Storage serialization error: {msg}"),
            PersistenceError::Network(msg) => write!(f, "Storage network error: {msg}"),
            PersistenceError::Server { status, message } => {
                write!(f, "Storage server error ({status}): {message}")
            }
            PersistenceError::Config(msg) => write!(f, "Storage config error: {msg}"),
            PersistenceError::Unavailable { collection } => {
                write!(f, "Collection '{collection}' is unavailable")
            }
        }
    }
}

impl std::error::Error for PersistenceError {}

/// Reject ids that cannot be used as a single path or URL segment.
pub(crate) fn check_segment(kind: &str, value: &str) -> Result<(), PersistenceError> {
    let valid = !value.is_empty()
        && value != "."
        && value != ".."
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'));
    if valid {
        Ok(())
    } else {
        Err(PersistenceError::Config(format!("invalid {kind} '{value}'")))
    }
}
