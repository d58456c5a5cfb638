//! A patient's tracking session.
//!
//! The session owns one [`RecordStore`] per record kind and keeps them in
//! step with a [`PersistenceProvider`]. Mutations go through `&mut self`, so
//! a session has a single writer; callers sharing it across tasks wrap it in
//! a lock.

use crate::core::bucketing::today_in;
use crate::persistence::{
    encode_record, load_records, LoadOutcome, PersistenceError, PersistenceProvider,
};
use crate::records::store::{RecordStore, StoreError};
use crate::records::types::{Activity, HydrationLog, Meal, Record, RecordId, WeightEntry};
use crate::transparency::{create_shared_log, LogEvent, SharedTransparencyLog};
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Serialize;
use std::sync::Arc;

/// One store per record kind.
#[derive(Debug, Clone, Default)]
pub struct Stores {
    pub activities: RecordStore<Activity>,
    pub hydration: RecordStore<HydrationLog>,
    pub meals: RecordStore<Meal>,
    pub weights: RecordStore<WeightEntry>,
}

impl Stores {
    pub fn new(timezone: Tz) -> Self {
        Self {
            activities: RecordStore::with_timezone(timezone),
            hydration: RecordStore::with_timezone(timezone),
            meals: RecordStore::with_timezone(timezone),
            weights: RecordStore::with_timezone(timezone),
        }
    }
}

/// Record kinds a session tracks, mapped to their store.
pub trait Tracked: Record {
    fn store(stores: &Stores) -> &RecordStore<Self>;
    fn store_mut(stores: &mut Stores) -> &mut RecordStore<Self>;
}

macro_rules! tracked {
    ($record:ty, $field:ident) => {
        impl Tracked for $record {
            fn store(stores: &Stores) -> &RecordStore<Self> {
                &stores.$field
            }

            fn store_mut(stores: &mut Stores) -> &mut RecordStore<Self> {
                &mut stores.$field
            }
        }
    };
}

tracked!(Activity, activities);
tracked!(HydrationLog, hydration);
tracked!(Meal, meals);
tracked!(WeightEntry, weights);

/// How loading one collection went.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionStatus {
    pub collection: &'static str,
    /// Records now held by the store
    pub loaded: usize,
    /// Invalid or duplicate records dropped while loading
    pub dropped: usize,
    /// Why the collection could not be loaded; its store is left empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-collection outcome of [`TrackerSession::load`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    pub collections: Vec<CollectionStatus>,
}

impl LoadReport {
    /// Whether every collection loaded.
    pub fn is_complete(&self) -> bool {
        self.collections.iter().all(|c| c.error.is_none())
    }

    pub fn failures(&self) -> impl Iterator<Item = &CollectionStatus> {
        self.collections.iter().filter(|c| c.error.is_some())
    }
}

/// Session operation errors.
#[derive(Debug)]
pub enum SessionError {
    /// The in-memory store rejected the operation; nothing changed
    Store(StoreError),
    /// The record belongs to a different user
    ForeignRecord { id: RecordId, user_id: String },
    /// The in-memory change was applied but the provider failed to store it
    Sync { id: RecordId, source: PersistenceError },
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Store(e) => write!(f, "{e}"),
            SessionError::ForeignRecord { id, user_id } => {
                write!(f, "Record {id} belongs to user '{user_id}'")
            }
            SessionError::Sync { id, source } => {
                write!(f, "Record {id} changed locally but was not saved: {source}")
            }
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Store(e) => Some(e),
            SessionError::Sync { source, .. } => Some(source),
            SessionError::ForeignRecord { .. } => None,
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(e: StoreError) -> Self {
        SessionError::Store(e)
    }
}

/// A patient's records, kept in sync with a persistence provider.
pub struct TrackerSession {
    user_id: String,
    timezone: Tz,
    provider: Arc<dyn PersistenceProvider>,
    stores: Stores,
    log: SharedTransparencyLog,
}

impl TrackerSession {
    /// Create an empty session. Call [`TrackerSession::load`] to fetch records.
    pub fn new(
        user_id: impl Into<String>,
        timezone: Tz,
        provider: Arc<dyn PersistenceProvider>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            timezone,
            provider,
            stores: Stores::new(timezone),
            log: create_shared_log(),
        }
    }

    /// Count record handling in `log` instead of a private log.
    pub fn with_transparency_log(mut self, log: SharedTransparencyLog) -> Self {
        self.log = log;
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Today's date in the session's timezone.
    pub fn today(&self) -> NaiveDate {
        today_in(self.timezone)
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn store<R: Tracked>(&self) -> &RecordStore<R> {
        R::store(&self.stores)
    }

    pub fn transparency(&self) -> &SharedTransparencyLog {
        &self.log
    }

    /// Replace every store with the provider's contents.
    ///
    /// The four collections are fetched concurrently. A collection that
    /// fails to load leaves its store empty and is reported in the returned
    /// [`LoadReport`]; the others still load.
    pub async fn load(&mut self) -> LoadReport {
        let provider = self.provider.as_ref();
        let user_id = self.user_id.as_str();
        let (activities, hydration, meals, weights) = tokio::join!(
            load_records::<Activity>(provider, user_id),
            load_records::<HydrationLog>(provider, user_id),
            load_records::<Meal>(provider, user_id),
            load_records::<WeightEntry>(provider, user_id),
        );

        let report = LoadReport {
            collections: vec![
                self.apply_load(activities),
                self.apply_load(hydration),
                self.apply_load(meals),
                self.apply_load(weights),
            ],
        };
        tracing::info!(
            user_id = %self.user_id,
            complete = report.is_complete(),
            "session loaded"
        );
        report
    }

    fn apply_load<R: Tracked>(&mut self, outcome: LoadOutcome<R>) -> CollectionStatus {
        let user_id = self.user_id.clone();
        let store = R::store_mut(&mut self.stores);
        match outcome {
            LoadOutcome::Loaded(records) => {
                let (owned, foreign): (Vec<R>, Vec<R>) =
                    records.into_iter().partition(|r| r.user_id() == user_id);
                if !foreign.is_empty() {
                    tracing::warn!(
                        collection = R::COLLECTION,
                        count = foreign.len(),
                        "dropping records owned by another user"
                    );
                }
                let dropped = store.load(owned) + foreign.len();
                CollectionStatus {
                    collection: R::COLLECTION,
                    loaded: store.len(),
                    dropped,
                    error: None,
                }
            }
            LoadOutcome::LoadFailed(e) => {
                tracing::warn!(collection = R::COLLECTION, "collection failed to load: {e}");
                store.load(Vec::new());
                self.log.record(LogEvent::LoadFailed);
                CollectionStatus {
                    collection: R::COLLECTION,
                    loaded: 0,
                    dropped: 0,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Validate and add a record, then store it with the provider.
    pub async fn append<R: Tracked>(&mut self, record: R) -> Result<RecordId, SessionError> {
        self.check_owner(&record)?;
        let id = R::store_mut(&mut self.stores).append(record)?;
        self.log.record(LogEvent::RecordLogged);
        tracing::debug!(collection = R::COLLECTION, %id, "record appended");
        self.sync::<R>(id).await?;
        Ok(id)
    }

    /// Apply `mutator` to a record, then store the result with the provider.
    ///
    /// A mutation that leaves the record invalid is rolled back.
    pub async fn update<R, F>(&mut self, id: RecordId, mutator: F) -> Result<(), SessionError>
    where
        R: Tracked,
        F: FnOnce(&mut R),
    {
        R::store_mut(&mut self.stores).update(id, mutator)?;
        self.log.record(LogEvent::RecordUpdated);
        tracing::debug!(collection = R::COLLECTION, %id, "record updated");
        self.sync::<R>(id).await
    }

    /// Remove a record, then remove it from the provider.
    pub async fn delete<R: Tracked>(&mut self, id: RecordId) -> Result<R, SessionError> {
        let removed = R::store_mut(&mut self.stores).delete(id)?;
        self.log.record(LogEvent::RecordDeleted);
        tracing::debug!(collection = R::COLLECTION, %id, "record deleted");

        if let Err(source) = self
            .provider
            .delete_record(&self.user_id, R::COLLECTION, id)
            .await
        {
            return Err(self.sync_failed(R::COLLECTION, id, source));
        }
        Ok(removed)
    }

    fn check_owner<R: Record>(&self, record: &R) -> Result<(), SessionError> {
        if record.user_id() != self.user_id {
            return Err(SessionError::ForeignRecord {
                id: record.id(),
                user_id: record.user_id().to_string(),
            });
        }
        Ok(())
    }

    async fn sync<R: Tracked>(&self, id: RecordId) -> Result<(), SessionError> {
        let Some(record) = R::store(&self.stores).get(id) else {
            return Ok(());
        };
        let result = match encode_record(record) {
            Ok(document) => {
                self.provider
                    .save_record(&self.user_id, R::COLLECTION, id, document)
                    .await
            }
            Err(e) => Err(e),
        };
        result.map_err(|source| self.sync_failed(R::COLLECTION, id, source))
    }

    fn sync_failed(
        &self,
        collection: &'static str,
        id: RecordId,
        source: PersistenceError,
    ) -> SessionError {
        tracing::warn!(collection, %id, "record not saved: {source}");
        self.log.record(LogEvent::SyncFailed);
        SessionError::Sync { id, source }
    }
}
