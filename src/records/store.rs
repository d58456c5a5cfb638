//! Insertion-ordered, session-owned collection of records for one domain.
//!
//! The store is the in-memory source of truth for a user session. It never
//! talks to persistence itself; the session issues the side effects after a
//! mutation succeeds here.

use crate::core::bucketing::{local_day, TimeRange};
use crate::records::types::{Record, RecordId, ValidationError};
use chrono::NaiveDate;
use chrono_tz::Tz;
use std::collections::HashSet;

/// Errors returned by store mutations.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// A record with this id is already in the store.
    DuplicateId(RecordId),
    NotFound(RecordId),
    InvalidInput(ValidationError),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::DuplicateId(id) => write!(f, "record already exists: {id}"),
            StoreError::NotFound(id) => write!(f, "record not found: {id}"),
            StoreError::InvalidInput(e) => write!(f, "invalid record: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::InvalidInput(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        StoreError::InvalidInput(value)
    }
}

/// Ordered records of one kind, with calendar-day queries in a fixed timezone.
#[derive(Debug, Clone)]
pub struct RecordStore<R: Record> {
    records: Vec<R>,
    timezone: Tz,
}

impl<R: Record> RecordStore<R> {
    /// Create an empty store that resolves calendar days in UTC.
    pub fn new() -> Self {
        Self::with_timezone(Tz::UTC)
    }

    /// Create an empty store that resolves calendar days in `timezone`.
    pub fn with_timezone(timezone: Tz) -> Self {
        Self {
            records: Vec::new(),
            timezone,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Replace the contents with a bulk load from persistence.
    ///
    /// Invalid records and repeated ids are dropped (first occurrence wins).
    /// Returns the number of records that were dropped.
    pub fn load(&mut self, records: Vec<R>) -> usize {
        let mut seen = HashSet::with_capacity(records.len());
        let mut kept = Vec::with_capacity(records.len());
        let mut dropped = 0;

        for record in records {
            if let Err(e) = record.validate() {
                tracing::warn!(
                    collection = R::COLLECTION,
                    id = %record.id(),
                    "dropping invalid record on load: {e}"
                );
                dropped += 1;
                continue;
            }
            if !seen.insert(record.id()) {
                tracing::warn!(
                    collection = R::COLLECTION,
                    id = %record.id(),
                    "dropping duplicate record id on load"
                );
                dropped += 1;
                continue;
            }
            kept.push(record);
        }

        self.records = kept;
        dropped
    }

    /// Add a record at the end of the store.
    pub fn append(&mut self, record: R) -> Result<RecordId, StoreError> {
        record.validate()?;
        let id = record.id();
        if self.position(id).is_some() {
            return Err(StoreError::DuplicateId(id));
        }
        self.records.push(record);
        Ok(id)
    }

    /// Mutate a record in place, keeping its position.
    ///
    /// The record is re-validated afterwards; an invalid result is rolled back.
    pub fn update<F>(&mut self, id: RecordId, mutator: F) -> Result<&R, StoreError>
    where
        F: FnOnce(&mut R),
    {
        let index = self.position(id).ok_or(StoreError::NotFound(id))?;
        let original = self.records[index].clone();

        mutator(&mut self.records[index]);

        if let Err(e) = self.records[index].validate() {
            self.records[index] = original;
            return Err(StoreError::InvalidInput(e));
        }
        Ok(&self.records[index])
    }

    /// Remove a record, preserving the order of the rest.
    pub fn delete(&mut self, id: RecordId) -> Result<R, StoreError> {
        let index = self.position(id).ok_or(StoreError::NotFound(id))?;
        Ok(self.records.remove(index))
    }

    pub fn get(&self, id: RecordId) -> Option<&R> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// First record, in store order, logged on `date`.
    pub fn record_on(&self, date: NaiveDate) -> Option<&R> {
        self.records.iter().find(|r| self.day_of(*r) == date)
    }

    /// Records whose calendar day falls inside `range`, in store order.
    pub fn records_in_range(&self, range: &TimeRange) -> Vec<&R> {
        self.records
            .iter()
            .filter(|r| range.contains(self.day_of(*r)))
            .collect()
    }

    /// Calendar day of a record in the store's timezone.
    pub fn day_of(&self, record: &R) -> NaiveDate {
        local_day(record.timestamp(), self.timezone)
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn position(&self, id: RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }
}

impl<R: Record> Default for RecordStore<R> {
    fn default() -> Self {
        Self::new()
    }
}
