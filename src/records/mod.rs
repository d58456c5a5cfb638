//! Tracked record kinds and their in-memory store.

pub mod patch;
pub mod store;
pub mod types;

pub use patch::{ActivityPatch, HydrationPatch, MealPatch, Patch, WeightPatch};
pub use store::{RecordStore, StoreError};
pub use types::{
    Activity, HydrationLog, Meal, Metric, Record, RecordId, RecordMeta, ValidationError,
    WeightEntry, WeightUnit,
};
