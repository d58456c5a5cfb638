//! Health record types tracked by the progress engine.
//!
//! Every record carries an immutable identity (id, owner, timestamp) in a
//! private [`RecordMeta`] and public domain fields validated at construction.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier assigned to a record when it is created.
pub type RecordId = Uuid;

const KILOGRAMS_PER_POUND: f64 = 0.453_592_37;

/// Identity shared by all record kinds.
///
/// Fields are private so that mutations applied through a store can never
/// change who owns a record or when it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    id: RecordId,
    user_id: String,
    timestamp: DateTime<Utc>,
}

impl RecordMeta {
    /// Create metadata with a freshly generated id.
    pub fn new(user_id: impl Into<String>, timestamp: DateTime<Utc>) -> Result<Self, ValidationError> {
        Self::with_id(Uuid::new_v4(), user_id, timestamp)
    }

    /// Create metadata timestamped now.
    pub fn now(user_id: impl Into<String>) -> Result<Self, ValidationError> {
        Self::new(user_id, Utc::now())
    }

    /// Create metadata with a caller-provided id (import and sync paths).
    pub fn with_id(
        id: RecordId,
        user_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let meta = Self {
            id,
            user_id: user_id.into(),
            timestamp,
        };
        meta.validate()?;
        Ok(meta)
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_nil() {
            return Err(ValidationError::NilId);
        }
        require_non_empty("user_id", &self.user_id)
    }
}

/// Summable quantities a record can contribute to an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Steps,
    ActiveMinutes,
    CaloriesBurned,
    Ounces,
    ProteinGrams,
}

impl Metric {
    /// Wire name of the metric.
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Steps => "steps",
            Metric::ActiveMinutes => "active_minutes",
            Metric::CaloriesBurned => "calories_burned",
            Metric::Ounces => "ounces",
            Metric::ProteinGrams => "protein_grams",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Common behavior of every tracked record kind.
pub trait Record:
    Clone + std::fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Document-store collection holding this kind of record.
    const COLLECTION: &'static str;

    /// Metrics summed by the aggregation engine for this kind.
    const METRICS: &'static [Metric];

    fn meta(&self) -> &RecordMeta;

    /// Value of `metric` for this record, 0 when the kind does not carry it.
    fn metric(&self, metric: Metric) -> f64;

    /// Check domain invariants (non-negative numbers, non-empty strings).
    fn validate(&self) -> Result<(), ValidationError>;

    fn id(&self) -> RecordId {
        self.meta().id()
    }

    fn user_id(&self) -> &str {
        self.meta().user_id()
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.meta().timestamp()
    }
}

/// A logged bout of physical activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(flatten)]
    meta: RecordMeta,
    pub steps: u32,
    pub active_minutes: u32,
    pub calories_burned: u32,
    /// Free-form kind such as "walking" or "physio".
    pub activity_type: String,
}

impl Activity {
    pub fn new(
        meta: RecordMeta,
        steps: u32,
        active_minutes: u32,
        calories_burned: u32,
        activity_type: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let activity = Self {
            meta,
            steps,
            active_minutes,
            calories_burned,
            activity_type: activity_type.into(),
        };
        activity.validate()?;
        Ok(activity)
    }
}

impl Record for Activity {
    const COLLECTION: &'static str = "activities";
    const METRICS: &'static [Metric] = &[
        Metric::Steps,
        Metric::ActiveMinutes,
        Metric::CaloriesBurned,
    ];

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Steps => f64::from(self.steps),
            Metric::ActiveMinutes => f64::from(self.active_minutes),
            Metric::CaloriesBurned => f64::from(self.calories_burned),
            _ => 0.0,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.meta.validate()?;
        require_non_empty("activity_type", &self.activity_type)
    }
}

/// A logged drink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydrationLog {
    #[serde(flatten)]
    meta: RecordMeta,
    pub ounces: f64,
}

impl HydrationLog {
    pub fn new(meta: RecordMeta, ounces: f64) -> Result<Self, ValidationError> {
        let log = Self { meta, ounces };
        log.validate()?;
        Ok(log)
    }
}

impl Record for HydrationLog {
    const COLLECTION: &'static str = "hydration";
    const METRICS: &'static [Metric] = &[Metric::Ounces];

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Ounces => self.ounces,
            _ => 0.0,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.meta.validate()?;
        require_non_negative("ounces", self.ounces)
    }
}

/// A logged meal with its protein content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    #[serde(flatten)]
    meta: RecordMeta,
    pub name: String,
    pub protein_grams: f64,
    /// Reference to a stored photo of the meal, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl Meal {
    pub fn new(
        meta: RecordMeta,
        name: impl Into<String>,
        protein_grams: f64,
        image_ref: Option<String>,
    ) -> Result<Self, ValidationError> {
        let meal = Self {
            meta,
            name: name.into(),
            protein_grams,
            image_ref,
        };
        meal.validate()?;
        Ok(meal)
    }
}

impl Record for Meal {
    const COLLECTION: &'static str = "meals";
    const METRICS: &'static [Metric] = &[Metric::ProteinGrams];

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::ProteinGrams => self.protein_grams,
            _ => 0.0,
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.meta.validate()?;
        require_non_empty("name", &self.name)?;
        require_non_negative("protein_grams", self.protein_grams)
    }
}

/// Unit a weight was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WeightUnit {
    #[default]
    #[serde(rename = "lb")]
    Pounds,
    #[serde(rename = "kg")]
    Kilograms,
}

impl WeightUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            WeightUnit::Pounds => "lb",
            WeightUnit::Kilograms => "kg",
        }
    }

    /// Convert `value` expressed in `self` into `target`.
    pub fn convert(&self, value: f64, target: WeightUnit) -> f64 {
        match (self, target) {
            (WeightUnit::Pounds, WeightUnit::Kilograms) => value * KILOGRAMS_PER_POUND,
            (WeightUnit::Kilograms, WeightUnit::Pounds) => value / KILOGRAMS_PER_POUND,
            _ => value,
        }
    }
}

impl FromStr for WeightUnit {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lb" | "lbs" | "pound" | "pounds" => Ok(WeightUnit::Pounds),
            "kg" | "kgs" | "kilogram" | "kilograms" => Ok(WeightUnit::Kilograms),
            _ => Err(ValidationError::Unparseable {
                field: "unit",
                input: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A body weight measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    #[serde(flatten)]
    meta: RecordMeta,
    pub value: f64,
    pub unit: WeightUnit,
}

impl WeightEntry {
    pub fn new(meta: RecordMeta, value: f64, unit: WeightUnit) -> Result<Self, ValidationError> {
        let entry = Self { meta, value, unit };
        entry.validate()?;
        Ok(entry)
    }

    /// The measurement expressed in `unit`.
    pub fn value_in(&self, unit: WeightUnit) -> f64 {
        self.unit.convert(self.value, unit)
    }
}

impl Record for WeightEntry {
    const COLLECTION: &'static str = "weights";
    // Weights are trended, not summed.
    const METRICS: &'static [Metric] = &[];

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn metric(&self, _metric: Metric) -> f64 {
        0.0
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.meta.validate()?;
        require_positive("value", self.value)
    }
}

/// Rejected record input.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The nil UUID is never a valid record id.
    NilId,
    EmptyField { field: &'static str },
    Negative { field: &'static str, value: f64 },
    NotPositive { field: &'static str, value: f64 },
    NotFinite { field: &'static str },
    Unparseable { field: &'static str, input: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::NilId => write!(f, "record id must not be nil"),
            ValidationError::EmptyField { field } => write!(f, "{field} must not be empty"),
            ValidationError::Negative { field, value } => {
                write!(f, "{field} must not be negative (got {value})")
            }
            ValidationError::NotPositive { field, value } => {
                write!(f, "{field} must be greater than zero (got {value})")
            }
            ValidationError::NotFinite { field } => write!(f, "{field} must be a finite number"),
            ValidationError::Unparseable { field, input } => {
                write!(f, "invalid {field}: '{input}'")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(())
}

pub(crate) fn require_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field });
    }
    if value < 0.0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(())
}

pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field });
    }
    if value <= 0.0 {
        return Err(ValidationError::NotPositive { field, value });
    }
    Ok(())
}
