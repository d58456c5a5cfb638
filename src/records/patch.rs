//! Partial edits to existing records.
//!
//! A patch names only the domain fields to change. Identity and timestamp
//! are not editable. The store re-validates the record after a patch is
//! applied and rolls it back if the result is invalid.

use super::types::{Activity, HydrationLog, Meal, WeightEntry, WeightUnit};
use serde::Deserialize;

/// A set of field changes for one record kind.
pub trait Patch<R> {
    /// Overwrite the named fields of `record`.
    fn apply(self, record: &mut R);

    /// True if the patch changes nothing.
    fn is_empty(&self) -> bool;
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActivityPatch {
    pub steps: Option<u32>,
    pub active_minutes: Option<u32>,
    pub calories_burned: Option<u32>,
    pub activity_type: Option<String>,
}

impl Patch<Activity> for ActivityPatch {
    fn apply(self, record: &mut Activity) {
        if let Some(steps) = self.steps {
            record.steps = steps;
        }
        if let Some(minutes) = self.active_minutes {
            record.active_minutes = minutes;
        }
        if let Some(calories) = self.calories_burned {
            record.calories_burned = calories;
        }
        if let Some(kind) = self.activity_type {
            record.activity_type = kind;
        }
    }

    fn is_empty(&self) -> bool {
        self.steps.is_none()
            && self.active_minutes.is_none()
            && self.calories_burned.is_none()
            && self.activity_type.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HydrationPatch {
    pub ounces: Option<f64>,
}

impl Patch<HydrationLog> for HydrationPatch {
    fn apply(self, record: &mut HydrationLog) {
        if let Some(ounces) = self.ounces {
            record.ounces = ounces;
        }
    }

    fn is_empty(&self) -> bool {
        self.ounces.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MealPatch {
    pub name: Option<String>,
    pub protein_grams: Option<f64>,
    pub image_ref: Option<String>,
}

impl Patch<Meal> for MealPatch {
    fn apply(self, record: &mut Meal) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(protein) = self.protein_grams {
            record.protein_grams = protein;
        }
        if let Some(image) = self.image_ref {
            record.image_ref = Some(image);
        }
    }

    fn is_empty(&self) -> bool {
        self.name.is_none() && self.protein_grams.is_none() && self.image_ref.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightPatch {
    pub value: Option<f64>,
    pub unit: Option<WeightUnit>,
}

impl Patch<WeightEntry> for WeightPatch {
    fn apply(self, record: &mut WeightEntry) {
        if let Some(value) = self.value {
            record.value = value;
        }
        if let Some(unit) = self.unit {
            record.unit = unit;
        }
    }

    fn is_empty(&self) -> bool {
        self.value.is_none() && self.unit.is_none()
    }
}
