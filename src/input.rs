//! Parsing of free-text numeric input.
//!
//! Every entry point returns a validation error for text that is empty, not a
//! number, negative or non-finite. Nothing is ever defaulted to zero.

use crate::records::types::{ValidationError, WeightUnit};

/// Parse a whole, non-negative count such as steps or minutes.
pub fn parse_count(field: &'static str, text: &str) -> Result<u32, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    if let Some(rest) = trimmed.strip_prefix('-') {
        if let Ok(value) = rest.parse::<f64>() {
            return Err(ValidationError::Negative {
                field,
                value: -value,
            });
        }
    }
    trimmed.replace('_', "").parse().map_err(|_| unparseable(field, text))
}

/// Parse a non-negative decimal quantity such as ounces or grams.
pub fn parse_quantity(field: &'static str, text: &str) -> Result<f64, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    let value: f64 = trimmed.parse().map_err(|_| unparseable(field, text))?;
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field });
    }
    if value < 0.0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(value)
}

/// Parse a weight such as `"182.4"`, `"82 kg"` or `"180lb"`.
///
/// A bare number is taken in `default_unit`.
pub fn parse_weight(
    text: &str,
    default_unit: WeightUnit,
) -> Result<(f64, WeightUnit), ValidationError> {
    let trimmed = text.trim();
    // The unit is the trailing run of letters, so "1e2 kg" keeps its exponent.
    let split = trimmed.trim_end_matches(|c: char| c.is_alphabetic()).len();
    let (number, unit) = trimmed.split_at(split);

    let unit = match unit.trim() {
        "" => default_unit,
        symbol => symbol.parse()?,
    };
    let value = parse_quantity("weight", number)?;
    if value == 0.0 {
        return Err(ValidationError::NotPositive {
            field: "weight",
            value,
        });
    }
    Ok((value, unit))
}

fn unparseable(field: &'static str, text: &str) -> ValidationError {
    ValidationError::Unparseable {
        field,
        input: text.to_string(),
    }
}
