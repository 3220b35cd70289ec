// 📐 Field Guards
// Construction-time checks shared by every record family
//
// Each guard returns the value on success so constructors can validate
// and bind in one expression.

use crate::error::ValidationError;

/// Reject empty or whitespace-only strings
pub fn require_non_empty(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::empty_field(field))
    } else {
        Ok(())
    }
}

/// Reject zero, negative and non-finite quantities
pub fn require_positive(field: &str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::not_positive(field, value))
    }
}

/// Integer flavour of [`require_positive`]
pub fn require_positive_int<T>(field: &str, value: T) -> Result<T, ValidationError>
where
    T: Copy + Into<f64>,
{
    require_positive(field, value.into()).map(|_| value)
}

/// Reject negative and non-finite metrics (zero is fine)
pub fn require_non_negative(field: &str, value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::invalid(field, "must be a finite number"));
    }
    if value < 0.0 {
        Err(ValidationError::negative(field, value))
    } else {
        Ok(value)
    }
}

/// Inclusive range check
pub fn require_range(field: &str, value: f64, min: f64, max: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(value)
    } else {
        Err(ValidationError::out_of_range(field, min, max, value))
    }
}

/// Upper-bound check against a record-specific ceiling
pub fn require_at_most(field: &str, value: f64, limit: f64) -> Result<f64, ValidationError> {
    if value > limit {
        Err(ValidationError::exceeds(field, limit, value))
    } else {
        Ok(value)
    }
}
