// 🚨 Error Taxonomy
// Validation, lookup and lifecycle failures surfaced to the immediate caller
//
// Nothing is retried or silently corrected: every constructor, mutator and
// session transition returns one of these and leaves state untouched.

use thiserror::Error;

// ============================================================================
// VALIDATION ERRORS
// ============================================================================

/// Invariant violated while constructing or mutating a record.
///
/// Every variant names the offending field so callers can report it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("field '{field}' must be > 0, got {actual}")]
    NotPositive { field: String, actual: f64 },

    #[error("field '{field}' cannot be negative, got {actual}")]
    Negative { field: String, actual: f64 },

    #[error("field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        actual: f64,
    },

    #[error("field '{field}' cannot exceed {limit}, got {actual}")]
    Exceeds {
        field: String,
        limit: f64,
        actual: f64,
    },

    #[error("field '{field}' is invalid: {reason}")]
    Invalid { field: String, reason: String },
}

impl ValidationError {
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    pub fn not_positive(field: impl Into<String>, actual: f64) -> Self {
        ValidationError::NotPositive {
            field: field.into(),
            actual,
        }
    }

    pub fn negative(field: impl Into<String>, actual: f64) -> Self {
        ValidationError::Negative {
            field: field.into(),
            actual,
        }
    }

    pub fn out_of_range(field: impl Into<String>, min: f64, max: f64, actual: f64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    pub fn exceeds(field: impl Into<String>, limit: f64, actual: f64) -> Self {
        ValidationError::Exceeds {
            field: field.into(),
            limit,
            actual,
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Name of the field that failed validation
    pub fn field(&self) -> &str {
        match self {
            ValidationError::EmptyField { field }
            | ValidationError::NotPositive { field, .. }
            | ValidationError::Negative { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::Exceeds { field, .. }
            | ValidationError::Invalid { field, .. } => field,
        }
    }
}

// ============================================================================
// STATE ERRORS
// ============================================================================

/// Session transition attempted out of order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("session {session} is already closed")]
    AlreadyClosed { session: String },

    #[error("session {session} is still open")]
    NotClosed { session: String },

    #[error("record {record} is already engaged by open session {session}")]
    RecordEngaged { record: String, session: String },

    #[error("{operation} not allowed: {reason}")]
    NotAllowed { operation: String, reason: String },
}

// ============================================================================
// REGISTRY ERROR
// ============================================================================

/// Umbrella error for registry and session operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("{kind} not found: {key}")]
    NotFound { kind: String, key: String },

    #[error("{kind} with key {key} already present")]
    DuplicateKey { kind: String, key: String },
}

impl RegistryError {
    pub fn not_found(kind: impl Into<String>, key: impl std::fmt::Display) -> Self {
        RegistryError::NotFound {
            kind: kind.into(),
            key: key.to_string(),
        }
    }

    pub fn duplicate(kind: impl Into<String>, key: impl std::fmt::Display) -> Self {
        RegistryError::DuplicateKey {
            kind: kind.into(),
            key: key.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, RegistryError::Validation(_))
    }

    pub fn is_state(&self) -> bool {
        matches!(self, RegistryError::State(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound { .. })
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_names_field() {
        let err = ValidationError::not_positive("tank_capacity", 0.0);
        assert_eq!(err.field(), "tank_capacity");
        assert_eq!(err.to_string(), "field 'tank_capacity' must be > 0, got 0");
    }

    #[test]
    fn test_registry_error_from_validation() {
        let err: RegistryError = ValidationError::empty_field("plate").into();
        assert!(err.is_validation());
        assert!(!err.is_state());
        assert_eq!(err.to_string(), "field 'plate' cannot be empty");
    }

    #[test]
    fn test_state_error_display() {
        let err: RegistryError = StateError::AlreadyClosed {
            session: "abc".to_string(),
        }
        .into();
        assert!(err.is_state());
        assert_eq!(err.to_string(), "session abc is already closed");
    }

    #[test]
    fn test_not_found_display() {
        let err = RegistryError::not_found("vehicle", 42);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "vehicle not found: 42");
    }
}
