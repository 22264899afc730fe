//! Domain records for user accounts and their status messages.
//!
//! # Invariants
//! - `User::user_id` and `Status::status_id` are immutable primary keys.
//! - A `Status` always names an owning `User`.

pub mod status;
pub mod user;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Field-level validation failure raised before any write reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    EmptyField {
        field: &'static str,
    },
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField { field } => write!(f, "`{field}` must not be empty"),
            Self::TooLong { field, max, actual } => {
                write!(f, "`{field}` is {actual} characters, limit is {max}")
            }
        }
    }
}

impl Error for ModelValidationError {}

pub(crate) fn require_non_empty(
    field: &'static str,
    value: &str,
) -> Result<(), ModelValidationError> {
    if value.is_empty() {
        return Err(ModelValidationError::EmptyField { field });
    }
    Ok(())
}

pub(crate) fn require_max_chars(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ModelValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ModelValidationError::TooLong { field, max, actual });
    }
    Ok(())
}
