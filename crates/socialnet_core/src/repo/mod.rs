//! Repository layer for user and status records.
//!
//! # Responsibility
//! - Enforce existence/uniqueness preconditions before mutating records.
//! - Keep SQL details inside the core persistence boundary.
//! - Log every failed operation at the repository boundary, so a returned
//!   `Err` never needs to be logged again by the caller.
//!
//! # Invariants
//! - Writes call `validate()` on the record before any SQL mutation.
//! - Repositories never cache; every read re-queries the store.
//! - Preconditions are check-then-act and assume a single writer.

pub mod status_repo;
pub mod user_repo;

use crate::db::schema::EntityKind;
use crate::db::DbError;
use crate::model::ModelValidationError;
use log::error;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Failure of a repository operation.
#[derive(Debug)]
pub enum RepoError {
    Validation(ModelValidationError),
    Duplicate { entity: EntityKind, id: String },
    NotFound { entity: EntityKind, id: String },
    /// A status names a user that does not exist.
    OwnerMissing { user_id: String },
    Db(DbError),
}

impl RepoError {
    /// Stable machine-readable code used as `error_code` in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::Duplicate { .. } => "duplicate_id",
            Self::NotFound { .. } => "not_found",
            Self::OwnerMissing { .. } => "owner_missing",
            Self::Db(_) => "db_error",
        }
    }

    /// Whether the failure was a violated precondition rather than a store fault.
    pub fn is_precondition(&self) -> bool {
        !matches!(self, Self::Db(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Duplicate { entity, id } => {
                write!(f, "{} `{id}` already exists", entity.label())
            }
            Self::NotFound { entity, id } => {
                write!(f, "{} `{id}` does not exist", entity.label())
            }
            Self::OwnerMissing { user_id } => {
                write!(f, "owning user `{user_id}` does not exist")
            }
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Logs a failed operation and hands the result back unchanged.
pub(crate) fn logged<T>(
    event: &str,
    entity: EntityKind,
    id: &str,
    result: RepoResult<T>,
) -> RepoResult<T> {
    if let Err(err) = &result {
        error!(
            "event={event} module=repo status=error entity={} id={id} error_code={} error={err}",
            entity.label(),
            err.code()
        );
    }
    result
}
