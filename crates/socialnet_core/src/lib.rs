//! Core data-access layer for the social network store.
//! This crate owns the existence/uniqueness invariants for users and their
//! status messages, and the all-or-nothing bulk import of both.

pub mod db;
pub mod import;
pub mod logging;
pub mod model;
pub mod repo;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use import::{
    load_status_updates, load_users, ImportError, ImportOptions, ImportOutcome, ImportResult,
    ImportSummary,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::status::Status;
pub use model::user::User;
pub use model::ModelValidationError;
pub use repo::status_repo::{SqliteStatusRepository, StatusRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
