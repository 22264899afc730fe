//! Bulk import of users and statuses from delimited files.
//!
//! # Responsibility
//! - Read a header-first delimited file and feed each row to the matching
//!   repository `add` operation.
//! - Scope the whole file inside one `BEGIN IMMEDIATE` transaction.
//!
//! # Invariants
//! - A row missing any required field (absent or empty) aborts the import
//!   and rolls back every row inserted before it.
//! - Rows rejected by the repository (duplicate id, unknown owner, ...) are
//!   counted as skipped and do not abort the import.
//! - Header names are matched case-insensitively; extra columns are ignored.

use crate::model::status::Status;
use crate::model::user::User;
use crate::repo::status_repo::{SqliteStatusRepository, StatusRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::{RepoError, RepoResult};
use csv::ReaderBuilder;
use log::{error, info};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Columns required in a user import file.
pub const USER_FIELDS: &[&str] = &["user_id", "email", "name", "lastname"];
/// Columns required in a status import file.
pub const STATUS_FIELDS: &[&str] = &["status_id", "user_id", "status_text"];

pub type ImportResult<T> = Result<T, ImportError>;

/// Reader settings for import files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    pub delimiter: u8,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Counts reported by a committed import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub new_count: usize,
    pub skipped_count: usize,
}

/// Result of one import attempt that did not hit a reader or store fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// All rows were processed and the transaction committed.
    Loaded(ImportSummary),
    /// The file could not be opened. Nothing was read.
    SourceUnavailable { path: PathBuf },
    /// A row lacked required fields; nothing from the file was kept.
    Malformed {
        line: u64,
        missing: Vec<&'static str>,
    },
}

impl ImportOutcome {
    /// Returns `(new, skipped)` counts.
    ///
    /// An unavailable source reports `(0, 0)`; malformed input reports `None`.
    pub fn counts(&self) -> Option<(usize, usize)> {
        match self {
            Self::Loaded(summary) => Some((summary.new_count, summary.skipped_count)),
            Self::SourceUnavailable { .. } => Some((0, 0)),
            Self::Malformed { .. } => None,
        }
    }
}

/// Reader or store failure during an import. The transaction is rolled back.
#[derive(Debug)]
pub enum ImportError {
    Read(csv::Error),
    Repo(RepoError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(err) => write!(f, "failed to read import file: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<csv::Error> for ImportError {
    fn from(value: csv::Error) -> Self {
        Self::Read(value)
    }
}

impl From<RepoError> for ImportError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for ImportError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// Imports users from `path`.
pub fn load_users(
    conn: &mut Connection,
    path: impl AsRef<Path>,
    options: &ImportOptions,
) -> ImportResult<ImportOutcome> {
    load_file(conn, path.as_ref(), options, ImportKind::Users)
}

/// Imports status updates from `path`. Statuses whose owner is unknown are
/// skipped.
pub fn load_status_updates(
    conn: &mut Connection,
    path: impl AsRef<Path>,
    options: &ImportOptions,
) -> ImportResult<ImportOutcome> {
    load_file(conn, path.as_ref(), options, ImportKind::Statuses)
}

#[derive(Debug, Clone, Copy)]
enum ImportKind {
    Users,
    Statuses,
}

impl ImportKind {
    fn noun(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Statuses => "statuses",
        }
    }

    fn fields(self) -> &'static [&'static str] {
        match self {
            Self::Users => USER_FIELDS,
            Self::Statuses => STATUS_FIELDS,
        }
    }
}

enum Target<'conn> {
    Users(SqliteUserRepository<'conn>),
    Statuses(SqliteStatusRepository<'conn>),
}

impl<'conn> Target<'conn> {
    fn open(kind: ImportKind, conn: &'conn Connection) -> RepoResult<Self> {
        Ok(match kind {
            ImportKind::Users => Self::Users(SqliteUserRepository::try_new(conn)?),
            ImportKind::Statuses => Self::Statuses(SqliteStatusRepository::try_new(conn)?),
        })
    }

    fn add(&self, row: &BTreeMap<String, &str>) -> RepoResult<()> {
        match self {
            Self::Users(repo) => repo.add_user(&User::new(
                field(row, "user_id"),
                field(row, "email"),
                field(row, "name"),
                field(row, "lastname"),
            )),
            Self::Statuses(repo) => repo.add_status(&Status::new(
                field(row, "status_id"),
                field(row, "user_id"),
                field(row, "status_text"),
            )),
        }
    }
}

fn load_file(
    conn: &mut Connection,
    path: &Path,
    options: &ImportOptions,
    kind: ImportKind,
) -> ImportResult<ImportOutcome> {
    let file = match open_source(path) {
        Ok(file) => file,
        Err(err) => {
            error!(
                "event=import_load module=import status=error kind={} path={} error_code=source_unavailable error={}",
                kind.noun(),
                path.display(),
                err
            );
            return Ok(ImportOutcome::SourceUnavailable {
                path: path.to_path_buf(),
            });
        }
    };

    let result = import_in_transaction(conn, file, options, kind);
    match &result {
        Ok(ImportOutcome::Loaded(summary)) => {
            if summary.skipped_count > 0 {
                info!(
                    "event=import_load module=import status=ok kind={} path={} new_count={} skipped_count={}",
                    kind.noun(),
                    path.display(),
                    summary.new_count,
                    summary.skipped_count
                );
            } else {
                info!(
                    "event=import_load module=import status=ok kind={} path={} new_count={}",
                    kind.noun(),
                    path.display(),
                    summary.new_count
                );
            }
        }
        Ok(ImportOutcome::Malformed { line, missing }) => error!(
            "event=import_load module=import status=error kind={} path={} error_code=malformed_row line={} missing={}",
            kind.noun(),
            path.display(),
            line,
            missing.join(",")
        ),
        Ok(ImportOutcome::SourceUnavailable { .. }) => {}
        Err(err) => error!(
            "event=import_load module=import status=error kind={} path={} error_code=import_failed error={}",
            kind.noun(),
            path.display(),
            err
        ),
    }
    result
}

/// Opens `path` only if it names a regular file; directories and other
/// special files open fine on some platforms but cannot be read as rows.
fn open_source(path: &Path) -> io::Result<File> {
    let file = File::open(path)?;
    if !file.metadata()?.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        ));
    }
    Ok(file)
}

fn import_in_transaction(
    conn: &mut Connection,
    source: impl Read,
    options: &ImportOptions,
    kind: ImportKind,
) -> ImportResult<ImportOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let outcome = feed_rows(&tx, source, options, kind)?;
    // Anything but a clean pass drops `tx`, which rolls the file back.
    if matches!(outcome, ImportOutcome::Loaded(_)) {
        tx.commit()?;
    }
    Ok(outcome)
}

fn feed_rows(
    tx: &Transaction<'_>,
    source: impl Read,
    options: &ImportOptions,
    kind: ImportKind,
) -> ImportResult<ImportOutcome> {
    let target = Target::open(kind, tx)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(options.delimiter)
        .from_reader(source);
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_lowercase).collect();

    let mut summary = ImportSummary::default();
    for record in reader.records() {
        let record = record?;
        let row: BTreeMap<String, &str> = headers.iter().cloned().zip(record.iter()).collect();

        let missing = missing_fields(&row, kind.fields());
        if !missing.is_empty() {
            let line = record.position().map_or(0, |position| position.line());
            error!(
                "event=import_row module=import status=error kind={} line={} error_code=incomplete_row row={:?}",
                kind.noun(),
                line,
                row
            );
            return Ok(ImportOutcome::Malformed { line, missing });
        }

        match target.add(&row) {
            Ok(()) => summary.new_count += 1,
            Err(_) => summary.skipped_count += 1,
        }
    }

    Ok(ImportOutcome::Loaded(summary))
}

fn missing_fields(row: &BTreeMap<String, &str>, required: &[&'static str]) -> Vec<&'static str> {
    required
        .iter()
        .copied()
        .filter(|name| row.get(*name).map_or(true, |value| value.is_empty()))
        .collect()
}

fn field<'row>(row: &BTreeMap<String, &'row str>, name: &str) -> &'row str {
    row.get(name).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{missing_fields, ImportOutcome, ImportSummary, USER_FIELDS};
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    #[test]
    fn missing_fields_reports_absent_and_empty_columns() {
        let row: BTreeMap<String, &str> = [
            ("user_id".to_string(), "u1"),
            ("email".to_string(), ""),
            ("name".to_string(), "Ann"),
        ]
        .into_iter()
        .collect();

        assert_eq!(missing_fields(&row, USER_FIELDS), vec!["email", "lastname"]);
    }

    #[test]
    fn counts_distinguish_unavailable_source_from_malformed_input() {
        let loaded = ImportOutcome::Loaded(ImportSummary {
            new_count: 3,
            skipped_count: 1,
        });
        let unavailable = ImportOutcome::SourceUnavailable {
            path: PathBuf::from("missing.csv"),
        };
        let malformed = ImportOutcome::Malformed {
            line: 4,
            missing: vec!["email"],
        };

        assert_eq!(loaded.counts(), Some((3, 1)));
        assert_eq!(unavailable.counts(), Some((0, 0)));
        assert_eq!(malformed.counts(), None);
    }
}
