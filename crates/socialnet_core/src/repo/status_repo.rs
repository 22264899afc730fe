//! Status repository contract and SQLite implementation.
//!
//! # Invariants
//! - A status is only inserted when its owning user exists; the check runs
//!   here even when the caller already validated the owner.
//! - `modify_status` changes text only. Statuses never move between users.

use super::user_repo::{SqliteUserRepository, UserRepository};
use super::{logged, RepoError, RepoResult};
use crate::db::schema::{verify_schema, EntityKind, STATUSES_TABLE};
use crate::model::require_max_chars;
use crate::model::status::{Status, STATUS_TEXT_MAX_CHARS};
use log::info;
use rusqlite::{params, Connection, Row};

const STATUS_SELECT_SQL: &str = "SELECT
    status_id,
    user_id,
    status_text
FROM statuses";

/// Repository interface for status CRUD operations.
pub trait StatusRepository {
    /// Inserts a status for an existing user.
    ///
    /// Fails with `Duplicate` for a taken id and `OwnerMissing` when the
    /// owning user does not exist.
    fn add_status(&self, status: &Status) -> RepoResult<()>;
    /// Replaces the text of an existing status.
    fn modify_status(&self, status_id: &str, status_text: &str) -> RepoResult<()>;
    /// Deletes a single status.
    fn delete_status(&self, status_id: &str) -> RepoResult<()>;
    fn search_status(&self, status_id: &str, log: bool) -> RepoResult<Option<Status>>;
    /// Lists the statuses owned by one user, ordered by `status_id`.
    fn list_statuses_for_user(&self, user_id: &str) -> RepoResult<Vec<Status>>;
    fn count_statuses(&self) -> RepoResult<u64>;
}

/// SQLite-backed status repository.
pub struct SqliteStatusRepository<'conn> {
    conn: &'conn Connection,
    users: SqliteUserRepository<'conn>,
}

impl<'conn> SqliteStatusRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let users = SqliteUserRepository::try_new(conn)?;
        verify_schema(conn, &[STATUSES_TABLE])?;
        Ok(Self { conn, users })
    }

    fn find_status(&self, status_id: &str) -> RepoResult<Option<Status>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{STATUS_SELECT_SQL} WHERE status_id = ?1;"))?;
        let mut rows = stmt.query([status_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_status_row(row)?));
        }
        Ok(None)
    }

    fn insert_status(&self, status: &Status) -> RepoResult<()> {
        status.validate()?;
        if self.find_status(&status.status_id)?.is_some() {
            return Err(RepoError::Duplicate {
                entity: EntityKind::Status,
                id: status.status_id.clone(),
            });
        }
        if self
            .users
            .search_user(&status.owner_user_id, false)?
            .is_none()
        {
            return Err(RepoError::OwnerMissing {
                user_id: status.owner_user_id.clone(),
            });
        }

        self.conn.execute(
            "INSERT INTO statuses (
                status_id,
                status_text,
                user_id
            ) VALUES (?1, ?2, ?3);",
            params![
                status.status_id.as_str(),
                status.status_text.as_str(),
                status.owner_user_id.as_str(),
            ],
        )?;
        Ok(())
    }

    fn update_status_text(&self, status_id: &str, status_text: &str) -> RepoResult<()> {
        require_max_chars("status_text", status_text, STATUS_TEXT_MAX_CHARS)?;
        self.require_status(status_id)?;

        let changed = self.conn.execute(
            "UPDATE statuses SET status_text = ?1 WHERE status_id = ?2;",
            params![status_text, status_id],
        )?;
        if changed == 0 {
            return Err(not_found(status_id));
        }
        Ok(())
    }

    fn remove_status(&self, status_id: &str) -> RepoResult<()> {
        self.require_status(status_id)?;

        let changed = self
            .conn
            .execute("DELETE FROM statuses WHERE status_id = ?1;", [status_id])?;
        if changed == 0 {
            return Err(not_found(status_id));
        }
        Ok(())
    }

    fn require_status(&self, status_id: &str) -> RepoResult<()> {
        match self.find_status(status_id)? {
            Some(_) => Ok(()),
            None => Err(not_found(status_id)),
        }
    }

    fn load_for_user(&self, user_id: &str) -> RepoResult<Vec<Status>> {
        let mut stmt = self.conn.prepare(&format!(
            "{STATUS_SELECT_SQL} WHERE user_id = ?1 ORDER BY status_id ASC;"
        ))?;
        let mut rows = stmt.query([user_id])?;
        let mut statuses = Vec::new();
        while let Some(row) = rows.next()? {
            statuses.push(parse_status_row(row)?);
        }
        Ok(statuses)
    }
}

impl StatusRepository for SqliteStatusRepository<'_> {
    fn add_status(&self, status: &Status) -> RepoResult<()> {
        logged(
            "status_add",
            EntityKind::Status,
            &status.status_id,
            self.insert_status(status),
        )
    }

    fn modify_status(&self, status_id: &str, status_text: &str) -> RepoResult<()> {
        logged(
            "status_modify",
            EntityKind::Status,
            status_id,
            self.update_status_text(status_id, status_text),
        )?;
        info!("event=status_modify module=repo status=ok status_id={status_id}");
        Ok(())
    }

    fn delete_status(&self, status_id: &str) -> RepoResult<()> {
        logged(
            "status_delete",
            EntityKind::Status,
            status_id,
            self.remove_status(status_id),
        )?;
        info!("event=status_delete module=repo status=ok status_id={status_id}");
        Ok(())
    }

    fn search_status(&self, status_id: &str, log: bool) -> RepoResult<Option<Status>> {
        let found = logged(
            "status_search",
            EntityKind::Status,
            status_id,
            self.find_status(status_id),
        )?;
        if log {
            let status = if found.is_some() { "found" } else { "not_found" };
            info!("event=status_search module=repo status={status} status_id={status_id}");
        }
        Ok(found)
    }

    fn list_statuses_for_user(&self, user_id: &str) -> RepoResult<Vec<Status>> {
        logged(
            "status_list",
            EntityKind::User,
            user_id,
            self.load_for_user(user_id),
        )
    }

    fn count_statuses(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM statuses;", [], |row| row.get(0))?;
        Ok(count.unsigned_abs())
    }
}

fn parse_status_row(row: &Row<'_>) -> RepoResult<Status> {
    Ok(Status {
        status_id: row.get("status_id")?,
        owner_user_id: row.get("user_id")?,
        status_text: row.get("status_text")?,
    })
}

fn not_found(status_id: &str) -> RepoError {
    RepoError::NotFound {
        entity: EntityKind::Status,
        id: status_id.to_string(),
    }
}
