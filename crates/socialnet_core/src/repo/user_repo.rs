//! User repository contract and SQLite implementation.
//!
//! # Invariants
//! - `user_id` is never rewritten by `modify_user`.
//! - Deleting a user relies on the store's `ON DELETE CASCADE` to remove
//!   the statuses it owns.
//! - Successful `add_user` emits no log line; callers report success.

use super::{logged, RepoError, RepoResult};
use crate::db::schema::{verify_schema, EntityKind, USERS_TABLE};
use crate::model::user::User;
use log::info;
use rusqlite::{params, Connection, Row};

const USER_SELECT_SQL: &str = "SELECT
    user_id,
    user_email,
    user_name,
    user_last_name
FROM users";

/// Repository interface for user CRUD operations.
pub trait UserRepository {
    /// Inserts a new user; fails with `Duplicate` when the id is taken.
    fn add_user(&self, user: &User) -> RepoResult<()>;
    /// Overwrites email and names of an existing user.
    fn modify_user(&self, user: &User) -> RepoResult<()>;
    /// Deletes a user and, through the store, every status it owns.
    fn delete_user(&self, user_id: &str) -> RepoResult<()>;
    /// Looks up one user. `log` controls found/not-found info events.
    fn search_user(&self, user_id: &str, log: bool) -> RepoResult<Option<User>>;
    fn count_users(&self) -> RepoResult<u64>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        verify_schema(conn, &[USERS_TABLE])?;
        Ok(Self { conn })
    }

    fn find_user(&self, user_id: &str) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE user_id = ?1;"))?;
        let mut rows = stmt.query([user_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn insert_user(&self, user: &User) -> RepoResult<()> {
        user.validate()?;
        if self.find_user(&user.user_id)?.is_some() {
            return Err(RepoError::Duplicate {
                entity: EntityKind::User,
                id: user.user_id.clone(),
            });
        }

        self.conn.execute(
            "INSERT INTO users (
                user_id,
                user_email,
                user_name,
                user_last_name
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                user.user_id.as_str(),
                user.email.as_str(),
                user.first_name.as_str(),
                user.last_name.as_str(),
            ],
        )?;
        Ok(())
    }

    fn update_user(&self, user: &User) -> RepoResult<()> {
        user.validate()?;
        self.require_user(&user.user_id)?;

        let changed = self.conn.execute(
            "UPDATE users
             SET
                user_email = ?1,
                user_name = ?2,
                user_last_name = ?3
             WHERE user_id = ?4;",
            params![
                user.email.as_str(),
                user.first_name.as_str(),
                user.last_name.as_str(),
                user.user_id.as_str(),
            ],
        )?;
        if changed == 0 {
            return Err(not_found(&user.user_id));
        }
        Ok(())
    }

    fn remove_user(&self, user_id: &str) -> RepoResult<()> {
        self.require_user(user_id)?;

        let changed = self
            .conn
            .execute("DELETE FROM users WHERE user_id = ?1;", [user_id])?;
        if changed == 0 {
            return Err(not_found(user_id));
        }
        Ok(())
    }

    fn require_user(&self, user_id: &str) -> RepoResult<()> {
        match self.find_user(user_id)? {
            Some(_) => Ok(()),
            None => Err(not_found(user_id)),
        }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn add_user(&self, user: &User) -> RepoResult<()> {
        logged(
            "user_add",
            EntityKind::User,
            &user.user_id,
            self.insert_user(user),
        )
    }

    fn modify_user(&self, user: &User) -> RepoResult<()> {
        logged(
            "user_modify",
            EntityKind::User,
            &user.user_id,
            self.update_user(user),
        )?;
        info!(
            "event=user_modify module=repo status=ok user_id={}",
            user.user_id
        );
        Ok(())
    }

    fn delete_user(&self, user_id: &str) -> RepoResult<()> {
        logged(
            "user_delete",
            EntityKind::User,
            user_id,
            self.remove_user(user_id),
        )?;
        info!("event=user_delete module=repo status=ok user_id={user_id}");
        Ok(())
    }

    fn search_user(&self, user_id: &str, log: bool) -> RepoResult<Option<User>> {
        let found = logged(
            "user_search",
            EntityKind::User,
            user_id,
            self.find_user(user_id),
        )?;
        if log {
            let status = if found.is_some() { "found" } else { "not_found" };
            info!("event=user_search module=repo status={status} user_id={user_id}");
        }
        Ok(found)
    }

    fn count_users(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))?;
        Ok(count.unsigned_abs())
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    Ok(User {
        user_id: row.get("user_id")?,
        email: row.get("user_email")?,
        first_name: row.get("user_name")?,
        last_name: row.get("user_last_name")?,
    })
}

fn not_found(user_id: &str) -> RepoError {
    RepoError::NotFound {
        entity: EntityKind::User,
        id: user_id.to_string(),
    }
}
