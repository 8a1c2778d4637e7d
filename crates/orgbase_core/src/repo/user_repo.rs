//! User repository contracts and SQLite implementation.

use crate::db::ensure_schema;
use crate::model::user::{NewUser, User, UserId};
use crate::repo::{parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

pub(crate) const USER_SELECT_SQL: &str = "SELECT
    u.uuid AS uuid,
    u.username AS username,
    u.email AS email,
    u.first_name AS first_name,
    u.last_name AS last_name,
    u.date_joined AS date_joined
FROM users u";

/// Repository interface for user profile rows.
pub trait UserRepository {
    /// Inserts a normalized user. Fails with `DuplicateUsername` when the
    /// username is taken, including when a concurrent insert wins.
    fn create_user(&self, input: &NewUser) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn get_by_username(&self, username: &str) -> RepoResult<Option<User>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(
            conn,
            "users",
            &[
                "uuid",
                "username",
                "email",
                "first_name",
                "last_name",
                "date_joined",
            ],
        )?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, input: &NewUser) -> RepoResult<User> {
        let id = Uuid::new_v4();
        let inserted = self.conn.execute(
            "INSERT INTO users (uuid, username, email, first_name, last_name)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id.to_string(),
                input.username.as_str(),
                input.email.as_str(),
                input.first_name.as_str(),
                input.last_name.as_str(),
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(RepoError::DuplicateUsername(input.username.clone()));
            }
            Err(err) => return Err(err.into()),
        }

        self.get_user(id)?.ok_or(RepoError::UserNotFound(id))
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        query_one(
            self.conn,
            &format!("{USER_SELECT_SQL} WHERE u.uuid = ?1;"),
            &id.to_string(),
        )
    }

    fn get_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        query_one(
            self.conn,
            &format!("{USER_SELECT_SQL} WHERE u.username = ?1;"),
            username,
        )
    }
}

fn query_one(conn: &Connection, sql: &str, key: &str) -> RepoResult<Option<User>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([key])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_user_row(row)?));
    }
    Ok(None)
}

// `users.username` is the only UNIQUE column a fresh v4 uuid leaves to collide.
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        }
        _ => false,
    }
}

pub(crate) fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let uuid_text: String = row.get("uuid")?;
    Ok(User {
        id: parse_uuid(&uuid_text, "users.uuid").map_err(RepoError::InvalidData)?,
        username: row.get("username")?,
        email: row.get("email")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        date_joined: row.get("date_joined")?,
    })
}
