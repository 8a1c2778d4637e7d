//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repositories accept only migrated connections (checked in `try_new`).
//! - Repository APIs return semantic errors (`*NotFound`) in addition to DB
//!   transport errors.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod follow_repo;
pub mod organization_repo;
pub mod settings_repo;
pub mod tree_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by organization, user, follow and settings stores.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// No organization row for the given id.
    OrganizationNotFound(Uuid),
    /// No user row for the given id.
    UserNotFound(Uuid),
    /// Username is already registered.
    DuplicateUsername(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::OrganizationNotFound(id) => write!(f, "organization not found: {id}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::DuplicateUsername(name) => write!(f, "username already taken: {name}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
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

/// Parses a stored uuid column; the error is the `InvalidData` message.
pub(crate) fn parse_uuid(value: &str, column: &'static str) -> Result<Uuid, String> {
    Uuid::parse_str(value).map_err(|_| format!("invalid uuid `{value}` in {column}"))
}
