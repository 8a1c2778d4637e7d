//! User → organization follow relationship storage.
//!
//! # Responsibility
//! - Persist the many-to-many follow edge.
//! - Resolve organizations by slug for follow use-cases.
//!
//! # Invariants
//! - One edge per `(user, organization)` pair.
//! - Edges disappear when either endpoint is deleted (`ON DELETE CASCADE`).
//! - Followed organizations are listed by `name ASC, uuid ASC`.

use crate::db::ensure_schema;
use crate::model::organization::{Organization, OrganizationId};
use crate::model::user::{User, UserId};
use crate::repo::organization_repo::{
    find_by_slug, parse_organization_row, ORGANIZATION_SELECT_SQL,
};
use crate::repo::user_repo::{parse_user_row, USER_SELECT_SQL};
use crate::repo::RepoResult;
use rusqlite::{params, Connection};

/// Repository interface for follow edges.
pub trait FollowRepository {
    /// Loads one organization by slug.
    fn organization_by_slug(&self, slug: &str) -> RepoResult<Option<Organization>>;
    /// Returns whether the user row exists.
    fn user_exists(&self, user_id: UserId) -> RepoResult<bool>;
    fn is_following(&self, user_id: UserId, organization_id: OrganizationId) -> RepoResult<bool>;
    /// Adds one edge. Returns `false` when it already existed.
    fn add_follow(&self, user_id: UserId, organization_id: OrganizationId) -> RepoResult<bool>;
    /// Removes one edge. Returns `false` when it did not exist.
    fn remove_follow(&self, user_id: UserId, organization_id: OrganizationId)
        -> RepoResult<bool>;
    fn list_followed(&self, user_id: UserId) -> RepoResult<Vec<Organization>>;
    /// Lists followers ordered by `username ASC`.
    fn list_followers(&self, organization_id: OrganizationId) -> RepoResult<Vec<User>>;
}

/// SQLite-backed follow repository.
pub struct SqliteFollowRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFollowRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(
            conn,
            "user_followed_organizations",
            &["user_uuid", "organization_uuid", "created_at"],
        )?;
        Ok(Self { conn })
    }
}

impl FollowRepository for SqliteFollowRepository<'_> {
    fn organization_by_slug(&self, slug: &str) -> RepoResult<Option<Organization>> {
        find_by_slug(self.conn, slug)
    }

    fn user_exists(&self, user_id: UserId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE uuid = ?1);",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn is_following(&self, user_id: UserId, organization_id: OrganizationId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM user_followed_organizations
                WHERE user_uuid = ?1
                  AND organization_uuid = ?2
            );",
            params![user_id.to_string(), organization_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn add_follow(&self, user_id: UserId, organization_id: OrganizationId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO user_followed_organizations (user_uuid, organization_uuid)
             VALUES (?1, ?2);",
            params![user_id.to_string(), organization_id.to_string()],
        )?;
        Ok(changed == 1)
    }

    fn remove_follow(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM user_followed_organizations
             WHERE user_uuid = ?1
               AND organization_uuid = ?2;",
            params![user_id.to_string(), organization_id.to_string()],
        )?;
        Ok(changed == 1)
    }

    fn list_followed(&self, user_id: UserId) -> RepoResult<Vec<Organization>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ORGANIZATION_SELECT_SQL}
             INNER JOIN user_followed_organizations f ON f.organization_uuid = o.uuid
             WHERE f.user_uuid = ?1
             ORDER BY o.name ASC, o.uuid ASC;"
        ))?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut organizations = Vec::new();
        while let Some(row) = rows.next()? {
            organizations.push(parse_organization_row(row)?);
        }
        Ok(organizations)
    }

    fn list_followers(&self, organization_id: OrganizationId) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL}
             INNER JOIN user_followed_organizations f ON f.user_uuid = u.uuid
             WHERE f.organization_uuid = ?1
             ORDER BY u.username ASC;"
        ))?;
        let mut rows = stmt.query([organization_id.to_string()])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }
}
