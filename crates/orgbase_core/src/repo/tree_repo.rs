//! Tree node storage contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the flat record store the hierarchy service walks.
//! - Keep SQL details and child ordering inside the repository boundary.
//!
//! # Invariants
//! - Child listing is deterministic: insertion order (`rowid ASC`).
//! - Deleting a node removes its whole subtree (`ON DELETE CASCADE`).
//! - `write_atomically` holds SQLite's write lock for the duration of `op`.

use crate::db::{ensure_schema, DbError};
use crate::model::tree_node::{NodeId, TreeNode};
use crate::repo::parse_uuid;
use rusqlite::{params, Connection, Row, Rows, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TREE_SELECT_SQL: &str = "SELECT
    node_uuid,
    parent_uuid,
    label,
    created_at,
    updated_at
FROM tree_nodes";

/// Result type used by tree repository operations.
pub type TreeRepoResult<T> = Result<T, TreeRepoError>;

/// Errors from tree repository operations.
#[derive(Debug)]
pub enum TreeRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target node does not exist.
    NodeNotFound(NodeId),
    /// Insert was called with a node that already carries an identity.
    AlreadyPersisted(NodeId),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for TreeRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NodeNotFound(id) => write!(f, "tree node not found: {id}"),
            Self::AlreadyPersisted(id) => write!(f, "tree node already persisted: {id}"),
            Self::InvalidData(message) => write!(f, "invalid tree data: {message}"),
        }
    }
}

impl Error for TreeRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for TreeRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for TreeRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage collaborator for hierarchical records.
pub trait TreeStore {
    /// Persists a transient node and returns its new identity.
    fn insert(&self, node: &TreeNode) -> TreeRepoResult<NodeId>;
    /// Loads one node by id.
    fn load(&self, node_id: NodeId) -> TreeRepoResult<Option<TreeNode>>;
    /// Points `node_id` at `parent`. No cycle checking happens here.
    fn update_parent(&self, node_id: NodeId, parent: Option<NodeId>) -> TreeRepoResult<()>;
    /// Replaces the label of one node.
    fn update_label(&self, node_id: NodeId, label: &str) -> TreeRepoResult<()>;
    /// Deletes one node and, by cascade, its subtree.
    fn delete(&self, node_id: NodeId) -> TreeRepoResult<()>;
    /// Lists direct children of `parent`.
    fn query_by_parent(&self, parent: NodeId) -> TreeRepoResult<Vec<TreeNode>>;
    /// Lists root-level nodes.
    fn list_roots(&self) -> TreeRepoResult<Vec<TreeNode>>;
    /// Runs `op` as one serialized write; any error rolls every write back.
    fn write_atomically<T, E>(&self, op: impl FnOnce() -> Result<T, E>) -> Result<T, E>
    where
        E: From<TreeRepoError>;
}

/// SQLite-backed tree store.
pub struct SqliteTreeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTreeRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> TreeRepoResult<Self> {
        ensure_schema(
            conn,
            "tree_nodes",
            &["node_uuid", "parent_uuid", "label", "created_at", "updated_at"],
        )?;
        Ok(Self { conn })
    }
}

impl TreeStore for SqliteTreeRepository<'_> {
    fn insert(&self, node: &TreeNode) -> TreeRepoResult<NodeId> {
        if let Some(existing) = node.id {
            return Err(TreeRepoError::AlreadyPersisted(existing));
        }

        let node_id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO tree_nodes (node_uuid, parent_uuid, label)
             VALUES (?1, ?2, ?3);",
            params![
                node_id.to_string(),
                node.parent.map(|value| value.to_string()),
                node.label,
            ],
        )?;
        Ok(node_id)
    }

    fn load(&self, node_id: NodeId) -> TreeRepoResult<Option<TreeNode>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TREE_SELECT_SQL} WHERE node_uuid = ?1;"))?;
        let mut rows = stmt.query([node_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_tree_node_row(row)?));
        }
        Ok(None)
    }

    fn update_parent(&self, node_id: NodeId, parent: Option<NodeId>) -> TreeRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tree_nodes
             SET parent_uuid = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE node_uuid = ?1;",
            params![node_id.to_string(), parent.map(|value| value.to_string())],
        )?;
        if changed == 0 {
            return Err(TreeRepoError::NodeNotFound(node_id));
        }
        Ok(())
    }

    fn update_label(&self, node_id: NodeId, label: &str) -> TreeRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tree_nodes
             SET label = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE node_uuid = ?1;",
            params![node_id.to_string(), label],
        )?;
        if changed == 0 {
            return Err(TreeRepoError::NodeNotFound(node_id));
        }
        Ok(())
    }

    fn delete(&self, node_id: NodeId) -> TreeRepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM tree_nodes WHERE node_uuid = ?1;",
            [node_id.to_string()],
        )?;
        if changed == 0 {
            return Err(TreeRepoError::NodeNotFound(node_id));
        }
        Ok(())
    }

    fn query_by_parent(&self, parent: NodeId) -> TreeRepoResult<Vec<TreeNode>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TREE_SELECT_SQL}
             WHERE parent_uuid = ?1
             ORDER BY rowid ASC;"
        ))?;
        let mut rows = stmt.query([parent.to_string()])?;
        collect_nodes(&mut rows)
    }

    fn list_roots(&self) -> TreeRepoResult<Vec<TreeNode>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TREE_SELECT_SQL}
             WHERE parent_uuid IS NULL
             ORDER BY rowid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        collect_nodes(&mut rows)
    }

    fn write_atomically<T, E>(&self, op: impl FnOnce() -> Result<T, E>) -> Result<T, E>
    where
        E: From<TreeRepoError>,
    {
        // Reserved lock is held from here until commit/rollback.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(TreeRepoError::from)?;
        let value = op()?;
        tx.commit().map_err(TreeRepoError::from)?;
        Ok(value)
    }
}

/// Counts every stored node; used by diagnostics.
pub fn count_nodes(conn: &Connection) -> TreeRepoResult<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM tree_nodes;", [], |row| row.get(0))?;
    Ok(count)
}

fn collect_nodes(rows: &mut Rows<'_>) -> TreeRepoResult<Vec<TreeNode>> {
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_tree_node_row(row)?);
    }
    Ok(items)
}

fn parse_tree_node_row(row: &Row<'_>) -> TreeRepoResult<TreeNode> {
    let node_uuid_text: String = row.get("node_uuid")?;
    let node_id =
        parse_uuid(&node_uuid_text, "tree_nodes.node_uuid").map_err(TreeRepoError::InvalidData)?;
    let parent = row
        .get::<_, Option<String>>("parent_uuid")?
        .map(|value| parse_uuid(&value, "tree_nodes.parent_uuid"))
        .transpose()
        .map_err(TreeRepoError::InvalidData)?;

    Ok(TreeNode {
        id: Some(node_id),
        parent,
        label: row.get("label")?,
        created_at: Some(row.get("created_at")?),
        updated_at: Some(row.get("updated_at")?),
    })
}
