//! Hierarchical tree node model.
//!
//! # Responsibility
//! - Define the self-referential record used by the hierarchy service.
//! - Distinguish transient (unsaved) nodes from persisted ones.
//!
//! # Invariants
//! - `id` is `None` until the store assigns an identity on insert.
//! - `parent` never equals `id` for a persisted node.
//! - `label` is non-empty after trim.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable tree node identifier.
pub type NodeId = Uuid;

/// Self-referential tree record.
///
/// Position in the forest is expressed only through `parent`; a node does not
/// own its children, the shared store does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Identity assigned on first successful insert. `None` means transient.
    pub id: Option<NodeId>,
    /// Parent node id. `None` means root.
    pub parent: Option<NodeId>,
    /// User-facing label.
    pub label: String,
    /// Epoch ms creation timestamp, present once persisted.
    pub created_at: Option<i64>,
    /// Epoch ms update timestamp, present once persisted.
    pub updated_at: Option<i64>,
}

impl TreeNode {
    /// Creates a transient root node.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: None,
            parent: None,
            label: label.into(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Returns this node re-pointed at `parent`.
    pub fn with_parent(mut self, parent: Option<NodeId>) -> Self {
        self.parent = parent;
        self
    }

    /// Returns whether this node has not been persisted yet.
    pub fn is_transient(&self) -> bool {
        self.id.is_none()
    }

    /// Returns whether this node has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Validates record-level invariants that do not need the store.
    pub fn validate(&self) -> Result<(), TreeNodeValidationError> {
        if self.label.trim().is_empty() {
            return Err(TreeNodeValidationError::BlankLabel);
        }
        if let (Some(id), Some(parent)) = (self.id, self.parent) {
            if id == parent {
                return Err(TreeNodeValidationError::SelfParent(id));
            }
        }
        Ok(())
    }
}

/// Record-level validation failures for [`TreeNode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNodeValidationError {
    BlankLabel,
    SelfParent(NodeId),
}

impl Display for TreeNodeValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankLabel => write!(f, "tree node label must not be blank"),
            Self::SelfParent(id) => write!(f, "tree node cannot be its own parent: {id}"),
        }
    }
}

impl Error for TreeNodeValidationError {}
