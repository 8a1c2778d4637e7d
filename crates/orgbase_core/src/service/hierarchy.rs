//! Hierarchical tree use-case service.
//!
//! # Responsibility
//! - Navigate the forest stored behind a [`TreeStore`]: children,
//!   descendants, ancestors.
//! - Guard parent mutations against cycles.
//!
//! # Invariants
//! - The persisted parent graph is a forest; no node is its own ancestor.
//! - A transient node has no children and no descendants.
//! - `set_parent` validates and commits inside one `write_atomically` call;
//!   a rejected move leaves the stored parent unchanged.
//! - Cycle checks run with the candidate parent tentatively applied.

use crate::model::tree_node::{NodeId, TreeNode, TreeNodeValidationError};
use crate::repo::tree_repo::{TreeRepoError, TreeStore};
use log::{info, warn};
use std::collections::{HashSet, VecDeque};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type HierarchyResult<T> = Result<T, HierarchyError>;

/// Errors from hierarchy operations.
#[derive(Debug)]
pub enum HierarchyError {
    /// Assigning `parent` to `node` would close a loop.
    CycleDetected { node: NodeId, parent: NodeId },
    /// Target node does not exist.
    NodeNotFound(NodeId),
    /// Referenced parent does not exist.
    ParentNotFound(NodeId),
    /// Stored parent links already contain a loop through this node.
    CorruptedTree(NodeId),
    /// Record-level validation failure.
    Invalid(TreeNodeValidationError),
    /// Repository-level failure.
    Repo(TreeRepoError),
}

impl Display for HierarchyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CycleDetected { node, parent } => write!(
                f,
                "loop is not allowed: node {node} cannot move under {parent}"
            ),
            Self::NodeNotFound(id) => write!(f, "tree node not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "tree parent not found: {id}"),
            Self::CorruptedTree(id) => write!(f, "stored tree contains a loop at {id}"),
            Self::Invalid(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HierarchyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TreeRepoError> for HierarchyError {
    fn from(value: TreeRepoError) -> Self {
        match value {
            TreeRepoError::NodeNotFound(id) => Self::NodeNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<TreeNodeValidationError> for HierarchyError {
    fn from(value: TreeNodeValidationError) -> Self {
        match value {
            TreeNodeValidationError::SelfParent(id) => Self::CycleDetected {
                node: id,
                parent: id,
            },
            other => Self::Invalid(other),
        }
    }
}

/// Forest navigation and mutation facade.
pub struct Hierarchy<S: TreeStore> {
    store: S,
}

impl<S: TreeStore> Hierarchy<S> {
    /// Creates service from store implementation.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Persists a new node under optional parent.
    pub fn create(
        &self,
        label: impl Into<String>,
        parent: Option<NodeId>,
    ) -> HierarchyResult<TreeNode> {
        let label = label.into();
        let node = TreeNode::new(label.trim()).with_parent(parent);
        node.validate()?;

        self.store.write_atomically(|| {
            if let Some(parent_id) = parent {
                self.require_parent(parent_id)?;
            }
            let node_id = self.store.insert(&node)?;
            self.require_node(node_id)
        })
    }

    /// Loads one node by id.
    pub fn get(&self, node_id: NodeId) -> HierarchyResult<Option<TreeNode>> {
        Ok(self.store.load(node_id)?)
    }

    /// Lists root-level nodes.
    pub fn roots(&self) -> HierarchyResult<Vec<TreeNode>> {
        Ok(self.store.list_roots()?)
    }

    /// Returns nodes whose parent is `node`.
    ///
    /// Always empty for a transient node.
    pub fn children(&self, node: &TreeNode) -> HierarchyResult<Vec<TreeNode>> {
        match node.id {
            Some(node_id) => Ok(self.store.query_by_parent(node_id)?),
            None => Ok(Vec::new()),
        }
    }

    /// Returns every node reachable through child links, without duplicates,
    /// in breadth-first order.
    ///
    /// Recomputed on each call.
    pub fn descendants(&self, node: &TreeNode) -> HierarchyResult<Vec<TreeNode>> {
        match node.id {
            Some(node_id) => self.descendants_of(node_id),
            None => Ok(Vec::new()),
        }
    }

    /// Returns the parent chain, nearest first. Empty for a root.
    pub fn ancestors(&self, node: &TreeNode) -> HierarchyResult<Vec<TreeNode>> {
        let mut chain = Vec::new();
        let mut visited: HashSet<NodeId> = node.id.into_iter().collect();
        let mut cursor = node.parent;

        while let Some(current) = cursor {
            if !visited.insert(current) {
                return Err(HierarchyError::CorruptedTree(current));
            }
            let ancestor = self
                .store
                .load(current)?
                .ok_or(HierarchyError::ParentNotFound(current))?;
            cursor = ancestor.parent;
            chain.push(ancestor);
        }

        Ok(chain)
    }

    /// Fails with `CycleDetected` when `node.parent` is `node` itself or one
    /// of its persisted descendants.
    ///
    /// `node` is expected to carry the *candidate* parent already; the
    /// descendant set is read from the store, which does not yet reflect it.
    pub fn validate_no_cycle(&self, node: &TreeNode) -> HierarchyResult<()> {
        let (Some(node_id), Some(parent_id)) = (node.id, node.parent) else {
            return Ok(());
        };

        let closes_loop = parent_id == node_id
            || self
                .descendants_of(node_id)?
                .iter()
                .any(|descendant| descendant.id == Some(parent_id));
        if closes_loop {
            return Err(HierarchyError::CycleDetected {
                node: node_id,
                parent: parent_id,
            });
        }
        Ok(())
    }

    /// Re-points `node_id` at `new_parent` after a cycle check.
    ///
    /// Returns the node as stored after the move.
    pub fn set_parent(
        &self,
        node_id: NodeId,
        new_parent: Option<NodeId>,
    ) -> HierarchyResult<TreeNode> {
        let result = self.store.write_atomically(|| {
            let mut node = self.require_node(node_id)?;
            if let Some(parent_id) = new_parent {
                if parent_id != node_id {
                    self.require_parent(parent_id)?;
                }
            }

            node.parent = new_parent;
            self.validate_no_cycle(&node)?;
            self.store.update_parent(node_id, new_parent)?;
            self.require_node(node_id)
        });

        match &result {
            Ok(_) => info!(
                "event=tree_move module=hierarchy status=ok node={} parent={}",
                node_id,
                new_parent.map_or_else(|| "root".to_string(), |id| id.to_string())
            ),
            Err(err) => warn!(
                "event=tree_move module=hierarchy status=rejected node={} error={}",
                node_id, err
            ),
        }
        result
    }

    /// Replaces the label of one node.
    pub fn rename(&self, node_id: NodeId, label: impl Into<String>) -> HierarchyResult<()> {
        let label = label.into();
        let renamed = TreeNode::new(label.trim());
        renamed.validate()?;
        self.store.update_label(node_id, &renamed.label)?;
        Ok(())
    }

    /// Deletes `node_id` together with its subtree.
    ///
    /// Returns the number of removed nodes, the node itself included.
    pub fn delete(&self, node_id: NodeId) -> HierarchyResult<usize> {
        let removed = self.store.write_atomically(|| {
            self.require_node(node_id)?;
            let subtree = self.descendants_of(node_id)?.len() + 1;
            self.store.delete(node_id)?;
            Ok::<_, HierarchyError>(subtree)
        })?;

        info!(
            "event=tree_delete module=hierarchy status=ok node={} removed={}",
            node_id, removed
        );
        Ok(removed)
    }

    fn descendants_of(&self, root_id: NodeId) -> HierarchyResult<Vec<TreeNode>> {
        let mut seen = HashSet::from([root_id]);
        let mut worklist = VecDeque::from([root_id]);
        let mut found = Vec::new();

        while let Some(current) = worklist.pop_front() {
            for child in self.store.query_by_parent(current)? {
                let Some(child_id) = child.id else {
                    continue;
                };
                if seen.insert(child_id) {
                    worklist.push_back(child_id);
                    found.push(child);
                }
            }
        }

        Ok(found)
    }

    fn require_node(&self, node_id: NodeId) -> HierarchyResult<TreeNode> {
        self.store
            .load(node_id)?
            .ok_or(HierarchyError::NodeNotFound(node_id))
    }

    fn require_parent(&self, parent_id: NodeId) -> HierarchyResult<()> {
        self.store
            .load(parent_id)?
            .map(|_| ())
            .ok_or(HierarchyError::ParentNotFound(parent_id))
    }
}
