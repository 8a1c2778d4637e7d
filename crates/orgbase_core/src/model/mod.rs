//! Domain model for the organization catalog and hierarchical records.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep input normalization next to the types it guards.
//!
//! # Invariants
//! - Every persisted record is identified by a stable UUID.
//! - Deletion is a hard delete; tree nodes cascade to their subtree.

pub mod organization;
pub mod settings;
pub mod tree_node;
pub mod user;
