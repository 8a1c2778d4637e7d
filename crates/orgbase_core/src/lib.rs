//! Core domain logic for orgbase.
//! This crate is the single source of truth for business invariants:
//! hierarchical records with loop prevention, the organization catalog,
//! user follows and singleton settings.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::CoreConfig;
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::organization::{
    logo_upload_path, slugify, NewOrganization, OrgType, Organization, OrganizationId,
    OrganizationValidationError,
};
pub use model::settings::{AppSettings, SETTINGS_ROW_ID};
pub use model::tree_node::{NodeId, TreeNode, TreeNodeValidationError};
pub use model::user::{NewUser, User, UserId, UserValidationError};
pub use repo::follow_repo::{FollowRepository, SqliteFollowRepository};
pub use repo::organization_repo::{
    OrganizationFilter, OrganizationRepository, SqliteOrganizationRepository,
};
pub use repo::settings_repo::{SettingsRepository, SqliteSettingsRepository};
pub use repo::tree_repo::{SqliteTreeRepository, TreeRepoError, TreeRepoResult, TreeStore};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::follow_service::{FollowOutcome, FollowService, FollowServiceError, FollowedList};
pub use service::hierarchy::{Hierarchy, HierarchyError, HierarchyResult};
pub use service::organization_service::{
    OrganizationPatch, OrganizationService, OrganizationServiceError,
};
pub use service::user_service::{UserService, UserServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
