//! Follow/unfollow use-case service.
//!
//! # Responsibility
//! - Resolve organizations by slug and toggle the follow edge.
//! - Report duplicate follows and missing follows as distinct errors.

use crate::model::organization::Organization;
use crate::model::user::{User, UserId};
use crate::repo::follow_repo::FollowRepository;
use crate::repo::RepoError;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum FollowServiceError {
    OrganizationNotFound(String),
    UserNotFound(UserId),
    /// Carries the organization name.
    AlreadyFollowing(String),
    /// Carries the organization name.
    NotFollowing(String),
    Repo(RepoError),
}

impl Display for FollowServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OrganizationNotFound(slug) => write!(f, "organization not found: {slug}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::AlreadyFollowing(name) => write!(f, "You are already following {name}"),
            Self::NotFollowing(name) => write!(f, "You are not following {name}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FollowServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for FollowServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::UserNotFound(id) => Self::UserNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Successful follow-state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowOutcome {
    Followed(Organization),
    Unfollowed(Organization),
}

impl FollowOutcome {
    /// User-facing confirmation line.
    pub fn detail(&self) -> String {
        match self {
            Self::Followed(organization) => format!("Followed {}", organization.name),
            Self::Unfollowed(organization) => format!("Unfollowed {}", organization.name),
        }
    }
}

/// Followed-organizations envelope, serialized as `{count, results}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FollowedList {
    pub count: usize,
    /// Sorted by `name ASC`.
    pub results: Vec<Organization>,
}

/// Follow relationship facade.
pub struct FollowService<R: FollowRepository> {
    repo: R,
}

impl<R: FollowRepository> FollowService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Adds `slug` to the user's followed organizations.
    pub fn follow(&self, user_id: UserId, slug: &str) -> Result<FollowOutcome, FollowServiceError> {
        let organization = self.resolve(user_id, slug)?;
        if !self.repo.add_follow(user_id, organization.id)? {
            return Err(FollowServiceError::AlreadyFollowing(organization.name));
        }
        Ok(FollowOutcome::Followed(organization))
    }

    /// Removes `slug` from the user's followed organizations.
    pub fn unfollow(
        &self,
        user_id: UserId,
        slug: &str,
    ) -> Result<FollowOutcome, FollowServiceError> {
        let organization = self.resolve(user_id, slug)?;
        if !self.repo.remove_follow(user_id, organization.id)? {
            return Err(FollowServiceError::NotFollowing(organization.name));
        }
        Ok(FollowOutcome::Unfollowed(organization))
    }

    pub fn is_following(&self, user_id: UserId, slug: &str) -> Result<bool, FollowServiceError> {
        let organization = self.resolve(user_id, slug)?;
        Ok(self.repo.is_following(user_id, organization.id)?)
    }

    /// Lists organizations followed by the user.
    pub fn followed(&self, user_id: UserId) -> Result<FollowedList, FollowServiceError> {
        self.ensure_user(user_id)?;
        let results = self.repo.list_followed(user_id)?;
        Ok(FollowedList {
            count: results.len(),
            results,
        })
    }

    /// Lists users following `slug`.
    pub fn followers(&self, slug: &str) -> Result<Vec<User>, FollowServiceError> {
        let organization = self
            .repo
            .organization_by_slug(slug)?
            .ok_or_else(|| FollowServiceError::OrganizationNotFound(slug.to_string()))?;
        Ok(self.repo.list_followers(organization.id)?)
    }

    fn resolve(&self, user_id: UserId, slug: &str) -> Result<Organization, FollowServiceError> {
        self.ensure_user(user_id)?;
        self.repo
            .organization_by_slug(slug)?
            .ok_or_else(|| FollowServiceError::OrganizationNotFound(slug.to_string()))
    }

    fn ensure_user(&self, user_id: UserId) -> Result<(), FollowServiceError> {
        if !self.repo.user_exists(user_id)? {
            return Err(FollowServiceError::UserNotFound(user_id));
        }
        Ok(())
    }
}
