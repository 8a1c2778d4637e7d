//! Organization catalog use-case service.
//!
//! # Responsibility
//! - Normalize and validate organization input before persistence.
//! - Resolve organizations by slug for detail/update/delete flows.
//! - Translate raw query parameters into repository filters.

use crate::model::organization::{
    normalize_name, normalize_nation, NewOrganization, OrgType, Organization,
    OrganizationId, OrganizationValidationError,
};
use crate::repo::organization_repo::{OrganizationFilter, OrganizationRepository};
use crate::repo::RepoError;
use chrono::NaiveDate;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from organization service operations.
#[derive(Debug)]
pub enum OrganizationServiceError {
    Invalid(OrganizationValidationError),
    /// No organization with this slug or id.
    NotFound(String),
    Repo(RepoError),
}

impl Display for OrganizationServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "{err}"),
            Self::NotFound(slug) => write!(f, "organization not found: {slug}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for OrganizationServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<OrganizationValidationError> for OrganizationServiceError {
    fn from(value: OrganizationValidationError) -> Self {
        Self::Invalid(value)
    }
}

impl From<RepoError> for OrganizationServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::OrganizationNotFound(id) => Self::NotFound(id.to_string()),
            other => Self::Repo(other),
        }
    }
}

/// Partial update; `None` keeps the stored value.
///
/// `logo` and `headcount` use a nested `Option` so they can be cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationPatch {
    pub name: Option<String>,
    pub logo: Option<Option<String>>,
    pub org_type: Option<OrgType>,
    pub nation: Option<String>,
    pub founding_date: Option<NaiveDate>,
    pub headcount: Option<Option<u32>>,
}

/// Organization service facade.
pub struct OrganizationService<R: OrganizationRepository> {
    repo: R,
}

impl<R: OrganizationRepository> OrganizationService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates input and creates one organization with a fresh slug.
    pub fn create(&self, input: &NewOrganization) -> Result<Organization, OrganizationServiceError> {
        let normalized = input.normalized()?;
        let created = self.repo.create_organization(&normalized)?;
        info!(
            "event=organization_create module=organization status=ok slug={}",
            created.slug
        );
        Ok(created)
    }

    /// Loads one organization by slug.
    pub fn get(&self, slug: &str) -> Result<Organization, OrganizationServiceError> {
        self.repo
            .get_by_slug(slug)?
            .ok_or_else(|| OrganizationServiceError::NotFound(slug.to_string()))
    }

    /// Loads one organization by id.
    pub fn get_by_id(
        &self,
        id: OrganizationId,
    ) -> Result<Organization, OrganizationServiceError> {
        self.repo
            .get_organization(id)?
            .ok_or_else(|| OrganizationServiceError::NotFound(id.to_string()))
    }

    /// Lists organizations matching `filter`, ordered by name.
    pub fn list(
        &self,
        filter: &OrganizationFilter,
    ) -> Result<Vec<Organization>, OrganizationServiceError> {
        Ok(self.repo.list_organizations(filter)?)
    }

    /// Lists organizations using raw query-string pairs.
    pub fn list_from_query<'a, I>(
        &self,
        params: I,
    ) -> Result<Vec<Organization>, OrganizationServiceError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.list(&OrganizationFilter::from_query_params(params))
    }

    /// Applies a partial update. The slug is kept even when the name changes.
    pub fn update(
        &self,
        slug: &str,
        patch: &OrganizationPatch,
    ) -> Result<Organization, OrganizationServiceError> {
        let mut organization = self.get(slug)?;
        if let Some(name) = &patch.name {
            organization.name = normalize_name(name)?;
        }
        if let Some(nation) = &patch.nation {
            organization.nation = normalize_nation(nation)?;
        }
        if let Some(logo) = &patch.logo {
            organization.logo = logo.clone();
        }
        if let Some(org_type) = patch.org_type {
            organization.org_type = org_type;
        }
        if let Some(founding_date) = patch.founding_date {
            organization.founding_date = founding_date;
        }
        if let Some(headcount) = patch.headcount {
            organization.headcount = headcount;
        }

        self.repo.update_organization(&organization)?;
        self.get(slug)
    }

    /// Deletes one organization by slug.
    pub fn delete(&self, slug: &str) -> Result<(), OrganizationServiceError> {
        let organization = self.get(slug)?;
        self.repo.delete_organization(organization.id)?;
        info!(
            "event=organization_delete module=organization status=ok slug={}",
            slug
        );
        Ok(())
    }
}
