//! Organization domain model.
//!
//! # Responsibility
//! - Define the organization record and its creation input.
//! - Derive URL slugs and logo storage paths.
//!
//! # Invariants
//! - `name` is 1..=50 characters after trim.
//! - `nation` is an uppercase ISO 3166-1 alpha-2 code.
//! - `slug` is unique across organizations and is not regenerated on rename.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

/// Stable organization identifier.
pub type OrganizationId = Uuid;

/// Maximum organization name length in characters.
pub const MAX_NAME_CHARS: usize = 50;
/// Storage directory prefix for organization logos.
pub const LOGO_DIR: &str = "organization/logos/";
/// Slug used when the name has no ASCII alphanumerics.
pub const FALLBACK_SLUG: &str = "organization";

static SLUG_STRIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s-]").expect("valid slug strip regex"));
static SLUG_DASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-\s]+").expect("valid slug dash regex"));
static NATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{2}$").expect("valid nation regex"));

/// Legal form of an organization.
///
/// Persisted and serialized as its integer code, see [`OrgType::code`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum OrgType {
    #[default]
    SoleProprietorship,
    Holding,
    Sme,
    Ngo,
}

impl OrgType {
    /// Integer code stored in `organizations.org_type`.
    pub fn code(self) -> i64 {
        match self {
            Self::SoleProprietorship => 0,
            Self::Holding => 1,
            Self::Sme => 2,
            Self::Ngo => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::SoleProprietorship),
            1 => Some(Self::Holding),
            2 => Some(Self::Sme),
            3 => Some(Self::Ngo),
            _ => None,
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::SoleProprietorship => "Sole proprietorship",
            Self::Holding => "Holding",
            Self::Sme => "Small and medium-sized enterprises",
            Self::Ngo => "Civil society organization",
        }
    }
}

impl From<OrgType> for i64 {
    fn from(value: OrgType) -> Self {
        value.code()
    }
}

impl TryFrom<i64> for OrgType {
    type Error = String;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown org_type code `{code}`"))
    }
}

/// Persisted organization read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub slug: String,
    /// Relative storage path, see [`logo_upload_path`].
    pub logo: Option<String>,
    pub org_type: OrgType,
    pub nation: String,
    pub founding_date: NaiveDate,
    pub headcount: Option<u32>,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

impl Display for Organization {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Creation input for one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrganization {
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub org_type: OrgType,
    pub nation: String,
    pub founding_date: NaiveDate,
    #[serde(default)]
    pub headcount: Option<u32>,
}

impl NewOrganization {
    pub fn new(name: impl Into<String>, nation: impl Into<String>, founding_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            logo: None,
            org_type: OrgType::default(),
            nation: nation.into(),
            founding_date,
            headcount: None,
        }
    }

    /// Returns a copy with trimmed name and uppercased nation, or the first
    /// violated invariant.
    pub fn normalized(&self) -> Result<Self, OrganizationValidationError> {
        let name = normalize_name(&self.name)?;
        let nation = normalize_nation(&self.nation)?;
        Ok(Self {
            name,
            nation,
            ..self.clone()
        })
    }
}

/// Validation failures for organization input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizationValidationError {
    BlankName,
    NameTooLong { chars: usize },
    InvalidNation(String),
}

impl Display for OrganizationValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "organization name must not be blank"),
            Self::NameTooLong { chars } => write!(
                f,
                "organization name has {chars} characters; at most {MAX_NAME_CHARS} allowed"
            ),
            Self::InvalidNation(value) => {
                write!(f, "nation must be an ISO 3166-1 alpha-2 code, got `{value}`")
            }
        }
    }
}

impl Error for OrganizationValidationError {}

/// Trims and length-checks an organization name.
pub fn normalize_name(value: &str) -> Result<String, OrganizationValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(OrganizationValidationError::BlankName);
    }
    let chars = trimmed.chars().count();
    if chars > MAX_NAME_CHARS {
        return Err(OrganizationValidationError::NameTooLong { chars });
    }
    Ok(trimmed.to_string())
}

/// Uppercases and checks a two-letter country code.
pub fn normalize_nation(value: &str) -> Result<String, OrganizationValidationError> {
    let upper = value.trim().to_ascii_uppercase();
    if !NATION_RE.is_match(&upper) {
        return Err(OrganizationValidationError::InvalidNation(value.to_string()));
    }
    Ok(upper)
}

/// Derives the base slug for a name.
///
/// Letters are folded to ASCII through NFKD decomposition; anything without
/// an ASCII base (for example `ı`) is dropped. Punctuation is removed, `_` is
/// kept, and runs of whitespace or `-` become a single `-`.
///
/// Uniqueness suffixes (`-2`, `-3`, ...) are assigned by the repository.
pub fn slugify(name: &str) -> String {
    let ascii: String = name.nfkd().filter(char::is_ascii).collect();
    let lowered = ascii.to_lowercase();
    let stripped = SLUG_STRIP_RE.replace_all(&lowered, "");
    let dashed = SLUG_DASH_RE.replace_all(&stripped, "-");
    let slug = dashed.trim_matches(|c: char| c == '-' || c == '_');
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// Builds a collision-free logo path: `organization/logos/<uuid hex><ext>`.
///
/// The original file name is discarded except for its extension.
pub fn logo_upload_path(filename: &str) -> String {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    format!("{LOGO_DIR}{}{extension}", Uuid::new_v4().simple())
}
