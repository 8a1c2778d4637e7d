//! Organization repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and filtered listing over `organizations` storage.
//! - Allocate unique slugs at insert time.
//!
//! # Invariants
//! - Listing is always sorted by `name ASC, uuid ASC`.
//! - Slugs are allocated inside the insert transaction: `base`, `base-2`,
//!   `base-3`, ...
//! - Slugs never change after insert.

use crate::db::ensure_schema;
use crate::model::organization::{
    slugify, NewOrganization, OrgType, Organization, OrganizationId,
};
use crate::repo::{parse_uuid, RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) const ORGANIZATION_SELECT_SQL: &str = "SELECT
    o.uuid AS uuid,
    o.name AS name,
    o.slug AS slug,
    o.logo AS logo,
    o.org_type AS org_type,
    o.nation AS nation,
    o.founding_date AS founding_date,
    o.headcount AS headcount,
    o.created_at AS created_at,
    o.updated_at AS updated_at
FROM organizations o";

/// Filter options for listing organizations.
///
/// Every field is optional; an all-default filter lists everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationFilter {
    /// Case-insensitive substring of `name`.
    pub name: Option<String>,
    /// Accepted `org_type` codes. Empty means no type filter.
    pub org_type_codes: Vec<i64>,
    /// Exact uppercase nation code.
    pub country: Option<String>,
    /// Inclusive lower bound on `founding_date`.
    pub founding_date_from: Option<NaiveDate>,
    /// Inclusive upper bound on `founding_date`.
    pub founding_date_to: Option<NaiveDate>,
    pub headcount_min: Option<i64>,
    pub headcount_max: Option<i64>,
    /// Excludes organizations with unknown headcount.
    pub require_headcount: bool,
}

impl OrganizationFilter {
    /// Builds a filter from raw query-string pairs.
    ///
    /// Parsing is lenient: unknown keys and unparsable values are ignored
    /// rather than rejected. For repeated keys the last value wins. Supplying
    /// either headcount bound, even an unparsable one, still excludes rows
    /// without headcount.
    pub fn from_query_params<'a, I>(params: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut filter = Self::default();
        let mut headcount_supplied = [false, false];

        for (key, value) in params {
            match key {
                "name" => filter.name = non_empty(value).map(str::to_string),
                "org_type" => filter.org_type_codes = parse_code_list(value),
                "country" => filter.country = non_empty(value).map(str::to_uppercase),
                "founding_date_from" => {
                    filter.founding_date_from = non_empty(value).and_then(parse_date)
                }
                "founding_date_to" => {
                    filter.founding_date_to = non_empty(value).and_then(parse_date)
                }
                "headcount_min" => {
                    headcount_supplied[0] = !value.is_empty();
                    filter.headcount_min = value.trim().parse().ok();
                }
                "headcount_max" => {
                    headcount_supplied[1] = !value.is_empty();
                    filter.headcount_max = value.trim().parse().ok();
                }
                _ => {}
            }
        }

        filter.require_headcount = headcount_supplied.iter().any(|supplied| *supplied);
        filter
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn parse_code_list(value: &str) -> Vec<i64> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|part| part.parse().ok())
        .collect()
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Repository interface for organization operations.
pub trait OrganizationRepository {
    /// Inserts a normalized organization and returns the stored row.
    fn create_organization(&self, input: &NewOrganization) -> RepoResult<Organization>;
    fn get_organization(&self, id: OrganizationId) -> RepoResult<Option<Organization>>;
    fn get_by_slug(&self, slug: &str) -> RepoResult<Option<Organization>>;
    fn list_organizations(&self, filter: &OrganizationFilter) -> RepoResult<Vec<Organization>>;
    /// Overwrites mutable fields. `slug` and `created_at` are left untouched.
    fn update_organization(&self, organization: &Organization) -> RepoResult<()>;
    /// Deletes one organization; follow rows cascade.
    fn delete_organization(&self, id: OrganizationId) -> RepoResult<()>;
}

/// SQLite-backed organization repository.
pub struct SqliteOrganizationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOrganizationRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(
            conn,
            "organizations",
            &[
                "uuid",
                "name",
                "slug",
                "logo",
                "org_type",
                "nation",
                "founding_date",
                "headcount",
                "created_at",
                "updated_at",
            ],
        )?;
        Ok(Self { conn })
    }
}

impl OrganizationRepository for SqliteOrganizationRepository<'_> {
    fn create_organization(&self, input: &NewOrganization) -> RepoResult<Organization> {
        let id = uuid::Uuid::new_v4();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let slug = allocate_slug(&tx, &slugify(&input.name))?;
        tx.execute(
            "INSERT INTO organizations (
                uuid,
                name,
                slug,
                logo,
                org_type,
                nation,
                founding_date,
                headcount
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                id.to_string(),
                input.name.as_str(),
                slug,
                input.logo.as_deref(),
                input.org_type.code(),
                input.nation.as_str(),
                input.founding_date.format(DATE_FORMAT).to_string(),
                input.headcount.map(i64::from),
            ],
        )?;
        tx.commit()?;

        self.get_organization(id)?
            .ok_or(RepoError::OrganizationNotFound(id))
    }

    fn get_organization(&self, id: OrganizationId) -> RepoResult<Option<Organization>> {
        query_one(
            self.conn,
            &format!("{ORGANIZATION_SELECT_SQL} WHERE o.uuid = ?1;"),
            &id.to_string(),
        )
    }

    fn get_by_slug(&self, slug: &str) -> RepoResult<Option<Organization>> {
        find_by_slug(self.conn, slug)
    }

    fn list_organizations(&self, filter: &OrganizationFilter) -> RepoResult<Vec<Organization>> {
        let mut sql = format!("{ORGANIZATION_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(name) = &filter.name {
            sql.push_str(" AND instr(lower(o.name), lower(?)) > 0");
            bind_values.push(Value::Text(name.clone()));
        }

        if !filter.org_type_codes.is_empty() {
            let placeholders = vec!["?"; filter.org_type_codes.len()].join(", ");
            sql.push_str(&format!(" AND o.org_type IN ({placeholders})"));
            bind_values.extend(filter.org_type_codes.iter().map(|code| Value::Integer(*code)));
        }

        if let Some(country) = &filter.country {
            sql.push_str(" AND o.nation = ?");
            bind_values.push(Value::Text(country.clone()));
        }

        if let Some(from) = filter.founding_date_from {
            sql.push_str(" AND o.founding_date >= ?");
            bind_values.push(Value::Text(from.format(DATE_FORMAT).to_string()));
        }

        if let Some(to) = filter.founding_date_to {
            sql.push_str(" AND o.founding_date <= ?");
            bind_values.push(Value::Text(to.format(DATE_FORMAT).to_string()));
        }

        if let Some(min) = filter.headcount_min {
            sql.push_str(" AND o.headcount >= ?");
            bind_values.push(Value::Integer(min));
        }

        if let Some(max) = filter.headcount_max {
            sql.push_str(" AND o.headcount <= ?");
            bind_values.push(Value::Integer(max));
        }

        if filter.require_headcount {
            sql.push_str(" AND o.headcount IS NOT NULL");
        }

        sql.push_str(" ORDER BY o.name ASC, o.uuid ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut organizations = Vec::new();
        while let Some(row) = rows.next()? {
            organizations.push(parse_organization_row(row)?);
        }
        Ok(organizations)
    }

    fn update_organization(&self, organization: &Organization) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE organizations
             SET
                name = ?2,
                logo = ?3,
                org_type = ?4,
                nation = ?5,
                founding_date = ?6,
                headcount = ?7,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                organization.id.to_string(),
                organization.name.as_str(),
                organization.logo.as_deref(),
                organization.org_type.code(),
                organization.nation.as_str(),
                organization.founding_date.format(DATE_FORMAT).to_string(),
                organization.headcount.map(i64::from),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::OrganizationNotFound(organization.id));
        }
        Ok(())
    }

    fn delete_organization(&self, id: OrganizationId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM organizations WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::OrganizationNotFound(id));
        }
        Ok(())
    }
}

/// Loads one organization by slug; shared with the follow repository.
pub(crate) fn find_by_slug(conn: &Connection, slug: &str) -> RepoResult<Option<Organization>> {
    query_one(
        conn,
        &format!("{ORGANIZATION_SELECT_SQL} WHERE o.slug = ?1;"),
        slug,
    )
}

fn query_one(conn: &Connection, sql: &str, key: &str) -> RepoResult<Option<Organization>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([key])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_organization_row(row)?));
    }
    Ok(None)
}

fn allocate_slug(conn: &Connection, base: &str) -> RepoResult<String> {
    let mut candidate = base.to_string();
    let mut suffix = 2;
    while slug_taken(conn, &candidate)? {
        candidate = format!("{base}-{suffix}");
        suffix += 1;
    }
    Ok(candidate)
}

fn slug_taken(conn: &Connection, slug: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM organizations WHERE slug = ?1);",
        [slug],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn parse_organization_row(row: &Row<'_>) -> RepoResult<Organization> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text, "organizations.uuid").map_err(RepoError::InvalidData)?;

    let code: i64 = row.get("org_type")?;
    let org_type = OrgType::from_code(code).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid org_type `{code}` in organizations.org_type"))
    })?;

    let date_text: String = row.get("founding_date")?;
    let founding_date = parse_date(&date_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid date `{date_text}` in organizations.founding_date"
        ))
    })?;

    let headcount = row
        .get::<_, Option<i64>>("headcount")?
        .map(|value| {
            u32::try_from(value).map_err(|_| {
                RepoError::InvalidData(format!(
                    "invalid headcount `{value}` in organizations.headcount"
                ))
            })
        })
        .transpose()?;

    Ok(Organization {
        id,
        name: row.get("name")?,
        slug: row.get("slug")?,
        logo: row.get("logo")?,
        org_type,
        nation: row.get("nation")?,
        founding_date,
        headcount,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::OrganizationFilter;
    use chrono::NaiveDate;

    #[test]
    fn from_query_params_parses_all_supported_keys() {
        let filter = OrganizationFilter::from_query_params([
            ("name", "tech"),
            ("org_type", "2, 3"),
            ("country", "tr"),
            ("founding_date_from", "2000-01-01"),
            ("founding_date_to", "2020-12-31"),
            ("headcount_min", "5"),
            ("headcount_max", "100"),
        ]);

        assert_eq!(filter.name.as_deref(), Some("tech"));
        assert_eq!(filter.org_type_codes, vec![2, 3]);
        assert_eq!(filter.country.as_deref(), Some("TR"));
        assert_eq!(filter.founding_date_from, NaiveDate::from_ymd_opt(2000, 1, 1));
        assert_eq!(filter.founding_date_to, NaiveDate::from_ymd_opt(2020, 12, 31));
        assert_eq!(filter.headcount_min, Some(5));
        assert_eq!(filter.headcount_max, Some(100));
        assert!(filter.require_headcount);
    }

    #[test]
    fn from_query_params_ignores_invalid_values() {
        let filter = OrganizationFilter::from_query_params([
            ("name", ""),
            ("org_type", "x,,-1"),
            ("founding_date_from", "01/02/2020"),
            ("headcount_max", "many"),
            ("unknown", "value"),
        ]);

        assert_eq!(filter.name, None);
        assert!(filter.org_type_codes.is_empty());
        assert_eq!(filter.founding_date_from, None);
        assert_eq!(filter.headcount_max, None);
        // An unparsable bound still counts as a headcount filter.
        assert!(filter.require_headcount);
    }

    #[test]
    fn empty_params_produce_default_filter() {
        let filter = OrganizationFilter::from_query_params(std::iter::empty());
        assert_eq!(filter, OrganizationFilter::default());
    }
}
