//! Singleton settings storage.
//!
//! # Invariants
//! - The `app_settings` table holds at most one row, id [`SETTINGS_ROW_ID`]
//!   (also enforced by a `CHECK` constraint).
//! - `load` creates the row with defaults when it is missing.
//! - There is no delete path.

use crate::db::ensure_schema;
use crate::model::settings::{AppSettings, SETTINGS_ROW_ID};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection};

/// Repository interface for the settings singleton.
pub trait SettingsRepository {
    /// Returns the settings row, creating it with defaults on first use.
    fn load(&self) -> RepoResult<AppSettings>;
    /// Writes the settings row.
    fn save(&self, settings: &AppSettings) -> RepoResult<()>;
}

/// SQLite-backed settings repository.
pub struct SqliteSettingsRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSettingsRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(
            conn,
            "app_settings",
            &["id", "site_name", "registration_open", "updated_at"],
        )?;
        Ok(Self { conn })
    }
}

impl SettingsRepository for SqliteSettingsRepository<'_> {
    fn load(&self) -> RepoResult<AppSettings> {
        let defaults = AppSettings::default();
        self.conn.execute(
            "INSERT OR IGNORE INTO app_settings (id, site_name, registration_open)
             VALUES (?1, ?2, ?3);",
            params![
                SETTINGS_ROW_ID,
                defaults.site_name,
                i64::from(defaults.registration_open),
            ],
        )?;

        let (site_name, registration_open): (String, i64) = self.conn.query_row(
            "SELECT site_name, registration_open FROM app_settings WHERE id = ?1;",
            [SETTINGS_ROW_ID],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let registration_open = match registration_open {
            0 => false,
            1 => true,
            other => {
                return Err(RepoError::InvalidData(format!(
                    "invalid registration_open value `{other}` in app_settings.registration_open"
                )));
            }
        };

        Ok(AppSettings {
            site_name,
            registration_open,
        })
    }

    fn save(&self, settings: &AppSettings) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO app_settings (id, site_name, registration_open)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                site_name = excluded.site_name,
                registration_open = excluded.registration_open,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                SETTINGS_ROW_ID,
                settings.site_name.as_str(),
                i64::from(settings.registration_open),
            ],
        )?;
        Ok(())
    }
}
