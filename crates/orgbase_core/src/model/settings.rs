//! Application-wide singleton settings.
//!
//! Exactly one row exists, addressed by [`SETTINGS_ROW_ID`]. Callers go
//! through `SettingsRepository::load`, which creates the row on first use.

use serde::{Deserialize, Serialize};

/// Well-known primary key of the settings row.
pub const SETTINGS_ROW_ID: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    pub site_name: String,
    /// When `false`, user registration is refused.
    pub registration_open: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            site_name: "orgbase".to_string(),
            registration_open: true,
        }
    }
}
