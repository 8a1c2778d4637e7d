//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `orgbase_core` linkage.
//! - Open the configured database and print deterministic health lines.

use log::info;
use orgbase_core::db::migrations::latest_version;
use orgbase_core::db::{open_db, open_db_in_memory};
use orgbase_core::repo::tree_repo::count_nodes;
use orgbase_core::{
    init_from_config, CoreConfig, SettingsRepository, SqliteSettingsRepository,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("orgbase error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config = CoreConfig::from_env()?;
    init_from_config(&config)?;

    let conn = match &config.db_path {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let settings = SqliteSettingsRepository::try_new(&conn)?.load()?;
    let nodes = count_nodes(&conn)?;

    println!("orgbase_core ping={}", orgbase_core::ping());
    println!("orgbase_core version={}", orgbase_core::core_version());
    println!("orgbase_core schema_version={}", latest_version());
    println!("orgbase_core site_name={}", settings.site_name);
    println!("orgbase_core tree_nodes={nodes}");

    info!(
        "event=cli_status module=cli status=ok schema_version={} tree_nodes={}",
        latest_version(),
        nodes
    );
    Ok(())
}
