use crate::auth::AdminAuthService;
use crate::config::GuestbookConfig;
use crate::database::Database;
use anyhow::Result;
use std::fs;

pub struct BootstrapResources {
    pub directories_created: Vec<String>,
    pub database_initialized: bool,
    pub credentials_seeded: bool,
    pub database: Database,
}

/// Prepares everything the server needs before it starts listening: the
/// data directory, the database with its schema, and the seed admin
/// account. Failures surface here instead of on the first request.
pub fn initialize(config: &GuestbookConfig) -> Result<BootstrapResources> {
    let mut directories_created = Vec::new();
    create_dir_if_missing(&config.paths.data_dir, &mut directories_created)?;

    let database = Database::connect(&config.paths)?;
    let database_initialized = database.ensure_migrations()?;

    let auth = AdminAuthService::new(database.clone(), config.admin.clone());
    let credentials_seeded = auth.seed_credentials()?;

    Ok(BootstrapResources {
        directories_created,
        database_initialized,
        credentials_seeded,
        database,
    })
}

fn create_dir_if_missing(path: &std::path::Path, created: &mut Vec<String>) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
        created.push(path.display().to_string());
    }
    Ok(())
}
