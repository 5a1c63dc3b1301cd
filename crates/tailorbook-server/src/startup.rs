// Opening the store and preparing handler state from a loaded config.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use tailorbook_core::catalog;
use tailorbook_core::config::Config;
use tailorbook_core::Database;

use crate::http::AppState;

/// Open the database, seed the reference catalog when configured to, and
/// wrap the store in handler state.
pub fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let db = Database::open(&config.db_path).context("failed to open database")?;
    info!("Database opened at {}", config.db_path);

    if config.catalog.seed_on_startup {
        let catalog = catalog::load_catalog(&config.catalog.path)
            .context("failed to load measurement catalog")?;
        let report = db
            .seed_catalog(&catalog)
            .context("failed to seed measurement catalog")?;
        info!(
            "Catalog seeded from {}: {} measurements, {} clothing types, {} template rows added",
            config.catalog.path.display(),
            report.measurements,
            report.clothing_types,
            report.templates
        );
    } else {
        info!("Catalog seeding disabled; using existing reference tables");
    }

    Ok(AppState::new(
        Arc::new(db),
        config.catalog.overview_clothing_types,
    ))
}
