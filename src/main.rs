//! Portal Entry Point
//!
//! Opens the catalog database, optionally seeds it, loads the stores and
//! prints the catalog outline.

use std::error::Error;
use std::sync::Arc;

use gov_portal::seed::seed_from_json;
use gov_portal::tree::flatten_with_depth;
use gov_portal::{AppContext, PortalConfig};
use portal_backend::init_db;
use portal_backend::repository::{ServiceRepository, SettingsRepository};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = PortalConfig::from_env()?;
    rolling_logger::init_logger(&config.log_dir, "gov-portal")?;
    rolling_logger::info("Portal starting");

    let db = init_db(&config.db_path)?;
    let services = Arc::new(ServiceRepository::new(db.connection()));
    if let Some(seed) = &config.seed_file {
        seed_from_json(&services, seed).await?;
    }

    let ctx = AppContext::new(
        services,
        Arc::new(SettingsRepository::new(db.connection())),
        config.search,
    );
    if let Err(e) = ctx.reload().await {
        rolling_logger::error(&format!("Initial load failed: {}", e));
        return Err(e.into());
    }

    let settings = ctx.settings.current();
    println!("{}", settings.site_name);
    if let Some(announcement) = &settings.announcement {
        println!("** {} **", announcement);
    }

    let catalog = ctx.catalog.current();
    for (node, depth) in flatten_with_depth(catalog.forest()) {
        let marker = if ctx.can_book(node.id()) { " [book]" } else { "" };
        println!("{}{}{}", "  ".repeat(depth), node.name(), marker);
    }
    log::info!("Listed {} services", catalog.len());

    Ok(())
}
