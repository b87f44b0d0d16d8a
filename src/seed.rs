//! Catalog Seeding
//!
//! Loads an exported list of service records (camelCase JSON array) into the
//! database, keeping ids so parent references survive.

use log::info;
use std::path::Path;
use thiserror::Error;

use portal_backend::domain::DomainError;
use portal_backend::repository::ServiceRepository;

use crate::models::ServiceRecord;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("cannot read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("seed file is not a service list: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

pub fn parse_records(json: &str) -> Result<Vec<ServiceRecord>, SeedError> {
    Ok(serde_json::from_str(json)?)
}

/// Import every record in `path`; returns how many were written
pub async fn seed_from_json(repo: &ServiceRepository, path: &Path) -> Result<usize, SeedError> {
    let json = tokio::fs::read_to_string(path).await?;
    let records = parse_records(&json)?;
    info!("Seeding {} services from {}", records.len(), path.display());
    Ok(repo.import(&records).await?)
}
