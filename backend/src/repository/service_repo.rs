//! Service Repository Implementation
//!
//! SQLite-backed implementation of Repository<ServiceRecord>. This is the
//! flat record source the catalog tree is built from.

use async_trait::async_trait;
use log::{info, warn};
use rusqlite::{params, Row};

use crate::domain::{BookingConfig, DomainError, DomainResult, ServiceRecord};
use super::db::{live, SharedConnection};
use super::traits::Repository;

const SERVICE_COLUMNS: &str =
    "id, parent_id, name, description, is_bookable, price, display_order, is_featured, booking_config";

/// SQLite implementation of the service repository
pub struct ServiceRepository {
    conn: SharedConnection,
}

impl ServiceRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    /// Insert or replace records keeping their ids, in one transaction.
    ///
    /// Used to seed the catalog from an exported record list, so parent
    /// references stay valid.
    pub async fn import(&self, records: &[ServiceRecord]) -> DomainResult<usize> {
        let mut guard = self.conn.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| DomainError::Internal("Database not initialized".to_string()))?;

        let tx = conn.transaction()?;
        for record in records {
            let config = encode_config(record.booking_config.as_ref())?;
            tx.execute(
                "INSERT OR REPLACE INTO services (id, parent_id, name, description, is_bookable, price, display_order, is_featured, booking_config)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.id,
                    record.parent_id,
                    record.name,
                    record.description,
                    record.is_bookable,
                    record.price,
                    record.display_order,
                    record.is_featured,
                    config
                ],
            )?;
        }
        tx.commit()?;

        info!("Imported {} services", records.len());
        Ok(records.len())
    }
}

fn encode_config(config: Option<&BookingConfig>) -> DomainResult<Option<String>> {
    Ok(match config {
        Some(c) => Some(serde_json::to_string(c)?),
        None => None,
    })
}

/// Map a row selected with SERVICE_COLUMNS
pub(crate) fn row_to_service(row: &Row<'_>) -> rusqlite::Result<ServiceRecord> {
    let id: u32 = row.get(0)?;
    let raw_config: Option<String> = row.get(8)?;

    // A broken form definition must not hide the service from the catalog
    let booking_config = raw_config.and_then(|raw| match serde_json::from_str(&raw) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("Ignoring unreadable booking_config on service {}: {}", id, e);
            None
        }
    });

    Ok(ServiceRecord {
        id,
        parent_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        is_bookable: row.get(4)?,
        price: row.get(5)?,
        display_order: row.get(6)?,
        is_featured: row.get(7)?,
        booking_config,
    })
}

#[async_trait]
impl Repository<ServiceRecord> for ServiceRepository {
    async fn create(&self, entity: &ServiceRecord) -> DomainResult<ServiceRecord> {
        let guard = self.conn.lock().await;
        let conn = live(&guard)?;

        let config = encode_config(entity.booking_config.as_ref())?;
        // id 0 lets SQLite assign one
        conn.execute(
            "INSERT INTO services (id, parent_id, name, description, is_bookable, price, display_order, is_featured, booking_config)
             VALUES (NULLIF(?1, 0), ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                entity.id,
                entity.parent_id,
                entity.name,
                entity.description,
                entity.is_bookable,
                entity.price,
                entity.display_order,
                entity.is_featured,
                config
            ],
        )?;

        let mut created = entity.clone();
        created.id = conn.last_insert_rowid() as u32;
        Ok(created)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<ServiceRecord>> {
        let guard = self.conn.lock().await;
        let conn = live(&guard)?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM services WHERE id = ?1",
            SERVICE_COLUMNS
        ))?;
        let mut rows = stmt.query_map(params![id], row_to_service)?;
        let found = rows.next().transpose()?;
        Ok(found)
    }

    async fn list(&self) -> DomainResult<Vec<ServiceRecord>> {
        let guard = self.conn.lock().await;
        let conn = live(&guard)?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM services ORDER BY display_order ASC, name ASC",
            SERVICE_COLUMNS
        ))?;
        let rows = stmt.query_map([], row_to_service)?;

        let mut services = Vec::new();
        for row in rows {
            services.push(row?);
        }
        Ok(services)
    }

    async fn update(&self, entity: &ServiceRecord) -> DomainResult<ServiceRecord> {
        let guard = self.conn.lock().await;
        let conn = live(&guard)?;

        let config = encode_config(entity.booking_config.as_ref())?;
        let changed = conn.execute(
            "UPDATE services SET parent_id = ?1, name = ?2, description = ?3, is_bookable = ?4, price = ?5, display_order = ?6, is_featured = ?7, booking_config = ?8 WHERE id = ?9",
            params![
                entity.parent_id,
                entity.name,
                entity.description,
                entity.is_bookable,
                entity.price,
                entity.display_order,
                entity.is_featured,
                config,
                entity.id
            ],
        )?;

        if changed == 0 {
            return Err(DomainError::NotFound(format!("Service {} not found", entity.id)));
        }
        Ok(entity.clone())
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let guard = self.conn.lock().await;
        let conn = live(&guard)?;

        // Cascade to the whole subtree; UNION (not UNION ALL) stops on parent cycles
        conn.execute(
            "DELETE FROM services WHERE id IN (
                WITH RECURSIVE descendants(id) AS (
                    SELECT id FROM services WHERE id = ?1
                    UNION
                    SELECT s.id FROM services s JOIN descendants d ON s.parent_id = d.id
                )
                SELECT id FROM descendants
            )",
            params![id],
        )?;

        Ok(())
    }
}
