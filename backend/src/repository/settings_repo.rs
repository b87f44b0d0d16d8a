//! Settings Repository
//!
//! Stores the site settings document as a single JSON row.

use async_trait::async_trait;
use rusqlite::params;

use crate::domain::{DomainResult, SiteSettings};
use super::db::{live, SharedConnection};
use super::traits::SettingsSource;

pub struct SettingsRepository {
    conn: SharedConnection,
}

impl SettingsRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl SettingsSource for SettingsRepository {
    async fn load(&self) -> DomainResult<SiteSettings> {
        let guard = self.conn.lock().await;
        let conn = live(&guard)?;

        let mut stmt = conn.prepare("SELECT data FROM site_settings WHERE id = 1")?;
        let mut rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let stored = rows.next().transpose()?;

        match stored {
            Some(data) => Ok(serde_json::from_str(&data)?),
            None => Ok(SiteSettings::default()),
        }
    }

    async fn save(&self, settings: &SiteSettings) -> DomainResult<()> {
        let data = serde_json::to_string(settings)?;

        let guard = self.conn.lock().await;
        let conn = live(&guard)?;
        conn.execute(
            "INSERT OR REPLACE INTO site_settings (id, data) VALUES (1, ?1)",
            params![data],
        )?;
        Ok(())
    }
}
