//! Application Context
//!
//! Shared handles to the data sources and the stores built from them.
//! Admin edits go through here so the caches are reloaded after each write.

use log::{info, warn};
use std::sync::Arc;

use portal_backend::domain::DomainError;
use portal_backend::repository::{Repository, SettingsSource};
use portal_backend::DomainResult;

use crate::form_schema::validate_config;
use crate::models::{ServiceRecord, SiteSettings};
use crate::search::SearchOptions;
use crate::store::{CatalogStore, SettingsStore};

/// App-wide state, cheap to clone
#[derive(Clone)]
pub struct AppContext {
    services: Arc<dyn Repository<ServiceRecord>>,
    settings_source: Arc<dyn SettingsSource>,
    pub catalog: Arc<CatalogStore>,
    pub settings: Arc<SettingsStore>,
}

impl AppContext {
    pub fn new(
        services: Arc<dyn Repository<ServiceRecord>>,
        settings_source: Arc<dyn SettingsSource>,
        search: SearchOptions,
    ) -> Self {
        Self {
            services,
            settings_source,
            catalog: Arc::new(CatalogStore::new(search)),
            settings: Arc::new(SettingsStore::new()),
        }
    }

    /// Refresh the catalog and the settings together.
    ///
    /// Both refreshes always run; the catalog error wins if both fail.
    pub async fn reload(&self) -> DomainResult<()> {
        let (catalog, settings) = tokio::join!(
            self.catalog.refresh(self.services.as_ref()),
            self.settings.refresh(self.settings_source.as_ref()),
        );
        catalog?;
        settings?;
        Ok(())
    }

    /// Whether the booking entry point should be offered for a service
    pub fn can_book(&self, id: u32) -> bool {
        if self.settings.current().maintenance_mode {
            return false;
        }
        self.catalog
            .current()
            .find(id)
            .map_or(false, |node| node.service.is_bookable)
    }

    /// Create (id 0) or update a service, then reload the catalog.
    ///
    /// Once the write succeeds the saved record is returned even if the
    /// reload fails; the catalog then stays empty until the next `reload`.
    pub async fn save_service(&self, record: ServiceRecord) -> DomainResult<ServiceRecord> {
        if record.name.trim().is_empty() {
            return Err(DomainError::InvalidInput("Service name is required".to_string()));
        }
        if let Some(config) = &record.booking_config {
            validate_config(config).map_err(|e| DomainError::InvalidInput(e.to_string()))?;
        }
        if record.parent_id == Some(record.id) && record.id != 0 {
            return Err(DomainError::InvalidInput("A service cannot be its own parent".to_string()));
        }

        let saved = if record.id == 0 {
            self.services.create(&record).await?
        } else {
            self.services.update(&record).await?
        };
        info!("Saved service {} ({})", saved.id, saved.name);

        if let Err(e) = self.catalog.refresh(self.services.as_ref()).await {
            warn!("Service {} saved but catalog reload failed: {}", saved.id, e);
        }
        Ok(saved)
    }

    /// Delete a service with its sub-services, then reload the catalog.
    /// A failed reload after a successful delete is logged, not returned.
    pub async fn remove_service(&self, id: u32) -> DomainResult<()> {
        self.services.delete(id).await?;
        info!("Removed service {}", id);
        if let Err(e) = self.catalog.refresh(self.services.as_ref()).await {
            warn!("Service {} removed but catalog reload failed: {}", id, e);
        }
        Ok(())
    }

    /// Persist settings and reload them; a failed reload is logged, not returned
    pub async fn save_settings(&self, settings: SiteSettings) -> DomainResult<()> {
        self.settings_source.save(&settings).await?;
        if let Err(e) = self.settings.refresh(self.settings_source.as_ref()).await {
            warn!("Settings saved but reload failed: {}", e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingConfig, FieldType, FormField};
    use async_trait::async_trait;
    use portal_backend::repository::MemoryServiceRepository;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MemorySettings {
        value: Mutex<SiteSettings>,
    }

    #[async_trait]
    impl SettingsSource for MemorySettings {
        async fn load(&self) -> DomainResult<SiteSettings> {
            Ok(self.value.lock().await.clone())
        }
        async fn save(&self, settings: &SiteSettings) -> DomainResult<()> {
            *self.value.lock().await = settings.clone();
            Ok(())
        }
    }

    /// Accepts writes but cannot list, like a backend that drops reads
    #[derive(Default)]
    struct WriteOnlyServices {
        written: Mutex<Vec<ServiceRecord>>,
    }

    #[async_trait]
    impl Repository<ServiceRecord> for WriteOnlyServices {
        async fn create(&self, entity: &ServiceRecord) -> DomainResult<ServiceRecord> {
            let mut written = self.written.lock().await;
            let saved = ServiceRecord {
                id: written.len() as u32 + 1,
                ..entity.clone()
            };
            written.push(saved.clone());
            Ok(saved)
        }
        async fn find_by_id(&self, _id: u32) -> DomainResult<Option<ServiceRecord>> {
            Err(DomainError::Internal("read timeout".into()))
        }
        async fn list(&self) -> DomainResult<Vec<ServiceRecord>> {
            Err(DomainError::Internal("read timeout".into()))
        }
        async fn update(&self, entity: &ServiceRecord) -> DomainResult<ServiceRecord> {
            Ok(entity.clone())
        }
        async fn delete(&self, _id: u32) -> DomainResult<()> {
            Ok(())
        }
    }

    fn context() -> AppContext {
        let mut passport = ServiceRecord::new(1, "Passport");
        passport.is_bookable = true;
        let repo = MemoryServiceRepository::with_records(vec![
            passport,
            ServiceRecord::new(2, "Information"),
        ]);
        AppContext::new(
            Arc::new(repo),
            Arc::new(MemorySettings::default()),
            SearchOptions::default(),
        )
    }

    #[tokio::test]
    async fn test_reload_fills_stores() {
        let ctx = context();
        ctx.reload().await.unwrap();

        assert_eq!(ctx.catalog.current().len(), 2);
        assert_eq!(ctx.settings.current().version, 1);
    }

    #[tokio::test]
    async fn test_can_book() {
        let ctx = context();
        assert!(!ctx.can_book(1));

        ctx.reload().await.unwrap();
        assert!(ctx.can_book(1));
        assert!(!ctx.can_book(2));
        assert!(!ctx.can_book(42));

        let settings = SiteSettings {
            maintenance_mode: true,
            ..SiteSettings::default()
        };
        ctx.save_settings(settings).await.unwrap();
        assert!(!ctx.can_book(1));
    }

    #[tokio::test]
    async fn test_save_service_reloads_catalog() {
        let ctx = context();
        ctx.reload().await.unwrap();

        let child = ServiceRecord::new_child(0, "Renewal", 1, 0);
        let saved = ctx.save_service(child).await.unwrap();
        assert_ne!(saved.id, 0);

        let catalog = ctx.catalog.current();
        let trail: Vec<&str> = catalog.breadcrumbs(saved.id).iter().map(|n| n.name()).collect();
        assert_eq!(trail, vec!["Passport", "Renewal"]);
    }

    #[tokio::test]
    async fn test_save_service_rejects_bad_form() {
        let ctx = context();
        let mut record = ServiceRecord::new(1, "Passport");
        record.booking_config = Some(BookingConfig {
            fields: vec![FormField::new("office", "Office", FieldType::Select { options: vec![] })],
            documents: vec![],
        });

        let result = ctx.save_service(record).await;
        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_remove_service_cascades() {
        let ctx = context();
        ctx.save_service(ServiceRecord::new_child(0, "Renewal", 1, 0)).await.unwrap();
        ctx.remove_service(1).await.unwrap();

        let catalog = ctx.catalog.current();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.find(1).is_none());
    }

    #[tokio::test]
    async fn test_persisted_write_is_ok_when_reload_fails() {
        let services = Arc::new(WriteOnlyServices::default());
        let ctx = AppContext::new(
            services.clone(),
            Arc::new(MemorySettings::default()),
            SearchOptions::default(),
        );

        let saved = ctx.save_service(ServiceRecord::new(0, "Passport")).await.unwrap();
        assert_eq!(saved.id, 1);
        assert_eq!(services.written.lock().await.len(), 1);
        assert!(ctx.catalog.current().is_empty());

        assert!(ctx.remove_service(saved.id).await.is_ok());
    }
}
