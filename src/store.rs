//! Global Application State Store
//!
//! Process-wide caches over data fetched from the backend. Each store holds
//! an immutable snapshot that a refresh replaces wholesale; readers clone
//! the current `Arc` and subscribers are woken on every swap.

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

use portal_backend::domain::DomainError;
use portal_backend::repository::{Repository, SettingsSource};
use portal_backend::DomainResult;

use crate::models::{ServiceNode, ServiceRecord, SiteSettings};
use crate::search::{search_forest, SearchOptions};
use crate::tree;

/// One published value of a store
#[derive(Debug)]
pub struct Snapshot<T> {
    /// 0 for the initial value, +1 per publish
    pub version: u64,
    /// None until the first successful or failed fetch
    pub fetched_at: Option<DateTime<Utc>>,
    pub value: T,
}

impl<T> Deref for Snapshot<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

/// Owned cache with an explicit refresh and change notifications
pub struct SnapshotStore<T> {
    sender: watch::Sender<Arc<Snapshot<T>>>,
    refresh_lock: Mutex<()>,
}

impl<T> SnapshotStore<T> {
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(Arc::new(Snapshot {
            version: 0,
            fetched_at: None,
            value: initial,
        }));
        Self {
            sender,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn current(&self) -> Arc<Snapshot<T>> {
        Arc::clone(&self.sender.borrow())
    }

    /// Receiver that observes every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot<T>>> {
        self.sender.subscribe()
    }

    /// Publish a new value and notify subscribers
    pub fn replace(&self, value: T) -> Arc<Snapshot<T>> {
        let mut published = None;
        self.sender.send_modify(|current| {
            let next = Arc::new(Snapshot {
                version: current.version + 1,
                fetched_at: Some(Utc::now()),
                value,
            });
            published = Some(Arc::clone(&next));
            *current = next;
        });
        published.unwrap_or_else(|| self.current())
    }

    /// Run `load` and publish its result. Refreshes never overlap; a
    /// refresh that starts while another is running waits for it.
    pub async fn refresh_with<F, Fut, E>(&self, load: F) -> Result<Arc<Snapshot<T>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let _in_flight = self.refresh_lock.lock().await;
        let value = load().await?;
        Ok(self.replace(value))
    }

    /// Like `refresh_with`, but a failed load publishes `fallback()` before
    /// the lock is released, so a refresh queued behind it still wins.
    pub async fn refresh_or_else<F, Fut, E, D>(
        &self,
        load: F,
        fallback: D,
    ) -> Result<Arc<Snapshot<T>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        D: FnOnce() -> T,
    {
        let _in_flight = self.refresh_lock.lock().await;
        match load().await {
            Ok(value) => Ok(self.replace(value)),
            Err(e) => {
                self.replace(fallback());
                Err(e)
            }
        }
    }
}

/// The service catalog as a forest plus the search policy applied to it
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    forest: Vec<ServiceNode>,
    search: SearchOptions,
}

impl Catalog {
    pub fn new(forest: Vec<ServiceNode>, search: SearchOptions) -> Self {
        Self { forest, search }
    }

    pub fn from_records(records: Vec<ServiceRecord>, search: SearchOptions) -> Self {
        Self::new(tree::build_tree(records), search)
    }

    pub fn forest(&self) -> &[ServiceNode] {
        &self.forest
    }

    pub fn find(&self, id: u32) -> Option<&ServiceNode> {
        tree::find_by_id(&self.forest, id)
    }

    pub fn breadcrumbs(&self, id: u32) -> Vec<&ServiceNode> {
        tree::get_breadcrumbs(&self.forest, id)
    }

    pub fn flatten(&self) -> Vec<&ServiceNode> {
        tree::flatten(&self.forest)
    }

    pub fn featured(&self) -> Vec<&ServiceNode> {
        tree::featured_services(&self.forest)
    }

    pub fn search(&self, query: &str) -> Vec<&ServiceNode> {
        search_forest(&self.forest, query, &self.search)
    }

    /// Number of services at every depth
    pub fn len(&self) -> usize {
        self.flatten().len()
    }

    pub fn is_empty(&self) -> bool {
        self.forest.is_empty()
    }
}

pub struct CatalogStore {
    inner: SnapshotStore<Catalog>,
    search: SearchOptions,
}

impl CatalogStore {
    pub fn new(search: SearchOptions) -> Self {
        Self {
            inner: SnapshotStore::new(Catalog::new(Vec::new(), search)),
            search,
        }
    }

    pub fn current(&self) -> Arc<Snapshot<Catalog>> {
        self.inner.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot<Catalog>>> {
        self.inner.subscribe()
    }

    /// Fetch every record, rebuild the forest and publish it.
    ///
    /// A failed fetch publishes an empty catalog and returns the error.
    pub async fn refresh<R>(&self, source: &R) -> DomainResult<Arc<Snapshot<Catalog>>>
    where
        R: Repository<ServiceRecord> + ?Sized,
    {
        let search = self.search;
        let result = self
            .inner
            .refresh_or_else(
                || async move {
                    let records = source.list().await?;
                    Ok::<_, DomainError>(Catalog::from_records(records, search))
                },
                || Catalog::new(Vec::new(), search),
            )
            .await;

        match result {
            Ok(snapshot) => {
                info!(
                    "Catalog refreshed: {} services, {} top level (version {})",
                    snapshot.len(),
                    snapshot.forest().len(),
                    snapshot.version
                );
                Ok(snapshot)
            }
            Err(e) => {
                error!("Catalog fetch failed, published an empty catalog: {}", e);
                Err(e)
            }
        }
    }
}

pub struct SettingsStore {
    inner: SnapshotStore<SiteSettings>,
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore {
    pub fn new() -> Self {
        Self {
            inner: SnapshotStore::new(SiteSettings::default()),
        }
    }

    pub fn current(&self) -> Arc<Snapshot<SiteSettings>> {
        self.inner.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot<SiteSettings>>> {
        self.inner.subscribe()
    }

    /// Reload settings; on failure the previous snapshot stays published
    pub async fn refresh<S>(&self, source: &S) -> DomainResult<Arc<Snapshot<SiteSettings>>>
    where
        S: SettingsSource + ?Sized,
    {
        match self.inner.refresh_with(|| source.load()).await {
            Ok(snapshot) => {
                info!("Site settings refreshed (version {})", snapshot.version);
                Ok(snapshot)
            }
            Err(e) => {
                warn!("Site settings fetch failed, keeping previous: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use portal_backend::repository::MemoryServiceRepository;
    use tokio::sync::Notify;

    struct FailingSource;

    #[async_trait]
    impl Repository<ServiceRecord> for FailingSource {
        async fn create(&self, _entity: &ServiceRecord) -> DomainResult<ServiceRecord> {
            Err(DomainError::Internal("offline".into()))
        }
        async fn find_by_id(&self, _id: u32) -> DomainResult<Option<ServiceRecord>> {
            Err(DomainError::Internal("offline".into()))
        }
        async fn list(&self) -> DomainResult<Vec<ServiceRecord>> {
            Err(DomainError::Internal("offline".into()))
        }
        async fn update(&self, _entity: &ServiceRecord) -> DomainResult<ServiceRecord> {
            Err(DomainError::Internal("offline".into()))
        }
        async fn delete(&self, _id: u32) -> DomainResult<()> {
            Err(DomainError::Internal("offline".into()))
        }
    }

    #[async_trait]
    impl SettingsSource for FailingSource {
        async fn load(&self) -> DomainResult<SiteSettings> {
            Err(DomainError::Internal("offline".into()))
        }
        async fn save(&self, _settings: &SiteSettings) -> DomainResult<()> {
            Err(DomainError::Internal("offline".into()))
        }
    }

    /// Fails its fetch only once released, to hold the refresh lock open
    #[derive(Default)]
    struct GatedFailure {
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl Repository<ServiceRecord> for GatedFailure {
        async fn create(&self, _entity: &ServiceRecord) -> DomainResult<ServiceRecord> {
            Err(DomainError::Internal("offline".into()))
        }
        async fn find_by_id(&self, _id: u32) -> DomainResult<Option<ServiceRecord>> {
            Err(DomainError::Internal("offline".into()))
        }
        async fn list(&self) -> DomainResult<Vec<ServiceRecord>> {
            self.started.notify_one();
            self.release.notified().await;
            Err(DomainError::Internal("offline".into()))
        }
        async fn update(&self, _entity: &ServiceRecord) -> DomainResult<ServiceRecord> {
            Err(DomainError::Internal("offline".into()))
        }
        async fn delete(&self, _id: u32) -> DomainResult<()> {
            Err(DomainError::Internal("offline".into()))
        }
    }

    fn sample_repo() -> MemoryServiceRepository {
        MemoryServiceRepository::with_records(vec![
            ServiceRecord::new(1, "Passport"),
            ServiceRecord::new_child(2, "Renewal", 1, 0),
            ServiceRecord::new_child(3, "Orphan", 99, 0),
        ])
    }

    #[tokio::test]
    async fn test_initial_snapshot_is_empty() {
        let store = CatalogStore::new(SearchOptions::default());
        let snapshot = store.current();
        assert_eq!(snapshot.version, 0);
        assert!(snapshot.fetched_at.is_none());
        assert!(snapshot.is_empty());
        assert!(snapshot.find(1).is_none());
    }

    #[tokio::test]
    async fn test_refresh_builds_catalog() {
        let store = CatalogStore::new(SearchOptions::default());
        let snapshot = store.refresh(&sample_repo()).await.unwrap();

        assert_eq!(snapshot.version, 1);
        assert!(snapshot.fetched_at.is_some());
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.forest().len(), 2);
        let trail: Vec<u32> = snapshot.breadcrumbs(2).iter().map(|n| n.id()).collect();
        assert_eq!(trail, vec![1, 2]);
        assert_eq!(snapshot.search("renew").len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_swaps_without_touching_old_snapshot() {
        let repo = sample_repo();
        let store = CatalogStore::new(SearchOptions::default());
        store.refresh(&repo).await.unwrap();
        let before = store.current();

        repo.delete(1).await.unwrap();
        store.refresh(&repo).await.unwrap();

        assert_eq!(before.len(), 3);
        assert_eq!(store.current().len(), 1);
        assert_eq!(store.current().version, 2);
    }

    #[tokio::test]
    async fn test_subscribers_are_notified() {
        let store = CatalogStore::new(SearchOptions::default());
        let mut rx = store.subscribe();

        store.refresh(&sample_repo()).await.unwrap();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().version, 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_publishes_empty_catalog() {
        let store = CatalogStore::new(SearchOptions::default());
        store.refresh(&sample_repo()).await.unwrap();

        let result = store.refresh(&FailingSource).await;
        assert!(matches!(result, Err(DomainError::Internal(_))));

        let snapshot = store.current();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.version, 2);
        assert!(snapshot.search("passport").is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_are_serialized() {
        let store = Arc::new(CatalogStore::new(SearchOptions::default()));
        let repo = Arc::new(sample_repo());

        let mut handles = Vec::new();
        for _ in 0..4 {
            let store = Arc::clone(&store);
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                store.refresh(repo.as_ref()).await.map(|s| s.version)
            }));
        }

        let mut versions = Vec::new();
        for handle in handles {
            versions.push(handle.await.unwrap().unwrap());
        }
        versions.sort_unstable();
        assert_eq!(versions, vec![1, 2, 3, 4]);
        assert_eq!(store.current().len(), 3);
    }

    #[tokio::test]
    async fn test_settings_failure_keeps_previous() {
        let store = SettingsStore::new();
        let result = store.refresh(&FailingSource).await;
        assert!(result.is_err());

        let snapshot = store.current();
        assert_eq!(snapshot.version, 0);
        assert_eq!(snapshot.value, SiteSettings::default());
    }

    #[tokio::test]
    async fn test_generic_store_replace() {
        let store = SnapshotStore::new(1u32);
        let published = store.replace(7);
        assert_eq!(published.version, 1);
        assert_eq!(store.current().value, 7);
    }

    #[tokio::test]
    async fn test_refresh_queued_behind_failure_wins() {
        let store = Arc::new(CatalogStore::new(SearchOptions::default()));
        let gate = Arc::new(GatedFailure::default());

        let failing = {
            let store = Arc::clone(&store);
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                let failed = store.refresh(gate.as_ref()).await.is_err();
                failed
            })
        };
        gate.started.notified().await;

        let succeeding = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let repo = sample_repo();
                let version = store.refresh(&repo).await.map(|s| s.version);
                version
            })
        };
        tokio::task::yield_now().await;
        gate.release.notify_one();

        assert!(failing.await.unwrap());
        assert_eq!(succeeding.await.unwrap().unwrap(), 2);

        let snapshot = store.current();
        assert_eq!(snapshot.version, 2);
        assert_eq!(snapshot.len(), 3);
    }

    #[tokio::test]
    async fn test_featured_services_from_catalog() {
        let mut renewal = ServiceRecord::new_child(2, "Renewal", 1, 0);
        renewal.is_featured = true;
        let repo = MemoryServiceRepository::with_records(vec![
            ServiceRecord::new(1, "Passport"),
            renewal,
            ServiceRecord::new(3, "Tax"),
        ]);
        let store = CatalogStore::new(SearchOptions::default());
        store.refresh(&repo).await.unwrap();

        let featured: Vec<u32> = store.current().featured().iter().map(|n| n.id()).collect();
        assert_eq!(featured, vec![2]);
    }
}
