//! In-Memory Service Repository
//!
//! Keeps records in insertion order and never sorts them, which makes it
//! a stand-in for sources that hand back unordered rows.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{DomainError, DomainResult, ServiceRecord};
use super::traits::Repository;

#[derive(Default)]
pub struct MemoryServiceRepository {
    records: RwLock<Vec<ServiceRecord>>,
}

impl MemoryServiceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<ServiceRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

#[async_trait]
impl Repository<ServiceRecord> for MemoryServiceRepository {
    async fn create(&self, entity: &ServiceRecord) -> DomainResult<ServiceRecord> {
        let mut records = self.records.write().await;

        let mut created = entity.clone();
        if created.id == 0 {
            created.id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        } else if records.iter().any(|r| r.id == created.id) {
            return Err(DomainError::Conflict(format!("Service {} already exists", created.id)));
        }

        records.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: u32) -> DomainResult<Option<ServiceRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self) -> DomainResult<Vec<ServiceRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn update(&self, entity: &ServiceRecord) -> DomainResult<ServiceRecord> {
        let mut records = self.records.write().await;
        let slot = records
            .iter_mut()
            .find(|r| r.id == entity.id)
            .ok_or_else(|| DomainError::NotFound(format!("Service {} not found", entity.id)))?;
        *slot = entity.clone();
        Ok(entity.clone())
    }

    async fn delete(&self, id: u32) -> DomainResult<()> {
        let mut records = self.records.write().await;

        // Cascade to descendants
        let mut doomed = vec![id];
        let mut cursor = 0;
        while cursor < doomed.len() {
            let parent = doomed[cursor];
            for r in records.iter() {
                if r.parent_id == Some(parent) && !doomed.contains(&r.id) {
                    doomed.push(r.id);
                }
            }
            cursor += 1;
        }

        records.retain(|r| !doomed.contains(&r.id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_assigns_next_id() {
        let repo = MemoryServiceRepository::with_records(vec![ServiceRecord::new(7, "Tax")]);
        let created = repo.create(&ServiceRecord::new(0, "Permits")).await.unwrap();
        assert_eq!(created.id, 8);

        let dup = repo.create(&ServiceRecord::new(7, "Again")).await;
        assert!(matches!(dup, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order() {
        let repo = MemoryServiceRepository::new();
        repo.create(&ServiceRecord::new(2, "Zoning")).await.unwrap();
        repo.create(&ServiceRecord::new(1, "Adoption")).await.unwrap();

        let ids: Vec<u32> = repo.list().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let repo = MemoryServiceRepository::with_records(vec![
            ServiceRecord::new(1, "Vehicles"),
            ServiceRecord::new_child(2, "Registration", 1, 0),
            ServiceRecord::new_child(3, "Plates", 2, 0),
            ServiceRecord::new(4, "Housing"),
        ]);
        repo.delete(1).await.unwrap();

        let ids: Vec<u32> = repo.list().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![4]);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let repo = MemoryServiceRepository::new();
        let result = repo.update(&ServiceRecord::new(5, "Ghost")).await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }
}
