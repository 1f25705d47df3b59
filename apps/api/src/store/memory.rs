use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::apply::payload::Platform;
use crate::models::application::{Application, ApplicationPatch, ApplyLogEntry, NewApplication};
use crate::store::{ApplicationStore, StoreError, StoreResult};

/// Process-local store. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct InMemoryApplicationStore {
    records: RwLock<HashMap<Uuid, Application>>,
}

impl InMemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ApplicationStore for InMemoryApplicationStore {
    async fn create(&self, fields: NewApplication) -> StoreResult<Uuid> {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let record = Application {
            id,
            job_url: fields.job_url,
            platform: fields.platform,
            company: fields.company,
            role: fields.role,
            stage: fields.stage,
            files: fields.files,
            applied_at: None,
            created_at: now,
            updated_at: now,
            logs: Vec::new(),
        };
        self.records.write().await.insert(id, record);
        Ok(id)
    }

    async fn update(&self, id: Uuid, patch: ApplicationPatch) -> StoreResult<()> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if let Some(company) = patch.company {
            record.company = Some(company);
        }
        if let Some(role) = patch.role {
            record.role = Some(role);
        }
        if let Some(stage) = patch.stage {
            record.stage = stage;
        }
        if let Some(files) = patch.files {
            record.files = files;
        }
        if let Some(applied_at) = patch.applied_at {
            record.applied_at = Some(applied_at);
        }
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn add_log(&self, id: Uuid, entry: ApplyLogEntry) -> StoreResult<()> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        record.logs.push(entry);
        Ok(())
    }

    async fn find_by_job(&self, job_url: &str, platform: Platform) -> StoreResult<Option<Uuid>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.job_url == job_url && r.platform == platform)
            .min_by_key(|r| r.created_at)
            .map(|r| r.id))
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Application>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Application>> {
        let mut all: Vec<_> = self.records.read().await.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::application::Stage;

    fn new_application(job_url: &str, platform: Platform) -> NewApplication {
        NewApplication {
            job_url: job_url.to_string(),
            platform,
            company: Some("Acme".to_string()),
            role: None,
            stage: Stage::Saved,
            files: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = InMemoryApplicationStore::new();
        let id = store
            .create(new_application("https://x.test/job/1", Platform::Lever))
            .await
            .unwrap();
        let record = store.get(id).await.unwrap().unwrap();
        assert_eq!(record.company.as_deref(), Some("Acme"));
        assert_eq!(record.stage, Stage::Saved);
        assert!(record.logs.is_empty());
    }

    #[tokio::test]
    async fn test_find_by_job_matches_url_and_platform() {
        let store = InMemoryApplicationStore::new();
        let id = store
            .create(new_application("https://x.test/job/1", Platform::Lever))
            .await
            .unwrap();
        assert_eq!(
            store.find_by_job("https://x.test/job/1", Platform::Lever).await.unwrap(),
            Some(id)
        );
        assert_eq!(
            store.find_by_job("https://x.test/job/1", Platform::Indeed).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_logs_append_in_order() {
        let store = InMemoryApplicationStore::new();
        let id = store
            .create(new_application("https://x.test/job/2", Platform::Workday))
            .await
            .unwrap();
        store.add_log(id, ApplyLogEntry::info("first")).await.unwrap();
        store.add_log(id, ApplyLogEntry::warn("second")).await.unwrap();
        let logs = store.get(id).await.unwrap().unwrap().logs;
        let messages: Vec<_> = logs.iter().map(|l| l.message.as_str()).collect();
        assert_eq!(messages, ["first", "second"]);
    }

    #[tokio::test]
    async fn test_patch_leaves_unset_fields_alone() {
        let store = InMemoryApplicationStore::new();
        let id = store
            .create(new_application("https://x.test/job/3", Platform::Greenhouse))
            .await
            .unwrap();
        store
            .update(
                id,
                ApplicationPatch {
                    stage: Some(Stage::Interview),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let record = store.get(id).await.unwrap().unwrap();
        assert_eq!(record.stage, Stage::Interview);
        assert_eq!(record.company.as_deref(), Some("Acme"));
        assert!(record.applied_at.is_none());
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let store = InMemoryApplicationStore::new();
        let missing = Uuid::new_v4();
        let err = store
            .add_log(missing, ApplyLogEntry::error("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == missing));
    }
}
