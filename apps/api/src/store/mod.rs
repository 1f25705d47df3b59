//! Application store: where records and their audit logs live.
//!
//! The orchestrator only sees the [`ApplicationStore`] trait. The in-memory
//! backend is the default; `PgApplicationStore` is used when a database URL
//! is configured. Backends own their own consistency; callers never lock.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::apply::payload::Platform;
use crate::models::application::{Application, ApplicationPatch, ApplyLogEntry, NewApplication};

pub use memory::InMemoryApplicationStore;
pub use postgres::PgApplicationStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Application not found: {0}")]
    NotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt application record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn create(&self, fields: NewApplication) -> StoreResult<Uuid>;

    async fn update(&self, id: Uuid, patch: ApplicationPatch) -> StoreResult<()>;

    /// Appends to the record's log. Entries are never rewritten or removed.
    async fn add_log(&self, id: Uuid, entry: ApplyLogEntry) -> StoreResult<()>;

    /// Existing record for the same job on the same platform, if any.
    async fn find_by_job(&self, job_url: &str, platform: Platform) -> StoreResult<Option<Uuid>>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<Application>>;

    async fn list(&self) -> StoreResult<Vec<Application>>;
}
