//! Auto-apply orchestrator.
//!
//! Flow: compliance → throttle → map → record → notify + submit + log.
//!
//! Phases run strictly in order. A compliance failure stops everything before
//! any record or log entry exists. Later failures propagate to the caller; a
//! record created before the failure is left in place. An unavailable or
//! failing extension is not a failure: the submission degrades to a simulated
//! one and the degradation is logged at `warn`.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::apply::bus::{BusMessage, MessageBus};
use crate::apply::compliance::{ensure_opt_in, ComplianceError};
use crate::apply::mappers::{map_payload, MapperError};
use crate::apply::payload::{ApplyPayload, Platform};
use crate::apply::submitter::{SubmitOutcome, Submitter};
use crate::apply::throttle::Throttle;
use crate::models::application::{ApplicationPatch, ApplyLogEntry, NewApplication, Stage};
use crate::store::{ApplicationStore, StoreError};

// ────────────────────────────────────────────────────────────────────────────
// Request / errors
// ────────────────────────────────────────────────────────────────────────────

/// Options for one auto-apply run.
#[derive(Debug, Clone)]
pub struct ApplyRequest {
    pub platform: Platform,
    pub job_url: String,
    pub company: Option<String>,
    pub role: Option<String>,
    /// Platform-specific; decoded by the platform's mapper.
    pub mapper_args: Value,
    pub opt_in: bool,
}

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error(transparent)]
    Compliance(#[from] ComplianceError),

    #[error(transparent)]
    Mapper(#[from] MapperError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ApplyEngine {
    store: Arc<dyn ApplicationStore>,
    throttle: Arc<Throttle>,
    bus: MessageBus,
    submitter: Arc<dyn Submitter>,
}

impl ApplyEngine {
    pub fn new(
        store: Arc<dyn ApplicationStore>,
        throttle: Arc<Throttle>,
        bus: MessageBus,
        submitter: Arc<dyn Submitter>,
    ) -> Self {
        Self {
            store,
            throttle,
            bus,
            submitter,
        }
    }

    pub fn store(&self) -> &Arc<dyn ApplicationStore> {
        &self.store
    }

    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    /// Runs the full pipeline and returns the application record id.
    pub async fn auto_apply(&self, request: ApplyRequest) -> Result<Uuid, ApplyError> {
        let ApplyRequest {
            platform,
            job_url,
            company,
            role,
            mapper_args,
            opt_in,
        } = request;

        // Phase 1: compliance. Nothing may be written before this passes.
        ensure_opt_in(opt_in)?;

        // Phase 2: throttle (delay only)
        self.throttle.acquire(platform.as_str()).await;

        // Phase 3: map
        let payload = map_payload(platform, mapper_args)?;
        debug!(
            "Mapped {} payload: {} files, {} answers",
            payload.platform,
            payload.files.len(),
            payload.answers.len()
        );

        // Phase 4: record
        let application_id = self
            .upsert_record(&job_url, platform, company, role, &payload)
            .await?;

        // Phase 5: notify, submit, log. The subscription is opened before
        // APPLY_START so the result cannot slip past it.
        let results = self.bus.subscribe();
        let listeners = self.bus.post(&BusMessage::ApplyStart(payload.clone()));
        debug!("APPLY_START for {application_id} reached {listeners} listener(s)");

        let outcome = match self.submitter.submit(&payload, results).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Extension submission failed for {application_id}, using stub: {e}");
                self.store
                    .add_log(
                        application_id,
                        ApplyLogEntry::warn(format!(
                            "Extension unavailable, falling back to simulated submission: {e}"
                        )),
                    )
                    .await?;
                SubmitOutcome::simulated()
            }
        };

        self.store
            .add_log(application_id, submitted_entry(&payload, &outcome))
            .await?;
        self.store
            .update(
                application_id,
                ApplicationPatch {
                    stage: Some(Stage::Applied),
                    applied_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;

        info!(
            "Auto-applied to {} via {} (application {application_id}, simulated={})",
            payload.job_url, payload.platform, outcome.simulated
        );
        Ok(application_id)
    }

    /// Reuses the record for (job URL, platform) when one exists, otherwise creates it.
    async fn upsert_record(
        &self,
        job_url: &str,
        platform: Platform,
        company: Option<String>,
        role: Option<String>,
        payload: &ApplyPayload,
    ) -> Result<Uuid, StoreError> {
        match self.store.find_by_job(job_url, platform).await? {
            Some(id) => {
                debug!("Reusing application {id} for {job_url}");
                self.store
                    .update(
                        id,
                        ApplicationPatch {
                            company,
                            role,
                            files: Some(payload.files.clone()),
                            ..Default::default()
                        },
                    )
                    .await?;
                Ok(id)
            }
            None => {
                let id = self
                    .store
                    .create(NewApplication {
                        job_url: job_url.to_string(),
                        platform,
                        company,
                        role,
                        stage: Stage::Saved,
                        files: payload.files.clone(),
                    })
                    .await?;
                info!("Created application {id} for {job_url}");
                Ok(id)
            }
        }
    }
}

fn submitted_entry(payload: &ApplyPayload, outcome: &SubmitOutcome) -> ApplyLogEntry {
    let mode = if outcome.simulated { "simulated" } else { "extension" };
    let mut entry = ApplyLogEntry::info(format!(
        "Submitted application via {} ({mode})",
        payload.platform
    ))
    .with_meta("platform", payload.platform.as_str())
    .with_meta("files", payload.files.len())
    .with_meta("answers", payload.answers.len())
    .with_meta("simulated", outcome.simulated);
    if let Some(message) = &outcome.message {
        entry = entry.with_meta("detail", message.as_str());
    }
    entry
}
