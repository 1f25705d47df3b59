//! Submission channels.
//!
//! Actual form filling is done by a browser extension that listens on the
//! message bus. Until one is attached, submissions are simulated.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::apply::bus::{ApplyResult, BusMessage, BusSubscription};
use crate::apply::payload::ApplyPayload;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitOutcome {
    /// True when no real form was filled.
    pub simulated: bool,
    pub message: Option<String>,
}

impl SubmitOutcome {
    pub fn simulated() -> Self {
        Self {
            simulated: true,
            message: Some("Simulated submission".to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Extension did not answer within {}ms", .0.as_millis())]
    Unavailable(Duration),

    #[error("Extension rejected the submission: {0}")]
    Rejected(String),

    #[error("Extension channel closed")]
    ChannelClosed,
}

/// Hands a mapped payload to whatever fills the form.
///
/// `results` is a bus subscription opened by the caller before it posted this
/// submission's `APPLY_START`, so it sees exactly the traffic that followed.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(
        &self,
        payload: &ApplyPayload,
        results: BusSubscription,
    ) -> Result<SubmitOutcome, SubmitError>;
}

/// Always reports a simulated success.
pub struct StubSubmitter;

#[async_trait]
impl Submitter for StubSubmitter {
    async fn submit(
        &self,
        payload: &ApplyPayload,
        _results: BusSubscription,
    ) -> Result<SubmitOutcome, SubmitError> {
        debug!("Stub submission for {} ({})", payload.job_url, payload.platform);
        Ok(SubmitOutcome::simulated())
    }
}

/// Waits on the bus for the extension's `APPLY_RESULT`.
///
/// Every submission reads its own subscription, so concurrent submissions for
/// different jobs never consume each other's results and nothing posted before
/// a submission started can answer it.
pub struct ExtensionSubmitter {
    timeout: Duration,
}

impl ExtensionSubmitter {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

/// A result without a job URL is taken to refer to this submission.
fn refers_to(result: &ApplyResult, payload: &ApplyPayload) -> bool {
    result
        .job_url
        .as_deref()
        .map_or(true, |url| url == payload.job_url)
}

#[async_trait]
impl Submitter for ExtensionSubmitter {
    async fn submit(
        &self,
        payload: &ApplyPayload,
        mut results: BusSubscription,
    ) -> Result<SubmitOutcome, SubmitError> {
        let wait_for_result = async {
            loop {
                match results.recv().await {
                    Some(BusMessage::ApplyResult(result)) if refers_to(&result, payload) => {
                        return Ok(result)
                    }
                    Some(_) => continue,
                    None => return Err(SubmitError::ChannelClosed),
                }
            }
        };

        match tokio::time::timeout(self.timeout, wait_for_result).await {
            Err(_) => Err(SubmitError::Unavailable(self.timeout)),
            Ok(Err(e)) => Err(e),
            Ok(Ok(result)) if result.ok => Ok(SubmitOutcome {
                simulated: false,
                message: result.message,
            }),
            Ok(Ok(result)) => Err(SubmitError::Rejected(
                result
                    .message
                    .unwrap_or_else(|| "no reason given".to_string()),
            )),
        }
    }
}
