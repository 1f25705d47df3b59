//! Payload mapper registry.
//!
//! Every platform has a pure, synchronous mapper that turns the caller's
//! platform-specific arguments into the canonical [`ApplyPayload`]. Dispatch is
//! a `match` on [`Platform`], so adding a platform without a mapper does not compile.

pub mod greenhouse;
pub mod indeed;
pub mod lever;
pub mod linkedin;
pub mod workday;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::apply::payload::{ApplyPayload, Platform};

#[derive(Debug, Error)]
pub enum MapperError {
    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("Invalid mapper arguments for {platform}: {source}")]
    InvalidArgs {
        platform: Platform,
        #[source]
        source: serde_json::Error,
    },
}

/// Resolves the mapper for `platform` and builds the payload from raw arguments.
pub fn map_payload(platform: Platform, mapper_args: Value) -> Result<ApplyPayload, MapperError> {
    let payload = match platform {
        Platform::Greenhouse => greenhouse::map(decode(platform, mapper_args)?),
        Platform::Lever => lever::map(decode(platform, mapper_args)?),
        Platform::Workday => workday::map(decode(platform, mapper_args)?),
        Platform::Indeed => indeed::map(decode(platform, mapper_args)?),
        Platform::LinkedIn => linkedin::map(decode(platform, mapper_args)?),
    };
    Ok(payload)
}

fn decode<T: DeserializeOwned>(platform: Platform, mapper_args: Value) -> Result<T, MapperError> {
    serde_json::from_value(mapper_args).map_err(|source| MapperError::InvalidArgs { platform, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_args() -> Value {
        json!({ "jobUrl": "https://x.test/job/42" })
    }

    #[test]
    fn test_every_platform_defines_files_and_answers_with_minimal_args() {
        for platform in Platform::ALL {
            let payload = map_payload(platform, minimal_args()).unwrap();
            assert_eq!(payload.platform, platform);
            assert_eq!(payload.job_url, "https://x.test/job/42");
            assert!(payload.files.is_empty(), "{platform} produced files");
            assert!(payload.answers.is_empty(), "{platform} produced answers");
        }
    }

    #[test]
    fn test_mapping_is_idempotent_for_identical_args() {
        let args = json!({
            "jobUrl": "https://x.test/job/42",
            "resumeUrl": "https://cdn.test/resume.pdf",
            "cvFile": "resume.pdf",
            "answers": { "q1": "yes" },
            "screenerAnswers": { "q1": "yes" },
            "questions": [{ "id": "q1", "answer": "yes" }]
        });
        for platform in Platform::ALL {
            let first = map_payload(platform, args.clone()).unwrap();
            let second = map_payload(platform, args.clone()).unwrap();
            assert_eq!(first, second, "{platform} is not deterministic");
        }
    }

    #[test]
    fn test_missing_job_url_is_invalid_args() {
        let err = map_payload(Platform::Greenhouse, json!({ "resumeUrl": "a.pdf" })).unwrap_err();
        assert!(matches!(
            err,
            MapperError::InvalidArgs { platform: Platform::Greenhouse, .. }
        ));
    }

    #[test]
    fn test_non_object_args_are_invalid() {
        let err = map_payload(Platform::Indeed, json!("resume.pdf")).unwrap_err();
        assert!(err.to_string().contains("indeed"));
    }
}
