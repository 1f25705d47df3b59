use std::collections::BTreeMap;

use serde::Deserialize;

use crate::apply::payload::{ApplyPayload, FileKind, Platform};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GreenhouseArgs {
    pub job_url: String,
    #[serde(default)]
    pub resume_url: Option<String>,
    #[serde(default)]
    pub cover_letter_url: Option<String>,
    /// Greenhouse question ids (`question_123`) → answers.
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
}

pub fn map(args: GreenhouseArgs) -> ApplyPayload {
    let mut payload = ApplyPayload::new(Platform::Greenhouse, args.job_url);
    payload.attach(FileKind::Cv, args.resume_url.as_deref());
    payload.attach(FileKind::CoverLetter, args.cover_letter_url.as_deref());
    payload.answers = args.answers;
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_resume_cover_letter_and_answers() {
        let payload = map(GreenhouseArgs {
            job_url: "https://boards.greenhouse.io/acme/jobs/1".to_string(),
            resume_url: Some("https://cdn.test/cv.pdf".to_string()),
            cover_letter_url: Some("https://cdn.test/letter.pdf".to_string()),
            answers: BTreeMap::from([("question_7".to_string(), "Yes".to_string())]),
        });

        assert_eq!(payload.files.len(), 2);
        assert_eq!(payload.files[0].kind, FileKind::Cv);
        assert_eq!(payload.files[0].name, "cv.pdf");
        assert_eq!(payload.files[1].kind, FileKind::CoverLetter);
        assert_eq!(payload.answers["question_7"], "Yes");
    }
}
