use std::collections::BTreeMap;

use serde::Deserialize;

use crate::apply::payload::{ApplyPayload, FileKind, Platform};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndeedArgs {
    pub job_url: String,
    #[serde(default)]
    pub cv_file: Option<String>,
    #[serde(default)]
    pub cover_letter_file: Option<String>,
    #[serde(default)]
    pub screener_answers: BTreeMap<String, String>,
}

pub fn map(args: IndeedArgs) -> ApplyPayload {
    let mut payload = ApplyPayload::new(Platform::Indeed, args.job_url);
    payload.attach(FileKind::Cv, args.cv_file.as_deref());
    payload.attach(FileKind::CoverLetter, args.cover_letter_file.as_deref());
    payload.answers = args.screener_answers;
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cv_file_becomes_single_cv_attachment() {
        let payload = map(IndeedArgs {
            job_url: "https://x.test/job/1".to_string(),
            cv_file: Some("resume.pdf".to_string()),
            cover_letter_file: None,
            screener_answers: BTreeMap::new(),
        });
        assert_eq!(payload.job_url, "https://x.test/job/1");
        assert_eq!(payload.files.len(), 1);
        assert_eq!(payload.files[0].kind, FileKind::Cv);
        assert_eq!(payload.files[0].url, "resume.pdf");
        assert!(payload.answers.is_empty());
    }
}
