use serde::Deserialize;

use crate::apply::payload::{ApplyPayload, FileKind, Platform};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkdayArgs {
    pub job_url: String,
    #[serde(default)]
    pub resume_url: Option<String>,
    #[serde(default)]
    pub cover_letter_url: Option<String>,
    #[serde(default)]
    pub questions: Vec<WorkdayQuestion>,
}

/// One entry from a Workday questionnaire step.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkdayQuestion {
    pub id: String,
    pub answer: String,
}

pub fn map(args: WorkdayArgs) -> ApplyPayload {
    let mut payload = ApplyPayload::new(Platform::Workday, args.job_url);
    payload.attach(FileKind::Cv, args.resume_url.as_deref());
    payload.attach(FileKind::CoverLetter, args.cover_letter_url.as_deref());
    // Later duplicates win, matching the order the questionnaire was filled in.
    for question in args.questions {
        payload.answer(question.id, question.answer);
    }
    payload
}
