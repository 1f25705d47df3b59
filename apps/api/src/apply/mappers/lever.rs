use std::collections::BTreeMap;

use serde::Deserialize;

use crate::apply::payload::{ApplyPayload, FileKind, Platform};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverArgs {
    pub job_url: String,
    #[serde(default)]
    pub resume_url: Option<String>,
    #[serde(default)]
    pub cover_letter_url: Option<String>,
    /// Profile links keyed by label, e.g. `LinkedIn`, `GitHub`.
    #[serde(default)]
    pub links: BTreeMap<String, String>,
    /// Free-form "additional information" box.
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
}

pub fn map(args: LeverArgs) -> ApplyPayload {
    let mut payload = ApplyPayload::new(Platform::Lever, args.job_url);
    payload.attach(FileKind::Cv, args.resume_url.as_deref());
    payload.attach(FileKind::CoverLetter, args.cover_letter_url.as_deref());

    payload.answers = args.answers;
    // Lever posts links as urls[Label]
    for (label, url) in args.links {
        payload.answer(format!("urls[{label}]"), url);
    }
    if let Some(comments) = args.comments.filter(|c| !c.trim().is_empty()) {
        payload.answer("comments", comments);
    }
    payload
}
