use std::collections::BTreeMap;

use serde::Deserialize;

use crate::apply::payload::{ApplyPayload, FileKind, Platform};

/// Easy Apply form arguments.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedInArgs {
    pub job_url: String,
    #[serde(default)]
    pub resume_url: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
}

pub fn map(args: LinkedInArgs) -> ApplyPayload {
    let mut payload = ApplyPayload::new(Platform::LinkedIn, args.job_url);
    payload.attach(FileKind::Cv, args.resume_url.as_deref());
    payload.answers = args.answers;
    if let Some(phone) = args.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()) {
        payload.answer("phone", phone);
    }
    payload
}
