//! Canonical submission payload shared by every platform mapper.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::apply::mappers::MapperError;

/// Job boards with a registered payload mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Greenhouse,
    Lever,
    Workday,
    Indeed,
    LinkedIn,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Greenhouse,
        Platform::Lever,
        Platform::Workday,
        Platform::Indeed,
        Platform::LinkedIn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Greenhouse => "greenhouse",
            Platform::Lever => "lever",
            Platform::Workday => "workday",
            Platform::Indeed => "indeed",
            Platform::LinkedIn => "linkedin",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = MapperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| MapperError::UnknownPlatform(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Cv,
    CoverLetter,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Cv => "cv",
            FileKind::CoverLetter => "cover_letter",
        }
    }
}

/// An attachment sent along with an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyFile {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub url: String,
}

/// Normalized representation of one application submission.
///
/// `files` and `answers` are always present, even when empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyPayload {
    pub platform: Platform,
    pub job_url: String,
    #[serde(default)]
    pub files: Vec<ApplyFile>,
    /// Question identifier → free-text answer.
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
}

impl ApplyPayload {
    pub fn new(platform: Platform, job_url: impl Into<String>) -> Self {
        Self {
            platform,
            job_url: job_url.into(),
            files: Vec::new(),
            answers: BTreeMap::new(),
        }
    }

    /// Appends an attachment when a reference was supplied. Blank references are skipped.
    pub fn attach(&mut self, kind: FileKind, reference: Option<&str>) {
        let Some(reference) = reference.map(str::trim).filter(|r| !r.is_empty()) else {
            return;
        };
        self.files.push(ApplyFile {
            id: format!("{}:{}", self.platform, kind.as_str()),
            name: display_name(reference),
            kind,
            url: reference.to_string(),
        });
    }

    pub fn answer(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.answers.insert(question.into(), answer.into());
    }
}

/// Last path segment of a URL or file reference, without query string.
fn display_name(reference: &str) -> String {
    let without_query = reference.split(|c| c == '?' || c == '#').next().unwrap_or(reference);
    without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(reference)
        .to_string()
}
