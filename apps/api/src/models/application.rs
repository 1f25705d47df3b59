use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::apply::payload::{ApplyFile, Platform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Saved,
    Applied,
    Screening,
    Interview,
    Offer,
    Rejected,
    Withdrawn,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Saved => "saved",
            Stage::Applied => "applied",
            Stage::Screening => "screening",
            Stage::Interview => "interview",
            Stage::Offer => "offer",
            Stage::Rejected => "rejected",
            Stage::Withdrawn => "withdrawn",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "saved" => Ok(Stage::Saved),
            "applied" => Ok(Stage::Applied),
            "screening" => Ok(Stage::Screening),
            "interview" => Ok(Stage::Interview),
            "offer" => Ok(Stage::Offer),
            "rejected" => Ok(Stage::Rejected),
            "withdrawn" => Ok(Stage::Withdrawn),
            other => Err(format!("unknown stage '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

/// One audit event in an application's log. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyLogEntry {
    pub id: Uuid,
    pub ts: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

impl ApplyLogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            ts: Utc::now(),
            level,
            message: message.into(),
            meta: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warn, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }
}

/// The persisted aggregate for one job application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Uuid,
    pub job_url: String,
    pub platform: Platform,
    pub company: Option<String>,
    pub role: Option<String>,
    pub stage: Stage,
    pub files: Vec<ApplyFile>,
    pub applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Oldest first.
    pub logs: Vec<ApplyLogEntry>,
}

/// Fields supplied when a record is first created.
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub job_url: String,
    pub platform: Platform,
    pub company: Option<String>,
    pub role: Option<String>,
    pub stage: Stage,
    pub files: Vec<ApplyFile>,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ApplicationPatch {
    pub company: Option<String>,
    pub role: Option<String>,
    pub stage: Option<Stage>,
    pub files: Option<Vec<ApplyFile>>,
    pub applied_at: Option<DateTime<Utc>>,
}

// ────────────────────────────────────────────────────────────────────────────
// Postgres rows
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub job_url: String,
    pub platform: String,
    pub company: Option<String>,
    pub role: Option<String>,
    pub stage: String,
    pub files: Json<Vec<ApplyFile>>,
    pub applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ApplicationLogRow {
    pub id: Uuid,
    pub application_id: Uuid,
    pub ts: DateTime<Utc>,
    pub level: String,
    pub message: String,
    pub meta: Option<Json<Map<String, Value>>>,
}

impl ApplicationRow {
    pub fn into_application(self, logs: Vec<ApplyLogEntry>) -> Result<Application, String> {
        Ok(Application {
            id: self.id,
            platform: self.platform.parse::<Platform>().map_err(|e| e.to_string())?,
            stage: self.stage.parse()?,
            job_url: self.job_url,
            company: self.company,
            role: self.role,
            files: self.files.0,
            applied_at: self.applied_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            logs,
        })
    }
}

impl TryFrom<ApplicationLogRow> for ApplyLogEntry {
    type Error = String;

    fn try_from(row: ApplicationLogRow) -> Result<Self, Self::Error> {
        Ok(ApplyLogEntry {
            id: row.id,
            ts: row.ts,
            level: row.level.parse()?,
            message: row.message,
            meta: row.meta.map(|m| m.0),
        })
    }
}
