use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ParseEnumError;

/// Lifecycle status attached to a migration log entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl MigrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationStatus::Pending => "pending",
            MigrationStatus::InProgress => "in_progress",
            MigrationStatus::Completed => "completed",
            MigrationStatus::Failed => "failed",
        }
    }
}

impl FromStr for MigrationStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MigrationStatus::Pending),
            "in_progress" => Ok(MigrationStatus::InProgress),
            "completed" => Ok(MigrationStatus::Completed),
            "failed" => Ok(MigrationStatus::Failed),
            other => Err(ParseEnumError::new("migration status", other)),
        }
    }
}

impl fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only record of a destination commit that went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationLogEntry {
    pub migration_name: String,
    pub model_name: String,
    pub status: MigrationStatus,
    pub message: String,
    pub logged_at: DateTime<Utc>,
}

impl MigrationLogEntry {
    /// A `failed` entry stamped with the current time.
    pub fn failed(migration_name: &str, model_name: &str, message: impl Into<String>) -> Self {
        Self {
            migration_name: migration_name.to_string(),
            model_name: model_name.to_string(),
            status: MigrationStatus::Failed,
            message: message.into(),
            logged_at: Utc::now(),
        }
    }
}
