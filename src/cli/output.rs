// {
//   "command": "up",
//   "status": "success",
//   "data": {
//     "environment": "dev",
//     "outcome": {"outcome": "completed", "operation": "up", "direction": "UP", "from_version": 1, "version": 3, "count": 2, "dirty": false}
//   },
//   "error": null
// }
use crate::cli::error::{AppError, AppErrorKind};
use crate::config::{Defaults, Environment};
use crate::migration::{HistoryEntry, MigrationStatus, ValidationReport};
use crate::transition::Outcome;

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;


#[derive(Debug, Serialize)]
pub struct ErrorJson {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dirty_version: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl From<&AppError> for ErrorJson {
    fn from(e: &AppError) -> Self {
        let kind = match &e.kind {
            AppErrorKind::Config(_) => "config",
            AppErrorKind::Engine(_) => "engine",
            AppErrorKind::InvalidMigrationName(_) => "invalid_migration_name",
            AppErrorKind::IoDirectoryCreate { .. } => "io_directory_create",
            AppErrorKind::IoFileWrite { .. } => "io_file_write",
            AppErrorKind::Serialize(_) => "serialize",
            AppErrorKind::SetGlobalDefault(_) => "set_global_default",
            AppErrorKind::Source(_) => "source",
            AppErrorKind::Transition(_) if e.dirty_version().is_some() => "dirty",
            AppErrorKind::Transition(_) => "transition",
            AppErrorKind::UnsupportedExtension(_) => "unsupported_extension",
            AppErrorKind::Validation(_) => "validation",
            AppErrorKind::VersionExhausted(_) => "version_exhausted",
        };
        let details = match &e.kind {
            AppErrorKind::Validation(errors) => errors.clone(),
            _ => Vec::new(),
        };

        ErrorJson {
            kind,
            message: e.kind.to_string(),
            dirty_version: e.dirty_version(),
            details,
        }
    }
}


#[derive(Debug, Serialize)]
pub struct StatusView {
    pub environment: String,
    #[serde(flatten)]
    pub status: MigrationStatus,
}

#[derive(Debug, Serialize)]
pub struct HistoryView {
    pub environment: String,
    pub entries: Vec<HistoryEntry>,
    /// Entries left out by `--limit`.
    pub remaining: usize,
}

impl HistoryView {
    pub fn truncated(environment: &str, mut entries: Vec<HistoryEntry>, limit: usize) -> Self {
        let remaining = entries.len().saturating_sub(limit);
        entries.truncate(limit);

        HistoryView { environment: environment.to_string(), entries, remaining }
    }
}

#[derive(Debug, Serialize)]
pub struct TransitionView {
    pub environment: String,
    pub outcome: Outcome,
}

#[derive(Debug, Serialize)]
pub struct EnvironmentCheck {
    pub name: String,
    #[serde(flatten)]
    pub report: ValidationReport,
}

#[derive(Debug, Serialize)]
pub struct ValidateView {
    pub environments: Vec<EnvironmentCheck>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedView {
    pub version: u64,
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct ConfigView {
    pub path: PathBuf,
    /// Database URLs are masked.
    pub environments: BTreeMap<String, Environment>,
    pub defaults: Defaults,
}


#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CommandData {
    Status(StatusView),
    History(HistoryView),
    Transition(TransitionView),
    Validate(ValidateView),
    Created(CreatedView),
    Config(ConfigView),
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Success,
    Cancelled,
    Error,
}

#[derive(Debug, Serialize)]
pub struct CommandOutput {
    pub command: String,
    pub status: CommandStatus,
    pub data: Option<CommandData>,
    pub error: Option<ErrorJson>,
}

impl CommandOutput {
    pub fn from_result(command: String, result: Result<CommandData, AppError>) -> Self {
        match result {
            Ok(data) => {
                let status = match &data {
                    CommandData::Transition(TransitionView { outcome: Outcome::Cancelled, .. }) => CommandStatus::Cancelled,
                    _ => CommandStatus::Success,
                };
                CommandOutput { command, status, data: Some(data), error: None }
            }
            Err(e) => CommandOutput {
                command,
                status: CommandStatus::Error,
                data: None,
                error: Some(ErrorJson::from(&e)),
            },
        }
    }
}
