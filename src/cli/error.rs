use crate::config::ConfigError;
use crate::db::EngineError;
use crate::source::{SourceError, EXTENSION};
use crate::transition::TransitionError;

use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use tracing::subscriber::SetGlobalDefaultError;


#[derive(Debug)]
#[non_exhaustive]
pub struct AppError {
    pub kind: AppErrorKind
}

impl AppError {
    pub fn new(kind: AppErrorKind) -> Self {
        AppError { kind }
    }

    /// Version to repair when the failure is a dirty-state rejection.
    pub fn dirty_version(&self) -> Option<u64> {
        match &self.kind {
            AppErrorKind::Transition(error) => error.dirty_version(),
            _ => None,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AppError: {}", self.kind)
    }
}

impl Error for AppError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.kind)
	}
}

#[derive(Debug)]
pub enum AppErrorKind {
    Config(ConfigError),
    Engine(EngineError),
    InvalidMigrationName(String),
    IoDirectoryCreate { source: std::io::Error, path: PathBuf },
    IoFileWrite { source: std::io::Error, path: PathBuf },
    Serialize(serde_json::Error),
    SetGlobalDefault(SetGlobalDefaultError),
    Source(SourceError),
    Transition(TransitionError),
    UnsupportedExtension(String),
    Validation(Vec<String>),
    VersionExhausted(u64),
}

impl fmt::Display for AppErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(error) => write!(f, "{}", error.kind),
            Self::Engine(error) => write!(f, "{}", error.kind),
            Self::InvalidMigrationName(name) => write!(f, "Invalid migration name: '{name}'"),
            Self::IoDirectoryCreate { path, .. } => write!(f, "Failed to create directory: '{path:?}'"),
            Self::IoFileWrite { path, .. } => write!(f, "Failed to write to file: '{path:?}'"),
            Self::Serialize(error) => write!(f, "Failed to serialize output: {error}"),
            Self::SetGlobalDefault(error) => write!(f, "Failed to set global default subscriber: {error}"),
            Self::Source(error) => write!(f, "{}", error.kind),
            Self::Transition(error) => write!(f, "{}", error.kind),
            Self::UnsupportedExtension(ext) => write!(f, "Unsupported migration extension: '{ext}' (expected '{EXTENSION}')"),
            Self::Validation(errors) => write!(f, "Validation failed with {} error(s)", errors.len()),
            Self::VersionExhausted(latest) => write!(f, "No version left after {latest}"),
        }
    }
}

impl Error for AppErrorKind {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			Self::Config(source) => Some(source),
			Self::Engine(source) => Some(source),
			Self::IoDirectoryCreate { source, .. } => Some(source),
			Self::IoFileWrite { source, .. } => Some(source),
			Self::Serialize(source) => Some(source),
			Self::Source(source) => Some(source),
			Self::Transition(source) => Some(source),
			_ => None
		}
	}
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        AppError { kind: AppErrorKind::Config(error) }
    }
}

impl From<EngineError> for AppError {
    fn from(error: EngineError) -> Self {
        AppError { kind: AppErrorKind::Engine(error) }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError { kind: AppErrorKind::Serialize(error) }
    }
}

impl From<SetGlobalDefaultError> for AppError {
    fn from(error: SetGlobalDefaultError) -> Self {
        AppError { kind: AppErrorKind::SetGlobalDefault(error) }
    }
}

impl From<SourceError> for AppError {
    fn from(error: SourceError) -> Self {
        AppError { kind: AppErrorKind::Source(error) }
    }
}

impl From<TransitionError> for AppError {
    fn from(error: TransitionError) -> Self {
        AppError { kind: AppErrorKind::Transition(error) }
    }
}
