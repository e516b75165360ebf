use crate::source::SourceError;

use std::error::Error;
use std::fmt;


#[derive(Debug)]
#[non_exhaustive]
pub struct EngineError {
    pub kind: EngineErrorKind
}

impl EngineError {
    pub fn new(kind: EngineErrorKind) -> Self {
        EngineError { kind }
    }

    /// The engine found nothing to do. Not a failure.
    pub fn is_no_change(&self) -> bool {
        matches!(self.kind, EngineErrorKind::NoChange)
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EngineError: {}", self.kind)
    }
}

impl Error for EngineError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		Some(&self.kind)
	}
}

#[derive(Debug)]
pub enum EngineErrorKind {
    Dirty(u64),
    InvalidVersion(i64),
    NoChange,
    Source(SourceError),
    SQLX(sqlx::Error),
    UnknownVersion(u64),
    UnsupportedScheme(String),
}

impl fmt::Display for EngineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dirty(version) => write!(f, "Dirty database version {version}. Fix and force version."),
            Self::InvalidVersion(version) => write!(f, "Invalid version: {version} (must be -1 or greater)"),
            Self::NoChange => write!(f, "No change"),
            Self::Source(e) => write!(f, "{}", e.kind),
            Self::SQLX(e) => write!(f, "{e}"),
            Self::UnknownVersion(version) => write!(f, "Version {version} does not exist in the migration source"),
            Self::UnsupportedScheme(url) => write!(f, "Unsupported database URL scheme: '{url}'"),
        }
    }
}

impl Error for EngineErrorKind {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			Self::Source(source) => Some(source),
			Self::SQLX(source) => Some(source),
			_ => None,
		}
	}
}

impl From<sqlx::Error> for EngineError {
    fn from(error: sqlx::Error) -> Self {
        EngineError { kind: EngineErrorKind::SQLX(error) }
    }
}

impl From<SourceError> for EngineError {
    fn from(error: SourceError) -> Self {
        EngineError { kind: EngineErrorKind::Source(error) }
    }
}
