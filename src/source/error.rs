use crate::migration::Direction;

use std::error::Error;
use std::fmt;
use std::path::PathBuf;


#[derive(Debug)]
#[non_exhaustive]
pub struct SourceError {
    pub kind: SourceErrorKind
}

impl SourceError {
    pub fn new(kind: SourceErrorKind) -> Self {
        SourceError { kind }
    }

    /// True when the migration exists but the requested section has no content.
    pub fn is_empty_section(&self) -> bool {
        matches!(self.kind, SourceErrorKind::EmptySection { .. })
    }

    /// Name of the migration the error refers to, when the version exists.
    pub fn migration_name(&self) -> Option<&str> {
        match &self.kind {
            SourceErrorKind::EmptySection { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceError: {}", self.kind)
    }
}

impl Error for SourceError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		Some(&self.kind)
	}
}

#[derive(Debug)]
pub enum SourceErrorKind {
    DuplicateVersion { version: u64, first: String, second: String },
    EmptySection { version: u64, name: String, direction: Direction },
    InvalidDirectory(PathBuf),
    InvalidFilename(String),
    InvalidVersionNumber(String),
    Io { path: PathBuf, source: std::io::Error },
    NotFound(u64),
}

impl fmt::Display for SourceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateVersion { version, first, second } => {
                write!(f, "Duplicate version {version} found in files '{first}' and '{second}'")
            },
            Self::EmptySection { version, name, direction } => {
                write!(f, "Migration {version} ('{name}') has an empty {direction} section")
            },
            Self::InvalidDirectory(path) => write!(f, "Directory does not exist or is not a directory: '{path:?}'"),
            Self::InvalidFilename(name) => write!(f, "Invalid migration filename: '{name}' (expected '<version>_<name>.sql')"),
            Self::InvalidVersionNumber(name) => write!(f, "Invalid version number in filename: '{name}'"),
            Self::Io { path, .. } => write!(f, "Failed to read: '{path:?}'"),
            Self::NotFound(version) => write!(f, "Migration version {version} not found"),
        }
    }
}

impl Error for SourceErrorKind {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			Self::Io { source, .. } => Some(source),
			_ => None,
		}
	}
}
