use crate::db::EngineError;
use crate::source::SourceError;

use std::error::Error;
use std::fmt;


#[derive(Debug)]
#[non_exhaustive]
pub struct TransitionError {
    pub kind: TransitionErrorKind
}

impl TransitionError {
    pub fn new(kind: TransitionErrorKind) -> Self {
        TransitionError { kind }
    }

    pub fn delegation(operation: &'static str, source: EngineError) -> Self {
        TransitionError { kind: TransitionErrorKind::Delegation { operation, source } }
    }

    /// Version to pass to `force` when the error is a dirty-state rejection.
    pub fn dirty_version(&self) -> Option<u64> {
        match self.kind {
            TransitionErrorKind::Dirty(version) => Some(version),
            _ => None,
        }
    }
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransitionError: {}", self.kind)
    }
}

impl Error for TransitionError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		Some(&self.kind)
	}
}

#[derive(Debug)]
pub enum TransitionErrorKind {
    Delegation { operation: &'static str, source: EngineError },
    Dirty(u64),
    NoInteractiveTerminal,
    Prompt(std::io::Error),
    Source(SourceError),
}

impl fmt::Display for TransitionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delegation { operation, source } => write!(f, "{operation} failed: {}", source.kind),
            Self::Dirty(version) => write!(
                f,
                "Cannot migrate: database in dirty state at version {version}. Use 'force {version}' to fix the dirty state first"
            ),
            Self::NoInteractiveTerminal => write!(f, "Not a TTY: use --auto-approve for non-interactive mode"),
            Self::Prompt(e) => write!(f, "Failed to read confirmation: {e}"),
            Self::Source(e) => write!(f, "{}", e.kind),
        }
    }
}

impl Error for TransitionErrorKind {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			Self::Delegation { source, .. } => Some(source),
			Self::Prompt(source) => Some(source),
			Self::Source(source) => Some(source),
			_ => None,
		}
	}
}

impl From<SourceError> for TransitionError {
    fn from(error: SourceError) -> Self {
        TransitionError { kind: TransitionErrorKind::Source(error) }
    }
}

impl From<std::io::Error> for TransitionError {
    fn from(error: std::io::Error) -> Self {
        TransitionError { kind: TransitionErrorKind::Prompt(error) }
    }
}
