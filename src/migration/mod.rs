//! Derived migration state: applied/pending classification, range counts
//! and history, all computed by walking the source from `first`.
mod direction;
mod plan;
mod validate;

pub use direction::Direction;
pub use plan::{rollback_steps, TransitionPlan};
pub use validate::{validate, ValidationReport};

use crate::source::{migration_name, versions, MigrationSource, SourceError};

use serde::Serialize;


/// Version 0 is the "nothing applied" sentinel, so it never counts as applied.
pub fn is_applied(version: u64, current_version: u64) -> bool {
    current_version != 0 && version <= current_version
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    pub version: u64,
    pub dirty: bool,
    pub applied: usize,
    pub pending: usize,
    pub total: usize,
}

/// Classify every migration against the engine's current version marker.
/// Traversal errors are returned rather than folded into zero counts.
pub fn status<S: MigrationSource + ?Sized>(
    source: &S,
    current_version: u64,
    dirty: bool,
) -> Result<MigrationStatus, SourceError> {
    let mut applied = 0;
    let mut pending = 0;

    for version in versions(source) {
        if is_applied(version?, current_version) {
            applied += 1;
        } else {
            pending += 1;
        }
    }

    Ok(MigrationStatus {
        version: current_version,
        dirty,
        applied,
        pending,
        total: applied + pending,
    })
}

/// Number of versions `v` with `from < v <= to`.
/// Upward plans call it with `(current, target)`, downward ones with `(target, current)`.
pub fn count_between<S: MigrationSource + ?Sized>(
    source: &S,
    from: u64,
    to: u64,
) -> Result<usize, SourceError> {
    let mut count = 0;
    for version in versions(source) {
        let version = version?;
        if version > from && version <= to {
            count += 1;
        }
    }
    Ok(count)
}


#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub version: u64,
    pub name: String,
    pub applied: bool,
}

/// Every migration in ascending order. Truncating for display is up to the caller.
pub fn history<S: MigrationSource + ?Sized>(
    source: &S,
    current_version: u64,
) -> Result<Vec<HistoryEntry>, SourceError> {
    versions(source)
        .map(|version| {
            let version = version?;
            Ok(HistoryEntry {
                version,
                name: migration_name(source, version)?,
                applied: is_applied(version, current_version),
            })
        })
        .collect()
}
