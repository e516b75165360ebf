use crate::migration::{count_between, is_applied, Direction};
use crate::source::{versions, MigrationSource, SourceError};

use serde::Serialize;


/// A requested transition, computed fresh for every invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionPlan {
    pub from_version: u64,
    pub to_version: u64,
    pub direction: Direction,
    pub steps: usize,
}

impl TransitionPlan {
    pub fn goto<S: MigrationSource + ?Sized>(
        source: &S,
        current_version: u64,
        target_version: u64,
    ) -> Result<Self, SourceError> {
        let direction = Direction::between(current_version, target_version);
        let steps = match direction {
            Direction::Up => count_between(source, current_version, target_version)?,
            Direction::Down => count_between(source, target_version, current_version)?,
            Direction::None => 0,
        };

        Ok(TransitionPlan {
            from_version: current_version,
            to_version: target_version,
            direction,
            steps,
        })
    }

    /// `steps == 0` applies every pending migration.
    pub fn up<S: MigrationSource + ?Sized>(
        source: &S,
        current_version: u64,
        steps: u64,
    ) -> Result<Self, SourceError> {
        let pending = versions(source)
            .filter(|v| v.as_ref().map_or(true, |v| !is_applied(*v, current_version)))
            .collect::<Result<Vec<u64>, SourceError>>()?;

        let steps = match steps {
            0 => pending.len(),
            n => pending.len().min(usize::try_from(n).unwrap_or(usize::MAX)),
        };
        let to_version = match steps {
            0 => current_version,
            n => pending[n - 1],
        };

        Ok(TransitionPlan {
            from_version: current_version,
            to_version,
            direction: Direction::Up,
            steps,
        })
    }

    /// `steps == 0` rolls back exactly one migration.
    pub fn down<S: MigrationSource + ?Sized>(
        source: &S,
        current_version: u64,
        steps: u64,
    ) -> Result<Self, SourceError> {
        let applied = versions(source)
            .filter(|v| v.as_ref().map_or(true, |v| is_applied(*v, current_version)))
            .collect::<Result<Vec<u64>, SourceError>>()?;

        let requested = usize::try_from(rollback_steps(steps)).unwrap_or(usize::MAX);
        let steps = applied.len().min(requested);
        let to_version = match applied.len().checked_sub(steps + 1) {
            Some(index) => applied[index],
            None => 0,
        };

        Ok(TransitionPlan {
            from_version: current_version,
            to_version,
            direction: Direction::Down,
            steps,
        })
    }

    pub fn is_noop(&self) -> bool {
        self.direction == Direction::None
    }

    /// Human-readable summary shown before confirmation.
    pub fn details(&self) -> String {
        format!(
            "{} from {} to {} ({}, {} migration(s))",
            self.direction.verb(),
            self.from_version,
            self.to_version,
            self.direction,
            self.steps,
        )
    }
}

/// Rollbacks default to the smallest blast radius.
pub fn rollback_steps(steps: u64) -> u64 {
    steps.max(1)
}
