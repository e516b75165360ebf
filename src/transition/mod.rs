//! Confirmation-gated version transitions.
//!
//! `Controller::run` walks one request through the transition states:
//! the dirty guard, plan construction (with no-op detection), the
//! confirmation tier, delegation to the engine and finally a report built
//! from a fresh status query. Terminal states are `Outcome::Completed`,
//! `Outcome::NoChange`, `Outcome::Cancelled` or a `TransitionError`
//! (`Dirty` being the rejected state).
mod error;
mod prompt;

pub use error::{TransitionError, TransitionErrorKind};
pub use prompt::{ConfirmationTier, Prompt};
#[cfg(test)]
pub use prompt::fake;

use crate::db::MigrationEngine;
use crate::migration::{self, rollback_steps, Direction, MigrationStatus, TransitionPlan};
use crate::source::MigrationSource;

use serde::Serialize;


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `steps == 0` applies everything pending.
    Up { steps: u64 },
    /// `steps == 0` rolls back one migration.
    Down { steps: u64 },
    Goto { target: u64 },
    /// Set the marker without running migrations. `-1` clears it.
    Force { version: i64 },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Up { .. } => "up",
            Self::Down { .. } => "down",
            Self::Goto { .. } => "goto",
            Self::Force { .. } => "force version",
        }
    }

    fn failure_prefix(&self) -> &'static str {
        match self {
            Self::Up { .. } => "migration",
            Self::Down { .. } => "rollback",
            Self::Goto { .. } => "goto",
            Self::Force { .. } => "force",
        }
    }

    fn no_change_message(&self) -> &'static str {
        match self {
            Self::Down { .. } => "No migrations to rollback",
            _ => "No migrations to apply",
        }
    }
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionSettings {
    pub env_name: String,
    pub requires_confirmation: bool,
    pub auto_approve: bool,
}


/// What actually changed, measured by comparing status before and after.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionReport {
    pub operation: &'static str,
    pub direction: Direction,
    pub from_version: u64,
    pub version: u64,
    pub count: usize,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Completed(TransitionReport),
    NoChange { message: String },
    Cancelled,
}

impl Outcome {
    fn no_change(message: impl Into<String>) -> Self {
        Outcome::NoChange { message: message.into() }
    }
}


pub struct Controller<'a, S: MigrationSource + ?Sized, E: MigrationEngine, P: Prompt> {
    source: &'a S,
    engine: E,
    prompt: P,
    settings: TransitionSettings,
}

impl<'a, S: MigrationSource + ?Sized, E: MigrationEngine, P: Prompt> Controller<'a, S, E, P> {
    pub fn new(source: &'a S, engine: E, prompt: P, settings: TransitionSettings) -> Self {
        Controller { source, engine, prompt, settings }
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Recomputed on every call; the engine's marker is the source of truth.
    pub async fn status(&mut self) -> Result<MigrationStatus, TransitionError> {
        let (version, dirty) = self.engine
            .version()
            .await
            .map_err(|e| TransitionError::delegation("get status", e))?;

        Ok(migration::status(self.source, version, dirty)?)
    }

    pub async fn run(&mut self, operation: Operation) -> Result<Outcome, TransitionError> {
        let before = self.status().await?;

        if before.dirty && !matches!(operation, Operation::Force { .. }) {
            tracing::warn!("Database is in dirty state at version {}", before.version);
            return Err(TransitionError::new(TransitionErrorKind::Dirty(before.version)));
        }

        let (direction, details) = match operation {
            Operation::Up { steps } => {
                if before.pending == 0 {
                    return Ok(Outcome::no_change(operation.no_change_message()));
                }
                let plan = TransitionPlan::up(self.source, before.version, steps)?;
                (plan.direction, plan.details())
            }
            Operation::Down { steps } => {
                if before.applied == 0 {
                    return Ok(Outcome::no_change(operation.no_change_message()));
                }
                let plan = TransitionPlan::down(self.source, before.version, steps)?;
                (plan.direction, plan.details())
            }
            Operation::Goto { target } => {
                let plan = TransitionPlan::goto(self.source, before.version, target)?;
                if plan.is_noop() {
                    return Ok(Outcome::no_change(format!("Already at version {target}")));
                }
                (plan.direction, plan.details())
            }
            Operation::Force { version } => (
                Direction::None,
                format!(
                    "Force setting version from {} (dirty: {}) to {}\nThis does NOT run migrations",
                    before.version, before.dirty, version
                ),
            ),
        };
        tracing::info!("Plan for '{}' in '{}': {}", operation.name(), self.settings.env_name, details);

        let tier = ConfirmationTier::select(self.settings.auto_approve, self.settings.requires_confirmation);
        if !tier.confirm(&mut self.prompt, &self.settings.env_name, operation.name(), &details)? {
            tracing::info!("Cancelled by operator");
            return Ok(Outcome::Cancelled);
        }

        tracing::info!("Delegating '{}' to the migration engine", operation.name());
        let delegated = match operation {
            Operation::Up { steps: 0 } => self.engine.up().await,
            Operation::Up { steps } => self.engine.steps(clamp_steps(steps)).await,
            Operation::Down { steps } => self.engine.steps(-clamp_steps(rollback_steps(steps))).await,
            Operation::Goto { target } => self.engine.migrate_to(target).await,
            Operation::Force { version } => self.engine.force(version).await,
        };

        match delegated {
            Ok(()) => {}
            Err(e) if e.is_no_change() => return Ok(Outcome::no_change(operation.no_change_message())),
            Err(e) => return Err(TransitionError::delegation(operation.failure_prefix(), e)),
        }

        let after = self.status().await?;
        Ok(Outcome::Completed(report(operation, direction, &before, &after)))
    }
}

fn clamp_steps(steps: u64) -> i64 {
    i64::try_from(steps).unwrap_or(i64::MAX)
}

fn report(
    operation: Operation,
    direction: Direction,
    before: &MigrationStatus,
    after: &MigrationStatus,
) -> TransitionReport {
    let count = match direction {
        Direction::Up => after.applied.saturating_sub(before.applied),
        Direction::Down => before.applied.saturating_sub(after.applied),
        Direction::None => 0,
    };

    TransitionReport {
        operation: operation.name(),
        direction,
        from_version: before.version,
        version: after.version,
        count,
        dirty: after.dirty,
    }
}
