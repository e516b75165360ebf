mod error;
mod mysql;
mod postgres;
mod sql_common;
mod sqlite;
pub use error::{EngineError, EngineErrorKind};
pub use mysql::MySqlEngine;
pub use postgres::PostgresEngine;
pub use sqlite::SqliteEngine;

use crate::source::SingleFileSource;

use std::sync::Arc;


/// Migration-execution engine. Owns applying sections and persisting the
/// `(version, dirty)` marker; `NoChange` is reported through `EngineError`.
pub trait MigrationEngine {
    /// Current marker. `(0, _)` when nothing is recorded.
    async fn version(&mut self) -> Result<(u64, bool), EngineError>;
    /// Apply every pending migration.
    async fn up(&mut self) -> Result<(), EngineError>;
    /// Apply `n` migrations forward, or roll back `-n`.
    async fn steps(&mut self, n: i64) -> Result<(), EngineError>;
    /// Move up or down until `version` is current. `0` rolls everything back.
    async fn migrate_to(&mut self, version: u64) -> Result<(), EngineError>;
    /// Set the marker without running anything. `-1` clears it.
    async fn force(&mut self, version: i64) -> Result<(), EngineError>;
    async fn close(self) -> Result<(), EngineError>;
}


pub enum EngineBackend {
    MySql(MySqlEngine),
    Postgres(PostgresEngine),
    Sqlite(SqliteEngine),
}

impl EngineBackend {
    /// Pick the adapter from the URL scheme and connect.
    pub async fn connect(database_url: &str, source: Arc<SingleFileSource>) -> Result<Self, EngineError> {
        match scheme(database_url) {
            Some("mysql") => {
                Ok(EngineBackend::MySql(MySqlEngine::connect(database_url, source).await?))
            }
            Some("postgres") | Some("postgresql") => {
                Ok(EngineBackend::Postgres(PostgresEngine::connect(database_url, source).await?))
            }
            Some("sqlite") | Some("sqlite3") => {
                Ok(EngineBackend::Sqlite(SqliteEngine::connect(database_url, source).await?))
            }
            _ => Err(EngineError::new(EngineErrorKind::UnsupportedScheme(
                crate::config::mask_database_url(database_url),
            ))),
        }
    }
}

impl MigrationEngine for EngineBackend {
    async fn version(&mut self) -> Result<(u64, bool), EngineError> {
        match self {
            EngineBackend::MySql(engine) => engine.version().await,
            EngineBackend::Postgres(engine) => engine.version().await,
            EngineBackend::Sqlite(engine) => engine.version().await,
        }
    }

    async fn up(&mut self) -> Result<(), EngineError> {
        match self {
            EngineBackend::MySql(engine) => engine.up().await,
            EngineBackend::Postgres(engine) => engine.up().await,
            EngineBackend::Sqlite(engine) => engine.up().await,
        }
    }

    async fn steps(&mut self, n: i64) -> Result<(), EngineError> {
        match self {
            EngineBackend::MySql(engine) => engine.steps(n).await,
            EngineBackend::Postgres(engine) => engine.steps(n).await,
            EngineBackend::Sqlite(engine) => engine.steps(n).await,
        }
    }

    async fn migrate_to(&mut self, version: u64) -> Result<(), EngineError> {
        match self {
            EngineBackend::MySql(engine) => engine.migrate_to(version).await,
            EngineBackend::Postgres(engine) => engine.migrate_to(version).await,
            EngineBackend::Sqlite(engine) => engine.migrate_to(version).await,
        }
    }

    async fn force(&mut self, version: i64) -> Result<(), EngineError> {
        match self {
            EngineBackend::MySql(engine) => engine.force(version).await,
            EngineBackend::Postgres(engine) => engine.force(version).await,
            EngineBackend::Sqlite(engine) => engine.force(version).await,
        }
    }

    async fn close(self) -> Result<(), EngineError> {
        match self {
            EngineBackend::MySql(engine) => engine.close().await,
            EngineBackend::Postgres(engine) => engine.close().await,
            EngineBackend::Sqlite(engine) => engine.close().await,
        }
    }
}


/// Text before the first `:`. `sqlite::memory:` has scheme `sqlite`.
fn scheme(database_url: &str) -> Option<&str> {
    let (scheme, _) = database_url.split_once(':')?;
    if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+') {
        return None;
    }
    Some(scheme)
}


/// Versions to run, each paired with the marker it leaves behind.
/// Shared by adapters so the walk order stays identical across backends.
pub fn forward_steps(all: &[u64], current: Option<u64>, limit: Option<usize>) -> Vec<(u64, i64)> {
    all.iter()
        .copied()
        .filter(|v| current.is_none_or(|c| *v > c))
        .take(limit.unwrap_or(usize::MAX))
        // Loaded versions never exceed `i64::MAX`.
        .map(|v| (v, v as i64))
        .collect()
}

/// Rollbacks from `current` downwards, stopping above `floor`.
/// The marker after each rollback is the previous version, or `-1` for none.
pub fn backward_steps(all: &[u64], current: Option<u64>, floor: Option<u64>, limit: Option<usize>) -> Vec<(u64, i64)> {
    let Some(current) = current else {
        return Vec::new();
    };

    let below: Vec<u64> = all.iter().copied().filter(|v| *v <= current).collect();
    below.iter()
        .enumerate()
        .rev()
        .filter(|(_, v)| floor.is_none_or(|f| **v > f))
        .take(limit.unwrap_or(usize::MAX))
        .map(|(i, v)| {
            let target = if i == 0 { -1 } else { below[i - 1] as i64 };
            (*v, target)
        })
        .collect()
}
