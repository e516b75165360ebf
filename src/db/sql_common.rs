use crate::db::{backward_steps, forward_steps, EngineError, EngineErrorKind};
use crate::migration::Direction;
use crate::source::{versions, MigrationSource, SingleFileSource, SourceError};


pub const MIGRATIONS_TABLE: &str = "schema_migrations";
/// Named lock shared by every adapter that supports one.
pub const LOCK_NAME: &str = "migrate-tool";


/// Per-backend primitives over the `(version, dirty)` marker table.
/// The migration walk itself is shared and lives in this module.
pub trait MarkerStore {
    fn source(&self) -> &SingleFileSource;
    async fn acquire_lock(&mut self) -> Result<(), EngineError>;
    async fn release_lock(&mut self) -> Result<(), EngineError>;
    /// Raw row, `None` when the table is empty.
    async fn marker(&mut self) -> Result<Option<(i64, bool)>, EngineError>;
    /// Replace the marker. `-1` with `dirty = false` clears the table.
    async fn set_version(&mut self, version: i64, dirty: bool) -> Result<(), EngineError>;
    async fn execute(&mut self, sql: &str) -> Result<(), EngineError>;
}


pub async fn version<S: MarkerStore>(store: &mut S) -> Result<(u64, bool), EngineError> {
    Ok(match store.marker().await? {
        Some((version, dirty)) => (version.max(0) as u64, dirty),
        None => (0, false),
    })
}

pub async fn up<S: MarkerStore>(store: &mut S) -> Result<(), EngineError> {
    store.acquire_lock().await?;
    let result = up_unlocked(store).await;
    release(store, result).await
}

pub async fn steps<S: MarkerStore>(store: &mut S, n: i64) -> Result<(), EngineError> {
    if n == 0 {
        return Err(EngineError::new(EngineErrorKind::NoChange));
    }

    store.acquire_lock().await?;
    let result = steps_unlocked(store, n).await;
    release(store, result).await
}

pub async fn migrate_to<S: MarkerStore>(store: &mut S, version: u64) -> Result<(), EngineError> {
    if version != 0 && !store.source().contains(version) {
        return Err(EngineError::new(EngineErrorKind::UnknownVersion(version)));
    }

    store.acquire_lock().await?;
    let result = migrate_to_unlocked(store, version).await;
    release(store, result).await
}

pub async fn force<S: MarkerStore>(store: &mut S, version: i64) -> Result<(), EngineError> {
    if version < -1 {
        return Err(EngineError::new(EngineErrorKind::InvalidVersion(version)));
    }

    store.acquire_lock().await?;
    tracing::info!("Forcing version marker to {}", version);
    let result = store.set_version(version, false).await;
    release(store, result).await
}


/// Unlock, keeping the migration's own error when both fail.
async fn release<S: MarkerStore>(store: &mut S, result: Result<(), EngineError>) -> Result<(), EngineError> {
    match (store.release_lock().await, result) {
        (Ok(()), result) => result,
        (Err(unlock), Ok(())) => Err(unlock),
        (Err(unlock), Err(e)) => {
            tracing::warn!("Failed to release migration lock: {unlock}");
            Err(e)
        }
    }
}

/// Current version for planning. Refuses to plan on a dirty marker.
async fn clean_version<S: MarkerStore>(store: &mut S) -> Result<Option<u64>, EngineError> {
    match store.marker().await? {
        Some((version, true)) => Err(EngineError::new(EngineErrorKind::Dirty(version.max(0) as u64))),
        Some((version, false)) if version >= 0 => Ok(Some(version as u64)),
        _ => Ok(None),
    }
}

fn all_versions(source: &SingleFileSource) -> Result<Vec<u64>, EngineError> {
    Ok(versions(source).collect::<Result<Vec<u64>, SourceError>>()?)
}

fn section(source: &SingleFileSource, version: u64, direction: Direction) -> Result<Option<String>, EngineError> {
    let read = match direction {
        Direction::Up => source.read_up(version),
        _ => source.read_down(version),
    };

    match read {
        Ok((reader, _)) => Ok(Some(reader.into_string())),
        Err(e) if e.is_empty_section() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Mark dirty, run the section, mark clean. A failure leaves the marker dirty.
async fn run_step<S: MarkerStore>(store: &mut S, version: u64, target: i64, direction: Direction) -> Result<(), EngineError> {
    tracing::info!("{} version {}...", direction.verb(), version);
    let sql = section(store.source(), version, direction)?;

    store.set_version(target, true).await?;
    match sql {
        Some(sql) => store.execute(&sql).await?,
        None => tracing::debug!("Version {} has no {} section; only moving the marker", version, direction),
    }
    store.set_version(target, false).await?;

    Ok(())
}

async fn run_all<S: MarkerStore>(store: &mut S, plan: Vec<(u64, i64)>, direction: Direction) -> Result<(), EngineError> {
    if plan.is_empty() {
        return Err(EngineError::new(EngineErrorKind::NoChange));
    }
    for (version, target) in plan {
        run_step(store, version, target, direction).await?;
    }
    Ok(())
}

async fn up_unlocked<S: MarkerStore>(store: &mut S) -> Result<(), EngineError> {
    let current = clean_version(store).await?;
    let plan = forward_steps(&all_versions(store.source())?, current, None);
    run_all(store, plan, Direction::Up).await
}

async fn steps_unlocked<S: MarkerStore>(store: &mut S, n: i64) -> Result<(), EngineError> {
    let limit = usize::try_from(n.unsigned_abs()).unwrap_or(usize::MAX);
    let current = clean_version(store).await?;
    let all = all_versions(store.source())?;

    if n > 0 {
        run_all(store, forward_steps(&all, current, Some(limit)), Direction::Up).await
    } else {
        run_all(store, backward_steps(&all, current, None, Some(limit)), Direction::Down).await
    }
}

async fn migrate_to_unlocked<S: MarkerStore>(store: &mut S, version: u64) -> Result<(), EngineError> {
    let current = clean_version(store).await?;
    let all = all_versions(store.source())?;

    match Direction::between(current.unwrap_or(0), version) {
        Direction::Up => {
            let plan = forward_steps(&all, current, None)
                .into_iter()
                .filter(|(v, _)| *v <= version)
                .collect();
            run_all(store, plan, Direction::Up).await
        }
        Direction::Down => {
            let floor = if version == 0 { None } else { Some(version) };
            run_all(store, backward_steps(&all, current, floor, None), Direction::Down).await
        }
        Direction::None => Err(EngineError::new(EngineErrorKind::NoChange)),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MigrationFile;
    use std::path::PathBuf;

    /// In-memory marker table that records executed SQL.
    struct MemoryStore {
        source: SingleFileSource,
        row: Option<(i64, bool)>,
        executed: Vec<String>,
        fail_on: Option<&'static str>,
        fail_unlock: bool,
        locked: bool,
    }

    impl MemoryStore {
        fn new(row: Option<(i64, bool)>) -> Self {
            let files = vec![
                MigrationFile::new(1, "one", PathBuf::from("000001_one.sql"), "-- +migrate UP\nUP 1;\n-- +migrate DOWN\nDOWN 1;\n"),
                MigrationFile::new(2, "two", PathBuf::from("000002_two.sql"), "-- +migrate UP\nUP 2;\n-- +migrate DOWN\n"),
                MigrationFile::new(5, "five", PathBuf::from("000005_five.sql"), "-- +migrate UP\nUP 5;\n-- +migrate DOWN\nDOWN 5;\n"),
            ];
            MemoryStore {
                source: SingleFileSource::new(PathBuf::from("migrations"), files).unwrap(),
                row,
                executed: Vec::new(),
                fail_on: None,
                fail_unlock: false,
                locked: false,
            }
        }
    }

    impl MarkerStore for MemoryStore {
        fn source(&self) -> &SingleFileSource {
            &self.source
        }

        async fn acquire_lock(&mut self) -> Result<(), EngineError> {
            assert!(!self.locked, "Lock acquired twice");
            self.locked = true;
            Ok(())
        }

        async fn release_lock(&mut self) -> Result<(), EngineError> {
            self.locked = false;
            if self.fail_unlock {
                return Err(EngineError::new(EngineErrorKind::InvalidVersion(-99)));
            }
            Ok(())
        }

        async fn marker(&mut self) -> Result<Option<(i64, bool)>, EngineError> {
            Ok(self.row)
        }

        async fn set_version(&mut self, version: i64, dirty: bool) -> Result<(), EngineError> {
            self.row = if version >= 0 || dirty { Some((version, dirty)) } else { None };
            Ok(())
        }

        async fn execute(&mut self, sql: &str) -> Result<(), EngineError> {
            if self.fail_on == Some(sql) {
                return Err(EngineError::new(EngineErrorKind::UnknownVersion(0)));
            }
            self.executed.push(sql.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn up_applies_everything_pending() {
        let mut store = MemoryStore::new(Some((1, false)));
        up(&mut store).await.unwrap();

        assert_eq!(store.executed, vec!["UP 2;", "UP 5;"]);
        assert_eq!(version(&mut store).await.unwrap(), (5, false));
        assert!(!store.locked);

        let again = up(&mut store).await.unwrap_err();
        assert!(again.is_no_change());
    }

    #[tokio::test]
    async fn rollback_of_empty_section_only_moves_marker() {
        let mut store = MemoryStore::new(Some((5, false)));
        steps(&mut store, -2).await.unwrap();

        assert_eq!(store.executed, vec!["DOWN 5;"]);
        assert_eq!(version(&mut store).await.unwrap(), (1, false));
    }

    #[tokio::test]
    async fn migrate_to_zero_clears_the_marker() {
        let mut store = MemoryStore::new(Some((2, false)));
        migrate_to(&mut store, 0).await.unwrap();

        assert_eq!(store.executed, vec!["DOWN 1;"]);
        assert_eq!(store.row, None);

        let err = migrate_to(&mut store, 3).await.unwrap_err();
        assert!(matches!(err.kind, EngineErrorKind::UnknownVersion(3)));
    }

    #[tokio::test]
    async fn failed_step_leaves_marker_dirty() {
        let mut store = MemoryStore::new(None);
        store.fail_on = Some("UP 2;");

        let err = up(&mut store).await.unwrap_err();
        assert!(matches!(err.kind, EngineErrorKind::UnknownVersion(0)));
        assert_eq!(store.row, Some((2, true)));
        assert!(!store.locked);

        let blocked = up(&mut store).await.unwrap_err();
        assert!(matches!(blocked.kind, EngineErrorKind::Dirty(2)));
    }

    #[tokio::test]
    async fn unlock_failure_does_not_mask_migration_error() {
        let mut store = MemoryStore::new(None);
        store.fail_on = Some("UP 1;");
        store.fail_unlock = true;

        let err = up(&mut store).await.unwrap_err();
        assert!(matches!(err.kind, EngineErrorKind::UnknownVersion(0)), "Unexpected error: {err}");

        // With nothing else going wrong, the unlock failure is what surfaces.
        let mut store = MemoryStore::new(None);
        store.fail_unlock = true;
        let err = force(&mut store, 1).await.unwrap_err();
        assert!(matches!(err.kind, EngineErrorKind::InvalidVersion(-99)), "Unexpected error: {err}");
    }

    #[tokio::test]
    async fn force_validates_and_clears() {
        let mut store = MemoryStore::new(Some((2, true)));

        let err = force(&mut store, -2).await.unwrap_err();
        assert!(matches!(err.kind, EngineErrorKind::InvalidVersion(-2)));

        force(&mut store, -1).await.unwrap();
        assert_eq!(version(&mut store).await.unwrap(), (0, false));
        assert!(store.executed.is_empty());
    }
}
