use crate::db::sql_common::{self, MarkerStore, MIGRATIONS_TABLE};
use crate::db::{EngineError, MigrationEngine};
use crate::source::SingleFileSource;

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection, SqliteConnection};
use std::str::FromStr;
use std::sync::Arc;


pub struct SqliteEngine {
    conn: SqliteConnection,
    source: Arc<SingleFileSource>,
}


impl SqliteEngine {
    /// Accepts `sqlite:`, `sqlite://` and `sqlite3://` URLs. A missing database file is created.
    pub async fn connect(conn_str: &str, source: Arc<SingleFileSource>) -> Result<Self, EngineError> {
        let url = match conn_str.strip_prefix("sqlite3:") {
            Some(rest) => format!("sqlite:{rest}"),
            None => conn_str.to_string(),
        };

        let conn = SqliteConnectOptions::from_str(&url)?
            .create_if_missing(true)
            .connect()
            .await?;
        let mut engine = SqliteEngine { conn, source };
        engine.ensure_table().await?;

        Ok(engine)
    }

    async fn ensure_table(&mut self) -> Result<(), EngineError> {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {MIGRATIONS_TABLE} (
                version BIGINT NOT NULL PRIMARY KEY,
                dirty BOOLEAN NOT NULL
            )"
        ))
            .execute(&mut self.conn)
            .await?;

        Ok(())
    }
}

impl MarkerStore for SqliteEngine {
    fn source(&self) -> &SingleFileSource {
        &self.source
    }

    // No named locks in SQLite; the database file serializes writers.
    async fn acquire_lock(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    async fn release_lock(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    async fn marker(&mut self) -> Result<Option<(i64, bool)>, EngineError> {
        let row: Option<(i64, bool)> = sqlx::query_as(&format!(
            "SELECT version, dirty FROM {MIGRATIONS_TABLE} LIMIT 1"
        ))
            .fetch_optional(&mut self.conn)
            .await?;

        Ok(row)
    }

    async fn set_version(&mut self, version: i64, dirty: bool) -> Result<(), EngineError> {
        let mut tx = self.conn.begin().await?;

        sqlx::query(&format!("DELETE FROM {MIGRATIONS_TABLE}"))
            .execute(&mut *tx)
            .await?;

        if version >= 0 || dirty {
            sqlx::query(&format!("INSERT INTO {MIGRATIONS_TABLE} (version, dirty) VALUES (?, ?)"))
                .bind(version)
                .bind(dirty)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn execute(&mut self, sql: &str) -> Result<(), EngineError> {
        sqlx::raw_sql(sql)
            .execute(&mut self.conn)
            .await?;
        Ok(())
    }
}


impl MigrationEngine for SqliteEngine {
    async fn version(&mut self) -> Result<(u64, bool), EngineError> {
        sql_common::version(self).await
    }

    async fn up(&mut self) -> Result<(), EngineError> {
        sql_common::up(self).await
    }

    async fn steps(&mut self, n: i64) -> Result<(), EngineError> {
        sql_common::steps(self, n).await
    }

    async fn migrate_to(&mut self, version: u64) -> Result<(), EngineError> {
        sql_common::migrate_to(self, version).await
    }

    async fn force(&mut self, version: i64) -> Result<(), EngineError> {
        sql_common::force(self, version).await
    }

    async fn close(self) -> Result<(), EngineError> {
        self.conn.close().await?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::EngineErrorKind;
    use std::fs;

    const USERS: &str = "-- +migrate UP\nCREATE TABLE users (id INTEGER PRIMARY KEY);\n-- +migrate DOWN\nDROP TABLE users;\n";
    const EMAIL: &str = "-- +migrate UP\nALTER TABLE users ADD COLUMN email TEXT;\nCREATE INDEX users_email ON users (email);\n-- +migrate DOWN\nDROP INDEX users_email;\nALTER TABLE users DROP COLUMN email;\n";

    async fn engine(files: &[(&str, &str)]) -> (tempfile::TempDir, SqliteEngine) {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in files {
            fs::write(dir.path().join(name), body).unwrap();
        }
        let source = Arc::new(SingleFileSource::load(dir.path()).unwrap());
        let engine = SqliteEngine::connect("sqlite::memory:", source).await.unwrap();
        (dir, engine)
    }

    async fn table_count(engine: &mut SqliteEngine, name: &str) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(name)
            .fetch_one(&mut engine.conn)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn applies_and_rolls_back_against_a_real_database() {
        let (_dir, mut engine) = engine(&[("000001_users.sql", USERS), ("000002_email.sql", EMAIL)]).await;
        assert_eq!(engine.version().await.unwrap(), (0, false));

        engine.up().await.unwrap();
        assert_eq!(engine.version().await.unwrap(), (2, false));
        assert_eq!(table_count(&mut engine, "users").await, 1);

        engine.steps(-1).await.unwrap();
        assert_eq!(engine.version().await.unwrap(), (1, false));

        engine.migrate_to(0).await.unwrap();
        assert_eq!(engine.version().await.unwrap(), (0, false));
        assert_eq!(table_count(&mut engine, "users").await, 0);

        let err = engine.migrate_to(0).await.unwrap_err();
        assert!(err.is_no_change());
    }

    #[tokio::test]
    async fn broken_migration_leaves_dirty_marker() {
        let broken = "-- +migrate UP\nCREATE TABLE nope (;\n-- +migrate DOWN\n";
        let (_dir, mut engine) = engine(&[("000001_users.sql", USERS), ("000002_broken.sql", broken)]).await;

        let err = engine.up().await.unwrap_err();
        assert!(matches!(err.kind, EngineErrorKind::SQLX(_)), "Unexpected error: {err}");
        assert_eq!(engine.version().await.unwrap(), (2, true));

        let blocked = engine.steps(1).await.unwrap_err();
        assert!(matches!(blocked.kind, EngineErrorKind::Dirty(2)));

        engine.force(1).await.unwrap();
        assert_eq!(engine.version().await.unwrap(), (1, false));
    }

    #[tokio::test]
    async fn connects_to_sqlite3_urls() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("app.db");
        let source = Arc::new(SingleFileSource::load(dir.path()).unwrap());

        let engine = SqliteEngine::connect(&format!("sqlite3://{}", db.display()), source).await.unwrap();
        engine.close().await.unwrap();
        assert!(db.exists());
    }
}
