use crate::db::sql_common::{self, MarkerStore, MIGRATIONS_TABLE};
use crate::db::{EngineError, MigrationEngine};
use crate::source::SingleFileSource;

use sqlx::{Connection, PgConnection};
use std::sync::Arc;


// Arbitrary but fixed so concurrent invocations serialize on the same key.
const ADVISORY_LOCK_KEY: i64 = 0x6d69_6772_6174_6521;


pub struct PostgresEngine {
    conn: PgConnection,
    source: Arc<SingleFileSource>,
}


impl PostgresEngine {
    pub async fn connect(conn_str: &str, source: Arc<SingleFileSource>) -> Result<Self, EngineError> {
        let conn = PgConnection::connect(conn_str).await?;
        let mut engine = PostgresEngine { conn, source };
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

impl MarkerStore for PostgresEngine {
    fn source(&self) -> &SingleFileSource {
        &self.source
    }

    async fn acquire_lock(&mut self) -> Result<(), EngineError> {
        sqlx::query("SELECT pg_advisory_lock($1)")
            .bind(ADVISORY_LOCK_KEY)
            .execute(&mut self.conn)
            .await?;
        Ok(())
    }

    async fn release_lock(&mut self) -> Result<(), EngineError> {
        sqlx::query("SELECT pg_advisory_unlock($1)")
            .bind(ADVISORY_LOCK_KEY)
            .execute(&mut self.conn)
            .await?;
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

        sqlx::query(&format!("TRUNCATE {MIGRATIONS_TABLE}"))
            .execute(&mut *tx)
            .await?;

        // A nil version is only stored while dirty, so a failed rollback of the first migration stays visible.
        if version >= 0 || dirty {
            sqlx::query(&format!("INSERT INTO {MIGRATIONS_TABLE} (version, dirty) VALUES ($1, $2)"))
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


// Every mutating call holds the advisory lock and releases it on every path.
impl MigrationEngine for PostgresEngine {
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
