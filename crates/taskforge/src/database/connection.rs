/*
 *  Copyright 2026 Taskforge Contributors
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Database connection management for SQLite using Diesel.
//!
//! Provides a pooled, thread-safe [`Database`] handle built on
//! `deadpool-diesel`. Queries run inside `interact` closures on a blocking
//! thread; write transactions use `immediate_transaction` so concurrent
//! writers are serialized by SQLite's single-writer lock.

use deadpool::Runtime;
use deadpool_diesel::sqlite::{Connection, Manager, Pool};
use diesel::connection::SimpleConnection;
use diesel::SqliteConnection;
use tracing::info;

use crate::error::TriggerError;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS task_runs (
    id TEXT PRIMARY KEY,
    friendly_id TEXT NOT NULL UNIQUE,
    environment_id TEXT NOT NULL,
    project_id TEXT NOT NULL,
    organization_id TEXT NOT NULL,
    task_identifier TEXT NOT NULL,
    number INTEGER NOT NULL,
    idempotency_key TEXT,
    status TEXT NOT NULL,
    queue_name TEXT NOT NULL,
    master_queue TEXT NOT NULL,
    payload TEXT,
    payload_type TEXT NOT NULL,
    metadata TEXT,
    metadata_type TEXT NOT NULL,
    seed_metadata TEXT,
    seed_metadata_type TEXT,
    trace_id TEXT NOT NULL,
    span_id TEXT NOT NULL,
    parent_span_id TEXT,
    concurrency_key TEXT,
    delay_until TIMESTAMP,
    queued_at TIMESTAMP,
    ttl TEXT,
    max_attempts INTEGER,
    tags TEXT NOT NULL,
    tag_ids TEXT NOT NULL,
    depth INTEGER NOT NULL,
    parent_task_run_id TEXT,
    root_task_run_id TEXT,
    batch_id TEXT,
    resume_parent_on_completion BOOLEAN NOT NULL,
    locked_to_version_id TEXT,
    is_test BOOLEAN NOT NULL,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_task_runs_idempotency
    ON task_runs (environment_id, task_identifier, idempotency_key);

CREATE TABLE IF NOT EXISTS task_run_attempts (
    id TEXT PRIMARY KEY,
    friendly_id TEXT NOT NULL UNIQUE,
    task_run_id TEXT NOT NULL REFERENCES task_runs (id),
    status TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS batch_task_runs (
    id TEXT PRIMARY KEY,
    friendly_id TEXT NOT NULL UNIQUE,
    environment_id TEXT NOT NULL,
    dependent_task_attempt_id TEXT,
    created_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS background_workers (
    id TEXT PRIMARY KEY,
    friendly_id TEXT NOT NULL UNIQUE,
    version TEXT NOT NULL,
    project_id TEXT NOT NULL,
    environment_id TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL,
    UNIQUE (project_id, environment_id, version)
);

CREATE TABLE IF NOT EXISTS background_worker_tasks (
    id TEXT PRIMARY KEY,
    friendly_id TEXT NOT NULL UNIQUE,
    worker_id TEXT NOT NULL REFERENCES background_workers (id),
    slug TEXT NOT NULL,
    queue_config TEXT,
    created_at TIMESTAMP NOT NULL,
    UNIQUE (worker_id, slug)
);

CREATE TABLE IF NOT EXISTS worker_deployment_promotions (
    environment_id TEXT PRIMARY KEY,
    background_worker_id TEXT NOT NULL REFERENCES background_workers (id)
);

CREATE TABLE IF NOT EXISTS task_run_number_counters (
    counter_key TEXT PRIMARY KEY,
    last_number INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS task_run_tags (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    project_id TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL,
    UNIQUE (project_id, name)
);

CREATE TABLE IF NOT EXISTS run_queue (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    task_run_id TEXT NOT NULL REFERENCES task_runs (id),
    queue_name TEXT NOT NULL,
    master_queue TEXT NOT NULL,
    available_at TIMESTAMP NOT NULL,
    created_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS trigger_events (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    task_slug TEXT NOT NULL,
    trace_id TEXT NOT NULL,
    span_id TEXT NOT NULL,
    parent_span_id TEXT,
    attributes TEXT NOT NULL,
    is_error BOOLEAN NOT NULL,
    created_at TIMESTAMP NOT NULL
);
"#;

/// A pool of SQLite database connections.
///
/// The handle is `Clone`; each clone references the same underlying pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool,
}

impl Database {
    /// Creates a new connection pool for the database at `database_path`.
    pub fn new(database_path: &str, max_size: usize) -> Result<Self, TriggerError> {
        let manager = Manager::new(database_path, Runtime::Tokio1);
        let pool = Pool::builder(manager)
            .max_size(max_size)
            .build()
            .map_err(|e| TriggerError::Connection(e.to_string()))?;

        info!(database_path, "Database connection pool initialized");
        Ok(Self { pool })
    }

    /// Gets a connection from the pool.
    pub async fn get_connection(&self) -> Result<Connection, TriggerError> {
        self.pool
            .get()
            .await
            .map_err(|e| TriggerError::Connection(e.to_string()))
    }

    /// Gets a connection prepared for writing.
    ///
    /// `busy_timeout` is per-connection state: without it a second writer
    /// fails immediately with SQLITE_BUSY instead of waiting its turn.
    pub(crate) async fn write_connection(&self) -> Result<Connection, TriggerError> {
        let conn = self.get_connection().await?;
        conn.interact(configure_write_connection)
            .await
            .map_err(|e| TriggerError::Connection(e.to_string()))??;
        Ok(conn)
    }

    /// Creates the schema if it does not exist and switches the journal to
    /// WAL so readers never block on the single writer.
    pub async fn setup(&self) -> Result<(), TriggerError> {
        let conn = self.get_connection().await?;
        conn.interact(|conn| {
            conn.batch_execute("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")?;
            conn.batch_execute(SCHEMA_SQL)
        })
        .await
        .map_err(|e| TriggerError::Connection(e.to_string()))??;

        info!("Database schema initialized");
        Ok(())
    }
}

fn configure_write_connection(conn: &mut SqliteConnection) -> Result<(), diesel::result::Error> {
    conn.batch_execute("PRAGMA busy_timeout = 5000;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_setup_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let database = Database::new(path.to_str().unwrap(), 2).unwrap();

        database.setup().await.unwrap();
        database.setup().await.unwrap();
    }

    #[tokio::test]
    async fn test_pool_hands_out_connections() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let database = Database::new(path.to_str().unwrap(), 2).unwrap();
        database.setup().await.unwrap();

        let conn = database.get_connection().await.unwrap();
        let count: i64 = conn
            .interact(|conn| {
                use crate::database::schema::task_runs::dsl::*;
                use diesel::prelude::*;
                task_runs.count().get_result(conn)
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(count, 0);
    }
}
