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

//! Run engine trigger contract.
//!
//! The engine owns everything that happens to a run after creation. The
//! trigger pipeline interacts with it through a single seam:
//! [`RunEngine::trigger`], called inside the pipeline's open write
//! transaction so that the run row, the counter bump, and the queue handoff
//! commit atomically. A successful return means the run is durably enqueued.

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use serde::{Deserialize, Serialize};

use crate::database::schema::{run_queue, task_runs};
use crate::models::{NewTaskRun, TaskRun};

/// The worker-pool partition new runs are routed to.
// TODO: route by worker pool once more than one master queue exists
pub const MASTER_QUEUE: &str = "main";

/// A durably queued run awaiting claim by the execution side.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::database::schema::run_queue)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RunQueueEntry {
    pub id: i32,
    pub task_run_id: String,
    pub queue_name: String,
    pub master_queue: String,
    /// Claimable from this time; equals `delay_until` for delayed runs
    pub available_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

/// A new queue entry.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::database::schema::run_queue)]
pub struct NewRunQueueEntry {
    pub task_run_id: String,
    pub queue_name: String,
    pub master_queue: String,
    pub available_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

/// The downstream execution engine's trigger contract.
///
/// `trigger` is called with the pipeline's open write transaction;
/// implementations must confine their writes to that connection so the
/// caller's rollback also undoes the handoff.
pub trait RunEngine: Send + Sync {
    /// Persists the run and hands it to the execution queue.
    fn trigger(&self, run: NewTaskRun, conn: &mut SqliteConnection) -> QueryResult<TaskRun>;
}

/// The built-in engine frontend: persists the run row and a queue row in
/// the caller's transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatabaseRunEngine;

impl RunEngine for DatabaseRunEngine {
    fn trigger(&self, run: NewTaskRun, conn: &mut SqliteConnection) -> QueryResult<TaskRun> {
        diesel::insert_into(task_runs::table)
            .values(&run)
            .execute(conn)?;

        let now = Utc::now().naive_utc();
        let entry = NewRunQueueEntry {
            task_run_id: run.id.clone(),
            queue_name: run.queue_name.clone(),
            master_queue: run.master_queue.clone(),
            available_at: run.delay_until.unwrap_or(now),
            created_at: now,
        };
        diesel::insert_into(run_queue::table)
            .values(&entry)
            .execute(conn)?;

        task_runs::table
            .find(run.id)
            .select(TaskRun::as_select())
            .first(conn)
    }
}
