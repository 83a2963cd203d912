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

//! Task run lookups.

use diesel::prelude::*;
use diesel::SqliteConnection;

use super::DAL;
use crate::database::schema::task_runs;
use crate::error::TriggerError;
use crate::models::TaskRun;

/// Data access layer for task run records.
#[derive(Clone)]
pub struct TaskRunDAL<'a> {
    dal: &'a DAL,
}

impl<'a> TaskRunDAL<'a> {
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Looks up a run by the unique `(environment, task, idempotency key)`
    /// tuple.
    pub async fn find_by_idempotency_key(
        &self,
        environment_id: &str,
        task_identifier: &str,
        idempotency_key: &str,
    ) -> Result<Option<TaskRun>, TriggerError> {
        let conn = self.dal.database.get_connection().await?;

        let environment_id = environment_id.to_string();
        let task_identifier = task_identifier.to_string();
        let idempotency_key = idempotency_key.to_string();
        let run = conn
            .interact(move |conn| {
                task_runs::table
                    .filter(task_runs::environment_id.eq(environment_id))
                    .filter(task_runs::task_identifier.eq(task_identifier))
                    .filter(task_runs::idempotency_key.eq(idempotency_key))
                    .select(TaskRun::as_select())
                    .first(conn)
                    .optional()
            })
            .await
            .map_err(|e| TriggerError::Connection(e.to_string()))??;

        Ok(run)
    }

    /// Looks up a run by its friendly id.
    pub async fn find_by_friendly_id(
        &self,
        friendly_id: &str,
    ) -> Result<Option<TaskRun>, TriggerError> {
        let conn = self.dal.database.get_connection().await?;

        let friendly_id = friendly_id.to_string();
        let run = conn
            .interact(move |conn| {
                task_runs::table
                    .filter(task_runs::friendly_id.eq(friendly_id))
                    .select(TaskRun::as_select())
                    .first(conn)
                    .optional()
            })
            .await
            .map_err(|e| TriggerError::Connection(e.to_string()))??;

        Ok(run)
    }

    /// Lists every run for a `(environment, task)` pair, oldest first.
    pub async fn list_for_task(
        &self,
        environment_id: &str,
        task_identifier: &str,
    ) -> Result<Vec<TaskRun>, TriggerError> {
        let conn = self.dal.database.get_connection().await?;

        let environment_id = environment_id.to_string();
        let task_identifier = task_identifier.to_string();
        let runs = conn
            .interact(move |conn| {
                task_runs::table
                    .filter(task_runs::environment_id.eq(environment_id))
                    .filter(task_runs::task_identifier.eq(task_identifier))
                    .order(task_runs::number.asc())
                    .select(TaskRun::as_select())
                    .load(conn)
            })
            .await
            .map_err(|e| TriggerError::Connection(e.to_string()))??;

        Ok(runs)
    }
}

/// Counts existing runs for a `(environment, task)` pair inside an open
/// transaction. Used to seed the run-number counter.
pub(crate) fn count_for_task(
    conn: &mut SqliteConnection,
    environment_id: &str,
    task_identifier: &str,
) -> QueryResult<i64> {
    task_runs::table
        .filter(task_runs::environment_id.eq(environment_id))
        .filter(task_runs::task_identifier.eq(task_identifier))
        .count()
        .get_result(conn)
}

/// Re-reads a run by its idempotency tuple inside an open transaction or
/// plain connection.
pub(crate) fn find_by_idempotency_key_sync(
    conn: &mut SqliteConnection,
    environment_id: &str,
    task_identifier: &str,
    idempotency_key: &str,
) -> QueryResult<Option<TaskRun>> {
    task_runs::table
        .filter(task_runs::environment_id.eq(environment_id))
        .filter(task_runs::task_identifier.eq(task_identifier))
        .filter(task_runs::idempotency_key.eq(idempotency_key))
        .select(TaskRun::as_select())
        .first(conn)
        .optional()
}
