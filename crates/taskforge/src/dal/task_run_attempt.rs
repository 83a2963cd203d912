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

//! Task run attempt lookups.
//!
//! The trigger pipeline reads attempts (with their joined run rows) to
//! resolve dependency references; attempt creation belongs to the execution
//! engine and is exposed here for it and for test fixtures.

use chrono::Utc;
use diesel::prelude::*;

use super::DAL;
use crate::database::schema::{task_run_attempts, task_runs};
use crate::error::TriggerError;
use crate::models::{generate_friendly_id, NewTaskRunAttempt, TaskRun, TaskRunAttempt};

/// Data access layer for task run attempts.
#[derive(Clone)]
pub struct TaskRunAttemptDAL<'a> {
    dal: &'a DAL,
}

impl<'a> TaskRunAttemptDAL<'a> {
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Loads an attempt by friendly id together with its run row.
    pub async fn find_by_friendly_id_with_run(
        &self,
        friendly_id: &str,
    ) -> Result<Option<(TaskRunAttempt, TaskRun)>, TriggerError> {
        let conn = self.dal.database.get_connection().await?;

        let friendly_id = friendly_id.to_string();
        let row = conn
            .interact(move |conn| {
                task_run_attempts::table
                    .inner_join(task_runs::table)
                    .filter(task_run_attempts::friendly_id.eq(friendly_id))
                    .select((TaskRunAttempt::as_select(), TaskRun::as_select()))
                    .first::<(TaskRunAttempt, TaskRun)>(conn)
                    .optional()
            })
            .await
            .map_err(|e| TriggerError::Connection(e.to_string()))??;

        Ok(row)
    }

    /// Loads an attempt by primary key together with its run row.
    pub async fn find_by_id_with_run(
        &self,
        attempt_id: &str,
    ) -> Result<Option<(TaskRunAttempt, TaskRun)>, TriggerError> {
        let conn = self.dal.database.get_connection().await?;

        let attempt_id = attempt_id.to_string();
        let row = conn
            .interact(move |conn| {
                task_run_attempts::table
                    .inner_join(task_runs::table)
                    .filter(task_run_attempts::id.eq(attempt_id))
                    .select((TaskRunAttempt::as_select(), TaskRun::as_select()))
                    .first::<(TaskRunAttempt, TaskRun)>(conn)
                    .optional()
            })
            .await
            .map_err(|e| TriggerError::Connection(e.to_string()))??;

        Ok(row)
    }

    /// Creates an attempt record for an existing run.
    pub async fn create(
        &self,
        task_run_id: &str,
        status: &str,
    ) -> Result<TaskRunAttempt, TriggerError> {
        let conn = self.dal.database.write_connection().await?;

        let now = Utc::now().naive_utc();
        let new_attempt = NewTaskRunAttempt {
            id: generate_friendly_id("attempt"),
            friendly_id: generate_friendly_id("attempt"),
            task_run_id: task_run_id.to_string(),
            status: status.to_string(),
            created_at: now,
            updated_at: now,
        };
        let id = new_attempt.id.clone();

        let attempt = conn
            .interact(move |conn| {
                diesel::insert_into(task_run_attempts::table)
                    .values(&new_attempt)
                    .execute(conn)?;
                task_run_attempts::table
                    .find(id)
                    .select(TaskRunAttempt::as_select())
                    .first(conn)
            })
            .await
            .map_err(|e| TriggerError::Connection(e.to_string()))??;

        Ok(attempt)
    }
}
