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

//! Batch task run lookups.

use chrono::Utc;
use diesel::prelude::*;

use super::DAL;
use crate::database::schema::batch_task_runs;
use crate::error::TriggerError;
use crate::models::{generate_friendly_id, BatchTaskRun, NewBatchTaskRun};

/// Data access layer for batch records.
#[derive(Clone)]
pub struct BatchTaskRunDAL<'a> {
    dal: &'a DAL,
}

impl<'a> BatchTaskRunDAL<'a> {
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Looks up a batch by its friendly id.
    pub async fn find_by_friendly_id(
        &self,
        friendly_id: &str,
    ) -> Result<Option<BatchTaskRun>, TriggerError> {
        let conn = self.dal.database.get_connection().await?;

        let friendly_id = friendly_id.to_string();
        let batch = conn
            .interact(move |conn| {
                batch_task_runs::table
                    .filter(batch_task_runs::friendly_id.eq(friendly_id))
                    .select(BatchTaskRun::as_select())
                    .first(conn)
                    .optional()
            })
            .await
            .map_err(|e| TriggerError::Connection(e.to_string()))??;

        Ok(batch)
    }

    /// Creates a batch record, optionally attached to a dependent attempt.
    pub async fn create(
        &self,
        environment_id: &str,
        dependent_task_attempt_id: Option<&str>,
    ) -> Result<BatchTaskRun, TriggerError> {
        let conn = self.dal.database.write_connection().await?;

        let new_batch = NewBatchTaskRun {
            id: generate_friendly_id("batch"),
            friendly_id: generate_friendly_id("batch"),
            environment_id: environment_id.to_string(),
            dependent_task_attempt_id: dependent_task_attempt_id.map(str::to_string),
            created_at: Utc::now().naive_utc(),
        };
        let id = new_batch.id.clone();

        let batch = conn
            .interact(move |conn| {
                diesel::insert_into(batch_task_runs::table)
                    .values(&new_batch)
                    .execute(conn)?;
                batch_task_runs::table
                    .find(id)
                    .select(BatchTaskRun::as_select())
                    .first(conn)
            })
            .await
            .map_err(|e| TriggerError::Connection(e.to_string()))??;

        Ok(batch)
    }
}
