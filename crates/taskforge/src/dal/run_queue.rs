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

//! Run queue reads.
//!
//! Queue rows are inserted by the engine's trigger contract in the same
//! transaction as the run itself; the execution side claims and deletes
//! them. This DAL exposes the read surface.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use super::DAL;
use crate::database::schema::run_queue;
use crate::engine::RunQueueEntry;
use crate::error::TriggerError;

/// Data access layer for queued run entries.
#[derive(Clone)]
pub struct RunQueueDAL<'a> {
    dal: &'a DAL,
}

impl<'a> RunQueueDAL<'a> {
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Finds the queue entry for a run, if one exists.
    pub async fn find_for_run(
        &self,
        task_run_id: &str,
    ) -> Result<Option<RunQueueEntry>, TriggerError> {
        let conn = self.dal.database.get_connection().await?;

        let task_run_id = task_run_id.to_string();
        let entry = conn
            .interact(move |conn| {
                run_queue::table
                    .filter(run_queue::task_run_id.eq(task_run_id))
                    .select(RunQueueEntry::as_select())
                    .first(conn)
                    .optional()
            })
            .await
            .map_err(|e| TriggerError::Connection(e.to_string()))??;

        Ok(entry)
    }

    /// Lists entries whose `available_at` has passed, oldest first.
    pub async fn list_ready(
        &self,
        now: NaiveDateTime,
        limit: i64,
    ) -> Result<Vec<RunQueueEntry>, TriggerError> {
        let conn = self.dal.database.get_connection().await?;

        let entries = conn
            .interact(move |conn| {
                run_queue::table
                    .filter(run_queue::available_at.le(now))
                    .order(run_queue::available_at.asc())
                    .limit(limit)
                    .select(RunQueueEntry::as_select())
                    .load(conn)
            })
            .await
            .map_err(|e| TriggerError::Connection(e.to_string()))??;

        Ok(entries)
    }
}
