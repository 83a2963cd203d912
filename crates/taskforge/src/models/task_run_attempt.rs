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

//! Task Run Attempt Model
//!
//! One execution try of a run. Attempts are created and driven by the
//! execution engine; the trigger pipeline reads them to gate dependent runs.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// An execution attempt of a task run.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::database::schema::task_run_attempts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TaskRunAttempt {
    pub id: String,
    /// Human-readable prefixed identifier (`attempt_…`)
    pub friendly_id: String,
    pub task_run_id: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A new attempt record.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::database::schema::task_run_attempts)]
pub struct NewTaskRunAttempt {
    pub id: String,
    pub friendly_id: String,
    pub task_run_id: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
