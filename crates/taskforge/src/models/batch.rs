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

//! Batch Task Run Model
//!
//! A fan-out batch created by a single client call. The optional dependent
//! attempt is the attempt that blocks on the whole batch; its terminal
//! status gates the creation of further batch children.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// A batch of runs fanned out from a single call.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::database::schema::batch_task_runs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BatchTaskRun {
    pub id: String,
    /// Human-readable prefixed identifier (`batch_…`)
    pub friendly_id: String,
    pub environment_id: String,
    /// Attempt waiting on this batch, if any
    pub dependent_task_attempt_id: Option<String>,
    pub created_at: NaiveDateTime,
}

/// A new batch record.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::database::schema::batch_task_runs)]
pub struct NewBatchTaskRun {
    pub id: String,
    pub friendly_id: String,
    pub environment_id: String,
    pub dependent_task_attempt_id: Option<String>,
    pub created_at: NaiveDateTime,
}
