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

//! Task Run Tag Model
//!
//! String labels scoped to a project, upserted per tag string.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// A project-scoped tag. Unique on `(project_id, name)`.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::database::schema::task_run_tags)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TaskRunTag {
    pub id: String,
    pub name: String,
    pub project_id: String,
    pub created_at: NaiveDateTime,
}

/// A new tag record.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::database::schema::task_run_tags)]
pub struct NewTaskRunTag {
    pub id: String,
    pub name: String,
    pub project_id: String,
    pub created_at: NaiveDateTime,
}
