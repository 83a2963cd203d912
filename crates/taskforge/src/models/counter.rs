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

//! Run Number Counter Model
//!
//! One row per counter key. `last_number` is strictly increasing; the
//! increment primitive in [`crate::dal::counter`] serializes concurrent
//! callers sharing a key.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// A monotonic counter row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::database::schema::task_run_number_counters)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TaskRunNumberCounter {
    pub counter_key: String,
    pub last_number: i32,
}
