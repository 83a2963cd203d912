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

//! Monotonic run-number counters.
//!
//! The increment primitive runs inside the caller's IMMEDIATE transaction:
//! SQLite's single-writer lock serializes concurrent callers, so two
//! increments of the same key observe strictly consecutive values and the
//! row reflects them in commit order. The counter bump and the caller's
//! other writes commit or roll back together.
//!
//! Counters are dedicated rows rather than database sequences: each key is
//! dynamic and its initial value is derived from existing data at first use.

use diesel::prelude::*;
use diesel::SqliteConnection;

use super::DAL;
use crate::database::schema::task_run_number_counters;
use crate::error::TriggerError;
use crate::models::TaskRunNumberCounter;

/// Data access layer for counter rows.
#[derive(Clone)]
pub struct RunCounterDAL<'a> {
    dal: &'a DAL,
}

impl<'a> RunCounterDAL<'a> {
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Reads a counter row, if it has been seeded.
    pub async fn get(&self, counter_key: &str) -> Result<Option<TaskRunNumberCounter>, TriggerError> {
        let conn = self.dal.database.get_connection().await?;

        let counter_key = counter_key.to_string();
        let counter = conn
            .interact(move |conn| {
                task_run_number_counters::table
                    .find(counter_key)
                    .select(TaskRunNumberCounter::as_select())
                    .first(conn)
                    .optional()
            })
            .await
            .map_err(|e| TriggerError::Connection(e.to_string()))??;

        Ok(counter)
    }
}

/// Bumps the counter for `counter_key` inside the caller's open write
/// transaction and returns the new value.
///
/// When no row exists yet, `derive_initial` supplies the pre-state the
/// counter would have had, and the row is seeded at `initial + 1`.
pub(crate) fn increment_in_transaction<F>(
    conn: &mut SqliteConnection,
    counter_key: &str,
    derive_initial: F,
) -> QueryResult<i32>
where
    F: FnOnce(&mut SqliteConnection) -> QueryResult<i32>,
{
    let existing: Option<TaskRunNumberCounter> = task_run_number_counters::table
        .find(counter_key)
        .select(TaskRunNumberCounter::as_select())
        .first(conn)
        .optional()?;

    let next = match existing {
        Some(counter) => {
            let next = counter.last_number + 1;
            diesel::update(task_run_number_counters::table.find(counter_key))
                .set(task_run_number_counters::last_number.eq(next))
                .execute(conn)?;
            next
        }
        None => {
            let initial = derive_initial(conn)?;
            let next = initial + 1;
            diesel::insert_into(task_run_number_counters::table)
                .values(TaskRunNumberCounter {
                    counter_key: counter_key.to_string(),
                    last_number: next,
                })
                .execute(conn)?;
            next
        }
    };

    Ok(next)
}
