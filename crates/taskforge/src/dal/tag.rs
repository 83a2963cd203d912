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

//! Tag upserts (get-or-create per tag string).

use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;

use super::DAL;
use crate::database::schema::task_run_tags;
use crate::error::TriggerError;
use crate::models::{generate_friendly_id, NewTaskRunTag, TaskRunTag};

/// Data access layer for project-scoped run tags.
#[derive(Clone)]
pub struct TaskRunTagDAL<'a> {
    dal: &'a DAL,
}

impl<'a> TaskRunTagDAL<'a> {
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Gets or creates the tag with the given name in a project.
    pub async fn upsert(&self, name: &str, project_id: &str) -> Result<TaskRunTag, TriggerError> {
        let conn = self.dal.database.write_connection().await?;

        let name = name.to_string();
        let project_id = project_id.to_string();
        let tag = conn
            .interact(move |conn| upsert_tag(conn, &name, &project_id))
            .await
            .map_err(|e| TriggerError::Connection(e.to_string()))??;

        Ok(tag)
    }

    /// Lists tags for a project, by name.
    pub async fn list_for_project(
        &self,
        project_id: &str,
    ) -> Result<Vec<TaskRunTag>, TriggerError> {
        let conn = self.dal.database.get_connection().await?;

        let project_id = project_id.to_string();
        let tags = conn
            .interact(move |conn| {
                task_run_tags::table
                    .filter(task_run_tags::project_id.eq(project_id))
                    .order(task_run_tags::name.asc())
                    .select(TaskRunTag::as_select())
                    .load(conn)
            })
            .await
            .map_err(|e| TriggerError::Connection(e.to_string()))??;

        Ok(tags)
    }
}

/// Get-or-create for a tag string inside an open transaction.
pub(crate) fn upsert_tag(
    conn: &mut SqliteConnection,
    name: &str,
    project_id: &str,
) -> QueryResult<TaskRunTag> {
    let new_tag = NewTaskRunTag {
        id: generate_friendly_id("tag"),
        name: name.to_string(),
        project_id: project_id.to_string(),
        created_at: Utc::now().naive_utc(),
    };

    diesel::insert_into(task_run_tags::table)
        .values(&new_tag)
        .on_conflict((task_run_tags::project_id, task_run_tags::name))
        .do_nothing()
        .execute(conn)?;

    task_run_tags::table
        .filter(task_run_tags::project_id.eq(project_id))
        .filter(task_run_tags::name.eq(name))
        .select(TaskRunTag::as_select())
        .first(conn)
}
