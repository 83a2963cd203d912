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

//! Background worker lookups.
//!
//! The trigger pipeline resolves the "current" worker for an environment
//! through its deployment promotion row, finds task definitions by slug, and
//! pins runs to an exact worker version when asked to.

use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;

use super::DAL;
use crate::database::schema::{
    background_worker_tasks, background_workers, worker_deployment_promotions,
};
use crate::error::TriggerError;
use crate::models::{
    generate_friendly_id, BackgroundWorker, BackgroundWorkerTask, NewBackgroundWorker,
    NewBackgroundWorkerTask, RuntimeEnvironment, WorkerDeploymentPromotion,
};

/// Data access layer for workers, worker tasks, and promotions.
#[derive(Clone)]
pub struct BackgroundWorkerDAL<'a> {
    dal: &'a DAL,
}

impl<'a> BackgroundWorkerDAL<'a> {
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Resolves the current worker for an environment via its deployment
    /// promotion. Development environments have no promotion and always
    /// resolve to `None`.
    pub async fn find_current_worker(
        &self,
        environment: &RuntimeEnvironment,
    ) -> Result<Option<BackgroundWorker>, TriggerError> {
        if environment.env_type.is_development() {
            return Ok(None);
        }

        let conn = self.dal.database.get_connection().await?;

        let environment_id = environment.id.clone();
        let worker = conn
            .interact(move |conn| {
                worker_deployment_promotions::table
                    .inner_join(background_workers::table)
                    .filter(worker_deployment_promotions::environment_id.eq(environment_id))
                    .select(BackgroundWorker::as_select())
                    .first(conn)
                    .optional()
            })
            .await
            .map_err(|e| TriggerError::Connection(e.to_string()))??;

        Ok(worker)
    }

    /// Finds a task definition by `(worker, slug)`.
    pub async fn find_task_by_slug(
        &self,
        worker_id: &str,
        slug: &str,
    ) -> Result<Option<BackgroundWorkerTask>, TriggerError> {
        let conn = self.dal.database.get_connection().await?;

        let worker_id = worker_id.to_string();
        let slug = slug.to_string();
        let task = conn
            .interact(move |conn| {
                background_worker_tasks::table
                    .filter(background_worker_tasks::worker_id.eq(worker_id))
                    .filter(background_worker_tasks::slug.eq(slug))
                    .select(BackgroundWorkerTask::as_select())
                    .first(conn)
                    .optional()
            })
            .await
            .map_err(|e| TriggerError::Connection(e.to_string()))??;

        Ok(task)
    }

    /// Registers a worker bundle for an environment.
    pub async fn create_worker(
        &self,
        environment: &RuntimeEnvironment,
        version: &str,
        content_hash: &str,
    ) -> Result<BackgroundWorker, TriggerError> {
        let conn = self.dal.database.write_connection().await?;

        let new_worker = NewBackgroundWorker {
            id: generate_friendly_id("worker"),
            friendly_id: generate_friendly_id("worker"),
            version: version.to_string(),
            project_id: environment.project_id.clone(),
            environment_id: environment.id.clone(),
            content_hash: content_hash.to_string(),
            created_at: Utc::now().naive_utc(),
        };
        let id = new_worker.id.clone();

        let worker = conn
            .interact(move |conn| {
                diesel::insert_into(background_workers::table)
                    .values(&new_worker)
                    .execute(conn)?;
                background_workers::table
                    .find(id)
                    .select(BackgroundWorker::as_select())
                    .first(conn)
            })
            .await
            .map_err(|e| TriggerError::Connection(e.to_string()))??;

        Ok(worker)
    }

    /// Registers a task definition exported by a worker.
    pub async fn create_worker_task(
        &self,
        worker_id: &str,
        slug: &str,
        queue_config: Option<&str>,
    ) -> Result<BackgroundWorkerTask, TriggerError> {
        let conn = self.dal.database.write_connection().await?;

        let new_task = NewBackgroundWorkerTask {
            id: generate_friendly_id("task"),
            friendly_id: generate_friendly_id("task"),
            worker_id: worker_id.to_string(),
            slug: slug.to_string(),
            queue_config: queue_config.map(str::to_string),
            created_at: Utc::now().naive_utc(),
        };
        let id = new_task.id.clone();

        let task = conn
            .interact(move |conn| {
                diesel::insert_into(background_worker_tasks::table)
                    .values(&new_task)
                    .execute(conn)?;
                background_worker_tasks::table
                    .find(id)
                    .select(BackgroundWorkerTask::as_select())
                    .first(conn)
            })
            .await
            .map_err(|e| TriggerError::Connection(e.to_string()))??;

        Ok(task)
    }

    /// Promotes a worker to be the current one for an environment,
    /// replacing any previous promotion.
    pub async fn promote(
        &self,
        environment_id: &str,
        background_worker_id: &str,
    ) -> Result<(), TriggerError> {
        let conn = self.dal.database.write_connection().await?;

        let promotion = WorkerDeploymentPromotion {
            environment_id: environment_id.to_string(),
            background_worker_id: background_worker_id.to_string(),
        };

        conn.interact(move |conn| {
            diesel::insert_into(worker_deployment_promotions::table)
                .values(&promotion)
                .on_conflict(worker_deployment_promotions::environment_id)
                .do_update()
                .set(
                    worker_deployment_promotions::background_worker_id
                        .eq(&promotion.background_worker_id),
                )
                .execute(conn)
        })
        .await
        .map_err(|e| TriggerError::Connection(e.to_string()))??;

        Ok(())
    }
}

/// Resolves a worker by exact `(project, environment, version)` inside an
/// open transaction. Used for lock-to-version pinning; a missing match is
/// non-fatal to the caller.
pub(crate) fn find_by_version(
    conn: &mut SqliteConnection,
    project_id: &str,
    environment_id: &str,
    version: &str,
) -> QueryResult<Option<BackgroundWorker>> {
    background_workers::table
        .filter(background_workers::project_id.eq(project_id))
        .filter(background_workers::environment_id.eq(environment_id))
        .filter(background_workers::version.eq(version))
        .select(BackgroundWorker::as_select())
        .first(conn)
        .optional()
}
