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

//! Background Worker Models
//!
//! A worker is a registered code bundle for an environment; each worker
//! exports task definitions. In non-development environments one worker per
//! environment is "current", marked by a deployment promotion row.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// A registered code bundle for an environment.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::database::schema::background_workers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BackgroundWorker {
    pub id: String,
    /// Human-readable prefixed identifier (`worker_…`)
    pub friendly_id: String,
    /// Version label assigned at deploy time, e.g. `20260115.1`
    pub version: String,
    pub project_id: String,
    pub environment_id: String,
    /// Hash of the deployed bundle contents
    pub content_hash: String,
    pub created_at: NaiveDateTime,
}

/// A new worker record.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::database::schema::background_workers)]
pub struct NewBackgroundWorker {
    pub id: String,
    pub friendly_id: String,
    pub version: String,
    pub project_id: String,
    pub environment_id: String,
    pub content_hash: String,
    pub created_at: NaiveDateTime,
}

/// A task definition exported by a worker. Unique on `(worker_id, slug)`.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::database::schema::background_worker_tasks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BackgroundWorkerTask {
    pub id: String,
    pub friendly_id: String,
    pub worker_id: String,
    /// Task identifier as declared in worker code
    pub slug: String,
    /// Optional JSON blob carrying the worker-declared queue settings
    pub queue_config: Option<String>,
    pub created_at: NaiveDateTime,
}

/// A new worker task record.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::database::schema::background_worker_tasks)]
pub struct NewBackgroundWorkerTask {
    pub id: String,
    pub friendly_id: String,
    pub worker_id: String,
    pub slug: String,
    pub queue_config: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Marks the current worker for an environment.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = crate::database::schema::worker_deployment_promotions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WorkerDeploymentPromotion {
    pub environment_id: String,
    pub background_worker_id: String,
}

/// Queue settings a worker may declare on a task definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueConfig {
    pub name: Option<String>,
    pub concurrency_limit: Option<i32>,
}
