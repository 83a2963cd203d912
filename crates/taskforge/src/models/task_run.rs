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

//! Task Run Model
//!
//! The durable record of one task invocation. Rows are created exclusively
//! by the run creation stage of the trigger pipeline and mutated thereafter
//! only by the execution engine.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// A persisted task run.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::database::schema::task_runs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TaskRun {
    /// Primary key
    pub id: String,
    /// Human-readable prefixed identifier (`run_…`)
    pub friendly_id: String,
    pub environment_id: String,
    pub project_id: String,
    pub organization_id: String,
    /// Slug of the task definition this run executes
    pub task_identifier: String,
    /// Per-(environment, task) monotonic counter, starting at 1
    pub number: i32,
    pub idempotency_key: Option<String>,
    /// Lifecycle status, owned by the execution engine
    pub status: String,
    pub queue_name: String,
    /// Worker-pool partition used by the engine to route the run
    pub master_queue: String,
    /// Inline serialized payload, or a storage locator when offloaded
    pub payload: Option<String>,
    pub payload_type: String,
    pub metadata: Option<String>,
    pub metadata_type: String,
    /// Metadata as it was at trigger time
    pub seed_metadata: Option<String>,
    pub seed_metadata_type: Option<String>,
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub concurrency_key: Option<String>,
    /// When set, the run is not claimable before this time
    pub delay_until: Option<NaiveDateTime>,
    /// Set iff the run was enqueued immediately (no delay)
    pub queued_at: Option<NaiveDateTime>,
    /// Duration string after which an unstarted run expires
    pub ttl: Option<String>,
    pub max_attempts: Option<i32>,
    /// JSON array of tag names
    pub tags: String,
    /// JSON array of tag row ids
    pub tag_ids: String,
    /// Distance from the root of the parent/child chain
    pub depth: i32,
    pub parent_task_run_id: Option<String>,
    pub root_task_run_id: Option<String>,
    pub batch_id: Option<String>,
    /// Whether the engine resumes the waiting parent when this run finishes
    pub resume_parent_on_completion: bool,
    pub locked_to_version_id: Option<String>,
    pub is_test: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TaskRun {
    /// Tag names attached to this run.
    pub fn tag_names(&self) -> Vec<String> {
        serde_json::from_str(&self.tags).unwrap_or_default()
    }
}

/// A new task run to be inserted by the engine's trigger contract.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::database::schema::task_runs)]
pub struct NewTaskRun {
    pub id: String,
    pub friendly_id: String,
    pub environment_id: String,
    pub project_id: String,
    pub organization_id: String,
    pub task_identifier: String,
    pub number: i32,
    pub idempotency_key: Option<String>,
    pub status: String,
    pub queue_name: String,
    pub master_queue: String,
    pub payload: Option<String>,
    pub payload_type: String,
    pub metadata: Option<String>,
    pub metadata_type: String,
    pub seed_metadata: Option<String>,
    pub seed_metadata_type: Option<String>,
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub concurrency_key: Option<String>,
    pub delay_until: Option<NaiveDateTime>,
    pub queued_at: Option<NaiveDateTime>,
    pub ttl: Option<String>,
    pub max_attempts: Option<i32>,
    pub tags: String,
    pub tag_ids: String,
    pub depth: i32,
    pub parent_task_run_id: Option<String>,
    pub root_task_run_id: Option<String>,
    pub batch_id: Option<String>,
    pub resume_parent_on_completion: bool,
    pub locked_to_version_id: Option<String>,
    pub is_test: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
