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

//! Diesel table definitions for the trigger pipeline.
//!
//! Ids are prefixed friendly identifiers stored as TEXT; timestamps are
//! generated client-side. Column order must match the corresponding
//! `Queryable` structs in [`crate::models`].

diesel::table! {
    task_runs (id) {
        id -> Text,
        friendly_id -> Text,
        environment_id -> Text,
        project_id -> Text,
        organization_id -> Text,
        task_identifier -> Text,
        number -> Integer,
        idempotency_key -> Nullable<Text>,
        status -> Text,
        queue_name -> Text,
        master_queue -> Text,
        payload -> Nullable<Text>,
        payload_type -> Text,
        metadata -> Nullable<Text>,
        metadata_type -> Text,
        seed_metadata -> Nullable<Text>,
        seed_metadata_type -> Nullable<Text>,
        trace_id -> Text,
        span_id -> Text,
        parent_span_id -> Nullable<Text>,
        concurrency_key -> Nullable<Text>,
        delay_until -> Nullable<Timestamp>,
        queued_at -> Nullable<Timestamp>,
        ttl -> Nullable<Text>,
        max_attempts -> Nullable<Integer>,
        tags -> Text,
        tag_ids -> Text,
        depth -> Integer,
        parent_task_run_id -> Nullable<Text>,
        root_task_run_id -> Nullable<Text>,
        batch_id -> Nullable<Text>,
        resume_parent_on_completion -> Bool,
        locked_to_version_id -> Nullable<Text>,
        is_test -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    task_run_attempts (id) {
        id -> Text,
        friendly_id -> Text,
        task_run_id -> Text,
        status -> Text,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    batch_task_runs (id) {
        id -> Text,
        friendly_id -> Text,
        environment_id -> Text,
        dependent_task_attempt_id -> Nullable<Text>,
        created_at -> Timestamp,
    }
}

diesel::table! {
    background_workers (id) {
        id -> Text,
        friendly_id -> Text,
        version -> Text,
        project_id -> Text,
        environment_id -> Text,
        content_hash -> Text,
        created_at -> Timestamp,
    }
}

diesel::table! {
    background_worker_tasks (id) {
        id -> Text,
        friendly_id -> Text,
        worker_id -> Text,
        slug -> Text,
        queue_config -> Nullable<Text>,
        created_at -> Timestamp,
    }
}

diesel::table! {
    worker_deployment_promotions (environment_id) {
        environment_id -> Text,
        background_worker_id -> Text,
    }
}

diesel::table! {
    task_run_number_counters (counter_key) {
        counter_key -> Text,
        last_number -> Integer,
    }
}

diesel::table! {
    task_run_tags (id) {
        id -> Text,
        name -> Text,
        project_id -> Text,
        created_at -> Timestamp,
    }
}

diesel::table! {
    run_queue (id) {
        id -> Integer,
        task_run_id -> Text,
        queue_name -> Text,
        master_queue -> Text,
        available_at -> Timestamp,
        created_at -> Timestamp,
    }
}

diesel::table! {
    trigger_events (id) {
        id -> Text,
        kind -> Text,
        task_slug -> Text,
        trace_id -> Text,
        span_id -> Text,
        parent_span_id -> Nullable<Text>,
        attributes -> Text,
        is_error -> Bool,
        created_at -> Timestamp,
    }
}

diesel::joinable!(task_run_attempts -> task_runs (task_run_id));
diesel::joinable!(background_worker_tasks -> background_workers (worker_id));
diesel::joinable!(worker_deployment_promotions -> background_workers (background_worker_id));
diesel::joinable!(run_queue -> task_runs (task_run_id));

diesel::allow_tables_to_appear_in_same_query!(
    task_runs,
    task_run_attempts,
    batch_task_runs,
    background_workers,
    background_worker_tasks,
    worker_deployment_promotions,
    task_run_number_counters,
    task_run_tags,
    run_queue,
    trigger_events,
);
