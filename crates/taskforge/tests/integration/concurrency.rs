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

//! Concurrency properties of the trigger pipeline.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use serde_json::json;
use taskforge::trigger::TriggerTaskCallOptions;

use crate::fixtures::{body, harness, production_environment, TestHarness};

async fn trigger_once(
    harness: Arc<TestHarness>,
    task_id: &'static str,
    options_json: serde_json::Value,
) -> taskforge::models::TaskRun {
    let environment = production_environment();
    harness
        .service
        .trigger_task(
            task_id,
            &environment,
            body(json!({"payload": {}, "options": options_json})),
            TriggerTaskCallOptions::default(),
        )
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_numbers_are_contiguous() {
    let harness = Arc::new(harness().await);
    let environment = production_environment();

    const N: usize = 8;
    let mut handles = Vec::with_capacity(N);
    for _ in 0..N {
        let harness = harness.clone();
        handles.push(tokio::spawn(trigger_once(harness, "fanout", json!({}))));
    }

    let mut numbers = Vec::with_capacity(N);
    for handle in handles {
        numbers.push(handle.await.unwrap().number);
    }
    numbers.sort_unstable();

    // No gaps, no duplicates: exactly [1, N].
    let expected: Vec<i32> = (1..=N as i32).collect();
    assert_eq!(numbers, expected);

    let runs = harness
        .dal
        .task_runs()
        .list_for_task(&environment.id, "fanout")
        .await
        .unwrap();
    assert_eq!(runs.len(), N);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_idempotent_requests_converge() {
    let harness = Arc::new(harness().await);
    let environment = production_environment();

    const N: usize = 6;
    let handles: Vec<_> = (0..N)
        .map(|_| {
            tokio::spawn(trigger_once(
                harness.clone(),
                "dedup",
                json!({"idempotencyKey": "abc"}),
            ))
        })
        .collect();

    let mut ids = HashSet::new();
    for result in join_all(handles).await {
        ids.insert(result.unwrap().id);
    }

    // Every call returned the same run, and exactly one was persisted.
    assert_eq!(ids.len(), 1);
    let runs = harness
        .dal
        .task_runs()
        .list_for_task(&environment.id, "dedup")
        .await
        .unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].number, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_interleaved_tasks_count_independently() {
    let harness = Arc::new(harness().await);
    let environment = production_environment();

    let mut handles = Vec::new();
    for _ in 0..4 {
        handles.push(tokio::spawn(trigger_once(harness.clone(), "alpha", json!({}))));
        handles.push(tokio::spawn(trigger_once(harness.clone(), "beta", json!({}))));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    for task in ["alpha", "beta"] {
        let mut numbers: Vec<i32> = harness
            .dal
            .task_runs()
            .list_for_task(&environment.id, task)
            .await
            .unwrap()
            .into_iter()
            .map(|run| run.number)
            .collect();
        numbers.sort_unstable();
        assert_eq!(numbers, vec![1, 2, 3, 4], "task {task}");
    }
}
