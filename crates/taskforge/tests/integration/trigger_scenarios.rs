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

//! End-to-end trigger scenarios.

use chrono::Utc;
use serde_json::json;
use taskforge::events::{EventRepository, TraceParent};
use taskforge::trigger::{ParentRunLinkType, TriggerTaskCallOptions};
use taskforge::{ErrorCode, TriggerConfig};

use crate::fixtures::{
    body, development_environment, harness, harness_with, production_environment,
};

#[tokio::test]
async fn test_fresh_production_run_with_tags_and_delay() {
    let harness = harness().await;
    let environment = production_environment();

    let before = Utc::now().naive_utc();
    let run = harness
        .service
        .trigger_task(
            "send-email",
            &environment,
            body(json!({
                "payload": {"to": "a@b"},
                "options": {"tags": ["welcome", "v2"], "delay": "1h30m", "test": false}
            })),
            TriggerTaskCallOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(run.number, 1);
    assert_eq!(run.queue_name, "task/send-email");
    assert_eq!(run.master_queue, "main");
    assert_eq!(run.depth, 0);
    assert_eq!(run.parent_task_run_id, None);
    assert_eq!(run.tag_names(), vec!["welcome", "v2"]);
    assert!(!run.is_test);

    // Delayed runs carry delay_until and no queued_at.
    let delay_until = run.delay_until.unwrap();
    let offset = (delay_until - before).num_seconds();
    assert!((5395..=5405).contains(&offset), "unexpected delay {offset}s");
    assert_eq!(run.queued_at, None);

    // The queue row is durable but not claimable before the delay.
    let entry = harness
        .dal
        .run_queue()
        .find_for_run(&run.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.available_at, delay_until);
    assert_eq!(entry.master_queue, "main");
}

#[tokio::test]
async fn test_undelayed_run_is_queued_immediately() {
    let harness = harness().await;
    let environment = production_environment();

    let run = harness
        .service
        .trigger_task(
            "send-email",
            &environment,
            body(json!({"payload": {}})),
            TriggerTaskCallOptions::default(),
        )
        .await
        .unwrap();

    assert!(run.queued_at.is_some());
    assert_eq!(run.delay_until, None);

    let entry = harness
        .dal
        .run_queue()
        .find_for_run(&run.id)
        .await
        .unwrap()
        .unwrap();
    assert!(entry.available_at <= Utc::now().naive_utc());
}

#[tokio::test]
async fn test_idempotency_hit_returns_prior_run() {
    let harness = harness().await;
    let environment = production_environment();
    let request = json!({
        "payload": {"order": 7},
        "options": {"idempotencyKey": "abc"}
    });

    let first = harness
        .service
        .trigger_task(
            "process-order",
            &environment,
            body(request.clone()),
            TriggerTaskCallOptions::default(),
        )
        .await
        .unwrap();
    let second = harness
        .service
        .trigger_task(
            "process-order",
            &environment,
            body(request),
            TriggerTaskCallOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.number, second.number);

    // The gate short-circuits before the entitlement check and the engine.
    assert_eq!(harness.entitlement.calls(), 1);
    let runs = harness
        .dal
        .task_runs()
        .list_for_task(&environment.id, "process-order")
        .await
        .unwrap();
    assert_eq!(runs.len(), 1);

    // Only the first call traced an event.
    let events = EventRepository::new(harness.database.clone());
    assert_eq!(events.list_for_task("process-order").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_dependent_attempt_in_terminal_state_is_rejected() {
    let harness = harness().await;
    let environment = production_environment();

    let parent = harness
        .service
        .trigger_task(
            "parent-task",
            &environment,
            body(json!({"payload": {}})),
            TriggerTaskCallOptions::default(),
        )
        .await
        .unwrap();
    let attempt = harness.dal.attempts().create(&parent.id, "FAILED").await.unwrap();

    let err = harness
        .service
        .trigger_task(
            "child-task",
            &environment,
            body(json!({
                "payload": {},
                "options": {"dependentAttempt": attempt.friendly_id}
            })),
            TriggerTaskCallOptions::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::ValidationError);
    assert!(err.to_string().contains("FAILED"));

    // No run was created and nothing reached the queue.
    let runs = harness
        .dal
        .task_runs()
        .list_for_task(&environment.id, "child-task")
        .await
        .unwrap();
    assert!(runs.is_empty());
}

#[tokio::test]
async fn test_large_payload_is_offloaded() {
    let harness = harness_with(
        TriggerConfig::builder().payload_offload_threshold(64).build(),
        true,
    )
    .await;
    let environment = production_environment();

    let blob = "x".repeat(4096);
    let run = harness
        .service
        .trigger_task(
            "export-report",
            &environment,
            body(json!({"payload": {"blob": blob}})),
            TriggerTaskCallOptions::default(),
        )
        .await
        .unwrap();

    let filename = format!("{}/payload.json", run.friendly_id);
    assert_eq!(run.payload.as_deref(), Some(filename.as_str()));
    assert_eq!(run.payload_type, "application/store");

    let stored = harness.store.get(&filename).unwrap();
    assert_eq!(stored.content_type, "application/json");
    let round_tripped: serde_json::Value = serde_json::from_slice(&stored.body).unwrap();
    assert_eq!(round_tripped["blob"].as_str().unwrap().len(), 4096);
    assert_eq!(harness.store.len(), 1);
}

#[tokio::test]
async fn test_small_payload_stays_inline() {
    let harness = harness().await;
    let environment = production_environment();

    let run = harness
        .service
        .trigger_task(
            "send-email",
            &environment,
            body(json!({"payload": {"to": "a@b"}})),
            TriggerTaskCallOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(run.payload.as_deref(), Some(r#"{"to":"a@b"}"#));
    assert_eq!(run.payload_type, "application/json");
    assert!(harness.store.is_empty());
}

#[tokio::test]
async fn test_out_of_entitlement_writes_nothing() {
    let harness = harness_with(TriggerConfig::default(), false).await;
    let environment = production_environment();

    let err = harness
        .service
        .trigger_task(
            "send-email",
            &environment,
            body(json!({"payload": {}})),
            TriggerTaskCallOptions::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::OutOfEntitlement);
    let runs = harness
        .dal
        .task_runs()
        .list_for_task(&environment.id, "send-email")
        .await
        .unwrap();
    assert!(runs.is_empty());
}

#[tokio::test]
async fn test_development_skips_entitlement_and_defaults_ttl() {
    let harness = harness_with(TriggerConfig::default(), false).await;
    let environment = development_environment();

    let run = harness
        .service
        .trigger_task(
            "send-email",
            &environment,
            body(json!({"payload": {}})),
            TriggerTaskCallOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(harness.entitlement.calls(), 0);
    assert_eq!(run.ttl.as_deref(), Some("10m"));
}

#[tokio::test]
async fn test_queue_name_from_worker_config() {
    let harness = harness().await;
    let environment = production_environment();

    let worker = harness
        .dal
        .workers()
        .create_worker(&environment, "20260101.1", "hash-1")
        .await
        .unwrap();
    harness
        .dal
        .workers()
        .create_worker_task(&worker.id, "send-email", Some(r#"{"name": "priority-mail"}"#))
        .await
        .unwrap();
    harness
        .dal
        .workers()
        .promote(&environment.id, &worker.id)
        .await
        .unwrap();

    let run = harness
        .service
        .trigger_task(
            "send-email",
            &environment,
            body(json!({"payload": {}})),
            TriggerTaskCallOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(run.queue_name, "priority-mail");
}

#[tracing_test::traced_test]
#[tokio::test]
async fn test_malformed_queue_config_falls_back_to_task_queue() {
    let harness = harness().await;
    let environment = production_environment();

    let worker = harness
        .dal
        .workers()
        .create_worker(&environment, "20260101.2", "hash-2")
        .await
        .unwrap();
    harness
        .dal
        .workers()
        .create_worker_task(&worker.id, "send-email", Some("{not json"))
        .await
        .unwrap();
    harness
        .dal
        .workers()
        .promote(&environment.id, &worker.id)
        .await
        .unwrap();

    let run = harness
        .service
        .trigger_task(
            "send-email",
            &environment,
            body(json!({"payload": {}})),
            TriggerTaskCallOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(run.queue_name, "task/send-email");
    assert!(logs_contain("Invalid queue config"));
}

#[tokio::test]
async fn test_caller_queue_name_is_sanitized() {
    let harness = harness().await;
    let environment = production_environment();

    let run = harness
        .service
        .trigger_task(
            "send-email",
            &environment,
            body(json!({
                "payload": {},
                "options": {"queue": {"name": "My Queue!!"}}
            })),
            TriggerTaskCallOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(run.queue_name, "my_queue_");
}

#[tokio::test]
async fn test_lock_to_version_pins_known_worker() {
    let harness = harness().await;
    let environment = production_environment();

    let worker = harness
        .dal
        .workers()
        .create_worker(&environment, "20260102.1", "hash-3")
        .await
        .unwrap();

    let run = harness
        .service
        .trigger_task(
            "send-email",
            &environment,
            body(json!({
                "payload": {},
                "options": {"lockToVersion": "20260102.1"}
            })),
            TriggerTaskCallOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(run.locked_to_version_id.as_deref(), Some(worker.id.as_str()));

    // An unknown version is non-fatal; the run stays unpinned.
    let run = harness
        .service
        .trigger_task(
            "send-email",
            &environment,
            body(json!({
                "payload": {},
                "options": {"lockToVersion": "19990101.1"}
            })),
            TriggerTaskCallOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(run.locked_to_version_id, None);
}

#[tokio::test]
async fn test_parent_attempt_lineage() {
    let harness = harness().await;
    let environment = production_environment();

    let parent = harness
        .service
        .trigger_task(
            "parent-task",
            &environment,
            body(json!({"payload": {}})),
            TriggerTaskCallOptions::default(),
        )
        .await
        .unwrap();
    let attempt = harness
        .dal
        .attempts()
        .create(&parent.id, "EXECUTING")
        .await
        .unwrap();

    let child = harness
        .service
        .trigger_task(
            "child-task",
            &environment,
            body(json!({
                "payload": {},
                "options": {"parentAttempt": attempt.friendly_id}
            })),
            TriggerTaskCallOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(child.parent_task_run_id.as_deref(), Some(parent.id.as_str()));
    assert_eq!(child.root_task_run_id.as_deref(), Some(parent.id.as_str()));
    assert_eq!(child.depth, 1);
    // Parent references carry lineage only.
    assert!(!child.resume_parent_on_completion);
}

#[tokio::test]
async fn test_dependent_batch_sets_resume_flag() {
    let harness = harness().await;
    let environment = production_environment();

    let batch = harness
        .dal
        .batches()
        .create(&environment.id, None)
        .await
        .unwrap();

    let run = harness
        .service
        .trigger_task(
            "batch-child",
            &environment,
            body(json!({
                "payload": {},
                "options": {"dependentBatch": batch.friendly_id}
            })),
            TriggerTaskCallOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(run.batch_id.as_deref(), Some(batch.id.as_str()));
    assert!(run.resume_parent_on_completion);
    assert_eq!(run.depth, 0);
}

#[tokio::test]
async fn test_traceparent_linkage_and_replay() {
    let harness = harness().await;
    let environment = production_environment();
    let traceparent = TraceParent {
        trace_id: "0af7651916cd43dd8448eb211c80319c".to_string(),
        span_id: "b7ad6b7169203331".to_string(),
    };

    let linked = harness
        .service
        .trigger_task(
            "send-email",
            &environment,
            body(json!({"payload": {}})),
            TriggerTaskCallOptions {
                traceparent: Some(traceparent.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(linked.trace_id, traceparent.trace_id);
    assert_eq!(linked.parent_span_id.as_deref(), Some("b7ad6b7169203331"));

    // Replays keep the trace but drop the parent span.
    let replayed = harness
        .service
        .trigger_task(
            "send-email",
            &environment,
            body(json!({"payload": {}})),
            TriggerTaskCallOptions {
                traceparent: Some(traceparent.clone()),
                parent_as_link_type: Some(ParentRunLinkType::Replay),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(replayed.trace_id, traceparent.trace_id);
    assert_eq!(replayed.parent_span_id, None);
}

#[tokio::test]
async fn test_trigger_event_is_recorded() {
    let harness = harness().await;
    let environment = production_environment();

    let run = harness
        .service
        .trigger_task(
            "send-email",
            &environment,
            body(json!({"payload": {}})),
            TriggerTaskCallOptions::default(),
        )
        .await
        .unwrap();

    let events = EventRepository::new(harness.database.clone());
    let recorded = events.list_for_task("send-email").await.unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].kind, "SERVER");
    assert_eq!(recorded[0].trace_id, run.trace_id);
    assert_eq!(recorded[0].span_id, run.span_id);
    assert!(!recorded[0].is_error);

    let attributes: serde_json::Value = serde_json::from_str(&recorded[0].attributes).unwrap();
    assert_eq!(attributes["taskSlug"], "send-email");
    assert_eq!(attributes["runId"], run.friendly_id.as_str());
    assert_eq!(attributes["showActions"], true);
}

#[tokio::test]
async fn test_sequential_numbers_are_contiguous() {
    let harness = harness().await;
    let environment = production_environment();

    for expected in 1..=3 {
        let run = harness
            .service
            .trigger_task(
                "send-email",
                &environment,
                body(json!({"payload": {}})),
                TriggerTaskCallOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(run.number, expected);
    }

    let counter = harness
        .dal
        .counters()
        .get("v3-run:env_prod:send-email")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(counter.last_number, 3);
}
