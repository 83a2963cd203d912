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

//! The trigger service.
//!
//! [`TriggerTaskService::trigger_task`] runs the stages strictly
//! leaves-first: normalization, the idempotency gate, the entitlement
//! check, dependency resolution, packet handling and delay parsing, queue
//! resolution, and finally run creation. Everything before creation is
//! read-only (apart from payload offloading, which is keyed by the fresh
//! run friendly id); creation itself happens inside one IMMEDIATE write
//! transaction that covers the counter bump, tag upserts, version pinning,
//! and the engine's trigger contract.
//!
//! The idempotency gate and the insert are not one transaction. A racing
//! pair with the same key can both pass the gate; the unique index on
//! `(environment, task, idempotency_key)` is the backstop, and the loser
//! re-reads and returns the winner's run.

use std::sync::Arc;

use chrono::Utc;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::{error, instrument, Span};

use crate::config::TriggerConfig;
use crate::dal::{background_worker, counter, tag, task_run, DAL};
use crate::database::Database;
use crate::engine::{RunEngine, MASTER_QUEUE};
use crate::entitlement::EntitlementChecker;
use crate::error::TriggerError;
use crate::events::EventRepository;
use crate::models::{
    generate_friendly_id, is_final_attempt_status, is_final_run_status, NewTaskRun,
    RuntimeEnvironment, TaskRun, TaskRunAttempt, TaskRunStatus,
};
use crate::storage::ObjectStore;
use crate::trigger::delay::parse_delay;
use crate::trigger::packet::{
    create_payload_packet, handle_metadata_packet, packet_requires_offloading,
    payload_object_filename, IoPacket, STORE_DATA_TYPE,
};
use crate::trigger::queue_name::resolve_queue_name;
use crate::trigger::request::{
    normalize_request, NormalizedRequest, ParentRunLinkType, TriggerTaskCallOptions,
    TriggerTaskRequest,
};

/// Lineage and gating facts derived from the request's references.
#[derive(Debug, Default)]
struct ResolvedDependencies {
    parent_task_run_id: Option<String>,
    root_task_run_id: Option<String>,
    batch_id: Option<String>,
    depth: i32,
    resume_parent_on_completion: bool,
}

/// Outcome of the creation transaction.
enum TriggeredOutcome {
    Created(TaskRun),
    /// A racing request with the same idempotency key won the insert; this
    /// is its run.
    Replayed(TaskRun),
}

/// The run trigger pipeline.
///
/// One instance per process is enough; all handles are shared and the
/// service holds no mutable state.
pub struct TriggerTaskService {
    database: Database,
    dal: DAL,
    engine: Arc<dyn RunEngine>,
    object_store: Arc<dyn ObjectStore>,
    entitlement: Arc<dyn EntitlementChecker>,
    events: EventRepository,
    config: TriggerConfig,
}

impl TriggerTaskService {
    /// Creates a service over the given collaborators.
    pub fn new(
        database: Database,
        engine: Arc<dyn RunEngine>,
        object_store: Arc<dyn ObjectStore>,
        entitlement: Arc<dyn EntitlementChecker>,
        config: TriggerConfig,
    ) -> Self {
        Self {
            dal: DAL::new(database.clone()),
            events: EventRepository::new(database.clone()),
            database,
            engine,
            object_store,
            entitlement,
            config,
        }
    }

    /// Triggers one run of the named task.
    ///
    /// On success the returned run is durably persisted and enqueued. The
    /// operation is cancel-safe at every await point: nothing before the
    /// creation transaction needs compensation, and cancellation after the
    /// transaction commits leaves a valid run behind that an idempotent
    /// retry will find.
    #[instrument(
        skip_all,
        fields(
            task_identifier = %task_id,
            environment_id = %environment.id,
            run_friendly_id = tracing::field::Empty,
        )
    )]
    pub async fn trigger_task(
        &self,
        task_id: &str,
        environment: &RuntimeEnvironment,
        body: TriggerTaskRequest,
        options: TriggerTaskCallOptions,
    ) -> Result<TaskRun, TriggerError> {
        let request = normalize_request(environment, body, &options)?;

        // Idempotency gate: a hit returns the prior run verbatim, with no
        // entitlement check, no event, and no engine call.
        if let Some(key) = request.idempotency_key.as_deref() {
            if let Some(existing) = self
                .dal
                .task_runs()
                .find_by_idempotency_key(&environment.id, task_id, key)
                .await?
            {
                Span::current().record("run_friendly_id", existing.friendly_id.as_str());
                metrics::counter!("taskforge_runs_replayed_total").increment(1);
                return Ok(existing);
            }
        }

        if !environment.env_type.is_development() {
            if let Some(entitlement) = self
                .entitlement
                .current_validity(&environment.organization_id)
                .await?
            {
                if !entitlement.has_access {
                    return Err(TriggerError::OutOfEntitlement {
                        organization_id: environment.organization_id.clone(),
                    });
                }
            }
        }

        let dependencies = self.resolve_dependencies(task_id, &request).await?;

        let run_friendly_id = generate_friendly_id("run");
        let payload_packet = create_payload_packet(&request.payload, &request.payload_type)?;
        let payload_packet = self
            .offload_if_needed(payload_packet, &run_friendly_id, environment)
            .await?;
        let metadata_packet = request
            .metadata
            .as_ref()
            .map(|metadata| handle_metadata_packet(metadata, &request.metadata_type))
            .transpose()?;

        let delay_until = request.delay.as_deref().and_then(parse_delay);
        let queue_name = resolve_queue_name(
            &self.dal,
            task_id,
            environment,
            request.queue_name.as_deref(),
        )
        .await?;

        let handle = self.events.start_span(options.traceparent.as_ref());
        let parent_span_id = match options.parent_as_link_type {
            Some(ParentRunLinkType::Replay) => None,
            _ => handle.traceparent_span_id.clone(),
        };

        let now = Utc::now().naive_utc();
        let new_run = NewTaskRun {
            id: generate_friendly_id("run"),
            friendly_id: run_friendly_id,
            environment_id: environment.id.clone(),
            project_id: environment.project_id.clone(),
            organization_id: environment.organization_id.clone(),
            task_identifier: task_id.to_string(),
            // Assigned inside the creation transaction.
            number: 0,
            idempotency_key: request.idempotency_key.clone(),
            status: TaskRunStatus::Pending.as_str().to_string(),
            queue_name,
            master_queue: MASTER_QUEUE.to_string(),
            payload: payload_packet.data,
            payload_type: payload_packet.data_type,
            metadata: metadata_packet.as_ref().and_then(|p| p.data.clone()),
            metadata_type: metadata_packet
                .as_ref()
                .map(|p| p.data_type.clone())
                .unwrap_or_else(|| request.metadata_type.clone()),
            seed_metadata: metadata_packet.as_ref().and_then(|p| p.data.clone()),
            seed_metadata_type: metadata_packet.as_ref().map(|p| p.data_type.clone()),
            trace_id: handle.trace_id.clone(),
            span_id: handle.span_id.clone(),
            parent_span_id,
            concurrency_key: request.concurrency_key.clone(),
            delay_until: delay_until.map(|ts| ts.naive_utc()),
            queued_at: delay_until.is_none().then_some(now),
            ttl: request.ttl.clone(),
            max_attempts: request.max_attempts,
            tags: serde_json::to_string(&request.tags)?,
            // Filled after the tag upserts inside the transaction.
            tag_ids: "[]".to_string(),
            depth: dependencies.depth,
            parent_task_run_id: dependencies.parent_task_run_id.clone(),
            root_task_run_id: dependencies.root_task_run_id.clone(),
            batch_id: dependencies.batch_id.clone(),
            resume_parent_on_completion: dependencies.resume_parent_on_completion,
            locked_to_version_id: None,
            is_test: request.is_test,
            created_at: now,
            updated_at: now,
        };

        let outcome = self.create_run(environment, &request, new_run).await;

        match &outcome {
            Ok(TriggeredOutcome::Created(run)) => {
                Span::current().record("run_friendly_id", run.friendly_id.as_str());
                let attributes = serde_json::json!({
                    "taskSlug": task_id,
                    "runId": run.friendly_id,
                    "batchId": run.batch_id,
                    "idempotencyKey": run.idempotency_key,
                    "runIsTest": run.is_test,
                    "style": {"icon": request.custom_icon},
                    "showActions": true,
                });
                self.events
                    .complete(&handle, task_id, attributes, false)
                    .await?;
                metrics::counter!("taskforge_runs_triggered_total").increment(1);
            }
            Ok(TriggeredOutcome::Replayed(run)) => {
                // The unique-index backstop fired: behave as a gate hit.
                Span::current().record("run_friendly_id", run.friendly_id.as_str());
                metrics::counter!("taskforge_runs_replayed_total").increment(1);
            }
            Err(err) => {
                let attributes = serde_json::json!({
                    "taskSlug": task_id,
                    "runIsTest": request.is_test,
                    "style": {"icon": request.custom_icon},
                    "showActions": true,
                    "error": err.to_string(),
                });
                if let Err(event_error) = self.events.complete(&handle, task_id, attributes, true).await
                {
                    error!(%event_error, "Failed to record trigger error event");
                }
                metrics::counter!("taskforge_trigger_failures_total").increment(1);
            }
        }

        outcome.map(|triggered| match triggered {
            TriggeredOutcome::Created(run) | TriggeredOutcome::Replayed(run) => run,
        })
    }

    /// Loads the request's references and derives lineage.
    async fn resolve_dependencies(
        &self,
        task_id: &str,
        request: &NormalizedRequest,
    ) -> Result<ResolvedDependencies, TriggerError> {
        let dependent_attempt = match request.dependent_attempt.as_deref() {
            Some(friendly_id) => {
                let loaded = self
                    .dal
                    .attempts()
                    .find_by_friendly_id_with_run(friendly_id)
                    .await?;
                if let Some((attempt, run)) = &loaded {
                    check_not_terminal(task_id, attempt, run)?;
                }
                loaded
            }
            None => None,
        };

        // Parent references carry lineage only and are not terminal-gated.
        let parent_attempt = match request.parent_attempt.as_deref() {
            Some(friendly_id) => {
                self.dal
                    .attempts()
                    .find_by_friendly_id_with_run(friendly_id)
                    .await?
            }
            None => None,
        };

        let dependent_batch = match request.dependent_batch.as_deref() {
            Some(friendly_id) => self.dal.batches().find_by_friendly_id(friendly_id).await?,
            None => None,
        };
        let dependent_batch_attempt = match dependent_batch
            .as_ref()
            .and_then(|batch| batch.dependent_task_attempt_id.as_deref())
        {
            Some(attempt_id) => {
                let loaded = self.dal.attempts().find_by_id_with_run(attempt_id).await?;
                if let Some((attempt, run)) = &loaded {
                    check_not_terminal(task_id, attempt, run)?;
                }
                loaded
            }
            None => None,
        };

        let parent_batch = match request.parent_batch.as_deref() {
            Some(friendly_id) => self.dal.batches().find_by_friendly_id(friendly_id).await?,
            None => None,
        };

        let depth = if let Some((_, run)) = &dependent_attempt {
            run.depth + 1
        } else if let Some((_, run)) = &parent_attempt {
            run.depth + 1
        } else if let Some((_, run)) = &dependent_batch_attempt {
            run.depth + 1
        } else {
            0
        };

        Ok(ResolvedDependencies {
            parent_task_run_id: parent_attempt.as_ref().map(|(_, run)| run.id.clone()),
            root_task_run_id: parent_attempt.as_ref().map(|(_, run)| {
                run.root_task_run_id
                    .clone()
                    .unwrap_or_else(|| run.id.clone())
            }),
            batch_id: dependent_batch
                .as_ref()
                .map(|batch| batch.id.clone())
                .or_else(|| parent_batch.as_ref().map(|batch| batch.id.clone())),
            depth,
            resume_parent_on_completion: dependent_attempt.is_some() || dependent_batch.is_some(),
        })
    }

    /// Uploads the packet body when it exceeds the threshold and swaps the
    /// packet for a storage locator.
    async fn offload_if_needed(
        &self,
        packet: IoPacket,
        run_friendly_id: &str,
        environment: &RuntimeEnvironment,
    ) -> Result<IoPacket, TriggerError> {
        let (needs_offloading, _size) =
            packet_requires_offloading(&packet, self.config.payload_offload_threshold());
        if !needs_offloading {
            return Ok(packet);
        }
        let Some(data) = packet.data else {
            return Ok(IoPacket {
                data: None,
                data_type: packet.data_type,
            });
        };

        let filename = payload_object_filename(run_friendly_id);
        self.object_store
            .upload(&filename, data.into_bytes(), &packet.data_type, environment)
            .await?;

        Ok(IoPacket {
            data: Some(filename),
            data_type: STORE_DATA_TYPE.to_string(),
        })
    }

    /// Runs the creation transaction: counter bump, version pinning, tag
    /// upserts, and the engine trigger, committing together.
    async fn create_run(
        &self,
        environment: &RuntimeEnvironment,
        request: &NormalizedRequest,
        new_run: NewTaskRun,
    ) -> Result<TriggeredOutcome, TriggerError> {
        let conn = self.database.write_connection().await?;

        let engine = Arc::clone(&self.engine);
        let counter_key = format!(
            "v3-run:{}:{}",
            environment.id, new_run.task_identifier
        );
        let environment_id = environment.id.clone();
        let project_id = environment.project_id.clone();
        let task_identifier = new_run.task_identifier.clone();
        let tags = request.tags.clone();
        let lock_to_version = request.lock_to_version.clone();
        let idempotency_key = request.idempotency_key.clone();

        let outcome = conn
            .interact(move |conn| -> Result<TriggeredOutcome, DieselError> {
                let mut new_run = new_run;
                let created = conn.immediate_transaction(|conn| {
                    let number =
                        counter::increment_in_transaction(conn, &counter_key, |conn| {
                            task_run::count_for_task(conn, &environment_id, &task_identifier)
                                .map(|count| count as i32)
                        })?;
                    new_run.number = number;

                    // A missing version match is non-fatal; the run simply
                    // stays unpinned.
                    if let Some(version) = lock_to_version.as_deref() {
                        new_run.locked_to_version_id = background_worker::find_by_version(
                            conn,
                            &project_id,
                            &environment_id,
                            version,
                        )?
                        .map(|worker| worker.id);
                    }

                    let mut tag_ids = Vec::with_capacity(tags.len());
                    for tag_name in &tags {
                        tag_ids.push(tag::upsert_tag(conn, tag_name, &project_id)?.id);
                    }
                    new_run.tag_ids = serde_json::to_string(&tag_ids)
                        .map_err(|e| DieselError::SerializationError(Box::new(e)))?;

                    engine.trigger(new_run.clone(), conn)
                });

                match created {
                    Ok(run) => Ok(TriggeredOutcome::Created(run)),
                    Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)) => {
                        if let Some(key) = idempotency_key.as_deref() {
                            if let Some(existing) = task_run::find_by_idempotency_key_sync(
                                conn,
                                &environment_id,
                                &task_identifier,
                                key,
                            )? {
                                return Ok(TriggeredOutcome::Replayed(existing));
                            }
                        }
                        Err(DieselError::DatabaseError(
                            DatabaseErrorKind::UniqueViolation,
                            info,
                        ))
                    }
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(|e| TriggerError::Connection(e.to_string()))??;

        Ok(outcome)
    }
}

/// Rejects references whose attempt or run already reached a terminal
/// status. The two error paths name which one is terminal.
fn check_not_terminal(
    task_id: &str,
    attempt: &TaskRunAttempt,
    run: &TaskRun,
) -> Result<(), TriggerError> {
    if is_final_attempt_status(&attempt.status) {
        return Err(TriggerError::DependentAttemptTerminal {
            task_identifier: task_id.to_string(),
            status: attempt.status.clone(),
        });
    }
    if is_final_run_status(&run.status) {
        return Err(TriggerError::DependentRunTerminal {
            task_identifier: task_id.to_string(),
            status: run.status.clone(),
        });
    }
    Ok(())
}
