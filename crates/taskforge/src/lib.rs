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

//! # Taskforge
//!
//! Taskforge is the trigger pipeline of a background-run orchestration
//! platform: it accepts a request to execute a named task, validates it
//! against environment state and entitlements, deduplicates it, persists a
//! durable [`TaskRun`](models::TaskRun) record, and hands it to the
//! execution engine through a durable queue row — all in one synchronous
//! service call.
//!
//! ## Architecture
//!
//! The pipeline is a single service operation,
//! [`TriggerTaskService::trigger_task`](trigger::TriggerTaskService::trigger_task),
//! composed of cooperating stages:
//!
//! - request normalization (tags, TTL, payload/metadata types)
//! - an idempotency gate over `(environment, task, idempotency_key)`
//! - an entitlement check for non-development environments
//! - parent/dependent attempt and batch resolution with terminal-state gating
//! - payload packet handling with transparent object-store offloading
//! - queue-name resolution layered over worker-declared defaults
//! - run creation under a per-`(environment, task)` monotonic counter,
//!   wrapped in a traced server-kind event
//!
//! Everything up to run creation is read-only; the creation step is the only
//! stage that writes, and it does so in a single database transaction.
//!
//! ## Collaborators
//!
//! The service is constructed with injected handles: a [`Database`] pool, a
//! [`RunEngine`](engine::RunEngine), an [`ObjectStore`](storage::ObjectStore),
//! and an [`EntitlementChecker`](entitlement::EntitlementChecker). There is
//! no process-global state.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskforge::{Database, TriggerConfig};
//! use taskforge::engine::DatabaseRunEngine;
//! use taskforge::entitlement::UnlimitedEntitlements;
//! use taskforge::storage::InMemoryObjectStore;
//! use taskforge::trigger::{TriggerTaskCallOptions, TriggerTaskRequest, TriggerTaskService};
//!
//! # async fn example(environment: taskforge::models::RuntimeEnvironment) -> Result<(), taskforge::TriggerError> {
//! let database = Database::new("taskforge.db", 10)?;
//! database.setup().await?;
//!
//! let service = TriggerTaskService::new(
//!     database,
//!     Arc::new(DatabaseRunEngine),
//!     Arc::new(InMemoryObjectStore::new()),
//!     Arc::new(UnlimitedEntitlements),
//!     TriggerConfig::from_env(),
//! );
//!
//! let body: TriggerTaskRequest = serde_json::from_str(
//!     r#"{"payload": {"to": "user@example.com"}, "options": {"tags": ["welcome"]}}"#,
//! )?;
//! let run = service
//!     .trigger_task("send-email", &environment, body, TriggerTaskCallOptions::default())
//!     .await?;
//! println!("triggered {} as #{}", run.friendly_id, run.number);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dal;
pub mod database;
pub mod engine;
pub mod entitlement;
pub mod error;
pub mod events;
pub mod models;
pub mod storage;
pub mod trigger;

pub use config::TriggerConfig;
pub use database::Database;
pub use error::{ErrorCode, TriggerError};
pub use trigger::TriggerTaskService;

/// Maximum number of tags a single run may carry.
pub const MAX_TAGS_PER_RUN: usize = 8;
