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

//! # Run Trigger Pipeline
//!
//! The synchronous service operation that turns a trigger request into a
//! durable, enqueued run. See [`TriggerTaskService::trigger_task`] for the
//! stage-by-stage flow.

pub mod delay;
pub mod packet;
pub mod queue_name;
pub mod request;
pub mod service;

pub use packet::IoPacket;
pub use request::{
    ParentRunLinkType, TriggerRequestOptions, TriggerTaskCallOptions, TriggerTaskRequest,
};
pub use service::TriggerTaskService;
