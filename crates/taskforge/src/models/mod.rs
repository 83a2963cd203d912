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

//! Data models for the trigger pipeline.
//!
//! Row structs map one-to-one onto the tables in
//! [`crate::database::schema`]; `New*` structs carry the insertable subset.

pub mod batch;
pub mod counter;
pub mod environment;
pub mod status;
pub mod tag;
pub mod task_run;
pub mod task_run_attempt;
pub mod worker;

pub use batch::{BatchTaskRun, NewBatchTaskRun};
pub use counter::TaskRunNumberCounter;
pub use environment::{EnvironmentType, RuntimeEnvironment};
pub use status::{is_final_attempt_status, is_final_run_status, TaskRunAttemptStatus, TaskRunStatus};
pub use tag::{NewTaskRunTag, TaskRunTag};
pub use task_run::{NewTaskRun, TaskRun};
pub use task_run_attempt::{NewTaskRunAttempt, TaskRunAttempt};
pub use worker::{
    BackgroundWorker, BackgroundWorkerTask, NewBackgroundWorker, NewBackgroundWorkerTask,
    QueueConfig, WorkerDeploymentPromotion,
};

use uuid::Uuid;

/// Generates a human-readable prefixed identifier, e.g. `run_4f9a…`.
///
/// Friendly ids double as primary keys; the prefix makes the entity kind
/// recognizable in logs and URLs.
pub fn generate_friendly_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_friendly_id_prefix_and_uniqueness() {
        let a = generate_friendly_id("run");
        let b = generate_friendly_id("run");
        assert!(a.starts_with("run_"));
        assert_ne!(a, b);
    }
}
