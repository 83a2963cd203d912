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

//! Queue name resolution.
//!
//! The effective queue name layers caller input over the current worker's
//! declared queue configuration, falling back to the task's own queue
//! (`task/<task_id>`). Whatever wins is sanitized before use.

use tracing::warn;

use crate::dal::DAL;
use crate::error::TriggerError;
use crate::models::{QueueConfig, RuntimeEnvironment};

/// Resolves the queue a run is placed on.
pub(crate) async fn resolve_queue_name(
    dal: &DAL,
    task_id: &str,
    environment: &RuntimeEnvironment,
    queue_name_option: Option<&str>,
) -> Result<String, TriggerError> {
    let resolved = match queue_name_option.filter(|name| !name.is_empty()) {
        Some(name) => name.to_string(),
        None => queue_name_from_worker(dal, task_id, environment).await?,
    };

    let sanitized = sanitize_queue_name(&resolved);
    if sanitized.is_empty() {
        return Ok(sanitize_queue_name(&default_queue_name(task_id)));
    }
    Ok(sanitized)
}

/// The task's own queue, used whenever nothing more specific applies.
pub fn default_queue_name(task_id: &str) -> String {
    format!("task/{task_id}")
}

async fn queue_name_from_worker(
    dal: &DAL,
    task_id: &str,
    environment: &RuntimeEnvironment,
) -> Result<String, TriggerError> {
    let Some(worker) = dal.workers().find_current_worker(environment).await? else {
        return Ok(default_queue_name(task_id));
    };

    let Some(task) = dal.workers().find_task_by_slug(&worker.id, task_id).await? else {
        return Ok(default_queue_name(task_id));
    };

    let Some(raw_config) = task.queue_config.as_deref() else {
        return Ok(default_queue_name(task_id));
    };

    match serde_json::from_str::<Option<QueueConfig>>(raw_config) {
        Ok(config) => Ok(config
            .and_then(|c| c.name)
            .unwrap_or_else(|| default_queue_name(task_id))),
        Err(error) => {
            warn!(
                task_id,
                worker_id = %worker.id,
                %error,
                "Invalid queue config on worker task, falling back to task queue"
            );
            Ok(default_queue_name(task_id))
        }
    }
}

/// Lowercases, maps characters outside `[a-z0-9/_-]` to `_`, and collapses
/// runs of `_`. May return an empty string only for an empty input.
pub fn sanitize_queue_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_underscore = false;
    for c in name.to_lowercase().chars() {
        let mapped = match c {
            'a'..='z' | '0'..='9' | '/' | '-' => c,
            _ => '_',
        };
        if mapped == '_' {
            if !last_was_underscore {
                out.push('_');
            }
            last_was_underscore = true;
        } else {
            out.push(mapped);
            last_was_underscore = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_passes_valid_names() {
        assert_eq!(sanitize_queue_name("task/send-email"), "task/send-email");
        assert_eq!(sanitize_queue_name("priority-mail"), "priority-mail");
        assert_eq!(sanitize_queue_name("queue_01"), "queue_01");
    }

    #[test]
    fn test_sanitize_lowercases_and_maps() {
        assert_eq!(sanitize_queue_name("Priority Mail"), "priority_mail");
        assert_eq!(sanitize_queue_name("emails@2024!"), "emails_2024_");
    }

    #[test]
    fn test_sanitize_collapses_repeats() {
        assert_eq!(sanitize_queue_name("a!!!b"), "a_b");
        assert_eq!(sanitize_queue_name("a__b"), "a_b");
        assert_eq!(sanitize_queue_name("  spaced  out  "), "_spaced_out_");
    }

    #[test]
    fn test_sanitized_output_alphabet() {
        let inputs = [
            "Task/Send-Email",
            "ünïcode",
            "UPPER CASE QUEUE",
            "a!!!b###c",
            "mixed/Path_With-Everything 123",
        ];
        for input in inputs {
            let sanitized = sanitize_queue_name(input);
            assert!(!sanitized.is_empty());
            assert!(
                sanitized
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "/_-".contains(c)),
                "unexpected character in {sanitized:?}"
            );
        }
    }

    #[test]
    fn test_default_queue_name() {
        assert_eq!(default_queue_name("send-email"), "task/send-email");
    }
}
