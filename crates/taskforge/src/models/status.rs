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

//! Run and attempt status sets.
//!
//! The status lifecycle is owned by the execution engine; the trigger
//! pipeline only needs the terminal predicates, which it applies to the raw
//! status strings stored on rows. Unknown statuses are treated as
//! non-terminal.

/// Lifecycle status of a [`TaskRun`](super::TaskRun).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunStatus {
    Pending,
    Delayed,
    WaitingForDeploy,
    Executing,
    RetryingAfterFailure,
    WaitingToResume,
    CompletedSuccessfully,
    Canceled,
    CompletedWithErrors,
    SystemFailure,
    Crashed,
    Interrupted,
    Expired,
    TimedOut,
}

impl TaskRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskRunStatus::Pending => "PENDING",
            TaskRunStatus::Delayed => "DELAYED",
            TaskRunStatus::WaitingForDeploy => "WAITING_FOR_DEPLOY",
            TaskRunStatus::Executing => "EXECUTING",
            TaskRunStatus::RetryingAfterFailure => "RETRYING_AFTER_FAILURE",
            TaskRunStatus::WaitingToResume => "WAITING_TO_RESUME",
            TaskRunStatus::CompletedSuccessfully => "COMPLETED_SUCCESSFULLY",
            TaskRunStatus::Canceled => "CANCELED",
            TaskRunStatus::CompletedWithErrors => "COMPLETED_WITH_ERRORS",
            TaskRunStatus::SystemFailure => "SYSTEM_FAILURE",
            TaskRunStatus::Crashed => "CRASHED",
            TaskRunStatus::Interrupted => "INTERRUPTED",
            TaskRunStatus::Expired => "EXPIRED",
            TaskRunStatus::TimedOut => "TIMED_OUT",
        }
    }
}

/// Lifecycle status of a [`TaskRunAttempt`](super::TaskRunAttempt).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunAttemptStatus {
    Pending,
    Executing,
    Paused,
    Failed,
    Canceled,
    Completed,
}

impl TaskRunAttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskRunAttemptStatus::Pending => "PENDING",
            TaskRunAttemptStatus::Executing => "EXECUTING",
            TaskRunAttemptStatus::Paused => "PAUSED",
            TaskRunAttemptStatus::Failed => "FAILED",
            TaskRunAttemptStatus::Canceled => "CANCELED",
            TaskRunAttemptStatus::Completed => "COMPLETED",
        }
    }
}

/// Whether an attempt status is past its last transition.
pub fn is_final_attempt_status(status: &str) -> bool {
    matches!(status, "FAILED" | "CANCELED" | "COMPLETED")
}

/// Whether a run status is terminal (completed, failed, canceled, crashed,
/// expired, or timed out).
pub fn is_final_run_status(status: &str) -> bool {
    matches!(
        status,
        "COMPLETED_SUCCESSFULLY"
            | "CANCELED"
            | "COMPLETED_WITH_ERRORS"
            | "SYSTEM_FAILURE"
            | "CRASHED"
            | "INTERRUPTED"
            | "EXPIRED"
            | "TIMED_OUT"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_attempt_statuses() {
        assert!(is_final_attempt_status("FAILED"));
        assert!(is_final_attempt_status("CANCELED"));
        assert!(is_final_attempt_status("COMPLETED"));
        assert!(!is_final_attempt_status("PENDING"));
        assert!(!is_final_attempt_status("EXECUTING"));
        assert!(!is_final_attempt_status("PAUSED"));
    }

    #[test]
    fn test_final_run_statuses() {
        assert!(is_final_run_status("COMPLETED_SUCCESSFULLY"));
        assert!(is_final_run_status("TIMED_OUT"));
        assert!(!is_final_run_status("PENDING"));
        assert!(!is_final_run_status("EXECUTING"));
        // Unknown statuses are non-terminal.
        assert!(!is_final_run_status("SOMETHING_NEW"));
    }

    #[test]
    fn test_enum_strings_round_trip_through_predicates() {
        assert!(is_final_run_status(TaskRunStatus::Canceled.as_str()));
        assert!(!is_final_run_status(TaskRunStatus::Pending.as_str()));
        assert!(is_final_attempt_status(
            TaskRunAttemptStatus::Completed.as_str()
        ));
    }
}
