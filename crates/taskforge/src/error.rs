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

//! Error types for the trigger pipeline.
//!
//! All fallible operations in this crate surface a [`TriggerError`]. The
//! enclosing API layer maps errors to wire responses through
//! [`TriggerError::code`]: validation failures are non-retryable caller
//! errors, entitlement failures carry their own code, and collaborator
//! outages (database, object store, entitlement service) are retryable
//! internal errors.

use thiserror::Error;

/// Errors surfaced by the trigger pipeline.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// The request carried more tags than a run may hold.
    #[error("Runs can have a maximum of {max} tags, you provided {requested}")]
    TooManyTags { requested: usize, max: usize },

    /// A dependent attempt reference points at an attempt that already
    /// reached a terminal status.
    #[error("Cannot trigger {task_identifier} as the parent attempt has a status of {status}")]
    DependentAttemptTerminal {
        task_identifier: String,
        status: String,
    },

    /// A dependent attempt reference points at a run that already reached a
    /// terminal status.
    #[error("Cannot trigger {task_identifier} as the parent run has a status of {status}")]
    DependentRunTerminal {
        task_identifier: String,
        status: String,
    },

    /// The owning organization has no credit left.
    #[error("Organization {organization_id} has no available run credits")]
    OutOfEntitlement { organization_id: String },

    /// Acquiring or using a pooled database connection failed.
    #[error("Database connection error: {0}")]
    Connection(String),

    /// A database query failed.
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// An object-store upload failed.
    #[error("Object store error: {0}")]
    ObjectStore(String),

    /// The entitlement service could not be reached.
    #[error("Entitlement service error: {0}")]
    Entitlement(String),

    /// Payload, metadata, or event-attribute (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Wire-level error codes understood by the enclosing API layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// HTTP 402: the organization lacks credit.
    OutOfEntitlement,
    /// HTTP 400: the request was malformed or violated a constraint.
    ValidationError,
    /// HTTP 500: a collaborator failed; the caller may retry.
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::OutOfEntitlement => "OUT_OF_ENTITLEMENT",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl TriggerError {
    /// Maps this error to the wire-level code surfaced to callers.
    pub fn code(&self) -> ErrorCode {
        match self {
            TriggerError::TooManyTags { .. }
            | TriggerError::DependentAttemptTerminal { .. }
            | TriggerError::DependentRunTerminal { .. } => ErrorCode::ValidationError,
            TriggerError::OutOfEntitlement { .. } => ErrorCode::OutOfEntitlement,
            TriggerError::Connection(_)
            | TriggerError::Database(_)
            | TriggerError::ObjectStore(_)
            | TriggerError::Entitlement(_)
            | TriggerError::Serialization(_) => ErrorCode::InternalError,
        }
    }

    /// Whether the caller may retry the request unchanged.
    pub fn is_retryable(&self) -> bool {
        self.code() == ErrorCode::InternalError
    }
}
