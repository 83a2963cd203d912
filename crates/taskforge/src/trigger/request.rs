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

//! Trigger request types and normalization.
//!
//! [`TriggerTaskRequest`] mirrors the wire body accepted by the enclosing
//! API; [`TriggerTaskCallOptions`] carries the server-side options the API
//! layer resolves itself (span linkage, icons, its own idempotency key).
//! Normalization canonicalizes the two into one internal request.

use serde::{Deserialize, Serialize};

use crate::error::TriggerError;
use crate::events::TraceParent;
use crate::models::{EnvironmentType, RuntimeEnvironment};
use crate::trigger::delay::stringify_duration;
use crate::trigger::packet::JSON_DATA_TYPE;
use crate::MAX_TAGS_PER_RUN;

/// TTL runs in development default to, when none is requested.
pub const DEVELOPMENT_DEFAULT_TTL: &str = "10m";

/// Icon recorded on trigger spans when the caller supplies none.
const DEFAULT_ICON: &str = "task";

/// The wire body of a trigger request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TriggerTaskRequest {
    pub payload: serde_json::Value,
    pub context: Option<serde_json::Value>,
    pub options: TriggerRequestOptions,
}

/// Caller-supplied options inside the wire body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TriggerRequestOptions {
    pub idempotency_key: Option<String>,
    /// Absolute RFC 3339 timestamp or compact duration string
    pub delay: Option<String>,
    pub ttl: Option<TtlValue>,
    pub tags: Option<TagList>,
    pub metadata: Option<serde_json::Value>,
    pub metadata_type: Option<String>,
    pub payload_type: Option<String>,
    pub concurrency_key: Option<String>,
    pub queue: Option<QueueOptions>,
    pub lock_to_version: Option<String>,
    pub max_attempts: Option<i32>,
    pub test: Option<bool>,
    pub dependent_attempt: Option<String>,
    pub parent_attempt: Option<String>,
    pub dependent_batch: Option<String>,
    pub parent_batch: Option<String>,
}

/// A TTL given either as seconds or as a duration string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TtlValue {
    Seconds(i64),
    Text(String),
}

/// Tags given either as one string or as a sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagList {
    One(String),
    Many(Vec<String>),
}

impl TagList {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            TagList::One(tag) => vec![tag],
            TagList::Many(tags) => tags,
        }
    }
}

/// Queue selection inside the wire body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueueOptions {
    pub name: Option<String>,
    pub concurrency_limit: Option<i32>,
}

/// How a run relates to the span that triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentRunLinkType {
    /// Normal parent/child span linkage
    Trigger,
    /// A replayed run: the original span is a link, not a parent
    Replay,
}

/// Server-side options resolved by the API layer.
#[derive(Debug, Clone, Default)]
pub struct TriggerTaskCallOptions {
    /// Takes precedence over the body's idempotency key
    pub idempotency_key: Option<String>,
    pub custom_icon: Option<String>,
    pub parent_as_link_type: Option<ParentRunLinkType>,
    pub traceparent: Option<TraceParent>,
}

/// The canonical internal request produced by normalization.
#[derive(Debug, Clone)]
pub(crate) struct NormalizedRequest {
    pub payload: serde_json::Value,
    pub payload_type: String,
    pub metadata: Option<serde_json::Value>,
    pub metadata_type: String,
    pub idempotency_key: Option<String>,
    pub delay: Option<String>,
    pub ttl: Option<String>,
    pub tags: Vec<String>,
    pub concurrency_key: Option<String>,
    pub queue_name: Option<String>,
    pub lock_to_version: Option<String>,
    pub max_attempts: Option<i32>,
    pub is_test: bool,
    pub custom_icon: String,
    pub dependent_attempt: Option<String>,
    pub parent_attempt: Option<String>,
    pub dependent_batch: Option<String>,
    pub parent_batch: Option<String>,
}

/// Canonicalizes a wire body plus call options into a [`NormalizedRequest`].
pub(crate) fn normalize_request(
    environment: &RuntimeEnvironment,
    body: TriggerTaskRequest,
    options: &TriggerTaskCallOptions,
) -> Result<NormalizedRequest, TriggerError> {
    let body_options = body.options;

    let idempotency_key = options
        .idempotency_key
        .clone()
        .or(body_options.idempotency_key);

    let ttl = match body_options.ttl {
        Some(TtlValue::Seconds(seconds)) => stringify_duration(seconds),
        Some(TtlValue::Text(text)) => Some(text),
        None => match environment.env_type {
            EnvironmentType::Development => Some(DEVELOPMENT_DEFAULT_TTL.to_string()),
            _ => None,
        },
    };

    let tags = body_options.tags.map(TagList::into_vec).unwrap_or_default();
    if tags.len() > MAX_TAGS_PER_RUN {
        return Err(TriggerError::TooManyTags {
            requested: tags.len(),
            max: MAX_TAGS_PER_RUN,
        });
    }

    Ok(NormalizedRequest {
        payload: body.payload,
        payload_type: body_options
            .payload_type
            .unwrap_or_else(|| JSON_DATA_TYPE.to_string()),
        metadata: body_options.metadata,
        metadata_type: body_options
            .metadata_type
            .unwrap_or_else(|| JSON_DATA_TYPE.to_string()),
        idempotency_key,
        delay: body_options.delay,
        ttl,
        tags,
        concurrency_key: body_options.concurrency_key,
        queue_name: body_options.queue.and_then(|q| q.name),
        lock_to_version: body_options.lock_to_version,
        max_attempts: body_options.max_attempts,
        is_test: body_options.test.unwrap_or(false),
        custom_icon: options
            .custom_icon
            .clone()
            .unwrap_or_else(|| DEFAULT_ICON.to_string()),
        dependent_attempt: body_options.dependent_attempt,
        parent_attempt: body_options.parent_attempt,
        dependent_batch: body_options.dependent_batch,
        parent_batch: body_options.parent_batch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn environment(env_type: EnvironmentType) -> RuntimeEnvironment {
        RuntimeEnvironment {
            id: "env_1".to_string(),
            env_type,
            project_id: "proj_1".to_string(),
            organization_id: "org_1".to_string(),
            maximum_concurrency_limit: 10,
        }
    }

    #[test]
    fn test_body_deserializes_wire_shapes() {
        let body: TriggerTaskRequest = serde_json::from_value(json!({
            "payload": {"to": "a@b"},
            "options": {
                "tags": "welcome",
                "ttl": 90,
                "idempotencyKey": "abc",
                "queue": {"name": "priority-mail"}
            }
        }))
        .unwrap();

        assert!(matches!(body.options.tags, Some(TagList::One(_))));
        assert!(matches!(body.options.ttl, Some(TtlValue::Seconds(90))));
        assert_eq!(body.options.idempotency_key.as_deref(), Some("abc"));
        assert_eq!(
            body.options.queue.unwrap().name.as_deref(),
            Some("priority-mail")
        );
    }

    #[test]
    fn test_call_options_key_wins() {
        let body: TriggerTaskRequest = serde_json::from_value(json!({
            "payload": null,
            "options": {"idempotencyKey": "from-body"}
        }))
        .unwrap();
        let options = TriggerTaskCallOptions {
            idempotency_key: Some("from-header".to_string()),
            ..Default::default()
        };

        let normalized =
            normalize_request(&environment(EnvironmentType::Production), body, &options).unwrap();
        assert_eq!(normalized.idempotency_key.as_deref(), Some("from-header"));
    }

    #[test]
    fn test_numeric_ttl_is_stringified() {
        let body: TriggerTaskRequest =
            serde_json::from_value(json!({"payload": null, "options": {"ttl": 5400}})).unwrap();
        let normalized = normalize_request(
            &environment(EnvironmentType::Production),
            body,
            &TriggerTaskCallOptions::default(),
        )
        .unwrap();
        assert_eq!(normalized.ttl.as_deref(), Some("1h30m"));
    }

    #[test]
    fn test_development_defaults_ttl() {
        let normalized = normalize_request(
            &environment(EnvironmentType::Development),
            TriggerTaskRequest::default(),
            &TriggerTaskCallOptions::default(),
        )
        .unwrap();
        assert_eq!(normalized.ttl.as_deref(), Some("10m"));

        let normalized = normalize_request(
            &environment(EnvironmentType::Production),
            TriggerTaskRequest::default(),
            &TriggerTaskCallOptions::default(),
        )
        .unwrap();
        assert_eq!(normalized.ttl, None);
    }

    #[test]
    fn test_single_tag_is_lifted() {
        let body: TriggerTaskRequest =
            serde_json::from_value(json!({"payload": null, "options": {"tags": "welcome"}}))
                .unwrap();
        let normalized = normalize_request(
            &environment(EnvironmentType::Production),
            body,
            &TriggerTaskCallOptions::default(),
        )
        .unwrap();
        assert_eq!(normalized.tags, vec!["welcome"]);
    }

    #[test]
    fn test_too_many_tags_is_rejected() {
        let tags: Vec<String> = (0..9).map(|i| format!("tag-{i}")).collect();
        let body: TriggerTaskRequest =
            serde_json::from_value(json!({"payload": null, "options": {"tags": tags}})).unwrap();

        let err = normalize_request(
            &environment(EnvironmentType::Production),
            body,
            &TriggerTaskCallOptions::default(),
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("8"));
        assert!(message.contains("9"));
    }

    #[test]
    fn test_defaults() {
        let normalized = normalize_request(
            &environment(EnvironmentType::Production),
            TriggerTaskRequest::default(),
            &TriggerTaskCallOptions::default(),
        )
        .unwrap();
        assert_eq!(normalized.payload_type, "application/json");
        assert_eq!(normalized.metadata_type, "application/json");
        assert_eq!(normalized.custom_icon, "task");
        assert!(!normalized.is_test);
        assert!(normalized.tags.is_empty());
    }
}
