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

//! Trigger event tracing.
//!
//! Every trigger is wrapped in one server-kind event. Starting a span
//! allocates the trace identifiers the run is stamped with; completing it
//! persists one `trigger_events` row (success or error) with the span's
//! attributes. When the caller supplied a traceparent, the new span joins
//! that trace and records the parent span id.

use chrono::Utc;
use diesel::prelude::*;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::database::schema::trigger_events;
use crate::database::Database;
use crate::error::TriggerError;
use crate::models::generate_friendly_id;

/// Incoming trace context propagated by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceParent {
    pub trace_id: String,
    pub span_id: String,
}

/// Identifiers allocated for one trigger span.
#[derive(Debug, Clone)]
pub struct TraceEventHandle {
    pub event_id: String,
    pub trace_id: String,
    pub span_id: String,
    /// Span id of the caller's traceparent, when one was supplied
    pub traceparent_span_id: Option<String>,
}

/// A persisted trigger event row.
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::database::schema::trigger_events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TriggerEvent {
    pub id: String,
    pub kind: String,
    pub task_slug: String,
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    /// JSON object of span attributes
    pub attributes: String,
    pub is_error: bool,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::database::schema::trigger_events)]
struct NewTriggerEvent {
    id: String,
    kind: String,
    task_slug: String,
    trace_id: String,
    span_id: String,
    parent_span_id: Option<String>,
    attributes: String,
    is_error: bool,
    created_at: chrono::NaiveDateTime,
}

/// Repository of server-kind trigger events.
#[derive(Clone)]
pub struct EventRepository {
    database: Database,
}

impl EventRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Allocates identifiers for a new span, joining the caller's trace
    /// when a traceparent is present.
    pub fn start_span(&self, traceparent: Option<&TraceParent>) -> TraceEventHandle {
        TraceEventHandle {
            event_id: generate_friendly_id("event"),
            trace_id: traceparent
                .map(|tp| tp.trace_id.clone())
                .unwrap_or_else(|| random_hex(16)),
            span_id: random_hex(8),
            traceparent_span_id: traceparent.map(|tp| tp.span_id.clone()),
        }
    }

    /// Persists the span as one server-kind event row.
    pub async fn complete(
        &self,
        handle: &TraceEventHandle,
        task_slug: &str,
        attributes: serde_json::Value,
        is_error: bool,
    ) -> Result<(), TriggerError> {
        let conn = self.database.write_connection().await?;

        let event = NewTriggerEvent {
            id: handle.event_id.clone(),
            kind: "SERVER".to_string(),
            task_slug: task_slug.to_string(),
            trace_id: handle.trace_id.clone(),
            span_id: handle.span_id.clone(),
            parent_span_id: handle.traceparent_span_id.clone(),
            attributes: attributes.to_string(),
            is_error,
            created_at: Utc::now().naive_utc(),
        };

        conn.interact(move |conn| {
            diesel::insert_into(trigger_events::table)
                .values(&event)
                .execute(conn)
        })
        .await
        .map_err(|e| TriggerError::Connection(e.to_string()))??;

        Ok(())
    }

    /// Loads every event recorded for a task slug, oldest first.
    pub async fn list_for_task(&self, task_slug: &str) -> Result<Vec<TriggerEvent>, TriggerError> {
        let conn = self.database.get_connection().await?;

        let task_slug = task_slug.to_string();
        let events = conn
            .interact(move |conn| {
                trigger_events::table
                    .filter(trigger_events::task_slug.eq(task_slug))
                    .order(trigger_events::created_at.asc())
                    .select(TriggerEvent::as_select())
                    .load(conn)
            })
            .await
            .map_err(|e| TriggerError::Connection(e.to_string()))??;

        Ok(events)
    }
}

fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repository() -> (EventRepository, tempfile::TempDir) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let database = Database::new(path.to_str().unwrap(), 2).unwrap();
        (EventRepository::new(database), dir)
    }

    #[test]
    fn test_start_span_generates_ids() {
        let (events, _dir) = repository();
        let handle = events.start_span(None);
        assert_eq!(handle.trace_id.len(), 32);
        assert_eq!(handle.span_id.len(), 16);
        assert!(handle.traceparent_span_id.is_none());
    }

    #[test]
    fn test_start_span_joins_caller_trace() {
        let (events, _dir) = repository();
        let traceparent = TraceParent {
            trace_id: "0af7651916cd43dd8448eb211c80319c".to_string(),
            span_id: "b7ad6b7169203331".to_string(),
        };
        let handle = events.start_span(Some(&traceparent));
        assert_eq!(handle.trace_id, traceparent.trace_id);
        assert_eq!(
            handle.traceparent_span_id.as_deref(),
            Some("b7ad6b7169203331")
        );
        assert_ne!(handle.span_id, traceparent.span_id);
    }

    #[tokio::test]
    async fn test_complete_persists_event() {
        let (events, _dir) = repository();
        events.database.setup().await.unwrap();

        let handle = events.start_span(None);
        events
            .complete(
                &handle,
                "send-email",
                serde_json::json!({"runIsTest": false}),
                false,
            )
            .await
            .unwrap();

        let stored = events.list_for_task("send-email").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].kind, "SERVER");
        assert_eq!(stored[0].trace_id, handle.trace_id);
        assert!(!stored[0].is_error);
    }
}
