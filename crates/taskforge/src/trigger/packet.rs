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

//! Payload and metadata packets.
//!
//! A packet wraps a serialized blob together with its type tag. The tag
//! doubles as the variant discriminator: `application/json` carries the
//! serialized JSON inline, arbitrary string payloads keep their declared
//! type, non-string payloads of unknown types carry no inline data, and
//! [`STORE_DATA_TYPE`] marks a packet whose `data` is an object-store
//! locator rather than bytes.

use serde::{Deserialize, Serialize};

use crate::error::TriggerError;

/// Type tag for offloaded packets whose `data` is a storage locator.
pub const STORE_DATA_TYPE: &str = "application/store";

/// Default packet type for payloads and metadata.
pub const JSON_DATA_TYPE: &str = "application/json";

/// A serialized payload or metadata blob with its type tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoPacket {
    pub data: Option<String>,
    pub data_type: String,
}

impl IoPacket {
    /// Size of the inline data in bytes; 0 when there is none.
    pub fn size_bytes(&self) -> u64 {
        self.data.as_ref().map(|d| d.len() as u64).unwrap_or(0)
    }

    /// Whether this packet's data lives in the object store.
    pub fn is_offloaded(&self) -> bool {
        self.data_type == STORE_DATA_TYPE
    }
}

/// Builds the payload packet for a trigger request.
pub fn create_payload_packet(
    payload: &serde_json::Value,
    payload_type: &str,
) -> Result<IoPacket, TriggerError> {
    if payload_type == JSON_DATA_TYPE {
        return Ok(IoPacket {
            data: Some(serde_json::to_string(payload)?),
            data_type: JSON_DATA_TYPE.to_string(),
        });
    }

    if let serde_json::Value::String(s) = payload {
        return Ok(IoPacket {
            data: Some(s.clone()),
            data_type: payload_type.to_string(),
        });
    }

    // Binary or unknown inline form: keep the tag, carry no data.
    Ok(IoPacket {
        data: None,
        data_type: payload_type.to_string(),
    })
}

/// Builds the metadata packet. Metadata follows the same packet discipline
/// as payloads but is never offloaded.
pub fn handle_metadata_packet(
    metadata: &serde_json::Value,
    metadata_type: &str,
) -> Result<IoPacket, TriggerError> {
    create_payload_packet(metadata, metadata_type)
}

/// Offload predicate: `(needs_offloading, size)` for a packet against the
/// configured threshold in bytes.
pub fn packet_requires_offloading(packet: &IoPacket, threshold_bytes: u64) -> (bool, u64) {
    let size = packet.size_bytes();
    (size > threshold_bytes, size)
}

/// Storage filename for an offloaded payload, keyed by run friendly id.
pub fn payload_object_filename(run_friendly_id: &str) -> String {
    format!("{run_friendly_id}/payload.json")
}
