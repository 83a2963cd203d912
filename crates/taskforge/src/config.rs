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

//! Configuration for the trigger pipeline.
//!
//! Construct a [`TriggerConfig`] with the builder or load it from the
//! process environment:
//!
//! ```rust
//! use taskforge::TriggerConfig;
//!
//! let config = TriggerConfig::builder()
//!     .payload_offload_threshold(1024 * 1024)
//!     .build();
//! assert_eq!(config.payload_offload_threshold(), 1024 * 1024);
//! ```

use tracing::debug;

/// Default serialized-payload size above which payloads are offloaded to the
/// object store (512 KiB).
pub const DEFAULT_PAYLOAD_OFFLOAD_THRESHOLD: u64 = 512 * 1024;

/// Default number of pooled database connections.
pub const DEFAULT_DB_POOL_SIZE: usize = 10;

/// Configuration for [`TriggerTaskService`](crate::trigger::TriggerTaskService).
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct TriggerConfig {
    payload_offload_threshold: u64,
    db_pool_size: usize,
}

impl TriggerConfig {
    /// Creates a new configuration builder with default values.
    pub fn builder() -> TriggerConfigBuilder {
        TriggerConfigBuilder::default()
    }

    /// Loads configuration from the process environment.
    ///
    /// Reads `TASK_PAYLOAD_OFFLOAD_THRESHOLD` (bytes); values that are
    /// absent or unparseable fall back to
    /// [`DEFAULT_PAYLOAD_OFFLOAD_THRESHOLD`]. A `.env` file in the working
    /// directory is honored when present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let payload_offload_threshold = std::env::var("TASK_PAYLOAD_OFFLOAD_THRESHOLD")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(DEFAULT_PAYLOAD_OFFLOAD_THRESHOLD);
        debug!(
            payload_offload_threshold,
            "Loaded trigger configuration from environment"
        );

        Self {
            payload_offload_threshold,
            db_pool_size: DEFAULT_DB_POOL_SIZE,
        }
    }

    /// Serialized-payload size in bytes above which payloads are offloaded.
    pub fn payload_offload_threshold(&self) -> u64 {
        self.payload_offload_threshold
    }

    /// Number of database connections kept in the pool.
    pub fn db_pool_size(&self) -> usize {
        self.db_pool_size
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            payload_offload_threshold: DEFAULT_PAYLOAD_OFFLOAD_THRESHOLD,
            db_pool_size: DEFAULT_DB_POOL_SIZE,
        }
    }
}

/// Builder for [`TriggerConfig`].
#[derive(Debug, Default)]
pub struct TriggerConfigBuilder {
    payload_offload_threshold: Option<u64>,
    db_pool_size: Option<usize>,
}

impl TriggerConfigBuilder {
    /// Sets the payload offload threshold in bytes.
    pub fn payload_offload_threshold(mut self, bytes: u64) -> Self {
        self.payload_offload_threshold = Some(bytes);
        self
    }

    /// Sets the database pool size.
    pub fn db_pool_size(mut self, size: usize) -> Self {
        self.db_pool_size = Some(size);
        self
    }

    /// Builds the configuration, filling unset fields with defaults.
    pub fn build(self) -> TriggerConfig {
        TriggerConfig {
            payload_offload_threshold: self
                .payload_offload_threshold
                .unwrap_or(DEFAULT_PAYLOAD_OFFLOAD_THRESHOLD),
            db_pool_size: self.db_pool_size.unwrap_or(DEFAULT_DB_POOL_SIZE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_builder_defaults() {
        let config = TriggerConfig::builder().build();
        assert_eq!(
            config.payload_offload_threshold(),
            DEFAULT_PAYLOAD_OFFLOAD_THRESHOLD
        );
        assert_eq!(config.db_pool_size(), DEFAULT_DB_POOL_SIZE);
    }

    #[test]
    fn test_builder_overrides() {
        let config = TriggerConfig::builder()
            .payload_offload_threshold(1)
            .db_pool_size(2)
            .build();
        assert_eq!(config.payload_offload_threshold(), 1);
        assert_eq!(config.db_pool_size(), 2);
    }

    #[test]
    #[serial]
    fn test_from_env_reads_threshold() {
        std::env::set_var("TASK_PAYLOAD_OFFLOAD_THRESHOLD", "2048");
        let config = TriggerConfig::from_env();
        assert_eq!(config.payload_offload_threshold(), 2048);
        std::env::remove_var("TASK_PAYLOAD_OFFLOAD_THRESHOLD");
    }

    #[test]
    #[serial]
    fn test_from_env_ignores_garbage() {
        std::env::set_var("TASK_PAYLOAD_OFFLOAD_THRESHOLD", "not-a-number");
        let config = TriggerConfig::from_env();
        assert_eq!(
            config.payload_offload_threshold(),
            DEFAULT_PAYLOAD_OFFLOAD_THRESHOLD
        );
        std::env::remove_var("TASK_PAYLOAD_OFFLOAD_THRESHOLD");
    }
}
