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

//! Object storage for offloaded payloads.
//!
//! Payloads above the configured threshold are uploaded here instead of
//! being stored inline on the run row. Uploads are keyed by run friendly id,
//! so a retried request with a fresh friendly id never overwrites a previous
//! upload. Uploads are not compensated on later failure; the orphaned-blob
//! leak is accepted.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::TriggerError;
use crate::models::RuntimeEnvironment;

/// Object store collaborator used for payload offloading.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads `body` under `filename`, scoped to the environment.
    async fn upload(
        &self,
        filename: &str,
        body: Vec<u8>,
        content_type: &str,
        environment: &RuntimeEnvironment,
    ) -> Result<(), TriggerError>;
}

/// Filesystem-backed object store.
///
/// Objects land under `<base_dir>/<project_id>/<environment_id>/<filename>`.
#[derive(Debug, Clone)]
pub struct FilesystemObjectStore {
    base_dir: PathBuf,
}

impl FilesystemObjectStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn object_path(&self, filename: &str, environment: &RuntimeEnvironment) -> PathBuf {
        self.base_dir
            .join(&environment.project_id)
            .join(&environment.id)
            .join(filename)
    }
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    async fn upload(
        &self,
        filename: &str,
        body: Vec<u8>,
        _content_type: &str,
        environment: &RuntimeEnvironment,
    ) -> Result<(), TriggerError> {
        let path = self.object_path(filename, environment);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TriggerError::ObjectStore(e.to_string()))?;
        }
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| TriggerError::ObjectStore(e.to_string()))?;
        debug!(path = %path.display(), "Stored offloaded object");
        Ok(())
    }
}

/// A stored object, as kept by [`InMemoryObjectStore`].
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// In-memory object store for tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<HashMap<String, StoredObject>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored object for `filename`, if any.
    pub fn get(&self, filename: &str) -> Option<StoredObject> {
        self.objects.lock().get(filename).cloned()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.lock().is_empty()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn upload(
        &self,
        filename: &str,
        body: Vec<u8>,
        content_type: &str,
        _environment: &RuntimeEnvironment,
    ) -> Result<(), TriggerError> {
        self.objects.lock().insert(
            filename.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}
