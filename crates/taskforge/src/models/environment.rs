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

//! Runtime environment model.
//!
//! The environment is the authenticated execution context resolved by the
//! enclosing API layer. It is read-only to the trigger pipeline.

use serde::{Deserialize, Serialize};

/// The kind of an execution environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvironmentType {
    Development,
    Production,
    Staging,
    Preview,
}

impl EnvironmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentType::Development => "DEVELOPMENT",
            EnvironmentType::Production => "PRODUCTION",
            EnvironmentType::Staging => "STAGING",
            EnvironmentType::Preview => "PREVIEW",
        }
    }

    /// Development environments skip entitlement checks and never have a
    /// promoted current worker.
    pub fn is_development(&self) -> bool {
        matches!(self, EnvironmentType::Development)
    }
}

/// An authenticated execution context belonging to a project which belongs
/// to an organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeEnvironment {
    pub id: String,
    pub env_type: EnvironmentType,
    pub project_id: String,
    pub organization_id: String,
    pub maximum_concurrency_limit: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_predicate() {
        assert!(EnvironmentType::Development.is_development());
        assert!(!EnvironmentType::Production.is_development());
        assert!(!EnvironmentType::Staging.is_development());
        assert!(!EnvironmentType::Preview.is_development());
    }

    #[test]
    fn test_serde_wire_shape() {
        let json = serde_json::to_string(&EnvironmentType::Production).unwrap();
        assert_eq!(json, "\"PRODUCTION\"");
    }
}
