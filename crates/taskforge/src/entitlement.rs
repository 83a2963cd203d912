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

//! Entitlement checks.
//!
//! Non-development triggers ask this collaborator whether the owning
//! organization still has credit. An absent reply means "has access"; only
//! an explicit `has_access = false` blocks the trigger.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TriggerError;

/// Reply from the entitlement service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entitlement {
    pub has_access: bool,
}

/// Entitlement collaborator.
#[async_trait]
pub trait EntitlementChecker: Send + Sync {
    /// Current validity for an organization. `None` is treated as access
    /// granted.
    async fn current_validity(
        &self,
        organization_id: &str,
    ) -> Result<Option<Entitlement>, TriggerError>;
}

/// Checker used by deployments without billing: every organization has
/// access.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnlimitedEntitlements;

#[async_trait]
impl EntitlementChecker for UnlimitedEntitlements {
    async fn current_validity(
        &self,
        _organization_id: &str,
    ) -> Result<Option<Entitlement>, TriggerError> {
        Ok(None)
    }
}

/// Checker that returns a fixed reply, handy in tests and local setups.
#[derive(Debug, Clone, Copy)]
pub struct StaticEntitlementChecker {
    has_access: bool,
}

impl StaticEntitlementChecker {
    pub fn new(has_access: bool) -> Self {
        Self { has_access }
    }
}

#[async_trait]
impl EntitlementChecker for StaticEntitlementChecker {
    async fn current_validity(
        &self,
        _organization_id: &str,
    ) -> Result<Option<Entitlement>, TriggerError> {
        Ok(Some(Entitlement {
            has_access: self.has_access,
        }))
    }
}
