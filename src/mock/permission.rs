// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{
    collections::{HashSet, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex, PoisonError,
    },
};

use async_trait::async_trait;

use super::MockController;
use crate::{
    api::{PermissionProvider, RemediationPrompt},
    common::{
        AdapterState, AdapterUnavailableReason, BluetoothError, Permission,
        PermissionStatus, RemediationChoice,
    },
};

/// Permission subsystem that grants everything except what it was told to
/// deny.
pub struct MockPermissions {
    version: Option<u32>,
    denied: HashSet<Permission>,
    requests: Mutex<Vec<Vec<Permission>>>,
}

impl MockPermissions {
    pub fn new(version: Option<u32>) -> Self {
        MockPermissions {
            version,
            denied: HashSet::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn denying(mut self, permission: Permission) -> Self {
        self.denied.insert(permission);
        self
    }

    /// Each request made so far, in order.
    pub fn requests(&self) -> Vec<Vec<Permission>> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PermissionProvider for MockPermissions {
    fn platform_version(&self) -> Option<u32> {
        self.version
    }

    async fn request(
        &self,
        permissions: &[Permission],
    ) -> Result<Vec<(Permission, PermissionStatus)>, BluetoothError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(permissions.to_vec());
        Ok(permissions
            .iter()
            .map(|permission| {
                let status = if self.denied.contains(permission) {
                    PermissionStatus::Denied
                } else {
                    PermissionStatus::Granted
                };
                (*permission, status)
            })
            .collect())
    }
}

/// Prompt that answers from a queue, then cancels. Answering `Retry` can
/// also flip the mock radio, like a user turning Bluetooth on.
pub struct ScriptedPrompt {
    choices: Mutex<VecDeque<RemediationChoice>>,
    on_retry: Option<(MockController, AdapterState)>,
    permission_prompts: AtomicUsize,
    adapter_prompts: Mutex<Vec<AdapterUnavailableReason>>,
}

impl ScriptedPrompt {
    pub fn new(choices: impl IntoIterator<Item = RemediationChoice>) -> Self {
        ScriptedPrompt {
            choices: Mutex::new(choices.into_iter().collect()),
            on_retry: None,
            permission_prompts: AtomicUsize::new(0),
            adapter_prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn applying_on_retry(
        mut self,
        controller: MockController,
        state: AdapterState,
    ) -> Self {
        self.on_retry = Some((controller, state));
        self
    }

    pub fn permission_prompts(&self) -> usize {
        self.permission_prompts.load(Ordering::SeqCst)
    }

    /// Reasons shown to the user, in order.
    pub fn adapter_prompts(&self) -> Vec<AdapterUnavailableReason> {
        self.adapter_prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl RemediationPrompt for ScriptedPrompt {
    async fn permission_denied(&self) {
        self.permission_prompts.fetch_add(1, Ordering::SeqCst);
    }

    async fn adapter_unavailable(
        &self,
        reason: AdapterUnavailableReason,
    ) -> RemediationChoice {
        self.adapter_prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(reason);
        let choice = self
            .choices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(RemediationChoice::Cancel);
        if choice == RemediationChoice::Retry {
            if let Some((controller, state)) = &self.on_retry {
                controller.set_adapter_state(*state);
            }
        }
        choice
    }
}
