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

use async_trait::async_trait;

use crate::common::{
    AdapterUnavailableReason, BluetoothError, Permission, PermissionStatus,
    RemediationChoice,
};

/// Host OS permission subsystem.
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    /// Platform API level, or `None` when the host has no runtime permission
    /// model for Bluetooth.
    fn platform_version(&self) -> Option<u32>;

    /// Ask the user for `permissions`. Returns one status per requested
    /// permission, in any order.
    async fn request(
        &self,
        permissions: &[Permission],
    ) -> Result<Vec<(Permission, PermissionStatus)>, BluetoothError>;
}

/// User-facing side of `ConnectionManager::initialize()`. Implementations
/// show a dialog and may await the user for as long as it takes.
#[async_trait]
pub trait RemediationPrompt: Send + Sync {
    /// Permissions were refused. Typically offers to open the app settings.
    async fn permission_denied(&self);

    /// The radio can't be used. The answer decides whether the manager polls
    /// the adapter again.
    async fn adapter_unavailable(
        &self,
        reason: AdapterUnavailableReason,
    ) -> RemediationChoice;
}

/// For desktop hosts where Bluetooth access is not gated at runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRuntimePermissions;

#[async_trait]
impl PermissionProvider for NoRuntimePermissions {
    fn platform_version(&self) -> Option<u32> {
        None
    }

    async fn request(
        &self,
        permissions: &[Permission],
    ) -> Result<Vec<(Permission, PermissionStatus)>, BluetoothError> {
        Ok(permissions
            .iter()
            .map(|permission| (*permission, PermissionStatus::Granted))
            .collect())
    }
}

/// Headless prompt: never asks, always gives up.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclineRemediation;

#[async_trait]
impl RemediationPrompt for DeclineRemediation {
    async fn permission_denied(&self) {}

    async fn adapter_unavailable(
        &self,
        _reason: AdapterUnavailableReason,
    ) -> RemediationChoice {
        RemediationChoice::Cancel
    }
}
