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

/// First platform API level with dedicated Bluetooth scan/connect
/// permissions. Below it, BLE scanning is gated on location access.
pub const BLUETOOTH_PERMISSION_API_LEVEL: u32 = 31;

/// Runtime permissions that gate BLE scanning and connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    BluetoothScan,
    BluetoothConnect,
    AccessFineLocation,
    AccessCoarseLocation,
}

impl Permission {
    /// Permissions to request on a platform reporting `platform_version`.
    /// `None` means the host has no runtime permission model.
    pub fn required_for(platform_version: Option<u32>) -> &'static [Permission] {
        match platform_version {
            None => &[],
            Some(version) if version >= BLUETOOTH_PERMISSION_API_LEVEL => &[
                Permission::BluetoothScan,
                Permission::BluetoothConnect,
                Permission::AccessFineLocation,
            ],
            Some(_) => &[
                Permission::AccessFineLocation,
                Permission::AccessCoarseLocation,
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// Denied, and the OS will no longer show its own dialog.
    NeverAskAgain,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        *self == PermissionStatus::Granted
    }
}

/// The user's answer to a remediation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemediationChoice {
    Cancel,
    /// The prompt sent the user to the system settings. The manager gives up
    /// for now; the caller should call `initialize()` again on return.
    OpenSettings,
    /// Poll the adapter state again.
    Retry,
}
