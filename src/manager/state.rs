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

use crate::common::{
    AdapterState, AdapterUnavailableReason, DeviceId, DeviceInfo,
    DiscoveredDevice,
};

/// Lifecycle of a `ConnectionManager`.
///
/// ```text
/// Uninitialized -> Initializing -> {Ready, PermissionDenied, AdapterUnavailable}
/// Ready -> Scanning -> {Ready, ScanTimeout -> Ready, AdapterUnavailable}
/// Ready -> Connecting -> Connected -> Disconnecting -> Ready
/// ```
///
/// Losing the link or the radio moves any connected state straight to
/// `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    Uninitialized,
    Initializing,
    Ready,
    PermissionDenied,
    AdapterUnavailable(AdapterUnavailableReason),
    Scanning,
    ScanTimeout,
    Connecting,
    Connected,
    Disconnecting,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// `disconnect()` was called.
    Requested,
    /// The peripheral went away: powered off, out of range, etc.
    Unsolicited,
    /// The local radio stopped being powered on.
    AdapterPoweredOff,
    /// `connect()` installed a new session.
    Replaced,
    /// `teardown()` was called.
    TornDown,
}

/// Published on `ConnectionManager::subscribe()` after the manager's own
/// state reflects the change.
#[derive(Debug, Clone, PartialEq)]
pub enum ManagerEvent {
    AdapterStateChanged(AdapterState),
    DeviceFound(DiscoveredDevice),
    ScanTimedOut,
    Connected(DeviceInfo),
    Disconnected {
        device: DeviceId,
        reason: DisconnectReason,
    },
}
