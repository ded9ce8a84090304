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

mod adapter_state;
mod advertisement;
mod error;
mod filter;
mod gatt;
mod permission;

pub use adapter_state::{AdapterState, AdapterUnavailableReason};
pub use advertisement::{DeviceId, DiscoveredDevice};
pub use error::{BluetoothError, ConnectionError, Remedy};
pub use filter::{NameFilter, DEFAULT_NAME_KEYWORDS};
pub use gatt::{
    writable_characteristics, Characteristic, CharacteristicFlags, DeviceInfo,
    Service, WriteKind,
};
pub use permission::{
    Permission, PermissionStatus, RemediationChoice,
    BLUETOOTH_PERMISSION_API_LEVEL,
};
