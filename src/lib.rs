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

//! BLE link to ESP32-based robotic arm controllers.
//!
//! [`ConnectionManager`] owns at most one session to an arm. It walks the
//! user through permissions and adapter power, scans by advertised name,
//! connects and discovers services, then writes short text commands such as
//! `"A1"` to whichever writable characteristic accepts them.

pub mod api;
pub mod command;
mod common;
pub mod config;
pub mod manager;
pub mod mock;

use std::sync::Arc;

use api::{PermissionProvider, RemediationPrompt};
pub use command::{ArmCommand, Motor, MotorAction};
pub use common::{
    writable_characteristics, AdapterState, AdapterUnavailableReason,
    BluetoothError, Characteristic, CharacteristicFlags, ConnectionError,
    DeviceId, DeviceInfo, DiscoveredDevice, NameFilter, Permission,
    PermissionStatus, RemediationChoice, Remedy, Service, WriteKind,
    BLUETOOTH_PERMISSION_API_LEVEL, DEFAULT_NAME_KEYWORDS,
};
pub use config::{ConfigError, EndpointConfig, ManagerConfig, WritePolicy};
pub use manager::{ConnectionManager, DisconnectReason, ManagerEvent, ManagerState};

cfg_if::cfg_if! {
    if #[cfg(feature = "btleplug")] {
        mod btleplug;
        use self::btleplug as platform;
    } else {
        mod unsupported;
        use unsupported as platform;
    }
}

pub struct Platform;

impl Platform {
    pub async fn default_adapter(
    ) -> Result<impl api::BleAdapter, BluetoothError> {
        <platform::BleAdapter as api::BleAdapter>::default().await
    }

    /// Connection manager over the host's default adapter.
    pub async fn connection_manager(
        permissions: Arc<dyn PermissionProvider>,
        prompt: Arc<dyn RemediationPrompt>,
        config: ManagerConfig,
    ) -> Result<ConnectionManager<impl api::BleAdapter>, BluetoothError> {
        let adapter =
            <platform::BleAdapter as api::BleAdapter>::default().await?;
        Ok(ConnectionManager::new(adapter, permissions, prompt, config))
    }
}
