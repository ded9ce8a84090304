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

use std::fmt;

use serde::Serialize;

/// Opaque platform identifier of a peripheral. Unique per physical device for
/// the lifetime of an adapter session, but not stable across sessions or
/// hosts.
#[derive(PartialEq, Eq, Clone, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        DeviceId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        DeviceId(String::from(id))
    }
}

impl From<String> for DeviceId {
    fn from(id: String) -> Self {
        DeviceId(id)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Holds data related to an incoming BLE advertisement: who sent it and what
/// name it carried. Only lives as long as the scan that produced it cares
/// about it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveredDevice {
    id: DeviceId,
    name: Option<String>,
    rssi: Option<i16>,
}

impl DiscoveredDevice {
    pub fn new(id: impl Into<DeviceId>, name: Option<String>) -> Self {
        DiscoveredDevice {
            id: id.into(),
            name,
            rssi: None,
        }
    }

    pub fn with_rssi(mut self, rssi: Option<i16>) -> Self {
        self.rssi = rssi;
        self
    }

    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    /// Advertised local name, if the peripheral sent one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn rssi(&self) -> Option<i16> {
        self.rssi
    }
}
