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

use serde::Serialize;
use uuid::Uuid;

use super::DeviceId;

/// How a GATT write is confirmed by the peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteKind {
    WithResponse,
    WithoutResponse,
}

/// Property bits of a characteristic that matter to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct CharacteristicFlags {
    #[serde(rename = "isReadable")]
    pub readable: bool,
    #[serde(rename = "isWritableWithResponse")]
    pub writable_with_response: bool,
    #[serde(rename = "isWritableWithoutResponse")]
    pub writable_without_response: bool,
}

impl CharacteristicFlags {
    pub fn is_writable(&self) -> bool {
        self.writable_with_response || self.writable_without_response
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Characteristic {
    pub uuid: Uuid,
    #[serde(flatten)]
    pub flags: CharacteristicFlags,
}

impl Characteristic {
    pub fn new(uuid: Uuid, flags: CharacteristicFlags) -> Self {
        Characteristic { uuid, flags }
    }
}

/// GATT service snapshot. Characteristics keep discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Service {
    pub uuid: Uuid,
    pub characteristics: Vec<Characteristic>,
}

impl Service {
    pub fn new(uuid: Uuid, characteristics: Vec<Characteristic>) -> Self {
        Service {
            uuid,
            characteristics,
        }
    }
}

/// Every writable characteristic, services first then characteristics, both
/// in discovery order. The first item is the preferred write target.
pub fn writable_characteristics(
    services: &[Service],
) -> impl Iterator<Item = (&Service, &Characteristic)> {
    services.iter().flat_map(|service| {
        service
            .characteristics
            .iter()
            .filter(|characteristic| characteristic.flags.is_writable())
            .map(move |characteristic| (service, characteristic))
    })
}

/// Snapshot of a connected peripheral, shaped for configuration tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub id: DeviceId,
    pub name: Option<String>,
    pub services: Vec<Service>,
}

impl DeviceInfo {
    /// `(service, characteristic)` of the first writable characteristic,
    /// i.e. the target `send_command` would try first.
    pub fn first_writable(&self) -> Option<(Uuid, Uuid)> {
        writable_characteristics(&self.services)
            .next()
            .map(|(service, characteristic)| (service.uuid, characteristic.uuid))
    }
}
