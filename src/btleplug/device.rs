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

use std::collections::BTreeSet;

use async_trait::async_trait;
use btleplug::{
    api::{
        self as btle, Central as _, CentralEvent, CharPropFlags,
        Peripheral as _, WriteType,
    },
    platform::{Adapter, Peripheral},
};
use futures::{future, stream::BoxStream, StreamExt};
use tracing::debug;
use uuid::Uuid;

use crate::{
    api,
    common::{
        BluetoothError, Characteristic, CharacteristicFlags, DeviceId, Service,
        WriteKind,
    },
};

/// Connected peripheral. Keeps a handle on the adapter to follow its
/// disconnect events.
pub struct BleDevice {
    adapter: Adapter,
    peripheral: Peripheral,
    id: DeviceId,
    name: Option<String>,
}

impl BleDevice {
    pub(super) fn new(
        adapter: Adapter,
        peripheral: Peripheral,
        id: DeviceId,
        name: Option<String>,
    ) -> Self {
        BleDevice {
            adapter,
            peripheral,
            id,
            name,
        }
    }

    /// Characteristic handle for a write. Falls back to a bare handle when
    /// discovery never reported the target, letting the stack resolve it.
    fn characteristic(&self, service: Uuid, characteristic: Uuid) -> btle::Characteristic {
        self.peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == characteristic && c.service_uuid == service)
            .unwrap_or_else(|| {
                debug!(
                    "Characteristic {} not in discovered services, writing blind",
                    characteristic
                );
                btle::Characteristic {
                    uuid: characteristic,
                    service_uuid: service,
                    properties: CharPropFlags::WRITE,
                    descriptors: BTreeSet::new(),
                }
            })
    }
}

fn convert(services: BTreeSet<btle::Service>) -> Vec<Service> {
    services
        .into_iter()
        .map(|service| {
            let characteristics = service
                .characteristics
                .into_iter()
                .map(|c| {
                    Characteristic::new(
                        c.uuid,
                        CharacteristicFlags {
                            readable: c.properties.contains(CharPropFlags::READ),
                            writable_with_response: c
                                .properties
                                .contains(CharPropFlags::WRITE),
                            writable_without_response: c
                                .properties
                                .contains(CharPropFlags::WRITE_WITHOUT_RESPONSE),
                        },
                    )
                })
                .collect();
            Service::new(service.uuid, characteristics)
        })
        .collect()
}

#[async_trait]
impl api::BleDevice for BleDevice {
    fn id(&self) -> DeviceId {
        self.id.clone()
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    async fn discover_services(&self) -> Result<Vec<Service>, BluetoothError> {
        self.peripheral.discover_services().await?;
        Ok(convert(self.peripheral.services()))
    }

    async fn services(&self) -> Result<Vec<Service>, BluetoothError> {
        Ok(convert(self.peripheral.services()))
    }

    async fn write(
        &self,
        service: Uuid,
        characteristic: Uuid,
        data: &[u8],
        kind: WriteKind,
    ) -> Result<(), BluetoothError> {
        let target = self.characteristic(service, characteristic);
        let write_type = match kind {
            WriteKind::WithResponse => WriteType::WithResponse,
            WriteKind::WithoutResponse => WriteType::WithoutResponse,
        };
        self.peripheral.write(&target, data, write_type).await?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), BluetoothError> {
        self.peripheral.disconnect().await?;
        Ok(())
    }

    async fn disconnections(
        &self,
    ) -> Result<BoxStream<'static, ()>, BluetoothError> {
        let id = self.peripheral.id();
        let events = self.adapter.events().await?;
        Ok(events
            .filter_map(move |event| {
                future::ready(match event {
                    CentralEvent::DeviceDisconnected(lost) if lost == id => Some(()),
                    _ => None,
                })
            })
            .boxed())
    }
}
