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

use std::collections::HashSet;

use uuid::Uuid;

use crate::common::{
    BluetoothError, DeviceId, DiscoveredDevice, Service, WriteKind,
};

/// Scripted GATT server.
#[derive(Debug, Clone)]
pub struct MockPeripheral {
    pub(super) id: DeviceId,
    pub(super) name: Option<String>,
    pub(super) services: Vec<Service>,
    /// Characteristics that fail every write.
    pub(super) rejecting: HashSet<Uuid>,
    /// Targets that accept writes without showing up in discovery.
    pub(super) hidden: HashSet<(Uuid, Uuid)>,
    pub(super) fail_connect: bool,
    pub(super) fail_discovery: bool,
    pub(super) fail_disconnect: bool,
}

impl MockPeripheral {
    pub fn new(id: impl Into<DeviceId>, name: Option<&str>) -> Self {
        MockPeripheral {
            id: id.into(),
            name: name.map(String::from),
            services: Vec::new(),
            rejecting: HashSet::new(),
            hidden: HashSet::new(),
            fail_connect: false,
            fail_discovery: false,
            fail_disconnect: false,
        }
    }

    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    pub fn with_service(mut self, service: Service) -> Self {
        self.services.push(service);
        self
    }

    pub fn rejecting(mut self, characteristic: Uuid) -> Self {
        self.rejecting.insert(characteristic);
        self
    }

    pub fn with_hidden_endpoint(mut self, service: Uuid, characteristic: Uuid) -> Self {
        self.hidden.insert((service, characteristic));
        self
    }

    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub fn failing_discovery(mut self) -> Self {
        self.fail_discovery = true;
        self
    }

    pub fn failing_disconnect(mut self) -> Self {
        self.fail_disconnect = true;
        self
    }

    /// The advertisement this peripheral sends.
    pub fn advertisement(&self) -> DiscoveredDevice {
        DiscoveredDevice::new(self.id.clone(), self.name.clone())
    }

    pub(super) fn accept_write(
        &self,
        service: Uuid,
        characteristic: Uuid,
        kind: WriteKind,
    ) -> Result<(), BluetoothError> {
        if self.rejecting.contains(&characteristic) {
            return Err(BluetoothError::System(format!(
                "write to {} rejected",
                characteristic
            )));
        }
        if self.hidden.contains(&(service, characteristic)) {
            return Ok(());
        }

        let flags = self
            .services
            .iter()
            .filter(|s| s.uuid == service)
            .flat_map(|s| s.characteristics.iter())
            .find(|c| c.uuid == characteristic)
            .map(|c| c.flags)
            .ok_or_else(|| {
                BluetoothError::NotFound(format!("characteristic {}", characteristic))
            })?;
        let supported = match kind {
            WriteKind::WithResponse => flags.writable_with_response,
            WriteKind::WithoutResponse => flags.writable_without_response,
        };
        if supported {
            Ok(())
        } else {
            Err(BluetoothError::System(format!(
                "{} does not support {:?}",
                characteristic, kind
            )))
        }
    }
}
