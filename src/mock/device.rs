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

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::{channel::mpsc, stream::BoxStream, StreamExt};
use uuid::Uuid;

use super::{
    world::{lock, World},
    WriteRecord,
};
use crate::{
    api,
    common::{BluetoothError, DeviceId, Service, WriteKind},
};

pub struct MockDevice {
    world: Arc<Mutex<World>>,
    id: DeviceId,
    name: Option<String>,
}

impl MockDevice {
    pub(super) fn new(
        world: Arc<Mutex<World>>,
        id: DeviceId,
        name: Option<String>,
    ) -> Self {
        MockDevice { world, id, name }
    }

    fn not_connected(&self) -> BluetoothError {
        BluetoothError::FailedPrecondition(format!("{} is not connected", self.id))
    }
}

#[async_trait]
impl api::BleDevice for MockDevice {
    fn id(&self) -> DeviceId {
        self.id.clone()
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    async fn discover_services(&self) -> Result<Vec<Service>, BluetoothError> {
        let world = lock(&self.world);
        if !world.is_connected(&self.id) {
            return Err(self.not_connected());
        }
        let peripheral = world
            .peripherals
            .get(&self.id)
            .ok_or_else(|| BluetoothError::NotFound(format!("peripheral {}", self.id)))?;
        if peripheral.fail_discovery {
            return Err(BluetoothError::System(String::from(
                "service discovery failed",
            )));
        }
        Ok(peripheral.services.clone())
    }

    async fn services(&self) -> Result<Vec<Service>, BluetoothError> {
        let world = lock(&self.world);
        if !world.is_connected(&self.id) {
            return Err(self.not_connected());
        }
        Ok(world
            .peripherals
            .get(&self.id)
            .map(|peripheral| peripheral.services.clone())
            .unwrap_or_default())
    }

    async fn write(
        &self,
        service: Uuid,
        characteristic: Uuid,
        data: &[u8],
        kind: WriteKind,
    ) -> Result<(), BluetoothError> {
        let mut world = lock(&self.world);
        let record = WriteRecord {
            device: self.id.clone(),
            service,
            characteristic,
            data: data.to_vec(),
            kind,
        };
        world.write_attempts.push(record.clone());

        if !world.is_connected(&self.id) {
            return Err(self.not_connected());
        }
        world
            .peripherals
            .get(&self.id)
            .ok_or_else(|| BluetoothError::NotFound(format!("peripheral {}", self.id)))?
            .accept_write(service, characteristic, kind)?;
        world.writes.push(record);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), BluetoothError> {
        let mut world = lock(&self.world);
        if world
            .peripherals
            .get(&self.id)
            .is_some_and(|peripheral| peripheral.fail_disconnect)
        {
            return Err(BluetoothError::System(String::from(
                "disconnect rejected",
            )));
        }
        if world.is_connected(&self.id) {
            world.drop_link(&self.id);
        }
        Ok(())
    }

    async fn disconnections(
        &self,
    ) -> Result<BoxStream<'static, ()>, BluetoothError> {
        let (sender, receiver) = mpsc::unbounded();
        lock(&self.world)
            .disconnect_listeners
            .entry(self.id.clone())
            .or_default()
            .push(sender);
        Ok(receiver.boxed())
    }
}
