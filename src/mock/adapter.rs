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
use tokio::sync::mpsc as tokio_mpsc;
use tracing::debug;

use super::{
    world::{lock, World},
    MockDevice, MockPeripheral, WriteRecord,
};
use crate::{
    api,
    common::{AdapterState, BluetoothError, DeviceId, DiscoveredDevice},
};

/// Test-side handle on a mock radio. Cheap to clone.
#[derive(Clone)]
pub struct MockController {
    world: Arc<Mutex<World>>,
    advertisements: tokio_mpsc::UnboundedSender<DiscoveredDevice>,
}

impl MockController {
    pub fn add_peripheral(&self, peripheral: MockPeripheral) {
        lock(&self.world)
            .peripherals
            .insert(peripheral.id.clone(), peripheral);
    }

    /// Queue an advertisement. Advertisements are delivered in order to
    /// whoever scans next.
    pub fn advertise(&self, device: DiscoveredDevice) {
        if self.advertisements.send(device).is_err() {
            debug!("Mock adapter dropped, advertisement lost.");
        }
    }

    /// Queue the advertisement of a registered peripheral.
    pub fn advertise_peripheral(&self, id: &DeviceId) {
        let device = lock(&self.world)
            .peripherals
            .get(id)
            .map(MockPeripheral::advertisement);
        if let Some(device) = device {
            self.advertise(device);
        }
    }

    pub fn set_adapter_state(&self, state: AdapterState) {
        lock(&self.world).set_state(state);
    }

    /// Simulate the peripheral going away on its own.
    pub fn drop_connection(&self, id: &DeviceId) {
        lock(&self.world).drop_link(id);
    }

    pub fn is_connected(&self, id: &DeviceId) -> bool {
        lock(&self.world).is_connected(id)
    }

    pub fn is_scanning(&self) -> bool {
        lock(&self.world).scanning
    }

    pub fn scan_starts(&self) -> usize {
        lock(&self.world).scan_starts
    }

    pub fn scan_stops(&self) -> usize {
        lock(&self.world).scan_stops
    }

    /// Scans started while another was still running.
    pub fn overlapping_scan_starts(&self) -> usize {
        lock(&self.world).overlapping_scan_starts
    }

    pub fn connects(&self) -> usize {
        lock(&self.world).connects
    }

    /// Every write, accepted or not, in the order tried.
    pub fn write_attempts(&self) -> Vec<WriteRecord> {
        lock(&self.world).write_attempts.clone()
    }

    /// Writes the peripheral accepted.
    pub fn writes(&self) -> Vec<WriteRecord> {
        lock(&self.world).writes.clone()
    }
}

pub struct MockBleAdapter {
    world: Arc<Mutex<World>>,
    advertisements: tokio_mpsc::UnboundedReceiver<DiscoveredDevice>,
}

impl MockBleAdapter {
    /// Powered-on radio with no peripherals, plus its controller.
    pub fn new() -> (Self, MockController) {
        let world = Arc::new(Mutex::new(World {
            state: AdapterState::PoweredOn,
            ..World::default()
        }));
        let (sender, receiver) = tokio_mpsc::unbounded_channel();
        (
            MockBleAdapter {
                world: world.clone(),
                advertisements: receiver,
            },
            MockController {
                world,
                advertisements: sender,
            },
        )
    }
}

#[async_trait]
impl api::BleAdapter for MockBleAdapter {
    type Device = MockDevice;

    async fn default() -> Result<Self, BluetoothError> {
        Ok(MockBleAdapter::new().0)
    }

    async fn state(&self) -> Result<AdapterState, BluetoothError> {
        Ok(lock(&self.world).state)
    }

    async fn state_changes(
        &self,
    ) -> Result<BoxStream<'static, AdapterState>, BluetoothError> {
        let (sender, receiver) = mpsc::unbounded();
        lock(&self.world).state_listeners.push(sender);
        Ok(receiver.boxed())
    }

    async fn start_scan(&mut self) -> Result<(), BluetoothError> {
        let mut world = lock(&self.world);
        if !world.state.is_powered_on() {
            return Err(BluetoothError::FailedPrecondition(String::from(
                "adapter is not powered on",
            )));
        }
        if world.scanning {
            world.overlapping_scan_starts += 1;
        }
        world.scanning = true;
        world.scan_starts += 1;
        Ok(())
    }

    async fn stop_scan(&mut self) -> Result<(), BluetoothError> {
        let mut world = lock(&self.world);
        if !world.scanning {
            return Err(BluetoothError::FailedPrecondition(String::from(
                "device scanning hasn't started, please call `start_scan()`",
            )));
        }
        world.scanning = false;
        world.scan_stops += 1;
        Ok(())
    }

    async fn next_advertisement(
        &mut self,
    ) -> Result<DiscoveredDevice, BluetoothError> {
        let scanning = lock(&self.world).scanning;
        if !scanning {
            return Err(BluetoothError::FailedPrecondition(String::from(
                "device scanning hasn't started, please call `start_scan()`",
            )));
        }
        self.advertisements.recv().await.ok_or_else(|| {
            BluetoothError::Internal(String::from("advertisement source closed"))
        })
    }

    async fn connect(&self, id: &DeviceId) -> Result<MockDevice, BluetoothError> {
        let mut world = lock(&self.world);
        if !world.state.is_powered_on() {
            return Err(BluetoothError::FailedPrecondition(String::from(
                "adapter is not powered on",
            )));
        }
        let peripheral = world
            .peripherals
            .get(id)
            .ok_or_else(|| BluetoothError::NotFound(format!("peripheral {}", id)))?;
        if peripheral.fail_connect {
            return Err(BluetoothError::System(format!(
                "connection to {} refused",
                id
            )));
        }
        let name = peripheral.name.clone();
        world.connected.insert(id.clone(), true);
        world.connects += 1;
        Ok(MockDevice::new(self.world.clone(), id.clone(), name))
    }
}
