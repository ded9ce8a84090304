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

use async_trait::async_trait;
use futures::stream::BoxStream;

use super::BleDevice;
use crate::common::{AdapterState, BluetoothError, DeviceId, DiscoveredDevice};

/// Concrete types implementing this trait are Bluetooth Central devices.
/// They provide methods for observing the radio, scanning for nearby
/// advertisements and opening connections.
#[async_trait]
pub trait BleAdapter: Sized + Send + Sync + 'static {
    /// Connection handle produced by `connect()`.
    type Device: BleDevice;

    /// Retrieve the system-default Bluetooth adapter.
    async fn default() -> Result<Self, BluetoothError>;

    /// Current power state of the radio.
    async fn state(&self) -> Result<AdapterState, BluetoothError>;

    /// Stream of power state updates, starting with the next change. Each
    /// call returns an independent subscription; dropping it unsubscribes.
    async fn state_changes(
        &self,
    ) -> Result<BoxStream<'static, AdapterState>, BluetoothError>;

    /// Begin scanning for nearby advertisements, without any service filter.
    async fn start_scan(&mut self) -> Result<(), BluetoothError>;

    /// Stop scanning for nearby advertisements.
    async fn stop_scan(&mut self) -> Result<(), BluetoothError>;

    /// Poll next discovered device. Must be cancel-safe: dropping the future
    /// loses no advertisement that a later call would have returned.
    async fn next_advertisement(
        &mut self,
    ) -> Result<DiscoveredDevice, BluetoothError>;

    /// Open a transport connection to a previously advertised peripheral.
    async fn connect(
        &self,
        id: &DeviceId,
    ) -> Result<Self::Device, BluetoothError>;
}
