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
use uuid::Uuid;

use crate::common::{BluetoothError, DeviceId, Service, WriteKind};

/// Concrete types implementing this trait represent connected BLE Peripheral
/// devices. They provide methods for GATT discovery, characteristic writes
/// and tearing the link down.
#[async_trait]
pub trait BleDevice: Send + Sync + 'static {
    /// Retrieve this device's platform identifier.
    fn id(&self) -> DeviceId;

    /// Retrieve the name advertised by this device, if any.
    fn name(&self) -> Option<String>;

    /// Enumerate all services and their characteristics over the air.
    async fn discover_services(&self) -> Result<Vec<Service>, BluetoothError>;

    /// Services known from the last discovery, without touching the radio
    /// where the platform caches them.
    async fn services(&self) -> Result<Vec<Service>, BluetoothError>;

    /// Write `data` to a characteristic. The target does not need to have
    /// shown up in discovery; the platform decides whether it exists.
    async fn write(
        &self,
        service: Uuid,
        characteristic: Uuid,
        data: &[u8],
        kind: WriteKind,
    ) -> Result<(), BluetoothError>;

    /// Request a transport-level disconnect.
    async fn disconnect(&self) -> Result<(), BluetoothError>;

    /// Yields once per link loss, whatever the cause, including a
    /// `disconnect()` call on this handle.
    async fn disconnections(
        &self,
    ) -> Result<BoxStream<'static, ()>, BluetoothError>;
}
