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

use super::unsupported;
use crate::{
    api,
    common::{BluetoothError, DeviceId, Service, WriteKind},
};

/// Never constructed: the unsupported adapter can't connect.
pub struct BleDevice {
    id: DeviceId,
}

#[async_trait]
impl api::BleDevice for BleDevice {
    fn id(&self) -> DeviceId {
        self.id.clone()
    }

    fn name(&self) -> Option<String> {
        None
    }

    async fn discover_services(&self) -> Result<Vec<Service>, BluetoothError> {
        Err(unsupported())
    }

    async fn services(&self) -> Result<Vec<Service>, BluetoothError> {
        Err(unsupported())
    }

    async fn write(
        &self,
        _service: Uuid,
        _characteristic: Uuid,
        _data: &[u8],
        _kind: WriteKind,
    ) -> Result<(), BluetoothError> {
        Err(unsupported())
    }

    async fn disconnect(&self) -> Result<(), BluetoothError> {
        Err(unsupported())
    }

    async fn disconnections(
        &self,
    ) -> Result<BoxStream<'static, ()>, BluetoothError> {
        Err(unsupported())
    }
}
