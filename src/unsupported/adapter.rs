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

use super::{unsupported, BleDevice};
use crate::{
    api,
    common::{AdapterState, BluetoothError, DeviceId, DiscoveredDevice},
};

pub struct BleAdapter;

#[async_trait]
impl api::BleAdapter for BleAdapter {
    type Device = BleDevice;

    async fn default() -> Result<Self, BluetoothError> {
        Err(unsupported())
    }

    async fn state(&self) -> Result<AdapterState, BluetoothError> {
        Ok(AdapterState::Unsupported)
    }

    async fn state_changes(
        &self,
    ) -> Result<BoxStream<'static, AdapterState>, BluetoothError> {
        Err(unsupported())
    }

    async fn start_scan(&mut self) -> Result<(), BluetoothError> {
        Err(unsupported())
    }

    async fn stop_scan(&mut self) -> Result<(), BluetoothError> {
        Err(unsupported())
    }

    async fn next_advertisement(
        &mut self,
    ) -> Result<DiscoveredDevice, BluetoothError> {
        Err(unsupported())
    }

    async fn connect(&self, _id: &DeviceId) -> Result<BleDevice, BluetoothError> {
        Err(unsupported())
    }
}
