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

use std::pin::Pin;

use async_trait::async_trait;
use btleplug::{
    api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter},
    platform::{Adapter, Manager, Peripheral, PeripheralId},
};
use futures::{
    future,
    stream::{BoxStream, Stream},
    StreamExt,
};
use tracing::{debug, warn};

use super::BleDevice;
use crate::{
    api,
    common::{AdapterState, BluetoothError, DeviceId, DiscoveredDevice},
};

type EventStream = Pin<Box<dyn Stream<Item = CentralEvent> + Send>>;

/// Host adapter backed by BlueZ, CoreBluetooth or WinRT.
pub struct BleAdapter {
    inner: Adapter,
    /// Central events while a scan is running.
    events: Option<EventStream>,
}

impl BleAdapter {
    async fn find_peripheral(
        &self,
        id: &DeviceId,
    ) -> Result<Peripheral, BluetoothError> {
        self.inner
            .peripherals()
            .await?
            .into_iter()
            .find(|peripheral| peripheral.id().to_string() == id.as_str())
            .ok_or_else(|| BluetoothError::NotFound(format!("peripheral {}", id)))
    }

    async fn advertisement(
        &self,
        id: &PeripheralId,
    ) -> Result<DiscoveredDevice, BluetoothError> {
        let peripheral = self.inner.peripheral(id).await?;
        let properties = peripheral.properties().await?;
        let (name, rssi) = match properties {
            Some(properties) => (properties.local_name, properties.rssi),
            None => (None, None),
        };
        Ok(DiscoveredDevice::new(id.to_string(), name).with_rssi(rssi))
    }
}

#[async_trait]
impl api::BleAdapter for BleAdapter {
    type Device = BleDevice;

    async fn default() -> Result<Self, BluetoothError> {
        let manager = Manager::new().await?;
        let inner = manager.adapters().await?.into_iter().next().ok_or(
            BluetoothError::NotSupported(String::from("no bluetooth adapter")),
        )?;
        match inner.adapter_info().await {
            Ok(info) => debug!("Using adapter {}", info),
            Err(err) => warn!("Failed to describe adapter: {}", err),
        }

        Ok(BleAdapter {
            inner,
            events: None,
        })
    }

    async fn state(&self) -> Result<AdapterState, BluetoothError> {
        Ok(self.inner.adapter_state().await?.into())
    }

    async fn state_changes(
        &self,
    ) -> Result<BoxStream<'static, AdapterState>, BluetoothError> {
        let events = self.inner.events().await?;
        Ok(events
            .filter_map(|event| {
                future::ready(match event {
                    CentralEvent::StateUpdate(state) => Some(state.into()),
                    _ => None,
                })
            })
            .boxed())
    }

    async fn start_scan(&mut self) -> Result<(), BluetoothError> {
        // Subscribe first so no discovery slips in between.
        self.events = Some(self.inner.events().await?);
        if let Err(err) = self.inner.start_scan(ScanFilter::default()).await {
            self.events = None;
            return Err(err.into());
        }
        Ok(())
    }

    async fn stop_scan(&mut self) -> Result<(), BluetoothError> {
        if self.events.take().is_none() {
            return Err(BluetoothError::FailedPrecondition(String::from(
                "device scanning hasn't started, please call `start_scan()`",
            )));
        }
        self.inner.stop_scan().await?;
        Ok(())
    }

    async fn next_advertisement(
        &mut self,
    ) -> Result<DiscoveredDevice, BluetoothError> {
        loop {
            let events = self.events.as_mut().ok_or_else(|| {
                BluetoothError::FailedPrecondition(String::from(
                    "device scanning hasn't started, please call `start_scan()`",
                ))
            })?;
            let event = events.next().await.ok_or_else(|| {
                BluetoothError::Internal(String::from(
                    "Event returned from stream is None.",
                ))
            })?;

            let id = match event {
                CentralEvent::DeviceDiscovered(id)
                | CentralEvent::DeviceUpdated(id) => id,
                _ => continue,
            };
            // Peripherals can vanish between the event and the lookup; skip
            // those rather than ending the scan.
            match self.advertisement(&id).await {
                Ok(device) => break Ok(device),
                Err(err) => debug!("Skipping advertisement from {}: {}", id, err),
            }
        }
    }

    async fn connect(&self, id: &DeviceId) -> Result<BleDevice, BluetoothError> {
        let peripheral = self.find_peripheral(id).await?;
        let name = peripheral
            .properties()
            .await?
            .and_then(|properties| properties.local_name);
        if !peripheral.is_connected().await? {
            peripheral.connect().await?;
        }
        Ok(BleDevice::new(self.inner.clone(), peripheral, id.clone(), name))
    }
}
