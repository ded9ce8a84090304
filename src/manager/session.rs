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

use tokio::task::JoinHandle;

use crate::{
    api::BleDevice,
    common::{DeviceInfo, Service},
};

/// The one live connection a manager owns. Dropping it stops its disconnect
/// watcher.
pub(crate) struct Session<D> {
    /// Distinguishes this session from any earlier one to the same device.
    pub(crate) id: u64,
    pub(crate) device: D,
    pub(crate) services: Vec<Service>,
    watcher: Option<JoinHandle<()>>,
}

impl<D: BleDevice> Session<D> {
    pub(crate) fn new(id: u64, device: D, services: Vec<Service>) -> Self {
        Session {
            id,
            device,
            services,
            watcher: None,
        }
    }

    pub(crate) fn set_watcher(&mut self, watcher: JoinHandle<()>) {
        if let Some(previous) = self.watcher.replace(watcher) {
            previous.abort();
        }
    }

    pub(crate) fn info(&self) -> DeviceInfo {
        self.info_with(self.services.clone())
    }

    pub(crate) fn info_with(&self, services: Vec<Service>) -> DeviceInfo {
        DeviceInfo {
            id: self.device.id(),
            name: self.device.name(),
            services,
        }
    }
}

impl<D> Drop for Session<D> {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
    }
}
