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

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use futures::channel::mpsc::UnboundedSender;
use uuid::Uuid;

use super::MockPeripheral;
use crate::common::{AdapterState, DeviceId, WriteKind};

/// One write as the peripheral saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub device: DeviceId,
    pub service: Uuid,
    pub characteristic: Uuid,
    pub data: Vec<u8>,
    pub kind: WriteKind,
}

impl WriteRecord {
    /// Payload as text, for asserting on commands.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

/// Radio and peripherals shared by an adapter, its devices and the test's
/// controller.
#[derive(Default)]
pub(super) struct World {
    pub(super) state: AdapterState,
    pub(super) state_listeners: Vec<UnboundedSender<AdapterState>>,
    pub(super) peripherals: HashMap<DeviceId, MockPeripheral>,
    pub(super) connected: HashMap<DeviceId, bool>,
    pub(super) disconnect_listeners: HashMap<DeviceId, Vec<UnboundedSender<()>>>,
    pub(super) scanning: bool,
    pub(super) scan_starts: usize,
    pub(super) scan_stops: usize,
    pub(super) overlapping_scan_starts: usize,
    pub(super) connects: usize,
    pub(super) write_attempts: Vec<WriteRecord>,
    pub(super) writes: Vec<WriteRecord>,
}

impl World {
    pub(super) fn set_state(&mut self, state: AdapterState) {
        self.state = state;
        self.state_listeners
            .retain(|listener| listener.unbounded_send(state).is_ok());
    }

    pub(super) fn is_connected(&self, id: &DeviceId) -> bool {
        self.connected.get(id).copied().unwrap_or(false)
    }

    /// Marks `id` disconnected and tells everyone watching it.
    pub(super) fn drop_link(&mut self, id: &DeviceId) {
        self.connected.insert(id.clone(), false);
        if let Some(listeners) = self.disconnect_listeners.get_mut(id) {
            listeners.retain(|listener| listener.unbounded_send(()).is_ok());
        }
    }
}

pub(super) fn lock(world: &Mutex<World>) -> MutexGuard<'_, World> {
    world.lock().unwrap_or_else(PoisonError::into_inner)
}
