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

use btleplug::api::CentralState;

use crate::common::{AdapterState, BluetoothError};

impl From<btleplug::Error> for BluetoothError {
    fn from(err: btleplug::Error) -> Self {
        match err {
            btleplug::Error::PermissionDenied => {
                BluetoothError::PermissionDenied(err.to_string())
            }
            btleplug::Error::DeviceNotFound
            | btleplug::Error::NoSuchCharacteristic => {
                BluetoothError::NotFound(err.to_string())
            }
            btleplug::Error::NotConnected => {
                BluetoothError::FailedPrecondition(err.to_string())
            }
            btleplug::Error::NotSupported(what) => {
                BluetoothError::NotSupported(what)
            }
            btleplug::Error::TimedOut(after) => {
                BluetoothError::Timeout(format!("after {:?}", after))
            }
            _ => BluetoothError::System(err.to_string()),
        }
    }
}

impl From<CentralState> for AdapterState {
    fn from(state: CentralState) -> Self {
        match state {
            CentralState::PoweredOn => AdapterState::PoweredOn,
            CentralState::PoweredOff => AdapterState::PoweredOff,
            _ => AdapterState::Unknown,
        }
    }
}
