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

mod adapter;
mod device;

pub use adapter::BleAdapter;
pub use device::BleDevice;

use crate::common::BluetoothError;

fn unsupported() -> BluetoothError {
    BluetoothError::NotSupported(String::from(
        "no bluetooth backend, build with the `btleplug` feature",
    ))
}
