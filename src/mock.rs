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

//! In-memory adapter, permission and prompt doubles. The manager runs
//! against them exactly as against a host radio, which lets tests and
//! demos drive every transition without hardware.

mod adapter;
mod device;
mod peripheral;
mod permission;
mod world;

pub use adapter::{MockBleAdapter, MockController};
pub use device::MockDevice;
pub use peripheral::MockPeripheral;
pub use permission::{MockPermissions, ScriptedPrompt};
pub use world::WriteRecord;
