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

use std::fmt;

use super::Remedy;

/// Power state of the local Bluetooth radio, as reported by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AdapterState {
    #[default]
    Unknown,
    Resetting,
    Unsupported,
    Unauthorized,
    PoweredOff,
    PoweredOn,
}

impl AdapterState {
    pub fn is_powered_on(&self) -> bool {
        *self == AdapterState::PoweredOn
    }

    /// Why the radio can't be used, or `None` if it is powered on.
    pub fn unavailable_reason(&self) -> Option<AdapterUnavailableReason> {
        match self {
            AdapterState::PoweredOn => None,
            AdapterState::PoweredOff => Some(AdapterUnavailableReason::Off),
            AdapterState::Unauthorized => {
                Some(AdapterUnavailableReason::Unauthorized)
            }
            AdapterState::Unsupported => {
                Some(AdapterUnavailableReason::Unsupported)
            }
            AdapterState::Resetting => Some(AdapterUnavailableReason::NotReady),
            AdapterState::Unknown => Some(AdapterUnavailableReason::Unknown),
        }
    }
}

/// Sub-reason attached to `ConnectionError::AdapterUnavailable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterUnavailableReason {
    Off,
    Unauthorized,
    Unsupported,
    /// Transient, e.g. the radio is resetting.
    NotReady,
    Unknown,
}

impl AdapterUnavailableReason {
    /// Short heading for a remediation prompt.
    pub fn title(&self) -> &'static str {
        match self {
            AdapterUnavailableReason::Off => "Enable Bluetooth",
            AdapterUnavailableReason::Unauthorized => {
                "Bluetooth Permission Required"
            }
            AdapterUnavailableReason::Unsupported => "Bluetooth Not Supported",
            AdapterUnavailableReason::NotReady => "Bluetooth Required",
            AdapterUnavailableReason::Unknown => "Bluetooth Issue",
        }
    }

    /// Body text for a remediation prompt.
    pub fn message(&self) -> &'static str {
        match self {
            AdapterUnavailableReason::Off => {
                "Bluetooth is turned off. Please enable Bluetooth to connect to your U-ARM device."
            }
            AdapterUnavailableReason::Unauthorized => {
                "Bluetooth permission is not granted. Please allow Bluetooth access in Settings."
            }
            AdapterUnavailableReason::Unsupported => {
                "Bluetooth Low Energy is not supported on this device."
            }
            AdapterUnavailableReason::NotReady => {
                "Bluetooth is not ready (State: Resetting). Please ensure Bluetooth is enabled."
            }
            AdapterUnavailableReason::Unknown => {
                "Bluetooth state is unknown. Please check your device settings."
            }
        }
    }

    pub fn remedy(&self) -> Remedy {
        match self {
            AdapterUnavailableReason::Off => Remedy::EnableBluetooth,
            AdapterUnavailableReason::Unauthorized => Remedy::OpenSettings,
            AdapterUnavailableReason::Unsupported => Remedy::None,
            AdapterUnavailableReason::NotReady => Remedy::Retry,
            AdapterUnavailableReason::Unknown => Remedy::Retry,
        }
    }
}

impl fmt::Display for AdapterUnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            AdapterUnavailableReason::Off => "off",
            AdapterUnavailableReason::Unauthorized => "unauthorized",
            AdapterUnavailableReason::Unsupported => "unsupported",
            AdapterUnavailableReason::NotReady => "not ready",
            AdapterUnavailableReason::Unknown => "unknown",
        };
        f.write_str(reason)
    }
}
