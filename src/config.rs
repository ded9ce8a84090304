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

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::common::{Characteristic, NameFilter, WriteKind};

/// Command service exposed by the reference ESP32 arm firmware.
pub const DEFAULT_SERVICE_UUID: Uuid =
    Uuid::from_u128(0x12345678_1234_1234_1234_123456789abc);

/// Command characteristic exposed by the reference ESP32 arm firmware.
pub const DEFAULT_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x87654321_4321_4321_4321_cba987654321);

pub const DEFAULT_SCAN_TIMEOUT_MS: u64 = 10_000;

const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Configuration error type.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// The string is not in 8-4-4-4-12 hex form.
    #[error("invalid UUID: {0}")]
    InvalidUuid(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Checks the canonical hyphenated UUID shape, ignoring case. Braced, URN and
/// simple forms are rejected even though `Uuid::parse_str` would take them.
pub fn is_uuid_shape(text: &str) -> bool {
    const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

    let mut groups = text.split('-');
    let shape_ok = GROUPS.iter().all(|len| {
        groups.next().is_some_and(|group| {
            group.len() == *len
                && group.chars().all(|c| c.is_ascii_hexdigit())
        })
    });
    shape_ok && groups.next().is_none()
}

/// Fallback write target, used when discovery yields no characteristic that
/// accepts a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub service: Uuid,
    pub characteristic: Uuid,
}

impl EndpointConfig {
    pub fn new(service: Uuid, characteristic: Uuid) -> Self {
        EndpointConfig {
            service,
            characteristic,
        }
    }

    /// Builds an endpoint from user-entered strings.
    pub fn parse(service: &str, characteristic: &str) -> Result<Self, ConfigError> {
        Ok(EndpointConfig {
            service: parse_uuid(service)?,
            characteristic: parse_uuid(characteristic)?,
        })
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        EndpointConfig::new(DEFAULT_SERVICE_UUID, DEFAULT_CHARACTERISTIC_UUID)
    }
}

fn parse_uuid(text: &str) -> Result<Uuid, ConfigError> {
    let text = text.trim();
    if !is_uuid_shape(text) {
        return Err(ConfigError::InvalidUuid(String::from(text)));
    }
    Uuid::parse_str(text).map_err(|_| ConfigError::InvalidUuid(String::from(text)))
}

/// Which GATT write to issue against a discovered characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Response-confirmed write for every candidate, including those that
    /// only advertise write-without-response.
    #[default]
    AlwaysWithResponse,
    /// Response-confirmed write when the characteristic supports it,
    /// unconfirmed write otherwise.
    MatchProperties,
}

impl WritePolicy {
    pub fn write_kind(&self, characteristic: &Characteristic) -> WriteKind {
        match self {
            WritePolicy::AlwaysWithResponse => WriteKind::WithResponse,
            WritePolicy::MatchProperties => {
                if characteristic.flags.writable_with_response {
                    WriteKind::WithResponse
                } else {
                    WriteKind::WithoutResponse
                }
            }
        }
    }
}

/// Tunables for `ConnectionManager`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    pub scan_timeout_ms: u64,
    pub name_filter: NameFilter,
    pub endpoint: EndpointConfig,
    pub write_policy: WritePolicy,
    /// Buffer of the `ManagerEvent` broadcast channel. Slow subscribers that
    /// fall further behind than this miss events.
    pub event_capacity: usize,
}

impl ManagerConfig {
    /// Parses a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ManagerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan_timeout_ms == 0 {
            return Err(ConfigError::Invalid(String::from(
                "scan_timeout_ms must be greater than zero",
            )));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid(String::from(
                "event_capacity must be greater than zero",
            )));
        }
        Ok(())
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_millis(self.scan_timeout_ms)
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        ManagerConfig {
            scan_timeout_ms: DEFAULT_SCAN_TIMEOUT_MS,
            name_filter: NameFilter::default(),
            endpoint: EndpointConfig::default(),
            write_policy: WritePolicy::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}
