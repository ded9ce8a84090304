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

use thiserror::Error;

use super::AdapterUnavailableReason;

/// Transport-level error type, produced by platform adapters and devices.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Clone)]
pub enum BluetoothError {
    /// Indicates that the operation was rejected because the system is not in
    /// a state required for the operation's execution.
    /// E.g. the user calls `stop_scan()` or polls the advertisement stream
    /// before calling `start_scan()`.
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),
    /// Reported when the user calls an operation that is supported by their
    /// Operating System, but is not supported by their device, or when the
    /// crate was built without a platform backend.
    #[error("bluetooth operation not supported by system: {0}")]
    NotSupported(String),
    /// A peripheral, service or characteristic could not be located.
    #[error("not found: {0}")]
    NotFound(String),
    /// The OS refused access to the radio.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// The OS gave up waiting for the peripheral.
    #[error("timed out: {0}")]
    Timeout(String),
    /// Wrapper around OS-level errors, e.g. `btleplug::Error`.
    #[error("bluetooth system-level error: {0}")]
    System(String),
    /// Reported when a bug occurs inside the library. Whenever a seemingly
    /// impossible error condition arises where you could call `expect()`,
    /// return this error instead.
    #[error("internal error: {0}")]
    Internal(String),
}

/// What the user can do about a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remedy {
    /// Grant access in the system settings.
    OpenSettings,
    /// Turn the radio on, then try again.
    EnableBluetooth,
    /// Nothing to fix locally; the operation may succeed if repeated.
    Retry,
    /// Nothing the user can do.
    None,
}

/// Errors surfaced by `ConnectionManager` operations.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Clone)]
pub enum ConnectionError {
    #[error("bluetooth permission denied")]
    PermissionDenied,
    #[error("bluetooth adapter unavailable: {0}")]
    AdapterUnavailable(AdapterUnavailableReason),
    #[error("no matching device found before the scan timed out")]
    ScanTimeout,
    /// The scan was superseded by a newer scan, a connect or a teardown.
    #[error("scan cancelled")]
    ScanCancelled,
    #[error("connect failed: {0}")]
    ConnectFailed(String),
    #[error("service discovery failed: {0}")]
    DiscoveryFailed(String),
    #[error("write failed: {0}")]
    WriteFailed(String),
    #[error("no device connected")]
    NotConnected,
    /// `teardown()` already released the adapter.
    #[error("bluetooth adapter has been released")]
    AdapterReleased,
    #[error(transparent)]
    Transport(#[from] BluetoothError),
}

impl ConnectionError {
    /// The remedy to offer the user alongside this error.
    pub fn remedy(&self) -> Remedy {
        match self {
            ConnectionError::PermissionDenied => Remedy::OpenSettings,
            ConnectionError::AdapterUnavailable(reason) => reason.remedy(),
            ConnectionError::ScanTimeout
            | ConnectionError::ConnectFailed(_)
            | ConnectionError::DiscoveryFailed(_)
            | ConnectionError::WriteFailed(_)
            | ConnectionError::Transport(_) => Remedy::Retry,
            ConnectionError::ScanCancelled
            | ConnectionError::NotConnected
            | ConnectionError::AdapterReleased => Remedy::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_display() {
        let err = ConnectionError::WriteFailed(String::from(
            "no writable characteristic found",
        ));
        assert_eq!(
            err.to_string(),
            "write failed: no writable characteristic found"
        );

        let err = ConnectionError::AdapterUnavailable(
            AdapterUnavailableReason::Off,
        );
        assert_eq!(err.to_string(), "bluetooth adapter unavailable: off");

        let err = ConnectionError::from(BluetoothError::NotFound(
            String::from("peripheral"),
        ));
        assert_eq!(err.to_string(), "not found: peripheral");
    }

    #[test]
    fn test_remedy() {
        assert_eq!(
            ConnectionError::PermissionDenied.remedy(),
            Remedy::OpenSettings
        );
        assert_eq!(
            ConnectionError::AdapterUnavailable(AdapterUnavailableReason::Off)
                .remedy(),
            Remedy::EnableBluetooth
        );
        assert_eq!(
            ConnectionError::AdapterUnavailable(
                AdapterUnavailableReason::Unsupported
            )
            .remedy(),
            Remedy::None
        );
        assert_eq!(ConnectionError::ScanTimeout.remedy(), Remedy::Retry);
        assert_eq!(ConnectionError::NotConnected.remedy(), Remedy::None);
    }
}
