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

use std::{sync::Arc, time::Duration};

use tokio::{sync::broadcast::error::TryRecvError, time::timeout};
use uarm_link::{
    api::NoRuntimePermissions,
    config::{DEFAULT_CHARACTERISTIC_UUID, DEFAULT_SERVICE_UUID},
    mock::{MockBleAdapter, MockController, MockPeripheral, MockPermissions, ScriptedPrompt},
    AdapterState, AdapterUnavailableReason, ArmCommand, Characteristic,
    CharacteristicFlags, ConnectionError, ConnectionManager, DeviceId,
    DisconnectReason, DiscoveredDevice, EndpointConfig, ManagerConfig,
    ManagerEvent, ManagerState, Motor, MotorAction, Permission,
    RemediationChoice, Remedy, Service, WriteKind, WritePolicy,
};
use uuid::Uuid;

const ARM_ID: &str = "AA:BB:CC:DD:EE:01";
const OTHER_ARM_ID: &str = "AA:BB:CC:DD:EE:02";

const ARM_SERVICE: Uuid = Uuid::from_u128(0x0000ffe0_0000_1000_8000_00805f9b34fb);
const STATUS_CHAR: Uuid = Uuid::from_u128(0x0000ffe2_0000_1000_8000_00805f9b34fb);
const COMMAND_CHAR: Uuid = Uuid::from_u128(0x0000ffe1_0000_1000_8000_00805f9b34fb);

const WAIT: Duration = Duration::from_secs(5);

const READ_ONLY: CharacteristicFlags = CharacteristicFlags {
    readable: true,
    writable_with_response: false,
    writable_without_response: false,
};
const WRITE: CharacteristicFlags = CharacteristicFlags {
    readable: false,
    writable_with_response: true,
    writable_without_response: false,
};
const WRITE_NO_RSP: CharacteristicFlags = CharacteristicFlags {
    readable: false,
    writable_with_response: false,
    writable_without_response: true,
};

fn arm(id: &str, name: &str) -> MockPeripheral {
    MockPeripheral::new(id, Some(name)).with_service(Service::new(
        ARM_SERVICE,
        vec![
            Characteristic::new(STATUS_CHAR, READ_ONLY),
            Characteristic::new(COMMAND_CHAR, WRITE),
        ],
    ))
}

async fn ready_manager() -> (ConnectionManager<MockBleAdapter>, MockController) {
    let (adapter, controller) = MockBleAdapter::new();
    let manager = ConnectionManager::with_defaults(adapter);
    manager.initialize().await.unwrap();
    (manager, controller)
}

async fn connected_manager(
    peripheral: MockPeripheral,
) -> (ConnectionManager<MockBleAdapter>, MockController) {
    let (manager, controller) = ready_manager().await;
    let id = peripheral.id().clone();
    controller.add_peripheral(peripheral);
    controller.advertise_peripheral(&id);
    let device = manager.scan_for_arm().await.unwrap();
    manager.connect(&device).await.unwrap();
    (manager, controller)
}

async fn wait_for_state(manager: &ConnectionManager<MockBleAdapter>, wanted: ManagerState) {
    let mut states = manager.watch_state();
    timeout(WAIT, states.wait_for(|state| *state == wanted))
        .await
        .expect("state not reached in time")
        .unwrap();
}

async fn yield_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not met");
}

#[tokio::test]
async fn test_initialize_without_runtime_permissions() {
    let (manager, _controller) = ready_manager().await;
    assert_eq!(manager.state(), ManagerState::Ready);
    assert_eq!(manager.adapter_state(), AdapterState::PoweredOn);
    assert!(!manager.is_connected().await);
}

#[tokio::test]
async fn test_initialize_requests_modern_permissions() {
    let (adapter, _controller) = MockBleAdapter::new();
    let permissions = Arc::new(MockPermissions::new(Some(33)));
    let prompt = Arc::new(ScriptedPrompt::new([]));
    let manager = ConnectionManager::new(
        adapter,
        permissions.clone(),
        prompt.clone(),
        ManagerConfig::default(),
    );

    manager.initialize().await.unwrap();
    assert_eq!(
        permissions.requests(),
        vec![vec![
            Permission::BluetoothScan,
            Permission::BluetoothConnect,
            Permission::AccessFineLocation,
        ]]
    );
    assert_eq!(prompt.permission_prompts(), 0);
    assert_eq!(manager.state(), ManagerState::Ready);
}

#[tokio::test]
async fn test_initialize_requests_location_on_legacy_platform() {
    let (adapter, _controller) = MockBleAdapter::new();
    let permissions = Arc::new(MockPermissions::new(Some(29)));
    let manager = ConnectionManager::new(
        adapter,
        permissions.clone(),
        Arc::new(ScriptedPrompt::new([])),
        ManagerConfig::default(),
    );

    manager.initialize().await.unwrap();
    assert_eq!(
        permissions.requests(),
        vec![vec![
            Permission::AccessFineLocation,
            Permission::AccessCoarseLocation,
        ]]
    );
}

#[tokio::test]
async fn test_initialize_permission_denied() {
    let (adapter, _controller) = MockBleAdapter::new();
    let permissions =
        Arc::new(MockPermissions::new(Some(31)).denying(Permission::BluetoothConnect));
    let prompt = Arc::new(ScriptedPrompt::new([]));
    let manager = ConnectionManager::new(
        adapter,
        permissions,
        prompt.clone(),
        ManagerConfig::default(),
    );

    let err = manager.initialize().await.unwrap_err();
    assert_eq!(err, ConnectionError::PermissionDenied);
    assert_eq!(err.remedy(), Remedy::OpenSettings);
    assert_eq!(manager.state(), ManagerState::PermissionDenied);
    assert_eq!(prompt.permission_prompts(), 1);
    assert!(prompt.adapter_prompts().is_empty());
}

#[tokio::test]
async fn test_initialize_retries_until_bluetooth_is_on() {
    let (adapter, controller) = MockBleAdapter::new();
    controller.set_adapter_state(AdapterState::PoweredOff);
    let prompt = Arc::new(
        ScriptedPrompt::new([RemediationChoice::Retry])
            .applying_on_retry(controller.clone(), AdapterState::PoweredOn),
    );
    let manager = ConnectionManager::new(
        adapter,
        Arc::new(NoRuntimePermissions),
        prompt.clone(),
        ManagerConfig::default(),
    );

    manager.initialize().await.unwrap();
    assert_eq!(prompt.adapter_prompts(), vec![AdapterUnavailableReason::Off]);
    assert_eq!(manager.state(), ManagerState::Ready);
    assert_eq!(manager.adapter_state(), AdapterState::PoweredOn);
}

#[tokio::test]
async fn test_initialize_gives_up_when_user_cancels() {
    let (adapter, controller) = MockBleAdapter::new();
    controller.set_adapter_state(AdapterState::Unauthorized);
    let prompt = Arc::new(ScriptedPrompt::new([RemediationChoice::Cancel]));
    let manager = ConnectionManager::new(
        adapter,
        Arc::new(NoRuntimePermissions),
        prompt.clone(),
        ManagerConfig::default(),
    );

    let err = manager.initialize().await.unwrap_err();
    assert_eq!(
        err,
        ConnectionError::AdapterUnavailable(AdapterUnavailableReason::Unauthorized)
    );
    assert_eq!(err.remedy(), Remedy::OpenSettings);
    assert_eq!(
        manager.state(),
        ManagerState::AdapterUnavailable(AdapterUnavailableReason::Unauthorized)
    );
    assert_eq!(
        prompt.adapter_prompts(),
        vec![AdapterUnavailableReason::Unauthorized]
    );
}

#[tokio::test]
async fn test_adapter_recovery_returns_to_ready() {
    let (adapter, controller) = MockBleAdapter::new();
    controller.set_adapter_state(AdapterState::PoweredOff);
    let manager = ConnectionManager::with_defaults(adapter);
    assert!(manager.initialize().await.is_err());

    controller.set_adapter_state(AdapterState::PoweredOn);
    wait_for_state(&manager, ManagerState::Ready).await;
    assert_eq!(manager.adapter_state(), AdapterState::PoweredOn);
}

#[tokio::test]
async fn test_scan_matches_name_filter() {
    let (manager, controller) = ready_manager().await;
    let mut events = manager.subscribe();

    controller.advertise(DiscoveredDevice::new("11:22:33:44:55:66", None));
    controller.advertise(DiscoveredDevice::new(
        "11:22:33:44:55:67",
        Some(String::from("MyHeadphones")),
    ));
    controller.advertise(DiscoveredDevice::new(
        ARM_ID,
        Some(String::from("ESP32-Arm")),
    ));

    let device = manager.scan_for_arm().await.unwrap();
    assert_eq!(device.id(), &DeviceId::from(ARM_ID));
    assert_eq!(device.name(), Some("ESP32-Arm"));
    assert_eq!(manager.state(), ManagerState::Ready);
    assert!(!manager.is_scanning());
    assert!(!controller.is_scanning());
    assert_eq!(controller.scan_starts(), 1);
    assert_eq!(controller.scan_stops(), 1);
    assert_eq!(events.try_recv(), Ok(ManagerEvent::DeviceFound(device)));
}

#[tokio::test]
async fn test_scan_with_custom_predicate() {
    let (manager, controller) = ready_manager().await;
    controller.advertise(DiscoveredDevice::new(
        ARM_ID,
        Some(String::from("ESP32-Arm")),
    ));
    controller.advertise(
        DiscoveredDevice::new(OTHER_ARM_ID, Some(String::from("workbench")))
            .with_rssi(Some(-40)),
    );

    let device = manager
        .scan(
            |device| device.name() == Some("workbench"),
            Duration::from_secs(1),
        )
        .await
        .unwrap();
    assert_eq!(device.id(), &DeviceId::from(OTHER_ARM_ID));
    assert_eq!(device.rssi(), Some(-40));
}

#[tokio::test(start_paused = true)]
async fn test_scan_times_out() {
    let (manager, controller) = ready_manager().await;
    let mut events = manager.subscribe();
    controller.advertise(DiscoveredDevice::new(
        "11:22:33:44:55:67",
        Some(String::from("MyHeadphones")),
    ));

    let started = tokio::time::Instant::now();
    let err = manager.scan_for_arm().await.unwrap_err();
    assert_eq!(err, ConnectionError::ScanTimeout);
    assert!(started.elapsed() >= Duration::from_millis(10_000));
    assert_eq!(manager.state(), ManagerState::Ready);
    assert!(!controller.is_scanning());
    assert_eq!(controller.scan_stops(), 1);
    assert_eq!(events.try_recv(), Ok(ManagerEvent::ScanTimedOut));
}

#[tokio::test(start_paused = true)]
async fn test_scan_while_connected_keeps_connected_state() {
    let (manager, controller) = connected_manager(arm(ARM_ID, "ESP32-Arm")).await;
    assert_eq!(manager.state(), ManagerState::Connected);

    let err = manager
        .scan(|_| false, Duration::from_millis(100))
        .await
        .unwrap_err();
    assert_eq!(err, ConnectionError::ScanTimeout);
    assert_eq!(manager.state(), ManagerState::Connected);
    assert!(manager.is_connected().await);

    controller.advertise(DiscoveredDevice::new(
        OTHER_ARM_ID,
        Some(String::from("ESP32-Arm 2")),
    ));
    let found = manager.scan_for_arm().await.unwrap();
    assert_eq!(found.id(), &DeviceId::from(OTHER_ARM_ID));
    assert_eq!(manager.state(), ManagerState::Connected);
    manager.send_command("A1").await.unwrap();
}

#[tokio::test]
async fn test_scan_prompts_when_bluetooth_is_off() {
    let (adapter, controller) = MockBleAdapter::new();
    let prompt = Arc::new(
        ScriptedPrompt::new([RemediationChoice::Retry])
            .applying_on_retry(controller.clone(), AdapterState::PoweredOn),
    );
    let manager = ConnectionManager::new(
        adapter,
        Arc::new(NoRuntimePermissions),
        prompt.clone(),
        ManagerConfig::default(),
    );
    manager.initialize().await.unwrap();
    assert!(prompt.adapter_prompts().is_empty());

    controller.set_adapter_state(AdapterState::PoweredOff);
    wait_for_state(
        &manager,
        ManagerState::AdapterUnavailable(AdapterUnavailableReason::Off),
    )
    .await;
    controller.advertise(DiscoveredDevice::new(
        ARM_ID,
        Some(String::from("ESP32-Arm")),
    ));
    let device = manager.scan_for_arm().await.unwrap();
    assert_eq!(device.id(), &DeviceId::from(ARM_ID));
    assert_eq!(prompt.adapter_prompts(), vec![AdapterUnavailableReason::Off]);
    assert_eq!(manager.state(), ManagerState::Ready);
    assert_eq!(controller.scan_starts(), 1);
}

#[tokio::test]
async fn test_scan_gives_up_when_user_cancels() {
    let (adapter, controller) = MockBleAdapter::new();
    let prompt = Arc::new(ScriptedPrompt::new([RemediationChoice::Cancel]));
    let manager = ConnectionManager::new(
        adapter,
        Arc::new(NoRuntimePermissions),
        prompt.clone(),
        ManagerConfig::default(),
    );
    manager.initialize().await.unwrap();

    controller.set_adapter_state(AdapterState::Unauthorized);
    wait_for_state(
        &manager,
        ManagerState::AdapterUnavailable(AdapterUnavailableReason::Unauthorized),
    )
    .await;
    assert_eq!(
        manager.scan_for_arm().await,
        Err(ConnectionError::AdapterUnavailable(
            AdapterUnavailableReason::Unauthorized
        ))
    );
    assert_eq!(
        prompt.adapter_prompts(),
        vec![AdapterUnavailableReason::Unauthorized]
    );
    assert_eq!(controller.scan_starts(), 0);
    assert_eq!(
        manager.state(),
        ManagerState::AdapterUnavailable(AdapterUnavailableReason::Unauthorized)
    );
}

#[tokio::test]
async fn test_new_scan_cancels_running_scan() {
    let (manager, controller) = ready_manager().await;

    let first = tokio::spawn({
        let manager = manager.clone();
        async move { manager.scan_for_arm().await }
    });
    yield_until(|| controller.is_scanning()).await;

    let second = tokio::spawn({
        let manager = manager.clone();
        async move { manager.scan_for_arm().await }
    });
    assert_eq!(first.await.unwrap(), Err(ConnectionError::ScanCancelled));

    yield_until(|| controller.scan_starts() == 2).await;
    controller.advertise(DiscoveredDevice::new(
        ARM_ID,
        Some(String::from("u-arm mk2")),
    ));
    let device = second.await.unwrap().unwrap();
    assert_eq!(device.id(), &DeviceId::from(ARM_ID));
    assert_eq!(controller.overlapping_scan_starts(), 0);
    assert_eq!(controller.scan_stops(), 2);
}

#[tokio::test]
async fn test_scan_stops_when_bluetooth_turns_off() {
    let (manager, controller) = ready_manager().await;

    let scan = tokio::spawn({
        let manager = manager.clone();
        async move { manager.scan_for_arm().await }
    });
    yield_until(|| controller.is_scanning()).await;
    controller.set_adapter_state(AdapterState::PoweredOff);

    assert_eq!(
        scan.await.unwrap(),
        Err(ConnectionError::AdapterUnavailable(AdapterUnavailableReason::Off))
    );
    assert!(!controller.is_scanning());
    assert_eq!(
        manager.state(),
        ManagerState::AdapterUnavailable(AdapterUnavailableReason::Off)
    );
}

#[tokio::test]
async fn test_connect_and_send_command() {
    let (manager, controller) = ready_manager().await;
    controller.add_peripheral(arm(ARM_ID, "ESP32-Arm"));
    controller.advertise_peripheral(&DeviceId::from(ARM_ID));
    let mut events = manager.subscribe();

    let device = manager.scan_for_arm().await.unwrap();
    let info = manager.connect(&device).await.unwrap();
    assert_eq!(info.id, DeviceId::from(ARM_ID));
    assert_eq!(info.name.as_deref(), Some("ESP32-Arm"));
    assert_eq!(info.first_writable(), Some((ARM_SERVICE, COMMAND_CHAR)));
    assert_eq!(manager.state(), ManagerState::Connected);
    assert!(manager.is_connected().await);
    assert_eq!(
        manager.connected_device_name().await.as_deref(),
        Some("ESP32-Arm")
    );

    assert_eq!(events.try_recv(), Ok(ManagerEvent::DeviceFound(device)));
    assert_eq!(events.try_recv(), Ok(ManagerEvent::Connected(info)));

    manager.send_command("A1").await.unwrap();
    manager
        .send_arm_command(ArmCommand::new(Motor::B, MotorAction::Down))
        .await
        .unwrap();

    let writes = controller.writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0].text(), "A1");
    assert_eq!(writes[0].data, vec![0x41, 0x31]);
    assert_eq!(writes[0].service, ARM_SERVICE);
    assert_eq!(writes[0].characteristic, COMMAND_CHAR);
    assert_eq!(writes[0].kind, WriteKind::WithResponse);
    assert_eq!(writes[1].text(), "B3");
}

#[tokio::test]
async fn test_send_command_falls_back_in_discovery_order() {
    const REJECTING: Uuid = Uuid::from_u128(0x0a);
    const NO_RESPONSE_ONLY: Uuid = Uuid::from_u128(0x0b);
    const ACCEPTING: Uuid = Uuid::from_u128(0x0c);
    const SECOND_SERVICE: Uuid = Uuid::from_u128(0x02);

    let peripheral = MockPeripheral::new(ARM_ID, Some("ESP32-Arm"))
        .with_service(Service::new(
            ARM_SERVICE,
            vec![
                Characteristic::new(STATUS_CHAR, READ_ONLY),
                Characteristic::new(REJECTING, WRITE),
                Characteristic::new(NO_RESPONSE_ONLY, WRITE_NO_RSP),
            ],
        ))
        .with_service(Service::new(
            SECOND_SERVICE,
            vec![Characteristic::new(ACCEPTING, WRITE)],
        ))
        .rejecting(REJECTING);
    let (manager, controller) = connected_manager(peripheral).await;

    manager.send_command("A2").await.unwrap();

    let tried: Vec<Uuid> = controller
        .write_attempts()
        .iter()
        .map(|write| write.characteristic)
        .collect();
    assert_eq!(tried, vec![REJECTING, NO_RESPONSE_ONLY, ACCEPTING]);
    let writes = controller.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].service, SECOND_SERVICE);
    assert_eq!(writes[0].characteristic, ACCEPTING);
}

#[tokio::test]
async fn test_match_properties_policy_writes_without_response() {
    let (adapter, controller) = MockBleAdapter::new();
    let config = ManagerConfig {
        write_policy: WritePolicy::MatchProperties,
        ..ManagerConfig::default()
    };
    let manager = ConnectionManager::new(
        adapter,
        Arc::new(NoRuntimePermissions),
        Arc::new(ScriptedPrompt::new([])),
        config,
    );
    manager.initialize().await.unwrap();

    controller.add_peripheral(MockPeripheral::new(ARM_ID, Some("ESP32-Arm")).with_service(
        Service::new(
            ARM_SERVICE,
            vec![Characteristic::new(COMMAND_CHAR, WRITE_NO_RSP)],
        ),
    ));
    let device = DiscoveredDevice::new(ARM_ID, Some(String::from("ESP32-Arm")));
    manager.connect(&device).await.unwrap();

    manager.send_command("B1").await.unwrap();
    let writes = controller.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].kind, WriteKind::WithoutResponse);
}

#[tokio::test]
async fn test_send_command_uses_default_endpoint() {
    let peripheral = MockPeripheral::new(ARM_ID, Some("ESP32-Arm"))
        .with_service(Service::new(
            ARM_SERVICE,
            vec![Characteristic::new(STATUS_CHAR, READ_ONLY)],
        ))
        .with_hidden_endpoint(DEFAULT_SERVICE_UUID, DEFAULT_CHARACTERISTIC_UUID);
    let (manager, controller) = connected_manager(peripheral).await;

    manager.send_command("A3").await.unwrap();
    let writes = controller.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].service, DEFAULT_SERVICE_UUID);
    assert_eq!(writes[0].characteristic, DEFAULT_CHARACTERISTIC_UUID);
    assert_eq!(writes[0].kind, WriteKind::WithResponse);
}

#[tokio::test]
async fn test_endpoint_configuration_applies_to_next_command() {
    let custom = EndpointConfig::parse(
        "0000abcd-0000-1000-8000-00805f9b34fb",
        " 0000abce-0000-1000-8000-00805F9B34FB ",
    )
    .unwrap();
    let peripheral = MockPeripheral::new(ARM_ID, Some("ESP32-Arm"))
        .with_hidden_endpoint(custom.service, custom.characteristic);
    let (manager, controller) = connected_manager(peripheral).await;

    assert_eq!(manager.endpoint_configuration(), EndpointConfig::default());
    manager.set_endpoint_configuration(custom);
    assert_eq!(manager.endpoint_configuration(), custom);

    manager.send_command("B2").await.unwrap();
    manager.send_command("B1").await.unwrap();
    let writes = controller.writes();
    assert_eq!(writes.len(), 2);
    assert!(writes
        .iter()
        .all(|write| write.characteristic == custom.characteristic));
}

#[tokio::test]
async fn test_send_command_with_no_writable_target() {
    let peripheral = MockPeripheral::new(ARM_ID, Some("ESP32-Arm")).with_service(
        Service::new(ARM_SERVICE, vec![Characteristic::new(STATUS_CHAR, READ_ONLY)]),
    );
    let (manager, controller) = connected_manager(peripheral).await;

    let err = manager.send_command("A1").await.unwrap_err();
    assert_eq!(
        err,
        ConnectionError::WriteFailed(String::from("no writable characteristic found"))
    );
    assert_eq!(err.remedy(), Remedy::Retry);
    assert!(controller.writes().is_empty());
    assert_eq!(controller.write_attempts().len(), 1);
    assert!(manager.is_connected().await);
}

#[tokio::test]
async fn test_send_command_requires_connection() {
    let (manager, controller) = ready_manager().await;
    assert_eq!(
        manager.send_command("A1").await,
        Err(ConnectionError::NotConnected)
    );
    assert!(controller.write_attempts().is_empty());
}

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let (manager, controller) = connected_manager(arm(ARM_ID, "ESP32-Arm")).await;
    let mut events = manager.subscribe();

    manager.disconnect().await.unwrap();
    assert_eq!(manager.state(), ManagerState::Ready);
    assert!(!manager.is_connected().await);
    assert!(!controller.is_connected(&DeviceId::from(ARM_ID)));

    manager.disconnect().await.unwrap();
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(
        events.try_recv(),
        Ok(ManagerEvent::Disconnected {
            device: DeviceId::from(ARM_ID),
            reason: DisconnectReason::Requested,
        })
    );
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    assert_eq!(manager.device_info().await, None);
}

#[tokio::test]
async fn test_disconnect_failure_keeps_session() {
    let (manager, _controller) =
        connected_manager(arm(ARM_ID, "ESP32-Arm").failing_disconnect()).await;

    assert!(matches!(
        manager.disconnect().await,
        Err(ConnectionError::Transport(_))
    ));
    assert_eq!(manager.state(), ManagerState::Connected);
    assert!(manager.is_connected().await);
}

#[tokio::test]
async fn test_unsolicited_disconnect_clears_session() {
    let (manager, controller) = connected_manager(arm(ARM_ID, "ESP32-Arm")).await;
    let mut events = manager.subscribe();

    controller.drop_connection(&DeviceId::from(ARM_ID));
    let event = timeout(WAIT, events.recv()).await.unwrap().unwrap();
    assert_eq!(
        event,
        ManagerEvent::Disconnected {
            device: DeviceId::from(ARM_ID),
            reason: DisconnectReason::Unsolicited,
        }
    );
    assert_eq!(manager.state(), ManagerState::Ready);
    assert_eq!(
        manager.send_command("A1").await,
        Err(ConnectionError::NotConnected)
    );

    // A second notification for the same link is ignored.
    controller.drop_connection(&DeviceId::from(ARM_ID));
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
}

#[tokio::test]
async fn test_power_off_clears_session() {
    let (manager, controller) = connected_manager(arm(ARM_ID, "ESP32-Arm")).await;
    let mut events = manager.subscribe();

    controller.set_adapter_state(AdapterState::PoweredOff);
    assert_eq!(
        timeout(WAIT, events.recv()).await.unwrap().unwrap(),
        ManagerEvent::AdapterStateChanged(AdapterState::PoweredOff)
    );
    assert_eq!(
        timeout(WAIT, events.recv()).await.unwrap().unwrap(),
        ManagerEvent::Disconnected {
            device: DeviceId::from(ARM_ID),
            reason: DisconnectReason::AdapterPoweredOff,
        }
    );
    assert!(!manager.is_connected().await);
    assert_eq!(
        manager.send_command("A1").await,
        Err(ConnectionError::NotConnected)
    );
    assert_eq!(
        manager.scan_for_arm().await,
        Err(ConnectionError::AdapterUnavailable(AdapterUnavailableReason::Off))
    );

    controller.set_adapter_state(AdapterState::PoweredOn);
    wait_for_state(&manager, ManagerState::Ready).await;
}

#[tokio::test]
async fn test_polled_power_off_clears_session() {
    let (manager, controller) = connected_manager(arm(ARM_ID, "ESP32-Arm")).await;

    // Scan reads the radio before the monitor task gets to run.
    controller.set_adapter_state(AdapterState::PoweredOff);
    assert_eq!(
        manager.scan_for_arm().await,
        Err(ConnectionError::AdapterUnavailable(AdapterUnavailableReason::Off))
    );
    assert!(!manager.is_connected().await);
    assert_eq!(
        manager.send_command("A1").await,
        Err(ConnectionError::NotConnected)
    );

    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(!manager.is_connected().await);
    assert_eq!(
        manager.state(),
        ManagerState::AdapterUnavailable(AdapterUnavailableReason::Off)
    );
}

#[tokio::test]
async fn test_any_non_powered_state_clears_session() {
    let (manager, controller) = ready_manager().await;
    controller.add_peripheral(arm(ARM_ID, "ESP32-Arm"));
    let device = DiscoveredDevice::new(ARM_ID, Some(String::from("ESP32-Arm")));

    for state in [
        AdapterState::Resetting,
        AdapterState::Unauthorized,
        AdapterState::Unknown,
    ] {
        manager.connect(&device).await.unwrap();
        assert_eq!(manager.state(), ManagerState::Connected);
        let mut events = manager.subscribe();

        controller.set_adapter_state(state);
        loop {
            match timeout(WAIT, events.recv()).await.unwrap().unwrap() {
                ManagerEvent::Disconnected { device, reason } => {
                    assert_eq!(device, DeviceId::from(ARM_ID));
                    assert_eq!(reason, DisconnectReason::AdapterPoweredOff);
                    break;
                }
                _ => continue,
            }
        }
        assert!(!manager.is_connected().await, "{:?}", state);
        assert_eq!(
            manager.send_command("A1").await,
            Err(ConnectionError::NotConnected)
        );

        controller.set_adapter_state(AdapterState::PoweredOn);
        yield_until(|| manager.adapter_state() == AdapterState::PoweredOn).await;
        assert_eq!(manager.state(), ManagerState::Ready);
    }
}

#[tokio::test]
async fn test_connect_failure_installs_nothing() {
    let (manager, controller) = ready_manager().await;
    controller.add_peripheral(arm(ARM_ID, "ESP32-Arm").failing_connect());
    let device = DiscoveredDevice::new(ARM_ID, Some(String::from("ESP32-Arm")));

    assert!(matches!(
        manager.connect(&device).await,
        Err(ConnectionError::ConnectFailed(_))
    ));
    assert_eq!(manager.state(), ManagerState::Ready);
    assert!(!manager.is_connected().await);
}

#[tokio::test]
async fn test_discovery_failure_closes_link() {
    let (manager, controller) = ready_manager().await;
    controller.add_peripheral(arm(ARM_ID, "ESP32-Arm").failing_discovery());
    let device = DiscoveredDevice::new(ARM_ID, Some(String::from("ESP32-Arm")));

    assert!(matches!(
        manager.connect(&device).await,
        Err(ConnectionError::DiscoveryFailed(_))
    ));
    assert_eq!(manager.state(), ManagerState::Ready);
    assert!(!manager.is_connected().await);
    assert!(!controller.is_connected(&DeviceId::from(ARM_ID)));
}

#[tokio::test]
async fn test_failed_connect_keeps_existing_session() {
    let (manager, controller) = connected_manager(arm(ARM_ID, "ESP32-Arm")).await;
    controller.add_peripheral(arm(OTHER_ARM_ID, "ESP32-Spare").failing_connect());
    let spare = DiscoveredDevice::new(OTHER_ARM_ID, Some(String::from("ESP32-Spare")));

    assert!(manager.connect(&spare).await.is_err());
    assert_eq!(manager.state(), ManagerState::Connected);
    assert_eq!(
        manager.connected_device_name().await.as_deref(),
        Some("ESP32-Arm")
    );
}

#[tokio::test]
async fn test_connect_replaces_session() {
    let (manager, controller) = connected_manager(arm(ARM_ID, "ESP32-Arm")).await;
    controller.add_peripheral(arm(OTHER_ARM_ID, "ESP32-Spare"));
    let mut events = manager.subscribe();

    let spare = DiscoveredDevice::new(OTHER_ARM_ID, Some(String::from("ESP32-Spare")));
    let info = manager.connect(&spare).await.unwrap();
    assert!(!controller.is_connected(&DeviceId::from(ARM_ID)));
    assert!(controller.is_connected(&DeviceId::from(OTHER_ARM_ID)));
    assert_eq!(
        events.try_recv(),
        Ok(ManagerEvent::Disconnected {
            device: DeviceId::from(ARM_ID),
            reason: DisconnectReason::Replaced,
        })
    );
    assert_eq!(events.try_recv(), Ok(ManagerEvent::Connected(info)));

    // The old link going down again does not touch the new session.
    controller.drop_connection(&DeviceId::from(ARM_ID));
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(manager.state(), ManagerState::Connected);
    assert_eq!(
        manager.connected_device_name().await.as_deref(),
        Some("ESP32-Spare")
    );
}

#[tokio::test]
async fn test_device_info_snapshot() {
    let (manager, _controller) = connected_manager(arm(ARM_ID, "ESP32-Arm")).await;

    let info = manager.device_info().await.unwrap();
    assert_eq!(info.id, DeviceId::from(ARM_ID));
    assert_eq!(info.services.len(), 1);
    assert_eq!(info.services[0].characteristics.len(), 2);

    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["id"], ARM_ID);
    assert_eq!(
        json["services"][0]["characteristics"][1]["isWritableWithResponse"],
        true
    );
}

#[tokio::test]
async fn test_teardown_is_idempotent() {
    let (manager, controller) = connected_manager(arm(ARM_ID, "ESP32-Arm")).await;
    let mut events = manager.subscribe();

    manager.teardown().await;
    assert_eq!(manager.state(), ManagerState::Uninitialized);
    assert!(!manager.is_connected().await);
    assert!(!controller.is_connected(&DeviceId::from(ARM_ID)));
    assert_eq!(
        events.try_recv(),
        Ok(ManagerEvent::Disconnected {
            device: DeviceId::from(ARM_ID),
            reason: DisconnectReason::TornDown,
        })
    );

    manager.teardown().await;
    assert_eq!(manager.state(), ManagerState::Uninitialized);
    assert_eq!(
        manager.scan_for_arm().await,
        Err(ConnectionError::AdapterReleased)
    );
    assert_eq!(
        manager.initialize().await,
        Err(ConnectionError::AdapterReleased)
    );
    assert_eq!(manager.state(), ManagerState::Uninitialized);

    // The adapter monitor is gone too.
    controller.set_adapter_state(AdapterState::PoweredOff);
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
}
