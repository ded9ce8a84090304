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

//! Single-peripheral BLE session management: permission and adapter checks,
//! name-filtered scanning, connect with discovery, command writes with
//! characteristic fallback, and cleanup on link or radio loss.

mod session;
mod state;

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex as StdMutex, MutexGuard, PoisonError, RwLock, Weak,
    },
    time::Duration,
};

use futures::{stream::BoxStream, StreamExt};
use tokio::{
    sync::{broadcast, watch, Mutex},
    task::JoinHandle,
};
use tracing::{debug, error, info, trace, warn};

pub use state::{DisconnectReason, ManagerEvent, ManagerState};

use self::session::Session;
use crate::{
    api::{
        BleAdapter, BleDevice, DeclineRemediation, NoRuntimePermissions,
        PermissionProvider, RemediationPrompt,
    },
    command::ArmCommand,
    common::{
        writable_characteristics, AdapterState, AdapterUnavailableReason,
        BluetoothError, ConnectionError, DeviceInfo, DiscoveredDevice,
        Permission, RemediationChoice, WriteKind,
    },
    config::{EndpointConfig, ManagerConfig},
};

/// How a scan loop ended.
enum ScanOutcome {
    Found(DiscoveredDevice),
    TimedOut,
    Cancelled,
    PowerLost(AdapterUnavailableReason),
    Failed(BluetoothError),
}

struct Inner<A: BleAdapter> {
    /// Held for the whole duration of a scan, so a connect or a newer scan
    /// waits here after cancelling it.
    adapter: Mutex<Option<A>>,
    /// Whoever holds this lock is the only writer of the session.
    session: Mutex<Option<Session<A::Device>>>,
    endpoint: RwLock<EndpointConfig>,
    config: ManagerConfig,
    permissions: Arc<dyn PermissionProvider>,
    prompt: Arc<dyn RemediationPrompt>,
    state: watch::Sender<ManagerState>,
    adapter_state: watch::Sender<AdapterState>,
    events: broadcast::Sender<ManagerEvent>,
    /// Bumped to cancel the running scan.
    scan_epoch: watch::Sender<u64>,
    scanning: AtomicBool,
    next_session_id: AtomicU64,
    monitor: StdMutex<Option<JoinHandle<()>>>,
}

fn lock_std<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<A: BleAdapter> Inner<A> {
    fn current_state(&self) -> ManagerState {
        *self.state.borrow()
    }

    fn set_state(&self, next: ManagerState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            debug!("Connection manager state {:?} -> {:?}", previous, next);
        }
    }

    fn publish(&self, event: ManagerEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    fn cancel_scan(&self) -> u64 {
        let mut epoch = 0;
        self.scan_epoch.send_modify(|current| {
            *current += 1;
            epoch = *current;
        });
        epoch
    }

    fn endpoint(&self) -> EndpointConfig {
        *self.endpoint.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ready or Connected, depending on whether a session survived.
    async fn settle(&self) {
        let connected = self.session.lock().await.is_some();
        self.set_state(if connected {
            ManagerState::Connected
        } else {
            ManagerState::Ready
        });
    }

    /// Applies an adapter state, whether the monitor delivered it or an
    /// operation polled it. Only changes are published, but a session is
    /// dropped on every non-PoweredOn state, repeated or not.
    async fn on_adapter_state(&self, state: AdapterState) {
        let previous = self.adapter_state.send_replace(state);
        let changed = previous != state;
        if changed {
            info!("Bluetooth state changed to: {:?}", state);
        }

        match state.unavailable_reason() {
            Some(reason) => {
                let mut slot = self.session.lock().await;
                let lost = slot.take();
                match &lost {
                    // A running scan notices by itself and reports the reason.
                    Some(_) if self.current_state() == ManagerState::Scanning => {}
                    Some(_) => self.set_state(ManagerState::Ready),
                    None if self.current_state() == ManagerState::Ready => {
                        self.set_state(ManagerState::AdapterUnavailable(reason));
                    }
                    None => {}
                }
                if changed {
                    self.publish(ManagerEvent::AdapterStateChanged(state));
                }
                if let Some(session) = &lost {
                    let device = session.device.id();
                    warn!("Bluetooth is {}, dropping device {}", reason, device);
                    self.publish(ManagerEvent::Disconnected {
                        device,
                        reason: DisconnectReason::AdapterPoweredOff,
                    });
                }
                drop(slot);
                drop(lost);
            }
            None => {
                if matches!(
                    self.current_state(),
                    ManagerState::AdapterUnavailable(_)
                ) {
                    self.set_state(ManagerState::Ready);
                }
                if changed {
                    self.publish(ManagerEvent::AdapterStateChanged(state));
                }
            }
        }
    }

    async fn on_device_lost(&self, session_id: u64) {
        let mut slot = self.session.lock().await;
        if slot.as_ref().map(|session| session.id) != Some(session_id) {
            debug!("Ignoring disconnect of stale session {}", session_id);
            return;
        }
        let Some(session) = slot.take() else {
            return;
        };
        let device = session.device.id();
        info!("Device disconnected: {}", device);
        self.set_state(ManagerState::Ready);
        self.publish(ManagerEvent::Disconnected {
            device,
            reason: DisconnectReason::Unsolicited,
        });
        drop(slot);
        // Aborts the watcher running this very call; nothing awaits past here.
        drop(session);
    }
}

impl<A: BleAdapter> Drop for Inner<A> {
    fn drop(&mut self) {
        if let Some(monitor) = lock_std(&self.monitor).take() {
            monitor.abort();
        }
    }
}

async fn monitor_adapter<A: BleAdapter>(
    inner: Weak<Inner<A>>,
    mut changes: BoxStream<'static, AdapterState>,
) {
    while let Some(state) = changes.next().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        inner.on_adapter_state(state).await;
    }
    debug!("Adapter state stream ended.");
}

async fn watch_device<A: BleAdapter>(
    inner: Weak<Inner<A>>,
    session_id: u64,
    mut disconnections: BoxStream<'static, ()>,
) {
    if disconnections.next().await.is_none() {
        debug!("Disconnect notifications for session {} ended.", session_id);
        return;
    }
    if let Some(inner) = inner.upgrade() {
        inner.on_device_lost(session_id).await;
    }
}

async fn close_quietly<D: BleDevice>(device: &D) {
    if let Err(err) = device.disconnect().await {
        warn!("Failed to disconnect {}: {}", device.id(), err);
    }
}

/// Owns at most one BLE session to an arm controller.
///
/// Cloning is cheap and yields another handle to the same manager. Every
/// async method must run inside a tokio runtime, since the manager spawns
/// tasks to follow adapter and link events.
pub struct ConnectionManager<A: BleAdapter> {
    inner: Arc<Inner<A>>,
}

impl<A: BleAdapter> Clone for ConnectionManager<A> {
    fn clone(&self) -> Self {
        ConnectionManager {
            inner: self.inner.clone(),
        }
    }
}

impl<A: BleAdapter> ConnectionManager<A> {
    pub fn new(
        adapter: A,
        permissions: Arc<dyn PermissionProvider>,
        prompt: Arc<dyn RemediationPrompt>,
        config: ManagerConfig,
    ) -> Self {
        let (state, _) = watch::channel(ManagerState::Uninitialized);
        let (adapter_state, _) = watch::channel(AdapterState::Unknown);
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let (scan_epoch, _) = watch::channel(0);

        ConnectionManager {
            inner: Arc::new(Inner {
                adapter: Mutex::new(Some(adapter)),
                session: Mutex::new(None),
                endpoint: RwLock::new(config.endpoint),
                config,
                permissions,
                prompt,
                state,
                adapter_state,
                events,
                scan_epoch,
                scanning: AtomicBool::new(false),
                next_session_id: AtomicU64::new(1),
                monitor: StdMutex::new(None),
            }),
        }
    }

    /// Manager for hosts without runtime permissions and without a user to
    /// prompt.
    pub fn with_defaults(adapter: A) -> Self {
        Self::new(
            adapter,
            Arc::new(NoRuntimePermissions),
            Arc::new(DeclineRemediation),
            ManagerConfig::default(),
        )
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    pub fn state(&self) -> ManagerState {
        self.inner.current_state()
    }

    pub fn watch_state(&self) -> watch::Receiver<ManagerState> {
        self.inner.state.subscribe()
    }

    /// Subscribe to manager events. Drop the receiver to unsubscribe.
    pub fn subscribe(&self) -> broadcast::Receiver<ManagerEvent> {
        self.inner.events.subscribe()
    }

    /// Last adapter state the manager observed.
    pub fn adapter_state(&self) -> AdapterState {
        *self.inner.adapter_state.borrow()
    }

    pub fn is_scanning(&self) -> bool {
        self.inner.scanning.load(Ordering::SeqCst)
    }

    pub async fn is_connected(&self) -> bool {
        self.inner.session.lock().await.is_some()
    }

    pub async fn connected_device_name(&self) -> Option<String> {
        self.inner
            .session
            .lock()
            .await
            .as_ref()
            .and_then(|session| session.device.name())
    }

    pub fn endpoint_configuration(&self) -> EndpointConfig {
        self.inner.endpoint()
    }

    /// Replace the fallback write target. Takes effect on the next
    /// `send_command`.
    pub fn set_endpoint_configuration(&self, endpoint: EndpointConfig) {
        info!(
            "Fallback endpoint set to service {} characteristic {}",
            endpoint.service, endpoint.characteristic
        );
        *self
            .inner
            .endpoint
            .write()
            .unwrap_or_else(PoisonError::into_inner) = endpoint;
    }

    /// Obtain permissions and a powered-on adapter, prompting the user where
    /// needed. May wait on the user indefinitely; drop the future to give
    /// up.
    pub async fn initialize(&self) -> Result<(), ConnectionError> {
        info!("Initializing connection manager.");
        self.inner.set_state(ManagerState::Initializing);

        let mut guard = InitGuard {
            inner: &self.inner,
            armed: true,
        };
        let result = self.run_initialize().await;
        guard.armed = false;

        if let Err(err) = &result {
            error!("BLE initialization error: {}", err);
            if matches!(
                err,
                ConnectionError::Transport(_) | ConnectionError::AdapterReleased
            ) {
                self.inner.set_state(ManagerState::Uninitialized);
            }
        }
        result
    }

    async fn run_initialize(&self) -> Result<(), ConnectionError> {
        self.request_permissions().await?;

        {
            let adapter = self.inner.adapter.lock().await;
            let adapter =
                adapter.as_ref().ok_or(ConnectionError::AdapterReleased)?;
            self.ensure_monitor(adapter).await?;
        }
        let state = self.poll_adapter_state().await?;
        info!("Bluetooth state: {:?}", state);
        self.await_powered_on(state).await?;

        self.inner.set_state(ManagerState::Ready);
        Ok(())
    }

    /// Reads the radio state and feeds it through the same handler as
    /// monitor updates.
    async fn poll_adapter_state(&self) -> Result<AdapterState, ConnectionError> {
        let state = {
            let adapter = self.inner.adapter.lock().await;
            let adapter =
                adapter.as_ref().ok_or(ConnectionError::AdapterReleased)?;
            adapter.state().await?
        };
        self.inner.on_adapter_state(state).await;
        Ok(state)
    }

    /// Offers remediation until the radio reports PoweredOn or the user
    /// gives up.
    async fn await_powered_on(
        &self,
        mut state: AdapterState,
    ) -> Result<(), ConnectionError> {
        while let Some(reason) = state.unavailable_reason() {
            match self.inner.prompt.adapter_unavailable(reason).await {
                RemediationChoice::Retry => {
                    state = self.poll_adapter_state().await?;
                    debug!("Bluetooth state after retry: {:?}", state);
                }
                choice => {
                    info!("Bluetooth remediation ended with {:?}", choice);
                    self.inner
                        .set_state(ManagerState::AdapterUnavailable(reason));
                    return Err(ConnectionError::AdapterUnavailable(reason));
                }
            }
        }
        Ok(())
    }

    async fn request_permissions(&self) -> Result<(), ConnectionError> {
        let version = self.inner.permissions.platform_version();
        let required = Permission::required_for(version);
        if required.is_empty() {
            return Ok(());
        }

        debug!("Requesting {:?} for platform version {:?}", required, version);
        let granted = match self.inner.permissions.request(required).await {
            Ok(statuses) => required.iter().all(|permission| {
                statuses.iter().any(|(requested, status)| {
                    requested == permission && status.is_granted()
                })
            }),
            Err(err) => {
                error!("Permission request error: {}", err);
                false
            }
        };
        if granted {
            return Ok(());
        }

        warn!("Bluetooth permissions were not granted.");
        self.inner.set_state(ManagerState::PermissionDenied);
        self.inner.prompt.permission_denied().await;
        Err(ConnectionError::PermissionDenied)
    }

    async fn ensure_monitor(&self, adapter: &A) -> Result<(), ConnectionError> {
        let running = lock_std(&self.inner.monitor)
            .as_ref()
            .is_some_and(|monitor| !monitor.is_finished());
        if running {
            return Ok(());
        }

        let changes = adapter.state_changes().await?;
        let monitor =
            tokio::spawn(monitor_adapter(Arc::downgrade(&self.inner), changes));
        if let Some(previous) = lock_std(&self.inner.monitor).replace(monitor) {
            previous.abort();
        }
        Ok(())
    }

    /// Scan for the first arm matching the configured name filter, within the
    /// configured timeout.
    pub async fn scan_for_arm(&self) -> Result<DiscoveredDevice, ConnectionError> {
        let filter = self.inner.config.name_filter.clone();
        self.scan(
            move |device| filter.matches_device(device),
            self.inner.config.scan_timeout(),
        )
        .await
    }

    /// Scan until `predicate` accepts an advertisement or `timeout` passes.
    /// Any scan already running on this manager is cancelled first and
    /// returns `ScanCancelled`.
    pub async fn scan<P>(
        &self,
        predicate: P,
        timeout: Duration,
    ) -> Result<DiscoveredDevice, ConnectionError>
    where
        P: Fn(&DiscoveredDevice) -> bool + Send + Sync,
    {
        let epoch = self.inner.cancel_scan();
        let mut cancelled = self.inner.scan_epoch.subscribe();

        let state = self.poll_adapter_state().await?;
        self.await_powered_on(state).await?;

        let mut guard = self.inner.adapter.lock().await;
        if *cancelled.borrow_and_update() != epoch {
            return Err(ConnectionError::ScanCancelled);
        }
        let adapter = guard.as_mut().ok_or(ConnectionError::AdapterReleased)?;

        // The radio may have changed while the adapter lock was contended.
        let state = adapter.state().await?;
        self.inner.on_adapter_state(state).await;
        if let Some(reason) = state.unavailable_reason() {
            warn!("Cannot scan, Bluetooth is {}", reason);
            self.inner.set_state(ManagerState::AdapterUnavailable(reason));
            return Err(ConnectionError::AdapterUnavailable(reason));
        }

        adapter.start_scan().await?;
        self.inner.scanning.store(true, Ordering::SeqCst);
        self.inner.set_state(ManagerState::Scanning);
        info!("Starting BLE scan for up to {:?}.", timeout);

        let mut power = self.inner.adapter_state.subscribe();
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        let outcome = loop {
            tokio::select! {
                _ = &mut deadline => break ScanOutcome::TimedOut,
                changed = cancelled.changed() => {
                    if changed.is_err() || *cancelled.borrow_and_update() != epoch {
                        break ScanOutcome::Cancelled;
                    }
                }
                changed = power.changed() => {
                    if changed.is_err() {
                        break ScanOutcome::Cancelled;
                    }
                    let state = *power.borrow_and_update();
                    if let Some(reason) = state.unavailable_reason() {
                        break ScanOutcome::PowerLost(reason);
                    }
                }
                advertisement = adapter.next_advertisement() => match advertisement {
                    Ok(device) => {
                        trace!("Found device: {:?} {}", device.name(), device.id());
                        if predicate(&device) {
                            break ScanOutcome::Found(device);
                        }
                    }
                    Err(err) => break ScanOutcome::Failed(err),
                },
            }
        };

        if let Err(err) = adapter.stop_scan().await {
            debug!("Failed to stop scan: {}", err);
        }
        self.inner.scanning.store(false, Ordering::SeqCst);
        drop(guard);

        match outcome {
            ScanOutcome::Found(device) => {
                info!("Matching device found: {:?} {}", device.name(), device.id());
                self.inner.settle().await;
                self.inner.publish(ManagerEvent::DeviceFound(device.clone()));
                Ok(device)
            }
            ScanOutcome::TimedOut => {
                info!("Scan timeout - no devices found.");
                self.inner.set_state(ManagerState::ScanTimeout);
                self.inner.publish(ManagerEvent::ScanTimedOut);
                self.inner.settle().await;
                Err(ConnectionError::ScanTimeout)
            }
            ScanOutcome::Cancelled => {
                debug!("Scan cancelled.");
                Err(ConnectionError::ScanCancelled)
            }
            ScanOutcome::PowerLost(reason) => {
                warn!("Bluetooth turned {} while scanning, stopping scan.", reason);
                if self.inner.session.lock().await.is_some() {
                    self.inner.set_state(ManagerState::Connected);
                } else {
                    self.inner
                        .set_state(ManagerState::AdapterUnavailable(reason));
                }
                Err(ConnectionError::AdapterUnavailable(reason))
            }
            ScanOutcome::Failed(err) => {
                error!("Scan error: {}", err);
                self.inner.settle().await;
                Err(err.into())
            }
        }
    }

    /// Connect to `device` and discover its services. Replaces any existing
    /// session. Nothing is installed unless every step succeeds.
    pub async fn connect(
        &self,
        device: &DiscoveredDevice,
    ) -> Result<DeviceInfo, ConnectionError> {
        self.inner.cancel_scan();

        let handle = {
            let adapter = self.inner.adapter.lock().await;
            let adapter =
                adapter.as_ref().ok_or(ConnectionError::AdapterReleased)?;
            info!("Connecting to device: {:?} {}", device.name(), device.id());
            self.inner.set_state(ManagerState::Connecting);
            adapter.connect(device.id()).await
        };
        let handle = match handle {
            Ok(handle) => handle,
            Err(err) => {
                error!("Connection error: {}", err);
                self.inner.settle().await;
                return Err(ConnectionError::ConnectFailed(err.to_string()));
            }
        };

        let services = match handle.discover_services().await {
            Ok(services) => services,
            Err(err) => {
                error!("Service discovery failed on {}: {}", handle.id(), err);
                close_quietly(&handle).await;
                self.inner.settle().await;
                return Err(ConnectionError::DiscoveryFailed(err.to_string()));
            }
        };
        info!(
            "Services and characteristics discovered: {} services.",
            services.len()
        );

        let disconnections = match handle.disconnections().await {
            Ok(disconnections) => disconnections,
            Err(err) => {
                error!("Cannot follow disconnects of {}: {}", handle.id(), err);
                close_quietly(&handle).await;
                self.inner.settle().await;
                return Err(ConnectionError::ConnectFailed(err.to_string()));
            }
        };

        let session_id = self.inner.next_session_id.fetch_add(1, Ordering::SeqCst);
        let mut session = Session::new(session_id, handle, services);
        let info = session.info();

        let mut slot = self.inner.session.lock().await;
        // Spawned under the lock, so the watcher can't see a half-installed
        // session.
        session.set_watcher(tokio::spawn(watch_device(
            Arc::downgrade(&self.inner),
            session_id,
            disconnections,
        )));
        let replaced = slot.replace(session);
        self.inner.set_state(ManagerState::Connected);
        drop(slot);

        if let Some(replaced) = replaced {
            let old_device = replaced.device.id();
            if old_device != info.id {
                close_quietly(&replaced.device).await;
            }
            self.inner.publish(ManagerEvent::Disconnected {
                device: old_device,
                reason: DisconnectReason::Replaced,
            });
        }

        info!("Connected to: {:?} {}", info.name, info.id);
        self.inner.publish(ManagerEvent::Connected(info.clone()));
        Ok(info)
    }

    /// Write `command` as UTF-8 to the first writable characteristic that
    /// accepts it, falling back to the configured endpoint.
    pub async fn send_command(&self, command: &str) -> Result<(), ConnectionError> {
        let slot = self.inner.session.lock().await;
        let session = slot.as_ref().ok_or(ConnectionError::NotConnected)?;
        let payload = command.as_bytes();
        debug!("Sending command: {}", command);

        for (service, characteristic) in writable_characteristics(&session.services) {
            let kind = self.inner.config.write_policy.write_kind(characteristic);
            match session
                .device
                .write(service.uuid, characteristic.uuid, payload, kind)
                .await
            {
                Ok(()) => {
                    info!("Command sent successfully: {}", command);
                    return Ok(());
                }
                Err(err) => {
                    debug!(
                        "Failed to write to characteristic {}: {}",
                        characteristic.uuid, err
                    );
                }
            }
        }

        let endpoint = self.inner.endpoint();
        match session
            .device
            .write(
                endpoint.service,
                endpoint.characteristic,
                payload,
                WriteKind::WithResponse,
            )
            .await
        {
            Ok(()) => {
                info!("Command sent via default UUID: {}", command);
                Ok(())
            }
            Err(err) => {
                error!("Failed to send command via default UUID: {}", err);
                Err(ConnectionError::WriteFailed(String::from(
                    "no writable characteristic found",
                )))
            }
        }
    }

    pub async fn send_arm_command(
        &self,
        command: ArmCommand,
    ) -> Result<(), ConnectionError> {
        self.send_command(command.as_str()).await
    }

    /// Close the session, if any. Without one this is a no-op.
    pub async fn disconnect(&self) -> Result<(), ConnectionError> {
        let mut slot = self.inner.session.lock().await;
        let Some(session) = slot.as_ref() else {
            return Ok(());
        };

        self.inner.set_state(ManagerState::Disconnecting);
        if let Err(err) = session.device.disconnect().await {
            error!("Disconnect error: {}", err);
            self.inner.set_state(ManagerState::Connected);
            return Err(err.into());
        }

        let session = slot.take();
        self.inner.set_state(ManagerState::Ready);
        drop(slot);
        if let Some(session) = session {
            let device = session.device.id();
            info!("Device disconnected successfully: {}", device);
            self.inner.publish(ManagerEvent::Disconnected {
                device,
                reason: DisconnectReason::Requested,
            });
        }
        Ok(())
    }

    /// Fresh snapshot of the connected device's GATT layout, or `None` when
    /// not connected or the read fails.
    pub async fn device_info(&self) -> Option<DeviceInfo> {
        let slot = self.inner.session.lock().await;
        let session = slot.as_ref()?;
        match session.device.services().await {
            Ok(services) => Some(session.info_with(services)),
            Err(err) => {
                warn!("Get device info error: {}", err);
                None
            }
        }
    }

    /// Stop following the adapter, close any session and release the
    /// adapter. Safe to call more than once.
    pub async fn teardown(&self) {
        info!("Tearing down connection manager.");
        let monitor = lock_std(&self.inner.monitor).take();
        if let Some(monitor) = monitor {
            monitor.abort();
        }
        self.inner.cancel_scan();

        let session = self.inner.session.lock().await.take();
        if let Some(session) = session {
            close_quietly(&session.device).await;
            self.inner.publish(ManagerEvent::Disconnected {
                device: session.device.id(),
                reason: DisconnectReason::TornDown,
            });
        }

        if self.inner.adapter.lock().await.take().is_some() {
            debug!("Bluetooth adapter released.");
        }
        self.inner.set_state(ManagerState::Uninitialized);
    }
}

/// Resets the state if `initialize()` is dropped mid-flight.
struct InitGuard<'a, A: BleAdapter> {
    inner: &'a Inner<A>,
    armed: bool,
}

impl<A: BleAdapter> Drop for InitGuard<'_, A> {
    fn drop(&mut self) {
        if self.armed {
            debug!("Initialization abandoned.");
            self.inner.set_state(ManagerState::Uninitialized);
        }
    }
}
