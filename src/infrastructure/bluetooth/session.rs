//! Device Session
//!
//! Runtime state of one connected controller: lifecycle, the characteristics
//! resolved for it, the devices attached to its ports and the output queue.
//! The session is driven entirely by the owner feeding it transport events;
//! it never blocks and never spawns.

use crate::domain::commands::{mode_info, Command};
use crate::domain::events::{Event, PortInfo};
use crate::domain::models::{AppEvent, BluetoothAddress, QueuePolicy, SessionState};
use crate::domain::ports::PortTable;
use crate::domain::settings::Settings;
use crate::infrastructure::bluetooth::error::{
    ConnectError, SessionError, TransportError, WriteError,
};
use crate::infrastructure::bluetooth::protocol::{CharacteristicRole, FrameCodec, PendingWrite};
use crate::infrastructure::bluetooth::queue::OutputQueue;
use crate::infrastructure::bluetooth::transport::{
    BleTransport, CharacteristicHandle, Connection, DiscoveredCharacteristic,
};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub queue_policy: QueuePolicy,
    /// Send the codec's init commands once characteristics are resolved
    pub send_init_sequence: bool,
    /// Query port and mode information for every attached device
    pub request_port_info: bool,
    /// Switch on value reports for recognized sensors when they attach
    pub auto_enable_sensors: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            queue_policy: QueuePolicy::Fifo,
            send_init_sequence: true,
            request_port_info: false,
            auto_enable_sensors: true,
        }
    }
}

impl SessionConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            queue_policy: settings.queue_policy,
            send_init_sequence: settings.send_init_sequence,
            request_port_info: settings.request_port_info,
            auto_enable_sensors: settings.auto_enable_sensors,
        }
    }
}

/// Receives what a session produces
pub trait SessionObserver {
    fn on_event(&mut self, event: &Event);

    fn on_write_ack(&mut self) {}

    fn on_write_failed(&mut self, _error: &WriteError) {}

    fn on_state_changed(&mut self, _state: SessionState) {}
}

impl SessionObserver for mpsc::UnboundedSender<AppEvent> {
    fn on_event(&mut self, event: &Event) {
        let _ = self.send(AppEvent::Hub(event.clone()));
    }

    fn on_write_failed(&mut self, error: &WriteError) {
        let _ = self.send(AppEvent::WriteFailed(error.to_string()));
    }

    fn on_state_changed(&mut self, state: SessionState) {
        let _ = self.send(AppEvent::SessionState(state));
    }
}

pub struct DeviceSession<C: FrameCodec> {
    connection: Connection,
    codec: C,
    config: SessionConfig,
    state: SessionState,
    ports: PortTable,
    queue: OutputQueue,
    writable: HashMap<CharacteristicRole, CharacteristicHandle>,
    roles: HashMap<CharacteristicHandle, CharacteristicRole>,
}

impl<C: FrameCodec> DeviceSession<C> {
    /// A session starts out connecting; the caller has already asked the
    /// transport to connect
    pub fn new(address: BluetoothAddress, codec: C, config: SessionConfig) -> Self {
        Self {
            connection: Connection { address },
            codec,
            config,
            state: SessionState::Connecting,
            ports: PortTable::new(),
            queue: OutputQueue::new(config.queue_policy),
            writable: HashMap::new(),
            roles: HashMap::new(),
        }
    }

    pub fn address(&self) -> BluetoothAddress {
        self.connection.address
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn ports(&self) -> &PortTable {
        &self.ports
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn queue(&self) -> &OutputQueue {
        &self.queue
    }

    fn set_state(&mut self, state: SessionState, observer: &mut dyn SessionObserver) {
        if self.state != state {
            info!("Session {}: {} -> {}", self.connection.address, self.state, state);
            self.state = state;
            observer.on_state_changed(state);
        }
    }

    pub fn on_connected(
        &mut self,
        transport: &mut dyn BleTransport,
        observer: &mut dyn SessionObserver,
    ) -> Result<(), SessionError> {
        if self.state != SessionState::Connecting {
            debug!("Ignoring connect completion in state {}", self.state);
            return Ok(());
        }
        info!(
            "Connected to {} ({})",
            self.connection.address,
            self.codec.family()
        );
        self.set_state(SessionState::ServicesResolving, observer);
        transport.resolve_services(self.connection.address)?;
        Ok(())
    }

    pub fn on_connect_failed(
        &mut self,
        reason: String,
        observer: &mut dyn SessionObserver,
    ) -> ConnectError {
        error!("Connection to {} failed: {}", self.connection.address, reason);
        self.set_state(SessionState::Disconnected, observer);
        ConnectError::Failed {
            address: self.connection.address,
            reason,
        }
    }

    /// Binds the discovered characteristics to their roles and activates the session
    pub fn on_services_resolved(
        &mut self,
        transport: &mut dyn BleTransport,
        characteristics: &[DiscoveredCharacteristic],
        observer: &mut dyn SessionObserver,
    ) -> Result<(), SessionError> {
        if self.state != SessionState::ServicesResolving {
            debug!("Ignoring service resolution in state {}", self.state);
            return Ok(());
        }

        for discovered in characteristics {
            let Some(spec) = self
                .codec
                .match_characteristic(&discovered.service_uuid, &discovered.uuid)
            else {
                trace!("Skipping characteristic {}", discovered.uuid);
                continue;
            };

            debug!("Characteristic {} -> {:?}", discovered.uuid, spec.role);
            self.roles.insert(discovered.handle, spec.role);
            if spec.write {
                self.writable.insert(spec.role, discovered.handle);
            }
            if spec.notify {
                if let Err(e) = transport.enable_notifications(discovered.handle) {
                    warn!("Failed to enable notifications for {:?}: {}", spec.role, e);
                }
            }
        }

        if self.roles.is_empty() {
            return Err(ConnectError::NoRecognizedCharacteristics.into());
        }

        self.set_state(SessionState::Active, observer);

        if self.config.send_init_sequence {
            for command in self.codec.init_commands() {
                if let Err(e) = self.send(transport, command) {
                    warn!("Init command not sent: {}", e);
                }
            }
        }
        Ok(())
    }

    pub fn on_notification(
        &mut self,
        transport: &mut dyn BleTransport,
        handle: CharacteristicHandle,
        value: &[u8],
        observer: &mut dyn SessionObserver,
    ) {
        let Some(&role) = self.roles.get(&handle) else {
            debug!("Notification from unknown characteristic {:?}", handle);
            return;
        };
        trace!("Raw notification {:?}: {:02X?}", role, value);

        let event = match self.codec.decode(role, value, &self.ports) {
            Ok(event) => event,
            Err(e) => {
                debug!("Dropping notification: {}", e);
                return;
            }
        };

        match event {
            Event::PortAttached { port, device_type }
            | Event::PortsCoupled {
                port, device_type, ..
            } => {
                self.ports.attach(port, device_type);
            }
            Event::PortDetached { port } => {
                self.ports.detach(port);
            }
            _ => {}
        }

        observer.on_event(&event);
        self.follow_up(transport, &event);
    }

    /// Commands triggered by what the hub just reported
    fn follow_up(&mut self, transport: &mut dyn BleTransport, event: &Event) {
        let mut commands = Vec::new();
        match *event {
            Event::PortAttached { port, device_type } => {
                if self.config.request_port_info && self.codec.supports_port_information() {
                    commands.push(Command::RequestPortInformation { port });
                }
                if self.config.auto_enable_sensors {
                    commands.extend(self.codec.sensor_setup(port, device_type));
                }
            }
            Event::PortInfo {
                port,
                info: PortInfo::Modes { mode_count, .. },
            } if self.config.request_port_info => {
                for mode in 0..mode_count {
                    for info_type in mode_info::ALL {
                        commands.push(Command::RequestPortModeInformation {
                            port,
                            mode,
                            info_type,
                        });
                    }
                }
            }
            _ => {}
        }

        for command in commands {
            if let Err(e) = self.send(transport, command) {
                warn!("Follow-up command not sent: {}", e);
            }
        }
    }

    /// Encodes and queues a command; only an active session accepts commands
    pub fn send(
        &mut self,
        transport: &mut dyn BleTransport,
        command: Command,
    ) -> Result<(), SessionError> {
        match self.state {
            SessionState::Active => {}
            SessionState::Disconnecting | SessionState::Disconnected => {
                return Err(SessionError::Disconnected)
            }
            other => return Err(SessionError::NotReady(other)),
        }

        let write = self.codec.encode(&command, &self.ports)?.for_command(&command);
        if !self.writable.contains_key(&write.role) {
            return Err(SessionError::MissingCharacteristic(write.role));
        }

        debug!("Queueing {} ({} bytes)", command.name(), write.payload.len());
        if let Some(write) = self.queue.submit(write) {
            if let Err(e) = self.transmit(transport, &write) {
                // the slot was free, so nothing else is waiting behind it
                self.queue.on_write_failed();
                return Err(e.into());
            }
        }
        // recorded only once the write was transmitted or queued
        if let Command::SetPortMode { port, mode, .. } = command {
            self.ports.set_mode(port, mode);
        }
        Ok(())
    }

    fn transmit(
        &self,
        transport: &mut dyn BleTransport,
        write: &PendingWrite,
    ) -> Result<(), TransportError> {
        let handle = self
            .writable
            .get(&write.role)
            .copied()
            .ok_or(TransportError::NotConnected)?;
        trace!("Write {:?}: {:02X?}", write.role, write.payload);
        transport.write(handle, &write.payload)
    }

    /// Transmits `next`, skipping over writes the transport refuses outright
    fn pump(
        &mut self,
        transport: &mut dyn BleTransport,
        mut next: Option<PendingWrite>,
        observer: &mut dyn SessionObserver,
    ) {
        while let Some(write) = next {
            match self.transmit(transport, &write) {
                Ok(()) => return,
                Err(e) => {
                    let error = WriteError {
                        role: write.role,
                        reason: e.to_string(),
                    };
                    warn!("{}", error);
                    observer.on_write_failed(&error);
                    next = self.queue.on_write_failed().1;
                }
            }
        }
    }

    pub fn on_write_ack(
        &mut self,
        transport: &mut dyn BleTransport,
        observer: &mut dyn SessionObserver,
    ) {
        if !self.queue.is_in_flight() {
            debug!("Write acknowledged with nothing in flight");
            return;
        }
        observer.on_write_ack();
        let next = self.queue.on_write_ack();
        self.pump(transport, next, observer);
    }

    /// The failed write is not retried
    pub fn on_write_failed(
        &mut self,
        transport: &mut dyn BleTransport,
        reason: String,
        observer: &mut dyn SessionObserver,
    ) {
        let (failed, next) = self.queue.on_write_failed();
        if let Some(failed) = failed {
            let error = WriteError {
                role: failed.role,
                reason,
            };
            warn!("{}", error);
            observer.on_write_failed(&error);
        }
        self.pump(transport, next, observer);
    }

    /// Drops pending output and asks the transport to close the link
    pub fn disconnect(
        &mut self,
        transport: &mut dyn BleTransport,
        observer: &mut dyn SessionObserver,
    ) -> Result<(), SessionError> {
        if self.state.is_closed() {
            return Ok(());
        }
        self.queue.clear();
        self.set_state(SessionState::Disconnecting, observer);
        transport.disconnect(self.connection.address)?;
        Ok(())
    }

    pub fn on_disconnected(&mut self, observer: &mut dyn SessionObserver) {
        self.queue.clear();
        self.ports.clear();
        self.writable.clear();
        self.roles.clear();
        self.set_state(SessionState::Disconnected, observer);
    }
}
