//! Bluetooth Service Module
//!
//! Main service that coordinates discovery, the device session and the
//! application's requests. It runs as a single task: transport events and
//! requests are handled one at a time, in arrival order.

use crate::domain::commands::Command;
use crate::domain::models::{
    AppEvent, BluetoothAddress, ControllerFamily, HubDialect, MessageSeverity, SessionState,
    StatusMessage,
};
use crate::domain::settings::Settings;
use crate::infrastructure::bluetooth::error::{ConnectError, DiscoveryError, ServiceError};
use crate::infrastructure::bluetooth::protocol::VendorCodec;
use crate::infrastructure::bluetooth::scanner::{DiscoveryController, DiscoveryTarget};
use crate::infrastructure::bluetooth::session::{DeviceSession, SessionConfig};
use crate::infrastructure::bluetooth::transport::{BleTransport, TransportEvent};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

/// Requests from the application to the running service
#[derive(Debug, Clone)]
pub enum ServiceRequest {
    Send(Command),
    Disconnect,
    Shutdown,
}

/// Cloneable handle for talking to a running [`BluetoothService`]
#[derive(Debug, Clone)]
pub struct HubHandle {
    requests: mpsc::UnboundedSender<ServiceRequest>,
}

impl HubHandle {
    /// Returns false once the service has stopped
    pub fn send(&self, command: Command) -> bool {
        self.requests.send(ServiceRequest::Send(command)).is_ok()
    }

    pub fn disconnect(&self) -> bool {
        self.requests.send(ServiceRequest::Disconnect).is_ok()
    }

    pub fn shutdown(&self) -> bool {
        self.requests.send(ServiceRequest::Shutdown).is_ok()
    }
}

/// How the service finds its controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    /// Scan and take the first recognized controller
    Scan,
    /// Connect straight to a known address
    Address(BluetoothAddress, ControllerFamily),
}

/// Main Bluetooth service owning the transport and the session
pub struct BluetoothService<T: BleTransport> {
    transport: T,
    discovery: DiscoveryController,
    session: Option<DeviceSession<VendorCodec>>,
    config: SessionConfig,
    dialect: HubDialect,
    event_sender: mpsc::UnboundedSender<AppEvent>,
    requests: mpsc::UnboundedReceiver<ServiceRequest>,
}

impl<T: BleTransport> BluetoothService<T> {
    pub fn new(
        transport: T,
        settings: &Settings,
        event_sender: mpsc::UnboundedSender<AppEvent>,
    ) -> (Self, HubHandle) {
        let (requests_tx, requests) = mpsc::unbounded_channel();
        let service = Self {
            transport,
            discovery: DiscoveryController::new(settings.identity_filters(), event_sender.clone()),
            session: None,
            config: SessionConfig::from_settings(settings),
            dialect: settings.hub_dialect,
            event_sender,
            requests,
        };
        (
            service,
            HubHandle {
                requests: requests_tx,
            },
        )
    }

    /// Runs until the session disconnects, the connection attempt fails,
    /// shutdown is requested or the transport goes away
    pub async fn run(
        mut self,
        start: StartMode,
        mut transport_events: mpsc::UnboundedReceiver<TransportEvent>,
    ) -> Result<(), ServiceError> {
        match start {
            StartMode::Scan => self.discovery.start(&mut self.transport)?,
            StartMode::Address(address, family) => {
                let target = self
                    .discovery
                    .connect_by_address(&mut self.transport, address, family)?;
                self.open_session(target);
            }
        }

        let mut requests_open = true;
        loop {
            tokio::select! {
                event = transport_events.recv() => {
                    let Some(event) = event else {
                        return Err(ServiceError::TransportClosed);
                    };
                    if !self.handle_transport_event(event)? {
                        info!("Bluetooth service finished");
                        return Ok(());
                    }
                }
                request = self.requests.recv(), if requests_open => {
                    match request {
                        Some(ServiceRequest::Send(command)) => self.send(command),
                        Some(ServiceRequest::Disconnect) => self.disconnect(),
                        Some(ServiceRequest::Shutdown) => {
                            self.shutdown();
                            return Ok(());
                        }
                        None => requests_open = false,
                    }
                }
            }
        }
    }

    fn open_session(&mut self, target: DiscoveryTarget) {
        let codec = VendorCodec::for_family(target.family, self.dialect);
        self.session = Some(DeviceSession::new(target.address, codec, self.config));
        let _ = self
            .event_sender
            .send(AppEvent::SessionState(SessionState::Connecting));
    }

    /// Returns false when the service should stop
    fn handle_transport_event(&mut self, event: TransportEvent) -> Result<bool, ServiceError> {
        match event {
            TransportEvent::PeripheralObserved { address, name } => {
                match self.discovery.on_peripheral_observed(
                    &mut self.transport,
                    address,
                    name.as_deref(),
                ) {
                    Ok(Some(target)) => self.open_session(target),
                    Ok(None) => {}
                    Err(e @ DiscoveryError::NotRecognized { .. }) => trace!("{}", e),
                    Err(e) => return Err(e.into()),
                }
            }
            TransportEvent::Connected { address } => {
                self.discovery.on_connect_finished();
                if let Some(session) = self.session.as_mut().filter(|s| s.address() == address) {
                    session.on_connected(&mut self.transport, &mut self.event_sender)?;
                }
            }
            TransportEvent::ConnectFailed { address, reason } => {
                self.discovery.on_connect_finished();
                let error = match self.session.take() {
                    Some(mut session) => session.on_connect_failed(reason, &mut self.event_sender),
                    None => ConnectError::Failed { address, reason },
                };
                self.send_log(&error.to_string(), MessageSeverity::Error);
                return Err(error.into());
            }
            TransportEvent::ServicesResolved {
                address,
                characteristics,
            } => {
                let Some(session) = self.session.as_mut().filter(|s| s.address() == address)
                else {
                    return Ok(true);
                };
                if let Err(e) = session.on_services_resolved(
                    &mut self.transport,
                    &characteristics,
                    &mut self.event_sender,
                ) {
                    let _ = session.disconnect(&mut self.transport, &mut self.event_sender);
                    self.send_log(&e.to_string(), MessageSeverity::Error);
                    return Err(e.into());
                }
                self.send_log("Connection established!", MessageSeverity::Success);
            }
            TransportEvent::Notification { handle, value } => {
                if let Some(session) = self.session.as_mut() {
                    session.on_notification(
                        &mut self.transport,
                        handle,
                        &value,
                        &mut self.event_sender,
                    );
                }
            }
            TransportEvent::NotificationsEnabled { handle } => {
                debug!("Notifications enabled on {:?}", handle);
            }
            TransportEvent::NotificationsFailed { handle, reason } => {
                warn!("Notification subscription failed on {:?}: {}", handle, reason);
                self.send_log(
                    &format!("Notifications unavailable: {}", reason),
                    MessageSeverity::Warning,
                );
            }
            TransportEvent::WriteAck { .. } => {
                if let Some(session) = self.session.as_mut() {
                    session.on_write_ack(&mut self.transport, &mut self.event_sender);
                }
            }
            TransportEvent::WriteFailed { reason, .. } => {
                if let Some(session) = self.session.as_mut() {
                    session.on_write_failed(&mut self.transport, reason, &mut self.event_sender);
                }
            }
            TransportEvent::Disconnected { address } => {
                if let Some(mut session) = self.session.take() {
                    if session.address() != address {
                        self.session = Some(session);
                        return Ok(true);
                    }
                    session.on_disconnected(&mut self.event_sender);
                    self.send_log("Disconnected", MessageSeverity::Info);
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    fn send(&mut self, command: Command) {
        let Some(session) = self.session.as_mut() else {
            warn!("Dropping {}: no controller connected", command.name());
            return;
        };
        let name = command.name();
        if let Err(e) = session.send(&mut self.transport, command) {
            warn!("Failed to send {}: {}", name, e);
            self.send_log(&format!("{} not sent: {}", name, e), MessageSeverity::Warning);
        }
    }

    fn disconnect(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if let Err(e) = session.disconnect(&mut self.transport, &mut self.event_sender) {
                warn!("Disconnect failed: {}", e);
            }
        }
    }

    fn shutdown(&mut self) {
        info!("Shutting down Bluetooth service");
        if let Err(e) = self.discovery.stop(&mut self.transport) {
            warn!("Failed to stop scan: {}", e);
        }
        self.disconnect();
    }

    fn send_log(&self, message: &str, severity: MessageSeverity) {
        let _ = self.event_sender.send(AppEvent::LogMessage(StatusMessage {
            message: message.to_string(),
            severity,
        }));
    }
}
