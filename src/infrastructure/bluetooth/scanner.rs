//! Discovery
//!
//! Filters advertisements down to recognized controllers. The first match
//! stops the scan and starts connecting; nothing seen afterwards is
//! considered, and a failed connection does not resume scanning.

use crate::domain::models::{
    AppEvent, BluetoothAddress, ControllerFamily, ControllerIdentity, MessageSeverity,
    ScannedDevice, StatusMessage,
};
use crate::infrastructure::bluetooth::error::DiscoveryError;
use crate::infrastructure::bluetooth::transport::BleTransport;
use tokio::sync::mpsc;
use tracing::{info, trace};

/// Controller picked for connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryTarget {
    pub address: BluetoothAddress,
    pub name: Option<String>,
    pub family: ControllerFamily,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiscoveryState {
    Idle,
    Scanning,
    Connecting(BluetoothAddress),
}

pub struct DiscoveryController {
    filters: Vec<ControllerIdentity>,
    state: DiscoveryState,
    event_sender: mpsc::UnboundedSender<AppEvent>,
}

impl DiscoveryController {
    pub fn new(
        filters: Vec<ControllerIdentity>,
        event_sender: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            filters,
            state: DiscoveryState::Idle,
            event_sender,
        }
    }

    pub fn start(&mut self, transport: &mut dyn BleTransport) -> Result<(), DiscoveryError> {
        match self.state {
            DiscoveryState::Connecting(_) => return Err(DiscoveryError::Busy),
            DiscoveryState::Scanning => return Ok(()),
            DiscoveryState::Idle => {}
        }

        info!("Starting BLE scan ({} known identities)", self.filters.len());
        transport.start_scan()?;
        self.state = DiscoveryState::Scanning;
        self.send_log("Scanning for controllers...", MessageSeverity::Info);
        Ok(())
    }

    pub fn stop(&mut self, transport: &mut dyn BleTransport) -> Result<(), DiscoveryError> {
        if self.state == DiscoveryState::Scanning {
            info!("Stopping BLE scan...");
            self.state = DiscoveryState::Idle;
            transport.stop_scan()?;
        }
        Ok(())
    }

    pub fn is_scanning(&self) -> bool {
        self.state == DiscoveryState::Scanning
    }

    pub fn connecting_to(&self) -> Option<BluetoothAddress> {
        match self.state {
            DiscoveryState::Connecting(address) => Some(address),
            _ => None,
        }
    }

    pub fn matching_identity(
        &self,
        address: BluetoothAddress,
        name: &str,
    ) -> Option<&ControllerIdentity> {
        self.filters
            .iter()
            .find(|identity| identity.matches(address, name))
    }

    /// `Ok(None)` means the advertisement arrived when no scan was active
    pub fn on_peripheral_observed(
        &mut self,
        transport: &mut dyn BleTransport,
        address: BluetoothAddress,
        name: Option<&str>,
    ) -> Result<Option<DiscoveryTarget>, DiscoveryError> {
        if self.state != DiscoveryState::Scanning {
            trace!("Ignoring advertisement from {} (not scanning)", address);
            return Ok(None);
        }

        let family = name.and_then(|n| self.matching_identity(address, n).map(|i| i.family));
        let Some(family) = family else {
            return Err(DiscoveryError::NotRecognized {
                address,
                name: name.map(str::to_string),
            });
        };

        let name = name.map(str::to_string);
        info!(
            "Found {} \"{}\" at {}",
            family,
            name.as_deref().unwrap_or_default(),
            address
        );
        let _ = self.event_sender.send(AppEvent::DeviceFound(ScannedDevice {
            name: name.clone().unwrap_or_default(),
            address,
            family,
        }));

        self.stop(transport)?;
        self.begin_connect(transport, address)?;
        Ok(Some(DiscoveryTarget {
            address,
            name,
            family,
        }))
    }

    /// Connects without scanning, e.g. for an address given by the user
    pub fn connect_by_address(
        &mut self,
        transport: &mut dyn BleTransport,
        address: BluetoothAddress,
        family: ControllerFamily,
    ) -> Result<DiscoveryTarget, DiscoveryError> {
        if self.connecting_to().is_some() {
            return Err(DiscoveryError::Busy);
        }
        self.stop(transport)?;
        self.begin_connect(transport, address)?;
        Ok(DiscoveryTarget {
            address,
            name: None,
            family,
        })
    }

    fn begin_connect(
        &mut self,
        transport: &mut dyn BleTransport,
        address: BluetoothAddress,
    ) -> Result<(), DiscoveryError> {
        info!("Connecting to {}", address);
        self.send_log(&format!("Connecting to {}...", address), MessageSeverity::Info);
        transport.connect(address)?;
        self.state = DiscoveryState::Connecting(address);
        Ok(())
    }

    /// The attempt succeeded or failed; either way discovery is done
    pub fn on_connect_finished(&mut self) {
        self.state = DiscoveryState::Idle;
    }

    fn send_log(&self, message: &str, severity: MessageSeverity) {
        let _ = self.event_sender.send(AppEvent::LogMessage(StatusMessage {
            message: message.to_string(),
            severity,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::known_identities;
    use crate::infrastructure::bluetooth::transport::testing::{
        RecordingTransport, TransportCall,
    };

    fn controller() -> (DiscoveryController, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (DiscoveryController::new(known_identities(), tx), rx)
    }

    #[test]
    fn test_first_match_stops_scan_and_connects() {
        let (mut discovery, mut rx) = controller();
        let mut transport = RecordingTransport::new();
        discovery.start(&mut transport).unwrap();

        let hub: BluetoothAddress = "00:16:53:a4:db:62".parse().unwrap();
        let target = discovery
            .on_peripheral_observed(&mut transport, hub, Some("LEGO Move Hub"))
            .unwrap();
        assert_eq!(
            target,
            Some(DiscoveryTarget {
                address: hub,
                name: Some("LEGO Move Hub".to_string()),
                family: ControllerFamily::LegoHub,
            })
        );
        assert_eq!(
            transport.calls(),
            vec![
                TransportCall::StartScan,
                TransportCall::StopScan,
                TransportCall::Connect(hub)
            ]
        );
        assert_eq!(discovery.connecting_to(), Some(hub));

        // a second controller showing up afterwards is ignored
        let other: BluetoothAddress = "10:45:f8:00:00:01".parse().unwrap();
        assert_eq!(
            discovery.on_peripheral_observed(&mut transport, other, Some("BT Smart Controller")),
            Ok(None)
        );
        assert_eq!(transport.calls().len(), 3);

        let mut found = false;
        while let Ok(event) = rx.try_recv() {
            if let AppEvent::DeviceFound(device) = event {
                assert_eq!(device.address, hub);
                found = true;
            }
        }
        assert!(found);
    }

    #[test]
    fn test_unrecognized_peripheral() {
        let (mut discovery, _rx) = controller();
        let mut transport = RecordingTransport::new();
        discovery.start(&mut transport).unwrap();

        // right name, wrong manufacturer prefix
        let address: BluetoothAddress = "00:16:54:a4:db:62".parse().unwrap();
        assert!(matches!(
            discovery.on_peripheral_observed(&mut transport, address, Some("LEGO Move Hub")),
            Err(DiscoveryError::NotRecognized { .. })
        ));
        // no name advertised
        let address: BluetoothAddress = "00:16:53:a4:db:62".parse().unwrap();
        assert!(discovery
            .on_peripheral_observed(&mut transport, address, None)
            .is_err());
        assert!(discovery.is_scanning());
    }

    #[test]
    fn test_connect_by_address_bypasses_scan() {
        let (mut discovery, _rx) = controller();
        let mut transport = RecordingTransport::new();
        let address: BluetoothAddress = "a0:e6:f8:1b:e1:b9".parse().unwrap();

        let target = discovery
            .connect_by_address(&mut transport, address, ControllerFamily::WeDo2)
            .unwrap();
        assert_eq!(target.family, ControllerFamily::WeDo2);
        assert_eq!(transport.calls(), vec![TransportCall::Connect(address)]);

        assert_eq!(
            discovery.connect_by_address(&mut transport, address, ControllerFamily::WeDo2),
            Err(DiscoveryError::Busy)
        );
        discovery.on_connect_finished();
        assert_eq!(discovery.connecting_to(), None);
        assert!(!discovery.is_scanning());
    }
}
