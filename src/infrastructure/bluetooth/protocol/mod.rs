//! Controller Protocols
//!
//! One codec per vendor family. A codec is pure: it maps characteristic
//! bytes to [`Event`]s and [`Command`]s to the bytes for a characteristic,
//! consulting the session's port table where the wire format depends on the
//! attached device. It never performs I/O and keeps no state between calls.
//!
//! - [`hub`] - LEGO Boost / Powered Up hubs (length-prefixed frames on one characteristic)
//! - [`wedo`] - LEGO WeDo 2.0 (separate characteristics per direction)
//! - [`fischertechnik`] - BT Smart Controller and BT Control Receiver (one characteristic per output)

pub mod fischertechnik;
pub mod hub;
pub mod wedo;

use crate::domain::commands::Command;
use crate::domain::events::Event;
use crate::domain::models::{ControllerFamily, HubDialect};
use crate::domain::ports::PortTable;
use crate::infrastructure::bluetooth::error::{DecodeError, EncodeError};

pub use fischertechnik::FtCodec;
pub use hub::HubCodec;
pub use wedo::WeDoCodec;

/// What a characteristic is used for, independent of its UUID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CharacteristicRole {
    /// LEGO hub bidirectional frame stream
    HubStream,
    PortEvents,
    SensorValues,
    ModeConfig,
    OutputCommand,
    /// fischertechnik channel selector / status LED
    Channel,
    /// fischertechnik motor or servo output M1..M4
    Output(u8),
    /// fischertechnik input I1..I4
    Input(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacteristicSpec {
    pub service_uuid: &'static str,
    pub uuid: &'static str,
    pub role: CharacteristicRole,
    pub notify: bool,
    pub write: bool,
}

/// Encoded command waiting for (or occupying) the write slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWrite {
    pub role: CharacteristicRole,
    pub port: Option<u8>,
    pub payload: Vec<u8>,
    /// Set for continuous commands only; names the command kind
    pub intent: Option<&'static str>,
}

impl PendingWrite {
    pub fn new(role: CharacteristicRole, port: Option<u8>, payload: Vec<u8>) -> Self {
        Self {
            role,
            port,
            payload,
            intent: None,
        }
    }

    /// Marks the write as replaceable when `command` is continuous
    pub fn for_command(mut self, command: &Command) -> Self {
        self.intent = command.is_continuous().then(|| command.name());
        self
    }

    /// Writes with the same key supersede each other when coalescing.
    /// `None` means the write is never replaced.
    pub fn key(&self) -> Option<(CharacteristicRole, Option<u8>, &'static str)> {
        self.intent.map(|intent| (self.role, self.port, intent))
    }
}

pub trait FrameCodec: Send {
    fn family(&self) -> ControllerFamily;

    /// Characteristics this family uses
    fn characteristics(&self) -> &'static [CharacteristicSpec];

    fn match_characteristic(
        &self,
        service_uuid: &str,
        uuid: &str,
    ) -> Option<&'static CharacteristicSpec> {
        self.characteristics().iter().find(|spec| {
            spec.service_uuid.eq_ignore_ascii_case(service_uuid)
                && spec.uuid.eq_ignore_ascii_case(uuid)
        })
    }

    fn decode(
        &self,
        role: CharacteristicRole,
        bytes: &[u8],
        ports: &PortTable,
    ) -> Result<Event, DecodeError>;

    fn encode(&self, command: &Command, ports: &PortTable) -> Result<PendingWrite, EncodeError>;

    /// Commands issued once the characteristics are resolved
    fn init_commands(&self) -> Vec<Command> {
        Vec::new()
    }

    /// Commands that switch on reporting for a freshly attached device
    fn sensor_setup(&self, _port: u8, _device_type: u8) -> Vec<Command> {
        Vec::new()
    }

    /// Whether the port/mode information requests are understood
    fn supports_port_information(&self) -> bool {
        false
    }
}

pub(crate) fn unsupported(command: &Command, family: ControllerFamily) -> EncodeError {
    EncodeError::Unsupported {
        command: command.name(),
        family: family.display_name(),
    }
}

pub(crate) fn require(bytes: &[u8], expected: usize) -> Result<(), DecodeError> {
    if bytes.len() < expected {
        return Err(DecodeError::TooShort {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

/// Codec selected at runtime from the discovered family
#[derive(Debug, Clone)]
pub enum VendorCodec {
    Hub(HubCodec),
    WeDo(WeDoCodec),
    Ft(FtCodec),
}

impl VendorCodec {
    pub fn for_family(family: ControllerFamily, dialect: HubDialect) -> Self {
        match family {
            ControllerFamily::LegoHub => VendorCodec::Hub(HubCodec::new(dialect)),
            ControllerFamily::WeDo2 => VendorCodec::WeDo(WeDoCodec),
            ControllerFamily::FtSmartController | ControllerFamily::FtControlReceiver => {
                VendorCodec::Ft(FtCodec::new(family))
            }
        }
    }

    fn inner(&self) -> &dyn FrameCodec {
        match self {
            VendorCodec::Hub(codec) => codec,
            VendorCodec::WeDo(codec) => codec,
            VendorCodec::Ft(codec) => codec,
        }
    }
}

impl FrameCodec for VendorCodec {
    fn family(&self) -> ControllerFamily {
        self.inner().family()
    }

    fn characteristics(&self) -> &'static [CharacteristicSpec] {
        self.inner().characteristics()
    }

    fn decode(
        &self,
        role: CharacteristicRole,
        bytes: &[u8],
        ports: &PortTable,
    ) -> Result<Event, DecodeError> {
        self.inner().decode(role, bytes, ports)
    }

    fn encode(&self, command: &Command, ports: &PortTable) -> Result<PendingWrite, EncodeError> {
        self.inner().encode(command, ports)
    }

    fn init_commands(&self) -> Vec<Command> {
        self.inner().init_commands()
    }

    fn sensor_setup(&self, port: u8, device_type: u8) -> Vec<Command> {
        self.inner().sensor_setup(port, device_type)
    }

    fn supports_port_information(&self) -> bool {
        self.inner().supports_port_information()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_codec_selection() {
        let codec = VendorCodec::for_family(ControllerFamily::FtControlReceiver, HubDialect::Classic);
        assert_eq!(codec.family(), ControllerFamily::FtControlReceiver);

        let codec = VendorCodec::for_family(ControllerFamily::LegoHub, HubDialect::PoweredUp);
        assert!(codec.supports_port_information());
        assert_eq!(codec.characteristics().len(), 1);
    }

    #[test]
    fn test_characteristic_match_ignores_case() {
        let codec = VendorCodec::for_family(ControllerFamily::LegoHub, HubDialect::PoweredUp);
        let spec = codec.match_characteristic(
            "00001623-1212-EFDE-1623-785FEABCD123",
            "00001624-1212-efde-1623-785feabcd123",
        );
        assert_eq!(spec.map(|s| s.role), Some(CharacteristicRole::HubStream));
        assert!(codec
            .match_characteristic("00001623-1212-efde-1623-785feabcd123", "00002a00-0000-1000-8000-00805f9b34fb")
            .is_none());
    }

    #[test]
    fn test_unsupported_names_command_and_family() {
        let err = unsupported(&Command::SetChannel { value: 1 }, ControllerFamily::LegoHub);
        assert_eq!(err.to_string(), "SetChannel is not supported by LEGO hub");
    }
}
