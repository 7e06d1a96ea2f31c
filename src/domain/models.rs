use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::events::Event;

/// 48-bit Bluetooth device address, stored the way the platform stacks hand it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BluetoothAddress(pub u64);

impl BluetoothAddress {
    pub fn octets(&self) -> [u8; 6] {
        let b = self.0.to_be_bytes();
        [b[2], b[3], b[4], b[5], b[6], b[7]]
    }

    /// Organizationally unique identifier (the manufacturer prefix)
    pub fn oui(&self) -> [u8; 3] {
        let o = self.octets();
        [o[0], o[1], o[2]]
    }
}

impl fmt::Display for BluetoothAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = self.octets();
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid Bluetooth address '{0}', expected six hex octets like 00:16:53:a4:db:62")]
pub struct AddressParseError(pub String);

impl FromStr for BluetoothAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() != 6 {
            return Err(AddressParseError(s.to_string()));
        }

        let mut value = 0u64;
        for part in parts {
            if part.is_empty() || part.len() > 2 {
                return Err(AddressParseError(s.to_string()));
            }
            let octet =
                u8::from_str_radix(part, 16).map_err(|_| AddressParseError(s.to_string()))?;
            value = (value << 8) | octet as u64;
        }
        Ok(BluetoothAddress(value))
    }
}

/// Vendor families with their own framing and characteristic layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerFamily {
    /// LEGO Boost Move Hub and the newer powered-up hubs
    LegoHub,
    /// LEGO WeDo 2.0 smart hub
    WeDo2,
    /// fischertechnik BT Smart Controller
    FtSmartController,
    /// fischertechnik BT Control Receiver
    FtControlReceiver,
}

impl ControllerFamily {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::LegoHub => "LEGO hub",
            Self::WeDo2 => "LEGO WeDo 2.0",
            Self::FtSmartController => "fischertechnik BT Smart Controller",
            Self::FtControlReceiver => "fischertechnik BT Control Receiver",
        }
    }
}

impl fmt::Display for ControllerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ControllerFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "lego_hub" | "boost" | "hub" => Ok(Self::LegoHub),
            "wedo2" | "wedo" => Ok(Self::WeDo2),
            "ft_smart_controller" | "smart_controller" => Ok(Self::FtSmartController),
            "ft_control_receiver" | "control_receiver" => Ok(Self::FtControlReceiver),
            other => Err(format!("Unknown controller family: {}", other)),
        }
    }
}

/// Advertised identity of a recognized controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerIdentity {
    pub oui: [u8; 3],
    pub name: String,
    pub family: ControllerFamily,
}

impl ControllerIdentity {
    pub fn new(oui: [u8; 3], name: &str, family: ControllerFamily) -> Self {
        Self {
            oui,
            name: name.to_string(),
            family,
        }
    }

    /// OUI must match exactly, the advertised name ignoring case
    pub fn matches(&self, address: BluetoothAddress, name: &str) -> bool {
        address.oui() == self.oui && self.name.eq_ignore_ascii_case(name.trim())
    }
}

const OUI_TEXAS_INSTRUMENTS: [u8; 3] = [0xa0, 0xe6, 0xf8];
const OUI_FISCHERTECHNIK: [u8; 3] = [0x10, 0x45, 0xf8];
const OUI_LEGO: [u8; 3] = [0x00, 0x16, 0x53];
const OUI_LEGO_HUB: [u8; 3] = [0x90, 0x84, 0x2b];

/// Every controller the core knows how to talk to
pub fn known_identities() -> Vec<ControllerIdentity> {
    let mut identities = vec![
        ControllerIdentity::new(
            OUI_TEXAS_INSTRUMENTS,
            "LPF2 Smart Hub 2 I/O",
            ControllerFamily::WeDo2,
        ),
        ControllerIdentity::new(
            OUI_FISCHERTECHNIK,
            "BT Smart Controller",
            ControllerFamily::FtSmartController,
        ),
        ControllerIdentity::new(
            OUI_FISCHERTECHNIK,
            "BT Control Receiver",
            ControllerFamily::FtControlReceiver,
        ),
    ];

    // Both LEGO prefixes ship with either hub name
    for oui in [OUI_LEGO, OUI_LEGO_HUB] {
        for name in [
            "LEGO Move Hub",
            "HUB NO.4",
            "Technic Hub",
            "Smart Hub",
        ] {
            identities.push(ControllerIdentity::new(oui, name, ControllerFamily::LegoHub));
        }
    }
    identities
}

/// How queued writes are treated while one is awaiting its acknowledgment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueuePolicy {
    /// Every command is written, in submission order
    #[default]
    Fifo,
    /// A newer command for the same characteristic and port replaces the pending one
    Coalesce,
}

/// LEGO hub command encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HubDialect {
    /// Early Boost Move Hub firmware
    Classic,
    #[default]
    PoweredUp,
}

/// Lifecycle of one device session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Connecting,
    ServicesResolving,
    Active,
    Disconnecting,
    Disconnected,
}

impl SessionState {
    pub fn can_send(&self) -> bool {
        matches!(self, SessionState::Active)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, SessionState::Disconnecting | SessionState::Disconnected)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Connecting => write!(f, "Connecting"),
            SessionState::ServicesResolving => write!(f, "Resolving services"),
            SessionState::Active => write!(f, "Active"),
            SessionState::Disconnecting => write!(f, "Disconnecting"),
            SessionState::Disconnected => write!(f, "Disconnected"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScannedDevice {
    pub name: String,
    pub address: BluetoothAddress,
    pub family: ControllerFamily,
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    Hub(Event),
    DeviceFound(ScannedDevice),
    SessionState(SessionState),
    WriteFailed(String),
    LogMessage(StatusMessage),
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub message: String,
    pub severity: MessageSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Info,
    Success,
    Warning,
    Error,
}
