//! Intents the application can send to a controller
//!
//! Each family encodes these into its own wire layout; a command a family has
//! no encoding for is rejected by its codec.

/// Hub property identifiers
pub mod hub_property {
    pub const NAME: u8 = 0x01;
    pub const BUTTON: u8 = 0x02;

    /// Operation: enable automatic updates for the property
    pub const ENABLE_UPDATES: u8 = 0x02;
}

/// Port mode information types
pub mod mode_info {
    pub const NAME: u8 = 0x00;
    pub const RAW_RANGE: u8 = 0x01;
    pub const PERCENT_RANGE: u8 = 0x02;
    pub const SI_RANGE: u8 = 0x03;
    pub const SYMBOL: u8 = 0x04;

    pub const ALL: [u8; 5] = [NAME, RAW_RANGE, PERCENT_RANGE, SI_RANGE, SYMBOL];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetHubProperty {
        property: u8,
        operation: u8,
    },
    /// Select the reporting mode of a sensor (or a motor used as rotation sensor)
    SetPortMode {
        port: u8,
        mode: u8,
        /// Minimum change before a new value is reported
        delta: u32,
        notify: bool,
    },
    /// Speed in percent, -100..=100
    MotorRun {
        port: u8,
        speed: i8,
    },
    MotorRunForTime {
        port: u8,
        speed: i8,
        millis: u16,
    },
    MotorRunForAngle {
        port: u8,
        speed: i8,
        degrees: i32,
    },
    /// Runs both motors of the A+B group port synchronously
    DualMotorRunForTime {
        speed_a: i8,
        speed_b: i8,
        millis: u16,
    },
    DualMotorRunForAngle {
        speed_a: i8,
        speed_b: i8,
        degrees: i32,
    },
    SetLedColor {
        color: u8,
    },
    RequestPortInformation {
        port: u8,
    },
    RequestPortModeInformation {
        port: u8,
        mode: u8,
        info_type: u8,
    },
    /// fischertechnik channel characteristic (drives the status LED)
    SetChannel {
        value: u8,
    },
}

impl Command {
    /// Mode change with the defaults the hubs are usually configured with
    pub fn set_mode(port: u8, mode: u8) -> Self {
        Command::SetPortMode {
            port,
            mode,
            delta: 1,
            notify: true,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::SetHubProperty { .. } => "SetHubProperty",
            Command::SetPortMode { .. } => "SetPortMode",
            Command::MotorRun { .. } => "MotorRun",
            Command::MotorRunForTime { .. } => "MotorRunForTime",
            Command::MotorRunForAngle { .. } => "MotorRunForAngle",
            Command::DualMotorRunForTime { .. } => "DualMotorRunForTime",
            Command::DualMotorRunForAngle { .. } => "DualMotorRunForAngle",
            Command::SetLedColor { .. } => "SetLedColor",
            Command::RequestPortInformation { .. } => "RequestPortInformation",
            Command::RequestPortModeInformation { .. } => "RequestPortModeInformation",
            Command::SetChannel { .. } => "SetChannel",
        }
    }

    /// Commands that carry a level rather than an action; a newer one makes
    /// an unsent older one pointless
    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            Command::MotorRun { .. } | Command::SetLedColor { .. } | Command::SetChannel { .. }
        )
    }

    /// Port addressed by the command, if any
    pub fn port(&self) -> Option<u8> {
        match self {
            Command::SetPortMode { port, .. }
            | Command::MotorRun { port, .. }
            | Command::MotorRunForTime { port, .. }
            | Command::MotorRunForAngle { port, .. }
            | Command::RequestPortInformation { port }
            | Command::RequestPortModeInformation { port, .. } => Some(*port),
            _ => None,
        }
    }
}
