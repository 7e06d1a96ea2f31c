//! Telemetry decoded from controller notifications
//!
//! Events are produced once per received notification and handed straight to
//! the application; nothing here is retained by the session.

use bitflags::bitflags;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A device was plugged in (also sent once per device right after connecting)
    PortAttached { port: u8, device_type: u8 },
    PortDetached { port: u8 },
    /// Two physical ports were joined into a virtual port (the Boost A+B motor pair)
    PortsCoupled {
        port: u8,
        device_type: u8,
        port_a: u8,
        port_b: u8,
    },
    SensorReading {
        port: u8,
        device_type: u8,
        value: SensorValue,
    },
    /// Sensor value for a port with no attached device on record
    UnknownSensor { port: u8, raw: Vec<u8> },
    WriteAck(WriteAck),
    HubProperty(HubProperty),
    PortInfo { port: u8, info: PortInfo },
    PortModeInfo { port: u8, mode: u8, info: ModeInfo },
    /// Error report from the hub; the payload layout is undocumented
    ErrorNotification { payload: Vec<u8> },
    /// Raw reading of a fixed input (fischertechnik I1..I4)
    InputValue { input: u8, raw: u16 },
    Unknown { message_type: u16, body: Vec<u8> },
}

impl Event {
    pub fn port(&self) -> Option<u8> {
        match self {
            Event::PortAttached { port, .. }
            | Event::PortDetached { port }
            | Event::PortsCoupled { port, .. }
            | Event::SensorReading { port, .. }
            | Event::UnknownSensor { port, .. }
            | Event::PortInfo { port, .. }
            | Event::PortModeInfo { port, .. } => Some(*port),
            Event::WriteAck(WriteAck::ModeSet { port })
            | Event::WriteAck(WriteAck::Command { port, .. }) => Some(*port),
            _ => None,
        }
    }
}

/// Hub-side confirmation of a previously written command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAck {
    /// Port mode configuration accepted
    ModeSet { port: u8 },
    /// Progress of an output command
    Command { port: u8, status: CommandStatus },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Started,
    AlreadyRunning,
    Completed,
    Other(u8),
}

impl CommandStatus {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x01 => CommandStatus::Started,
            0x05 => CommandStatus::AlreadyRunning,
            0x0a => CommandStatus::Completed,
            other => CommandStatus::Other(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubProperty {
    Name(String),
    Button(bool),
    Other { property: u8, raw: Vec<u8> },
}

bitflags! {
    /// Capability bits reported in a port information reply
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PortCapabilities: u8 {
        const OUTPUT = 0x01;
        const INPUT = 0x02;
        const LOGICAL_COMBINABLE = 0x04;
        const LOGICAL_SYNCHRONIZABLE = 0x08;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortInfo {
    Modes {
        capabilities: PortCapabilities,
        mode_count: u8,
        input_modes: u16,
        output_modes: u16,
    },
    Other { info_type: u8, raw: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModeInfo {
    Name(String),
    RawRange { min: f32, max: f32 },
    PercentRange { min: f32, max: f32 },
    SiRange { min: f32, max: f32 },
    Symbol(String),
    Other { info_type: u8, raw: Vec<u8> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vector3 {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

/// Sensor payload, interpreted by the device type attached to the port
#[derive(Debug, Clone, PartialEq)]
pub enum SensorValue {
    Voltage(u16),
    Current(u16),
    /// Coarse tilt index; the meaning depends on the sensor type
    TiltDirection(u8),
    /// Tilt angles in degrees
    TiltAngle { x: i16, y: i16 },
    TiltCounters { x: i8, y: i8, z: i8 },
    Distance(u8),
    MotionCount(u32),
    ColorDistance { color: u8, distance: u8 },
    Rgb { r: u16, g: u16, b: u16 },
    /// Rotation since the previous report, in degrees
    AngleDelta(i8),
    CumulativeAngle(i32),
    Impact(u8),
    Acceleration(Vector3),
    AngularRate(Vector3),
    Orientation(Vector3),
    /// Degrees Celsius
    Temperature(f32),
    /// Floating point value as delivered by the WeDo value characteristic
    Scalar(f32),
    /// Payload in a format we do not know for this device type
    Raw(Vec<u8>),
}
