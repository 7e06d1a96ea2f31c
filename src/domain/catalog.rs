//! Human-readable names for the numeric codes the hubs use.

use crate::domain::events::{
    CommandStatus, Event, HubProperty, ModeInfo, PortInfo, SensorValue, WriteAck,
};
use std::fmt;

/// Device type codes reported in attach events
pub mod device_type {
    pub const MOTOR_M: u8 = 0x01;
    pub const TRAIN_MOTOR: u8 = 0x02;
    pub const BUTTON: u8 = 0x05;
    pub const LIGHT: u8 = 0x08;
    pub const VOLTAGE_SENSOR: u8 = 0x14;
    pub const CURRENT_SENSOR: u8 = 0x15;
    pub const PIEZO: u8 = 0x16;
    pub const RGB_LED: u8 = 0x17;
    pub const WEDO_TILT_SENSOR: u8 = 0x22;
    pub const WEDO_MOTION_SENSOR: u8 = 0x23;
    pub const WEDO_GENERIC_SENSOR: u8 = 0x24;
    pub const COLOR_DISTANCE_SENSOR: u8 = 0x25;
    pub const INTERACTIVE_MOTOR: u8 = 0x26;
    pub const BUILTIN_MOTOR: u8 = 0x27;
    pub const BUILTIN_TILT_SENSOR: u8 = 0x28;
    pub const POWERED_UP_MOTOR_L: u8 = 0x2e;
    pub const POWERED_UP_MOTOR_XL: u8 = 0x2f;
    pub const IMPACT_SENSOR: u8 = 0x36;
    pub const ACCELEROMETER: u8 = 0x39;
    pub const GYROSCOPE: u8 = 0x3a;
    pub const TILT_3AXIS: u8 = 0x3b;
    pub const THERMOMETER: u8 = 0x3c;
    pub const BOOST_UNKNOWN: u8 = 0x42;

    /// Motors that also report their rotation
    pub fn is_rotation_motor(device_type: u8) -> bool {
        matches!(
            device_type,
            INTERACTIVE_MOTOR | BUILTIN_MOTOR | POWERED_UP_MOTOR_L | POWERED_UP_MOTOR_XL
        )
    }
}

/// LED color indices shared by Boost and WeDo 2.0
pub mod color {
    pub const BLACK: u8 = 0;
    pub const PINK: u8 = 1;
    pub const PURPLE: u8 = 2;
    pub const BLUE: u8 = 3;
    pub const LIGHT_BLUE: u8 = 4;
    pub const LIGHT_GREEN: u8 = 5;
    pub const GREEN: u8 = 6;
    pub const YELLOW: u8 = 7;
    pub const ORANGE: u8 = 8;
    pub const RED: u8 = 9;
    pub const WHITE: u8 = 10;
    /// Reported by the color sensor when nothing is recognized
    pub const NONE: u8 = 0xff;
}

pub fn color_name(index: u8) -> Option<&'static str> {
    Some(match index {
        color::BLACK => "black",
        color::PINK => "pink",
        color::PURPLE => "purple",
        color::BLUE => "blue",
        color::LIGHT_BLUE => "light blue",
        color::LIGHT_GREEN => "light green",
        color::GREEN => "green",
        color::YELLOW => "yellow",
        color::ORANGE => "orange",
        color::RED => "red",
        color::WHITE => "white",
        color::NONE => "none",
        _ => return None,
    })
}

/// Color index by name; "off" is an alias for black
pub fn color_by_name(name: &str) -> Option<u8> {
    let name = name.trim().to_lowercase();
    if name == "off" {
        return Some(color::BLACK);
    }
    (0..=color::WHITE)
        .chain(std::iter::once(color::NONE))
        .find(|&index| color_name(index) == Some(name.as_str()))
}

pub fn port_name(port: u8) -> Option<&'static str> {
    Some(match port {
        0x00 => "A",
        0x01 => "B",
        0x02 => "C",
        0x03 => "D",
        0x10 => "A+B",
        0x32 => "LED",
        0x3a => "Int. tilt",
        0x3b => "Current",
        0x3c => "Voltage",
        0x3d => "CPU",
        0x46 => "Internal",
        0x60 => "Temperature",
        0x61 => "Accelerometer",
        0x62 => "Gyroscope",
        0x63 => "Angle",
        0x64 => "Impact sensor",
        _ => return None,
    })
}

pub fn device_name(code: u8) -> Option<&'static str> {
    use device_type::*;
    Some(match code {
        MOTOR_M => "Motor M",
        TRAIN_MOTOR => "Train motor",
        0x03 => "Turn",
        0x04 => "Power",
        BUTTON => "Button",
        0x06 => "Motor L",
        0x07 => "Motor X",
        LIGHT => "Light",
        0x09 => "Light 1",
        0x0a => "Light 2",
        VOLTAGE_SENSOR => "Voltage sensor",
        CURRENT_SENSOR => "Current sensor",
        PIEZO => "Piezo",
        RGB_LED => "RGB LED",
        WEDO_TILT_SENSOR => "WeDo 2.0 tilt sensor",
        WEDO_MOTION_SENSOR => "WeDo 2.0 motion sensor",
        WEDO_GENERIC_SENSOR => "WeDo 2.0 generic sensor",
        COLOR_DISTANCE_SENSOR => "Color and distance sensor",
        INTERACTIVE_MOTOR => "Boost interactive motor",
        BUILTIN_MOTOR => "Boost builtin motor",
        BUILTIN_TILT_SENSOR => "Boost builtin tilt sensor",
        POWERED_UP_MOTOR_L => "Powered Up motor L",
        POWERED_UP_MOTOR_XL => "Powered Up motor XL",
        IMPACT_SENSOR => "Impact sensor",
        ACCELEROMETER => "Accelerometer",
        GYROSCOPE => "Gyroscope",
        TILT_3AXIS => "Tilt",
        THERMOMETER => "Thermometer",
        BOOST_UNKNOWN => "Boost unknown device",
        _ => return None,
    })
}

/// Coarse tilt names; WeDo and Boost number their directions differently
pub fn tilt_name(device_type: u8, index: u8) -> Option<&'static str> {
    if device_type == device_type::WEDO_TILT_SENSOR {
        Some(match index {
            0 => "flat",
            3 => "backward",
            5 => "right",
            7 => "left",
            9 => "forward",
            _ => return None,
        })
    } else {
        Some(match index {
            0 => "flat",
            1 => "backward",
            2 => "forward",
            3 => "right",
            4 => "left",
            5 => "upside down",
            _ => return None,
        })
    }
}

pub fn impact_name(index: u8) -> Option<&'static str> {
    Some(match index {
        0 => "still",
        1 => "light hit",
        2 => "heavy hit/shake",
        3 => "shake",
        4 => "falling",
        _ => return None,
    })
}

struct PortLabel(u8);

impl fmt::Display for PortLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match port_name(self.0) {
            Some(name) => write!(f, "\"{}\"", name),
            None => write!(f, "{:#04x}", self.0),
        }
    }
}

struct DeviceLabel(u8);

impl fmt::Display for DeviceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match device_name(self.0) {
            Some(name) => write!(f, "\"{}\"", name),
            None => write!(f, "<unknown device id: {:#04x}>", self.0),
        }
    }
}

fn write_sensor(f: &mut fmt::Formatter<'_>, device_type: u8, value: &SensorValue) -> fmt::Result {
    match value {
        SensorValue::Voltage(v) => write!(f, "voltage: {}", v),
        SensorValue::Current(c) => write!(f, "current: {}", c),
        SensorValue::TiltDirection(t) => {
            write!(f, "tilt: {}", tilt_name(device_type, *t).unwrap_or("<unknown>"))
        }
        SensorValue::TiltAngle { x, y } => write!(f, "tilt X/Y: {}°/{}°", x, y),
        SensorValue::TiltCounters { x, y, z } => write!(f, "counter x/y/z: {} {} {}", x, y, z),
        SensorValue::Distance(d) => write!(f, "distance: {}", d),
        SensorValue::MotionCount(n) => write!(f, "motion events: {}", n),
        SensorValue::ColorDistance { color, distance } => write!(
            f,
            "color: {}, distance: {}",
            color_name(*color).unwrap_or("<unknown>"),
            distance
        ),
        SensorValue::Rgb { r, g, b } => write!(f, "color RGB: {} {} {}", r, g, b),
        SensorValue::AngleDelta(a) => write!(f, "motor angle since last report: {}", a),
        SensorValue::CumulativeAngle(a) => write!(f, "cumulative motor angle: {}", a),
        SensorValue::Impact(i) => write!(f, "impact: {}", impact_name(*i).unwrap_or("<unknown>")),
        SensorValue::Acceleration(v) => write!(f, "acceleration X/Y/Z: {} {} {}", v.x, v.y, v.z),
        SensorValue::AngularRate(v) => write!(f, "gyroscope X/Y/Z: {} {} {}", v.x, v.y, v.z),
        SensorValue::Orientation(v) => write!(f, "tilt X/Y/Z: {} {} {}", v.x, v.y, v.z),
        SensorValue::Temperature(t) => write!(f, "temperature: {:3.1}°C", t),
        SensorValue::Scalar(v) => write!(f, "value: {}", v),
        SensorValue::Raw(raw) => write!(f, "unknown format: {:02X?}", raw),
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::PortAttached { port, device_type } => write!(
                f,
                "Port {}: device connected: {}",
                PortLabel(*port),
                DeviceLabel(*device_type)
            ),
            Event::PortDetached { port } => write!(f, "Port {}: device disconnected", PortLabel(*port)),
            Event::PortsCoupled {
                port,
                device_type,
                port_a,
                port_b,
            } => write!(
                f,
                "Port {}: devices coupled: {} on ports {} and {}",
                PortLabel(*port),
                DeviceLabel(*device_type),
                PortLabel(*port_a),
                PortLabel(*port_b)
            ),
            Event::SensorReading {
                port,
                device_type,
                value,
            } => {
                write!(f, "Port {}: ", PortLabel(*port))?;
                write_sensor(f, *device_type, value)
            }
            Event::UnknownSensor { port, raw } => {
                write!(f, "Port {}: unknown sensor: {:02X?}", PortLabel(*port), raw)
            }
            Event::WriteAck(WriteAck::ModeSet { port }) => {
                write!(f, "Port {}: sensor configuration acknowledged", PortLabel(*port))
            }
            Event::WriteAck(WriteAck::Command { port, status }) => {
                write!(f, "Port {}: ", PortLabel(*port))?;
                match status {
                    CommandStatus::Started => write!(f, "command started"),
                    CommandStatus::AlreadyRunning => write!(f, "command already running"),
                    CommandStatus::Completed => write!(f, "command completed"),
                    CommandStatus::Other(code) => write!(f, "unknown command status {}", code),
                }
            }
            Event::HubProperty(HubProperty::Name(name)) => write!(f, "Hub name: {}", name),
            Event::HubProperty(HubProperty::Button(pressed)) => {
                write!(f, "Hub button pressed: {}", pressed)
            }
            Event::HubProperty(HubProperty::Other { property, raw }) => {
                write!(f, "Hub property {:#04x}: {:02X?}", property, raw)
            }
            Event::PortInfo { port, info } => {
                write!(f, "Port {}: ", PortLabel(*port))?;
                match info {
                    PortInfo::Modes {
                        capabilities,
                        mode_count,
                        input_modes,
                        output_modes,
                    } => write!(
                        f,
                        "mode info {:?}, #modes: {}, input: {:#06x}, output: {:#06x}",
                        capabilities, mode_count, input_modes, output_modes
                    ),
                    PortInfo::Other { info_type, raw } => {
                        write!(f, "unsupported info type {:#04x}: {:02X?}", info_type, raw)
                    }
                }
            }
            Event::PortModeInfo { port, mode, info } => {
                write!(f, "Port {}: mode {}: ", PortLabel(*port), mode)?;
                match info {
                    ModeInfo::Name(name) => write!(f, "name: {}", name),
                    ModeInfo::RawRange { min, max } => write!(f, "raw min: {} max: {}", min, max),
                    ModeInfo::PercentRange { min, max } => {
                        write!(f, "pct min: {} max: {}", min, max)
                    }
                    ModeInfo::SiRange { min, max } => write!(f, "si min: {} max: {}", min, max),
                    ModeInfo::Symbol(symbol) => write!(f, "symbol: {}", symbol),
                    ModeInfo::Other { info_type, raw } => {
                        write!(f, "unknown information type {:#04x}: {:02X?}", info_type, raw)
                    }
                }
            }
            Event::ErrorNotification { payload } => write!(f, "Error event: {:02X?}", payload),
            Event::InputValue { input, raw } => write!(f, "Input I{}: {}", input, raw),
            Event::Unknown { message_type, body } => {
                write!(f, "Unknown event {:#06x}, data: {:02X?}", message_type, body)
            }
        }
    }
}
