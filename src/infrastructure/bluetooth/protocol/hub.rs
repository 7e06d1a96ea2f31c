//! LEGO Boost / Powered Up hub protocol
//!
//! Everything travels over a single characteristic as length-prefixed frames:
//!
//! ```text
//! [0]     : total frame length, including this byte
//! [1-2]   : message type (u16 big-endian)
//! [3..]   : body, layout depends on the message type
//! ```
//!
//! Early Move Hub firmware ("classic") lays out a few commands differently
//! from the later hubs; see [`HubDialect`].

use crate::domain::catalog::{color, device_type};
use crate::domain::commands::{hub_property, Command};
use crate::domain::events::{
    CommandStatus, Event, HubProperty, ModeInfo, PortCapabilities, PortInfo, SensorValue,
    Vector3, WriteAck,
};
use crate::domain::models::{ControllerFamily, HubDialect};
use crate::domain::ports::PortTable;
use crate::infrastructure::bluetooth::error::{DecodeError, EncodeError};
use crate::infrastructure::bluetooth::protocol::{
    require, unsupported, CharacteristicRole, CharacteristicSpec, FrameCodec, PendingWrite,
};

pub const SERVICE_UUID: &str = "00001623-1212-efde-1623-785feabcd123";
pub const STREAM_CHAR_UUID: &str = "00001624-1212-efde-1623-785feabcd123";

const CHARACTERISTICS: &[CharacteristicSpec] = &[CharacteristicSpec {
    service_uuid: SERVICE_UUID,
    uuid: STREAM_CHAR_UUID,
    role: CharacteristicRole::HubStream,
    notify: true,
    write: true,
}];

pub mod message_type {
    pub const HUB_PROPERTY: u16 = 0x01;
    pub const PORT_EVENT: u16 = 0x04;
    pub const ERROR: u16 = 0x05;
    pub const PORT_INFO_REQUEST: u16 = 0x21;
    pub const PORT_MODE_INFO_REQUEST: u16 = 0x22;
    pub const PORT_MODE_SET: u16 = 0x41;
    pub const PORT_INFO: u16 = 0x43;
    pub const PORT_MODE_INFO: u16 = 0x44;
    pub const SENSOR_VALUE: u16 = 0x45;
    pub const PORT_MODE_ACK: u16 = 0x47;
    pub const OUTPUT: u16 = 0x81;
    pub const OUTPUT_ACK: u16 = 0x82;
}

/// Group port of the A+B motor pair, target of the synchronous commands
pub const DUAL_MOTOR_PORT: u8 = 0x39;
pub const LED_PORT: u8 = 0x32;

const PORT_INFO_MODES: u8 = 0x01;

const OUTPUT_EXECUTE_IMMEDIATELY: u8 = 0x11;
const OUTPUT_START_SPEED: u8 = 0x01;
const OUTPUT_SPEED_FOR_TIME: u8 = 0x09;
const OUTPUT_SPEED_FOR_TIME_DUAL: u8 = 0x0a;
const OUTPUT_SPEED_FOR_DEGREES: u8 = 0x0b;
const OUTPUT_SPEED_FOR_DEGREES_DUAL: u8 = 0x0c;
const OUTPUT_LED_COLOR: u8 = 0x51;

const MAX_POWER: u8 = 100;
const END_STATE_HOLD: u8 = 0x7f;
const USE_PROFILES: u8 = 0x03;

/// A received frame whose length byte checked out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub message_type: u16,
    pub body: &'a [u8],
}

impl<'a> Frame<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self, DecodeError> {
        let header_len = bytes.first().copied().unwrap_or(0);
        if bytes.len() < 3 || header_len as usize != bytes.len() {
            return Err(DecodeError::LengthMismatch {
                header_len,
                actual_len: bytes.len(),
            });
        }
        Ok(Frame {
            message_type: u16::from_be_bytes([bytes[1], bytes[2]]),
            body: &bytes[3..],
        })
    }
}

pub fn encode_frame(message_type: u16, body: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(body.len() + 3);
    frame.push((body.len() + 3) as u8);
    frame.extend_from_slice(&message_type.to_be_bytes());
    frame.extend_from_slice(body);
    frame
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HubCodec {
    pub dialect: HubDialect,
}

impl HubCodec {
    pub fn new(dialect: HubDialect) -> Self {
        Self { dialect }
    }

    fn body(&self, command: &Command) -> Result<(u16, Vec<u8>), EncodeError> {
        let body = match *command {
            Command::SetHubProperty {
                property,
                operation,
            } => {
                let mut body = vec![property, operation];
                if self.dialect == HubDialect::Classic && property == hub_property::NAME {
                    body.push(0x00);
                }
                (message_type::HUB_PROPERTY, body)
            }
            Command::SetPortMode {
                port,
                mode,
                delta,
                notify,
            } => {
                let mut body = vec![port, mode];
                match self.dialect {
                    HubDialect::Classic => {
                        body.push(notify as u8);
                        body.extend_from_slice(&delta.to_be_bytes());
                    }
                    HubDialect::PoweredUp => {
                        body.extend_from_slice(&delta.to_le_bytes());
                        body.push(notify as u8);
                    }
                }
                (message_type::PORT_MODE_SET, body)
            }
            Command::SetLedColor { color } => {
                let mut body = vec![LED_PORT, OUTPUT_EXECUTE_IMMEDIATELY, OUTPUT_LED_COLOR];
                body.extend_from_slice(&(color as u16).to_be_bytes());
                (message_type::OUTPUT, body)
            }
            Command::MotorRun { port, speed } => (
                message_type::OUTPUT,
                vec![port, OUTPUT_EXECUTE_IMMEDIATELY, OUTPUT_START_SPEED, speed as u8],
            ),
            Command::MotorRunForTime {
                port,
                speed,
                millis,
            } => {
                let mut body = vec![port, OUTPUT_EXECUTE_IMMEDIATELY, OUTPUT_SPEED_FOR_TIME];
                body.extend_from_slice(&millis.to_le_bytes());
                body.extend_from_slice(&[speed as u8, MAX_POWER, END_STATE_HOLD, USE_PROFILES]);
                (message_type::OUTPUT, body)
            }
            Command::DualMotorRunForTime {
                speed_a,
                speed_b,
                millis,
            } => {
                let mut body = vec![
                    DUAL_MOTOR_PORT,
                    OUTPUT_EXECUTE_IMMEDIATELY,
                    OUTPUT_SPEED_FOR_TIME_DUAL,
                ];
                body.extend_from_slice(&millis.to_le_bytes());
                body.extend_from_slice(&[
                    speed_a as u8,
                    speed_b as u8,
                    MAX_POWER,
                    END_STATE_HOLD,
                    USE_PROFILES,
                ]);
                (message_type::OUTPUT, body)
            }
            Command::MotorRunForAngle {
                port,
                speed,
                degrees,
            } => {
                let mut body = vec![port, OUTPUT_EXECUTE_IMMEDIATELY, OUTPUT_SPEED_FOR_DEGREES];
                body.extend_from_slice(&degrees.to_le_bytes());
                body.extend_from_slice(&[speed as u8, MAX_POWER, END_STATE_HOLD, USE_PROFILES]);
                (message_type::OUTPUT, body)
            }
            Command::DualMotorRunForAngle {
                speed_a,
                speed_b,
                degrees,
            } => {
                let mut body = vec![
                    DUAL_MOTOR_PORT,
                    OUTPUT_EXECUTE_IMMEDIATELY,
                    OUTPUT_SPEED_FOR_DEGREES_DUAL,
                ];
                body.extend_from_slice(&degrees.to_le_bytes());
                body.extend_from_slice(&[
                    speed_a as u8,
                    speed_b as u8,
                    MAX_POWER,
                    END_STATE_HOLD,
                    USE_PROFILES,
                ]);
                (message_type::OUTPUT, body)
            }
            Command::RequestPortInformation { port } => {
                (message_type::PORT_INFO_REQUEST, vec![port, PORT_INFO_MODES])
            }
            Command::RequestPortModeInformation {
                port,
                mode,
                info_type,
            } => (
                message_type::PORT_MODE_INFO_REQUEST,
                vec![port, mode, info_type],
            ),
            Command::SetChannel { .. } => {
                return Err(unsupported(command, ControllerFamily::LegoHub))
            }
        };
        Ok(body)
    }
}

impl FrameCodec for HubCodec {
    fn family(&self) -> ControllerFamily {
        ControllerFamily::LegoHub
    }

    fn characteristics(&self) -> &'static [CharacteristicSpec] {
        CHARACTERISTICS
    }

    fn decode(
        &self,
        role: CharacteristicRole,
        bytes: &[u8],
        ports: &PortTable,
    ) -> Result<Event, DecodeError> {
        if role != CharacteristicRole::HubStream {
            return Err(DecodeError::UnexpectedCharacteristic(role));
        }
        decode_frame(bytes, ports)
    }

    fn encode(&self, command: &Command, _ports: &PortTable) -> Result<PendingWrite, EncodeError> {
        let (message_type, body) = self.body(command)?;
        Ok(PendingWrite::new(
            CharacteristicRole::HubStream,
            command.port(),
            encode_frame(message_type, &body),
        ))
    }

    fn init_commands(&self) -> Vec<Command> {
        vec![
            Command::SetHubProperty {
                property: hub_property::BUTTON,
                operation: hub_property::ENABLE_UPDATES,
            },
            Command::SetLedColor {
                color: color::ORANGE,
            },
            Command::SetHubProperty {
                property: hub_property::NAME,
                operation: hub_property::ENABLE_UPDATES,
            },
        ]
    }

    fn sensor_setup(&self, port: u8, device: u8) -> Vec<Command> {
        use device_type::*;
        let mode = match device {
            VOLTAGE_SENSOR | CURRENT_SENSOR => {
                // these report too often with a delta of 1
                let delta = match self.dialect {
                    HubDialect::PoweredUp => 1000,
                    HubDialect::Classic => 1,
                };
                return vec![Command::SetPortMode {
                    port,
                    mode: 0,
                    delta,
                    notify: true,
                }];
            }
            WEDO_TILT_SENSOR => 0,
            WEDO_MOTION_SENSOR => 1,
            COLOR_DISTANCE_SENSOR => 8,
            INTERACTIVE_MOTOR | POWERED_UP_MOTOR_L | POWERED_UP_MOTOR_XL => 2,
            BUILTIN_MOTOR => 1,
            BUILTIN_TILT_SENSOR => 0,
            IMPACT_SENSOR | ACCELEROMETER | GYROSCOPE | TILT_3AXIS | THERMOMETER
            | BOOST_UNKNOWN => 0,
            _ => return Vec::new(),
        };
        vec![Command::set_mode(port, mode)]
    }

    fn supports_port_information(&self) -> bool {
        true
    }
}

fn decode_frame(v: &[u8], ports: &PortTable) -> Result<Event, DecodeError> {
    let frame = Frame::parse(v)?;

    let event = match frame.message_type {
        message_type::HUB_PROPERTY => {
            require(v, 4)?;
            let property = v[3];
            let value = match property {
                hub_property::NAME => {
                    require(v, 5)?;
                    HubProperty::Name(text(&v[5..]))
                }
                hub_property::BUTTON => {
                    require(v, 6)?;
                    HubProperty::Button(v[5] != 0)
                }
                _ => HubProperty::Other {
                    property,
                    raw: v[4..].to_vec(),
                },
            };
            Event::HubProperty(value)
        }
        message_type::PORT_EVENT => {
            require(v, 5)?;
            let port = v[3];
            match v[4] {
                0 => Event::PortDetached { port },
                1 => {
                    require(v, 6)?;
                    Event::PortAttached {
                        port,
                        device_type: v[5],
                    }
                }
                2 => {
                    require(v, 9)?;
                    Event::PortsCoupled {
                        port,
                        device_type: v[5],
                        port_a: v[7],
                        port_b: v[8],
                    }
                }
                _ => Event::Unknown {
                    message_type: frame.message_type,
                    body: frame.body.to_vec(),
                },
            }
        }
        message_type::ERROR => Event::ErrorNotification {
            payload: frame.body.to_vec(),
        },
        message_type::PORT_INFO => {
            require(v, 5)?;
            let port = v[3];
            let info_type = v[4];
            let info = if info_type == PORT_INFO_MODES {
                require(v, 11)?;
                PortInfo::Modes {
                    capabilities: PortCapabilities::from_bits_truncate(v[5]),
                    mode_count: v[6],
                    input_modes: u16::from_le_bytes([v[7], v[8]]),
                    output_modes: u16::from_le_bytes([v[9], v[10]]),
                }
            } else {
                PortInfo::Other {
                    info_type,
                    raw: v[5..].to_vec(),
                }
            };
            Event::PortInfo { port, info }
        }
        message_type::PORT_MODE_INFO => {
            require(v, 6)?;
            let (port, mode, info_type) = (v[3], v[4], v[5]);
            let info = match info_type {
                0x00 => ModeInfo::Name(text(&v[6..])),
                0x01..=0x03 => {
                    require(v, 14)?;
                    let min = f32::from_le_bytes([v[6], v[7], v[8], v[9]]);
                    let max = f32::from_le_bytes([v[10], v[11], v[12], v[13]]);
                    match info_type {
                        0x01 => ModeInfo::RawRange { min, max },
                        0x02 => ModeInfo::PercentRange { min, max },
                        _ => ModeInfo::SiRange { min, max },
                    }
                }
                0x04 => ModeInfo::Symbol(text(&v[6..])),
                _ => ModeInfo::Other {
                    info_type,
                    raw: v[6..].to_vec(),
                },
            };
            Event::PortModeInfo { port, mode, info }
        }
        message_type::SENSOR_VALUE => {
            require(v, 4)?;
            let port = v[3];
            let value = &v[4..];
            match ports.device_type(port) {
                Some(device) => Event::SensorReading {
                    port,
                    device_type: device,
                    value: sensor_value(device, value),
                },
                None => Event::UnknownSensor {
                    port,
                    raw: value.to_vec(),
                },
            }
        }
        message_type::PORT_MODE_ACK => {
            require(v, 4)?;
            Event::WriteAck(WriteAck::ModeSet { port: v[3] })
        }
        message_type::OUTPUT_ACK => {
            require(v, 5)?;
            Event::WriteAck(WriteAck::Command {
                port: v[3],
                status: CommandStatus::from_code(v[4]),
            })
        }
        other => Event::Unknown {
            message_type: other,
            body: frame.body.to_vec(),
        },
    };
    Ok(event)
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\0')
        .to_string()
}

fn vector3(v: &[u8]) -> Vector3 {
    Vector3 {
        x: i16::from_le_bytes([v[0], v[1]]),
        y: i16::from_le_bytes([v[2], v[3]]),
        z: i16::from_le_bytes([v[4], v[5]]),
    }
}

/// Interprets a sensor payload by the device on the port
pub fn sensor_value(device: u8, v: &[u8]) -> SensorValue {
    use device_type::*;
    match (device, v.len()) {
        (VOLTAGE_SENSOR, 2) => SensorValue::Voltage(u16::from_le_bytes([v[0], v[1]])),
        (CURRENT_SENSOR, 2) => SensorValue::Current(u16::from_le_bytes([v[0], v[1]])),
        (WEDO_TILT_SENSOR, 1) => SensorValue::TiltDirection(v[0]),
        // WeDo reports angles in 2° steps
        (WEDO_TILT_SENSOR, 2) => SensorValue::TiltAngle {
            x: (v[0] as i8) as i16 * 2,
            y: (v[1] as i8) as i16 * 2,
        },
        (WEDO_TILT_SENSOR, 3) => SensorValue::TiltCounters {
            x: v[0] as i8,
            y: v[1] as i8,
            z: v[2] as i8,
        },
        (WEDO_MOTION_SENSOR, 1) => SensorValue::Distance(v[0]),
        (WEDO_MOTION_SENSOR, 4) => {
            SensorValue::MotionCount(u32::from_le_bytes([v[0], v[1], v[2], v[3]]))
        }
        (COLOR_DISTANCE_SENSOR, 4) => SensorValue::ColorDistance {
            color: v[0],
            distance: v[1],
        },
        (COLOR_DISTANCE_SENSOR, 6) => SensorValue::Rgb {
            r: u16::from_le_bytes([v[0], v[1]]),
            g: u16::from_le_bytes([v[2], v[3]]),
            b: u16::from_le_bytes([v[4], v[5]]),
        },
        (d, 1) if is_rotation_motor(d) => SensorValue::AngleDelta(v[0] as i8),
        (d, 4) if is_rotation_motor(d) => {
            SensorValue::CumulativeAngle(i32::from_le_bytes([v[0], v[1], v[2], v[3]]))
        }
        (BUILTIN_TILT_SENSOR, 1) => SensorValue::TiltDirection(v[0]),
        (BUILTIN_TILT_SENSOR, 2) => SensorValue::TiltAngle {
            x: (v[0] as i8) as i16,
            y: (v[1] as i8) as i16,
        },
        (IMPACT_SENSOR, 1) => SensorValue::Impact(v[0]),
        (ACCELEROMETER, 6) => SensorValue::Acceleration(vector3(v)),
        (GYROSCOPE, 6) => SensorValue::AngularRate(vector3(v)),
        (TILT_3AXIS, 6) => SensorValue::Orientation(vector3(v)),
        (THERMOMETER, 2) => {
            SensorValue::Temperature(i16::from_le_bytes([v[0], v[1]]) as f32 / 10.0)
        }
        _ => SensorValue::Raw(v.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::commands::mode_info;

    fn decode(bytes: &[u8], ports: &PortTable) -> Result<Event, DecodeError> {
        HubCodec::default().decode(CharacteristicRole::HubStream, bytes, ports)
    }

    fn encode(dialect: HubDialect, command: Command) -> Vec<u8> {
        HubCodec::new(dialect)
            .encode(&command, &PortTable::new())
            .unwrap()
            .payload
    }

    #[test]
    fn test_attach_frame() {
        let event = decode(&[0x06, 0x00, 0x04, 0x02, 0x01, 0x01], &PortTable::new()).unwrap();
        assert_eq!(
            event,
            Event::PortAttached {
                port: 2,
                device_type: 1
            }
        );
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let err = decode(&[0x07, 0x00, 0x04, 0x02, 0x01, 0x01], &PortTable::new()).unwrap_err();
        assert_eq!(
            err,
            DecodeError::LengthMismatch {
                header_len: 7,
                actual_len: 6
            }
        );
        assert!(matches!(
            decode(&[0x02, 0x00], &PortTable::new()),
            Err(DecodeError::LengthMismatch { .. })
        ));
        assert!(decode(&[], &PortTable::new()).is_err());
    }

    #[test]
    fn test_short_body_is_rejected() {
        let err = decode(&[0x04, 0x00, 0x04, 0x02], &PortTable::new()).unwrap_err();
        assert_eq!(
            err,
            DecodeError::TooShort {
                expected: 5,
                actual: 4
            }
        );
    }

    #[test]
    fn test_detach_and_coupled() {
        let ports = PortTable::new();
        assert_eq!(
            decode(&[0x05, 0x00, 0x04, 0x01, 0x00], &ports).unwrap(),
            Event::PortDetached { port: 1 }
        );
        assert_eq!(
            decode(&[0x09, 0x00, 0x04, 0x10, 0x02, 0x27, 0x00, 0x00, 0x01], &ports).unwrap(),
            Event::PortsCoupled {
                port: 0x10,
                device_type: 0x27,
                port_a: 0,
                port_b: 1
            }
        );
    }

    #[test]
    fn test_sensor_value_needs_known_port() {
        let mut ports = PortTable::new();
        let frame = [0x08, 0x00, 0x45, 0x01, 0x06, 0x03, 0x00, 0x00];
        assert_eq!(
            decode(&frame, &ports).unwrap(),
            Event::UnknownSensor {
                port: 1,
                raw: vec![0x06, 0x03, 0x00, 0x00]
            }
        );

        ports.attach(1, device_type::COLOR_DISTANCE_SENSOR);
        assert_eq!(
            decode(&frame, &ports).unwrap(),
            Event::SensorReading {
                port: 1,
                device_type: device_type::COLOR_DISTANCE_SENSOR,
                value: SensorValue::ColorDistance {
                    color: 6,
                    distance: 3
                }
            }
        );
    }

    #[test]
    fn test_sensor_interpretation() {
        use device_type::*;
        assert_eq!(
            sensor_value(INTERACTIVE_MOTOR, &[0x68, 0x01, 0x00, 0x00]),
            SensorValue::CumulativeAngle(360)
        );
        assert_eq!(
            sensor_value(BUILTIN_MOTOR, &[0xfb]),
            SensorValue::AngleDelta(-5)
        );
        assert_eq!(
            sensor_value(WEDO_TILT_SENSOR, &[0x05, 0xfd]),
            SensorValue::TiltAngle { x: 10, y: -6 }
        );
        assert_eq!(
            sensor_value(THERMOMETER, &[0xeb, 0x00]),
            SensorValue::Temperature(23.5)
        );
        assert_eq!(
            sensor_value(ACCELEROMETER, &[0x01, 0x00, 0xff, 0xff, 0x00, 0x10]),
            SensorValue::Acceleration(Vector3 {
                x: 1,
                y: -1,
                z: 4096
            })
        );
        // unexpected length passes through untouched
        assert_eq!(
            sensor_value(COLOR_DISTANCE_SENSOR, &[0x01, 0x02, 0x03]),
            SensorValue::Raw(vec![0x01, 0x02, 0x03])
        );
        assert_eq!(sensor_value(0x77, &[0x01]), SensorValue::Raw(vec![0x01]));
    }

    #[test]
    fn test_port_and_mode_info() {
        let ports = PortTable::new();
        let info = decode(
            &[0x0b, 0x00, 0x43, 0x00, 0x01, 0x0f, 0x03, 0x06, 0x00, 0x01, 0x00],
            &ports,
        )
        .unwrap();
        assert_eq!(
            info,
            Event::PortInfo {
                port: 0,
                info: PortInfo::Modes {
                    capabilities: PortCapabilities::all(),
                    mode_count: 3,
                    input_modes: 0x0006,
                    output_modes: 0x0001,
                }
            }
        );

        let name = decode(
            &[0x0d, 0x00, 0x44, 0x00, 0x01, mode_info::NAME, b'S', b'P', b'E', b'E', b'D', 0, 0],
            &ports,
        )
        .unwrap();
        assert_eq!(
            name,
            Event::PortModeInfo {
                port: 0,
                mode: 1,
                info: ModeInfo::Name("SPEED".to_string())
            }
        );

        let mut range = vec![0x0e, 0x00, 0x44, 0x00, 0x01, mode_info::PERCENT_RANGE];
        range.extend_from_slice(&(-100.0f32).to_le_bytes());
        range.extend_from_slice(&100.0f32.to_le_bytes());
        assert_eq!(
            decode(&range, &ports).unwrap(),
            Event::PortModeInfo {
                port: 0,
                mode: 1,
                info: ModeInfo::PercentRange {
                    min: -100.0,
                    max: 100.0
                }
            }
        );
    }

    #[test]
    fn test_acks_and_properties() {
        let ports = PortTable::new();
        assert_eq!(
            decode(&[0x05, 0x00, 0x82, 0x00, 0x0a], &ports).unwrap(),
            Event::WriteAck(WriteAck::Command {
                port: 0,
                status: CommandStatus::Completed
            })
        );
        assert_eq!(
            decode(&[0x04, 0x00, 0x47, 0x01], &ports).unwrap(),
            Event::WriteAck(WriteAck::ModeSet { port: 1 })
        );
        assert_eq!(
            decode(&[0x06, 0x00, 0x01, 0x02, 0x06, 0x01], &ports).unwrap(),
            Event::HubProperty(HubProperty::Button(true))
        );
        assert_eq!(
            decode(&[0x09, 0x00, 0x01, 0x01, 0x06, b'M', b'o', b'v', b'e'], &ports).unwrap(),
            Event::HubProperty(HubProperty::Name("Move".to_string()))
        );
        assert_eq!(
            decode(&[0x05, 0x00, 0x05, 0x01, 0x05], &ports).unwrap(),
            Event::ErrorNotification {
                payload: vec![0x01, 0x05]
            }
        );
        assert_eq!(
            decode(&[0x04, 0x00, 0x99, 0x42], &ports).unwrap(),
            Event::Unknown {
                message_type: 0x99,
                body: vec![0x42]
            }
        );
    }

    #[test]
    fn test_output_commands() {
        assert_eq!(
            encode(HubDialect::PoweredUp, Command::SetLedColor { color: color::ORANGE }),
            vec![0x08, 0x00, 0x81, 0x32, 0x11, 0x51, 0x00, 0x08]
        );
        assert_eq!(
            encode(HubDialect::PoweredUp, Command::MotorRun { port: 1, speed: -25 }),
            vec![0x07, 0x00, 0x81, 0x01, 0x11, 0x01, 0xe7]
        );
        assert_eq!(
            encode(
                HubDialect::PoweredUp,
                Command::MotorRunForTime {
                    port: 0,
                    speed: 50,
                    millis: 1500
                }
            ),
            vec![0x0c, 0x00, 0x81, 0x00, 0x11, 0x09, 0xdc, 0x05, 0x32, 0x64, 0x7f, 0x03]
        );
        assert_eq!(
            encode(
                HubDialect::PoweredUp,
                Command::DualMotorRunForTime {
                    speed_a: 50,
                    speed_b: -50,
                    millis: 1000
                }
            ),
            vec![0x0d, 0x00, 0x81, 0x39, 0x11, 0x0a, 0xe8, 0x03, 0x32, 0xce, 0x64, 0x7f, 0x03]
        );
        assert_eq!(
            encode(
                HubDialect::PoweredUp,
                Command::MotorRunForAngle {
                    port: 2,
                    speed: -30,
                    degrees: -90
                }
            ),
            vec![0x0e, 0x00, 0x81, 0x02, 0x11, 0x0b, 0xa6, 0xff, 0xff, 0xff, 0xe2, 0x64, 0x7f, 0x03]
        );
        assert_eq!(
            encode(
                HubDialect::PoweredUp,
                Command::DualMotorRunForAngle {
                    speed_a: 20,
                    speed_b: 20,
                    degrees: 360
                }
            ),
            vec![
                0x0f, 0x00, 0x81, 0x39, 0x11, 0x0c, 0x68, 0x01, 0x00, 0x00, 0x14, 0x14, 0x64,
                0x7f, 0x03
            ]
        );
    }

    #[test]
    fn test_port_mode_per_dialect() {
        let command = Command::SetPortMode {
            port: 1,
            mode: 0,
            delta: 1000,
            notify: true,
        };
        assert_eq!(
            encode(HubDialect::PoweredUp, command.clone()),
            vec![0x0a, 0x00, 0x41, 0x01, 0x00, 0xe8, 0x03, 0x00, 0x00, 0x01]
        );
        assert_eq!(
            encode(HubDialect::Classic, command),
            vec![0x0a, 0x00, 0x41, 0x01, 0x00, 0x01, 0x00, 0x00, 0x03, 0xe8]
        );
    }

    #[test]
    fn test_name_request_per_dialect() {
        let command = Command::SetHubProperty {
            property: hub_property::NAME,
            operation: hub_property::ENABLE_UPDATES,
        };
        assert_eq!(
            encode(HubDialect::PoweredUp, command.clone()),
            vec![0x05, 0x00, 0x01, 0x01, 0x02]
        );
        assert_eq!(
            encode(HubDialect::Classic, command),
            vec![0x06, 0x00, 0x01, 0x01, 0x02, 0x00]
        );
    }

    #[test]
    fn test_information_requests() {
        assert_eq!(
            encode(HubDialect::PoweredUp, Command::RequestPortInformation { port: 3 }),
            vec![0x05, 0x00, 0x21, 0x03, 0x01]
        );
        assert_eq!(
            encode(
                HubDialect::PoweredUp,
                Command::RequestPortModeInformation {
                    port: 3,
                    mode: 2,
                    info_type: mode_info::SYMBOL
                }
            ),
            vec![0x06, 0x00, 0x22, 0x03, 0x02, 0x04]
        );
    }

    #[test]
    fn test_channel_is_unsupported() {
        let result = HubCodec::default().encode(&Command::SetChannel { value: 1 }, &PortTable::new());
        assert!(matches!(result, Err(EncodeError::Unsupported { .. })));
    }

    #[test]
    fn test_sensor_setup_delta_depends_on_dialect() {
        let powered_up = HubCodec::new(HubDialect::PoweredUp);
        let classic = HubCodec::new(HubDialect::Classic);
        assert_eq!(
            powered_up.sensor_setup(0x3c, device_type::VOLTAGE_SENSOR),
            vec![Command::SetPortMode {
                port: 0x3c,
                mode: 0,
                delta: 1000,
                notify: true
            }]
        );
        assert_eq!(
            classic.sensor_setup(0x3c, device_type::VOLTAGE_SENSOR),
            vec![Command::set_mode(0x3c, 0)]
        );
        assert_eq!(
            classic.sensor_setup(1, device_type::COLOR_DISTANCE_SENSOR),
            vec![Command::set_mode(1, 8)]
        );
        assert!(classic.sensor_setup(0x32, device_type::RGB_LED).is_empty());
    }

    #[test]
    fn test_init_commands() {
        let init = HubCodec::default().init_commands();
        assert_eq!(init.len(), 3);
        assert_eq!(init[1], Command::SetLedColor { color: color::ORANGE });
    }
}
