//! LEGO WeDo 2.0 protocol
//!
//! Unlike the newer hubs, WeDo spreads its traffic over four characteristics:
//! attach/detach events, sensor values, input mode configuration and output
//! commands. Sensor values always arrive as an IEEE float.

use crate::domain::commands::Command;
use crate::domain::catalog::device_type;
use crate::domain::events::{Event, SensorValue};
use crate::domain::models::ControllerFamily;
use crate::domain::ports::PortTable;
use crate::infrastructure::bluetooth::error::{DecodeError, EncodeError};
use crate::infrastructure::bluetooth::protocol::{
    require, unsupported, CharacteristicRole, CharacteristicSpec, FrameCodec, PendingWrite,
};

pub const HUB_SERVICE_UUID: &str = "00001523-1212-efde-1523-785feabcd123";
pub const PORT_EVENT_CHAR_UUID: &str = "00001527-1212-efde-1523-785feabcd123";
pub const IO_SERVICE_UUID: &str = "00004f0e-1212-efde-1523-785feabcd123";
pub const SENSOR_VALUE_CHAR_UUID: &str = "00001560-1212-efde-1523-785feabcd123";
pub const INPUT_FORMAT_CHAR_UUID: &str = "00001563-1212-efde-1523-785feabcd123";
pub const OUTPUT_CHAR_UUID: &str = "00001565-1212-efde-1523-785feabcd123";

const CHARACTERISTICS: &[CharacteristicSpec] = &[
    CharacteristicSpec {
        service_uuid: HUB_SERVICE_UUID,
        uuid: PORT_EVENT_CHAR_UUID,
        role: CharacteristicRole::PortEvents,
        notify: true,
        write: false,
    },
    CharacteristicSpec {
        service_uuid: IO_SERVICE_UUID,
        uuid: SENSOR_VALUE_CHAR_UUID,
        role: CharacteristicRole::SensorValues,
        notify: true,
        write: false,
    },
    CharacteristicSpec {
        service_uuid: IO_SERVICE_UUID,
        uuid: INPUT_FORMAT_CHAR_UUID,
        role: CharacteristicRole::ModeConfig,
        notify: false,
        write: true,
    },
    CharacteristicSpec {
        service_uuid: IO_SERVICE_UUID,
        uuid: OUTPUT_CHAR_UUID,
        role: CharacteristicRole::OutputCommand,
        notify: false,
        write: true,
    },
];

/// Port of the hub's RGB LED
pub const LED_PORT: u8 = 0x06;

const OUTPUT_MOTOR_POWER: u8 = 0x01;
const OUTPUT_LED_INDEX: u8 = 0x04;
const INPUT_FORMAT_COMMAND: [u8; 2] = [0x01, 0x02];
const UNIT_SI: u8 = 0x02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeDoCodec;

impl FrameCodec for WeDoCodec {
    fn family(&self) -> ControllerFamily {
        ControllerFamily::WeDo2
    }

    fn characteristics(&self) -> &'static [CharacteristicSpec] {
        CHARACTERISTICS
    }

    fn decode(
        &self,
        role: CharacteristicRole,
        v: &[u8],
        ports: &PortTable,
    ) -> Result<Event, DecodeError> {
        match role {
            // [port, event, _, device type, ...]
            CharacteristicRole::PortEvents => {
                require(v, 2)?;
                let port = v[0];
                match v[1] {
                    0 => Ok(Event::PortDetached { port }),
                    1 => {
                        require(v, 4)?;
                        Ok(Event::PortAttached {
                            port,
                            device_type: v[3],
                        })
                    }
                    event => Ok(Event::Unknown {
                        message_type: event as u16,
                        body: v.to_vec(),
                    }),
                }
            }
            // [_, port, f32 LE]
            CharacteristicRole::SensorValues => {
                require(v, 6)?;
                let port = v[1];
                match ports.device_type(port) {
                    Some(device) => Ok(Event::SensorReading {
                        port,
                        device_type: device,
                        value: SensorValue::Scalar(f32::from_le_bytes([v[2], v[3], v[4], v[5]])),
                    }),
                    None => Ok(Event::UnknownSensor {
                        port,
                        raw: v[2..].to_vec(),
                    }),
                }
            }
            other => Err(DecodeError::UnexpectedCharacteristic(other)),
        }
    }

    fn encode(&self, command: &Command, ports: &PortTable) -> Result<PendingWrite, EncodeError> {
        match *command {
            Command::MotorRun { port, speed } => Ok(PendingWrite::new(
                CharacteristicRole::OutputCommand,
                Some(port),
                vec![port, OUTPUT_MOTOR_POWER, 0x01, speed as u8],
            )),
            Command::SetLedColor { color } => Ok(PendingWrite::new(
                CharacteristicRole::OutputCommand,
                Some(LED_PORT),
                vec![LED_PORT, OUTPUT_LED_INDEX, 0x01, color],
            )),
            Command::SetPortMode {
                port,
                mode,
                delta,
                notify,
            } => {
                let device = ports
                    .device_type(port)
                    .ok_or(EncodeError::NoDeviceOnPort(port))?;
                let mut payload = INPUT_FORMAT_COMMAND.to_vec();
                payload.extend_from_slice(&[port, device, mode]);
                payload.extend_from_slice(&delta.to_le_bytes());
                payload.extend_from_slice(&[UNIT_SI, notify as u8]);
                Ok(PendingWrite::new(
                    CharacteristicRole::ModeConfig,
                    Some(port),
                    payload,
                ))
            }
            _ => Err(unsupported(command, ControllerFamily::WeDo2)),
        }
    }

    fn sensor_setup(&self, port: u8, device: u8) -> Vec<Command> {
        match device {
            device_type::WEDO_TILT_SENSOR | device_type::WEDO_MOTION_SENSOR => {
                vec![Command::set_mode(port, 0)]
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_events() {
        let codec = WeDoCodec;
        let ports = PortTable::new();
        assert_eq!(
            codec
                .decode(CharacteristicRole::PortEvents, &[0x01, 0x01, 0x00, 0x23], &ports)
                .unwrap(),
            Event::PortAttached {
                port: 1,
                device_type: device_type::WEDO_MOTION_SENSOR
            }
        );
        assert_eq!(
            codec
                .decode(CharacteristicRole::PortEvents, &[0x02, 0x00], &ports)
                .unwrap(),
            Event::PortDetached { port: 2 }
        );
        assert!(matches!(
            codec.decode(CharacteristicRole::PortEvents, &[0x01, 0x01], &ports),
            Err(DecodeError::TooShort { .. })
        ));
    }

    #[test]
    fn test_sensor_value_is_float() {
        let codec = WeDoCodec;
        let mut ports = PortTable::new();
        let mut value = vec![0x02, 0x01];
        value.extend_from_slice(&4.5f32.to_le_bytes());

        assert!(matches!(
            codec.decode(CharacteristicRole::SensorValues, &value, &ports),
            Ok(Event::UnknownSensor { port: 1, .. })
        ));

        ports.attach(1, device_type::WEDO_MOTION_SENSOR);
        assert_eq!(
            codec
                .decode(CharacteristicRole::SensorValues, &value, &ports)
                .unwrap(),
            Event::SensorReading {
                port: 1,
                device_type: device_type::WEDO_MOTION_SENSOR,
                value: SensorValue::Scalar(4.5)
            }
        );
    }

    #[test]
    fn test_output_commands() {
        let codec = WeDoCodec;
        let ports = PortTable::new();
        let motor = codec
            .encode(&Command::MotorRun { port: 1, speed: 100 }, &ports)
            .unwrap();
        assert_eq!(motor.role, CharacteristicRole::OutputCommand);
        assert_eq!(motor.payload, vec![0x01, 0x01, 0x01, 0x64]);

        let led = codec.encode(&Command::SetLedColor { color: 9 }, &ports).unwrap();
        assert_eq!(led.payload, vec![0x06, 0x04, 0x01, 0x09]);
    }

    #[test]
    fn test_mode_config_uses_attached_device() {
        let codec = WeDoCodec;
        let mut ports = PortTable::new();
        let command = Command::set_mode(1, 0);
        assert_eq!(
            codec.encode(&command, &ports),
            Err(EncodeError::NoDeviceOnPort(1))
        );

        ports.attach(1, device_type::WEDO_MOTION_SENSOR);
        let write = codec.encode(&command, &ports).unwrap();
        assert_eq!(write.role, CharacteristicRole::ModeConfig);
        assert_eq!(
            write.payload,
            vec![0x01, 0x02, 0x01, 0x23, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x01]
        );
    }

    #[test]
    fn test_unsupported_command() {
        let result = WeDoCodec.encode(
            &Command::MotorRunForTime {
                port: 1,
                speed: 50,
                millis: 100,
            },
            &PortTable::new(),
        );
        assert!(matches!(result, Err(EncodeError::Unsupported { .. })));
    }
}
