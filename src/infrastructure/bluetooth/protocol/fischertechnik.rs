//! fischertechnik BT Smart Controller and BT Control Receiver
//!
//! No framing at all: each output and input has its own characteristic and
//! carries a single value.

use crate::domain::commands::Command;
use crate::domain::events::Event;
use crate::domain::models::ControllerFamily;
use crate::domain::ports::PortTable;
use crate::infrastructure::bluetooth::error::{DecodeError, EncodeError};
use crate::infrastructure::bluetooth::protocol::{
    require, unsupported, CharacteristicRole, CharacteristicSpec, FrameCodec, PendingWrite,
};

const SMART_CONTROLLER: &[CharacteristicSpec] = &[
    CharacteristicSpec {
        service_uuid: "8ae87702-ad7d-11e6-80f5-76304dec7eb7",
        uuid: "8ae87e32-ad7d-11e6-80f5-76304dec7eb7",
        role: CharacteristicRole::Channel,
        notify: false,
        write: true,
    },
    CharacteristicSpec {
        service_uuid: "8ae8952a-ad7d-11e6-80f5-76304dec7eb7",
        uuid: "8ae89a2a-ad7d-11e6-80f5-76304dec7eb7",
        role: CharacteristicRole::Input(1),
        notify: true,
        write: false,
    },
    CharacteristicSpec {
        service_uuid: "8ae883b4-ad7d-11e6-80f5-76304dec7eb7",
        uuid: "8ae8860c-ad7d-11e6-80f5-76304dec7eb7",
        role: CharacteristicRole::Output(1),
        notify: false,
        write: true,
    },
];

const CONTROL_RECEIVER: &[CharacteristicSpec] = &[
    CharacteristicSpec {
        service_uuid: "2e582b3a-c5c5-11e6-9d9d-cec0c932ce01",
        uuid: "2e582de2-c5c5-11e6-9d9d-cec0c932ce01",
        role: CharacteristicRole::Channel,
        notify: false,
        write: true,
    },
    CharacteristicSpec {
        service_uuid: "2e58327e-c5c5-11e6-9d9d-cec0c932ce01",
        uuid: "2e583378-c5c5-11e6-9d9d-cec0c932ce01",
        role: CharacteristicRole::Output(1),
        notify: false,
        write: true,
    },
    // M4 drives the steering servo
    CharacteristicSpec {
        service_uuid: "2e58327e-c5c5-11e6-9d9d-cec0c932ce01",
        uuid: "2e5837b0-c5c5-11e6-9d9d-cec0c932ce01",
        role: CharacteristicRole::Output(4),
        notify: false,
        write: true,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FtCodec {
    model: ControllerFamily,
}

impl FtCodec {
    /// `model` is one of the two fischertechnik families
    pub fn new(model: ControllerFamily) -> Self {
        Self { model }
    }

    fn has_output(&self, output: u8) -> bool {
        self.characteristics()
            .iter()
            .any(|spec| spec.role == CharacteristicRole::Output(output))
    }
}

impl FrameCodec for FtCodec {
    fn family(&self) -> ControllerFamily {
        self.model
    }

    fn characteristics(&self) -> &'static [CharacteristicSpec] {
        match self.model {
            ControllerFamily::FtControlReceiver => CONTROL_RECEIVER,
            _ => SMART_CONTROLLER,
        }
    }

    fn decode(
        &self,
        role: CharacteristicRole,
        bytes: &[u8],
        _ports: &PortTable,
    ) -> Result<Event, DecodeError> {
        match role {
            CharacteristicRole::Input(input) => {
                require(bytes, 2)?;
                Ok(Event::InputValue {
                    input,
                    raw: u16::from_le_bytes([bytes[0], bytes[1]]),
                })
            }
            other => Err(DecodeError::UnexpectedCharacteristic(other)),
        }
    }

    fn encode(&self, command: &Command, _ports: &PortTable) -> Result<PendingWrite, EncodeError> {
        match *command {
            Command::MotorRun { port, speed } => {
                if !self.has_output(port) {
                    return Err(EncodeError::NoSuchOutput(port));
                }
                Ok(PendingWrite::new(
                    CharacteristicRole::Output(port),
                    Some(port),
                    vec![speed as u8],
                ))
            }
            Command::SetChannel { value } => Ok(PendingWrite::new(
                CharacteristicRole::Channel,
                None,
                vec![value],
            )),
            _ => Err(unsupported(command, self.model)),
        }
    }

    fn init_commands(&self) -> Vec<Command> {
        vec![Command::SetChannel { value: 1 }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_resistance() {
        let codec = FtCodec::new(ControllerFamily::FtSmartController);
        assert_eq!(
            codec
                .decode(CharacteristicRole::Input(1), &[0x10, 0x27], &PortTable::new())
                .unwrap(),
            Event::InputValue {
                input: 1,
                raw: 10000
            }
        );
        assert!(codec
            .decode(CharacteristicRole::Output(1), &[0x01], &PortTable::new())
            .is_err());
    }

    #[test]
    fn test_outputs_per_model() {
        let ports = PortTable::new();
        let receiver = FtCodec::new(ControllerFamily::FtControlReceiver);
        let steer = receiver
            .encode(&Command::MotorRun { port: 4, speed: -20 }, &ports)
            .unwrap();
        assert_eq!(steer.role, CharacteristicRole::Output(4));
        assert_eq!(steer.payload, vec![0xec]);

        let controller = FtCodec::new(ControllerFamily::FtSmartController);
        assert_eq!(
            controller.encode(&Command::MotorRun { port: 4, speed: 10 }, &ports),
            Err(EncodeError::NoSuchOutput(4))
        );
    }

    #[test]
    fn test_channel_on_connect() {
        let codec = FtCodec::new(ControllerFamily::FtControlReceiver);
        assert_eq!(codec.init_commands(), vec![Command::SetChannel { value: 1 }]);
        let write = codec
            .encode(&Command::SetChannel { value: 1 }, &PortTable::new())
            .unwrap();
        assert_eq!(write.role, CharacteristicRole::Channel);
        assert_eq!(write.payload, vec![0x01]);
    }
}
