//! Outbound command encoding.
//!
//! Control frames share one 12-byte payload layout: opcode 0x4F, then a
//! power byte, a set temperature byte and a recirculation flags byte at
//! fixed offsets, everything else zero. The checksum uses the control seed,
//! so a command echoed back on the bus validates in our own frame reader
//! and is recognized as self-sent rather than misread as a foreign command.

use crate::checksum::checksum;
use crate::constants::*;
use crate::error::ProtocolError;
use crate::fields::FieldId;
use crate::frame::Frame;
use crate::types::Value;

/// Writable bounds applied when encoding commands. The DHW window is
/// model-dependent, so it is configuration rather than protocol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WriteLimits {
    /// Lowest accepted DHW set temperature, °C.
    pub min_dhw_temp: f32,
    /// Highest accepted DHW set temperature, °C.
    pub max_dhw_temp: f32,
}

impl Default for WriteLimits {
    fn default() -> Self {
        // Factory window of NPE/NCB residential units.
        WriteLimits {
            min_dhw_temp: 37.0,
            max_dhw_temp: 60.0,
        }
    }
}

/// One outbound write intent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WriteRequest {
    /// Turn the unit on or off.
    Power(bool),
    /// Set the DHW target temperature, °C.
    DhwSetTemperature(f32),
    /// Enable or disable scheduled recirculation.
    ScheduledRecirc(bool),
}

impl WriteRequest {
    /// The field this request writes, for coalescing and reporting.
    pub fn field(&self) -> FieldId {
        match self {
            WriteRequest::Power(_) => FieldId::Power,
            WriteRequest::DhwSetTemperature(_) => FieldId::DhwSetTemperature,
            WriteRequest::ScheduledRecirc(_) => FieldId::RecircStatus,
        }
    }

    /// Build a request from a (field, value) pair, the form external
    /// bindings submit. Fails with `UnsupportedWriteField` for fields
    /// without a write mapping.
    pub fn from_field(field: FieldId, value: &Value) -> Result<Self, ProtocolError> {
        match (field, value) {
            (FieldId::Power, Value::Bool(on)) => Ok(WriteRequest::Power(*on)),
            (FieldId::DhwSetTemperature, v) => match v.as_f32() {
                Some(t) => Ok(WriteRequest::DhwSetTemperature(t)),
                None => Err(ProtocolError::UnsupportedWriteField { field }),
            },
            (FieldId::RecircStatus, Value::Bool(on)) => Ok(WriteRequest::ScheduledRecirc(*on)),
            _ => Err(ProtocolError::UnsupportedWriteField { field }),
        }
    }

    /// Encode this request as a complete frame ready for transmission.
    pub fn encode(&self, limits: &WriteLimits) -> Result<Vec<u8>, ProtocolError> {
        let mut payload = [0u8; COMMAND_PAYLOAD_SIZE];
        payload[0] = CMD_OPCODE;

        match *self {
            WriteRequest::Power(on) => {
                payload[CMD_POWER_OFFSET] = if on { CMD_POWER_ON } else { CMD_POWER_OFF };
            }
            WriteRequest::DhwSetTemperature(temp) => {
                if temp < limits.min_dhw_temp || temp > limits.max_dhw_temp {
                    return Err(ProtocolError::ValueOutOfRange {
                        field: FieldId::DhwSetTemperature,
                        value: temp,
                        min: limits.min_dhw_temp,
                        max: limits.max_dhw_temp,
                    });
                }
                // Half-degree wire units, round to nearest.
                payload[CMD_TEMP_OFFSET] = (temp * 2.0 + 0.5) as u8;
            }
            WriteRequest::ScheduledRecirc(on) => {
                payload[CMD_RECIRC_OFFSET] = if on {
                    CMD_RECIRC_SCHED_ON
                } else {
                    CMD_RECIRC_SCHED_OFF
                };
            }
        }

        Ok(command_frame(&payload))
    }

    /// Parse a control frame back into a request, if it is one of ours.
    /// Used to recognize echoes of self-sent commands on the bus.
    pub fn from_frame(frame: &Frame) -> Option<Self> {
        if !frame.is_control() || frame.payload.len() < COMMAND_PAYLOAD_SIZE {
            return None;
        }
        if frame.payload[0] != CMD_OPCODE {
            return None;
        }

        match frame.payload[CMD_POWER_OFFSET] {
            CMD_POWER_ON => return Some(WriteRequest::Power(true)),
            CMD_POWER_OFF => return Some(WriteRequest::Power(false)),
            _ => {}
        }

        let temp_raw = frame.payload[CMD_TEMP_OFFSET];
        if temp_raw != 0 {
            return Some(WriteRequest::DhwSetTemperature(temp_raw as f32 / 2.0));
        }

        let recirc = frame.payload[CMD_RECIRC_OFFSET];
        if recirc & CMD_RECIRC_SCHED_ON != 0 {
            return Some(WriteRequest::ScheduledRecirc(true));
        }
        if recirc & CMD_RECIRC_SCHED_OFF != 0 {
            return Some(WriteRequest::ScheduledRecirc(false));
        }

        None
    }
}

/// The hot button press/release pair. The button is momentary, so it maps
/// to two frames rather than a field write.
pub fn hot_button_frames() -> [Vec<u8>; 2] {
    let mut press = [0u8; COMMAND_PAYLOAD_SIZE];
    press[0] = CMD_OPCODE;
    press[CMD_RECIRC_OFFSET] = CMD_RECIRC_HOTBUTTON;

    let mut release = [0u8; COMMAND_PAYLOAD_SIZE];
    release[0] = CMD_OPCODE;

    [command_frame(&press), command_frame(&release)]
}

/// The presence announcement frame, sent after every received status frame
/// so the heater treats us as an attached controller.
pub fn presence_frame() -> Vec<u8> {
    NAVILINK_PRESENT.to_vec()
}

/// Wrap a command payload in a control frame header and append the
/// checksum.
fn command_frame(payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len() + 1);
    buf.push(FRAME_MARKER);
    buf.push(SYS_TYPE);
    buf.push(SRC_CONTROL);
    buf.push(DST_WATER);
    buf.push(DIR_CONTROL);
    buf.push(payload.len() as u8);
    buf.extend_from_slice(payload);
    buf.push(checksum(&buf, CHECKSUM_SEED_CONTROL));
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameReader;

    // Command frames captured from a real NaviLink session.
    const TURN_ON_CMD: [u8; 19] = [
        0xF7, 0x05, 0x0F, 0x50, 0x10, 0x0C, 0x4F, 0x00, 0x0A, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0xCE,
    ];
    const TURN_OFF_CMD: [u8; 19] = [
        0xF7, 0x05, 0x0F, 0x50, 0x10, 0x0C, 0x4F, 0x00, 0x0B, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x0A,
    ];
    const SCHED_RECIRC_ON_CMD: [u8; 19] = [
        0xF7, 0x05, 0x0F, 0x50, 0x10, 0x0C, 0x4F, 0x00, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0xEE,
    ];
    const SCHED_RECIRC_OFF_CMD: [u8; 19] = [
        0xF7, 0x05, 0x0F, 0x50, 0x10, 0x0C, 0x4F, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0xC0,
    ];
    const HOT_BUTTON_PRESS_CMD: [u8; 19] = [
        0xF7, 0x05, 0x0F, 0x50, 0x10, 0x0C, 0x4F, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x6A,
    ];
    const HOT_BUTTON_RELEASE_CMD: [u8; 19] = [
        0xF7, 0x05, 0x0F, 0x50, 0x10, 0x0C, 0x4F, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x2A,
    ];

    #[test]
    fn test_power_commands_match_captures() {
        let limits = WriteLimits::default();
        assert_eq!(WriteRequest::Power(true).encode(&limits).unwrap(), TURN_ON_CMD);
        assert_eq!(WriteRequest::Power(false).encode(&limits).unwrap(), TURN_OFF_CMD);
    }

    #[test]
    fn test_recirc_commands_match_captures() {
        let limits = WriteLimits::default();
        assert_eq!(
            WriteRequest::ScheduledRecirc(true).encode(&limits).unwrap(),
            SCHED_RECIRC_ON_CMD
        );
        assert_eq!(
            WriteRequest::ScheduledRecirc(false).encode(&limits).unwrap(),
            SCHED_RECIRC_OFF_CMD
        );
    }

    #[test]
    fn test_hot_button_matches_captures() {
        let [press, release] = hot_button_frames();
        assert_eq!(press, HOT_BUTTON_PRESS_CMD);
        assert_eq!(release, HOT_BUTTON_RELEASE_CMD);
    }

    #[test]
    fn test_set_temp_range_enforced() {
        let limits = WriteLimits::default();
        assert!(matches!(
            WriteRequest::DhwSetTemperature(70.0).encode(&limits),
            Err(ProtocolError::ValueOutOfRange { field: FieldId::DhwSetTemperature, .. })
        ));
        assert!(matches!(
            WriteRequest::DhwSetTemperature(10.0).encode(&limits),
            Err(ProtocolError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn test_set_temp_wire_encoding() {
        let limits = WriteLimits::default();
        let frame = WriteRequest::DhwSetTemperature(47.0).encode(&limits).unwrap();
        assert_eq!(frame[HEADER_SIZE + CMD_TEMP_OFFSET], 0x5E); // 94 half-degrees
        assert_eq!(frame.len(), HEADER_SIZE + COMMAND_PAYLOAD_SIZE + 1);
    }

    #[test]
    fn test_unsupported_write_field() {
        assert!(matches!(
            WriteRequest::from_field(FieldId::InletTemperature, &Value::Float(20.0)),
            Err(ProtocolError::UnsupportedWriteField { field: FieldId::InletTemperature })
        ));
        assert!(matches!(
            WriteRequest::from_field(FieldId::GasTotal, &Value::Float(1.0)),
            Err(ProtocolError::UnsupportedWriteField { .. })
        ));
    }

    #[test]
    fn test_write_roundtrip_within_tolerance() {
        // Every writable field must survive encode -> frame reader -> parse
        // within the wire scale tolerance.
        let limits = WriteLimits::default();
        let requests = [
            WriteRequest::Power(true),
            WriteRequest::Power(false),
            WriteRequest::DhwSetTemperature(49.3),
            WriteRequest::DhwSetTemperature(60.0),
            WriteRequest::DhwSetTemperature(37.0),
            WriteRequest::ScheduledRecirc(true),
            WriteRequest::ScheduledRecirc(false),
        ];

        for request in requests {
            let bytes = request.encode(&limits).unwrap();

            // Self-sent frames must validate in our own reader.
            let mut reader = FrameReader::new();
            reader.push(&bytes);
            let frame = reader.next_frame().expect("echo should pass checksum");
            let parsed = WriteRequest::from_frame(&frame).expect("echo should parse");

            match (request, parsed) {
                (WriteRequest::DhwSetTemperature(sent), WriteRequest::DhwSetTemperature(got)) => {
                    // Half-degree wire units: worst case error is a quarter
                    // degree.
                    assert!((sent - got).abs() <= 0.25, "sent {sent}, got {got}");
                }
                (sent, got) => assert_eq!(sent, got),
            }
        }
    }

    #[test]
    fn test_presence_frame_parses_as_control() {
        let mut reader = FrameReader::new();
        reader.push(&presence_frame());
        let frame = reader.next_frame().expect("presence frame should validate");
        assert!(frame.is_control());
        // Not a field write.
        assert_eq!(WriteRequest::from_frame(&frame), None);
    }
}
