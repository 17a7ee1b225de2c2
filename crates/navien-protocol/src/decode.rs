//! Frame decoding: validated frame in, typed message and field values out.
//!
//! Decoding is a pure function of the frame and the static field tables in
//! [`crate::fields`]; all state mutation happens in whatever consumes the
//! result. A single field outside its plausibility window rejects the whole
//! frame: a checksum-valid frame with an absurd value is treated as corrupt
//! rather than partially trusted.

use crate::constants::*;
use crate::error::ProtocolError;
use crate::fields::{FieldId, GAS_FIELDS, WATER_FIELDS};
use crate::frame::Frame;
use crate::types::Value;

/// Message type, selected by the dst byte of status frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// Water telemetry (temperatures, flow, power, recirculation).
    Water,
    /// Gas and device info (gas counters, versions, space heating).
    Gas,
    /// Control frame from a NaviLink-class device (possibly our own echo).
    Control,
}

/// A decoded status message: which unit sent it and the field values it
/// carried, in payload order.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    /// Cascade unit address (0..=15) for status messages, `None` for
    /// control frames.
    pub unit: Option<u8>,
    /// Message type.
    pub message: MessageType,
    /// Decoded field values in table order. Empty for control frames.
    pub fields: Vec<(FieldId, Value)>,
}

/// Decode a validated frame.
///
/// Fails with [`ProtocolError::UnknownMessageType`] when the dst/direction
/// combination has no field table, [`ProtocolError::FrameTooShort`] when the
/// payload is truncated for its type, and [`ProtocolError::FieldOutOfRange`]
/// when any decoded value is implausible.
pub fn decode(frame: &Frame) -> Result<DecodedFrame, ProtocolError> {
    match frame.direction {
        DIR_STATUS => decode_status(frame),
        DIR_CONTROL => Ok(DecodedFrame {
            unit: None,
            message: MessageType::Control,
            fields: Vec::new(),
        }),
        _ => Err(ProtocolError::UnknownMessageType {
            dst: frame.dst,
            direction: frame.direction,
        }),
    }
}

fn decode_status(frame: &Frame) -> Result<DecodedFrame, ProtocolError> {
    let unit = frame.unit_address().ok_or(ProtocolError::UnknownMessageType {
        dst: frame.dst,
        direction: frame.direction,
    })?;

    let (table, expected, message) = match frame.dst {
        DST_WATER => (WATER_FIELDS, WATER_PAYLOAD_SIZE, MessageType::Water),
        DST_GAS => (GAS_FIELDS, GAS_PAYLOAD_SIZE, MessageType::Gas),
        _ => {
            return Err(ProtocolError::UnknownMessageType {
                dst: frame.dst,
                direction: frame.direction,
            })
        }
    };

    if frame.payload.len() < expected {
        return Err(ProtocolError::FrameTooShort {
            expected,
            actual: frame.payload.len(),
        });
    }

    let mut fields = Vec::with_capacity(table.len());
    for spec in table {
        fields.push((spec.field, spec.decode(&frame.payload)?));
    }

    Ok(DecodedFrame {
        unit: Some(unit),
        message,
        fields,
    })
}
