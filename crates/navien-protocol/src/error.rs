//! Protocol error types.

use thiserror::Error;

use crate::fields::FieldId;

/// Errors that can occur when decoding frames or encoding commands.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// Frame payload is shorter than the message type requires.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// The dst/direction combination has no field table.
    #[error("unknown message type: dst=0x{dst:02X} direction=0x{direction:02X}")]
    UnknownMessageType {
        /// Destination byte from the header.
        dst: u8,
        /// Direction byte from the header.
        direction: u8,
    },

    /// A decoded value lies outside the field's plausible range. Used to
    /// reject corrupt-but-checksum-valid frames.
    #[error("field {field} out of range: {value} not within {min}..={max}")]
    FieldOutOfRange {
        /// Field that failed validation.
        field: FieldId,
        /// Scaled value that was decoded.
        value: f32,
        /// Lower bound of the plausible range.
        min: f32,
        /// Upper bound of the plausible range.
        max: f32,
    },

    /// The field has no write mapping.
    #[error("field {field} is not writable")]
    UnsupportedWriteField {
        /// Field the caller tried to write.
        field: FieldId,
    },

    /// A write value is outside the field's writable range.
    #[error("value {value} for {field} outside writable range {min}..={max}")]
    ValueOutOfRange {
        /// Field the caller tried to write.
        field: FieldId,
        /// Requested value.
        value: f32,
        /// Lower writable bound.
        min: f32,
        /// Upper writable bound.
        max: f32,
    },
}
