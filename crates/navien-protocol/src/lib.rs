//! Navien RS-485 control protocol codec.
//!
//! Navien tankless water heaters and combi boilers talk to NaviLink-class
//! controllers over a half-duplex RS-485 bus. This crate provides the pure
//! codec half of a bridge: framing and checksum validation, decoding of the
//! two known status message types into named field values, and encoding of
//! the outbound control commands.
//!
//! # Protocol overview
//!
//! Every frame carries a 6-byte header, a variable payload and a one-byte
//! checksum:
//!
//! | Field     | Size | Description                                          |
//! |-----------|------|------------------------------------------------------|
//! | marker    | 1    | Always 0xF7.                                         |
//! | sys_type  | 1    | Always 0x05 on observed units.                       |
//! | src       | 1    | 0x50 + unit address for heaters, 0x0F for controllers. |
//! | dst       | 1    | Message type: 0x50 water telemetry, 0x0F gas/info.   |
//! | direction | 1    | 0x90 status, 0x10 control.                           |
//! | len       | 1    | Payload byte count.                                  |
//! | payload   | len  | Message body.                                        |
//! | checksum  | 1    | Shift/XOR checksum over header and payload.          |
//!
//! Up to sixteen heaters can share one bus in a cascade; the unit address
//! embedded in `src` tells them apart.
//!
//! # Example
//!
//! ```rust,ignore
//! use navien_protocol::{decode, FrameReader};
//!
//! let mut reader = FrameReader::new();
//! reader.push(received_bytes);
//! while let Some(frame) = reader.next_frame() {
//!     let message = decode(&frame)?;
//!     for (field, value) in &message.fields {
//!         println!("{field} = {value}");
//!     }
//! }
//! ```
//!
//! This crate does no I/O and keeps no clock; the scheduling, state and
//! transport pieces live in `navien-bridge`.

mod checksum;
mod command;
mod constants;
mod decode;
mod error;
mod fields;
mod frame;
mod types;

pub use checksum::*;
pub use command::*;
pub use constants::*;
pub use decode::*;
pub use error::*;
pub use fields::*;
pub use frame::*;
pub use types::*;
