//! Frame extraction from the raw serial byte stream.
//!
//! The bus carries variable-length frames with this layout:
//!
//! ```text
//! +--------+----------+-----+-----+-----------+-----+-----------------+----------+
//! | marker | sys_type | src | dst | direction | len | payload[0..len] | checksum |
//! +--------+----------+-----+-----+-----------+-----+-----------------+----------+
//!   0xF7     0x05                                      len bytes         1 byte
//! ```
//!
//! [`FrameReader`] keeps a rolling buffer, tolerates arbitrary chunk splits
//! across [`FrameReader::push`] calls, and resynchronizes after corruption by
//! discarding a single byte at a time, which bounds recovery to one frame
//! length of subsequent input.

use bytes::{Buf, BytesMut};
use tracing::{debug, trace};

use crate::checksum::checksum;
use crate::constants::*;

/// Upper bound on buffered bytes. Hitting it means the caller stopped
/// draining frames; the oldest bytes are dropped.
const RECV_BUFFER_CAP: usize = 8 * MAX_FRAME_SIZE;

/// One validated frame, checksum already verified and stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Source address byte (0x50 + unit for status frames, 0x0F for
    /// control frames).
    pub src: u8,
    /// Destination byte (selects the message type).
    pub dst: u8,
    /// Direction byte (0x90 status, 0x10 control).
    pub direction: u8,
    /// Payload bytes, header and checksum excluded.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Cascade unit address for status frames (0..=15), `None` for frames
    /// from control devices.
    pub fn unit_address(&self) -> Option<u8> {
        if self.src >= SRC_STATUS_BASE && self.src <= SRC_STATUS_BASE + MAX_UNIT_ADDRESS {
            Some(self.src - SRC_STATUS_BASE)
        } else {
            None
        }
    }

    /// True if this frame was sent by a heater.
    pub fn is_status(&self) -> bool {
        self.direction == DIR_STATUS
    }

    /// True if this frame was sent by a control device.
    pub fn is_control(&self) -> bool {
        self.direction == DIR_CONTROL
    }

    /// Re-encode the frame, recomputing the checksum. Mostly useful for
    /// tests and loopback verification of self-sent commands.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_SIZE + self.payload.len() + 1);
        buf.push(FRAME_MARKER);
        buf.push(SYS_TYPE);
        buf.push(self.src);
        buf.push(self.dst);
        buf.push(self.direction);
        buf.push(self.payload.len() as u8);
        buf.extend_from_slice(&self.payload);
        let seed = seed_for_src(self.src);
        buf.push(checksum(&buf, seed));
        buf
    }
}

/// Checksum seed for a frame, selected by its source address. Only the
/// cascade-primary source 0x50 uses the status seed; cascade units 1..=15
/// and control devices all checksum with the alternate seed.
pub fn seed_for_src(src: u8) -> u16 {
    if src == SRC_STATUS_BASE {
        CHECKSUM_SEED_STATUS
    } else {
        CHECKSUM_SEED_CONTROL
    }
}

/// Incremental frame extractor over a rolling buffer.
#[derive(Debug, Default)]
pub struct FrameReader {
    buffer: BytesMut,
    frames_ok: u64,
    checksum_errors: u64,
    bytes_discarded: u64,
}

impl FrameReader {
    /// Create an empty reader.
    pub fn new() -> Self {
        FrameReader {
            buffer: BytesMut::with_capacity(MAX_FRAME_SIZE * 2),
            frames_ok: 0,
            checksum_errors: 0,
            bytes_discarded: 0,
        }
    }

    /// Append received bytes to the rolling buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
        if self.buffer.len() > RECV_BUFFER_CAP {
            let excess = self.buffer.len() - RECV_BUFFER_CAP;
            debug!(excess, "receive buffer overflow, dropping oldest bytes");
            self.buffer.advance(excess);
            self.bytes_discarded += excess as u64;
        }
    }

    /// Extract the next complete, checksum-valid frame.
    ///
    /// Returns `None` when the buffer holds no complete frame yet; partial
    /// input is retained for the next call. A checksum or length failure
    /// discards one byte and rescans, so a corrupted frame never stalls the
    /// stream.
    pub fn next_frame(&mut self) -> Option<Frame> {
        loop {
            self.seek_to_marker();

            if self.buffer.len() < HEADER_SIZE {
                return None;
            }

            let len = self.buffer[5] as usize;
            if len > MAX_PAYLOAD_SIZE {
                trace!(len, "implausible length byte, resyncing");
                self.discard_one();
                continue;
            }

            let total = HEADER_SIZE + len + 1;
            if self.buffer.len() < total {
                // Frame still arriving.
                return None;
            }

            let src = self.buffer[2];
            let calc = checksum(&self.buffer[..total - 1], seed_for_src(src));
            let recv = self.buffer[total - 1];
            if calc != recv {
                self.checksum_errors += 1;
                debug!(
                    src = format_args!("0x{src:02X}"),
                    calc = format_args!("0x{calc:02X}"),
                    recv = format_args!("0x{recv:02X}"),
                    "checksum mismatch, resyncing"
                );
                self.discard_one();
                continue;
            }

            let frame = Frame {
                src,
                dst: self.buffer[3],
                direction: self.buffer[4],
                payload: self.buffer[HEADER_SIZE..total - 1].to_vec(),
            };
            self.buffer.advance(total);
            self.frames_ok += 1;
            return Some(frame);
        }
    }

    /// Number of buffered bytes awaiting a complete frame.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Frames successfully extracted since creation.
    pub fn frames_ok(&self) -> u64 {
        self.frames_ok
    }

    /// Checksum failures observed since creation.
    pub fn checksum_errors(&self) -> u64 {
        self.checksum_errors
    }

    /// Bytes dropped while scanning for a marker or resyncing.
    pub fn bytes_discarded(&self) -> u64 {
        self.bytes_discarded
    }

    fn seek_to_marker(&mut self) {
        while !self.buffer.is_empty() && self.buffer[0] != FRAME_MARKER {
            self.buffer.advance(1);
            self.bytes_discarded += 1;
        }
    }

    fn discard_one(&mut self) {
        self.buffer.advance(1);
        self.bytes_discarded += 1;
    }
}
