//! Protocol constants
//!
//! These constants define the framing bytes, checksum seeds, payload sizes
//! and bitmask values used by the Navien RS-485 control protocol. All of
//! them were reverse engineered from traffic captured between a heater and
//! a NaviLink controller.

// ============================================================================
// Framing
// ============================================================================

/// Every frame starts with this marker byte.
pub const FRAME_MARKER: u8 = 0xF7;

/// System type byte. Constant 0x05 on every unit observed so far.
pub const SYS_TYPE: u8 = 0x05;

/// Header length in bytes: marker, sys type, src, dst, direction, len.
pub const HEADER_SIZE: usize = 6;

/// Base source address for status frames. A heater at cascade address `n`
/// sends with `src = SRC_STATUS_BASE + n`.
pub const SRC_STATUS_BASE: u8 = 0x50;

/// Source address used by control devices (NaviLink, or us).
pub const SRC_CONTROL: u8 = 0x0F;

/// Highest cascade unit address. Addresses run 0..=15.
pub const MAX_UNIT_ADDRESS: u8 = 0x0F;

/// Destination byte of water telemetry frames.
pub const DST_WATER: u8 = 0x50;

/// Destination byte of gas/info frames.
pub const DST_GAS: u8 = 0x0F;

/// Direction byte of status frames (heater to controller).
pub const DIR_STATUS: u8 = 0x90;

/// Direction byte of control frames (controller to heater).
pub const DIR_CONTROL: u8 = 0x10;

/// Largest payload length the reader will accept. Anything bigger is a
/// corrupt length byte and triggers a resync.
pub const MAX_PAYLOAD_SIZE: usize = 0x40;

/// Largest complete frame: header + payload + checksum.
pub const MAX_FRAME_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE + 1;

// ============================================================================
// Checksum seeds
// ============================================================================

/// Checksum seed for status frames from the cascade primary
/// (src == SRC_STATUS_BASE exactly).
pub const CHECKSUM_SEED_STATUS: u16 = 0x4B;

/// Checksum seed for every other source: control devices and cascade
/// units 1..=15.
pub const CHECKSUM_SEED_CONTROL: u16 = 0x62;

// ============================================================================
// Payload sizes
// ============================================================================

/// Payload length of a water telemetry frame.
pub const WATER_PAYLOAD_SIZE: usize = 34;

/// Payload length of a gas/info frame.
pub const GAS_PAYLOAD_SIZE: usize = 42;

/// Payload length of a standard control command frame.
pub const COMMAND_PAYLOAD_SIZE: usize = 12;

// ============================================================================
// Water payload bitmasks
// ============================================================================

/// Power bit in the system power byte.
pub const POWER_ON_MASK: u8 = 0x01;

/// Recirculating bit in the heating mode byte.
pub const HEATING_MODE_RECIRC_MASK: u8 = 0x08;

/// Display units flag in the system status byte (set = Celsius).
pub const SYS_STATUS_UNITS_MASK: u8 = 0x08;

/// Internal scheduled recirculation bit in the system status byte.
pub const SYS_STATUS_RECIRC_INT_SCHED: u8 = 0x01;

/// External scheduled recirculation bit in the system status byte.
pub const SYS_STATUS_RECIRC_EXT_SCHED: u8 = 0x02;

/// Hot button active bit in the recirculation status byte.
pub const RECIRC_STATUS_HOTBUTTON_ON: u8 = 0x01;

/// Scheduled recirculation enabled bit in the recirculation status byte.
pub const RECIRC_STATUS_SCHEDULED_ON: u8 = 0x02;

/// Boiler active bit.
pub const BOILER_ACTIVE_MASK: u8 = 0x01;

// ============================================================================
// Gas payload bitmasks
// ============================================================================

/// Display units flag in the second system status byte (set = Fahrenheit).
pub const SYS_STATUS_2_IMPERIAL_MASK: u8 = 0x01;

/// Hot button mode enabled flag in the second system status byte.
pub const SYS_STATUS_2_HOTBUTTON_MASK: u8 = 0x04;

// ============================================================================
// Control command payload
// ============================================================================

/// First payload byte of every standard command frame.
pub const CMD_OPCODE: u8 = 0x4F;

/// Opcode of the presence announcement frame.
pub const CMD_OPCODE_PRESENT: u8 = 0x4A;

/// Payload offset of the power byte.
pub const CMD_POWER_OFFSET: usize = 2;

/// Power byte value for "turn on".
pub const CMD_POWER_ON: u8 = 0x0A;

/// Power byte value for "turn off".
pub const CMD_POWER_OFF: u8 = 0x0B;

/// Payload offset of the DHW set temperature byte (half degrees Celsius).
pub const CMD_TEMP_OFFSET: usize = 3;

/// Payload offset of the recirculation flags byte.
pub const CMD_RECIRC_OFFSET: usize = 5;

/// Recirculation flag: hot button pressed.
pub const CMD_RECIRC_HOTBUTTON: u8 = 0x01;

/// Recirculation flag: enable scheduled recirculation.
pub const CMD_RECIRC_SCHED_ON: u8 = 0x08;

/// Recirculation flag: disable scheduled recirculation.
pub const CMD_RECIRC_SCHED_OFF: u8 = 0x10;

/// Presence announcement sent after every received status frame, exactly as
/// a NaviLink does. The heater stops reporting some fields if nobody
/// announces.
pub const NAVILINK_PRESENT: [u8; 10] = [
    FRAME_MARKER,
    SYS_TYPE,
    SRC_CONTROL,
    DST_WATER,
    DIR_CONTROL,
    0x03,
    CMD_OPCODE_PRESENT,
    0x00,
    0x01,
    0x55,
];
