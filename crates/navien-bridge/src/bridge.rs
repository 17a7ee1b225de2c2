//! The poll/dispatch scheduler.
//!
//! [`Bridge`] owns one frame reader, one state store, one command queue and
//! one transport, wired together at construction. Each [`Bridge::service`]
//! call runs one cooperative cycle: Reading → Decoding → Notifying, with
//! Encoding → Transmitting interleaved whenever a transmit window opens.
//! Nothing blocks; the caller drives the loop on a timer and whenever bytes
//! arrive.
//!
//! The bus is half-duplex, so the bridge transmits the way a NaviLink does:
//! right after a complete inbound frame, when the heater has just finished
//! talking. A pending command on a silent bus is flushed on the poll tick
//! instead so it cannot wedge forever.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use navien_protocol::{
    decode, hot_button_frames, presence_frame, FieldId, Frame, FrameReader, Value, WriteLimits,
    WriteRequest, CMD_OPCODE_PRESENT,
};

use crate::error::BridgeError;
use crate::queue::CommandQueue;
use crate::state::StateStore;
use crate::transport::Transport;

/// Scheduler cycle phase, for status reporting and tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Between cycles.
    #[default]
    Idle,
    /// Draining the transport into the frame reader.
    Reading,
    /// Extracting and decoding frames.
    Decoding,
    /// Delivering state changes to observers.
    Notifying,
    /// Encoding a pending write.
    Encoding,
    /// Writing a frame to the transport.
    Transmitting,
}

/// Callback interface for external bindings (sensors, switches, climate
/// entities). Bindings receive every update and filter for the fields they
/// care about; they never touch framing or checksums.
pub trait Observer {
    /// A field value changed for a unit.
    fn on_field(&mut self, unit: u8, field: FieldId, value: &Value) {
        let _ = (unit, field, value);
    }

    /// A unit's connection status changed.
    fn on_connection(&mut self, unit: u8, connected: bool) {
        let _ = (unit, connected);
    }
}

/// Bridge configuration. All fields have observed-default values, so a
/// config file only needs to name what it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Poll tick period in milliseconds.
    pub poll_period_ms: u64,
    /// Staleness window in milliseconds: no frame for this long and a unit
    /// counts as disconnected.
    pub staleness_window_ms: u64,
    /// Consecutive decode failures before a unit is flagged disconnected.
    pub decode_failure_threshold: u32,
    /// Answer status frames with the NaviLink presence announcement.
    pub announce_presence: bool,
    /// Times each command frame is written per transmit window. A real
    /// NaviLink sends twice; 1 keeps one request = one frame.
    pub command_repeat: u8,
    /// Lowest writable DHW set temperature, °C.
    pub min_dhw_temp: f32,
    /// Highest writable DHW set temperature, °C.
    pub max_dhw_temp: f32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            poll_period_ms: 5_000,
            staleness_window_ms: 15_000,
            decode_failure_threshold: 5,
            announce_presence: true,
            command_repeat: 1,
            min_dhw_temp: 37.0,
            max_dhw_temp: 60.0,
        }
    }
}

impl BridgeConfig {
    /// Poll tick period.
    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.poll_period_ms)
    }

    /// Staleness window.
    pub fn staleness_window(&self) -> Duration {
        Duration::from_millis(self.staleness_window_ms)
    }

    /// Writable bounds for the command encoder.
    pub fn write_limits(&self) -> WriteLimits {
        WriteLimits {
            min_dhw_temp: self.min_dhw_temp,
            max_dhw_temp: self.max_dhw_temp,
        }
    }
}

/// The poll/dispatch scheduler: one frame reader, one state store, one
/// command queue, one transport.
pub struct Bridge<T: Transport> {
    transport: T,
    reader: FrameReader,
    store: StateStore,
    queue: CommandQueue,
    raw_queue: VecDeque<Vec<u8>>,
    observers: Vec<Box<dyn Observer>>,
    config: BridgeConfig,
    phase: Phase,
    last_tick: Option<Instant>,
    last_rx: Option<Instant>,
    decode_failures: HashMap<u8, u32>,
    other_navilink: bool,
    read_errors: u64,
    write_errors: u64,
    frames_dropped: u64,
}

impl<T: Transport> Bridge<T> {
    /// Wire up a bridge over an already-open transport.
    pub fn new(transport: T, config: BridgeConfig) -> Self {
        Bridge {
            transport,
            reader: FrameReader::new(),
            store: StateStore::new(),
            queue: CommandQueue::new(),
            raw_queue: VecDeque::new(),
            observers: Vec::new(),
            config,
            phase: Phase::Idle,
            last_tick: None,
            last_rx: None,
            decode_failures: HashMap::new(),
            other_navilink: false,
            read_errors: 0,
            write_errors: 0,
            frames_dropped: 0,
        }
    }

    /// Register an observer for state change notifications.
    pub fn add_observer(&mut self, observer: Box<dyn Observer>) {
        self.observers.push(observer);
    }

    /// Submit a write as a (field, value) pair. Validation happens here so
    /// the caller gets the rejection, not the bus loop later.
    pub fn submit(&mut self, field: FieldId, value: Value) -> Result<(), BridgeError> {
        let request = WriteRequest::from_field(field, &value)?;
        self.request(request)
    }

    /// Queue a write request, coalescing with any pending request for the
    /// same field.
    pub fn request(&mut self, request: WriteRequest) -> Result<(), BridgeError> {
        // Encode once up front to surface range errors immediately.
        request.encode(&self.config.write_limits())?;
        self.queue.push(request);
        Ok(())
    }

    /// Queue the hot button press/release pair.
    pub fn press_hot_button(&mut self) {
        for frame in hot_button_frames() {
            self.raw_queue.push_back(frame);
        }
    }

    /// Run one cooperative cycle: drain the transport, decode frames, apply
    /// state, notify observers, and service the poll tick. Call this on a
    /// short interval and whenever bytes arrive; it never blocks.
    pub fn service(&mut self, now: Instant) {
        self.phase = Phase::Reading;
        let mut scratch = [0u8; 256];
        loop {
            match self.transport.read_available(&mut scratch) {
                Ok(0) => break,
                Ok(n) => self.reader.push(&scratch[..n]),
                Err(e) => {
                    // Runtime transport trouble surfaces as staleness, not
                    // as a crash.
                    warn!(error = %e, "transport read failed");
                    self.read_errors += 1;
                    break;
                }
            }
        }

        self.phase = Phase::Decoding;
        let mut field_changes: Vec<(u8, FieldId, Value)> = Vec::new();
        let mut conn_changes: Vec<(u8, bool)> = Vec::new();
        while let Some(frame) = self.reader.next_frame() {
            self.last_rx = Some(now);
            let is_status = frame.is_status();
            self.handle_frame(&frame, now, &mut field_changes, &mut conn_changes);
            if is_status {
                // The heater just finished talking: transmit window.
                self.flush_tx(true);
            }
        }

        self.phase = Phase::Notifying;
        for (unit, connected) in conn_changes {
            info!(unit, connected, "connection status changed");
            for observer in &mut self.observers {
                observer.on_connection(unit, connected);
            }
        }
        for (unit, field, value) in &field_changes {
            trace!(unit, %field, %value, "field changed");
            for observer in &mut self.observers {
                observer.on_field(*unit, *field, value);
            }
        }

        let tick_due = self
            .last_tick
            .map_or(true, |t| now.duration_since(t) >= self.config.poll_period());
        if tick_due {
            self.last_tick = Some(now);
            self.tick(now);
        }

        self.phase = Phase::Idle;
    }

    fn handle_frame(
        &mut self,
        frame: &Frame,
        now: Instant,
        field_changes: &mut Vec<(u8, FieldId, Value)>,
        conn_changes: &mut Vec<(u8, bool)>,
    ) {
        if frame.is_control() {
            self.handle_control_frame(frame);
            return;
        }

        match decode(frame) {
            Ok(decoded) => {
                let unit = match decoded.unit {
                    Some(unit) => unit,
                    None => return,
                };
                self.store.mark_frame(unit, now);
                self.decode_failures.remove(&unit);
                if self.store.set_connected(unit, true) {
                    conn_changes.push((unit, true));
                }
                for (field, value) in decoded.fields {
                    if self.store.update(unit, field, value.clone(), now) {
                        field_changes.push((unit, field, value));
                    }
                }
            }
            Err(e) => {
                self.frames_dropped += 1;
                warn!(src = frame.src, error = %e, "dropping undecodable frame");
                if let Some(unit) = frame.unit_address() {
                    let failures = self.decode_failures.entry(unit).or_insert(0);
                    *failures += 1;
                    if *failures >= self.config.decode_failure_threshold
                        && self.store.set_connected(unit, false)
                    {
                        conn_changes.push((unit, false));
                    }
                }
            }
        }
    }

    fn handle_control_frame(&mut self, frame: &Frame) {
        if frame.payload.first() == Some(&CMD_OPCODE_PRESENT) && !self.other_navilink {
            // Someone else is announcing. Two controllers fighting over the
            // bus confuses the heater, so we go quiet until restarted.
            warn!("another NaviLink device detected on the bus, presence announcements disabled");
            self.other_navilink = true;
        } else if let Some(request) = WriteRequest::from_frame(frame) {
            debug!(?request, "observed control command from another device");
        }
    }

    fn tick(&mut self, now: Instant) {
        let window = self.config.staleness_window();
        let stale: Vec<u8> = self
            .store
            .units()
            .filter(|&unit| self.store.is_stale(unit, now, window) && self.store.is_connected(unit))
            .collect();
        for unit in stale {
            self.store.set_connected(unit, false);
            info!(unit, "no frames within staleness window, marking disconnected");
            for observer in &mut self.observers {
                observer.on_connection(unit, false);
            }
        }

        // A silent bus never opens a transmit window, so flush pending
        // writes from the tick instead.
        let bus_silent = self
            .last_rx
            .map_or(true, |t| now.duration_since(t) >= self.config.poll_period());
        if bus_silent && !(self.queue.is_empty() && self.raw_queue.is_empty()) {
            self.flush_tx(false);
        }
    }

    /// Send at most one queued item. `after_frame` is true when the window
    /// follows a received status frame, which is also when the presence
    /// announcement goes out.
    fn flush_tx(&mut self, after_frame: bool) {
        self.phase = Phase::Encoding;

        if let Some(raw) = self.raw_queue.pop_front() {
            self.transmit(&raw);
            return;
        }

        if let Some(request) = self.queue.pop() {
            match request.encode(&self.config.write_limits()) {
                Ok(bytes) => {
                    debug!(?request, "transmitting command");
                    self.transmit(&bytes);
                }
                // Validated at submit time; only a config change in between
                // can get us here.
                Err(e) => warn!(?request, error = %e, "dropping unencodable command"),
            }
            return;
        }

        if after_frame && self.config.announce_presence && !self.other_navilink {
            let frame = presence_frame();
            self.transmit(&frame);
        }
    }

    fn transmit(&mut self, bytes: &[u8]) {
        self.phase = Phase::Transmitting;
        for _ in 0..self.config.command_repeat.max(1) {
            if let Err(e) = self.transport.write_frame(bytes) {
                warn!(error = %e, "transport write failed");
                self.write_errors += 1;
                break;
            }
        }
    }

    /// Read access to the device state store.
    pub fn state(&self) -> &StateStore {
        &self.store
    }

    /// Connection status of a unit.
    pub fn conn_status(&self, unit: u8) -> bool {
        self.store.is_connected(unit)
    }

    /// Current scheduler phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True once a foreign NaviLink has been seen on the bus.
    pub fn other_navilink_detected(&self) -> bool {
        self.other_navilink
    }

    /// Writes queued but not yet transmitted.
    pub fn pending_writes(&self) -> usize {
        self.queue.len() + self.raw_queue.len()
    }

    /// Frames that passed the checksum but failed to decode.
    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped
    }

    /// Transport read failures since startup.
    pub fn read_errors(&self) -> u64 {
        self.read_errors
    }

    /// Transport write failures since startup.
    pub fn write_errors(&self) -> u64 {
        self.write_errors
    }

    /// Frame reader statistics: (frames ok, checksum errors).
    pub fn reader_stats(&self) -> (u64, u64) {
        (self.reader.frames_ok(), self.reader.checksum_errors())
    }
}
