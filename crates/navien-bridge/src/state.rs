//! Last-known device state, per cascade unit.
//!
//! The store is the single point the decode pipeline writes and external
//! consumers read. A field only appears once it has been decoded at least
//! once since startup, so absence is distinguishable from zero. The bridge
//! runs single-threaded and cooperative, so no locking is needed here; a
//! multi-threaded host must serialize access from outside.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use navien_protocol::{FieldId, Value};

/// One decoded value with its arrival time.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSample {
    /// The decoded value.
    pub value: Value,
    /// When the value was decoded.
    pub at: Instant,
}

/// State of one cascade unit.
#[derive(Debug, Default)]
struct UnitState {
    fields: HashMap<FieldId, FieldSample>,
    last_frame_at: Option<Instant>,
    connected: bool,
}

/// Last-known values for every unit seen on the bus. Units are created on
/// the first frame carrying their address and persist for the process
/// lifetime.
#[derive(Debug, Default)]
pub struct StateStore {
    units: HashMap<u8, UnitState>,
}

impl StateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        StateStore::default()
    }

    /// Record a valid frame arrival for a unit, creating it on first sight.
    pub fn mark_frame(&mut self, unit: u8, now: Instant) {
        let state = self.units.entry(unit).or_default();
        state.last_frame_at = Some(now);
    }

    /// Store a decoded field value. Returns `true` if the value changed
    /// (first decode counts as a change); the timestamp advances either
    /// way.
    pub fn update(&mut self, unit: u8, field: FieldId, value: Value, now: Instant) -> bool {
        let state = self.units.entry(unit).or_default();
        match state.fields.get_mut(&field) {
            Some(sample) => {
                let changed = sample.value != value;
                sample.value = value;
                sample.at = now;
                changed
            }
            None => {
                state.fields.insert(field, FieldSample { value, at: now });
                true
            }
        }
    }

    /// Latest sample for a field, if it has ever been decoded.
    pub fn get(&self, unit: u8, field: FieldId) -> Option<&FieldSample> {
        self.units.get(&unit)?.fields.get(&field)
    }

    /// Latest value for a field, if it has ever been decoded.
    pub fn value(&self, unit: u8, field: FieldId) -> Option<&Value> {
        self.get(unit, field).map(|sample| &sample.value)
    }

    /// True when no frame for the unit arrived within `window` (or the
    /// unit has never been seen).
    pub fn is_stale(&self, unit: u8, now: Instant, window: Duration) -> bool {
        match self.units.get(&unit).and_then(|s| s.last_frame_at) {
            Some(at) => now.duration_since(at) > window,
            None => true,
        }
    }

    /// Current connection flag for a unit.
    pub fn is_connected(&self, unit: u8) -> bool {
        self.units.get(&unit).map(|s| s.connected).unwrap_or(false)
    }

    /// Set the connection flag. Returns `true` if it changed.
    pub fn set_connected(&mut self, unit: u8, connected: bool) -> bool {
        let state = self.units.entry(unit).or_default();
        let changed = state.connected != connected;
        state.connected = connected;
        changed
    }

    /// Addresses of every unit seen so far.
    pub fn units(&self) -> impl Iterator<Item = u8> + '_ {
        self.units.keys().copied()
    }
}
