//! End-to-end scenarios: bytes in one side, observer notifications and
//! transmitted frames out the other.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::{Duration, Instant};

use navien_bridge::{Bridge, BridgeConfig, Observer, Transport};
use navien_protocol::{
    FieldId, Frame, FrameReader, Value, WriteRequest, DIR_STATUS, DST_GAS, DST_WATER,
    GAS_PAYLOAD_SIZE, SRC_STATUS_BASE, WATER_PAYLOAD_SIZE,
};

/// Script-driven transport: bytes queued by the test arrive on read,
/// written frames are captured for inspection.
#[derive(Default)]
struct ScriptTransport {
    rx: Rc<RefCell<VecDeque<u8>>>,
    tx: Rc<RefCell<Vec<u8>>>,
}

impl Transport for ScriptTransport {
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut rx = self.rx.borrow_mut();
        let n = buf.len().min(rx.len());
        for slot in buf.iter_mut().take(n) {
            *slot = rx.pop_front().unwrap();
        }
        Ok(n)
    }

    fn write_frame(&mut self, data: &[u8]) -> io::Result<()> {
        self.tx.borrow_mut().extend_from_slice(data);
        Ok(())
    }
}

/// Observer that records everything it is told.
#[derive(Default)]
struct Recorder {
    fields: Rc<RefCell<Vec<(u8, FieldId, Value)>>>,
    connections: Rc<RefCell<Vec<(u8, bool)>>>,
}

impl Observer for Recorder {
    fn on_field(&mut self, unit: u8, field: FieldId, value: &Value) {
        self.fields.borrow_mut().push((unit, field, value.clone()));
    }

    fn on_connection(&mut self, unit: u8, connected: bool) {
        self.connections.borrow_mut().push((unit, connected));
    }
}

struct Harness {
    bridge: Bridge<ScriptTransport>,
    rx: Rc<RefCell<VecDeque<u8>>>,
    tx: Rc<RefCell<Vec<u8>>>,
    fields: Rc<RefCell<Vec<(u8, FieldId, Value)>>>,
    connections: Rc<RefCell<Vec<(u8, bool)>>>,
}

fn harness(config: BridgeConfig) -> Harness {
    let rx = Rc::new(RefCell::new(VecDeque::new()));
    let tx = Rc::new(RefCell::new(Vec::new()));
    let transport = ScriptTransport {
        rx: Rc::clone(&rx),
        tx: Rc::clone(&tx),
    };
    let recorder = Recorder::default();
    let fields = Rc::clone(&recorder.fields);
    let connections = Rc::clone(&recorder.connections);

    let mut bridge = Bridge::new(transport, config);
    bridge.add_observer(Box::new(recorder));
    Harness {
        bridge,
        rx,
        tx,
        fields,
        connections,
    }
}

fn water_frame(unit: u8, inlet_raw: u8) -> Vec<u8> {
    let mut payload = vec![0u8; WATER_PAYLOAD_SIZE];
    payload[3] = 0x05; // power on
    payload[7] = inlet_raw;
    Frame {
        src: SRC_STATUS_BASE + unit,
        dst: DST_WATER,
        direction: DIR_STATUS,
        payload,
    }
    .to_bytes()
}

fn gas_frame(unit: u8) -> Vec<u8> {
    Frame {
        src: SRC_STATUS_BASE + unit,
        dst: DST_GAS,
        direction: DIR_STATUS,
        payload: vec![0u8; GAS_PAYLOAD_SIZE],
    }
    .to_bytes()
}

/// Extract the command frames written to the bus, skipping presence
/// announcements.
fn sent_commands(tx: &[u8]) -> Vec<WriteRequest> {
    let mut reader = FrameReader::new();
    reader.push(tx);
    let mut commands = Vec::new();
    while let Some(frame) = reader.next_frame() {
        if let Some(request) = WriteRequest::from_frame(&frame) {
            commands.push(request);
        }
    }
    commands
}

#[test]
fn test_inlet_temperature_scoped_to_unit() {
    // A frame for unit 2 with inlet raw 47 (23.5 °C) must not touch unit 0.
    let mut h = harness(BridgeConfig::default());
    let t0 = Instant::now();

    h.rx.borrow_mut().extend(water_frame(0, 40)); // unit 0: 20.0 °C
    h.bridge.service(t0);
    h.rx.borrow_mut().extend(water_frame(2, 47)); // unit 2: 23.5 °C
    h.bridge.service(t0 + Duration::from_secs(1));

    assert_eq!(
        h.bridge.state().value(2, FieldId::InletTemperature),
        Some(&Value::Float(23.5))
    );
    assert_eq!(
        h.bridge.state().value(0, FieldId::InletTemperature),
        Some(&Value::Float(20.0))
    );

    let fields = h.fields.borrow();
    assert!(fields.contains(&(2, FieldId::InletTemperature, Value::Float(23.5))));
    assert!(fields.contains(&(0, FieldId::InletTemperature, Value::Float(20.0))));
}

#[test]
fn test_idempotent_updates_advance_timestamp() {
    let mut h = harness(BridgeConfig::default());
    let t0 = Instant::now();
    let t1 = t0 + Duration::from_secs(1);

    h.rx.borrow_mut().extend(water_frame(0, 47));
    h.bridge.service(t0);
    h.rx.borrow_mut().extend(water_frame(0, 47));
    h.bridge.service(t1);

    let sample = h.bridge.state().get(0, FieldId::InletTemperature).unwrap();
    assert_eq!(sample.value, Value::Float(23.5));
    assert_eq!(sample.at, t1);

    // No accumulation drift: the value changed exactly once.
    let count = h
        .fields
        .borrow()
        .iter()
        .filter(|(u, f, _)| *u == 0 && *f == FieldId::InletTemperature)
        .count();
    assert_eq!(count, 1);
}

#[test]
fn test_staleness_flips_conn_status_and_recovers() {
    let mut h = harness(BridgeConfig::default());
    let t0 = Instant::now();

    h.rx.borrow_mut().extend(water_frame(2, 47));
    h.bridge.service(t0);
    assert!(h.bridge.conn_status(2));

    // Silence past the staleness window.
    h.bridge.service(t0 + Duration::from_secs(20));
    assert!(!h.bridge.conn_status(2));
    // Sensor values survive the disconnect.
    assert_eq!(
        h.bridge.state().value(2, FieldId::InletTemperature),
        Some(&Value::Float(23.5))
    );

    // A valid frame flips it back.
    h.rx.borrow_mut().extend(water_frame(2, 48));
    h.bridge.service(t0 + Duration::from_secs(25));
    assert!(h.bridge.conn_status(2));

    let connections = h.connections.borrow();
    assert_eq!(
        connections.as_slice(),
        &[(2, true), (2, false), (2, true)]
    );
}

#[test]
fn test_coalescing_transmits_only_latest() {
    let mut h = harness(BridgeConfig::default());

    h.bridge
        .submit(FieldId::DhwSetTemperature, Value::Float(45.0))
        .unwrap();
    h.bridge
        .submit(FieldId::DhwSetTemperature, Value::Float(49.5))
        .unwrap();

    // A status frame opens the transmit window.
    h.rx.borrow_mut().extend(water_frame(0, 47));
    h.bridge.service(Instant::now());

    let commands = sent_commands(&h.tx.borrow());
    assert_eq!(commands, vec![WriteRequest::DhwSetTemperature(49.5)]);
}

#[test]
fn test_command_repeat_writes_frame_per_repeat() {
    let config = BridgeConfig {
        command_repeat: 2,
        ..Default::default()
    };
    let mut h = harness(config);

    h.bridge
        .submit(FieldId::DhwSetTemperature, Value::Float(45.0))
        .unwrap();
    h.bridge
        .submit(FieldId::DhwSetTemperature, Value::Float(49.5))
        .unwrap();

    h.rx.borrow_mut().extend(water_frame(0, 47));
    h.bridge.service(Instant::now());

    // Coalescing still yields one logical command; the repeat count only
    // duplicates it on the wire.
    let commands = sent_commands(&h.tx.borrow());
    assert_eq!(
        commands,
        vec![
            WriteRequest::DhwSetTemperature(49.5),
            WriteRequest::DhwSetTemperature(49.5)
        ]
    );
    assert_eq!(h.tx.borrow().len(), 2 * 19);
}

#[test]
fn test_one_command_per_transmit_window() {
    let mut h = harness(BridgeConfig::default());
    let t0 = Instant::now();

    h.bridge.submit(FieldId::Power, Value::Bool(true)).unwrap();
    h.bridge
        .submit(FieldId::DhwSetTemperature, Value::Float(49.5))
        .unwrap();

    h.rx.borrow_mut().extend(water_frame(0, 47));
    h.bridge.service(t0);
    assert_eq!(sent_commands(&h.tx.borrow()).len(), 1);

    h.rx.borrow_mut().extend(water_frame(0, 47));
    h.bridge.service(t0 + Duration::from_secs(1));
    let commands = sent_commands(&h.tx.borrow());
    assert_eq!(
        commands,
        vec![
            WriteRequest::Power(true),
            WriteRequest::DhwSetTemperature(49.5)
        ]
    );
}

#[test]
fn test_decode_failures_flip_conn_status() {
    let config = BridgeConfig {
        decode_failure_threshold: 3,
        ..Default::default()
    };
    let mut h = harness(config);
    let t0 = Instant::now();

    // Establish the connection first.
    h.rx.borrow_mut().extend(water_frame(1, 47));
    h.bridge.service(t0);
    assert!(h.bridge.conn_status(1));

    // Checksum-valid frames with an implausible inlet temperature.
    for i in 0..3u64 {
        h.rx.borrow_mut().extend(water_frame(1, 0xFF));
        h.bridge.service(t0 + Duration::from_secs(1 + i));
    }
    assert!(!h.bridge.conn_status(1));
    // The corrupt value never reached the store.
    assert_eq!(
        h.bridge.state().value(1, FieldId::InletTemperature),
        Some(&Value::Float(23.5))
    );
}

#[test]
fn test_corrupted_stream_recovers_and_other_units_unaffected() {
    let mut h = harness(BridgeConfig::default());
    let t0 = Instant::now();

    let mut corrupted = water_frame(2, 60);
    corrupted[12] ^= 0xA5;
    h.rx.borrow_mut().extend(corrupted);
    h.rx.borrow_mut().extend(gas_frame(0));
    h.rx.borrow_mut().extend(water_frame(2, 50));
    h.bridge.service(t0);

    // The corrupted frame vanished; the following frames decoded.
    assert_eq!(
        h.bridge.state().value(2, FieldId::InletTemperature),
        Some(&Value::Float(25.0))
    );
    assert!(h.bridge.conn_status(0));
    assert!(h.bridge.conn_status(2));
    let (ok, bad) = h.bridge.reader_stats();
    assert_eq!(ok, 2);
    assert!(bad >= 1);
}
