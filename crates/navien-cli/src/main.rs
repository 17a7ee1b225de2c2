//! navilink: command line front end for the Navien RS-485 bridge.
//!
//! `run` bridges a live bus through a serial-over-TCP gateway and logs
//! every state change, `send` transmits a single command, and `decode`
//! replays a protocol capture offline.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use navien_bridge::{Bridge, BridgeConfig, BridgeError, Observer, TcpTransport};
use navien_protocol::{
    decode, spec_for, FieldId, FrameReader, MessageType, Value, WriteRequest,
};

#[derive(Error, Debug)]
enum CliError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("invalid hex capture: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("{0}")]
    Other(String),
}

#[derive(Parser, Debug)]
#[command(name = "navilink", version)]
#[command(about = "Bridge and inspect Navien water heaters over RS-485")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose logging; repeat for trace output.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the bridge against a live bus until interrupted.
    Run {
        /// Gateway address (host:port); overrides the config file.
        #[arg(long)]
        addr: Option<String>,
        /// YAML config file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Send one command and exit.
    Send {
        /// Gateway address (host:port); overrides the config file.
        #[arg(long)]
        addr: Option<String>,
        /// YAML config file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[command(subcommand)]
        action: SendAction,
    },
    /// Decode a protocol capture and print every field.
    Decode {
        /// Capture file: hex text, or raw bytes with --raw.
        file: PathBuf,
        /// Treat the file as raw bytes instead of hex text.
        #[arg(long)]
        raw: bool,
    },
}

#[derive(Subcommand, Debug)]
enum SendAction {
    /// Turn the unit on or off.
    Power { state: Switch },
    /// Set the DHW target temperature in °C.
    Temp { celsius: f32 },
    /// Enable or disable scheduled recirculation.
    Recirc { state: Switch },
    /// Press and release the hot button.
    HotButton,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Switch {
    On,
    Off,
}

impl From<Switch> for bool {
    fn from(s: Switch) -> bool {
        matches!(s, Switch::On)
    }
}

/// Top-level config file layout.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CliConfig {
    /// Gateway address, host:port.
    addr: Option<String>,
    /// Bridge tuning; every field is optional.
    bridge: BridgeConfig,
}

fn load_config(path: Option<&Path>) -> Result<CliConfig, CliError> {
    match path {
        Some(path) => Ok(serde_yaml::from_str(&fs::read_to_string(path)?)?),
        None => Ok(CliConfig::default()),
    }
}

fn resolve_addr(flag: Option<String>, config: &CliConfig) -> Result<String, CliError> {
    flag.or_else(|| config.addr.clone()).ok_or_else(|| {
        CliError::Other("no gateway address: pass --addr or set addr in the config file".into())
    })
}

/// Logs every state change the bridge reports.
struct LogObserver;

impl Observer for LogObserver {
    fn on_field(&mut self, unit: u8, field: FieldId, value: &Value) {
        match spec_for(field).map(|s| s.unit.to_string()) {
            Some(u) if !u.is_empty() => info!("unit {unit}: {field} = {value} {u}"),
            _ => info!("unit {unit}: {field} = {value}"),
        }
    }

    fn on_connection(&mut self, unit: u8, connected: bool) {
        let status = if connected { "connected" } else { "disconnected" };
        info!("unit {unit}: {status}");
    }
}

fn cmd_run(addr: Option<String>, config: Option<PathBuf>) -> Result<(), CliError> {
    let config = load_config(config.as_deref())?;
    let addr = resolve_addr(addr, &config)?;

    let transport = TcpTransport::connect(&addr).map_err(BridgeError::TransportUnavailable)?;
    info!(%addr, "connected to gateway");

    let mut bridge = Bridge::new(transport, config.bridge);
    bridge.add_observer(Box::new(LogObserver));

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))
        .map_err(|e| CliError::Other(format!("failed to install signal handler: {e}")))?;

    while running.load(Ordering::SeqCst) {
        bridge.service(Instant::now());
        thread::sleep(Duration::from_millis(50));
    }

    let (frames_ok, checksum_errors) = bridge.reader_stats();
    info!(
        frames_ok,
        checksum_errors,
        dropped = bridge.frames_dropped(),
        "shutting down"
    );
    Ok(())
}

fn cmd_send(
    addr: Option<String>,
    config: Option<PathBuf>,
    action: SendAction,
) -> Result<(), CliError> {
    let config = load_config(config.as_deref())?;
    let addr = resolve_addr(addr, &config)?;
    // Worst case the queue drains on the poll tick, not in a transmit
    // window, so wait a few tick periods before giving up.
    let timeout = config.bridge.poll_period() * 3 + Duration::from_secs(1);

    let transport = TcpTransport::connect(&addr).map_err(BridgeError::TransportUnavailable)?;
    let mut bridge = Bridge::new(transport, config.bridge);

    match action {
        SendAction::Power { state } => bridge.request(WriteRequest::Power(state.into()))?,
        SendAction::Temp { celsius } => {
            bridge.request(WriteRequest::DhwSetTemperature(celsius))?
        }
        SendAction::Recirc { state } => {
            bridge.request(WriteRequest::ScheduledRecirc(state.into()))?
        }
        SendAction::HotButton => bridge.press_hot_button(),
    }

    let deadline = Instant::now() + timeout;
    while bridge.pending_writes() > 0 {
        if Instant::now() > deadline {
            return Err(CliError::Other(
                "timed out waiting for a transmit window".into(),
            ));
        }
        bridge.service(Instant::now());
        thread::sleep(Duration::from_millis(50));
    }

    if bridge.write_errors() > 0 {
        return Err(CliError::Other("transport write failed".into()));
    }
    info!("command transmitted");
    Ok(())
}

fn cmd_decode(file: &Path, raw: bool) -> Result<(), CliError> {
    let bytes = if raw {
        fs::read(file)?
    } else {
        let text = fs::read_to_string(file)?;
        let cleaned: String = text.chars().filter(char::is_ascii_hexdigit).collect();
        hex::decode(cleaned)?
    };

    let mut reader = FrameReader::new();
    reader.push(&bytes);
    while let Some(frame) = reader.next_frame() {
        match decode(&frame) {
            Ok(message) => {
                let kind = match message.message {
                    MessageType::Water => "water",
                    MessageType::Gas => "gas",
                    MessageType::Control => "control",
                };
                match message.unit {
                    Some(unit) => println!("{kind} frame, unit {unit}:"),
                    None => println!("{kind} frame:"),
                }
                for (field, value) in &message.fields {
                    match spec_for(*field).map(|s| s.unit.to_string()) {
                        Some(u) if !u.is_empty() => println!("  {field} = {value} {u}"),
                        _ => println!("  {field} = {value}"),
                    }
                }
                if message.message == MessageType::Control {
                    if let Some(request) = WriteRequest::from_frame(&frame) {
                        println!("  command: {request:?}");
                    }
                }
            }
            Err(e) => println!("undecodable frame from 0x{:02X}: {e}", frame.src),
        }
    }

    println!(
        "{} frames, {} checksum errors, {} bytes discarded",
        reader.frames_ok(),
        reader.checksum_errors(),
        reader.bytes_discarded()
    );
    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let result = match args.command {
        Command::Run { addr, config } => cmd_run(addr, config),
        Command::Send {
            addr,
            config,
            action,
        } => cmd_send(addr, config, action),
        Command::Decode { file, raw } => cmd_decode(&file, raw),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
