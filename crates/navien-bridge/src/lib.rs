//! # navien-bridge
//!
//! Runtime for bridging Navien heaters onto a host system: a device state
//! store, a coalescing command queue and a cooperative poll/dispatch
//! scheduler over a pluggable byte transport. The protocol codec lives in
//! `navien-protocol`; this crate owns everything stateful.
//!
//! ## Usage
//!
//! ```no_run
//! use navien_bridge::{Bridge, BridgeConfig, TcpTransport};
//! use std::time::{Duration, Instant};
//!
//! let transport = TcpTransport::connect("10.0.0.5:4001")?;
//! let mut bridge = Bridge::new(transport, BridgeConfig::default());
//! loop {
//!     bridge.service(Instant::now());
//!     std::thread::sleep(Duration::from_millis(50));
//! }
//! # Ok::<(), std::io::Error>(())
//! ```

mod bridge;
mod error;
mod queue;
mod state;
mod transport;

pub use bridge::*;
pub use error::*;
pub use queue::*;
pub use state::*;
pub use transport::*;
