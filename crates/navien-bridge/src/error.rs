//! Bridge error types.

use navien_protocol::ProtocolError;
use thiserror::Error;

/// Errors surfaced by the bridge runtime.
///
/// Only transport unavailability at startup is fatal; everything that can
/// go wrong on a running bus is recovered locally and shows up as logs,
/// counters or staleness instead.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The transport could not be opened at initialization.
    #[error("transport unavailable: {0}")]
    TransportUnavailable(#[from] std::io::Error),

    /// A write request was rejected by the encoder.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
