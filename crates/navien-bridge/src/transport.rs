//! Byte transport abstraction.
//!
//! The bridge itself never blocks: reads poll for whatever is buffered and
//! return immediately. Any byte pipe can back it; the stock implementation
//! connects to a serial-over-TCP gateway (ser2net or similar) in front of
//! the RS-485 adapter.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

/// A non-blocking byte pipe to the bus.
pub trait Transport {
    /// Read whatever is available into `buf`. Returns `Ok(0)` when nothing
    /// is buffered; must not block.
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write a complete frame to the bus.
    fn write_frame(&mut self, data: &[u8]) -> io::Result<()>;
}

/// Transport over a serial-over-TCP gateway.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    /// Connect to the gateway. Failing here is the one fatal error of the
    /// bridge; after startup, transport trouble only shows up as staleness.
    pub fn connect(addr: &str) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;
        Ok(TcpTransport { stream })
    }

    /// Connect with a bounded wait for the gateway to answer.
    pub fn connect_timeout(addr: &std::net::SocketAddr, timeout: Duration) -> io::Result<Self> {
        let stream = TcpStream::connect_timeout(addr, timeout)?;
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;
        Ok(TcpTransport { stream })
    }
}

impl Transport for TcpTransport {
    fn read_available(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.stream.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn write_frame(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream.write_all(data)
    }
}
