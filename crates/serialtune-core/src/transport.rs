//! Host transport
//!
//! Frames a polled byte stream into command lines and feeds them to an
//! [`Interpreter`]. Reads never wait for more input than is available: a
//! `WouldBlock` or `TimedOut` from the source ends the poll, so the caller's
//! loop keeps running.

use std::fmt;
use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{SerialPort, SerialPortInfo, SerialPortType};

use crate::convert::{ValueReader, ValueWriter};
use crate::error::TransportError;
use crate::interpreter::{Interpreter, UpdateHook};

/// Default baud rate for tuning consoles
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Longest accepted command line in bytes, excluding the terminator
pub const DEFAULT_LINE_CAPACITY: usize = 128;

/// Read timeout used for polled serial ports
pub const POLL_TIMEOUT_MS: u64 = 10;

/// Accumulates bytes until a full `\n`-terminated line is available.
///
/// A line longer than `CAP` bytes is dropped in its entirety, up to and
/// including its terminator. Lines that are not valid UTF-8 are dropped too.
pub struct LineBuffer<const CAP: usize = DEFAULT_LINE_CAPACITY> {
    pending: heapless::Vec<u8, CAP>,
    overflowed: bool,
}

impl<const CAP: usize> LineBuffer<CAP> {
    /// Create an empty buffer
    pub const fn new() -> Self {
        Self {
            pending: heapless::Vec::new(),
            overflowed: false,
        }
    }

    /// Bytes of the current, unterminated line
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Consume `bytes`, calling `on_line` for every completed line.
    ///
    /// Returns the number of lines delivered.
    pub fn feed<F: FnMut(&str)>(&mut self, bytes: &[u8], mut on_line: F) -> usize {
        let mut delivered = 0;

        for &byte in bytes {
            if byte == b'\n' {
                if self.overflowed {
                    tracing::warn!("Discarded command line longer than {} bytes", CAP);
                } else {
                    match std::str::from_utf8(&self.pending) {
                        Ok(line) => {
                            on_line(line);
                            delivered += 1;
                        }
                        Err(e) => tracing::warn!("Discarded non UTF-8 command line: {e}"),
                    }
                }
                self.pending.clear();
                self.overflowed = false;
            } else if !self.overflowed && self.pending.push(byte).is_err() {
                self.overflowed = true;
                self.pending.clear();
            }
        }

        delivered
    }
}

impl<const CAP: usize> Default for LineBuffer<CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAP: usize> fmt::Debug for LineBuffer<CAP> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineBuffer")
            .field("pending", &self.pending.len())
            .field("capacity", &CAP)
            .field("overflowed", &self.overflowed)
            .finish()
    }
}

/// A polled command channel: bytes in from `reader`, replies out to `writer`
pub struct LineLink<Rd, Wr, const CAP: usize = DEFAULT_LINE_CAPACITY> {
    reader: Rd,
    writer: Wr,
    buffer: LineBuffer<CAP>,
}

impl<Rd: Read, Wr: Write, const CAP: usize> LineLink<Rd, Wr, CAP> {
    /// Wrap a reader/writer pair
    pub fn new(reader: Rd, writer: Wr) -> Self {
        Self {
            reader,
            writer,
            buffer: LineBuffer::new(),
        }
    }

    /// Process every complete line currently available.
    ///
    /// Returns the number of lines handled. Only I/O failures of the channel
    /// itself are reported; command problems never are. Replies to lines
    /// handled before a read failure are still written.
    pub fn poll<'a, const N: usize, R, W, H>(
        &mut self,
        interpreter: &mut Interpreter<'a, N, R, W, H>,
    ) -> Result<usize, TransportError>
    where
        R: ValueReader,
        W: ValueWriter,
        H: UpdateHook<'a>,
    {
        let mut chunk = [0u8; 64];
        let mut replies = String::new();
        let mut handled = 0;

        let drained = loop {
            match self.reader.read(&mut chunk) {
                Ok(0) => break Ok(()),
                Ok(n) => {
                    handled += self.buffer.feed(&chunk[..n], |line| {
                        interpreter.process(line, &mut replies);
                    });
                }
                Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                    break Ok(())
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => break Err(e),
            }
        };

        if !replies.is_empty() {
            self.writer.write_all(replies.as_bytes())?;
            self.writer.flush()?;
        }
        drained?;

        Ok(handled)
    }

    /// The input channel
    pub fn reader_mut(&mut self) -> &mut Rd {
        &mut self.reader
    }

    /// The reply channel
    pub fn writer(&self) -> &Wr {
        &self.writer
    }

    /// Unwrap into the reader/writer pair
    pub fn into_inner(self) -> (Rd, Wr) {
        (self.reader, self.writer)
    }
}

/// Hardware behind a serial port, in the order a console prefers them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PortKind {
    /// USB CDC or USB-serial bridge, where development boards show up
    Usb,
    /// Bluetooth SPP link to a wireless tuning adapter
    Bluetooth,
    /// On-board or PCI UART
    Pci,
    /// Anything the OS cannot classify, including pseudo terminals
    Unknown,
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PortKind::Usb => "usb",
            PortKind::Bluetooth => "bluetooth",
            PortKind::Pci => "pci",
            PortKind::Unknown => "unknown",
        })
    }
}

/// A serial port a tuning session could be opened on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// OS path or name passed to [`open_port`]
    pub name: String,
    /// What kind of link the port is
    pub kind: PortKind,
    /// `vid:pid product` for USB devices
    pub description: Option<String>,
}

impl PortInfo {
    /// Whether the port is likely a board a tuning console talks to
    pub fn is_candidate(&self) -> bool {
        self.kind != PortKind::Unknown
    }
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (kind, description) = match info.port_type {
            SerialPortType::UsbPort(usb) => (
                PortKind::Usb,
                Some(usb_description(usb.vid, usb.pid, usb.product.as_deref())),
            ),
            SerialPortType::BluetoothPort => (PortKind::Bluetooth, None),
            SerialPortType::PciPort => (PortKind::Pci, None),
            SerialPortType::Unknown => (PortKind::Unknown, None),
        };

        Self {
            name: info.port_name,
            kind,
            description,
        }
    }
}

impl fmt::Display for PortInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)?;
        if let Some(description) = &self.description {
            write!(f, " {}", description)?;
        }
        Ok(())
    }
}

fn usb_description(vid: u16, pid: u16, product: Option<&str>) -> String {
    match product {
        Some(product) => format!("{:04x}:{:04x} {}", vid, pid, product),
        None => format!("{:04x}:{:04x}", vid, pid),
    }
}

/// Order ports by kind preference, then by name
fn sort_ports(ports: &mut [PortInfo]) {
    ports.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.name.cmp(&b.name)));
}

/// List serial ports, boards first.
///
/// With `all` unset, ports of unknown kind are left out.
pub fn list_ports(all: bool) -> Result<Vec<PortInfo>, TransportError> {
    let mut ports: Vec<PortInfo> = serialport::available_ports()
        .map_err(|e| TransportError::SerialError(e.to_string()))?
        .into_iter()
        .map(PortInfo::from)
        .filter(|p| all || p.is_candidate())
        .collect();

    sort_ports(&mut ports);
    tracing::debug!("Found {} serial ports", ports.len());
    Ok(ports)
}

/// Open a serial port for polled line exchange (8N1, short read timeout)
pub fn open_port(name: &str, baud_rate: Option<u32>) -> Result<Box<dyn SerialPort>, TransportError> {
    let baud = baud_rate.unwrap_or(DEFAULT_BAUD_RATE);

    serialport::new(name, baud)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .flow_control(serialport::FlowControl::None)
        .timeout(Duration::from_millis(POLL_TIMEOUT_MS))
        .open()
        .map_err(|e| match e.kind() {
            serialport::ErrorKind::NoDevice => TransportError::PortNotFound(name.to_string()),
            _ => TransportError::SerialError(e.to_string()),
        })
}
