//! Linux TTY transport for the RS-485 adapters.
//!
//! The device is opened non-blocking without becoming the controlling
//! terminal and switched to raw 8N1 at the configured speed.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::os::unix::fs::OpenOptionsExt;

use aob_common::bus::transport::{SerialPort, TransportError};
use nix::sys::termios::{
    self, BaudRate, ControlFlags, FlushArg, SetArg, SpecialCharacterIndices,
};
use tracing::{info, warn};

/// Map a numeric baud rate onto a termios speed.
pub fn baud_rate(baud: u32) -> Result<BaudRate, TransportError> {
    match baud {
        9_600 => Ok(BaudRate::B9600),
        19_200 => Ok(BaudRate::B19200),
        38_400 => Ok(BaudRate::B38400),
        57_600 => Ok(BaudRate::B57600),
        115_200 => Ok(BaudRate::B115200),
        other => Err(TransportError::UnsupportedBaud(other)),
    }
}

/// Raw serial port on a TTY device node.
#[derive(Debug)]
pub struct TtyPort {
    device: String,
    file: File,
    rx: VecDeque<u8>,
}

impl TtyPort {
    /// Open and configure `device` at `baud`.
    pub fn open(device: &str, baud: u32) -> Result<Self, TransportError> {
        let speed = baud_rate(baud)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
            .open(device)
            .map_err(|source| TransportError::Open {
                device: device.to_string(),
                source,
            })?;

        let configure = |reason: nix::Error| TransportError::Configure {
            device: device.to_string(),
            reason: reason.to_string(),
        };

        let mut attrs = termios::tcgetattr(&file).map_err(configure)?;
        termios::cfmakeraw(&mut attrs);
        termios::cfsetspeed(&mut attrs, speed).map_err(configure)?;
        attrs.control_flags |= ControlFlags::CLOCAL | ControlFlags::CREAD;
        attrs.control_flags.remove(ControlFlags::CSTOPB | ControlFlags::CRTSCTS);
        attrs.control_chars[SpecialCharacterIndices::VMIN as usize] = 0;
        attrs.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
        termios::tcsetattr(&file, SetArg::TCSANOW, &attrs).map_err(configure)?;
        termios::tcflush(&file, FlushArg::TCIOFLUSH).map_err(configure)?;

        info!("Opened {} at {} baud 8N1", device, baud);
        Ok(Self {
            device: device.to_string(),
            file,
            rx: VecDeque::new(),
        })
    }

    /// Move whatever the kernel has buffered into `rx`.
    fn fill(&mut self) {
        let mut chunk = [0u8; 64];
        loop {
            match self.file.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => self.rx.extend(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("{}: read failed: {}", self.device, e);
                    break;
                }
            }
        }
    }
}

impl SerialPort for TtyPort {
    fn bytes_available(&mut self) -> usize {
        self.fill();
        self.rx.len()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        if self.rx.len() < buf.len() {
            self.fill();
        }
        let n = buf.len().min(self.rx.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        n
    }

    fn write(&mut self, bytes: &[u8]) {
        if let Err(e) = self.file.write_all(bytes) {
            warn!("{}: write failed: {}", self.device, e);
            return;
        }
        if let Err(e) = termios::tcdrain(&self.file) {
            warn!("{}: drain failed: {}", self.device, e);
        }
    }

    fn clear_input(&mut self) {
        self.rx.clear();
        if let Err(e) = termios::tcflush(&self.file, FlushArg::TCIFLUSH) {
            warn!("{}: input flush failed: {}", self.device, e);
        }
    }
}
