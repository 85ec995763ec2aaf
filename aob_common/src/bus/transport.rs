//! Byte-transport and clock seams.
//!
//! The control unit talks to the fieldbus only through [`SerialPort`] and
//! measures time only through [`Clock`], so the whole bus path can run
//! against simulated drives and a manually stepped clock.

use std::cell::Cell;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors raised while opening or configuring a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Device could not be opened.
    #[error("failed to open {device}: {source}")]
    Open {
        device: String,
        #[source]
        source: std::io::Error,
    },

    /// Line settings could not be applied.
    #[error("failed to configure {device}: {reason}")]
    Configure { device: String, reason: String },

    /// Requested baud rate has no termios mapping.
    #[error("unsupported baud rate {0}")]
    UnsupportedBaud(u32),
}

/// Half-duplex serial byte transport.
///
/// All methods are non-blocking: `bytes_available` reports what can be read
/// right now, `read` never waits for more.
pub trait SerialPort {
    /// Number of received bytes ready to be read.
    fn bytes_available(&mut self) -> usize;

    /// Read up to `buf.len()` bytes, returning the count copied.
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Queue `bytes` for transmission.
    fn write(&mut self, bytes: &[u8]);

    /// Drop everything currently buffered on the receive side.
    fn clear_input(&mut self) {
        let mut scratch = [0u8; 32];
        while self.bytes_available() > 0 {
            if self.read(&mut scratch) == 0 {
                break;
            }
        }
    }
}

impl<T: SerialPort + ?Sized> SerialPort for Box<T> {
    fn bytes_available(&mut self) -> usize {
        (**self).bytes_available()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        (**self).read(buf)
    }

    fn write(&mut self, bytes: &[u8]) {
        (**self).write(bytes)
    }

    fn clear_input(&mut self) {
        (**self).clear_input()
    }
}

/// Monotonic time source.
pub trait Clock {
    /// Time elapsed since the clock was created.
    fn now(&self) -> Duration;

    /// Block the calling loop for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by [`Instant`] and `std::thread::sleep`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    /// Start a clock at zero.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Deterministic clock for tests and simulation.
///
/// `sleep` advances the clock instantly; nothing else moves it except
/// [`ManualClock::advance`].
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    /// Create a clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}
