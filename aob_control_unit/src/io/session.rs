//! Text session plumbing.
//!
//! Line sources are polled without blocking from the control loop. Every
//! response goes to every attached sink through a [`Broadcast`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::Write;
use std::rc::Rc;
use std::sync::mpsc::{Receiver, TryRecvError};

use tracing::{info, warn};

/// Non-blocking supplier of complete command lines.
pub trait LineSource {
    /// Next complete line, if one is ready.
    fn poll_line(&mut self) -> Option<String>;
}

/// Consumer of response lines.
pub trait ResponseSink {
    fn send_line(&mut self, line: &str);
}

// ─── Sources ────────────────────────────────────────────────────────

/// Lines forwarded by a reader thread over a channel.
#[derive(Debug)]
pub struct ChannelSource {
    name: String,
    rx: Receiver<String>,
    closed: bool,
}

impl ChannelSource {
    pub fn new(name: impl Into<String>, rx: Receiver<String>) -> Self {
        Self {
            name: name.into(),
            rx,
            closed: false,
        }
    }
}

impl LineSource for ChannelSource {
    fn poll_line(&mut self) -> Option<String> {
        if self.closed {
            return None;
        }
        match self.rx.try_recv() {
            Ok(line) => Some(line),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                info!("Line source '{}' closed", self.name);
                self.closed = true;
                None
            }
        }
    }
}

/// Pre-scripted lines, consumed front to back.
impl LineSource for VecDeque<String> {
    fn poll_line(&mut self) -> Option<String> {
        self.pop_front()
    }
}

// ─── Sinks ──────────────────────────────────────────────────────────

/// Standard output.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ResponseSink for ConsoleSink {
    fn send_line(&mut self, line: &str) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "{line}").and_then(|_| out.flush()) {
            warn!("console write failed: {}", e);
        }
    }
}

/// Collects lines in memory. Clones share the buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Rc<RefCell<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything collected so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.borrow_mut())
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

impl ResponseSink for MemorySink {
    fn send_line(&mut self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}

/// Fan-out to every attached sink.
#[derive(Default)]
pub struct Broadcast {
    sinks: Vec<Box<dyn ResponseSink>>,
}

impl Broadcast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, sink: Box<dyn ResponseSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ResponseSink for Broadcast {
    fn send_line(&mut self, line: &str) {
        for sink in &mut self.sinks {
            sink.send_line(line);
        }
    }
}
