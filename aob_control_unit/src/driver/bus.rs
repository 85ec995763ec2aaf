//! Duplicated half-duplex fieldbus.
//!
//! Every frame goes out on the primary port and, when configured, on a
//! secondary port carrying the same drives. Writes are fire-and-forget and
//! followed by a fixed settle delay; reads wait a bounded time for a reply
//! on either port and collapse every failure into [`READ_SENTINEL`].

use std::rc::Rc;
use std::time::Duration;

use aob_common::bus::frame::{
    READ_REPLY_LEN, READ_SENTINEL, RequestFrame, decode_read_reply, read_request,
};
use aob_common::bus::registers::register_name;
use aob_common::bus::transport::{Clock, SerialPort};
use tracing::{debug, trace};

use crate::config::BusConfig;

/// Granularity of the reply wait loop.
const REPLY_POLL_STEP: Duration = Duration::from_millis(1);

/// Owner of the physical ports and the settle/timeout policy.
pub struct FieldBus {
    primary: Box<dyn SerialPort>,
    secondary: Option<Box<dyn SerialPort>>,
    clock: Rc<dyn Clock>,
    settle: Duration,
    read_timeout: Duration,
}

impl FieldBus {
    pub fn new(
        primary: Box<dyn SerialPort>,
        secondary: Option<Box<dyn SerialPort>>,
        clock: Rc<dyn Clock>,
        config: &BusConfig,
    ) -> Self {
        Self {
            primary,
            secondary,
            clock,
            settle: config.settle(),
            read_timeout: config.read_timeout(),
        }
    }

    /// Shared time source.
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Send one frame on every port, then hold the line quiet.
    pub fn transmit(&mut self, frame: &RequestFrame) {
        trace!("tx {:02X?}", frame);
        self.primary.write(frame);
        if let Some(secondary) = self.secondary.as_mut() {
            secondary.write(frame);
        }
        self.clock.sleep(self.settle);
    }

    /// Single-register read; [`READ_SENTINEL`] on timeout or bad reply.
    pub fn read_register(&mut self, id: u8, reg: u16) -> u16 {
        self.primary.clear_input();
        if let Some(secondary) = self.secondary.as_mut() {
            secondary.clear_input();
        }

        let request = read_request(id, reg);
        trace!("tx {:02X?}", request);
        self.primary.write(&request);
        if let Some(secondary) = self.secondary.as_mut() {
            secondary.write(&request);
        }

        let started = self.clock.now();
        loop {
            if let Some(reply) = take_reply(self.primary.as_mut()) {
                if let Some(secondary) = self.secondary.as_mut() {
                    secondary.clear_input();
                }
                return decode(id, reg, &reply);
            }
            if let Some(secondary) = self.secondary.as_mut() {
                if let Some(reply) = take_reply(secondary.as_mut()) {
                    self.primary.clear_input();
                    return decode(id, reg, &reply);
                }
            }
            if self.clock.now().saturating_sub(started) > self.read_timeout {
                debug!(
                    "m{} read {} (0x{:04X}) timed out",
                    id,
                    register_name(reg),
                    reg
                );
                return READ_SENTINEL;
            }
            self.clock.sleep(REPLY_POLL_STEP);
        }
    }
}

fn take_reply(port: &mut dyn SerialPort) -> Option<[u8; READ_REPLY_LEN]> {
    if port.bytes_available() < READ_REPLY_LEN {
        return None;
    }
    let mut reply = [0u8; READ_REPLY_LEN];
    let n = port.read(&mut reply);
    (n == READ_REPLY_LEN).then_some(reply)
}

fn decode(id: u8, reg: u16, reply: &[u8; READ_REPLY_LEN]) -> u16 {
    match decode_read_reply(id, reply) {
        Ok(value) => {
            trace!("m{} {} = 0x{:04X}", id, register_name(reg), value);
            value
        }
        Err(e) => {
            debug!("m{} read {} rejected: {}", id, register_name(reg), e);
            READ_SENTINEL
        }
    }
}
