//! Simulated DM556RS-style drives on a shared RS-485 segment.
//!
//! The bank answers single-register reads, stores written registers and keeps
//! a log of every frame it saw. Two port flavours are handed out: the primary
//! port answers reads, the echo port only records what it was sent (the same
//! drives hear both lines, but only one copy of a reply comes back).

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use aob_common::bus::frame::{READ_REPLY_LEN, RequestFrame, decode_request, read_reply};
use aob_common::bus::registers::{
    FC_READ_HOLDING, FC_WRITE_SINGLE, MOTION_MOVING, MOTION_STOPPED, PR_CONTROL_QUICK_STOP,
    PR_CONTROL_TRIGGER, REG_ALARM_STATUS, REG_DI_STATUS, REG_MOTION_STATUS, REG_PR_CONTROL,
};
use aob_common::bus::transport::SerialPort;
use aob_common::consts::MAX_AXES;
use tracing::trace;

#[derive(Debug, Clone)]
struct SimDrive {
    present: bool,
    corrupt_replies: bool,
    registers: HashMap<u16, u16>,
}

impl SimDrive {
    fn new() -> Self {
        let mut registers = HashMap::new();
        registers.insert(REG_MOTION_STATUS, MOTION_STOPPED);
        registers.insert(REG_DI_STATUS, 0);
        registers.insert(REG_ALARM_STATUS, 0);
        Self {
            present: true,
            corrupt_replies: false,
            registers,
        }
    }

    fn apply_write(&mut self, reg: u16, value: u16) {
        self.registers.insert(reg, value);
        if reg == REG_PR_CONTROL {
            match value {
                PR_CONTROL_TRIGGER => {
                    self.registers.insert(REG_MOTION_STATUS, MOTION_MOVING);
                }
                PR_CONTROL_QUICK_STOP => {
                    self.registers.insert(REG_MOTION_STATUS, MOTION_STOPPED);
                }
                _ => {}
            }
        }
    }
}

#[derive(Debug)]
struct DriveBank {
    drives: Vec<SimDrive>,
    primary_log: Vec<RequestFrame>,
    echo_log: Vec<RequestFrame>,
}

impl DriveBank {
    fn drive_mut(&mut self, id: u8) -> Option<&mut SimDrive> {
        let slot = usize::from(id).checked_sub(1)?;
        self.drives.get_mut(slot)
    }

    /// Feed one request into the bank, returning the reply if any.
    fn handle(&mut self, frame: &RequestFrame) -> Option<[u8; READ_REPLY_LEN]> {
        let request = decode_request(frame)?;
        let drive = self.drive_mut(request.id)?;
        if !drive.present {
            return None;
        }
        match request.function {
            FC_WRITE_SINGLE => {
                drive.apply_write(request.register, request.value);
                None
            }
            FC_READ_HOLDING => {
                let value = drive.registers.get(&request.register).copied().unwrap_or(0);
                let mut reply = read_reply(request.id, value);
                if drive.corrupt_replies {
                    reply[READ_REPLY_LEN - 1] ^= 0xFF;
                }
                Some(reply)
            }
            _ => None,
        }
    }
}

/// Shared handle to the simulated drive bank. Clones share state.
#[derive(Debug, Clone)]
pub struct SimulatedDrives {
    bank: Rc<RefCell<DriveBank>>,
}

impl Default for SimulatedDrives {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedDrives {
    /// Every drive present, stopped, inputs idle, no alarms.
    pub fn new() -> Self {
        Self {
            bank: Rc::new(RefCell::new(DriveBank {
                drives: vec![SimDrive::new(); MAX_AXES],
                primary_log: Vec::new(),
                echo_log: Vec::new(),
            })),
        }
    }

    /// Port that answers reads.
    pub fn primary_port(&self) -> SimPort {
        SimPort::new(self.clone(), PortRole::Primary)
    }

    /// Port that only records traffic.
    pub fn echo_port(&self) -> SimPort {
        SimPort::new(self.clone(), PortRole::Echo)
    }

    pub fn set_register(&self, id: u8, reg: u16, value: u16) {
        if let Some(drive) = self.bank.borrow_mut().drive_mut(id) {
            drive.registers.insert(reg, value);
        }
    }

    pub fn register(&self, id: u8, reg: u16) -> Option<u16> {
        self.bank
            .borrow_mut()
            .drive_mut(id)
            .and_then(|d| d.registers.get(&reg).copied())
    }

    /// Absent drives never answer.
    pub fn set_present(&self, id: u8, present: bool) {
        if let Some(drive) = self.bank.borrow_mut().drive_mut(id) {
            drive.present = present;
        }
    }

    /// Flip the CRC of every reply from `id`.
    pub fn set_corrupt_replies(&self, id: u8, corrupt: bool) {
        if let Some(drive) = self.bank.borrow_mut().drive_mut(id) {
            drive.corrupt_replies = corrupt;
        }
    }

    /// Frames received on the primary port, in order.
    pub fn frames(&self) -> Vec<RequestFrame> {
        self.bank.borrow().primary_log.clone()
    }

    /// Frames received on the echo port, in order.
    pub fn echo_frames(&self) -> Vec<RequestFrame> {
        self.bank.borrow().echo_log.clone()
    }

    pub fn clear_frames(&self) {
        let mut bank = self.bank.borrow_mut();
        bank.primary_log.clear();
        bank.echo_log.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PortRole {
    Primary,
    Echo,
}

/// [`SerialPort`] attached to a [`SimulatedDrives`] bank.
#[derive(Debug)]
pub struct SimPort {
    drives: SimulatedDrives,
    role: PortRole,
    rx: VecDeque<u8>,
}

impl SimPort {
    fn new(drives: SimulatedDrives, role: PortRole) -> Self {
        Self {
            drives,
            role,
            rx: VecDeque::new(),
        }
    }

    /// Push raw bytes into the receive buffer, as line noise would.
    pub fn inject(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }
}

impl SerialPort for SimPort {
    fn bytes_available(&mut self) -> usize {
        self.rx.len()
    }

    fn read(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.rx.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        n
    }

    fn write(&mut self, bytes: &[u8]) {
        let Ok(frame) = RequestFrame::try_from(bytes) else {
            trace!("sim: dropping {}-byte write", bytes.len());
            return;
        };
        let mut bank = self.drives.bank.borrow_mut();
        match self.role {
            PortRole::Primary => {
                bank.primary_log.push(frame);
                if let Some(reply) = bank.handle(&frame) {
                    self.rx.extend(reply);
                }
            }
            PortRole::Echo => bank.echo_log.push(frame),
        }
    }
}
