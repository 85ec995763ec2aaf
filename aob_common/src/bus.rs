//! RS-485 fieldbus (Modbus RTU) root.
//!
//! Frame codec, CRC, the drive register map, and the byte-transport and
//! clock seams consumed by the control unit.

pub mod crc;
pub mod frame;
pub mod registers;
pub mod transport;
