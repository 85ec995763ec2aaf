//! In-process simulation of the drive bank.

pub mod drives;
