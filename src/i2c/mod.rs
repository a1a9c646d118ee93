// Licensed under the Apache-2.0 license

//! MediaTek MT7621 I2C driver module.
//!
//! The SM0 bus master is driven in manual mode: the driver sequences every
//! START, byte transfer and STOP itself. [`mt7621_i2c`] holds the register
//! level engine, [`i2c_controller`] the bus adapter built on top of it and
//! [`devicetree`] the probe path from a flattened device tree.

pub mod chunk;
pub mod command;
pub mod common;
pub mod devicetree;
pub mod i2c_controller;
pub mod message;
pub mod mt7621_i2c;
pub mod poll;
pub mod regs;
#[cfg(test)]
pub(crate) mod sim;
pub mod traits;

pub use i2c_controller::{BusError, I2cController};
pub use message::{Message, MessageFlags, Payload};
pub use mt7621_i2c::{Error, Mt7621I2c, Resources};
