// Licensed under the Apache-2.0 license

//! # I2C Hardware Abstraction Traits
//!
//! The bus layer sees a controller driver through two small traits:
//!
//! ```text
//! I2cHardwareCore (timing + recovery)
//!     └── I2cMaster (message transfers + capability report)
//! ```
//!
//! `I2cMaster` is message based: a driver receives a batch of
//! [`Message`]s and reports how many it moved. The byte-oriented helpers
//! (`write`, `read`, `write_read`, `transaction_slice`) are provided on top
//! of `transfer`, so a driver only implements the batch entry point.

use crate::i2c::common::{Functionality, Quirks};
use crate::i2c::message::Message;
use embedded_hal::i2c::{Operation, SevenBitAddress};
use fugit::HertzU32;

/// Core I2C hardware interface providing timing and recovery.
pub trait I2cHardwareCore {
    /// Hardware-specific error type that implements embedded-hal error traits
    type Error: embedded_hal::i2c::Error + core::fmt::Debug;

    /// Program the controller for `bus_clock`.
    ///
    /// # Returns
    ///
    /// The bus clock the hardware actually runs at after rounding.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested clock cannot be programmed.
    fn configure_timing(&mut self, bus_clock: HertzU32) -> Result<HertzU32, Self::Error>;

    /// Attempt to recover the controller from a stuck condition
    ///
    /// # Errors
    ///
    /// Returns an error if bus recovery fails or is not supported by the hardware.
    /// Some implementations may always succeed and return `Ok(())`.
    fn recover_bus(&mut self) -> Result<(), Self::Error>;
}

/// I2C Master mode operations
///
/// # Examples
///
/// ```rust,no_run
/// use mt7621_ddk::i2c::traits::I2cMaster;
///
/// fn read_sensor<T: I2cMaster>(i2c: &mut T) -> Result<u16, T::Error> {
///     let mut data = [0u8; 2];
///     i2c.read(0x48, &mut data)?;
///     Ok(u16::from_be_bytes(data))
/// }
/// ```
pub trait I2cMaster: I2cHardwareCore {
    /// Run a batch of messages in order.
    ///
    /// Returns the number of messages transferred.
    ///
    /// # Errors
    ///
    /// Any message the driver cannot run, or a hardware failure. Messages
    /// after the failing one are not started.
    fn transfer(&mut self, msgs: &mut [Message<'_>]) -> Result<usize, Self::Error>;

    /// Capabilities of this controller.
    fn functionality(&self) -> Functionality;

    /// Per-message size limits the bus layer has to enforce, if any.
    fn quirks(&self) -> Option<Quirks> {
        None
    }

    /// Whether the bus layer may retry a batch that failed with `error`.
    fn is_retryable(&self, _error: &Self::Error) -> bool {
        false
    }

    /// Write data to a target device at the given address
    ///
    /// # Errors
    ///
    /// See [`I2cMaster::transfer`].
    fn write(&mut self, addr: SevenBitAddress, bytes: &[u8]) -> Result<(), Self::Error> {
        self.transfer(&mut [Message::write(addr, bytes)]).map(drop)
    }

    /// Read data from a target device at the given address
    ///
    /// # Errors
    ///
    /// See [`I2cMaster::transfer`].
    fn read(&mut self, addr: SevenBitAddress, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.transfer(&mut [Message::read(addr, buffer)]).map(drop)
    }

    /// Write followed by read, as one batch.
    ///
    /// Controllers without repeated start emit a STOP between the two.
    ///
    /// # Errors
    ///
    /// See [`I2cMaster::transfer`].
    fn write_read(
        &mut self,
        addr: SevenBitAddress,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.transfer(&mut [Message::write(addr, bytes), Message::read(addr, buffer)])
            .map(drop)
    }

    /// Execute a sequence of embedded-hal operations, one message each.
    ///
    /// # Errors
    ///
    /// The first failing operation aborts the sequence.
    fn transaction_slice(
        &mut self,
        addr: SevenBitAddress,
        ops_slice: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for op in ops_slice.iter_mut() {
            let msg = match op {
                Operation::Read(buffer) => Message::read(addr, buffer),
                Operation::Write(bytes) => Message::write(addr, bytes),
            };
            self.transfer(&mut [msg])?;
        }
        Ok(())
    }
}
