// Licensed under the Apache-2.0 license

//! Bus adapter around an I2C master driver.
//!
//! The adapter is what the rest of the firmware talks to. It enforces the
//! driver's transfer-size quirks before any hardware is touched, retries
//! batches the driver marks as retryable, and exposes the embedded-hal
//! `I2c` traits. Holding the adapter by `&mut` is what serializes batches
//! onto one bus.

use crate::common::{Logger, NoOpLogger};
use crate::i2c::common::{Functionality, I2cConfig};
use crate::i2c::message::{Message, MessageFlags, Payload};
use crate::i2c::traits::I2cMaster;
use embedded_hal::i2c::{ErrorKind, Operation, SevenBitAddress, TenBitAddress};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BusError<E> {
    /// The driver failed the batch.
    Hardware(E),
    /// Message `index` is longer than the controller can move.
    Unsupported { index: usize, len: usize, max: usize },
}

impl<E: embedded_hal::i2c::Error> embedded_hal::i2c::Error for BusError<E> {
    fn kind(&self) -> ErrorKind {
        match self {
            BusError::Hardware(e) => e.kind(),
            BusError::Unsupported { .. } => ErrorKind::Other,
        }
    }
}

pub struct I2cController<H: I2cMaster, L: Logger = NoOpLogger> {
    pub hardware: H,
    pub config: I2cConfig,
    pub logger: L,
}

impl<H: I2cMaster, L: Logger> I2cController<H, L> {
    pub fn new(hardware: H, config: I2cConfig, logger: L) -> Self {
        Self {
            hardware,
            config,
            logger,
        }
    }

    /// Unregister the adapter and hand back the driver.
    pub fn into_hardware(self) -> H {
        self.hardware
    }

    #[must_use]
    pub fn functionality(&self) -> Functionality {
        self.hardware.functionality()
    }

    /// Run a batch, retrying up to `config.retries` times when the driver
    /// reports a retryable failure.
    ///
    /// # Errors
    ///
    /// [`BusError::Unsupported`] if a message breaks the driver's quirks, or
    /// the driver's error from the last attempt.
    pub fn transfer(&mut self, msgs: &mut [Message<'_>]) -> Result<usize, BusError<H::Error>> {
        self.check_quirks(msgs)?;

        let mut attempt = 0;
        loop {
            match self.hardware.transfer(msgs) {
                Err(e) if attempt < self.config.retries && self.hardware.is_retryable(&e) => {
                    attempt += 1;
                    self.logger
                        .debug(format_args!("retry {attempt} after {e:?}"));
                }
                result => return result.map_err(BusError::Hardware),
            }
        }
    }

    fn check_quirks(&mut self, msgs: &[Message<'_>]) -> Result<(), BusError<H::Error>> {
        let Some(quirks) = self.hardware.quirks() else {
            return Ok(());
        };
        for (index, msg) in msgs.iter().enumerate() {
            let max = match msg.payload {
                Payload::Read(_) => quirks.max_read_len,
                Payload::Write(_) => quirks.max_write_len,
            };
            if msg.len() > max {
                self.logger.error(format_args!(
                    "msg {index} len {} exceeds {max} byte limit",
                    msg.len()
                ));
                return Err(BusError::Unsupported {
                    index,
                    len: msg.len(),
                    max,
                });
            }
        }
        Ok(())
    }
}

impl<H: I2cMaster, L: Logger> embedded_hal::i2c::ErrorType for I2cController<H, L> {
    type Error = BusError<H::Error>;
}

impl<H: I2cMaster, L: Logger> embedded_hal::i2c::I2c for I2cController<H, L> {
    fn read(&mut self, addr: SevenBitAddress, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.transfer(&mut [Message::read(addr, buffer)]).map(drop)
    }

    fn write(&mut self, addr: SevenBitAddress, bytes: &[u8]) -> Result<(), Self::Error> {
        self.transfer(&mut [Message::write(addr, bytes)]).map(drop)
    }

    fn write_read(
        &mut self,
        addr: SevenBitAddress,
        bytes: &[u8],
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.transfer(&mut [Message::write(addr, bytes), Message::read(addr, buffer)])
            .map(drop)
    }

    fn transaction(
        &mut self,
        addr: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for op in operations.iter_mut() {
            let msg = match op {
                Operation::Read(buffer) => Message::read(addr, buffer),
                Operation::Write(bytes) => Message::write(addr, bytes),
            };
            self.transfer(&mut [msg])?;
        }
        Ok(())
    }
}

/// 10-bit targets are handed to the driver flagged as such; drivers that
/// cannot address them reject the message.
impl<H: I2cMaster, L: Logger> embedded_hal::i2c::I2c<TenBitAddress> for I2cController<H, L> {
    fn transaction(
        &mut self,
        addr: TenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for op in operations.iter_mut() {
            let payload = match op {
                Operation::Read(buffer) => Payload::Read(buffer),
                Operation::Write(bytes) => Payload::Write(bytes),
            };
            self.transfer(&mut [Message {
                address: addr,
                flags: MessageFlags::TEN_BIT,
                payload,
            }])?;
        }
        Ok(())
    }
}
