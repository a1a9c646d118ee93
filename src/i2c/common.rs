// Licensed under the Apache-2.0 license

//! Common types and constants for the MT7621 I2C driver modules.
//!
//! This module provides the controller configuration, the capability set the
//! driver advertises to the bus layer, and the transfer-size quirks of the
//! hardware.

use super::poll::{Poller, DEFAULT_INTERVAL, DEFAULT_TIMEOUT};
use fugit::{HertzU32, MicrosDurationU32, MillisDurationU32};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum I2cSpeed {
    Standard = 100_000,
    Fast = 400_000,
    FastPlus = 1_000_000,
}

impl I2cSpeed {
    #[must_use]
    pub fn hertz(self) -> HertzU32 {
        HertzU32::from_raw(self as u32)
    }
}

impl From<I2cSpeed> for HertzU32 {
    fn from(speed: I2cSpeed) -> Self {
        speed.hertz()
    }
}

/// Bus clock used when the configuration does not name one.
pub const DEFAULT_BUS_CLOCK: I2cSpeed = I2cSpeed::Fast;

/// Retries the bus layer grants a batch that timed out.
pub const DEFAULT_RETRIES: u8 = 3;

/// Capabilities advertised to the bus layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Functionality(u32);

impl Functionality {
    /// Plain I2C transfers.
    pub const I2C: Self = Self(0x0000_0001);
    /// SMBus emulated through I2C messages, including block reads with a
    /// length prefix.
    pub const SMBUS_EMUL: Self = Self(0x0eff_0008);
    /// Arbitration between several masters.
    pub const MULTI_MASTER: Self = Self(0x4000_0000);

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Transfer size limits the bus layer must enforce before calling the driver.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Quirks {
    pub max_read_len: usize,
    pub max_write_len: usize,
}

/// Byte-count limit of the SM0 data path.
pub const BYTECNT_MAX: usize = 64;

pub const MT7621_QUIRKS: Quirks = Quirks {
    max_read_len: BYTECNT_MAX,
    max_write_len: BYTECNT_MAX,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct I2cConfig {
    pub bus_clock: HertzU32,
    pub timeout: MillisDurationU32,
    pub poll_interval: MicrosDurationU32,
    pub retries: u8,
}

impl Default for I2cConfig {
    fn default() -> Self {
        I2cConfigBuilder::new().build()
    }
}

impl I2cConfig {
    #[must_use]
    pub fn poller(&self) -> Poller {
        Poller::new(self.timeout, self.poll_interval)
    }
}

pub struct I2cConfigBuilder {
    bus_clock: HertzU32,
    timeout: MillisDurationU32,
    poll_interval: MicrosDurationU32,
    retries: u8,
}

impl Default for I2cConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl I2cConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bus_clock: DEFAULT_BUS_CLOCK.hertz(),
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_INTERVAL,
            retries: DEFAULT_RETRIES,
        }
    }
    #[must_use]
    pub fn speed(mut self, speed: I2cSpeed) -> Self {
        self.bus_clock = speed.hertz();
        self
    }
    /// Any bus clock, e.g. a `clock-frequency` property.
    #[must_use]
    pub fn bus_clock(mut self, clock: HertzU32) -> Self {
        self.bus_clock = clock;
        self
    }
    #[must_use]
    pub fn timeout(mut self, timeout: MillisDurationU32) -> Self {
        self.timeout = timeout;
        self
    }
    #[must_use]
    pub fn poll_interval(mut self, interval: MicrosDurationU32) -> Self {
        self.poll_interval = interval;
        self
    }
    #[must_use]
    pub fn retries(mut self, retries: u8) -> Self {
        self.retries = retries;
        self
    }
    #[must_use]
    pub fn build(self) -> I2cConfig {
        I2cConfig {
            bus_clock: self.bus_clock,
            timeout: self.timeout,
            poll_interval: self.poll_interval,
            retries: self.retries,
        }
    }
}
