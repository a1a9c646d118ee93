// Licensed under the Apache-2.0 license

//! Bounded busy-wait on status bits.
//!
//! Every wait samples the register, sleeps one interval and gives up once the
//! deadline has passed. There is no other way to cancel a wait.

use crate::platform::{RegisterAccess, Timebase};
use embedded_hal::delay::DelayNs;
use fugit::{MicrosDurationU32, MicrosDurationU64, MillisDurationU32};

/// Time allowed for devices to respond, including clock stretching.
pub const DEFAULT_TIMEOUT: MillisDurationU32 = MillisDurationU32::millis(1000);
/// Sleep between two samples of a status register.
pub const DEFAULT_INTERVAL: MicrosDurationU32 = MicrosDurationU32::micros(100);

/// The polled condition was not observed before the deadline.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PollTimeout;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Poller {
    timeout: MillisDurationU32,
    interval: MicrosDurationU32,
}

impl Default for Poller {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_INTERVAL)
    }
}

impl Poller {
    #[must_use]
    pub const fn new(timeout: MillisDurationU32, interval: MicrosDurationU32) -> Self {
        Self { timeout, interval }
    }

    #[must_use]
    pub const fn timeout(&self) -> MillisDurationU32 {
        self.timeout
    }

    #[must_use]
    pub const fn interval(&self) -> MicrosDurationU32 {
        self.interval
    }

    /// Wait until `read32(offset) & mask == 0`.
    ///
    /// A bit that clears on the sample taken after the deadline still counts
    /// as success.
    ///
    /// # Errors
    ///
    /// [`PollTimeout`] if the bits are still set after the deadline.
    pub fn await_cleared<R, T>(
        &self,
        regs: &R,
        timer: &mut T,
        offset: usize,
        mask: u32,
    ) -> Result<(), PollTimeout>
    where
        R: RegisterAccess,
        T: Timebase + DelayNs,
    {
        if self.sample_until(regs, timer, offset, |status| status & mask == 0) {
            return Ok(());
        }
        if regs.read32(offset) & mask == 0 {
            Ok(())
        } else {
            Err(PollTimeout)
        }
    }

    /// Wait until any bit of `mask` reads as set.
    ///
    /// # Errors
    ///
    /// [`PollTimeout`] if no bit was seen set before the deadline.
    pub fn await_set<R, T>(
        &self,
        regs: &R,
        timer: &mut T,
        offset: usize,
        mask: u32,
    ) -> Result<(), PollTimeout>
    where
        R: RegisterAccess,
        T: Timebase + DelayNs,
    {
        if self.sample_until(regs, timer, offset, |status| status & mask != 0) {
            Ok(())
        } else {
            Err(PollTimeout)
        }
    }

    fn sample_until<R, T>(
        &self,
        regs: &R,
        timer: &mut T,
        offset: usize,
        done: impl Fn(u32) -> bool,
    ) -> bool
    where
        R: RegisterAccess,
        T: Timebase + DelayNs,
    {
        let deadline = timer.now() + MicrosDurationU64::millis(u64::from(self.timeout.ticks()));
        loop {
            if done(regs.read32(offset)) {
                return true;
            }
            timer.delay_us(self.interval.ticks());
            if timer.now() >= deadline {
                return false;
            }
        }
    }
}
