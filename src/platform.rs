// Licensed under the Apache-2.0 license

//! Platform service seams.
//!
//! The drivers in this crate never touch raw pointers, timers or the system
//! controller directly. Board code supplies these services through the traits
//! below, which also lets host tests run the drivers against simulated
//! hardware.

use core::ptr::NonNull;
use fugit::{HertzU32, TimerInstantU64};

/// Microsecond timestamp from a free-running monotonic counter.
pub type MicrosInstant = TimerInstantU64<1_000_000>;

/// 32-bit register window.
///
/// Offsets are in bytes from the start of the window. Access is infallible
/// once the window exists; offset correctness is the caller's problem.
pub trait RegisterAccess {
    fn read32(&self, offset: usize) -> u32;
    fn write32(&mut self, offset: usize, value: u32);
}

/// Memory-mapped register window.
pub struct Mmio {
    base: NonNull<u32>,
    size: usize,
}

impl Mmio {
    /// Wrap an already mapped register window.
    ///
    /// # Safety
    ///
    /// `base` must point to a device register block at least `size` bytes
    /// long, mapped for the lifetime of the returned value, and not aliased
    /// by any other `Mmio`.
    #[must_use]
    pub const unsafe fn new(base: NonNull<u32>, size: usize) -> Self {
        Self { base, size }
    }

    #[must_use]
    pub fn base(&self) -> NonNull<u32> {
        self.base
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    fn reg(&self, offset: usize) -> *mut u32 {
        debug_assert!(offset % 4 == 0 && offset + 4 <= self.size);
        // SAFETY: the window is `size` bytes long per the `new` contract and
        // the driver only uses offsets from its register map.
        unsafe { self.base.as_ptr().byte_add(offset) }
    }
}

impl RegisterAccess for Mmio {
    fn read32(&self, offset: usize) -> u32 {
        // SAFETY: see `reg`.
        unsafe { self.reg(offset).read_volatile() }
    }

    fn write32(&mut self, offset: usize, value: u32) {
        // SAFETY: see `reg`.
        unsafe { self.reg(offset).write_volatile(value) }
    }
}

/// Monotonic time source used for polling deadlines.
pub trait Timebase {
    fn now(&self) -> MicrosInstant;
}

/// Gate and rate of a peripheral's input clock.
pub trait ClockControl {
    type Error: core::fmt::Debug;

    /// Prepare and ungate the clock.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if the clock cannot be enabled.
    fn enable(&mut self) -> Result<(), Self::Error>;

    /// Gate the clock and release it.
    fn disable(&mut self);

    /// Current input rate.
    fn rate(&self) -> HertzU32;
}

/// Reset line of a single peripheral.
pub trait ResetControl {
    fn reset_assert(&mut self);
    fn reset_deassert(&mut self);

    /// Full assert/deassert pulse.
    fn pulse(&mut self) {
        self.reset_assert();
        self.reset_deassert();
    }
}

/// Reset line for controllers without a dedicated reset.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoReset;

impl ResetControl for NoReset {
    fn reset_assert(&mut self) {}
    fn reset_deassert(&mut self) {}
}
