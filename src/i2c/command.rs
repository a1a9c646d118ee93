// Licensed under the Apache-2.0 license

//! SM0CTL1 command words.

use super::regs::{
    CTL1_ACK_MASK, CTL1_ACK_SHIFT, CTL1_MODE_MASK, CTL1_MODE_SHIFT, CTL1_PGLEN_MASK,
    CTL1_PGLEN_SHIFT, CTL1_TRI_BUSY,
};

/// Largest payload the hardware moves per triggered command.
pub const MAX_CHUNK: usize = 8;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Mode {
    Start = 0x1,
    Write = 0x2,
    Stop = 0x3,
    ReadNack = 0x4,
    ReadAck = 0x5,
}

impl Mode {
    #[must_use]
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits & CTL1_MODE_MASK {
            0x1 => Some(Self::Start),
            0x2 => Some(Self::Write),
            0x3 => Some(Self::Stop),
            0x4 => Some(Self::ReadNack),
            0x5 => Some(Self::ReadAck),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_read(self) -> bool {
        matches!(self, Self::ReadAck | Self::ReadNack)
    }
}

/// One triggered hardware command.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Command {
    pub mode: Mode,
    /// Bytes moved by this command, 1..=8.
    pub count: u8,
}

impl Command {
    pub const START: Self = Self::new(Mode::Start, 1);
    pub const STOP: Self = Self::new(Mode::Stop, 1);

    /// `count` is clamped into 1..=8.
    #[must_use]
    pub const fn new(mode: Mode, count: u8) -> Self {
        let count = if count == 0 {
            1
        } else if count as usize > MAX_CHUNK {
            MAX_CHUNK as u8
        } else {
            count
        };
        Self { mode, count }
    }

    /// SM0CTL1 value that triggers this command.
    ///
    /// The expected-ACK mask is always all ones.
    #[must_use]
    pub const fn encode(self) -> u32 {
        (CTL1_ACK_MASK << CTL1_ACK_SHIFT)
            | (((self.count as u32).wrapping_sub(1) & CTL1_PGLEN_MASK) << CTL1_PGLEN_SHIFT)
            | (((self.mode as u32) & CTL1_MODE_MASK) << CTL1_MODE_SHIFT)
            | CTL1_TRI_BUSY
    }

    /// Inverse of [`Command::encode`], `None` if no command is triggered.
    #[must_use]
    pub fn decode(word: u32) -> Option<Self> {
        if word & CTL1_TRI_BUSY == 0 {
            return None;
        }
        let mode = Mode::from_bits(word >> CTL1_MODE_SHIFT)?;
        let count = ((word >> CTL1_PGLEN_SHIFT) & CTL1_PGLEN_MASK) as u8 + 1;
        Some(Self { mode, count })
    }
}
