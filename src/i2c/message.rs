// Licensed under the Apache-2.0 license

//! Bus messages handed to the transfer engine.
//!
//! A message borrows its buffer for the duration of one transfer call only;
//! nothing in the driver keeps a reference past the call.

/// Modifier flags of a [`Message`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MessageFlags(u16);

impl MessageFlags {
    pub const NONE: Self = Self(0);
    /// The address is a 10-bit address.
    pub const TEN_BIT: Self = Self(0x0010);
    /// The first byte read is the count of the bytes that follow (SMBus
    /// block read).
    pub const RECV_LEN: Self = Self(0x0400);

    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl core::ops::BitOr for MessageFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Direction and buffer of a message.
#[derive(Debug)]
pub enum Payload<'a> {
    Read(&'a mut [u8]),
    Write(&'a [u8]),
}

/// One START .. STOP transaction with a single target.
#[derive(Debug)]
pub struct Message<'a> {
    pub address: u16,
    pub flags: MessageFlags,
    pub payload: Payload<'a>,
}

impl<'a> Message<'a> {
    #[must_use]
    pub fn read(address: u8, buffer: &'a mut [u8]) -> Self {
        Self {
            address: u16::from(address),
            flags: MessageFlags::NONE,
            payload: Payload::Read(buffer),
        }
    }

    #[must_use]
    pub fn write(address: u8, bytes: &'a [u8]) -> Self {
        Self {
            address: u16::from(address),
            flags: MessageFlags::NONE,
            payload: Payload::Write(bytes),
        }
    }

    /// SMBus block read. `buffer[0]` receives the length byte and the
    /// announced bytes follow it, so the buffer must be large enough for
    /// the longest block the device may send plus one.
    #[must_use]
    pub fn block_read(address: u8, buffer: &'a mut [u8]) -> Self {
        Self {
            address: u16::from(address),
            flags: MessageFlags::RECV_LEN,
            payload: Payload::Read(buffer),
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: MessageFlags) -> Self {
        self.flags = self.flags | flags;
        self
    }

    #[must_use]
    pub fn is_read(&self) -> bool {
        matches!(self.payload, Payload::Read(_))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match &self.payload {
            Payload::Read(buf) => buf.len(),
            Payload::Write(bytes) => bytes.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Address byte sent after START: address, then the R/W bit.
    #[must_use]
    pub fn address_byte(&self) -> u8 {
        let addr = (self.address & 0x7f) as u8;
        (addr << 1) | u8::from(self.is_read())
    }
}
