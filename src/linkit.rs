// Licensed under the Apache-2.0 license

//! LinkIt Smart 7688 board identification.
//!
//! The board name and revision sit as two fixed 16-byte fields at offset
//! 0x400 of the `factory` flash partition. On the LinkIt Smart 7688 the
//! bootstrap latch on GPIO 11 has to be driven low once the board is
//! identified.

use core::fmt::Debug;

use embedded_hal::digital::{OutputPin, PinState};
use embedded_storage::ReadStorage;
use heapless::String;
use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout};

use crate::common::Logger;

pub const FACTORY_PARTITION: &str = "factory";
pub const HW_DATA_OFFSET: u32 = 0x400;
pub const LATCH_GPIO: u32 = 11;
pub const LATCH_LABEL: &str = "bootstrap";
pub const LATCH_BOARD: &str = "LINKITS7688";

const FIELD_LEN: usize = 16;

/// Longest name a field can hold; its last byte is always a terminator.
pub const NAME_LEN: usize = FIELD_LEN - 1;

#[derive(FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
struct RawHwData {
    board: [u8; FIELD_LEN],
    rev: [u8; FIELD_LEN],
}

/// Flash partitions by name.
pub trait MtdTable {
    type Partition: ReadStorage;

    fn open(&mut self, name: &str) -> Option<Self::Partition>;
}

/// GPIO lines by number.
pub trait GpioProvider {
    type Pin: OutputPin;
    type Error: Debug;

    /// Claim `line` for `label` and configure it as an output at `initial`.
    ///
    /// # Errors
    ///
    /// The line is missing or already claimed.
    fn request_output(
        &mut self,
        line: u32,
        label: &'static str,
        initial: PinState,
    ) -> Result<Self::Pin, Self::Error>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardInfo {
    pub board: String<NAME_LEN>,
    pub revision: String<NAME_LEN>,
}

/// Probed board; holds the latch line for as long as it lives.
pub struct Linkit<P> {
    pub info: BoardInfo,
    pub latch: Option<P>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProbeError<S, G> {
    NoFactoryPartition,
    Read(S),
    Gpio(G),
}

type PartitionError<M> = <<M as MtdTable>::Partition as ReadStorage>::Error;

/// Identify the board and set up the bootstrap latch where needed.
///
/// # Errors
///
/// - [`ProbeError::NoFactoryPartition`] if `factory` does not exist.
/// - [`ProbeError::Read`] if the identification block cannot be read.
/// - [`ProbeError::Gpio`] if the latch line cannot be claimed.
pub fn probe<M, G, L>(
    mtd: &mut M,
    gpio: &mut G,
    logger: &mut L,
) -> Result<Linkit<G::Pin>, ProbeError<PartitionError<M>, G::Error>>
where
    M: MtdTable,
    G: GpioProvider,
    L: Logger,
{
    let mut partition = mtd
        .open(FACTORY_PARTITION)
        .ok_or(ProbeError::NoFactoryPartition)?;

    let mut hw = RawHwData::new_zeroed();
    partition
        .read(HW_DATA_OFFSET, hw.as_mut_bytes())
        .map_err(ProbeError::Read)?;

    let info = BoardInfo {
        board: sanitize(&hw.board),
        revision: sanitize(&hw.rev),
    };
    logger.info(format_args!("Version  : {}", info.board));
    logger.info(format_args!("Revision : {}", info.revision));

    let mut latch = None;
    if info.board == LATCH_BOARD {
        logger.info(format_args!("setting up bootstrap latch"));
        let pin = gpio
            .request_output(LATCH_GPIO, LATCH_LABEL, PinState::Low)
            .map_err(|e| {
                logger.error(format_args!("failed to setup bootstrap gpio"));
                ProbeError::Gpio(e)
            })?;
        latch = Some(pin);
    }

    Ok(Linkit { info, latch })
}

/// Printable prefix of a factory string field.
///
/// Control characters, space and bytes outside 7-bit ASCII end the string,
/// and so does the end of the first 15 bytes.
#[must_use]
pub fn sanitize(field: &[u8; FIELD_LEN]) -> String<NAME_LEN> {
    let mut name = String::new();
    for &byte in field
        .iter()
        .take(NAME_LEN)
        .take_while(|&&b| b > 0x20 && b < 0x80)
    {
        if name.push(char::from(byte)).is_err() {
            break;
        }
    }
    name
}
