// Licensed under the Apache-2.0 license

//! Controller discovery from a flattened device tree.
//!
//! See `docs/devicetree/mediatek,mt7621-i2c.txt` for the binding.

use core::ptr::NonNull;

use fdt::node::FdtNode;
use fdt::Fdt;
use fugit::HertzU32;

use super::common::{I2cConfig, I2cConfigBuilder, DEFAULT_BUS_CLOCK};
use crate::platform::Mmio;

pub const COMPATIBLE: &str = "mediatek,mt7621-i2c";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProbeError {
    /// The blob is not a device tree.
    BadBlob,
    /// No usable `reg` entry (address and size).
    RegNotFound,
    /// No `clocks` phandle.
    ClocksNotFound,
    /// A property exists but cannot be decoded.
    InvalidProperty(&'static str),
}

/// Everything the driver needs from one controller node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ControllerNode<'a> {
    pub name: &'a str,
    pub base: usize,
    pub size: usize,
    pub clock_frequency: HertzU32,
    /// Phandle of the input clock.
    pub clock: u32,
    /// Phandle of the reset controller, if wired.
    pub reset: Option<u32>,
}

impl<'a> ControllerNode<'a> {
    /// Extract controller parameters from `node`.
    ///
    /// # Errors
    ///
    /// [`ProbeError::RegNotFound`] or [`ProbeError::ClocksNotFound`] when a
    /// required property is missing, [`ProbeError::InvalidProperty`] when
    /// `clock-frequency` does not hold a 32-bit value.
    pub fn from_fdt_node(node: &FdtNode<'_, 'a>) -> Result<Self, ProbeError> {
        let reg = node
            .reg()
            .ok_or(ProbeError::RegNotFound)?
            .next()
            .ok_or(ProbeError::RegNotFound)?;
        let size = reg.size.ok_or(ProbeError::RegNotFound)?;

        let clock_frequency = match node.property("clock-frequency") {
            Some(prop) => prop
                .as_usize()
                .and_then(|hz| u32::try_from(hz).ok())
                .map(HertzU32::from_raw)
                .ok_or(ProbeError::InvalidProperty("clock-frequency"))?,
            None => DEFAULT_BUS_CLOCK.hertz(),
        };

        let clock = node
            .property("clocks")
            .and_then(|prop| first_cell(prop.value))
            .ok_or(ProbeError::ClocksNotFound)?;
        let reset = node
            .property("resets")
            .and_then(|prop| first_cell(prop.value));

        Ok(Self {
            name: node.name,
            base: reg.starting_address as usize,
            size,
            clock_frequency,
            clock,
            reset,
        })
    }

    /// Controller configuration with the node's bus clock.
    #[must_use]
    pub fn config(&self) -> I2cConfig {
        I2cConfigBuilder::new()
            .bus_clock(self.clock_frequency)
            .build()
    }

    /// Register window described by `reg`.
    ///
    /// # Errors
    ///
    /// [`ProbeError::RegNotFound`] for a null base address.
    ///
    /// # Safety
    ///
    /// The device tree must describe the hardware this code runs on, with the
    /// register block identity-mapped and not in use elsewhere.
    pub unsafe fn mmio(&self) -> Result<Mmio, ProbeError> {
        let base = NonNull::new(self.base as *mut u32).ok_or(ProbeError::RegNotFound)?;
        // SAFETY: forwarded to the caller.
        Ok(unsafe { Mmio::new(base, self.size) })
    }
}

/// Parse a device tree blob.
///
/// # Errors
///
/// [`ProbeError::BadBlob`] if the header is invalid or the buffer is too
/// small for it.
pub fn parse(blob: &[u8]) -> Result<Fdt<'_>, ProbeError> {
    Fdt::new(blob).map_err(|_| ProbeError::BadBlob)
}

/// Every enabled node compatible with this driver, in tree order.
pub fn find_controllers<'b, 'a>(
    fdt: &'b Fdt<'a>,
) -> impl Iterator<Item = Result<ControllerNode<'a>, ProbeError>> + 'b {
    fdt.all_nodes()
        .filter(|node| is_compatible(node) && is_enabled(node))
        .map(|node| ControllerNode::from_fdt_node(&node))
}

fn is_compatible(node: &FdtNode<'_, '_>) -> bool {
    node.compatible()
        .is_some_and(|compatible| compatible.all().any(|c| c == COMPATIBLE))
}

fn is_enabled(node: &FdtNode<'_, '_>) -> bool {
    node.property("status")
        .and_then(|prop| prop.as_str())
        .map_or(true, |status| status == "okay" || status == "ok")
}

fn first_cell(value: &[u8]) -> Option<u32> {
    value
        .get(..4)?
        .try_into()
        .ok()
        .map(u32::from_be_bytes)
}
