// Licensed under the Apache-2.0 license

//! Behavioral model of the SM0 block and its platform services, for host
//! tests.
//!
//! The model executes a command as soon as SM0CTL1 is written with the
//! trigger bit set and records what was issued together with the data
//! registers at trigger time. A single target device sits on the bus.

use super::chunk::{pack, unpack};
use super::command::{Command, Mode};
use super::regs::{SM0CFG0, SM0CTL1, SM0D0, SM0D1, SM0ST, ST_BUSY, CTL1_TRI_BUSY, WINDOW_SIZE};
use crate::platform::{ClockControl, MicrosInstant, RegisterAccess, ResetControl, Timebase};
use embedded_hal::delay::DelayNs;
use fugit::HertzU32;
use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

/// Simulated monotonic clock advanced only by delays.
#[derive(Default)]
pub struct SimTimer {
    now_ns: u64,
}

impl SimTimer {
    pub fn elapsed_us(&self) -> u64 {
        self.now_ns / 1000
    }
}

impl Timebase for SimTimer {
    fn now(&self) -> MicrosInstant {
        MicrosInstant::from_ticks(self.now_ns / 1000)
    }
}

impl DelayNs for SimTimer {
    fn delay_ns(&mut self, ns: u32) {
        self.now_ns += u64::from(ns);
    }
}

/// A command as seen by the hardware.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Issued {
    pub command: Command,
    pub d0: u32,
    pub d1: u32,
    pub cfg0: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Started,
    Addressed { matched: bool },
}

/// Target device answering at one 7-bit address.
#[derive(Default)]
pub struct SimTarget {
    pub address: u8,
    /// Bytes the master wrote to the device.
    pub received: Vec<u8>,
    /// Bytes the device returns on reads; `0xff` once exhausted.
    pub responses: VecDeque<u8>,
}

pub struct SimController {
    words: [u32; WINDOW_SIZE / 4],
    phase: Phase,
    pub target: SimTarget,
    pub issued: Vec<Issued>,
    /// SM0ST.BUSY never clears.
    pub stuck_busy: bool,
    /// The trigger bit stays set once this many commands were issued.
    pub hang_after: Option<usize>,
    accesses: Cell<usize>,
}

impl SimController {
    pub fn new(target_address: u8) -> Self {
        Self {
            words: [0; WINDOW_SIZE / 4],
            phase: Phase::Idle,
            target: SimTarget {
                address: target_address,
                ..SimTarget::default()
            },
            issued: Vec::new(),
            stuck_busy: false,
            hang_after: None,
            accesses: Cell::new(0),
        }
    }

    pub fn respond_with(mut self, bytes: &[u8]) -> Self {
        self.target.responses.extend(bytes.iter().copied());
        self
    }

    /// Register reads and writes performed so far.
    pub fn accesses(&self) -> usize {
        self.accesses.get()
    }

    pub fn word(&self, offset: usize) -> u32 {
        self.words[offset / 4]
    }

    pub fn modes(&self) -> Vec<Mode> {
        self.issued.iter().map(|i| i.command.mode).collect()
    }

    fn execute(&mut self, command: Command) {
        let d0 = self.word(SM0D0);
        let d1 = self.word(SM0D1);
        self.issued.push(Issued {
            command,
            d0,
            d1,
            cfg0: self.word(SM0CFG0),
        });

        match (command.mode, self.phase) {
            (Mode::Start, _) => self.phase = Phase::Started,
            (Mode::Stop, _) => self.phase = Phase::Idle,
            (Mode::Write, Phase::Started) => {
                let byte = d0 & 0xff;
                self.phase = Phase::Addressed {
                    matched: (byte >> 1) as u8 == self.target.address,
                };
            }
            (Mode::Write, Phase::Addressed { matched: true }) => {
                let mut bytes = [0u8; 8];
                let count = usize::from(command.count);
                unpack(d0, d1, &mut bytes[..count]);
                self.target.received.extend_from_slice(&bytes[..count]);
            }
            (Mode::ReadAck | Mode::ReadNack, phase) => {
                let mut bytes = [0xffu8; 8];
                if phase == (Phase::Addressed { matched: true }) {
                    for b in bytes.iter_mut().take(usize::from(command.count)) {
                        *b = self.target.responses.pop_front().unwrap_or(0xff);
                    }
                }
                let (lo, hi) = pack(&bytes[..usize::from(command.count)]);
                self.words[SM0D0 / 4] = lo;
                self.words[SM0D1 / 4] = hi;
            }
            _ => {}
        }
    }
}

impl RegisterAccess for SimController {
    fn read32(&self, offset: usize) -> u32 {
        self.accesses.set(self.accesses.get() + 1);
        match offset {
            SM0ST if self.stuck_busy => ST_BUSY,
            SM0ST => 0,
            _ => self.word(offset),
        }
    }

    fn write32(&mut self, offset: usize, value: u32) {
        self.accesses.set(self.accesses.get() + 1);
        self.words[offset / 4] = value;
        if offset == SM0CTL1 {
            if let Some(command) = Command::decode(value) {
                self.execute(command);
                let hung = self.hang_after.is_some_and(|n| self.issued.len() > n);
                if !hung {
                    self.words[SM0CTL1 / 4] &= !CTL1_TRI_BUSY;
                }
            }
        }
    }
}

/// Reset line counting pulses through a shared handle.
#[derive(Clone, Default)]
pub struct SimReset {
    pub asserts: Rc<Cell<usize>>,
    pub deasserts: Rc<Cell<usize>>,
}

impl ResetControl for SimReset {
    fn reset_assert(&mut self) {
        self.asserts.set(self.asserts.get() + 1);
    }

    fn reset_deassert(&mut self) {
        self.deasserts.set(self.deasserts.get() + 1);
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SimClockError;

#[derive(Clone)]
pub struct SimClock {
    pub rate: HertzU32,
    pub enabled: Rc<Cell<bool>>,
    pub fail_enable: bool,
}

impl SimClock {
    pub fn new(rate: HertzU32) -> Self {
        Self {
            rate,
            enabled: Rc::new(Cell::new(false)),
            fail_enable: false,
        }
    }
}

impl ClockControl for SimClock {
    type Error = SimClockError;

    fn enable(&mut self) -> Result<(), Self::Error> {
        if self.fail_enable {
            return Err(SimClockError);
        }
        self.enabled.set(true);
        Ok(())
    }

    fn disable(&mut self) {
        self.enabled.set(false);
    }

    fn rate(&self) -> HertzU32 {
        self.rate
    }
}
