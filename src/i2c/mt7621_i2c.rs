// Licensed under the Apache-2.0 license

//! MT7621 SM0 I2C master driver.
//!
//! The SM0 block runs one command at a time: START, WRITE, STOP, READ_ACK or
//! READ_NACK, moving at most eight bytes through the SM0D0/SM0D1 pair. The
//! driver writes a command word to SM0CTL1 and polls the trigger bit until the
//! hardware clears it. A wait that runs past its deadline dumps the register
//! file, resets the block and aborts the rest of the batch.
//!
//! The block has no repeated start: every message is its own START .. STOP.

use core::fmt;

use super::chunk::{pack, unpack};
use super::command::{Command, Mode, MAX_CHUNK};
use super::common::{Functionality, I2cConfig, Quirks, MT7621_QUIRKS};
use super::message::{Message, MessageFlags, Payload};
use super::poll::{PollTimeout, Poller};
use super::regs::{
    ctl0_for_divisor, CLK_DIV_MAX, CTL1_TRI_BUSY, DEVADDR_MASK, DUMP_ORDER, SM0CFG0, SM0CFG2,
    SM0CTL0, SM0CTL1, SM0D0, SM0D1, SM0ST, ST_BUSY,
};
use super::traits::{I2cHardwareCore, I2cMaster};
use crate::common::{Logger, NoOpLogger};
use crate::platform::{ClockControl, RegisterAccess, ResetControl, Timebase};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::ErrorKind;
use fugit::HertzU32;

/// Exclusive upper bound of an SMBus block length byte.
pub const BLOCK_LEN_LIMIT: u8 = 128;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The message asked for a 10-bit address.
    InvalidAddressMode,
    /// The message has no bytes to move.
    EmptyBuffer,
    /// A block read announced a length outside `1..128`, or one its buffer
    /// cannot hold. The bus was stopped before returning.
    InvalidBlockLength(u8),
    /// The hardware did not finish a command in time. The controller has
    /// been reset; `completed` messages of the batch went through.
    Timeout { completed: usize },
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> ErrorKind {
        match self {
            Error::Timeout { .. } => ErrorKind::Bus,
            Error::InvalidAddressMode | Error::EmptyBuffer | Error::InvalidBlockLength(_) => {
                ErrorKind::Other
            }
        }
    }
}

/// Failure while attaching a controller.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AttachError<E> {
    /// The input clock could not be enabled.
    Clock(E),
}

/// Platform handles owned by a controller between attach and detach.
pub struct Resources<R, C, T, S> {
    pub regs: R,
    pub clock: C,
    pub timer: T,
    pub reset: S,
}

/// Register file captured for diagnostics, in [`DUMP_ORDER`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RegisterSnapshot {
    pub values: [u32; DUMP_ORDER.len()],
}

impl RegisterSnapshot {
    #[must_use]
    pub fn get(&self, offset: usize) -> Option<u32> {
        DUMP_ORDER
            .iter()
            .zip(self.values)
            .find(|((_, off), _)| *off == offset)
            .map(|(_, value)| value)
    }
}

impl fmt::Display for RegisterSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ((name, _), value)) in DUMP_ORDER.iter().zip(self.values).enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name} {value:08x}")?;
        }
        Ok(())
    }
}

/// Clock divisor for `target` from an `input` clock, saturated to the
/// 12-bit field. A zero target saturates as well.
#[must_use]
pub fn clock_divisor(input: HertzU32, target: HertzU32) -> u16 {
    input
        .raw()
        .checked_div(target.raw())
        .and_then(|div| u16::try_from(div).ok())
        .map_or(CLK_DIV_MAX, |div| div.min(CLK_DIV_MAX))
}

/// Why a single message stopped early.
enum Fault {
    Timeout,
    BlockLength(u8),
}

impl From<PollTimeout> for Fault {
    fn from(_: PollTimeout) -> Self {
        Fault::Timeout
    }
}

pub struct Mt7621I2c<R, C, T, S, L: Logger = NoOpLogger> {
    regs: R,
    clock: C,
    timer: T,
    reset: S,
    logger: L,
    poller: Poller,
    bus_clock: HertzU32,
    clk_div: u16,
}

impl<R, C, T, S, L> Mt7621I2c<R, C, T, S, L>
where
    R: RegisterAccess,
    C: ClockControl,
    T: Timebase + DelayNs,
    S: ResetControl,
    L: Logger,
{
    /// Bring up a controller: enable its clock, program the divisor for
    /// `config.bus_clock` and reset the block.
    ///
    /// # Errors
    ///
    /// [`AttachError::Clock`] if the clock provider refuses to enable the
    /// input clock. Nothing is left running in that case.
    pub fn attach(
        resources: Resources<R, C, T, S>,
        config: &I2cConfig,
        logger: L,
    ) -> Result<Self, AttachError<C::Error>> {
        let Resources {
            regs,
            mut clock,
            timer,
            reset,
        } = resources;
        clock.enable().map_err(AttachError::Clock)?;

        let mut i2c = Self {
            regs,
            clock,
            timer,
            reset,
            logger,
            poller: config.poller(),
            bus_clock: config.bus_clock,
            clk_div: 0,
        };
        i2c.configure(config.bus_clock);
        i2c.logger.info(format_args!(
            "clock {}KHz, re-start not supported",
            i2c.bus_clock.raw() / 1000
        ));
        Ok(i2c)
    }

    /// Gate the input clock and hand the platform handles back.
    pub fn detach(mut self) -> Resources<R, C, T, S> {
        self.clock.disable();
        Resources {
            regs: self.regs,
            clock: self.clock,
            timer: self.timer,
            reset: self.reset,
        }
    }

    /// Recompute the divisor for `bus_clock` from the current input rate and
    /// apply it through a controller reset. Returns the programmed divisor.
    pub fn configure(&mut self, bus_clock: HertzU32) -> u16 {
        self.bus_clock = bus_clock;
        self.clk_div = clock_divisor(self.clock.rate(), bus_clock);
        self.reset_controller();
        self.clk_div
    }

    /// Change the bus clock of a running controller.
    pub fn set_bus_clock(&mut self, bus_clock: HertzU32) -> u16 {
        let divisor = self.configure(bus_clock);
        self.logger.info(format_args!(
            "clock {}KHz, div {divisor}",
            bus_clock.raw() / 1000
        ));
        divisor
    }

    #[must_use]
    pub fn clock_divisor(&self) -> u16 {
        self.clk_div
    }

    #[must_use]
    pub fn bus_clock(&self) -> HertzU32 {
        self.bus_clock
    }

    #[must_use]
    pub fn registers(&self) -> &R {
        &self.regs
    }

    pub fn registers_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    pub fn logger_mut(&mut self) -> &mut L {
        &mut self.logger
    }

    #[must_use]
    pub fn snapshot(&self) -> RegisterSnapshot {
        let mut values = [0u32; DUMP_ORDER.len()];
        for (value, (_, offset)) in values.iter_mut().zip(DUMP_ORDER) {
            *value = self.regs.read32(offset);
        }
        RegisterSnapshot { values }
    }

    /// Pulse the reset line and restore the control registers: open-drain
    /// outputs, VSYNC pulse, the stored divisor, wait-on-high, auto mode off.
    pub fn reset_controller(&mut self) {
        self.reset.pulse();
        self.regs.write32(SM0CTL0, ctl0_for_divisor(self.clk_div));
        self.regs.write32(SM0CFG2, 0);
    }

    /// Dump the register file and reset. Returns the dump.
    pub fn recover(&mut self) -> RegisterSnapshot {
        let snapshot = self.snapshot();
        self.logger.error(format_args!("i2c timeout"));
        self.logger.debug(format_args!("{snapshot}"));
        self.reset_controller();
        snapshot
    }

    /// Run `msgs` in order, each as START, address, payload, STOP.
    ///
    /// Returns the number of messages transferred, which is always
    /// `msgs.len()` on success.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidAddressMode`] / [`Error::EmptyBuffer`] for a bad
    ///   message, before any register of that message is touched.
    /// - [`Error::InvalidBlockLength`] for a bad SMBus length byte.
    /// - [`Error::Timeout`] after recovery if the hardware stalled.
    pub fn transfer(&mut self, msgs: &mut [Message<'_>]) -> Result<usize, Error> {
        for (completed, msg) in msgs.iter_mut().enumerate() {
            self.logger.debug(format_args!(
                "addr: 0x{:x}, len: {}, flags: 0x{:x}",
                msg.address,
                msg.len(),
                msg.flags.bits()
            ));

            if msg.flags.contains(MessageFlags::TEN_BIT) {
                self.logger.error(format_args!("10 bits addr not supported"));
                return Err(Error::InvalidAddressMode);
            }
            if msg.is_empty() {
                self.logger.error(format_args!("length is 0"));
                return Err(Error::EmptyBuffer);
            }

            match self.xfer_msg(msg) {
                Ok(()) => {}
                Err(Fault::BlockLength(len)) => return Err(Error::InvalidBlockLength(len)),
                Err(Fault::Timeout) => {
                    self.recover();
                    return Err(Error::Timeout { completed });
                }
            }
        }
        Ok(msgs.len())
    }

    fn xfer_msg(&mut self, msg: &mut Message<'_>) -> Result<(), Fault> {
        self.wait_idle()?;

        self.regs.write32(SM0CFG0, u32::from(msg.address) & DEVADDR_MASK);
        self.issue(Command::START)?;

        self.regs.write32(SM0D0, u32::from(msg.address_byte()));
        self.issue(Command::new(Mode::Write, 1))?;

        let block = msg.flags.contains(MessageFlags::RECV_LEN);
        match &mut msg.payload {
            Payload::Read(buf) if block => self.block_read(buf)?,
            Payload::Read(buf) => self.read_chunks(buf)?,
            Payload::Write(bytes) => self.write_chunks(bytes)?,
        }

        self.issue(Command::STOP)?;
        Ok(())
    }

    fn block_read(&mut self, buf: &mut [u8]) -> Result<(), Fault> {
        let Some((len, rest)) = buf.split_first_mut() else {
            return Err(Fault::BlockLength(0));
        };
        self.read_chunk(core::slice::from_mut(len), Mode::ReadAck)?;

        let declared = *len;
        let block = rest
            .get_mut(..usize::from(declared))
            .filter(|_| declared > 0 && declared < BLOCK_LEN_LIMIT);
        match block {
            Some(block) => Ok(self.read_chunks(block)?),
            None => {
                self.logger.error(format_args!("RECV_LEN bogus {declared}"));
                self.issue(Command::STOP)?;
                Err(Fault::BlockLength(declared))
            }
        }
    }

    /// Read `buf` in chunks, NACKing the last one to end the burst.
    fn read_chunks(&mut self, buf: &mut [u8]) -> Result<(), PollTimeout> {
        let chunks = buf.chunks_mut(MAX_CHUNK);
        let last = chunks.len().saturating_sub(1);
        for (i, chunk) in chunks.enumerate() {
            let mode = if i == last { Mode::ReadNack } else { Mode::ReadAck };
            self.read_chunk(chunk, mode)?;
        }
        Ok(())
    }

    fn read_chunk(&mut self, chunk: &mut [u8], mode: Mode) -> Result<(), PollTimeout> {
        self.issue(Command::new(mode, chunk_len(chunk)))?;
        let d0 = self.regs.read32(SM0D0);
        let d1 = self.regs.read32(SM0D1);
        unpack(d0, d1, chunk);
        Ok(())
    }

    fn write_chunks(&mut self, bytes: &[u8]) -> Result<(), PollTimeout> {
        for chunk in bytes.chunks(MAX_CHUNK) {
            let (d0, d1) = pack(chunk);
            self.regs.write32(SM0D0, d0);
            self.regs.write32(SM0D1, d1);
            self.issue(Command::new(Mode::Write, chunk_len(chunk)))?;
        }
        Ok(())
    }

    /// Trigger `command` and wait for the hardware to finish it.
    fn issue(&mut self, command: Command) -> Result<(), PollTimeout> {
        self.regs.write32(SM0CTL1, command.encode());
        self.wait_done()
    }

    fn wait_idle(&mut self) -> Result<(), PollTimeout> {
        let result = self
            .poller
            .await_cleared(&self.regs, &mut self.timer, SM0ST, ST_BUSY);
        if result.is_err() {
            self.logger.debug(format_args!("idle err"));
        }
        result
    }

    fn wait_done(&mut self) -> Result<(), PollTimeout> {
        let result = self
            .poller
            .await_cleared(&self.regs, &mut self.timer, SM0CTL1, CTL1_TRI_BUSY);
        if result.is_err() {
            self.logger.debug(format_args!("command err"));
        }
        result
    }
}

fn chunk_len(chunk: &[u8]) -> u8 {
    u8::try_from(chunk.len()).unwrap_or(u8::MAX)
}

impl<R, C, T, S, L> I2cHardwareCore for Mt7621I2c<R, C, T, S, L>
where
    R: RegisterAccess,
    C: ClockControl,
    T: Timebase + DelayNs,
    S: ResetControl,
    L: Logger,
{
    type Error = Error;

    fn configure_timing(&mut self, bus_clock: HertzU32) -> Result<HertzU32, Self::Error> {
        let divisor = self.configure(bus_clock);
        let input = self.clock.rate().raw();
        Ok(HertzU32::from_raw(
            input.checked_div(u32::from(divisor)).unwrap_or(input),
        ))
    }

    fn recover_bus(&mut self) -> Result<(), Self::Error> {
        self.recover();
        Ok(())
    }
}

impl<R, C, T, S, L> I2cMaster for Mt7621I2c<R, C, T, S, L>
where
    R: RegisterAccess,
    C: ClockControl,
    T: Timebase + DelayNs,
    S: ResetControl,
    L: Logger,
{
    fn transfer(&mut self, msgs: &mut [Message<'_>]) -> Result<usize, Self::Error> {
        Mt7621I2c::transfer(self, msgs)
    }

    fn functionality(&self) -> Functionality {
        Functionality::I2C.union(Functionality::SMBUS_EMUL)
    }

    fn quirks(&self) -> Option<Quirks> {
        Some(MT7621_QUIRKS)
    }

    fn is_retryable(&self, error: &Self::Error) -> bool {
        matches!(error, Error::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::testing::RecordingLogger;
    use crate::i2c::common::I2cConfigBuilder;
    use crate::i2c::sim::{SimClock, SimClockError, SimController, SimReset, SimTimer};
    use proptest::prelude::*;
    use test_strategy::proptest;

    type TestI2c = Mt7621I2c<SimController, SimClock, SimTimer, SimReset, RecordingLogger>;

    const TARGET: u8 = 0x50;

    fn input_clock() -> SimClock {
        SimClock::new(HertzU32::from_raw(50_000_000))
    }

    /// Attach a controller to `sim`, returning a handle on its reset line.
    fn rig(sim: SimController) -> (TestI2c, SimReset) {
        let reset = SimReset::default();
        let resources = Resources {
            regs: sim,
            clock: input_clock(),
            timer: SimTimer::default(),
            reset: reset.clone(),
        };
        let i2c = Mt7621I2c::attach(resources, &I2cConfig::default(), RecordingLogger::default())
            .unwrap();
        (i2c, reset)
    }

    #[test]
    fn attach_programs_divisor_and_resets() {
        let (i2c, reset) = rig(SimController::new(TARGET));
        assert_eq!(i2c.clock_divisor(), 125);
        assert_eq!(i2c.registers().word(SM0CTL0), 0x907d_0042);
        assert_eq!(i2c.registers().word(SM0CFG2), 0);
        assert_eq!(reset.asserts.get(), 1);
        assert_eq!(reset.deasserts.get(), 1);
        assert!(i2c.logger.contains("info: clock 400KHz, re-start not supported"));
    }

    #[test]
    fn attach_fails_when_clock_cannot_be_enabled() {
        let mut clock = input_clock();
        clock.fail_enable = true;
        let resources = Resources {
            regs: SimController::new(TARGET),
            clock,
            timer: SimTimer::default(),
            reset: SimReset::default(),
        };
        let result = Mt7621I2c::attach(resources, &I2cConfig::default(), NoOpLogger);
        assert!(matches!(result, Err(AttachError::Clock(SimClockError))));
    }

    #[test]
    fn detach_gates_the_clock() {
        let clock = input_clock();
        let enabled = clock.enabled.clone();
        let resources = Resources {
            regs: SimController::new(TARGET),
            clock,
            timer: SimTimer::default(),
            reset: SimReset::default(),
        };
        let i2c = Mt7621I2c::attach(resources, &I2cConfig::default(), NoOpLogger).unwrap();
        assert!(enabled.get());
        let resources = i2c.detach();
        assert!(!enabled.get());
        assert!(resources.regs.issued.is_empty());
    }

    #[test]
    fn configure_timing_reports_achieved_clock() {
        let (mut i2c, reset) = rig(SimController::new(TARGET));
        let achieved = i2c.configure_timing(HertzU32::from_raw(100_000)).unwrap();
        assert_eq!(achieved.raw(), 100_000);
        assert_eq!(i2c.clock_divisor(), 0x1f4);
        assert_eq!(i2c.registers().word(SM0CTL0), 0x91f4_0042);
        assert_eq!(reset.asserts.get(), 2);
    }

    #[test]
    fn set_bus_clock_reprograms_running_controller() {
        let (mut i2c, _) = rig(SimController::new(TARGET));
        assert_eq!(i2c.set_bus_clock(HertzU32::from_raw(0)), CLK_DIV_MAX);
        assert_eq!(i2c.registers().word(SM0CTL0), ctl0_for_divisor(CLK_DIV_MAX));
        assert!(i2c.logger.contains("clock 0KHz, div 4095"));
    }

    #[test]
    fn divisor_examples() {
        let hz = HertzU32::from_raw;
        assert_eq!(clock_divisor(hz(50_000_000), hz(100_000)), 500);
        assert_eq!(clock_divisor(hz(50_000_000), hz(0)), CLK_DIV_MAX);
        assert_eq!(clock_divisor(hz(400_000_000), hz(10_000)), CLK_DIV_MAX);
        assert_eq!(clock_divisor(hz(100_000), hz(400_000)), 0);
    }

    #[proptest]
    fn divisor_always_fits_the_field(input: u32, target: u32) {
        let div = clock_divisor(HertzU32::from_raw(input), HertzU32::from_raw(target));
        prop_assert!(div <= CLK_DIV_MAX);
    }

    #[test]
    fn write_then_read_runs_two_transactions() {
        let sim = SimController::new(TARGET).respond_with(&[0x0a, 0x0b, 0x0c, 0x0d]);
        let (mut i2c, _) = rig(sim);
        let mut buf = [0u8; 4];

        let done = i2c
            .transfer(&mut [
                Message::write(TARGET, &[1, 2, 3]),
                Message::read(TARGET, &mut buf),
            ])
            .unwrap();

        assert_eq!(done, 2);
        assert_eq!(buf, [0x0a, 0x0b, 0x0c, 0x0d]);
        let sim = i2c.registers();
        assert_eq!(sim.target.received, [1, 2, 3]);
        assert_eq!(
            sim.modes(),
            [
                Mode::Start,
                Mode::Write,
                Mode::Write,
                Mode::Stop,
                Mode::Start,
                Mode::Write,
                Mode::ReadNack,
                Mode::Stop,
            ]
        );
        assert_eq!(sim.issued[1].d0, 0xa0);
        assert_eq!(sim.issued[1].cfg0, u32::from(TARGET));
        assert_eq!(sim.issued[2].command, Command::new(Mode::Write, 3));
        assert_eq!(sim.issued[2].d0, 0x0003_0201);
        assert_eq!(sim.issued[5].d0, 0xa1);
        assert_eq!(sim.issued[6].command.count, 4);
    }

    #[test]
    fn long_write_is_split_into_chunks() {
        let (mut i2c, _) = rig(SimController::new(TARGET));
        let data = [1, 2, 3, 4, 5, 6, 7, 8, 9];

        i2c.transfer(&mut [Message::write(TARGET, &data)]).unwrap();

        let sim = i2c.registers();
        assert_eq!(sim.target.received, data);
        let payload: Vec<_> = sim.issued[2..4].to_vec();
        assert_eq!(payload[0].command, Command::new(Mode::Write, 8));
        assert_eq!((payload[0].d0, payload[0].d1), (0x0403_0201, 0x0807_0605));
        assert_eq!(payload[1].command, Command::new(Mode::Write, 1));
        assert_eq!((payload[1].d0, payload[1].d1), (0x09, 0));
        assert_eq!(sim.issued.len(), 5);
    }

    #[test]
    fn long_read_nacks_only_the_last_chunk() {
        let data: Vec<u8> = (0..20).collect();
        let (mut i2c, _) = rig(SimController::new(TARGET).respond_with(&data));
        let mut buf = [0u8; 20];

        i2c.transfer(&mut [Message::read(TARGET, &mut buf)]).unwrap();

        assert_eq!(buf.as_slice(), data.as_slice());
        let reads: Vec<_> = i2c
            .registers()
            .issued
            .iter()
            .filter(|i| i.command.mode.is_read())
            .map(|i| i.command)
            .collect();
        assert_eq!(
            reads,
            [
                Command::new(Mode::ReadAck, 8),
                Command::new(Mode::ReadAck, 8),
                Command::new(Mode::ReadNack, 4),
            ]
        );
    }

    #[test]
    fn absent_device_reads_all_ones() {
        let (mut i2c, _) = rig(SimController::new(TARGET).respond_with(&[1, 2]));
        let mut buf = [0u8; 2];
        i2c.transfer(&mut [Message::read(0x51, &mut buf)]).unwrap();
        assert_eq!(buf, [0xff, 0xff]);
    }

    #[test]
    fn invalid_messages_touch_no_registers() {
        let (mut i2c, _) = rig(SimController::new(TARGET));
        let before = i2c.registers().accesses();

        assert_eq!(
            i2c.transfer(&mut [Message::write(TARGET, &[])]),
            Err(Error::EmptyBuffer)
        );
        assert_eq!(
            i2c.transfer(&mut [Message::write(TARGET, &[1]).with_flags(MessageFlags::TEN_BIT)]),
            Err(Error::InvalidAddressMode)
        );
        assert_eq!(i2c.registers().accesses(), before);
        assert!(i2c.logger.contains("error: length is 0"));
        assert!(i2c.logger.contains("error: 10 bits addr not supported"));
    }

    #[test]
    fn invalid_message_aborts_rest_of_batch() {
        let (mut i2c, _) = rig(SimController::new(TARGET));
        let mut empty = [0u8; 0];

        let result = i2c.transfer(&mut [
            Message::write(TARGET, &[7]),
            Message::read(TARGET, &mut empty),
            Message::write(TARGET, &[8]),
        ]);

        assert_eq!(result, Err(Error::EmptyBuffer));
        assert_eq!(i2c.registers().target.received, [7]);
        assert_eq!(i2c.registers().issued.len(), 4);
    }

    #[test]
    fn block_read_uses_length_prefix() {
        let sim = SimController::new(TARGET).respond_with(&[3, 0x11, 0x22, 0x33, 0x44]);
        let (mut i2c, _) = rig(sim);
        let mut buf = [0u8; 33];

        i2c.transfer(&mut [Message::block_read(TARGET, &mut buf)])
            .unwrap();

        assert_eq!(buf[..5], [3, 0x11, 0x22, 0x33, 0]);
        let sim = i2c.registers();
        assert_eq!(
            sim.issued.iter().map(|i| i.command).collect::<Vec<_>>(),
            [
                Command::START,
                Command::new(Mode::Write, 1),
                Command::new(Mode::ReadAck, 1),
                Command::new(Mode::ReadNack, 3),
                Command::STOP,
            ]
        );
    }

    fn bogus_block(length: u8, buf_len: usize) {
        let (mut i2c, reset) = rig(SimController::new(TARGET).respond_with(&[length, 1, 2]));
        let mut buf = vec![0u8; buf_len];

        let result = i2c.transfer(&mut [Message::block_read(TARGET, &mut buf)]);

        assert_eq!(result, Err(Error::InvalidBlockLength(length)));
        assert_eq!(
            i2c.registers().modes(),
            [Mode::Start, Mode::Write, Mode::ReadAck, Mode::Stop]
        );
        assert!(i2c.logger.contains(&format!("RECV_LEN bogus {length}")));
        assert_eq!(reset.asserts.get(), 1, "a bad length is not a timeout");
    }

    #[test]
    fn block_read_rejects_zero_length() {
        bogus_block(0, 33);
    }

    #[test]
    fn block_read_rejects_oversized_length() {
        bogus_block(0x80, 256);
    }

    #[test]
    fn block_read_rejects_length_beyond_buffer() {
        bogus_block(5, 4);
    }

    #[test]
    fn stuck_bus_times_out_and_recovers() {
        let mut sim = SimController::new(TARGET);
        sim.stuck_busy = true;
        let (mut i2c, reset) = rig(sim);

        let result = i2c.transfer(&mut [Message::write(TARGET, &[1])]);

        assert_eq!(result, Err(Error::Timeout { completed: 0 }));
        assert!(i2c.registers().issued.is_empty());
        assert_eq!(reset.asserts.get(), 2);
        assert_eq!(i2c.registers().word(SM0CTL0), 0x907d_0042);
        assert!(i2c.logger.contains("debug: idle err"));
        assert!(i2c.logger.contains("error: i2c timeout"));
        assert!(i2c.logger.contains("status 00000001"));
    }

    #[test]
    fn hang_mid_batch_reports_completed_messages() {
        let mut sim = SimController::new(TARGET);
        sim.hang_after = Some(4);
        let (mut i2c, reset) = rig(sim);

        let result = i2c.transfer(&mut [
            Message::write(TARGET, &[1]),
            Message::write(TARGET, &[2]),
        ]);

        assert_eq!(result, Err(Error::Timeout { completed: 1 }));
        assert_eq!(i2c.registers().target.received, [1]);
        assert_eq!(
            i2c.registers().modes(),
            [Mode::Start, Mode::Write, Mode::Write, Mode::Stop, Mode::Start]
        );
        assert_eq!(reset.asserts.get(), 2);
        assert!(i2c.logger.contains("debug: command err"));
    }

    #[test]
    fn snapshot_follows_dump_order() {
        let (i2c, _) = rig(SimController::new(TARGET));
        let snapshot = i2c.snapshot();
        assert_eq!(snapshot.get(SM0CTL0), Some(0x907d_0042));
        assert_eq!(snapshot.get(0x04), None);
        let text = format!("{snapshot}");
        assert!(text.starts_with("cfg0 00000000, dout 00000000"));
        assert!(text.ends_with("ctl0 907d0042, ctl1 00000000"));
    }

    #[test]
    fn short_timeout_from_config_is_honoured() {
        let mut sim = SimController::new(TARGET);
        sim.stuck_busy = true;
        let config = I2cConfigBuilder::new()
            .timeout(fugit::MillisDurationU32::millis(2))
            .build();
        let resources = Resources {
            regs: sim,
            clock: input_clock(),
            timer: SimTimer::default(),
            reset: SimReset::default(),
        };
        let mut i2c = Mt7621I2c::attach(resources, &config, NoOpLogger).unwrap();
        let before = i2c.registers().accesses();

        let result = i2c.transfer(&mut [Message::write(TARGET, &[1])]);

        assert_eq!(result, Err(Error::Timeout { completed: 0 }));
        // 20 loop samples, the final sample, then the dump and the reset writes.
        assert_eq!(i2c.registers().accesses() - before, 21 + 9 + 2);
    }

    #[test]
    fn reports_capabilities_to_the_bus_layer() {
        let (i2c, _) = rig(SimController::new(TARGET));
        assert!(i2c.functionality().contains(Functionality::SMBUS_EMUL));
        assert_eq!(i2c.quirks(), Some(MT7621_QUIRKS));
        assert!(i2c.is_retryable(&Error::Timeout { completed: 0 }));
        assert!(!i2c.is_retryable(&Error::EmptyBuffer));
    }

    #[proptest(ProptestConfig { cases: 64, ..ProptestConfig::default() })]
    fn write_and_read_move_every_byte(
        #[strategy(proptest::collection::vec(any::<u8>(), 1..=64))] data: Vec<u8>,
    ) {
        let (mut i2c, _) = rig(SimController::new(TARGET).respond_with(&data));
        let mut buf = vec![0u8; data.len()];

        let done = i2c
            .transfer(&mut [
                Message::write(TARGET, &data),
                Message::read(TARGET, &mut buf),
            ])
            .unwrap();

        prop_assert_eq!(done, 2);
        prop_assert_eq!(&i2c.registers().target.received, &data);
        prop_assert_eq!(&buf, &data);
        let reads = i2c
            .registers()
            .issued
            .iter()
            .filter(|i| i.command.mode.is_read())
            .count();
        prop_assert_eq!(reads, data.len().div_ceil(8));
    }
}
