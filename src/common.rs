// Licensed under the Apache-2.0 license

//! Crate-wide support types shared by the drivers.
//!
//! Drivers never format diagnostics themselves; they hand
//! [`core::fmt::Arguments`] to a [`Logger`] chosen by the board code. The
//! default is [`NoOpLogger`], which compiles every call away.

use core::fmt;

/// Sink for driver diagnostics.
pub trait Logger {
    /// Verbose, per-transaction detail.
    fn debug(&mut self, args: fmt::Arguments<'_>);

    /// Conditions the board operator should see.
    fn error(&mut self, args: fmt::Arguments<'_>);

    /// Informational messages emitted once per probe/attach.
    fn info(&mut self, args: fmt::Arguments<'_>) {
        self.debug(args);
    }
}

/// Logger that discards everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn debug(&mut self, _args: fmt::Arguments<'_>) {}
    fn error(&mut self, _args: fmt::Arguments<'_>) {}
    fn info(&mut self, _args: fmt::Arguments<'_>) {}
}

/// Logger writing CRLF-terminated lines to a serial port.
///
/// Write errors are dropped: a broken console must not take the bus driver
/// down with it.
pub struct UartLogger<W: embedded_io::Write> {
    port: W,
    verbose: bool,
}

impl<W: embedded_io::Write> UartLogger<W> {
    pub fn new(port: W) -> Self {
        Self {
            port,
            verbose: false,
        }
    }

    /// Also emit `debug` lines.
    #[must_use]
    pub fn verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    pub fn into_inner(self) -> W {
        self.port
    }

    fn line(&mut self, prefix: &str, args: fmt::Arguments<'_>) {
        let _ = self.port.write_all(prefix.as_bytes());
        let _ = self.port.write_fmt(args);
        let _ = self.port.write_all(b"\r\n");
    }
}

impl<W: embedded_io::Write> Logger for UartLogger<W> {
    fn debug(&mut self, args: fmt::Arguments<'_>) {
        if self.verbose {
            self.line("[dbg] ", args);
        }
    }

    fn error(&mut self, args: fmt::Arguments<'_>) {
        self.line("[err] ", args);
    }

    fn info(&mut self, args: fmt::Arguments<'_>) {
        self.line("", args);
    }
}

/// Logger forwarding to the `log` facade under a fixed target.
#[derive(Copy, Clone, Debug)]
pub struct LogCrateLogger {
    target: &'static str,
}

impl LogCrateLogger {
    #[must_use]
    pub const fn new(target: &'static str) -> Self {
        Self { target }
    }
}

impl Default for LogCrateLogger {
    fn default() -> Self {
        Self::new("mt7621_ddk")
    }
}

impl Logger for LogCrateLogger {
    fn debug(&mut self, args: fmt::Arguments<'_>) {
        log::debug!(target: self.target, "{}", args);
    }

    fn error(&mut self, args: fmt::Arguments<'_>) {
        log::error!(target: self.target, "{}", args);
    }

    fn info(&mut self, args: fmt::Arguments<'_>) {
        log::info!(target: self.target, "{}", args);
    }
}
