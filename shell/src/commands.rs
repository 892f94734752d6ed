//! Shell commands
//!
//! Every command writes its result to a `core::fmt::Write` sink, so the same
//! code serves the serial console on the board and string buffers in tests.

use core::fmt::Write;

use hal::MemoryBus;
use kernel_core::{Kernel, Pid, Platform, ProcState};

use crate::error::ShellError;
use crate::parser::{split_command, Args};
use crate::programs::{self, Program};

/// Offset from I/O register numbers to data-space addresses
pub const IO_OFFSET: u16 = 0x20;

/// Bytes shown by `dump`
pub const DUMP_LEN: u16 = 64;

/// Bytes per `dump` line
const DUMP_LINE: u16 = 16;

/// Command words and their usage, as listed by `help`
pub const COMMANDS: [(&str, &str); 14] = [
    ("new", "new <program|address>"),
    ("run", "run <pid>"),
    ("stop", "stop <pid>"),
    ("reap", "reap <pid>"),
    ("ps", "ps"),
    ("uptime", "uptime"),
    ("in", "in <io>"),
    ("out", "out <io> <val>"),
    ("lds", "lds <addr>"),
    ("sts", "sts <addr> <val>"),
    ("sbi", "sbi <io> <bit>"),
    ("cbi", "cbi <io> <bit>"),
    ("dump", "dump <addr>"),
    ("help", "help"),
];

/// Command interpreter
///
/// Drives the kernel's process table and reads and writes the data space
/// through `M`.
pub struct Shell<'k, P: Platform, M: MemoryBus> {
    kernel: &'k Kernel<P>,
    memory: M,
    programs: &'k [Program],
}

impl<'k, P: Platform, M: MemoryBus> Shell<'k, P, M> {
    pub fn new(kernel: &'k Kernel<P>, memory: M, programs: &'k [Program]) -> Self {
        Self {
            kernel,
            memory,
            programs,
        }
    }

    pub fn kernel(&self) -> &'k Kernel<P> {
        self.kernel
    }

    pub fn memory(&mut self) -> &mut M {
        &mut self.memory
    }

    /// Runs one command line, printing any error as `*** <message>`
    pub fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> core::fmt::Result {
        match self.execute(line, out) {
            Ok(()) => Ok(()),
            Err(ShellError::Output) => Err(core::fmt::Error),
            Err(err) => {
                log::debug!("shell: {line:?}: {err}");
                writeln!(out, "*** {err}")
            }
        }
    }

    /// Runs one command line
    ///
    /// Blank lines and comments do nothing.
    pub fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> Result<(), ShellError> {
        let Some((word, mut args)) = split_command(line) else {
            return Ok(());
        };

        match word {
            "new" => self.new_process(&mut args, out),
            "run" => {
                let pid = pid_arg(&mut args)?;
                self.kernel.run(pid)?;
                ok(out)
            }
            "stop" => {
                let pid = pid_arg(&mut args)?;
                self.kernel.stop(pid)?;
                ok(out)
            }
            "reap" => {
                let pid = pid_arg(&mut args)?;
                self.kernel.reap(pid)?;
                ok(out)
            }
            "ps" => self.ps(out),
            "uptime" => {
                writeln!(out, "{}", self.kernel.uptime())?;
                Ok(())
            }
            "in" => {
                let address = io_address(&mut args)?;
                let value = self.memory.read_byte(address)?;
                writeln!(out, "{value:#04x}")?;
                Ok(())
            }
            "out" => {
                let address = io_address(&mut args)?;
                let value = args.next_byte()?;
                self.memory.write_byte(address, value)?;
                Ok(())
            }
            "lds" => {
                let address = args.next_address()?;
                let value = self.memory.read_byte(address)?;
                writeln!(out, "{value:#04x}")?;
                Ok(())
            }
            "sts" => {
                let address = args.next_address()?;
                let value = args.next_byte()?;
                self.memory.write_byte(address, value)?;
                Ok(())
            }
            "sbi" => {
                let address = io_address(&mut args)?;
                let mask = bit_mask(&mut args)?;
                self.memory.set_bits(address, mask)?;
                Ok(())
            }
            "cbi" => {
                let address = io_address(&mut args)?;
                let mask = bit_mask(&mut args)?;
                self.memory.clear_bits(address, mask)?;
                Ok(())
            }
            "dump" => {
                let address = args.next_address()?;
                self.dump(address, out)
            }
            "help" => {
                for (_, usage) in COMMANDS {
                    writeln!(out, "{usage}")?;
                }
                Ok(())
            }
            _ => Err(ShellError::UnknownCommand),
        }
    }

    fn new_process<W: Write>(&mut self, args: &mut Args<'_>, out: &mut W) -> Result<(), ShellError> {
        let entry = programs::resolve(self.programs, args.next_token()?)?;
        let pid = self.kernel.new_process(entry)?;
        writeln!(out, "{pid}")?;
        Ok(())
    }

    fn ps<W: Write>(&mut self, out: &mut W) -> Result<(), ShellError> {
        for info in self.kernel.snapshot() {
            if info.state == ProcState::Unused {
                continue;
            }
            match info.event {
                Some(event) => writeln!(out, "{} {} {}", info.pid, info.state, event)?,
                None => writeln!(out, "{} {} -", info.pid, info.state)?,
            }
        }
        Ok(())
    }

    fn dump<W: Write>(&mut self, start: u16, out: &mut W) -> Result<(), ShellError> {
        for offset in 0..DUMP_LEN {
            let address = start.wrapping_add(offset);
            let byte = self.memory.read_byte(address)?;
            if offset % DUMP_LINE == 0 {
                write!(out, "{address:04x}:")?;
            }
            if offset % 8 == 0 {
                write!(out, " ")?;
            }
            write!(out, " {byte:02x}")?;
            if offset % DUMP_LINE == DUMP_LINE - 1 {
                writeln!(out)?;
            }
        }
        Ok(())
    }
}

fn ok<W: Write>(out: &mut W) -> Result<(), ShellError> {
    writeln!(out, "OK")?;
    Ok(())
}

fn pid_arg(args: &mut Args<'_>) -> Result<Pid, ShellError> {
    Ok(Pid::new(args.next_int()?)?)
}

fn io_address(args: &mut Args<'_>) -> Result<u16, ShellError> {
    args.next_address()?
        .checked_add(IO_OFFSET)
        .ok_or(ShellError::BadNumber)
}

fn bit_mask(args: &mut Args<'_>) -> Result<u8, ShellError> {
    Ok(1 << (args.next_int()? & 7))
}
