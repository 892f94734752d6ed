//! Interactive console
//!
//! Reads command lines from a serial port and feeds them to a [`Shell`].
//! While no input is pending the console blocks on the serial receive
//! event, so other processes get the CPU. On the board it runs from the
//! idle process, whose boot stack holds the line buffer; any process with
//! a large enough stack works too.

use core::fmt;

use hal::{MemoryBus, SerialPort};
use kernel_core::{Event, Kernel, Platform};

use crate::commands::Shell;

/// Printed before every command line
pub const PROMPT: &str = "avr# ";

/// Longest accepted command line; further input is dropped
pub const LINE_CAPACITY: usize = 80;

const BACKSPACE: u8 = 0x08;
const DELETE: u8 = 0x7f;

/// Fixed-size line editor
#[derive(Debug)]
pub struct LineBuffer {
    bytes: [u8; LINE_CAPACITY],
    len: usize,
}

impl LineBuffer {
    pub const fn new() -> Self {
        Self {
            bytes: [0; LINE_CAPACITY],
            len: 0,
        }
    }

    /// Feeds one received byte; returns `true` when it completed the line
    pub fn feed(&mut self, byte: u8) -> bool {
        match byte {
            b'\r' | b'\n' => return true,
            BACKSPACE | DELETE => self.len = self.len.saturating_sub(1),
            byte if self.len < LINE_CAPACITY => {
                self.bytes[self.len] = byte;
                self.len += 1;
            }
            _ => {}
        }
        false
    }

    /// The line so far; non-UTF-8 input reads as empty
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.bytes[..self.len]).unwrap_or("")
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// `fmt::Write` over a serial port
pub struct PortWriter<'a, S: SerialPort>(pub &'a mut S);

impl<S: SerialPort> fmt::Write for PortWriter<'_, S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.write_bytes(s.as_bytes());
        Ok(())
    }
}

/// Serial console bound to a kernel
pub struct Console<'k, P: Platform, S: SerialPort> {
    kernel: &'k Kernel<P>,
    port: S,
    rx_event: Event,
    line: LineBuffer,
}

impl<'k, P: Platform, S: SerialPort> Console<'k, P, S> {
    /// Creates a console reading from `port`
    ///
    /// `rx_event` is the event the platform delivers when a byte arrives.
    pub fn new(kernel: &'k Kernel<P>, port: S, rx_event: Event) -> Self {
        Self {
            kernel,
            port,
            rx_event,
            line: LineBuffer::new(),
        }
    }

    pub fn port(&mut self) -> &mut S {
        &mut self.port
    }

    /// Returns the next input byte, blocking the calling process until one
    /// arrives
    pub fn read_byte(&mut self) -> u8 {
        loop {
            if let Some(byte) = self.port.read_byte() {
                return byte;
            }
            let port = &self.port;
            self.kernel
                .wait_for_event_unless(self.rx_event, || port.has_data());
        }
    }

    /// Reads one line, echoing it back
    pub fn read_line(&mut self) -> &str {
        self.line.clear();
        loop {
            let byte = self.read_byte();
            if self.line.feed(byte) {
                self.port.write_byte(b'\n');
                return self.line.as_str();
            }
            self.port.write_byte(byte);
        }
    }

    /// Prints the prompt, reads a line and runs it
    pub fn serve_line<M: MemoryBus>(&mut self, shell: &mut Shell<'_, P, M>) {
        self.port.write_bytes(PROMPT.as_bytes());
        self.read_line();
        let Self { port, line, .. } = self;
        // Serial output cannot fail.
        let _ = shell.handle_line(line.as_str(), &mut PortWriter(port));
    }

    /// Serves command lines forever
    pub fn run<M: MemoryBus>(&mut self, shell: &mut Shell<'_, P, M>) -> ! {
        loop {
            self.serve_line(shell);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_completes_on_cr_or_lf() {
        let mut line = LineBuffer::new();
        for &byte in b"ps" {
            assert!(!line.feed(byte));
        }
        assert!(line.feed(b'\r'));
        assert_eq!(line.as_str(), "ps");

        line.clear();
        assert!(line.feed(b'\n'));
        assert_eq!(line.as_str(), "");
    }

    #[test]
    fn test_backspace_edits() {
        let mut line = LineBuffer::new();
        for &byte in b"runx" {
            line.feed(byte);
        }
        line.feed(BACKSPACE);
        line.feed(b' ');
        line.feed(b'1');
        assert_eq!(line.as_str(), "run 1");

        line.clear();
        line.feed(DELETE);
        assert_eq!(line.as_str(), "");
    }

    #[test]
    fn test_overlong_input_is_dropped() {
        let mut line = LineBuffer::new();
        for _ in 0..LINE_CAPACITY + 10 {
            line.feed(b'a');
        }
        assert_eq!(line.as_str().len(), LINE_CAPACITY);
    }

    #[test]
    fn test_port_writer() {
        use core::fmt::Write;

        struct Capture(Vec<u8>);

        impl SerialPort for Capture {
            fn read_byte(&mut self) -> Option<u8> {
                None
            }

            fn has_data(&self) -> bool {
                false
            }

            fn write_byte(&mut self, byte: u8) {
                self.0.push(byte);
            }
        }

        let mut port = Capture(Vec::new());
        write!(PortWriter(&mut port), "pid {}", 3).unwrap();
        assert_eq!(port.0, b"pid 3");
    }
}
