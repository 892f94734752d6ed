//! Serial line abstraction
//!
//! Byte-oriented and non-blocking on the receive side. Blocking is the
//! kernel's business: a reader that finds no data waits for the platform's
//! receive event instead of spinning here.

/// A byte-oriented serial port
pub trait SerialPort {
    /// Returns the next received byte, if any
    fn read_byte(&mut self) -> Option<u8>;

    /// Returns whether a received byte is waiting
    ///
    /// Must be callable from inside a critical section.
    fn has_data(&self) -> bool;

    /// Transmits one byte, waiting for the transmitter if necessary
    fn write_byte(&mut self, byte: u8);

    /// Transmits a byte slice
    fn write_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.write_byte(byte);
        }
    }
}
