//! # Simulated Serial Line
//!
//! A USART stand-in with the same shape as the hardware driver: bytes
//! arrive on the wire, the receive interrupt moves each one into a bounded
//! receive buffer and delivers the receive event, and readers drain the
//! buffer through [`hal::SerialPort`]. Transmitted bytes are collected for
//! the test to inspect.

use std::collections::VecDeque;
use std::sync::Mutex;

use hal::SerialPort;

use crate::sys;

/// Receive buffer capacity, as on the board
pub const RX_CAPACITY: usize = 32;

#[derive(Debug, Default)]
struct Lines {
    wire: VecDeque<u8>,
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    overruns: usize,
}

/// Simulated serial port
#[derive(Debug, Default)]
pub struct SimSerial {
    lines: Mutex<Lines>,
}

impl SimSerial {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts a byte on the wire; it is received when the RX interrupt runs
    pub(crate) fn put_on_wire(&self, byte: u8) {
        self.lines().wire.push_back(byte);
    }

    /// Moves the next wire byte into the receive buffer
    ///
    /// Returns false if there was nothing on the wire. A full buffer drops
    /// the byte and counts an overrun.
    pub(crate) fn receive(&self) -> bool {
        let mut lines = self.lines();
        let Some(byte) = lines.wire.pop_front() else {
            return false;
        };
        if lines.rx.len() < RX_CAPACITY {
            lines.rx.push_back(byte);
        } else {
            lines.overruns += 1;
        }
        true
    }

    /// Takes everything transmitted so far
    pub fn take_output(&self) -> Vec<u8> {
        std::mem::take(&mut self.lines().tx)
    }

    /// Everything transmitted so far, as text
    pub fn take_output_string(&self) -> String {
        String::from_utf8_lossy(&self.take_output()).into_owned()
    }

    /// Bytes dropped because the receive buffer was full
    pub fn overruns(&self) -> usize {
        self.lines().overruns
    }

    fn lines(&self) -> std::sync::MutexGuard<'_, Lines> {
        self.lines.lock().expect("serial poisoned")
    }
}

impl SerialPort for &SimSerial {
    fn read_byte(&mut self) -> Option<u8> {
        self.lines().rx.pop_front()
    }

    fn has_data(&self) -> bool {
        !self.lines().rx.is_empty()
    }

    fn write_byte(&mut self, byte: u8) {
        self.lines().tx.push(byte);
    }
}

/// Serial receive interrupt handler
///
/// Takes one byte off the wire and wakes the readers.
pub fn serial_rx_isr() {
    let Some(machine) = sys::try_machine() else {
        return;
    };
    if machine.serial().receive() {
        machine
            .kernel()
            .deliver_event(machine.config().serial_rx_event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receive_moves_wire_bytes() {
        let serial = SimSerial::new();
        let mut port = &serial;
        assert!(!port.has_data());

        serial.put_on_wire(b'a');
        assert!(!port.has_data());
        assert!(serial.receive());
        assert!(port.has_data());
        assert_eq!(port.read_byte(), Some(b'a'));
        assert_eq!(port.read_byte(), None);
        assert!(!serial.receive());
    }

    #[test]
    fn test_receive_buffer_overrun() {
        let serial = SimSerial::new();
        for byte in 0..(RX_CAPACITY as u8 + 2) {
            serial.put_on_wire(byte);
            serial.receive();
        }
        assert_eq!(serial.overruns(), 2);

        let mut port = &serial;
        let received: Vec<_> = std::iter::from_fn(|| port.read_byte()).collect();
        assert_eq!(received.len(), RX_CAPACITY);
        assert_eq!(received[RX_CAPACITY - 1], RX_CAPACITY as u8 - 1);
    }

    #[test]
    fn test_transmit_is_collected() {
        let serial = SimSerial::new();
        let mut port = &serial;
        port.write_bytes(b"ok\r\n");
        assert_eq!(serial.take_output_string(), "ok\r\n");
        assert!(serial.take_output().is_empty());
    }
}
