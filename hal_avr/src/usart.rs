//! # USART0 Serial Driver
//!
//! Transmit is polled. Receive is interrupt driven: the `USART_RX` handler
//! moves each byte from UDR0 into an [`RxBuffer`] and wakes readers with
//! the serial receive event, so a reader never spins on the line.

use core::cell::RefCell;

use critical_section::Mutex;
use hal::{MemoryBus, MemoryError, SerialPort};

use crate::regs::usart0::{
    FORMAT_8N1, RXC0, RXCIE0, RXEN0, TXEN0, UBRR0H, UBRR0L, UCSR0A, UCSR0B, UCSR0C, UDR0, UDRE0,
};

/// Capacity of the receive ring
pub const RX_CAPACITY: usize = 32;

/// UBRR0 is 12 bits wide
const UBRR_MAX: u32 = 0x0fff;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UsartError {
    #[error("baud rate {baud} unreachable at {cpu_hz} Hz")]
    UnsupportedBaud { cpu_hz: u32, baud: u32 },

    #[error(transparent)]
    Memory(#[from] MemoryError),
}

#[derive(Debug)]
struct Ring {
    bytes: [u8; RX_CAPACITY],
    head: usize,
    len: usize,
    overruns: usize,
}

impl Ring {
    const fn new() -> Self {
        Self {
            bytes: [0; RX_CAPACITY],
            head: 0,
            len: 0,
            overruns: 0,
        }
    }
}

/// Bytes received but not yet read
///
/// Filled from interrupt context, drained by the reading process. When
/// full, new bytes are dropped and counted.
#[derive(Debug)]
pub struct RxBuffer {
    ring: Mutex<RefCell<Ring>>,
}

impl RxBuffer {
    pub const fn new() -> Self {
        Self {
            ring: Mutex::new(RefCell::new(Ring::new())),
        }
    }

    /// Appends a byte, returning `false` if it was dropped
    pub fn push(&self, byte: u8) -> bool {
        critical_section::with(|cs| {
            let mut ring = self.ring.borrow_ref_mut(cs);
            if ring.len == RX_CAPACITY {
                ring.overruns += 1;
                return false;
            }
            let tail = (ring.head + ring.len) % RX_CAPACITY;
            ring.bytes[tail] = byte;
            ring.len += 1;
            true
        })
    }

    /// Takes the oldest byte
    pub fn pop(&self) -> Option<u8> {
        critical_section::with(|cs| {
            let mut ring = self.ring.borrow_ref_mut(cs);
            if ring.len == 0 {
                return None;
            }
            let byte = ring.bytes[ring.head];
            ring.head = (ring.head + 1) % RX_CAPACITY;
            ring.len -= 1;
            Some(byte)
        })
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.ring.borrow_ref(cs).len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes dropped because the ring was full
    pub fn overruns(&self) -> usize {
        critical_section::with(|cs| self.ring.borrow_ref(cs).overruns)
    }
}

impl Default for RxBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// UBRR0 value for `baud` in normal-speed asynchronous mode
///
/// `None` for a zero baud rate, one faster than `cpu_hz / 16`, or one too
/// slow for the 12-bit register.
pub fn baud_divisor(cpu_hz: u32, baud: u32) -> Option<u16> {
    let divisor = (cpu_hz / 16).checked_div(baud)?.checked_sub(1)?;
    if divisor > UBRR_MAX {
        return None;
    }
    u16::try_from(divisor).ok()
}

/// USART0 driver
pub struct Usart0<'a, M: MemoryBus> {
    bus: M,
    rx: &'a RxBuffer,
}

impl<'a, M: MemoryBus> Usart0<'a, M> {
    pub fn new(bus: M, rx: &'a RxBuffer) -> Self {
        Self { bus, rx }
    }

    /// Sets the baud rate and frame format and enables both directions with
    /// the receive interrupt
    ///
    /// An unreachable baud rate leaves the hardware untouched.
    pub fn init(&mut self, cpu_hz: u32, baud: u32) -> Result<(), UsartError> {
        let divisor =
            baud_divisor(cpu_hz, baud).ok_or(UsartError::UnsupportedBaud { cpu_hz, baud })?;
        let [low, high] = divisor.to_le_bytes();
        self.bus.write_byte(UBRR0H, high)?;
        self.bus.write_byte(UBRR0L, low)?;
        self.bus.write_byte(UCSR0C, FORMAT_8N1)?;
        self.bus.write_byte(UCSR0B, RXEN0 | TXEN0 | RXCIE0)?;
        log::debug!("usart0: {baud} baud, ubrr {divisor}");
        Ok(())
    }

    /// Receive interrupt body: moves a pending byte into the buffer
    ///
    /// Returns whether a byte was taken from the line.
    pub fn on_receive(&mut self) -> Result<bool, MemoryError> {
        if self.bus.read_byte(UCSR0A)? & RXC0 == 0 {
            return Ok(false);
        }
        let byte = self.bus.read_byte(UDR0)?;
        self.rx.push(byte);
        Ok(true)
    }

    pub fn into_bus(self) -> M {
        self.bus
    }
}

impl<M: MemoryBus> SerialPort for Usart0<'_, M> {
    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop()
    }

    fn has_data(&self) -> bool {
        !self.rx.is_empty()
    }

    fn write_byte(&mut self, byte: u8) {
        loop {
            match self.bus.read_byte(UCSR0A) {
                Ok(status) if status & UDRE0 != 0 => break,
                Ok(_) => continue,
                Err(_) => return,
            }
        }
        let _ = self.bus.write_byte(UDR0, byte);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mmio::FakeMmio;

    #[test]
    fn test_baud_divisor() {
        assert_eq!(baud_divisor(16_000_000, 9600), Some(103));
        assert_eq!(baud_divisor(16_000_000, 115_200), Some(7));
        assert_eq!(baud_divisor(16_000_000, 1_000_000), Some(0));
    }

    #[test]
    fn test_unreachable_baud_rates() {
        assert_eq!(baud_divisor(16_000_000, 0), None);
        assert_eq!(baud_divisor(16_000_000, 2_000_000), None);
        assert_eq!(baud_divisor(16_000_000, 200), None);
    }

    #[test]
    fn test_init_rejects_zero_baud() {
        let rx = RxBuffer::new();
        let mut usart = Usart0::new(FakeMmio::new(), &rx);
        assert_eq!(
            usart.init(16_000_000, 0),
            Err(UsartError::UnsupportedBaud {
                cpu_hz: 16_000_000,
                baud: 0
            })
        );
        assert_eq!(usart.into_bus().write_count(), 0);
    }

    #[test]
    fn test_init_programs_registers() {
        let rx = RxBuffer::new();
        let mut usart = Usart0::new(FakeMmio::new(), &rx);
        usart.init(16_000_000, 9600).unwrap();

        let bus = usart.into_bus();
        assert_eq!(bus.peek(UBRR0L), 103);
        assert_eq!(bus.peek(UBRR0H), 0);
        assert_eq!(bus.peek(UCSR0C), FORMAT_8N1);
        assert_eq!(bus.peek(UCSR0B), RXEN0 | TXEN0 | RXCIE0);
    }

    #[test]
    fn test_transmit_writes_data_register() {
        let rx = RxBuffer::new();
        let mut bus = FakeMmio::new();
        bus.poke(UCSR0A, UDRE0);
        let mut usart = Usart0::new(bus, &rx);
        usart.write_bytes(b"ok");

        let bus = usart.into_bus();
        assert_eq!(bus.peek(UDR0), b'k');
        assert_eq!(bus.write_count(), 2);
    }

    #[test]
    fn test_receive_fills_buffer() {
        let rx = RxBuffer::new();
        let mut bus = FakeMmio::new();
        bus.poke(UCSR0A, RXC0);
        bus.poke(UDR0, b'x');
        let mut usart = Usart0::new(bus, &rx);

        assert!(!usart.has_data());
        assert_eq!(usart.on_receive(), Ok(true));
        assert!(usart.has_data());
        assert_eq!(usart.read_byte(), Some(b'x'));
        assert_eq!(usart.read_byte(), None);
    }

    #[test]
    fn test_receive_without_data() {
        let rx = RxBuffer::new();
        let mut usart = Usart0::new(FakeMmio::new(), &rx);
        assert_eq!(usart.on_receive(), Ok(false));
        assert!(rx.is_empty());
    }

    #[test]
    fn test_ring_wraps_and_counts_overruns() {
        let rx = RxBuffer::new();
        for byte in 0..RX_CAPACITY as u8 {
            assert!(rx.push(byte));
        }
        assert!(!rx.push(0xff));
        assert_eq!(rx.overruns(), 1);
        assert_eq!(rx.len(), RX_CAPACITY);

        assert_eq!(rx.pop(), Some(0));
        assert!(rx.push(100));
        let drained: Vec<u8> = core::iter::from_fn(|| rx.pop()).collect();
        assert_eq!(drained.len(), RX_CAPACITY);
        assert_eq!(drained[0], 1);
        assert_eq!(drained[RX_CAPACITY - 1], 100);
    }
}
