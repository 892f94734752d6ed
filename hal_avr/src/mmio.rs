//! Data-space access for the ATmega328P
//!
//! Device registers and SRAM are reached through [`hal::MemoryBus`], so the
//! drivers in this crate can run against [`FakeMmio`] in host tests.
//!
//! ## Safety
//!
//! Writing a device register has side effects on the hardware. The
//! `RealMmio` implementation isolates the volatile accesses to two small
//! functions; callers are responsible for writing sensible values.

use hal::{MemoryBus, MemoryError};

use crate::regs::{DATA_SPACE_SIZE, RAMEND};

/// Volatile access to the real data space
///
/// ## Example
///
/// ```rust,ignore
/// let mut bus = RealMmio::new();
/// let sreg = bus.read_byte(regs::SREG)?;
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct RealMmio;

impl RealMmio {
    /// Creates a handle to the data space
    pub const fn new() -> Self {
        Self
    }
}

impl MemoryBus for RealMmio {
    #[inline]
    fn read_byte(&mut self, address: u16) -> Result<u8, MemoryError> {
        if address > RAMEND {
            return Err(MemoryError::InvalidAddress(address));
        }
        // SAFETY: every address up to RAMEND is mapped on the ATmega328P:
        // register file, I/O, extended I/O or SRAM.
        Ok(unsafe { core::ptr::read_volatile(address as usize as *const u8) })
    }

    #[inline]
    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), MemoryError> {
        if address > RAMEND {
            return Err(MemoryError::InvalidAddress(address));
        }
        // SAFETY: as for `read_byte`. The effect of the write on the device
        // is the caller's responsibility.
        unsafe { core::ptr::write_volatile(address as usize as *mut u8, value) };
        Ok(())
    }
}

/// In-memory stand-in for the data space
///
/// Registers behave like plain memory: no status bit changes on its own.
/// Tests set status bits up front and inspect what the driver wrote.
///
/// ## Example
///
/// ```rust
/// use hal::MemoryBus;
/// use hal_avr::mmio::FakeMmio;
///
/// let mut bus = FakeMmio::new();
/// bus.write_byte(0xc6, b'A').unwrap();
/// assert_eq!(bus.peek(0xc6), b'A');
/// assert_eq!(bus.write_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct FakeMmio {
    bytes: [u8; DATA_SPACE_SIZE],
    writes: usize,
}

impl FakeMmio {
    /// Creates a zero-filled data space
    pub const fn new() -> Self {
        Self {
            bytes: [0; DATA_SPACE_SIZE],
            writes: 0,
        }
    }

    /// Reads a byte without going through the bus
    ///
    /// # Panics
    ///
    /// Panics if `address` is outside the data space.
    pub fn peek(&self, address: u16) -> u8 {
        self.bytes[address as usize]
    }

    /// Writes a byte without going through the bus
    ///
    /// # Panics
    ///
    /// Panics if `address` is outside the data space.
    pub fn poke(&mut self, address: u16, value: u8) {
        self.bytes[address as usize] = value;
    }

    /// Number of writes made through the bus
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl Default for FakeMmio {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBus for FakeMmio {
    fn read_byte(&mut self, address: u16) -> Result<u8, MemoryError> {
        self.bytes
            .get(address as usize)
            .copied()
            .ok_or(MemoryError::InvalidAddress(address))
    }

    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), MemoryError> {
        let slot = self
            .bytes
            .get_mut(address as usize)
            .ok_or(MemoryError::InvalidAddress(address))?;
        *slot = value;
        self.writes += 1;
        Ok(())
    }
}
