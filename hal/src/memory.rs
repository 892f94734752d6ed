//! Data-space memory access abstraction
//!
//! On the AVR the I/O registers, extended I/O registers and SRAM share one
//! data address space. Device drivers and the shell's peek/poke commands go
//! through this trait so they can run against a fake bus in tests.

use thiserror::Error;

/// Errors that can occur during memory operations
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum MemoryError {
    /// Address outside the data space
    #[error("Invalid address: {0:#06x}")]
    InvalidAddress(u16),
}

/// Byte-wide data-space access
///
/// Reads and writes are volatile on real hardware: every call reaches the
/// bus, in program order.
pub trait MemoryBus {
    /// Reads the byte at `address`
    fn read_byte(&mut self, address: u16) -> Result<u8, MemoryError>;

    /// Writes `value` to `address`
    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), MemoryError>;

    /// Sets the bits of `mask` at `address` (read-modify-write)
    fn set_bits(&mut self, address: u16, mask: u8) -> Result<(), MemoryError> {
        let value = self.read_byte(address)?;
        self.write_byte(address, value | mask)
    }

    /// Clears the bits of `mask` at `address` (read-modify-write)
    fn clear_bits(&mut self, address: u16, mask: u8) -> Result<(), MemoryError> {
        let value = self.read_byte(address)?;
        self.write_byte(address, value & !mask)
    }
}

impl<M: MemoryBus + ?Sized> MemoryBus for &mut M {
    fn read_byte(&mut self, address: u16) -> Result<u8, MemoryError> {
        (**self).read_byte(address)
    }

    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), MemoryError> {
        (**self).write_byte(address, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestBus {
        bytes: [u8; 16],
    }

    impl MemoryBus for TestBus {
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
            Ok(())
        }
    }

    #[test]
    fn test_set_and_clear_bits() {
        let mut bus = TestBus { bytes: [0; 16] };
        bus.set_bits(3, 0b1010_0000).unwrap();
        assert_eq!(bus.read_byte(3), Ok(0b1010_0000));

        bus.clear_bits(3, 0b0010_0000).unwrap();
        assert_eq!(bus.read_byte(3), Ok(0b1000_0000));
    }

    #[test]
    fn test_out_of_range_is_reported() {
        let mut bus = TestBus { bytes: [0; 16] };
        assert_eq!(bus.read_byte(16), Err(MemoryError::InvalidAddress(16)));
        assert_eq!(
            bus.set_bits(0x100, 1),
            Err(MemoryError::InvalidAddress(0x100))
        );
    }
}
