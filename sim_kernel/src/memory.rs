//! Simulated data memory
//!
//! A flat byte array standing in for the AVR data space (register file,
//! I/O registers, extended I/O and SRAM). Shell peek/poke commands run
//! against it in tests.

use std::sync::Mutex;

use hal::{MemoryBus, MemoryError};

/// Byte-addressed data space of a fixed size
#[derive(Debug)]
pub struct SimMemory {
    bytes: Mutex<Vec<u8>>,
}

impl SimMemory {
    /// Creates `size` bytes of zeroed memory
    pub fn new(size: usize) -> Self {
        Self {
            bytes: Mutex::new(vec![0; size]),
        }
    }

    /// Size of the data space in bytes
    pub fn size(&self) -> usize {
        self.bytes.lock().expect("memory poisoned").len()
    }

    /// Copies `data` into memory starting at `address`
    pub fn load(&self, address: u16, data: &[u8]) -> Result<(), MemoryError> {
        let mut bytes = self.bytes.lock().expect("memory poisoned");
        let start = address as usize;
        let target = bytes
            .get_mut(start..start + data.len())
            .ok_or(MemoryError::InvalidAddress(address))?;
        target.copy_from_slice(data);
        Ok(())
    }
}

impl MemoryBus for &SimMemory {
    fn read_byte(&mut self, address: u16) -> Result<u8, MemoryError> {
        self.bytes
            .lock()
            .expect("memory poisoned")
            .get(address as usize)
            .copied()
            .ok_or(MemoryError::InvalidAddress(address))
    }

    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), MemoryError> {
        let mut bytes = self.bytes.lock().expect("memory poisoned");
        let slot = bytes
            .get_mut(address as usize)
            .ok_or(MemoryError::InvalidAddress(address))?;
        *slot = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write() {
        let memory = SimMemory::new(0x100);
        let mut bus = &memory;

        bus.write_byte(0x25, 0x5a).unwrap();
        assert_eq!(bus.read_byte(0x25), Ok(0x5a));
        assert_eq!(bus.read_byte(0x26), Ok(0));
    }

    #[test]
    fn test_out_of_range() {
        let memory = SimMemory::new(0x100);
        let mut bus = &memory;

        assert_eq!(bus.read_byte(0x100), Err(MemoryError::InvalidAddress(0x100)));
        assert_eq!(
            bus.write_byte(0xffff, 1),
            Err(MemoryError::InvalidAddress(0xffff))
        );
        assert_eq!(
            memory.load(0xfe, &[1, 2, 3]),
            Err(MemoryError::InvalidAddress(0xfe))
        );
    }

    #[test]
    fn test_load_and_bit_ops() {
        let memory = SimMemory::new(0x100);
        memory.load(0x10, &[0b0000_1111, 0xff]).unwrap();

        let mut bus = &memory;
        bus.set_bits(0x10, 0b1000_0000).unwrap();
        bus.clear_bits(0x11, 0b0000_0001).unwrap();
        assert_eq!(bus.read_byte(0x10), Ok(0b1000_1111));
        assert_eq!(bus.read_byte(0x11), Ok(0xfe));
    }
}
