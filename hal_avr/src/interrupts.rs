//! Global interrupt flag (the I bit of SREG)

use hal::{InterruptHal, MemoryBus};

use crate::regs::{SREG, SREG_I};

/// SREG's interrupt enable bit, reached through the data space
#[derive(Debug, Clone)]
pub struct GlobalInterrupts<M: MemoryBus + Clone> {
    bus: M,
}

impl<M: MemoryBus + Clone> GlobalInterrupts<M> {
    pub fn new(bus: M) -> Self {
        Self { bus }
    }

    pub fn into_bus(self) -> M {
        self.bus
    }
}

impl<M: MemoryBus + Clone> InterruptHal for GlobalInterrupts<M> {
    fn enable_interrupts(&mut self) {
        if let Err(err) = self.bus.set_bits(SREG, SREG_I) {
            log::debug!("sreg: {err}");
        }
    }

    fn disable_interrupts(&mut self) {
        if let Err(err) = self.bus.clear_bits(SREG, SREG_I) {
            log::debug!("sreg: {err}");
        }
    }

    fn interrupts_enabled(&self) -> bool {
        self.bus
            .clone()
            .read_byte(SREG)
            .is_ok_and(|sreg| sreg & SREG_I != 0)
    }
}
