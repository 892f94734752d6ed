//! # ATmega328P Platform
//!
//! HAL implementation for the ATmega328P.
//!
//! ## Modules
//!
//! - `regs`: data-space register addresses
//! - `vectors`: interrupt vector numbers
//! - `interrupts`: the global interrupt flag
//! - `mmio`: [`hal::MemoryBus`] over the real data space, plus a fake for
//!   host tests
//! - `frame`: the synthetic stack frame a process is first dispatched from
//! - `stacks`: per-process stack regions
//! - `timer0`: the kernel tick
//! - `usart`: serial console driver
//! - `cpu`: context switch and sleep (AVR only)
//! - `board`: the global kernel, interrupt trampolines and boot (AVR only)
//!
//! Everything except `cpu` and `board` builds and is tested on the host.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(
    target_arch = "avr",
    feature(asm_experimental_arch, abi_avr_interrupt)
)]

pub mod config;
pub mod frame;
pub mod interrupts;
pub mod mmio;
pub mod regs;
pub mod stacks;
pub mod timer0;
pub mod usart;
pub mod vectors;

#[cfg(target_arch = "avr")]
pub mod board;
#[cfg(target_arch = "avr")]
pub mod cpu;

pub use config::{BoardConfig, SERIAL_RX_EVENT, SERIAL_RX_VECTOR, TIMER_VECTOR};
pub use interrupts::GlobalInterrupts;
pub use mmio::{FakeMmio, RealMmio};
pub use stacks::StackArena;
pub use timer0::Timer0;
pub use usart::{RxBuffer, Usart0, UsartError};
pub use vectors::Vector;

/// The ATmega328P as a kernel platform
///
/// Owns the process stacks. The context of a slot is its saved stack
/// pointer.
pub struct AvrPlatform {
    stacks: StackArena,
}

impl AvrPlatform {
    pub const fn new() -> Self {
        Self {
            stacks: StackArena::new(),
        }
    }

    pub fn stacks(&self) -> &StackArena {
        &self.stacks
    }
}

impl Default for AvrPlatform {
    fn default() -> Self {
        Self::new()
    }
}
