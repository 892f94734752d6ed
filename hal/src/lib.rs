//! # Hardware Abstraction Layer (HAL)
//!
//! This crate defines the hardware abstraction traits the kernel is written
//! against.
//!
//! ## Philosophy
//!
//! **The kernel core never touches a register.**
//!
//! Everything architecture-specific (the register save/restore of a context
//! switch, halting the CPU, masking interrupts, device registers) sits behind
//! a trait here. `hal_avr` implements the traits for the ATmega328P and
//! `sim_kernel` implements them on a host for testing.
//!
//! ## Design Principles
//!
//! 1. **Narrow seams**: the context switch is a single operation
//! 2. **Trait-based**: All hardware operations go through traits
//! 3. **Minimal unsafe**: only the switch itself is `unsafe`
//! 4. **Testable**: every trait has a host implementation
//! 5. **`no_std`**: usable on a microcontroller with a few kilobytes of RAM

#![no_std]

pub mod context;
pub mod cpu;
pub mod interrupts;
pub mod memory;
pub mod serial;
pub mod timer;

pub use context::{ContextError, ContextHal, EntryPoint};
pub use cpu::CpuHal;
pub use interrupts::InterruptHal;
pub use memory::{MemoryBus, MemoryError};
pub use serial::SerialPort;
pub use timer::TimerInterrupt;
