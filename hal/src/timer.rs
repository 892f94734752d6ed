//! # Timer Devices
//!
//! Hardware abstraction for the periodic tick.
//!
//! ## Philosophy
//!
//! **Time is a counter advanced by an interrupt.**
//!
//! A `TimerInterrupt` is a piece of hardware that fires one interrupt line
//! at a fixed rate. The kernel's timebase counts those firings; this layer
//! only programs and masks the source.
//!
//! ## Design Principles
//!
//! 1. **Fire-and-forget**: the device never reads or owns the count
//! 2. **Frequency-agnostic**: no assumptions about tick rate at this layer
//!
//! ## Wraparound
//!
//! A 32-bit count at 1 kHz wraps after about 49 days. Consumers must compare
//! ticks with modular arithmetic (`now.wrapping_sub(start)`), never with a
//! plain `>=` on absolute values.

/// Periodic timer interrupt source
pub trait TimerInterrupt {
    /// Programs the hardware to fire at (approximately) `hz` per second
    fn configure_periodic(&mut self, hz: u32);

    /// Unmasks the timer's interrupt line
    fn enable_interrupts(&mut self);

    /// Masks the timer's interrupt line
    fn disable_interrupts(&mut self);
}
