//! # Simulated Timer
//!
//! Deterministic tick source for the kernel's timebase.
//!
//! ## Philosophy
//!
//! **Determinism enables thorough testing.**
//!
//! The simulated timer never fires on its own. It fires when the simulated
//! CPU switches contexts or halts, and when a test calls
//! `SimMachine::advance`. The same program therefore always observes the
//! same uptimes.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use hal::TimerInterrupt;

use crate::sys;

/// Simulated periodic timer
///
/// Records how it was programmed. While its interrupt is masked, firings
/// are dropped and the timebase stands still.
#[derive(Debug)]
pub struct SimTimer {
    hz: AtomicU32,
    enabled: AtomicBool,
}

impl SimTimer {
    /// Creates a timer that is enabled and unprogrammed
    pub fn new() -> Self {
        Self {
            hz: AtomicU32::new(0),
            enabled: AtomicBool::new(true),
        }
    }

    /// The rate last passed to `configure_periodic`
    pub fn frequency(&self) -> u32 {
        self.hz.load(Ordering::Relaxed)
    }

    /// Returns whether the timer's interrupt is unmasked
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }
}

impl Default for SimTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerInterrupt for &SimTimer {
    fn configure_periodic(&mut self, hz: u32) {
        self.hz.store(hz, Ordering::Relaxed);
    }

    fn enable_interrupts(&mut self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    fn disable_interrupts(&mut self) {
        self.enabled.store(false, Ordering::Relaxed);
    }
}

/// Timer interrupt handler: advances the uptime by one tick
pub fn timer_isr() {
    if let Some(machine) = sys::try_machine() {
        machine.kernel().timebase().tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_and_mask() {
        let timer = SimTimer::new();
        assert!(timer.is_enabled());

        let mut handle = &timer;
        handle.configure_periodic(64);
        handle.disable_interrupts();
        assert_eq!(timer.frequency(), 64);
        assert!(!timer.is_enabled());

        handle.enable_interrupts();
        assert!(timer.is_enabled());
    }

    #[test]
    fn test_isr_outside_simulation_is_absorbed() {
        timer_isr();
    }
}
