//! # Timebase
//!
//! Uptime counter advanced once per timer interrupt.
//!
//! The counter is 32 bits wide and wraps. It is only written by the timer
//! interrupt handler ([`Timebase::tick`]); everything else reads it. Code
//! that measures intervals must use [`Timebase::elapsed`] (modular
//! subtraction) rather than comparing absolute values.

use core::cell::Cell;

use critical_section::Mutex;

/// Uptime in timer ticks
pub type Ticks = u32;

/// Monotonic (modulo 2^32) tick counter
pub struct Timebase {
    ticks: Mutex<Cell<Ticks>>,
}

impl Timebase {
    /// Creates a timebase at tick 0
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// Creates a timebase at an arbitrary tick
    ///
    /// Useful for exercising wraparound.
    pub const fn starting_at(ticks: Ticks) -> Self {
        Self {
            ticks: Mutex::new(Cell::new(ticks)),
        }
    }

    /// Advances the counter by one tick
    ///
    /// This is the body of the timer interrupt handler. O(1), never blocks.
    pub fn tick(&self) {
        critical_section::with(|cs| {
            let ticks = self.ticks.borrow(cs);
            ticks.set(ticks.get().wrapping_add(1));
        });
    }

    /// Returns the current uptime
    pub fn uptime(&self) -> Ticks {
        critical_section::with(|cs| self.ticks.borrow(cs).get())
    }

    /// Ticks from `start` to `now`, across at most one wraparound
    pub const fn elapsed(now: Ticks, start: Ticks) -> Ticks {
        now.wrapping_sub(start)
    }
}

impl Default for Timebase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_increments_by_one() {
        let timebase = Timebase::new();
        assert_eq!(timebase.uptime(), 0);

        timebase.tick();
        timebase.tick();
        timebase.tick();
        assert_eq!(timebase.uptime(), 3);
    }

    #[test]
    fn test_counter_wraps() {
        let timebase = Timebase::starting_at(u32::MAX);
        timebase.tick();
        assert_eq!(timebase.uptime(), 0);
    }

    #[test]
    fn test_elapsed_across_wrap() {
        let start = u32::MAX - 2;
        assert_eq!(Timebase::elapsed(start, start), 0);
        assert_eq!(Timebase::elapsed(1, start), 4);
    }
}
