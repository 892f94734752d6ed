//! Sleep service
//!
//! Sleeping is built from the scheduler's yield and the timebase alone. The
//! sleeper stays RUN and re-checks the clock every time the round-robin
//! comes back to it. When it is the only runnable process, the CPU is
//! halted until the next interrupt instead of spinning.

use crate::scheduler::Kernel;
use crate::timebase::{Ticks, Timebase};
use crate::Platform;

impl<P: Platform> Kernel<P> {
    /// Blocks the caller for at least `duration` ticks
    ///
    /// The interval is measured with modular arithmetic, so a sleep that
    /// spans the counter's wraparound ends on time.
    pub fn sleep(&self, duration: Ticks) {
        let start = self.uptime();
        while Timebase::elapsed(self.uptime(), start) < duration {
            self.idle_or_schedule();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::ticking_kernel;

    fn entry() {}

    #[test]
    fn test_zero_sleep_returns_immediately() {
        let kernel = ticking_kernel(0);
        kernel.sleep(0);
        assert_eq!(kernel.platform().halts(), 0);
        assert_eq!(kernel.uptime(), 0);
    }

    #[test]
    fn test_sleep_alone_halts_until_elapsed() {
        let kernel = ticking_kernel(0);
        kernel.sleep(5);

        assert_eq!(kernel.uptime(), 5);
        assert_eq!(kernel.platform().halts(), 5);
        assert!(kernel.platform().switches().is_empty());
    }

    #[test]
    fn test_sleep_across_wraparound() {
        let kernel = ticking_kernel(u32::MAX - 2);
        kernel.sleep(10);

        assert_eq!(kernel.uptime(), 7);
        assert_eq!(kernel.platform().halts(), 10);
    }

    #[test]
    fn test_sleep_yields_before_halting() {
        let kernel = ticking_kernel(0);
        let a = kernel.new_process(entry).unwrap();
        kernel.run(a).unwrap();

        kernel.sleep(1);

        assert_eq!(kernel.platform().switches(), vec![(0, a.index())]);
        assert_eq!(kernel.platform().halts(), 0);
        assert_eq!(kernel.current_pid(), a);
    }
}
