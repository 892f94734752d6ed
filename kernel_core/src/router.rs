//! # Interrupt Vector Router
//!
//! The hardware vector table is fixed at link time. Each physical entry is
//! a trampoline that calls [`Router::dispatch`] with its own index; the
//! router then calls whatever handler is currently installed for that line.
//! This lets the kernel and its processes wire interrupts at run time.
//!
//! Registration replaces the previous handler and hands it back, so a
//! process that borrowed a line can put the old handler back when done.
//! A line with no handler absorbs its interrupts.

use core::cell::Cell;

use critical_section::Mutex;

use crate::error::KernelError;

/// Number of hardware interrupt lines (ATmega328P table, including RESET)
pub const NUM_INT_VECTS: usize = 26;

/// Interrupt handler
pub type Handler = fn();

/// Table of one optional handler per interrupt line
pub struct Router {
    handlers: [Mutex<Cell<Option<Handler>>>; NUM_INT_VECTS],
}

impl Router {
    /// Creates a router with every line unregistered
    pub const fn new() -> Self {
        Self {
            handlers: [const { Mutex::new(Cell::new(None)) }; NUM_INT_VECTS],
        }
    }

    /// Installs `handler` on `vector`
    ///
    /// Returns the handler it replaced.
    pub fn register(&self, vector: u8, handler: Handler) -> Result<Option<Handler>, KernelError> {
        let entry = self.entry(vector)?;
        let previous = critical_section::with(|cs| entry.borrow(cs).replace(Some(handler)));
        log::debug!("vector {vector}: handler installed");
        Ok(previous)
    }

    /// Removes the handler on `vector`
    ///
    /// Returns the handler that was installed, if any.
    pub fn unregister(&self, vector: u8) -> Result<Option<Handler>, KernelError> {
        let entry = self.entry(vector)?;
        let previous = critical_section::with(|cs| entry.borrow(cs).take());
        log::debug!("vector {vector}: handler removed");
        Ok(previous)
    }

    /// Returns the handler installed on `vector`
    pub fn handler(&self, vector: u8) -> Option<Handler> {
        let entry = self.entry(vector).ok()?;
        critical_section::with(|cs| entry.borrow(cs).get())
    }

    /// Runs the handler for a hardware firing of `vector`
    ///
    /// The handler runs with interrupts masked, as it would from a hardware
    /// vector. Out-of-range and empty lines are absorbed.
    ///
    /// Returns whether a handler ran.
    pub fn dispatch(&self, vector: u8) -> bool {
        let Ok(entry) = self.entry(vector) else {
            return false;
        };
        critical_section::with(|cs| match entry.borrow(cs).get() {
            Some(handler) => {
                handler();
                true
            }
            None => false,
        })
    }

    fn entry(&self, vector: u8) -> Result<&Mutex<Cell<Option<Handler>>>, KernelError> {
        self.handlers
            .get(vector as usize)
            .ok_or(KernelError::OutOfRange(vector))
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
