//! System calls for simulated processes
//!
//! Process entry points and interrupt handlers are plain `fn()`s, so they
//! cannot capture the machine they run on. Every simulation thread is bound
//! to its machine instead, and these free functions act on the machine of
//! the calling thread.
//!
//! # Panics
//!
//! Every call panics when the calling thread is not part of a simulation.

use std::cell::RefCell;
use std::sync::Arc;

use kernel_core::{Event, Pid, Ticks};

use crate::SimMachine;

thread_local! {
    static CURRENT: RefCell<Option<Arc<SimMachine>>> = const { RefCell::new(None) };
}

/// Keeps the calling thread bound to a machine until dropped
pub(crate) struct Binding {
    previous: Option<Arc<SimMachine>>,
}

pub(crate) fn bind(machine: Arc<SimMachine>) -> Binding {
    let previous = CURRENT.with(|current| current.borrow_mut().replace(machine));
    Binding { previous }
}

impl Drop for Binding {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|current| *current.borrow_mut() = previous);
    }
}

/// The machine the calling thread belongs to
pub fn machine() -> Arc<SimMachine> {
    try_machine().expect("thread is not part of a simulation")
}

/// The machine the calling thread belongs to, if any
pub fn try_machine() -> Option<Arc<SimMachine>> {
    CURRENT.with(|current| current.borrow().clone())
}

/// Gives up the CPU to the next runnable process
pub fn yield_now() {
    machine().kernel().yield_now();
}

/// Sleeps for at least `ticks` timer ticks
pub fn sleep(ticks: Ticks) {
    machine().kernel().sleep(ticks);
}

/// Blocks until `event` is delivered
pub fn wait_for_event(event: Event) {
    machine().kernel().wait_for_event(event);
}

/// Wakes every process waiting on `event`
pub fn deliver_event(event: Event) -> usize {
    machine().kernel().deliver_event(event)
}

/// Current uptime in ticks
pub fn uptime() -> Ticks {
    machine().kernel().uptime()
}

/// Pid of the calling process
pub fn current_pid() -> Pid {
    machine().kernel().current_pid()
}
