//! Scheduling audit trail
//!
//! A fixed-capacity ring of the most recent scheduling decisions, stamped
//! with the uptime at which they happened. The oldest entry is overwritten
//! when the ring is full.

use serde::{Deserialize, Serialize};

use crate::process::{Event, Pid};
use crate::timebase::Ticks;

/// Number of events retained
pub const TRACE_CAPACITY: usize = 16;

/// Scheduling event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleEvent {
    /// A slot was claimed by `new_process`
    Spawned { pid: Pid, at: Ticks },
    /// A NEW or STOP slot was made runnable
    Started { pid: Pid, at: Ticks },
    /// The CPU was handed from one process to another
    Switched { from: Pid, to: Pid, at: Ticks },
    /// A process started waiting for an event
    Blocked { pid: Pid, event: Event, at: Ticks },
    /// A waiting process was woken by an event
    Woken { pid: Pid, event: Event, at: Ticks },
    /// A process was stopped
    Stopped { pid: Pid, at: Ticks },
    /// A process's entry function returned
    Exited { pid: Pid, at: Ticks },
    /// A terminated slot was reclaimed
    Reaped { pid: Pid, at: Ticks },
}

impl ScheduleEvent {
    /// Uptime at which the event was recorded
    pub const fn at(&self) -> Ticks {
        match *self {
            ScheduleEvent::Spawned { at, .. }
            | ScheduleEvent::Started { at, .. }
            | ScheduleEvent::Switched { at, .. }
            | ScheduleEvent::Blocked { at, .. }
            | ScheduleEvent::Woken { at, .. }
            | ScheduleEvent::Stopped { at, .. }
            | ScheduleEvent::Exited { at, .. }
            | ScheduleEvent::Reaped { at, .. } => at,
        }
    }
}

/// Ring buffer of scheduling events
#[derive(Debug, Clone, Copy)]
pub struct Trace {
    entries: [Option<ScheduleEvent>; TRACE_CAPACITY],
    next: usize,
    len: usize,
}

impl Trace {
    /// Creates an empty trace
    pub const fn new() -> Self {
        Self {
            entries: [None; TRACE_CAPACITY],
            next: 0,
            len: 0,
        }
    }

    /// Appends an event, overwriting the oldest one when full
    pub fn record(&mut self, event: ScheduleEvent) {
        self.entries[self.next] = Some(event);
        self.next = (self.next + 1) % TRACE_CAPACITY;
        self.len = (self.len + 1).min(TRACE_CAPACITY);
    }

    /// Number of retained events
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Removes all events
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Iterates from the oldest to the newest retained event
    pub fn iter(&self) -> impl Iterator<Item = ScheduleEvent> + '_ {
        let start = (self.next + TRACE_CAPACITY - self.len) % TRACE_CAPACITY;
        (0..self.len).filter_map(move |offset| self.entries[(start + offset) % TRACE_CAPACITY])
    }

    /// Returns the most recent event
    pub fn last(&self) -> Option<ScheduleEvent> {
        if self.len == 0 {
            return None;
        }
        self.entries[(self.next + TRACE_CAPACITY - 1) % TRACE_CAPACITY]
    }
}

impl Default for Trace {
    fn default() -> Self {
        Self::new()
    }
}
