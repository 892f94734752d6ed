//! Process identifiers, states and control blocks

use core::cell::{Cell, UnsafeCell};
use core::fmt;

use critical_section::{CriticalSection, Mutex};
use serde::{Deserialize, Serialize};

use crate::error::KernelError;

/// Number of process slots, including the idle process in slot 0
pub const MAX_PROCS: usize = 5;

/// Bytes of private stack per process
pub const STACK_SIZE: usize = 128;

/// Process identifier
///
/// Always names a slot in `[0, MAX_PROCS)`. Raw integers coming from
/// outside (the shell) are checked by [`Pid::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pid(u8);

impl Pid {
    /// The idle process, which owns the boot flow of control
    pub const IDLE: Pid = Pid(0);

    /// Validates a raw process id
    pub fn new(raw: i32) -> Result<Self, KernelError> {
        if raw < 0 || raw as usize >= MAX_PROCS {
            return Err(KernelError::InvalidPid(raw));
        }
        Ok(Pid(raw as u8))
    }

    pub(crate) const fn from_index(index: usize) -> Self {
        Pid(index as u8)
    }

    /// Returns the slot index
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns the raw id
    pub const fn raw(self) -> i32 {
        self.0 as i32
    }

    /// Returns whether this is the idle process
    pub const fn is_idle(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier a blocked process waits on
///
/// Events carry no payload. Delivering an event wakes every process that
/// waits on an equal identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event(pub u8);

impl Event {
    /// Creates an event identifier
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Returns the raw identifier
    pub const fn id(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// Lifecycle state of a process slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcState {
    /// Free slot
    Unused,
    /// Created with a first-dispatch frame, not yet started
    New,
    /// Eligible to run (or running)
    Run,
    /// Blocked on an event
    Wait,
    /// Halted from outside; resumable with `run`
    Stop,
    /// Entry function returned; waits to be reaped
    Zombie,
    /// The idle process when it is not waiting
    Idle,
}

impl ProcState {
    /// Returns whether the scheduler may pick a slot in this state
    pub const fn is_runnable(self) -> bool {
        matches!(self, ProcState::Run)
    }

    /// Short lowercase name, as printed by `ps`
    pub const fn as_str(self) -> &'static str {
        match self {
            ProcState::Unused => "unused",
            ProcState::New => "new",
            ProcState::Run => "run",
            ProcState::Wait => "wait",
            ProcState::Stop => "stop",
            ProcState::Zombie => "zombie",
            ProcState::Idle => "idle",
        }
    }
}

impl fmt::Display for ProcState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of one process slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: Pid,
    pub state: ProcState,
    /// The awaited event; `None` unless `state` is `Wait`
    pub event: Option<Event>,
}

/// State and event of a slot, updated together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Control {
    pub(crate) state: ProcState,
    pub(crate) event: Option<Event>,
}

impl Control {
    pub(crate) const UNUSED: Control = Control {
        state: ProcState::Unused,
        event: None,
    };

    pub(crate) const IDLE: Control = Control {
        state: ProcState::Idle,
        event: None,
    };

    pub(crate) const fn with_state(state: ProcState) -> Control {
        Control { state, event: None }
    }

    pub(crate) const fn waiting(event: Event) -> Control {
        Control {
            state: ProcState::Wait,
            event: Some(event),
        }
    }
}

/// Process control block
///
/// `control` is shared with interrupt context and only touched inside a
/// critical section. `context` is the saved execution context; it belongs
/// to the process and is only read or written while the process is not
/// running: by `new_process` while the slot is being claimed, by the
/// process's own switch when it leaves the CPU, and by the switch that
/// resumes it.
pub(crate) struct Pcb<X> {
    control: Mutex<Cell<Control>>,
    context: UnsafeCell<X>,
}

// SAFETY: `control` is protected by a critical section. `context` is only
// accessed by the single flow of control that owns the slot at that moment,
// as described on the type.
unsafe impl<X: Send> Sync for Pcb<X> {}

impl<X> Pcb<X> {
    pub(crate) const fn new(control: Control, context: X) -> Self {
        Self {
            control: Mutex::new(Cell::new(control)),
            context: UnsafeCell::new(context),
        }
    }

    pub(crate) fn control(&self, cs: CriticalSection<'_>) -> Control {
        self.control.borrow(cs).get()
    }

    pub(crate) fn set_control(&self, cs: CriticalSection<'_>, control: Control) {
        self.control.borrow(cs).set(control);
    }

    pub(crate) fn state(&self, cs: CriticalSection<'_>) -> ProcState {
        self.control(cs).state
    }

    pub(crate) fn context_ptr(&self) -> *mut X {
        self.context.get()
    }
}
