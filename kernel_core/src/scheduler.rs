//! # Process Table & Scheduler
//!
//! Cooperative round-robin scheduling over a fixed table of `MAX_PROCS`
//! process control blocks.
//!
//! ## Policy
//!
//! - **Round-robin**: the next process is the first RUN slot after the
//!   current one, wrapping around; the current slot is considered last.
//! - **No preemption**: a process keeps the CPU until it yields, waits for
//!   an event, sleeps, stops itself or returns.
//! - **Idle fallback**: slot 0 runs only when no other slot is RUN.
//!
//! ## Interrupt Context
//!
//! Only [`Kernel::deliver_event`], [`Kernel::timebase`] reads and ticks and
//! the router's dispatch may run inside an interrupt handler. They update
//! state and return; the change is observed at the next yield point.
//!
//! ## Lifecycle
//!
//! ```text
//! UNUSED -> NEW -> RUN <-> WAIT
//!                   |        |
//!                   v        v
//!           STOP / ZOMBIE -> UNUSED (reap)
//! ```

use core::cell::{Cell, RefCell};

use critical_section::{CriticalSection, Mutex};
use hal::EntryPoint;

use crate::error::KernelError;
use crate::process::{Control, Event, Pcb, Pid, ProcState, ProcessInfo, MAX_PROCS};
use crate::router::{Handler, Router};
use crate::timebase::{Ticks, Timebase};
use crate::trace::{ScheduleEvent, Trace};
use crate::Platform;

/// The kernel: process table, scheduler, interrupt router and timebase
pub struct Kernel<P: Platform> {
    platform: P,
    procs: [Pcb<P::Context>; MAX_PROCS],
    current: Mutex<Cell<Pid>>,
    router: Router,
    timebase: Timebase,
    trace: Mutex<RefCell<Trace>>,
}

impl<P: Platform> Kernel<P> {
    /// Creates a kernel whose only process is the calling flow of control
    ///
    /// The caller becomes the idle process (slot 0).
    pub const fn new(platform: P) -> Self {
        Self::with_timebase(platform, Timebase::new())
    }

    /// Creates a kernel whose uptime starts at `timebase`'s current value
    pub const fn with_timebase(platform: P, timebase: Timebase) -> Self {
        Self {
            platform,
            // Slot 0 is the caller, already running as the idle process.
            procs: [
                Pcb::new(Control::IDLE, P::EMPTY),
                Pcb::new(Control::UNUSED, P::EMPTY),
                Pcb::new(Control::UNUSED, P::EMPTY),
                Pcb::new(Control::UNUSED, P::EMPTY),
                Pcb::new(Control::UNUSED, P::EMPTY),
            ],
            current: Mutex::new(Cell::new(Pid::IDLE)),
            router: Router::new(),
            timebase,
            trace: Mutex::new(RefCell::new(Trace::new())),
        }
    }

    /// The platform this kernel runs on
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// The interrupt vector router
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// The uptime counter
    pub fn timebase(&self) -> &Timebase {
        &self.timebase
    }

    /// Current uptime in ticks
    pub fn uptime(&self) -> Ticks {
        self.timebase.uptime()
    }

    /// Installs the platform's timer interrupt handler
    ///
    /// `handler` must end up calling `timebase().tick()` on this kernel.
    pub fn install_timebase(&self, vector: u8, handler: Handler) -> Result<(), KernelError> {
        self.router.register(vector, handler)?;
        Ok(())
    }

    /// Pid of the process that is running
    pub fn current_pid(&self) -> Pid {
        critical_section::with(|cs| self.current.borrow(cs).get())
    }

    /// Creates a process that will start at `entry`
    ///
    /// Claims the first UNUSED slot and builds its first-dispatch frame.
    /// The process does not run until [`Kernel::run`] is called.
    pub fn new_process(&self, entry: EntryPoint) -> Result<Pid, KernelError> {
        let pid = critical_section::with(|cs| {
            let index = (1..MAX_PROCS).find(|&index| self.procs[index].state(cs) == ProcState::Unused)?;
            self.procs[index].set_control(cs, Control::with_state(ProcState::New));
            Some(Pid::from_index(index))
        })
        .ok_or(KernelError::NoFreeSlot)?;

        // SAFETY: the slot was UNUSED and is now NEW; nothing dispatches a
        // NEW slot, so its context has no other user.
        let context = unsafe { &mut *self.procs[pid.index()].context_ptr() };
        if let Err(err) = self.platform.prepare_context(pid.index(), entry, context) {
            critical_section::with(|cs| {
                self.procs[pid.index()].set_control(cs, Control::UNUSED)
            });
            log::debug!("process {pid}: context setup failed: {err}");
            return Err(err.into());
        }

        critical_section::with(|cs| self.record(cs, |at| ScheduleEvent::Spawned { pid, at }));
        log::debug!("process {pid}: created");
        Ok(pid)
    }

    /// Makes a NEW or STOP process eligible to run
    ///
    /// Running an already runnable process is a no-op.
    pub fn run(&self, pid: Pid) -> Result<(), KernelError> {
        critical_section::with(|cs| {
            let pcb = &self.procs[pid.index()];
            match pcb.state(cs) {
                ProcState::Unused => Err(KernelError::InvalidPid(pid.raw())),
                ProcState::New | ProcState::Stop => {
                    pcb.set_control(cs, Control::with_state(ProcState::Run));
                    self.record(cs, |at| ScheduleEvent::Started { pid, at });
                    log::debug!("process {pid}: runnable");
                    Ok(())
                }
                ProcState::Run => Ok(()),
                state @ (ProcState::Wait | ProcState::Zombie | ProcState::Idle) => {
                    Err(KernelError::BadState { pid, state })
                }
            }
        })
    }

    /// Halts a process until it is run again
    ///
    /// Stopping the running process switches away from it immediately; the
    /// call returns once the process has been run again. Stopping a zombie
    /// leaves it a zombie. The idle process cannot be stopped.
    pub fn stop(&self, pid: Pid) -> Result<(), KernelError> {
        let stopped_self = critical_section::with(|cs| {
            let pcb = &self.procs[pid.index()];
            match pcb.state(cs) {
                ProcState::Unused => Err(KernelError::InvalidPid(pid.raw())),
                state @ ProcState::Idle => Err(KernelError::BadState { pid, state }),
                ProcState::Wait if pid.is_idle() => Err(KernelError::BadState {
                    pid,
                    state: ProcState::Wait,
                }),
                ProcState::Zombie => Ok(false),
                ProcState::New | ProcState::Run | ProcState::Wait | ProcState::Stop => {
                    pcb.set_control(cs, Control::with_state(ProcState::Stop));
                    self.record(cs, |at| ScheduleEvent::Stopped { pid, at });
                    log::debug!("process {pid}: stopped");
                    Ok(self.current.borrow(cs).get() == pid)
                }
            }
        })?;

        if stopped_self {
            self.schedule();
        }
        Ok(())
    }

    /// Reclaims a STOP or ZOMBIE slot
    ///
    /// Afterwards the pid may be handed out again by `new_process`.
    pub fn reap(&self, pid: Pid) -> Result<(), KernelError> {
        critical_section::with(|cs| {
            let pcb = &self.procs[pid.index()];
            match pcb.state(cs) {
                ProcState::Unused => Err(KernelError::InvalidPid(pid.raw())),
                ProcState::Stop | ProcState::Zombie => {
                    pcb.set_control(cs, Control::with_state(ProcState::New));
                    Ok(())
                }
                state => Err(KernelError::BadState { pid, state }),
            }
        })?;

        // SAFETY: the slot is terminated and not running; marking it NEW
        // above keeps `new_process` from claiming it while it is released.
        let context = unsafe { &mut *self.procs[pid.index()].context_ptr() };
        self.platform.release_context(pid.index(), context);

        critical_section::with(|cs| {
            self.procs[pid.index()].set_control(cs, Control::UNUSED);
            self.record(cs, |at| ScheduleEvent::Reaped { pid, at });
        });
        log::debug!("process {pid}: reaped");
        Ok(())
    }

    /// Gives up the CPU to the next runnable process
    ///
    /// Returns once the caller has been scheduled again. If nothing else
    /// is runnable it returns immediately.
    pub fn yield_now(&self) {
        self.schedule();
    }

    /// Wakes every process waiting on `event`
    ///
    /// Callable from interrupt context. Never switches: woken processes
    /// run from the next yield point on. Returns the number woken.
    pub fn deliver_event(&self, event: Event) -> usize {
        critical_section::with(|cs| {
            let mut woken = 0;
            for (index, pcb) in self.procs.iter().enumerate() {
                let control = pcb.control(cs);
                if control.state != ProcState::Wait || control.event != Some(event) {
                    continue;
                }
                let resumed = if index == 0 {
                    ProcState::Idle
                } else {
                    ProcState::Run
                };
                pcb.set_control(cs, Control::with_state(resumed));
                let pid = Pid::from_index(index);
                self.record(cs, |at| ScheduleEvent::Woken { pid, event, at });
                woken += 1;
            }
            woken
        })
    }

    /// Blocks the caller until `event` is delivered
    pub fn wait_for_event(&self, event: Event) {
        self.wait_for_event_unless(event, || false);
    }

    /// Blocks the caller until `event` is delivered, unless `ready`
    ///
    /// `ready` is evaluated in the same critical section that marks the
    /// caller WAIT, so an interrupt that makes it true and delivers `event`
    /// cannot slip in between the check and the block.
    ///
    /// Returns whether the caller blocked.
    pub fn wait_for_event_unless<F: FnOnce() -> bool>(&self, event: Event, ready: F) -> bool {
        let me = critical_section::with(|cs| {
            if ready() {
                return None;
            }
            let me = self.current.borrow(cs).get();
            self.procs[me.index()].set_control(cs, Control::waiting(event));
            self.record(cs, |at| ScheduleEvent::Blocked { pid: me, event, at });
            Some(me)
        });
        let Some(me) = me else {
            return false;
        };

        while critical_section::with(|cs| self.procs[me.index()].state(cs)) == ProcState::Wait {
            self.idle_or_schedule();
        }
        true
    }

    /// Read-only copy of every slot
    ///
    /// Each slot is copied inside its own critical section, so state and
    /// event always belong together.
    pub fn snapshot(&self) -> [ProcessInfo; MAX_PROCS] {
        core::array::from_fn(|index| {
            let control = critical_section::with(|cs| self.procs[index].control(cs));
            ProcessInfo {
                pid: Pid::from_index(index),
                state: control.state,
                event: match control.state {
                    ProcState::Wait => control.event,
                    _ => None,
                },
            }
        })
    }

    /// State of one slot
    pub fn state(&self, pid: Pid) -> ProcState {
        critical_section::with(|cs| self.procs[pid.index()].state(cs))
    }

    /// Terminates the calling process
    ///
    /// Called by the platform's start trampoline when a process's entry
    /// function returns. The slot becomes ZOMBIE and is never scheduled
    /// again. The idle process has nowhere to go and idles forever instead.
    pub fn exit_current(&self) -> ! {
        let me = critical_section::with(|cs| {
            let me = self.current.borrow(cs).get();
            if !me.is_idle() {
                self.procs[me.index()].set_control(cs, Control::with_state(ProcState::Zombie));
                self.record(cs, |at| ScheduleEvent::Exited { pid: me, at });
            }
            me
        });
        log::debug!("process {me}: exited");

        loop {
            self.idle_or_schedule();
        }
    }

    /// Copy of the scheduling audit trail
    pub fn trace(&self) -> Trace {
        critical_section::with(|cs| *self.trace.borrow_ref(cs))
    }

    /// Empties the scheduling audit trail
    pub fn clear_trace(&self) {
        critical_section::with(|cs| self.trace.borrow_ref_mut(cs).clear());
    }

    /// Yields, or halts until the next interrupt if there is nothing to
    /// yield to
    pub(crate) fn idle_or_schedule(&self) {
        if !self.schedule() {
            self.platform.halt();
        }
    }

    /// Switches to the next runnable process
    ///
    /// Returns whether a switch happened (and has since come back).
    pub(crate) fn schedule(&self) -> bool {
        let hop = critical_section::with(|cs| {
            let current = self.current.borrow(cs).get();
            let next = self.select_next(cs, current);
            if next == current {
                return None;
            }
            self.current.borrow(cs).set(next);
            self.record(cs, |at| ScheduleEvent::Switched {
                from: current,
                to: next,
                at,
            });
            Some((current, next))
        });
        let Some((from, to)) = hop else {
            return false;
        };

        log::trace!("switch {from} -> {to}");
        let save = self.procs[from.index()].context_ptr();
        let restore = self.procs[to.index()].context_ptr();
        // SAFETY: `save` is the caller's own slot and `restore` belongs to a
        // process that is not running. No critical section is held.
        unsafe { self.platform.switch_context(save, restore) };
        true
    }

    /// Round-robin choice of the next slot to run
    fn select_next(&self, cs: CriticalSection<'_>, current: Pid) -> Pid {
        (1..=MAX_PROCS)
            .map(|offset| (current.index() + offset) % MAX_PROCS)
            .filter(|&index| index != 0)
            .find(|&index| self.procs[index].state(cs).is_runnable())
            .map(Pid::from_index)
            .unwrap_or(Pid::IDLE)
    }

    fn record<F: FnOnce(Ticks) -> ScheduleEvent>(&self, cs: CriticalSection<'_>, event: F) {
        let at = self.timebase.uptime();
        self.trace.borrow_ref_mut(cs).record(event(at));
    }
}
