//! # Simulated CPU
//!
//! Context switching on a host, with one OS thread per process.
//!
//! ## Model
//!
//! A single baton names the context that is allowed to execute. Every
//! process thread parks on the baton until it is named; `switch_context`
//! hands the baton to the restored context and parks the caller until some
//! later switch hands it back. Exactly one thread makes progress at a time,
//! so the kernel sees the same single flow of control it would on hardware.
//!
//! The thread that creates the simulation is the idle process (slot 0).
//!
//! ## Time
//!
//! The simulated timer fires `ticks_per_switch` times on every switch and
//! once on every halt. Nothing else advances the clock except explicit
//! `SimMachine::advance` calls.
//!
//! ## Retirement
//!
//! Reaping a slot, or shutting the simulation down, retires the parked
//! threads involved. A retired thread unwinds out of whatever switch it is
//! parked in and ends.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, Weak};
use std::thread::{self, JoinHandle};

use hal::{ContextError, ContextHal, CpuHal, EntryPoint};
use kernel_core::Pid;

use crate::{sys, SimMachine};

/// Saved context of a simulated process
///
/// Names the thread that owns the slot. The generation tells apart
/// successive occupants of the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimContext {
    pub slot: usize,
    pub generation: u64,
}

impl SimContext {
    /// Context of the idle process, and of slots that never ran
    pub const IDLE: SimContext = SimContext {
        slot: 0,
        generation: 0,
    };
}

/// Unwind payload that ends a retired process thread
struct Retired;

#[derive(Debug)]
struct Baton {
    holder: SimContext,
    retired: Vec<SimContext>,
    shutdown: bool,
}

impl Baton {
    fn is_retired(&self, context: SimContext) -> bool {
        self.shutdown || self.retired.contains(&context)
    }
}

/// Host CPU for the kernel
pub struct SimCpu {
    machine: Weak<SimMachine>,
    baton: Mutex<Baton>,
    handover: Condvar,
    generation: AtomicU64,
    threads: Mutex<HashMap<SimContext, JoinHandle<()>>>,
}

impl SimCpu {
    pub(crate) fn new(machine: Weak<SimMachine>) -> Self {
        Self {
            machine,
            baton: Mutex::new(Baton {
                holder: SimContext::IDLE,
                retired: Vec::new(),
                shutdown: false,
            }),
            handover: Condvar::new(),
            generation: AtomicU64::new(1),
            threads: Mutex::new(HashMap::new()),
        }
    }

    /// Number of process threads that have not been joined
    pub fn live_threads(&self) -> usize {
        self.threads.lock().expect("thread table poisoned").len()
    }

    fn baton(&self) -> MutexGuard<'_, Baton> {
        self.baton.lock().expect("baton poisoned")
    }

    /// Parks until `me` holds the baton
    ///
    /// Fails if `me` is retired while waiting.
    fn wait_for_baton<'a>(
        &'a self,
        mut baton: MutexGuard<'a, Baton>,
        me: SimContext,
    ) -> Result<(), Retired> {
        while baton.holder != me {
            if baton.is_retired(me) {
                return Err(Retired);
            }
            baton = self.handover.wait(baton).expect("baton poisoned");
        }
        Ok(())
    }

    fn fire_timer(&self, count: u32) {
        if let Some(machine) = self.machine.upgrade() {
            for _ in 0..count {
                machine.fire_timer();
            }
        }
    }

    /// Retires every process thread and joins them
    ///
    /// Must be called by the idle thread while it holds the baton.
    pub(crate) fn shutdown(&self) {
        self.baton().shutdown = true;
        self.handover.notify_all();

        let threads: Vec<_> = self
            .threads
            .lock()
            .expect("thread table poisoned")
            .drain()
            .collect();
        for (context, handle) in threads {
            if handle.join().is_err() {
                log::debug!("slot {}: thread ended abnormally", context.slot);
            }
        }
    }
}

impl ContextHal for SimCpu {
    type Context = SimContext;

    const EMPTY: SimContext = SimContext::IDLE;

    fn prepare_context(
        &self,
        slot: usize,
        entry: EntryPoint,
        context: &mut SimContext,
    ) -> Result<(), ContextError> {
        let machine = self
            .machine
            .upgrade()
            .ok_or(ContextError::SetupFailed(slot))?;
        let token = SimContext {
            slot,
            generation: self.generation.fetch_add(1, Ordering::Relaxed),
        };

        let handle = thread::Builder::new()
            .name(format!("sim-proc-{slot}"))
            .spawn(move || process_thread(machine, token, entry))
            .map_err(|_| ContextError::SetupFailed(slot))?;

        self.threads
            .lock()
            .expect("thread table poisoned")
            .insert(token, handle);
        *context = token;
        Ok(())
    }

    unsafe fn switch_context(&self, save: *mut SimContext, restore: *const SimContext) {
        self.fire_timer(
            self.machine
                .upgrade()
                .map_or(0, |machine| machine.config().ticks_per_switch),
        );

        let mut baton = self.baton();
        let me = baton.holder;
        // SAFETY: the caller guarantees `save` is its own slot and `restore`
        // a parked one; the baton lock orders these accesses against the
        // thread that reads `save` when it switches back to us.
        unsafe {
            *save = me;
            baton.holder = *restore;
        }
        self.handover.notify_all();

        if self.wait_for_baton(baton, me).is_err() {
            panic::resume_unwind(Box::new(Retired));
        }
    }

    fn release_context(&self, slot: usize, context: &mut SimContext) {
        let token = *context;
        *context = SimContext::IDLE;
        self.baton().retired.push(token);
        self.handover.notify_all();

        let handle = self
            .threads
            .lock()
            .expect("thread table poisoned")
            .remove(&token);
        if let Some(handle) = handle {
            if handle.join().is_err() {
                log::debug!("slot {slot}: thread ended abnormally");
            }
        }
        self.baton().retired.retain(|&retired| retired != token);
    }
}

impl CpuHal for SimCpu {
    fn halt(&self) {
        self.fire_timer(1);
    }
}

/// Body of every process thread
fn process_thread(machine: Arc<SimMachine>, me: SimContext, entry: EntryPoint) {
    let _bound = sys::bind(machine.clone());
    let cpu = machine.kernel().platform();

    if cpu.wait_for_baton(cpu.baton(), me).is_err() {
        return;
    }
    log::trace!("slot {}: dispatched", me.slot);

    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(entry)) {
        if payload.is::<Retired>() {
            return;
        }
        let pid = Pid::new(me.slot as i32).unwrap_or(Pid::IDLE);
        machine.record_fault(pid, payload.as_ref());
    }

    // Only ever returns by being retired.
    let _ = panic::catch_unwind(AssertUnwindSafe(|| machine.kernel().exit_current()));
}
