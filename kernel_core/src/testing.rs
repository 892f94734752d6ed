//! Host platform for unit tests
//!
//! Switches record what they were asked to do and return at once, so the
//! kernel's bookkeeping can be checked without real flows of control.

use core::cell::{Cell, RefCell};

use hal::{ContextError, ContextHal, CpuHal, EntryPoint};

use crate::scheduler::Kernel;
use crate::timebase::{Ticks, Timebase};

#[derive(Default)]
pub(crate) struct RecordingPlatform {
    prepared: RefCell<Vec<usize>>,
    released: RefCell<Vec<usize>>,
    switches: RefCell<Vec<(usize, usize)>>,
    halts: Cell<usize>,
    fail_next_prepare: Cell<bool>,
    clock: Cell<Option<&'static Timebase>>,
}

impl RecordingPlatform {
    /// Slots whose contexts were prepared, in order
    pub(crate) fn prepared(&self) -> Vec<usize> {
        self.prepared.borrow().clone()
    }

    pub(crate) fn released(&self) -> Vec<usize> {
        self.released.borrow().clone()
    }

    /// `(from, to)` slot pairs of every switch
    pub(crate) fn switches(&self) -> Vec<(usize, usize)> {
        self.switches.borrow().clone()
    }

    pub(crate) fn halts(&self) -> usize {
        self.halts.get()
    }

    pub(crate) fn fail_next_prepare(&self) {
        self.fail_next_prepare.set(true);
    }

    /// Makes every switch and halt advance `clock` by one tick
    pub(crate) fn attach_clock(&self, clock: &'static Timebase) {
        self.clock.set(Some(clock));
    }

    fn tick(&self) {
        if let Some(clock) = self.clock.get() {
            clock.tick();
        }
    }
}

impl ContextHal for RecordingPlatform {
    // The slot index of the owner.
    type Context = usize;

    const EMPTY: usize = 0;

    fn prepare_context(
        &self,
        slot: usize,
        _entry: EntryPoint,
        context: &mut usize,
    ) -> Result<(), ContextError> {
        if self.fail_next_prepare.replace(false) {
            return Err(ContextError::SetupFailed(slot));
        }
        *context = slot;
        self.prepared.borrow_mut().push(slot);
        Ok(())
    }

    unsafe fn switch_context(&self, save: *mut usize, restore: *const usize) {
        let (from, to) = unsafe { (*save, *restore) };
        self.switches.borrow_mut().push((from, to));
        self.tick();
    }

    fn release_context(&self, slot: usize, context: &mut usize) {
        *context = Self::EMPTY;
        self.released.borrow_mut().push(slot);
    }
}

impl CpuHal for RecordingPlatform {
    fn halt(&self) {
        self.halts.set(self.halts.get() + 1);
        self.tick();
    }
}

/// A kernel whose clock does not move
pub(crate) fn kernel() -> Kernel<RecordingPlatform> {
    Kernel::new(RecordingPlatform::default())
}

/// A kernel whose clock ticks on every switch and halt
pub(crate) fn ticking_kernel(start: Ticks) -> &'static Kernel<RecordingPlatform> {
    let kernel: &'static Kernel<RecordingPlatform> = Box::leak(Box::new(Kernel::with_timebase(
        RecordingPlatform::default(),
        Timebase::starting_at(start),
    )));
    kernel.platform().attach_clock(kernel.timebase());
    kernel
}
