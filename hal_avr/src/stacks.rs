//! Per-process stack regions
//!
//! One fixed `STACK_SIZE` region for every slot except the idle process,
//! which keeps the boot stack. Regions are disjoint and never move.

use core::cell::UnsafeCell;

use hal::ContextError;
use kernel_core::{MAX_PROCS, STACK_SIZE};

use crate::frame;

/// Stack regions for slots `1..MAX_PROCS`
pub struct StackArena {
    regions: [UnsafeCell<[u8; STACK_SIZE]>; MAX_PROCS - 1],
}

// SAFETY: a region is written by `prepare` only while its slot is being
// claimed (nothing runs on it), and otherwise only by the process that owns
// the slot, through its own stack pointer.
unsafe impl Sync for StackArena {}

impl StackArena {
    pub const fn new() -> Self {
        Self {
            regions: [const { UnsafeCell::new([0; STACK_SIZE]) }; MAX_PROCS - 1],
        }
    }

    /// Writes the first-dispatch frame for `slot` and returns its stack
    /// pointer
    ///
    /// The caller must own `slot`: no process may be running on its stack.
    pub fn prepare(&self, slot: usize, trampoline: u16, entry: u16) -> Result<u16, ContextError> {
        let region = slot
            .checked_sub(1)
            .and_then(|index| self.regions.get(index))
            .ok_or(ContextError::NoStack(slot))?;

        // SAFETY: the caller owns the slot, so nothing else touches the
        // region while the frame is written.
        let stack = unsafe { &mut *region.get() };
        let base = stack.as_ptr() as usize as u16;
        frame::build_initial_frame(stack, base, trampoline, entry, slot)
    }
}

impl Default for StackArena {
    fn default() -> Self {
        Self::new()
    }
}
