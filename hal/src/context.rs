//! # Execution Context Switching
//!
//! The one place where the kernel needs platform-specific register
//! save/restore.
//!
//! ## Model
//!
//! Every process slot owns a saved execution context (`ContextHal::Context`)
//! that is only meaningful while the process is not running. For a real CPU
//! this is the saved stack pointer, with the callee-saved registers pushed on
//! the process's own stack. A simulator can use any token that identifies
//! the parked flow of control.
//!
//! The kernel drives the trait in three steps:
//!
//! 1. `prepare_context` builds a synthetic first-dispatch frame so that the
//!    first switch into a fresh slot starts executing its entry point.
//! 2. `switch_context` saves the caller into one context and restores
//!    another. It returns only when some later switch restores the caller.
//! 3. `release_context` is called when a terminated slot is reclaimed.

use thiserror::Error;

/// Entry point of a process
///
/// A process is a plain function. When it returns, the platform's start
/// trampoline hands control back to the kernel, which retires the slot.
pub type EntryPoint = fn();

/// Errors reported by a platform while preparing a context
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ContextError {
    /// The slot has no stack region on this platform
    #[error("No stack region for slot {0}")]
    NoStack(usize),

    /// The platform could not create a flow of control for the slot
    #[error("Context setup failed for slot {0}")]
    SetupFailed(usize),
}

/// Platform context switching
///
/// # Implementation Notes
///
/// - `switch_context` must preserve every register the calling convention
///   requires a callee to preserve
/// - A context is only read or written while its owner is not running
/// - Slot 0 is the boot flow of control (the idle process); it is never
///   prepared, its context is filled in by the first switch away from it
pub trait ContextHal {
    /// Saved execution context of one process slot
    type Context: Send;

    /// Context value of a slot that has never run
    const EMPTY: Self::Context;

    /// Builds the first-dispatch frame for `slot`
    ///
    /// After this call, restoring `context` begins execution at `entry`
    /// with a clean register file.
    fn prepare_context(
        &self,
        slot: usize,
        entry: EntryPoint,
        context: &mut Self::Context,
    ) -> Result<(), ContextError>;

    /// Saves the running context into `save` and resumes `restore`
    ///
    /// # Safety
    ///
    /// - `save` must point to the context slot of the caller and must stay
    ///   valid until the caller is resumed
    /// - `restore` must point to a context that was prepared or saved
    ///   earlier and whose owner is not running
    /// - Must not be called while a critical section is held
    unsafe fn switch_context(&self, save: *mut Self::Context, restore: *const Self::Context);

    /// Releases whatever the platform holds for a reclaimed slot
    fn release_context(&self, _slot: usize, _context: &mut Self::Context) {}
}
