//! Kernel error types

use hal::ContextError;
use thiserror::Error;

use crate::process::{Pid, ProcState};

/// Errors returned by kernel operations
///
/// None of the kernel operations panic on bad input; they report one of
/// these and leave the process table untouched.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum KernelError {
    /// Pid out of range or naming an unused slot
    #[error("Invalid pid: {0}")]
    InvalidPid(i32),

    /// Operation not valid for the slot's current state
    #[error("Process {pid} is {state}")]
    BadState { pid: Pid, state: ProcState },

    /// Every process slot is in use
    #[error("No free process slot")]
    NoFreeSlot,

    /// Interrupt vector index is not a valid line
    #[error("Interrupt vector out of range: {0}")]
    OutOfRange(u8),

    /// The platform could not prepare a context for a new process
    #[error(transparent)]
    Context(#[from] ContextError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(KernelError::InvalidPid(-1).to_string(), "Invalid pid: -1");
        assert_eq!(KernelError::NoFreeSlot.to_string(), "No free process slot");
        assert_eq!(
            KernelError::OutOfRange(26).to_string(),
            "Interrupt vector out of range: 26"
        );

        let pid = Pid::new(3).unwrap();
        let err = KernelError::BadState {
            pid,
            state: ProcState::Zombie,
        };
        assert_eq!(err.to_string(), "Process 3 is zombie");
    }

    #[test]
    fn test_context_error_converts() {
        let err: KernelError = ContextError::SetupFailed(2).into();
        assert_eq!(err, KernelError::Context(ContextError::SetupFailed(2)));
        assert_eq!(err.to_string(), "Context setup failed for slot 2");
    }
}
