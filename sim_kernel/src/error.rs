//! Simulator error types

use kernel_core::Pid;
use thiserror::Error;

/// Failures reported when a simulation is shut down
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SimError {
    /// A process's entry function panicked
    #[error("Process {pid} panicked: {message}")]
    ProcessPanicked { pid: Pid, message: String },
}
