//! Shell error types

use hal::MemoryError;
use kernel_core::KernelError;
use thiserror::Error;

/// Why a command line could not be carried out
///
/// The console prints these after `*** `.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ShellError {
    #[error("unknown command")]
    UnknownCommand,

    #[error("missing arg")]
    MissingArgument,

    #[error("bad number")]
    BadNumber,

    #[error("unknown program")]
    UnknownProgram,

    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error(transparent)]
    Memory(#[from] MemoryError),

    /// The output sink refused a write
    #[error("output failed")]
    Output,
}

impl From<core::fmt::Error> for ShellError {
    fn from(_: core::fmt::Error) -> Self {
        ShellError::Output
    }
}
