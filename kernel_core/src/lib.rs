//! # Kernel Core
//!
//! A cooperative multitasking kernel for a single-core microcontroller.
//!
//! ## Components
//!
//! - [`router`]: interrupt vector redirection table
//! - [`timebase`]: tick counter advanced by the timer interrupt
//! - [`scheduler`]: process table, round-robin dispatch, events
//! - [`sleep`]: blocking delay built from yield and the timebase
//!
//! ## Concurrency Model
//!
//! One process runs at a time and keeps the CPU until it yields (directly,
//! by waiting for an event, or by sleeping). Interrupt handlers may preempt
//! it at any instant; they run to completion and return to the interrupted
//! process, never to a different one. Every piece of shared state lives in
//! a `critical_section::Mutex`, so reading or updating it masks interrupts.
//!
//! ## Platform
//!
//! The kernel is generic over a [`Platform`]: something that can switch
//! execution contexts ([`hal::ContextHal`]) and halt the CPU until the next
//! interrupt ([`hal::CpuHal`]).

#![cfg_attr(not(test), no_std)]

pub mod error;
pub mod process;
pub mod router;
pub mod scheduler;
pub mod sleep;
pub mod timebase;
pub mod trace;

#[cfg(test)]
pub(crate) mod testing;

pub use error::KernelError;
pub use process::{Event, Pid, ProcState, ProcessInfo, MAX_PROCS, STACK_SIZE};
pub use router::{Handler, Router, NUM_INT_VECTS};
pub use scheduler::Kernel;
pub use timebase::{Ticks, Timebase};
pub use trace::{ScheduleEvent, Trace, TRACE_CAPACITY};

/// Everything a kernel needs from the hardware
pub trait Platform: hal::ContextHal + hal::CpuHal {}

impl<T: hal::ContextHal + hal::CpuHal> Platform for T {}
