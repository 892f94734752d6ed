//! # Shell
//!
//! Line-oriented command shell for the kernel.
//!
//! It creates, starts, stops and reaps processes, lists the process table,
//! and peeks and pokes I/O registers and memory. See [`commands::COMMANDS`]
//! for the command set.
//!
//! ## Layers
//!
//! - [`parser`]: tokens and numbers
//! - [`commands`]: one command line in, text out
//! - [`interactive`]: prompt, line editing and blocking serial input
//! - [`programs`]: the table `new` resolves names against

#![cfg_attr(not(test), no_std)]

pub mod commands;
pub mod error;
pub mod interactive;
pub mod parser;
pub mod programs;

pub use commands::Shell;
pub use error::ShellError;
pub use interactive::{Console, PROMPT};
pub use programs::Program;
