//! Firmware pieces that build on the host
//!
//! The binary (`main.rs`, AVR only) wires these to the real board.

#![cfg_attr(not(test), no_std)]

use hal::{MemoryBus, MemoryError};
use hal_avr::frame::FRAME_SIZE;
use kernel_core::{Ticks, STACK_SIZE};

/// Printed once when the console starts
pub const BANNER: &str = "\nAVR kernel shell\n";

/// Stack a process needs past its first-dispatch frame: its own call chain
/// plus one interrupt, which runs on whatever stack is current
///
/// Programs in the shell's table must fit in this. The shell itself does
/// not and runs on the boot stack.
pub const PROCESS_HEADROOM: usize = 64;

const _: () = assert!(STACK_SIZE - FRAME_SIZE >= PROCESS_HEADROOM);

/// The on-board LED on PB5
pub mod led {
    /// Writing a one to a PINx bit toggles the output
    pub const PINB: u16 = 0x23;
    pub const DDRB: u16 = 0x24;
    pub const LED: u8 = 1 << 5;

    /// Toggles made by the blink program
    pub const TOGGLES: usize = 50;

    /// Ticks between toggles: half a second at the default tick rate
    pub const PERIOD: kernel_core::Ticks = 32;
}

/// Makes the LED pin an output and toggles it `toggles` times, sleeping
/// `period` ticks after each toggle
pub fn blink<M, S>(bus: &mut M, toggles: usize, period: Ticks, mut sleep: S) -> Result<(), MemoryError>
where
    M: MemoryBus,
    S: FnMut(Ticks),
{
    bus.set_bits(led::DDRB, led::LED)?;
    for _ in 0..toggles {
        bus.write_byte(led::PINB, led::LED)?;
        sleep(period);
    }
    log::debug!("blink: {toggles} toggles done");
    Ok(())
}
