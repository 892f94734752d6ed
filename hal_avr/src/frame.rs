//! # First-Dispatch Stack Frame
//!
//! A process that has never run is started by the same context switch that
//! resumes a parked one. Its stack must therefore look exactly as if it had
//! been parked by a switch: a return address, then the callee-saved
//! registers, then SREG.
//!
//! ## Layout
//!
//! The AVR stack grows down and `push` post-decrements, so the saved stack
//! pointer is one below the last byte written. From the top of the stack:
//!
//! ```text
//! top        PCL  \ return address of the start trampoline;
//!            PCH  / `ret` pops the high byte first
//!            r2 .. r15   zero
//!            r16 r17     entry point, low byte in r16
//!            r28 r29     zero
//! SP + 1     SREG        I flag set
//! SP ->      (free)
//! ```
//!
//! The trampoline moves r16:r17 into the first argument register pair and
//! calls into the kernel, which runs the entry point and retires the slot
//! when it returns.

use hal::ContextError;

/// SREG value a process starts with: interrupts enabled
pub const INITIAL_SREG: u8 = 0x80;

/// Callee-saved registers the switch pushes, in push order
pub const SAVED_REGISTERS: [u8; 18] = [
    2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 28, 29,
];

/// Bytes a parked context occupies: return address, registers, SREG
pub const FRAME_SIZE: usize = 2 + SAVED_REGISTERS.len() + 1;

/// Builds the first-dispatch frame at the top of `stack`
///
/// `base` is the data-space address of `stack[0]`. `trampoline` is the
/// code address `ret` jumps to and `entry` the value preloaded into
/// r16:r17. Returns the stack pointer to store in the context.
pub fn build_initial_frame(
    stack: &mut [u8],
    base: u16,
    trampoline: u16,
    entry: u16,
    slot: usize,
) -> Result<u16, ContextError> {
    if stack.len() < FRAME_SIZE + 1 {
        return Err(ContextError::NoStack(slot));
    }

    let mut top = stack.len();
    let mut push = |byte: u8| {
        top -= 1;
        stack[top] = byte;
    };

    let [trampoline_low, trampoline_high] = trampoline.to_le_bytes();
    push(trampoline_low);
    push(trampoline_high);

    let [entry_low, entry_high] = entry.to_le_bytes();
    for register in SAVED_REGISTERS {
        push(match register {
            16 => entry_low,
            17 => entry_high,
            _ => 0,
        });
    }
    push(INITIAL_SREG);

    // `top` is the last byte written; SP sits just below it.
    Ok(base.wrapping_add((top - 1) as u16))
}
