//! AVR context switch and idle sleep
//!
//! A parked process is nothing but its stack pointer: the switch pushes the
//! callee-saved registers and SREG onto the outgoing stack, swaps SP, and
//! pops the same set from the incoming stack. Caller-saved registers are
//! already dead at the call site, so they are not saved.

use core::arch::{asm, naked_asm};

use hal::{ContextError, ContextHal, CpuHal, EntryPoint};

use crate::regs::{SMCR, SMCR_SE};
use crate::AvrPlatform;

/// Saves the caller on its stack, stores SP to `save`, loads SP from
/// `restore` and resumes whatever was parked there.
///
/// Arguments arrive in r25:r24 (`save`) and r23:r22 (`restore`).
#[unsafe(naked)]
unsafe extern "C" fn switch_stacks(save: *mut u16, restore: *const u16) {
    naked_asm!(
        "in r0, 0x3f",
        "cli",
        "push r2",
        "push r3",
        "push r4",
        "push r5",
        "push r6",
        "push r7",
        "push r8",
        "push r9",
        "push r10",
        "push r11",
        "push r12",
        "push r13",
        "push r14",
        "push r15",
        "push r16",
        "push r17",
        "push r28",
        "push r29",
        "push r0",
        // *save = SP
        "in r26, 0x3d",
        "in r27, 0x3e",
        "movw r30, r24",
        "st Z, r26",
        "std Z+1, r27",
        // SP = *restore
        "movw r30, r22",
        "ld r26, Z",
        "ldd r27, Z+1",
        "out 0x3e, r27",
        "out 0x3d, r26",
        "pop r0",
        "pop r29",
        "pop r28",
        "pop r17",
        "pop r16",
        "pop r15",
        "pop r14",
        "pop r13",
        "pop r12",
        "pop r11",
        "pop r10",
        "pop r9",
        "pop r8",
        "pop r7",
        "pop r6",
        "pop r5",
        "pop r4",
        "pop r3",
        "pop r2",
        // Restores the I flag of the resumed context.
        "out 0x3f, r0",
        "ret",
    );
}

/// First instruction of every process
///
/// The initial frame leaves the entry point in r16:r17; it becomes the
/// argument of `process_main`.
#[unsafe(naked)]
unsafe extern "C" fn process_trampoline() -> ! {
    naked_asm!(
        "clr r1",
        "movw r24, r16",
        "call {main}",
        main = sym crate::board::process_main,
    );
}

impl ContextHal for AvrPlatform {
    type Context = u16;

    const EMPTY: u16 = 0;

    fn prepare_context(
        &self,
        slot: usize,
        entry: EntryPoint,
        context: &mut u16,
    ) -> Result<(), ContextError> {
        // Code addresses are word addresses on AVR, which is what `ret` and
        // `icall` expect.
        let trampoline = process_trampoline as usize as u16;
        let entry = entry as usize as u16;
        *context = self.stacks().prepare(slot, trampoline, entry)?;
        Ok(())
    }

    unsafe fn switch_context(&self, save: *mut u16, restore: *const u16) {
        // SAFETY: the kernel passes the caller's own context slot and a
        // parked or freshly prepared context.
        unsafe { switch_stacks(save, restore) }
    }
}

impl CpuHal for AvrPlatform {
    fn halt(&self) {
        // SAFETY: touches only SMCR. `sei; sleep` is atomic: the instruction
        // after `sei` always runs, so no interrupt is slept through.
        unsafe {
            asm!(
                "lds {tmp}, {smcr}",
                "ori {tmp}, {se}",
                "sts {smcr}, {tmp}",
                "sei",
                "sleep",
                "lds {tmp}, {smcr}",
                "andi {tmp}, {nse}",
                "sts {smcr}, {tmp}",
                tmp = out(reg_upper) _,
                smcr = const SMCR,
                se = const SMCR_SE,
                nse = const !SMCR_SE,
            );
        }
    }
}
