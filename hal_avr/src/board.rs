//! # Board Glue
//!
//! The single kernel instance of the board, the hardware vector table
//! entries that feed its router, the critical-section implementation, and
//! the system calls processes use.
//!
//! Every `__vector_N` except RESET jumps into the router, which calls
//! whatever handler is installed for `N` (or nothing). Handlers run with
//! interrupts masked and never switch processes.

use core::arch::asm;

use critical_section::RawRestoreState;
use hal::{EntryPoint, InterruptHal, TimerInterrupt};
use kernel_core::{Event, Kernel, KernelError, Pid, Ticks};

use crate::interrupts::GlobalInterrupts;
use crate::mmio::RealMmio;
use crate::regs::SREG_I;
use crate::timer0::Timer0;
use crate::usart::{RxBuffer, Usart0};
use crate::{AvrPlatform, BoardConfig, SERIAL_RX_EVENT, SERIAL_RX_VECTOR, TIMER_VECTOR};

/// The kernel; the boot flow of control is its idle process
pub static KERNEL: Kernel<AvrPlatform> = Kernel::new(AvrPlatform::new());

/// Bytes received on USART0
pub static SERIAL_RX: RxBuffer = RxBuffer::new();

struct AvrCriticalSection;
critical_section::set_impl!(AvrCriticalSection);

// SAFETY: single core; clearing the I flag excludes every interrupt handler,
// and the saved SREG decides whether leaving re-enables them.
unsafe impl critical_section::Impl for AvrCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let sreg: u8;
        unsafe {
            asm!("in {sreg}, 0x3f", "cli", sreg = out(reg) sreg);
        }
        sreg
    }

    unsafe fn release(sreg: RawRestoreState) {
        if sreg & SREG_I != 0 {
            unsafe { asm!("sei") };
        }
    }
}

/// Where a process goes after its trampoline
pub(crate) extern "C" fn process_main(entry: EntryPoint) -> ! {
    entry();
    KERNEL.exit_current()
}

fn timer_tick() {
    KERNEL.timebase().tick();
}

fn serial_receive() {
    let mut usart = Usart0::new(RealMmio::new(), &SERIAL_RX);
    if let Ok(true) = usart.on_receive() {
        KERNEL.deliver_event(SERIAL_RX_EVENT);
    }
}

/// Installs the tick and serial handlers, programs the devices and enables
/// interrupts
///
/// Must run once, from the boot flow of control, before any process is
/// created.
pub fn boot(config: BoardConfig) -> Result<(), KernelError> {
    KERNEL.install_timebase(TIMER_VECTOR.number(), timer_tick)?;
    KERNEL
        .router()
        .register(SERIAL_RX_VECTOR.number(), serial_receive)?;

    let mut timer = Timer0::new(RealMmio::new(), config.cpu_hz);
    timer.configure_periodic(config.tick_hz);
    timer.enable_interrupts();

    if let Err(err) = console().init(config.cpu_hz, config.baud) {
        log::debug!("usart0: init failed: {err}");
    }

    GlobalInterrupts::new(RealMmio::new()).enable_interrupts();
    log::debug!("board: up at {} Hz tick", config.tick_hz);
    Ok(())
}

/// The serial console
pub fn console() -> Usart0<'static, RealMmio> {
    Usart0::new(RealMmio::new(), &SERIAL_RX)
}

pub fn yield_now() {
    KERNEL.yield_now();
}

pub fn sleep(ticks: Ticks) {
    KERNEL.sleep(ticks);
}

pub fn wait_for_event(event: Event) {
    KERNEL.wait_for_event(event);
}

pub fn deliver_event(event: Event) -> usize {
    KERNEL.deliver_event(event)
}

pub fn uptime() -> Ticks {
    KERNEL.uptime()
}

pub fn current_pid() -> Pid {
    KERNEL.current_pid()
}

macro_rules! vector_trampolines {
    ($($number:literal => $name:ident),* $(,)?) => {
        $(
            #[unsafe(no_mangle)]
            pub unsafe extern "avr-interrupt" fn $name() {
                KERNEL.router().dispatch($number);
            }
        )*
    };
}

vector_trampolines! {
    1 => __vector_1,
    2 => __vector_2,
    3 => __vector_3,
    4 => __vector_4,
    5 => __vector_5,
    6 => __vector_6,
    7 => __vector_7,
    8 => __vector_8,
    9 => __vector_9,
    10 => __vector_10,
    11 => __vector_11,
    12 => __vector_12,
    13 => __vector_13,
    14 => __vector_14,
    15 => __vector_15,
    16 => __vector_16,
    17 => __vector_17,
    18 => __vector_18,
    19 => __vector_19,
    20 => __vector_20,
    21 => __vector_21,
    22 => __vector_22,
    23 => __vector_23,
    24 => __vector_24,
    25 => __vector_25,
}
