//! Firmware image for an ATmega328P board
//!
//! Boots the kernel and then serves the shell on the serial console from
//! the boot flow of control, which is the idle process. The shell's line
//! buffer and formatting need the boot stack; processes started from the
//! shell get the small per-slot stacks.

#![no_std]
#![no_main]

use core::panic::PanicInfo;

use hal::{InterruptHal, SerialPort};
use hal_avr::{board, BoardConfig, GlobalInterrupts, RealMmio, SERIAL_RX_EVENT};
use kernel_bootstrap_lib::{blink, led, BANNER};
use shell::{Console, Program, Shell};

static PROGRAMS: [Program; 1] = [Program::new("led", led_main)];

fn led_main() {
    if let Err(err) = blink(&mut RealMmio::new(), led::TOGGLES, led::PERIOD, board::sleep) {
        log::debug!("led: {err}");
    }
}

fn shell_main() -> ! {
    let mut shell = Shell::new(&board::KERNEL, RealMmio::new(), &PROGRAMS);
    let mut console = Console::new(&board::KERNEL, board::console(), SERIAL_RX_EVENT);
    console.port().write_bytes(BANNER.as_bytes());
    console.run(&mut shell)
}

#[unsafe(no_mangle)]
pub extern "C" fn main() -> ! {
    if let Err(err) = board::boot(BoardConfig::default()) {
        log::debug!("boot: {err}");
    }

    // While the shell waits for input, the kernel halts between interrupts
    // whenever nothing else can run.
    shell_main()
}

#[panic_handler]
fn panic(_info: &PanicInfo) -> ! {
    GlobalInterrupts::new(RealMmio::new()).disable_interrupts();
    board::console().write_bytes(b"\r\n*** PANIC\r\n");
    loop {}
}
