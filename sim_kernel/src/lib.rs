//! # Simulated Kernel
//!
//! This crate runs the real `kernel_core` on a host.
//!
//! ## Purpose
//!
//! The simulation allows testing scheduler behavior without hardware:
//! - Runs under `cargo test`
//! - Deterministic (time only moves with switches, halts and `advance`)
//! - Real flows of control: every process is a thread with its own stack,
//!   and a yield truly does not return until the caller is rescheduled
//! - Inspectable (process table, trace, serial output, memory)
//!
//! ## Philosophy
//!
//! **Testability is a first-class design constraint.**
//!
//! This is not a mock of the kernel. The process table, router, timebase
//! and sleep service are the same code that runs on the board; only the
//! platform underneath ([`SimCpu`]) is simulated.
//!
//! ## Usage
//!
//! The thread that creates a [`Simulation`] becomes the idle process.
//! Processes are plain `fn()`s that use the [`sys`] functions:
//!
//! ```
//! use sim_kernel::{sys, SimConfig, Simulation};
//!
//! fn worker() {
//!     sys::sleep(3);
//! }
//!
//! let sim = Simulation::new(SimConfig::default());
//! let pid = sim.kernel().new_process(worker).unwrap();
//! sim.kernel().run(pid).unwrap();
//! sim.kernel().sleep(10);
//! sim.shutdown().unwrap();
//! ```

pub mod context;
pub mod error;
pub mod memory;
pub mod serial;
pub mod sys;
pub mod timer;

use std::any::Any;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::{Arc, Mutex};

use hal::CpuHal;
use kernel_core::{Event, Kernel, Pid, Ticks, Timebase};

pub use context::{SimContext, SimCpu};
pub use error::SimError;
pub use memory::SimMemory;
pub use serial::SimSerial;
pub use timer::SimTimer;

/// Simulation configuration
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Timer firings per context switch
    pub ticks_per_switch: u32,
    /// Vector the timer handler is installed on
    pub timer_vector: u8,
    /// Vector the serial receive handler is installed on
    pub serial_rx_vector: u8,
    /// Event delivered for every received serial byte
    pub serial_rx_event: Event,
    /// Size of the simulated data space in bytes
    pub memory_size: usize,
    /// Uptime at boot
    pub start_tick: Ticks,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ticks_per_switch: 1,
            timer_vector: 16,
            serial_rx_vector: 18,
            serial_rx_event: Event(1),
            memory_size: 0x900,
            start_tick: 0,
        }
    }
}

/// A process that panicked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub pid: Pid,
    pub message: String,
}

/// The simulated board: kernel plus devices
pub struct SimMachine {
    kernel: Kernel<SimCpu>,
    timer: SimTimer,
    serial: SimSerial,
    memory: SimMemory,
    config: SimConfig,
    faults: Mutex<Vec<Fault>>,
}

impl SimMachine {
    /// The kernel running on this machine
    pub fn kernel(&self) -> &Kernel<SimCpu> {
        &self.kernel
    }

    pub fn timer(&self) -> &SimTimer {
        &self.timer
    }

    pub fn serial(&self) -> &SimSerial {
        &self.serial
    }

    pub fn memory(&self) -> &SimMemory {
        &self.memory
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Fires interrupt `vector` on the calling thread
    ///
    /// The handler runs to completion before this returns. Returns whether
    /// a handler was installed.
    pub fn raise(&self, vector: u8) -> bool {
        self.kernel.router().dispatch(vector)
    }

    /// Fires the timer interrupt `ticks` times
    pub fn advance(&self, ticks: u32) {
        for _ in 0..ticks {
            self.fire_timer();
        }
    }

    /// Sends bytes down the serial line, raising the receive interrupt for
    /// each one
    pub fn send_serial(&self, bytes: &[u8]) {
        for &byte in bytes {
            self.serial.put_on_wire(byte);
            self.raise(self.config.serial_rx_vector);
        }
    }

    /// Panics captured so far
    pub fn faults(&self) -> Vec<Fault> {
        self.faults.lock().expect("fault log poisoned").clone()
    }

    pub(crate) fn fire_timer(&self) {
        if self.timer.is_enabled() {
            self.raise(self.config.timer_vector);
        }
    }

    pub(crate) fn record_fault(&self, pid: Pid, payload: &(dyn Any + Send)) {
        let message = payload
            .downcast_ref::<&str>()
            .map(|message| message.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        log::debug!("process {pid}: panicked: {message}");
        self.faults
            .lock()
            .expect("fault log poisoned")
            .push(Fault { pid, message });
    }
}

/// Owner of a running simulation
///
/// Must stay on the thread that created it: that thread is the machine's
/// idle process. Dropping it retires every process thread.
pub struct Simulation {
    machine: Arc<SimMachine>,
    _binding: sys::Binding,
    _idle_thread: PhantomData<*const ()>,
}

impl Simulation {
    /// Boots a machine with the calling thread as its idle process
    pub fn new(config: SimConfig) -> Self {
        let machine = Arc::new_cyclic(|weak| SimMachine {
            kernel: Kernel::with_timebase(
                SimCpu::new(weak.clone()),
                Timebase::starting_at(config.start_tick),
            ),
            timer: SimTimer::new(),
            serial: SimSerial::new(),
            memory: SimMemory::new(config.memory_size),
            config: config.clone(),
            faults: Mutex::new(Vec::new()),
        });
        let binding = sys::bind(machine.clone());

        // The router only rejects vectors past the table, which the
        // defaults never are.
        if let Err(err) = machine
            .kernel
            .install_timebase(config.timer_vector, timer::timer_isr)
        {
            log::debug!("timer vector {}: {err}", config.timer_vector);
        }
        if let Err(err) = machine
            .kernel
            .router()
            .register(config.serial_rx_vector, serial::serial_rx_isr)
        {
            log::debug!("serial vector {}: {err}", config.serial_rx_vector);
        }

        Self {
            machine,
            _binding: binding,
            _idle_thread: PhantomData,
        }
    }

    /// Shared handle to the machine
    pub fn machine(&self) -> Arc<SimMachine> {
        self.machine.clone()
    }

    /// Runs other processes until `done` holds, giving up after `limit`
    /// scheduling rounds
    ///
    /// Halts the CPU whenever nothing else is runnable, so sleepers make
    /// progress. Returns whether `done` was reached.
    pub fn run_until<F: FnMut(&SimMachine) -> bool>(&self, limit: usize, mut done: F) -> bool {
        for _ in 0..limit {
            if done(&self.machine) {
                return true;
            }
            let others_runnable = self.machine.kernel.snapshot()[1..]
                .iter()
                .any(|info| info.state.is_runnable());
            if others_runnable {
                self.machine.kernel.yield_now();
            } else {
                self.machine.kernel.platform().halt();
            }
        }
        done(&self.machine)
    }

    /// Retires every process thread and reports the first captured panic
    pub fn shutdown(self) -> Result<(), SimError> {
        self.machine.kernel.platform().shutdown();
        match self.machine.faults().into_iter().next() {
            Some(Fault { pid, message }) => Err(SimError::ProcessPanicked { pid, message }),
            None => Ok(()),
        }
    }
}

impl Deref for Simulation {
    type Target = SimMachine;

    fn deref(&self) -> &SimMachine {
        &self.machine
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.machine.kernel.platform().shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();
        assert_eq!(config.ticks_per_switch, 1);
        assert_eq!(config.timer_vector, 16);
        assert_eq!(config.serial_rx_vector, 18);
        assert_eq!(config.serial_rx_event, Event(1));
        assert_eq!(config.memory_size, 0x900);
    }

    #[test]
    fn test_boot_installs_handlers() {
        let sim = Simulation::new(SimConfig::default());
        assert!(sim.kernel().router().handler(16).is_some());
        assert!(sim.kernel().router().handler(18).is_some());
        assert_eq!(sim.kernel().current_pid(), Pid::IDLE);
        assert_eq!(sim.memory().size(), 0x900);
    }

    #[test]
    fn test_advance_ticks_timebase() {
        let sim = Simulation::new(SimConfig {
            start_tick: 100,
            ..SimConfig::default()
        });
        sim.advance(5);
        assert_eq!(sim.kernel().uptime(), 105);
        assert_eq!(sys::uptime(), 105);
    }

    #[test]
    fn test_masked_timer_drops_ticks() {
        use hal::TimerInterrupt;

        let sim = Simulation::new(SimConfig::default());
        let mut timer = sim.timer();
        timer.disable_interrupts();
        sim.advance(3);
        assert_eq!(sim.kernel().uptime(), 0);

        timer.enable_interrupts();
        sim.advance(3);
        assert_eq!(sim.kernel().uptime(), 3);
    }

    #[test]
    fn test_serial_input_wakes_event() {
        let sim = Simulation::new(SimConfig::default());
        sim.send_serial(b"hi");

        let mut port = sim.serial();
        assert_eq!(hal::SerialPort::read_byte(&mut port), Some(b'h'));
        assert_eq!(hal::SerialPort::read_byte(&mut port), Some(b'i'));
    }
}
