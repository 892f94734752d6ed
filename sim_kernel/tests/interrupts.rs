//! Interrupt routing on the simulated board

use std::sync::atomic::{AtomicUsize, Ordering};

use kernel_core::{Event, KernelError, ProcState, NUM_INT_VECTS};
use sim_kernel::{sys, SimConfig, Simulation};

static FIRST: AtomicUsize = AtomicUsize::new(0);
static SECOND: AtomicUsize = AtomicUsize::new(0);

fn first_handler() {
    FIRST.fetch_add(1, Ordering::SeqCst);
}

fn second_handler() {
    SECOND.fetch_add(1, Ordering::SeqCst);
}

#[test]
fn test_registration_replaces_handler() {
    let sim = Simulation::new(SimConfig::default());
    let router = sim.kernel().router();

    assert!(router.register(3, first_handler).unwrap().is_none());
    assert!(sim.raise(3));
    assert_eq!(FIRST.load(Ordering::SeqCst), 1);

    assert!(router.register(3, second_handler).unwrap().is_some());
    assert!(sim.raise(3));
    assert!(sim.raise(3));
    assert_eq!(FIRST.load(Ordering::SeqCst), 1);
    assert_eq!(SECOND.load(Ordering::SeqCst), 2);

    assert_eq!(
        router.register(NUM_INT_VECTS as u8, first_handler).err(),
        Some(KernelError::OutOfRange(NUM_INT_VECTS as u8))
    );
    assert!(!sim.raise(4));
    sim.shutdown().unwrap();
}

const BORROWED_VECTOR: u8 = 11;
const DONE: Event = Event(0x30);
static BORROWED_CALLS: AtomicUsize = AtomicUsize::new(0);
static OWNER_CALLS: AtomicUsize = AtomicUsize::new(0);

fn owner_handler() {
    OWNER_CALLS.fetch_add(1, Ordering::SeqCst);
}

fn borrowed_handler() {
    BORROWED_CALLS.fetch_add(1, Ordering::SeqCst);
    sys::deliver_event(DONE);
}

fn borrow_vector() {
    let machine = sys::machine();
    let router = machine.kernel().router();
    let previous = router.register(BORROWED_VECTOR, borrowed_handler).unwrap();
    sys::wait_for_event(DONE);
    if let Some(previous) = previous {
        router.register(BORROWED_VECTOR, previous).unwrap();
    }
}

#[test]
fn test_process_restores_borrowed_vector() {
    let sim = Simulation::new(SimConfig::default());
    sim.kernel().router().register(BORROWED_VECTOR, owner_handler).unwrap();

    let pid = sim.kernel().new_process(borrow_vector).unwrap();
    sim.kernel().run(pid).unwrap();
    sim.kernel().yield_now();
    assert_eq!(sim.kernel().state(pid), ProcState::Wait);

    sim.raise(BORROWED_VECTOR);
    assert_eq!(BORROWED_CALLS.load(Ordering::SeqCst), 1);
    sim.kernel().yield_now();
    assert_eq!(sim.kernel().state(pid), ProcState::Zombie);

    sim.raise(BORROWED_VECTOR);
    assert_eq!(BORROWED_CALLS.load(Ordering::SeqCst), 1);
    assert_eq!(OWNER_CALLS.load(Ordering::SeqCst), 1);
    sim.shutdown().unwrap();
}

#[test]
fn test_serial_receive_event() {
    let sim = Simulation::new(SimConfig::default());
    let event = sim.config().serial_rx_event;
    assert_eq!(sim.kernel().deliver_event(event), 0);

    sim.send_serial(b"x");
    assert!(hal::SerialPort::has_data(&sim.serial()));
    sim.shutdown().unwrap();
}
