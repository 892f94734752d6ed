//! Stop, run, exit and reap

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use kernel_core::{Event, KernelError, Pid, ProcState};
use sim_kernel::{sys, SimConfig, SimError, Simulation};

const KICK: Event = Event(0x21);
static LAPS: AtomicUsize = AtomicUsize::new(0);

fn lap_on_kick() {
    loop {
        LAPS.fetch_add(1, Ordering::SeqCst);
        sys::wait_for_event(KICK);
    }
}

#[test]
fn test_stop_run_and_reap() {
    let sim = Simulation::new(SimConfig::default());
    let pid = sim.kernel().new_process(lap_on_kick).unwrap();
    sim.kernel().run(pid).unwrap();
    sim.kernel().yield_now();
    assert_eq!(LAPS.load(Ordering::SeqCst), 1);

    sim.kernel().stop(pid).unwrap();
    assert_eq!(sim.kernel().state(pid), ProcState::Stop);
    assert_eq!(sim.kernel().snapshot()[pid.index()].event, None);

    // A stopped process is deaf to its event.
    assert_eq!(sim.kernel().deliver_event(KICK), 0);
    sim.kernel().yield_now();
    assert_eq!(LAPS.load(Ordering::SeqCst), 1);

    // Running it again ends the wait it was stopped in.
    sim.kernel().run(pid).unwrap();
    sim.kernel().yield_now();
    assert_eq!(LAPS.load(Ordering::SeqCst), 2);
    assert_eq!(sim.kernel().state(pid), ProcState::Wait);

    sim.kernel().stop(pid).unwrap();
    sim.kernel().reap(pid).unwrap();
    assert_eq!(sim.kernel().state(pid), ProcState::Unused);
    assert_eq!(sim.kernel().platform().live_threads(), 0);
    assert_eq!(
        sim.kernel().run(pid),
        Err(KernelError::InvalidPid(pid.raw()))
    );

    // The slot is handed out again.
    assert_eq!(sim.kernel().new_process(lap_on_kick), Ok(pid));
    sim.shutdown().unwrap();
}

static RESUMED: AtomicBool = AtomicBool::new(false);

fn stop_myself() {
    let machine = sys::machine();
    machine.kernel().stop(sys::current_pid()).unwrap();
    RESUMED.store(true, Ordering::SeqCst);
}

#[test]
fn test_stopping_self_yields_immediately() {
    let sim = Simulation::new(SimConfig::default());
    let pid = sim.kernel().new_process(stop_myself).unwrap();
    sim.kernel().run(pid).unwrap();
    sim.kernel().yield_now();

    assert_eq!(sim.kernel().state(pid), ProcState::Stop);
    assert!(!RESUMED.load(Ordering::SeqCst));

    sim.kernel().run(pid).unwrap();
    sim.kernel().yield_now();
    assert!(RESUMED.load(Ordering::SeqCst));
    assert_eq!(sim.kernel().state(pid), ProcState::Zombie);
    sim.shutdown().unwrap();
}

fn return_at_once() {}

#[test]
fn test_returning_process_becomes_zombie() {
    let sim = Simulation::new(SimConfig::default());
    let pid = sim.kernel().new_process(return_at_once).unwrap();
    sim.kernel().run(pid).unwrap();
    sim.kernel().yield_now();

    assert_eq!(sim.kernel().state(pid), ProcState::Zombie);
    assert_eq!(sim.kernel().current_pid(), Pid::IDLE);
    assert_eq!(
        sim.kernel().run(pid),
        Err(KernelError::BadState {
            pid,
            state: ProcState::Zombie
        })
    );
    assert_eq!(sim.kernel().stop(pid), Ok(()));
    assert_eq!(sim.kernel().state(pid), ProcState::Zombie);

    // Zombies are never scheduled again.
    for _ in 0..3 {
        sim.kernel().yield_now();
    }
    assert_eq!(sim.kernel().current_pid(), Pid::IDLE);

    sim.kernel().reap(pid).unwrap();
    assert_eq!(sim.kernel().state(pid), ProcState::Unused);
    sim.shutdown().unwrap();
}

#[test]
fn test_reap_rejects_live_process() {
    let sim = Simulation::new(SimConfig::default());
    let pid = sim.kernel().new_process(lap_on_kick).unwrap();
    assert_eq!(
        sim.kernel().reap(pid),
        Err(KernelError::BadState {
            pid,
            state: ProcState::New
        })
    );
    assert_eq!(sim.kernel().reap(Pid::new(4).unwrap()), Err(KernelError::InvalidPid(4)));
    sim.shutdown().unwrap();
}

fn explode() {
    panic!("boom");
}

#[test]
fn test_panicking_process_is_reported() {
    let sim = Simulation::new(SimConfig::default());
    let pid = sim.kernel().new_process(explode).unwrap();
    sim.kernel().run(pid).unwrap();
    sim.kernel().yield_now();

    assert_eq!(sim.kernel().state(pid), ProcState::Zombie);
    assert_eq!(sim.faults().len(), 1);
    assert_eq!(
        sim.shutdown(),
        Err(SimError::ProcessPanicked {
            pid,
            message: "boom".to_string()
        })
    );
}
