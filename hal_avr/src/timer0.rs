//! # Timer0 Tick Source
//!
//! 8-bit Timer/Counter0 in CTC mode, firing `TIMER0_COMPA` at the kernel's
//! tick rate.
//!
//! ## Hardware Details
//!
//! - The counter runs at `cpu_hz / prescaler` and resets on matching OCR0A,
//!   so the interrupt rate is `cpu_hz / (prescaler * (OCR0A + 1))`
//! - The smallest prescaler whose compare value fits in 8 bits is chosen,
//!   for the best resolution
//! - At 16 MHz and 64 Hz that is prescaler 1024 with OCR0A = 243 (64.04 Hz)

use hal::{MemoryBus, MemoryError, TimerInterrupt};

use crate::regs::timer0::{OCIE0A, OCR0A, TCCR0A, TCCR0B, TIMSK0, WGM01};

/// Timer0 clock prescaler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prescaler {
    Div1,
    Div8,
    Div64,
    Div256,
    Div1024,
}

impl Prescaler {
    pub const ALL: [Prescaler; 5] = [
        Prescaler::Div1,
        Prescaler::Div8,
        Prescaler::Div64,
        Prescaler::Div256,
        Prescaler::Div1024,
    ];

    pub const fn divisor(self) -> u32 {
        match self {
            Prescaler::Div1 => 1,
            Prescaler::Div8 => 8,
            Prescaler::Div64 => 64,
            Prescaler::Div256 => 256,
            Prescaler::Div1024 => 1024,
        }
    }

    /// Clock select bits (CS02:0) in TCCR0B
    pub const fn clock_select(self) -> u8 {
        match self {
            Prescaler::Div1 => 0b001,
            Prescaler::Div8 => 0b010,
            Prescaler::Div64 => 0b011,
            Prescaler::Div256 => 0b100,
            Prescaler::Div1024 => 0b101,
        }
    }
}

/// Prescaler and compare value for one tick rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSetting {
    pub prescaler: Prescaler,
    pub compare: u8,
}

impl TickSetting {
    /// Finds the setting closest to `tick_hz` on a `cpu_hz` clock
    ///
    /// Rates too slow for the largest prescaler get the slowest rate the
    /// timer can do, and rates faster than the CPU clock get the fastest.
    /// Returns `None` for a zero rate.
    pub fn for_rate(cpu_hz: u32, tick_hz: u32) -> Option<TickSetting> {
        if tick_hz == 0 {
            return None;
        }
        for prescaler in Prescaler::ALL {
            let counts = cpu_hz / prescaler.divisor() / tick_hz;
            // Only the first prescaler can see zero counts.
            if counts <= 256 {
                return Some(TickSetting {
                    prescaler,
                    compare: counts.saturating_sub(1) as u8,
                });
            }
        }
        Some(TickSetting {
            prescaler: Prescaler::Div1024,
            compare: u8::MAX,
        })
    }

    /// Interrupt rate this setting produces
    pub fn rate(&self, cpu_hz: u32) -> u32 {
        cpu_hz / self.prescaler.divisor() / (self.compare as u32 + 1)
    }
}

/// Timer0 driver
#[derive(Debug)]
pub struct Timer0<M: MemoryBus> {
    bus: M,
    cpu_hz: u32,
    setting: Option<TickSetting>,
}

impl<M: MemoryBus> Timer0<M> {
    /// Creates a driver for a CPU clocked at `cpu_hz`
    ///
    /// Does not touch the hardware.
    pub fn new(bus: M, cpu_hz: u32) -> Self {
        Self {
            bus,
            cpu_hz,
            setting: None,
        }
    }

    /// Programs CTC mode for `tick_hz` and starts the counter
    pub fn configure(&mut self, tick_hz: u32) -> Result<Option<TickSetting>, MemoryError> {
        let Some(setting) = TickSetting::for_rate(self.cpu_hz, tick_hz) else {
            // A zero rate stops the clock.
            self.bus.write_byte(TCCR0B, 0)?;
            self.setting = None;
            return Ok(None);
        };

        self.bus.write_byte(TCCR0A, WGM01)?;
        self.bus.write_byte(OCR0A, setting.compare)?;
        self.bus.write_byte(TCCR0B, setting.prescaler.clock_select())?;
        self.setting = Some(setting);
        log::debug!(
            "timer0: {} Hz requested, prescaler {} compare {}",
            tick_hz,
            setting.prescaler.divisor(),
            setting.compare
        );
        Ok(Some(setting))
    }

    /// The active setting, if the timer has been configured
    pub fn setting(&self) -> Option<TickSetting> {
        self.setting
    }

    /// Consumes the driver, returning its bus
    pub fn into_bus(self) -> M {
        self.bus
    }
}

impl<M: MemoryBus> TimerInterrupt for Timer0<M> {
    fn configure_periodic(&mut self, hz: u32) {
        if let Err(err) = self.configure(hz) {
            log::debug!("timer0: configure failed: {err}");
        }
    }

    fn enable_interrupts(&mut self) {
        if let Err(err) = self.bus.set_bits(TIMSK0, OCIE0A) {
            log::debug!("timer0: enable failed: {err}");
        }
    }

    fn disable_interrupts(&mut self) {
        if let Err(err) = self.bus.clear_bits(TIMSK0, OCIE0A) {
            log::debug!("timer0: disable failed: {err}");
        }
    }
}
