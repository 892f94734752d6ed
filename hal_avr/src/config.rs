//! Board configuration

use kernel_core::Event;

use crate::vectors::Vector;

/// Vector the kernel tick runs on
pub const TIMER_VECTOR: Vector = Vector::Timer0CompA;

/// Vector the serial receive handler runs on
pub const SERIAL_RX_VECTOR: Vector = Vector::UsartRx;

/// Event delivered for every received serial byte
pub const SERIAL_RX_EVENT: Event = Event(1);

/// Clock and line settings of the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    /// CPU clock in Hz
    pub cpu_hz: u32,
    /// Kernel tick rate in Hz
    pub tick_hz: u32,
    /// Serial line speed
    pub baud: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            cpu_hz: 16_000_000,
            tick_hz: 64,
            baud: 9600,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer0::TickSetting;
    use crate::usart::baud_divisor;

    #[test]
    fn test_default_board() {
        let config = BoardConfig::default();
        assert_eq!(config.cpu_hz, 16_000_000);
        assert_eq!(config.tick_hz, 64);
        assert_eq!(config.baud, 9600);
    }

    #[test]
    fn test_default_is_reachable() {
        let config = BoardConfig::default();
        let setting = TickSetting::for_rate(config.cpu_hz, config.tick_hz).unwrap();
        assert_eq!(setting.rate(config.cpu_hz), config.tick_hz);
        assert_eq!(baud_divisor(config.cpu_hz, config.baud), Some(103));
    }

    #[test]
    fn test_routed_vectors() {
        assert_eq!(TIMER_VECTOR.number(), 14);
        assert_eq!(SERIAL_RX_VECTOR.number(), 18);
    }
}
