//! ATmega328P interrupt vectors
//!
//! The number of a vector is its index in the hardware table, which is also
//! the `N` of its `__vector_N` symbol and the line the kernel's router
//! dispatches.

use kernel_core::NUM_INT_VECTS;

/// Hardware interrupt vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vector {
    Reset,
    Int0,
    Int1,
    PcInt0,
    PcInt1,
    PcInt2,
    Watchdog,
    Timer2CompA,
    Timer2CompB,
    Timer2Ovf,
    Timer1Capt,
    Timer1CompA,
    Timer1CompB,
    Timer1Ovf,
    Timer0CompA,
    Timer0CompB,
    Timer0Ovf,
    SpiStc,
    UsartRx,
    UsartUdre,
    UsartTx,
    Adc,
    EeReady,
    AnalogComp,
    Twi,
    SpmReady,
}

impl Vector {
    /// Every vector, in table order
    pub const ALL: [Vector; NUM_INT_VECTS] = [
        Vector::Reset,
        Vector::Int0,
        Vector::Int1,
        Vector::PcInt0,
        Vector::PcInt1,
        Vector::PcInt2,
        Vector::Watchdog,
        Vector::Timer2CompA,
        Vector::Timer2CompB,
        Vector::Timer2Ovf,
        Vector::Timer1Capt,
        Vector::Timer1CompA,
        Vector::Timer1CompB,
        Vector::Timer1Ovf,
        Vector::Timer0CompA,
        Vector::Timer0CompB,
        Vector::Timer0Ovf,
        Vector::SpiStc,
        Vector::UsartRx,
        Vector::UsartUdre,
        Vector::UsartTx,
        Vector::Adc,
        Vector::EeReady,
        Vector::AnalogComp,
        Vector::Twi,
        Vector::SpmReady,
    ];

    /// Index of the vector in the hardware table
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// Looks a vector up by its table index
    pub fn from_number(number: u8) -> Option<Vector> {
        Self::ALL.get(number as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_order() {
        for (index, vector) in Vector::ALL.iter().enumerate() {
            assert_eq!(vector.number() as usize, index);
            assert_eq!(Vector::from_number(index as u8), Some(*vector));
        }
        assert_eq!(Vector::from_number(NUM_INT_VECTS as u8), None);
    }

    #[test]
    fn test_known_numbers() {
        assert_eq!(Vector::Reset.number(), 0);
        assert_eq!(Vector::Timer1Ovf.number(), 13);
        assert_eq!(Vector::Timer0CompA.number(), 14);
        assert_eq!(Vector::Timer0Ovf.number(), 16);
        assert_eq!(Vector::UsartRx.number(), 18);
        assert_eq!(Vector::SpmReady.number(), 25);
    }
}
