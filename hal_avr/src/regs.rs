//! ATmega328P register map
//!
//! Addresses are data-space addresses (what `lds`/`sts` use). I/O register
//! `n` as seen by `in`/`out` lives at data address `n + IO_OFFSET`.

/// Offset from I/O space to data space
pub const IO_OFFSET: u16 = 0x20;

/// Last SRAM address
pub const RAMEND: u16 = 0x08ff;

/// Size of the data space: registers, I/O, extended I/O and SRAM
pub const DATA_SPACE_SIZE: usize = RAMEND as usize + 1;

pub const SMCR: u16 = 0x53;
pub const SPL: u16 = 0x5d;
pub const SPH: u16 = 0x5e;
pub const SREG: u16 = 0x5f;

/// Global interrupt enable flag in SREG
pub const SREG_I: u8 = 1 << 7;

/// Sleep enable in SMCR (sleep mode bits left at 0: idle)
pub const SMCR_SE: u8 = 1 << 0;

pub mod timer0 {
    pub const TCCR0A: u16 = 0x44;
    pub const TCCR0B: u16 = 0x45;
    pub const OCR0A: u16 = 0x47;
    pub const TIMSK0: u16 = 0x6e;

    /// Clear Timer on Compare match mode
    pub const WGM01: u8 = 1 << 1;
    /// Compare match A interrupt enable
    pub const OCIE0A: u8 = 1 << 1;
}

pub mod usart0 {
    pub const UCSR0A: u16 = 0xc0;
    pub const UCSR0B: u16 = 0xc1;
    pub const UCSR0C: u16 = 0xc2;
    pub const UBRR0L: u16 = 0xc4;
    pub const UBRR0H: u16 = 0xc5;
    pub const UDR0: u16 = 0xc6;

    // UCSR0A
    pub const RXC0: u8 = 1 << 7;
    pub const UDRE0: u8 = 1 << 5;

    // UCSR0B
    pub const RXCIE0: u8 = 1 << 7;
    pub const RXEN0: u8 = 1 << 4;
    pub const TXEN0: u8 = 1 << 3;

    // UCSR0C: asynchronous, no parity, 1 stop bit, 8 data bits
    pub const FORMAT_8N1: u8 = 0b0000_0110;
}
