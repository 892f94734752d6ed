//! Interrupt masking abstraction

/// Global interrupt mask control
///
/// Vector routing is owned by the kernel (it is a table of plain function
/// pointers); this trait only covers the CPU-wide enable flag.
pub trait InterruptHal {
    /// Enables interrupts
    fn enable_interrupts(&mut self);

    /// Disables interrupts
    fn disable_interrupts(&mut self);

    /// Returns whether interrupts are enabled
    fn interrupts_enabled(&self) -> bool;
}
