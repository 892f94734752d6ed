//! CPU abstraction

/// CPU operations the kernel needs outside of a context switch
pub trait CpuHal {
    /// Halts the CPU until the next interrupt
    ///
    /// Used by the idle path when no process is runnable. Implementations
    /// must return after any interrupt has been serviced.
    fn halt(&self);
}
