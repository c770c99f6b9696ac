//! CPU core trait.

/// A CPU core.
///
/// How a CPU is clocked differs between models (whole T-states against a
/// bus, or half clock periods against a pin bank), so clocking lives in
/// `Tickable`. This trait only covers inspection and reset.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Returns the current program counter.
    ///
    /// Returns `u32` to support all CPU address widths. Narrower CPUs
    /// zero-extend.
    fn pc(&self) -> u32;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Returns true if the CPU is halted.
    fn is_halted(&self) -> bool;

    /// Force the CPU into its defined reset state immediately.
    fn reset(&mut self);
}
