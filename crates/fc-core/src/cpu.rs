//! CPU core trait.

use crate::Bus;

/// A CPU core.
///
/// CPUs execute instructions by reading and writing through a bus. The bus
/// is passed in, never owned, so it can be shared with the video chip and
/// other peripherals; the CPU holds no back-reference between calls.
///
/// Interrupts are plain method calls made by the machine's clock chain when
/// it observes an interrupt condition — there is no asynchronous signalling.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Advance the CPU by one cycle.
    fn clock(&mut self, bus: &mut dyn Bus);

    /// Reset the CPU: reload the program counter from the reset vector and
    /// return the registers to their power-on state.
    fn reset(&mut self, bus: &mut dyn Bus);

    /// Request a maskable interrupt. Ignored while interrupts are disabled.
    fn irq(&mut self, bus: &mut dyn Bus);

    /// Request a non-maskable interrupt. Always taken.
    fn nmi(&mut self, bus: &mut dyn Bus);

    /// True when the current instruction has finished all its cycles.
    fn complete(&self) -> bool;

    /// Snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;
}
