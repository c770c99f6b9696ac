//! State visible to instruction handlers.
//!
//! Handlers get a `&mut Core` and a coordinate, nothing else. They move
//! values through the bus router and flip control-unit state; pin work is
//! the sequencer's job.

use crate::control::ControlUnit;
use crate::error::Fault;
use crate::instructions::Prefix;
use crate::registers::Registers;
use crate::router::BusRouter;
use crate::trace::MicroInstruction;

#[derive(Debug, Default)]
pub(crate) struct Core {
    pub(crate) regs: Registers,
    pub(crate) router: BusRouter,
    pub(crate) control: ControlUnit,
    /// Opcode latched at the decode point of the current instruction.
    pub(crate) opcode: u8,
    /// Prefix in force for the current instruction.
    pub(crate) prefix: Prefix,
    /// Prefix that the next decode will use. Set by prefix bytes.
    pub(crate) next_prefix: Prefix,
    /// True once a handler switched to the alternate timing.
    pub(crate) alternate: bool,
    /// Events waiting to be handed to the trace sink.
    pub(crate) events: Vec<MicroInstruction>,
    pub(crate) fault: Option<Fault>,
    pub(crate) unsupported_count: u64,
}

impl Core {
    /// Switch the current instruction to its alternate timing.
    pub(crate) fn select_alternate(&mut self) {
        debug_assert!(!self.alternate, "alternate timing selected twice");
        self.alternate = true;
    }

    pub(crate) fn emit(&mut self, event: MicroInstruction) {
        self.events.push(event);
    }

    /// Index register picked by the DD/FD prefix in force.
    pub(crate) fn index_register(&self) -> crate::router::Reg16 {
        self.prefix.index_register()
    }
}
