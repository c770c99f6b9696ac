//! Machine-cycle shapes, instruction templates and tick coordinates.
//!
//! Every instruction is a fixed list of machine cycles. Each machine cycle
//! is a `CycleKind` whose pin behaviour is a shared, immutable table keyed
//! by half-T-state, plus a T-state count that may exceed the kind's
//! standard length (the extra T-states are internal and move no pins).
//!
//! Half-T-state numbering: half `2N-1` is the rising edge of T-state N and
//! half `2N` its falling edge, both 1-based. "The rising edge of the last
//! clock period" of a k-T-state cycle is therefore half `2k-1`.

use crate::signal::{Level, OutputPin};

/// Bus transaction performed by one machine cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CycleKind {
    /// M1: opcode read, then refresh address during T3-T4.
    OpcodeFetch,
    MemoryRead,
    MemoryWrite,
    /// I/O read, with its automatic wait state (TW) built in.
    IoRead,
    /// I/O write, with its automatic wait state (TW) built in.
    IoWrite,
    /// Maskable interrupt acknowledge: M1 with IORQ instead of MREQ and two
    /// automatic wait states.
    InterruptAcknowledge,
    /// No bus transaction.
    Internal,
}

/// One pin transition at a given half-T-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinEdge {
    pub half: u8,
    pub pin: OutputPin,
    pub level: Level,
}

const fn edge(half: u8, pin: OutputPin, level: Level) -> PinEdge {
    PinEdge { half, pin, level }
}

use Level::{High, Low};
use OutputPin::{Iorq, M1, Mreq, Rd, Rfsh, Wr};

/// Immutable timing of a cycle kind, shared by every instruction using it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleShape {
    /// T-states of the bare transaction.
    pub t_states: u8,
    /// Control pin transitions, in half-T-state order.
    pub pins: &'static [PinEdge],
    /// Half at which the data pins are sampled onto the internal data bus.
    pub data_sample: Option<u8>,
    /// Half at which the internal data bus is driven onto the data pins.
    pub data_drive: Option<u8>,
    /// Half at which the CPU lets go of the data pins again.
    pub data_release: Option<u8>,
    /// Half at which WAIT is sampled; LOW inserts a wait state.
    pub wait_sample: Option<u8>,
    /// Half at which the refresh address goes out.
    pub refresh: Option<u8>,
}

const OPCODE_FETCH: CycleShape = CycleShape {
    t_states: 4,
    pins: &[
        edge(1, Rfsh, High),
        edge(1, M1, Low),
        edge(2, Mreq, Low),
        edge(2, Rd, Low),
        edge(5, M1, High),
        edge(5, Mreq, High),
        edge(5, Rd, High),
        edge(5, Rfsh, Low),
        edge(6, Mreq, Low),
        edge(8, Mreq, High),
    ],
    data_sample: Some(5),
    data_drive: None,
    data_release: None,
    wait_sample: Some(4),
    refresh: Some(5),
};

const MEMORY_READ: CycleShape = CycleShape {
    t_states: 3,
    pins: &[
        edge(1, Rfsh, High),
        edge(2, Mreq, Low),
        edge(2, Rd, Low),
        edge(6, Mreq, High),
        edge(6, Rd, High),
    ],
    data_sample: Some(6),
    data_drive: None,
    data_release: None,
    wait_sample: Some(4),
    refresh: None,
};

const MEMORY_WRITE: CycleShape = CycleShape {
    t_states: 3,
    pins: &[
        edge(1, Rfsh, High),
        edge(2, Mreq, Low),
        edge(4, Wr, Low),
        edge(6, Mreq, High),
        edge(6, Wr, High),
    ],
    data_sample: None,
    data_drive: Some(2),
    data_release: Some(6),
    wait_sample: Some(4),
    refresh: None,
};

const IO_READ: CycleShape = CycleShape {
    t_states: 4,
    pins: &[
        edge(1, Rfsh, High),
        edge(3, Iorq, Low),
        edge(3, Rd, Low),
        edge(8, Iorq, High),
        edge(8, Rd, High),
    ],
    data_sample: Some(8),
    data_drive: None,
    data_release: None,
    wait_sample: Some(6),
    refresh: None,
};

const IO_WRITE: CycleShape = CycleShape {
    t_states: 4,
    pins: &[
        edge(1, Rfsh, High),
        edge(3, Iorq, Low),
        edge(3, Wr, Low),
        edge(8, Iorq, High),
        edge(8, Wr, High),
    ],
    data_sample: None,
    data_drive: Some(2),
    data_release: Some(8),
    wait_sample: Some(6),
    refresh: None,
};

const INTERRUPT_ACKNOWLEDGE: CycleShape = CycleShape {
    t_states: 6,
    pins: &[
        edge(1, Rfsh, High),
        edge(1, M1, Low),
        edge(5, Iorq, Low),
        edge(9, M1, High),
        edge(9, Iorq, High),
        edge(9, Rfsh, Low),
        edge(10, Mreq, Low),
        edge(12, Mreq, High),
    ],
    data_sample: Some(9),
    data_drive: None,
    data_release: None,
    wait_sample: Some(8),
    refresh: Some(9),
};

const INTERNAL: CycleShape = CycleShape {
    t_states: 1,
    pins: &[edge(1, Rfsh, High)],
    data_sample: None,
    data_drive: None,
    data_release: None,
    wait_sample: None,
    refresh: None,
};

impl CycleKind {
    /// The immutable timing table for this kind.
    #[must_use]
    pub const fn shape(self) -> &'static CycleShape {
        match self {
            Self::OpcodeFetch => &OPCODE_FETCH,
            Self::MemoryRead => &MEMORY_READ,
            Self::MemoryWrite => &MEMORY_WRITE,
            Self::IoRead => &IO_READ,
            Self::IoWrite => &IO_WRITE,
            Self::InterruptAcknowledge => &INTERRUPT_ACKNOWLEDGE,
            Self::Internal => &INTERNAL,
        }
    }
}

/// Where the address for a machine cycle comes from. The sequencer places
/// it at half 1 through the bus router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressSource {
    /// Leave the address pins alone.
    None,
    /// PC, then PC+1.
    Pc,
    /// PC, unchanged.
    PcHold,
    /// SP-1, stored back to SP first.
    SpDecrement,
    /// SP, then SP+1.
    SpIncrement,
    /// WZ.
    Wz,
    /// The handler puts the address out itself at half 1.
    Router,
}

/// One machine cycle of an instruction template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineCycle {
    pub kind: CycleKind,
    pub t_states: u8,
    pub address: AddressSource,
}

impl MachineCycle {
    #[must_use]
    pub const fn fetch(t_states: u8) -> Self {
        Self {
            kind: CycleKind::OpcodeFetch,
            t_states,
            address: AddressSource::Pc,
        }
    }

    #[must_use]
    pub const fn read(address: AddressSource) -> Self {
        Self {
            kind: CycleKind::MemoryRead,
            t_states: 3,
            address,
        }
    }

    #[must_use]
    pub const fn write(address: AddressSource) -> Self {
        Self {
            kind: CycleKind::MemoryWrite,
            t_states: 3,
            address,
        }
    }

    #[must_use]
    pub const fn io_read(address: AddressSource) -> Self {
        Self {
            kind: CycleKind::IoRead,
            t_states: 4,
            address,
        }
    }

    #[must_use]
    pub const fn io_write(address: AddressSource) -> Self {
        Self {
            kind: CycleKind::IoWrite,
            t_states: 4,
            address,
        }
    }

    #[must_use]
    pub const fn internal(t_states: u8) -> Self {
        Self {
            kind: CycleKind::Internal,
            t_states,
            address: AddressSource::None,
        }
    }

    #[must_use]
    pub const fn acknowledge(t_states: u8) -> Self {
        Self {
            kind: CycleKind::InterruptAcknowledge,
            t_states,
            address: AddressSource::PcHold,
        }
    }

    /// Same cycle with a different length.
    #[must_use]
    pub const fn lasting(self, t_states: u8) -> Self {
        Self { t_states, ..self }
    }

    /// Same cycle with a different address source.
    #[must_use]
    pub const fn addressed(self, address: AddressSource) -> Self {
        Self { address, ..self }
    }

    #[must_use]
    pub const fn half_ticks(self) -> u8 {
        self.t_states * 2
    }

    /// Half of the rising edge of the last clock period.
    #[must_use]
    pub const fn sampling_half(self) -> u8 {
        self.t_states * 2 - 1
    }
}

/// The machine cycles of one instruction.
///
/// `alternate`, when present, is the complete cycle list used instead of
/// `normal` once a handler selects it. The two lists share a common prefix;
/// a handler must select before the cycle at which they diverge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub normal: &'static [MachineCycle],
    pub alternate: Option<&'static [MachineCycle]>,
}

impl Template {
    #[must_use]
    pub const fn fixed(normal: &'static [MachineCycle]) -> Self {
        Self {
            normal,
            alternate: None,
        }
    }

    #[must_use]
    pub const fn with_alternate(
        normal: &'static [MachineCycle],
        alternate: &'static [MachineCycle],
    ) -> Self {
        Self {
            normal,
            alternate: Some(alternate),
        }
    }

    /// The cycle list in force.
    #[must_use]
    pub fn cycles(&self, alternate: bool) -> &'static [MachineCycle] {
        match (alternate, self.alternate) {
            (true, Some(alt)) => alt,
            _ => self.normal,
        }
    }

    /// T-states of the normal timing.
    #[must_use]
    pub fn t_states(&self) -> u32 {
        sum_t_states(self.normal)
    }

    /// T-states of the alternate timing, if any.
    #[must_use]
    pub fn alternate_t_states(&self) -> Option<u32> {
        self.alternate.map(sum_t_states)
    }
}

fn sum_t_states(cycles: &[MachineCycle]) -> u32 {
    cycles.iter().map(|c| u32::from(c.t_states)).sum()
}

/// Position of the current tick inside the active instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinate {
    /// 1-based machine cycle since the instruction's opcode fetch began.
    pub machine_cycle: u8,
    /// 1-based half-T-state within that machine cycle.
    pub half_t: u8,
}

impl Coordinate {
    #[must_use]
    pub const fn new(machine_cycle: u8, half_t: u8) -> Self {
        Self {
            machine_cycle,
            half_t,
        }
    }

    /// 1-based T-state within the machine cycle.
    #[must_use]
    pub const fn t_state(self) -> u8 {
        self.half_t.div_ceil(2)
    }

    #[must_use]
    pub const fn is_rising_edge(self) -> bool {
        self.half_t % 2 == 1
    }
}
