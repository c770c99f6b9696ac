//! Fault taxonomy for the core.
//!
//! Nothing here is retried: the model is deterministic, so every fault is
//! either a caller-input problem (an opcode the catalog does not carry) or
//! a broken internal invariant.

use thiserror::Error;

use crate::signal::{BusName, Driver};

/// Two drivers tried to hold the same bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("{contender:?} drove the {bus} while {holder:?} held it")]
pub struct BusConflict {
    pub bus: BusName,
    pub holder: Driver,
    pub contender: Driver,
}

/// A coordinate fell outside the active instruction template.
///
/// Only a malformed template can produce this, so the sequencer treats it
/// as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error(
    "coordinate M{machine_cycle}/h{half_t} is outside a template of {cycles} machine cycles"
)]
pub struct TimingViolation {
    pub machine_cycle: u8,
    pub half_t: u8,
    pub cycles: usize,
}

/// Recoverable faults reported through `Z80::last_fault`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Fault {
    /// The opcode has no entry in the instruction catalog. It ran as a
    /// 4-T-state no-op.
    #[error("unsupported opcode {opcode:#04X} (prefix {prefix:?}) at {pc:#06X}")]
    UnsupportedOpcode {
        prefix: Option<u8>,
        opcode: u8,
        pc: u16,
    },
    /// A drive was refused because another driver held the bus.
    #[error(transparent)]
    BusConflict(#[from] BusConflict),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_values() {
        let fault = Fault::UnsupportedOpcode {
            prefix: Some(0xCB),
            opcode: 0x07,
            pc: 0x1234,
        };
        assert_eq!(
            fault.to_string(),
            "unsupported opcode 0x07 (prefix Some(203)) at 0x1234"
        );

        let violation = TimingViolation {
            machine_cycle: 4,
            half_t: 1,
            cycles: 3,
        };
        assert_eq!(
            violation.to_string(),
            "coordinate M4/h1 is outside a template of 3 machine cycles"
        );
    }

    #[test]
    fn bus_conflict_converts_into_fault() {
        let conflict = BusConflict {
            bus: BusName::Data,
            holder: Driver::External,
            contender: Driver::Cpu,
        };
        let fault: Fault = conflict.into();
        assert_eq!(fault.to_string(), "Cpu drove the data bus while External held it");
    }
}
