//! Optional stream of micro-operations for debugging and test assertions.
//!
//! Attaching a sink never changes what the CPU does.

use crate::signal::{Level, OutputPin};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MicroKind {
    /// An output pin changed level. `value` is 0 for LOW, 1 for HIGH.
    PinChanged,
    /// The CPU put `value` on the address pins.
    AddressDriven,
    /// The CPU put `value` on the data pins.
    DataDriven,
    AddressReleased,
    DataReleased,
    HaltEntered,
    HaltExited,
    /// `value` bit 0 is IFF1, bit 1 is IFF2.
    InterruptEnableChanged,
    /// `value` is the new mode.
    InterruptModeChanged,
    NmiAccepted,
    /// `value` is the interrupt mode in force.
    InterruptAccepted,
    DmaEntered,
    DmaExited,
    Reset,
    /// `value` is the opcode.
    UnsupportedOpcode,
    BusConflict,
}

/// One traced event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MicroInstruction {
    pub kind: MicroKind,
    pub pin: Option<OutputPin>,
    pub value: Option<u16>,
}

impl MicroInstruction {
    #[must_use]
    pub const fn new(kind: MicroKind) -> Self {
        Self {
            kind,
            pin: None,
            value: None,
        }
    }

    #[must_use]
    pub const fn with_value(kind: MicroKind, value: u16) -> Self {
        Self {
            kind,
            pin: None,
            value: Some(value),
        }
    }

    #[must_use]
    pub const fn pin_changed(pin: OutputPin, level: Level) -> Self {
        Self {
            kind: MicroKind::PinChanged,
            pin: Some(pin),
            value: Some(level.is_high() as u16),
        }
    }
}

/// Receiver for trace events.
pub trait TraceSink {
    fn record(&mut self, event: &MicroInstruction);
}

impl<F: FnMut(&MicroInstruction)> TraceSink for F {
    fn record(&mut self, event: &MicroInstruction) {
        self(event);
    }
}
