//! Runtime knobs for the CPU model.

/// What to do when the CPU tries to drive a bus someone else holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConflictPolicy {
    /// Abort with the conflict as the panic message.
    Panic,
    /// Skip the drive and keep the conflict as the last fault.
    Record,
}

impl Default for ConflictPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Panic
        } else {
            Self::Record
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Z80Config {
    /// T-states RESET must stay LOW before the reset state is applied.
    pub reset_hold_t_states: u8,
    pub conflict_policy: ConflictPolicy,
}

impl Z80Config {
    /// Half periods RESET must stay LOW, never less than one.
    #[must_use]
    pub(crate) fn reset_hold_halves(&self) -> u16 {
        (u16::from(self.reset_hold_t_states) * 2).max(1)
    }
}

impl Default for Z80Config {
    fn default() -> Self {
        Self {
            reset_hold_t_states: 3,
            conflict_policy: ConflictPolicy::default(),
        }
    }
}
