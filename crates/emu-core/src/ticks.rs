//! Clock edge counter.

/// A count of clock edges.
///
/// Components clocked on both edges count half periods, so a full clock
/// period is two ticks. `periods()` rounds down to whole periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ticks(pub u64);

impl Ticks {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    /// Ticks covering `periods` whole clock periods.
    #[must_use]
    pub const fn from_periods(periods: u64) -> Self {
        Self(periods * 2)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Whole clock periods, a trailing half period dropped.
    #[must_use]
    pub const fn periods(self) -> u64 {
        self.0 / 2
    }
}

impl core::ops::AddAssign for Ticks {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl core::ops::Sub for Ticks {
    type Output = Self;

    /// Elapsed ticks; saturates at zero.
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}
