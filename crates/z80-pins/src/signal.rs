//! Two-state pins and releasable bus connectors.

use std::fmt;

use crate::error::BusConflict;

/// Logic level of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Level {
    Low,
    High,
}

impl Level {
    #[must_use]
    pub const fn is_low(self) -> bool {
        matches!(self, Self::Low)
    }

    #[must_use]
    pub const fn is_high(self) -> bool {
        matches!(self, Self::High)
    }

    /// Level of an active-low signal that is `asserted` or not.
    #[must_use]
    pub const fn active_low(asserted: bool) -> Self {
        if asserted { Self::Low } else { Self::High }
    }
}

/// Control outputs driven by the CPU. All are active low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OutputPin {
    M1,
    Mreq,
    Iorq,
    Rd,
    Wr,
    Rfsh,
    Halt,
    Busack,
}

impl OutputPin {
    pub const ALL: [Self; 8] = [
        Self::M1,
        Self::Mreq,
        Self::Iorq,
        Self::Rd,
        Self::Wr,
        Self::Rfsh,
        Self::Halt,
        Self::Busack,
    ];

    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::M1 => "M1",
            Self::Mreq => "MREQ",
            Self::Iorq => "IORQ",
            Self::Rd => "RD",
            Self::Wr => "WR",
            Self::Rfsh => "RFSH",
            Self::Halt => "HALT",
            Self::Busack => "BUSACK",
        }
    }
}

/// Control inputs sampled by the CPU. All are active low.
///
/// There is no CLK entry: every call to `Z80::advance_half_t_state` is one
/// half period of CLK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InputPin {
    Wait,
    Int,
    Nmi,
    Reset,
    Busreq,
}

impl InputPin {
    pub const ALL: [Self; 5] = [Self::Wait, Self::Int, Self::Nmi, Self::Reset, Self::Busreq];

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// Which side is putting a value on a shared bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Driver {
    /// The CPU core.
    Cpu,
    /// Anything outside the core: memory, I/O devices, a DMA master.
    External,
}

/// Name of a shared bus, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BusName {
    Address,
    Data,
}

impl fmt::Display for BusName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address => f.write_str("address bus"),
            Self::Data => f.write_str("data bus"),
        }
    }
}

/// A bus that holds a value or is released.
///
/// Release is logical only: a released connector reads as `None`, there is
/// no modelling of a high-impedance voltage. Only one driver may hold the
/// connector at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConnector<T> {
    name: BusName,
    value: Option<T>,
    driver: Option<Driver>,
}

impl<T: Copy> BusConnector<T> {
    #[must_use]
    pub const fn new(name: BusName) -> Self {
        Self {
            name,
            value: None,
            driver: None,
        }
    }

    /// The value currently on the bus, or `None` while released.
    #[must_use]
    pub const fn value(&self) -> Option<T> {
        self.value
    }

    #[must_use]
    pub const fn driver(&self) -> Option<Driver> {
        self.driver
    }

    /// Assert `value` on the bus on behalf of `driver`.
    ///
    /// Fails without touching the bus if another driver holds it. The
    /// current holder may re-drive freely.
    pub fn drive(&mut self, driver: Driver, value: T) -> Result<(), BusConflict> {
        match self.driver {
            Some(holder) if holder != driver => Err(BusConflict {
                bus: self.name,
                holder,
                contender: driver,
            }),
            _ => {
                self.driver = Some(driver);
                self.value = Some(value);
                Ok(())
            }
        }
    }

    /// Stop driving the bus. Has no effect unless `driver` holds it.
    pub fn release(&mut self, driver: Driver) {
        if self.driver == Some(driver) {
            self.driver = None;
            self.value = None;
        }
    }
}
