//! Pin capability interface injected into the CPU.
//!
//! The CPU never owns its environment. It is handed a `PinBank` at
//! construction and only ever talks to the outside world through it:
//!
//! - `PinBoard` is a plain owned bank. Tests poke inputs and read outputs
//!   directly through `Z80::pins_mut()`.
//! - `WiredPins` is a shared handle onto a `PinBoard`, so a host can keep
//!   its own handle and service bus transactions while the CPU runs.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::error::BusConflict;
use crate::signal::{BusConnector, BusName, Driver, InputPin, Level, OutputPin};

/// Everything the CPU can see and drive.
pub trait PinBank {
    /// Current level of an input pin.
    fn input(&self, pin: InputPin) -> Level;

    /// Set an input pin. Host side only; the CPU never calls this.
    fn set_input(&mut self, pin: InputPin, level: Level);

    /// Current level of an output pin.
    fn output(&self, pin: OutputPin) -> Level;

    /// Set an output pin. CPU side only.
    fn set_output(&mut self, pin: OutputPin, level: Level);

    /// Value on the address bus, `None` while released.
    fn address(&self) -> Option<u16>;

    /// Value on the data bus, `None` while released.
    fn data(&self) -> Option<u8>;

    fn address_driver(&self) -> Option<Driver>;

    fn data_driver(&self) -> Option<Driver>;

    fn drive_address(&mut self, driver: Driver, value: u16) -> Result<(), BusConflict>;

    fn drive_data(&mut self, driver: Driver, value: u8) -> Result<(), BusConflict>;

    fn release_address(&mut self, driver: Driver);

    fn release_data(&mut self, driver: Driver);
}

/// An owned set of pins.
///
/// Inputs start inactive (HIGH), outputs start inactive (HIGH), both buses
/// start released.
#[derive(Debug, Clone)]
pub struct PinBoard {
    inputs: [Level; 5],
    outputs: [Level; 8],
    address: BusConnector<u16>,
    data: BusConnector<u8>,
}

impl PinBoard {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inputs: [Level::High; 5],
            outputs: [Level::High; 8],
            address: BusConnector::new(BusName::Address),
            data: BusConnector::new(BusName::Data),
        }
    }

    /// True if the active-low output is asserted.
    #[must_use]
    pub fn asserted(&self, pin: OutputPin) -> bool {
        self.output(pin).is_low()
    }
}

impl Default for PinBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl PinBank for PinBoard {
    fn input(&self, pin: InputPin) -> Level {
        self.inputs[pin.index()]
    }

    fn set_input(&mut self, pin: InputPin, level: Level) {
        self.inputs[pin.index()] = level;
    }

    fn output(&self, pin: OutputPin) -> Level {
        self.outputs[pin.index()]
    }

    fn set_output(&mut self, pin: OutputPin, level: Level) {
        self.outputs[pin.index()] = level;
    }

    fn address(&self) -> Option<u16> {
        self.address.value()
    }

    fn data(&self) -> Option<u8> {
        self.data.value()
    }

    fn address_driver(&self) -> Option<Driver> {
        self.address.driver()
    }

    fn data_driver(&self) -> Option<Driver> {
        self.data.driver()
    }

    fn drive_address(&mut self, driver: Driver, value: u16) -> Result<(), BusConflict> {
        self.address.drive(driver, value)
    }

    fn drive_data(&mut self, driver: Driver, value: u8) -> Result<(), BusConflict> {
        self.data.drive(driver, value)
    }

    fn release_address(&mut self, driver: Driver) {
        self.address.release(driver);
    }

    fn release_data(&mut self, driver: Driver) {
        self.data.release(driver);
    }
}

/// A shared handle onto a `PinBoard`.
///
/// Clones refer to the same board. Single-threaded only.
#[derive(Debug, Clone, Default)]
pub struct WiredPins(Rc<RefCell<PinBoard>>);

impl WiredPins {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the board for reading.
    #[must_use]
    pub fn board(&self) -> Ref<'_, PinBoard> {
        self.0.borrow()
    }

    /// Borrow the board for writing.
    #[must_use]
    pub fn board_mut(&self) -> RefMut<'_, PinBoard> {
        self.0.borrow_mut()
    }
}

impl PinBank for WiredPins {
    fn input(&self, pin: InputPin) -> Level {
        self.0.borrow().input(pin)
    }

    fn set_input(&mut self, pin: InputPin, level: Level) {
        self.0.borrow_mut().set_input(pin, level);
    }

    fn output(&self, pin: OutputPin) -> Level {
        self.0.borrow().output(pin)
    }

    fn set_output(&mut self, pin: OutputPin, level: Level) {
        self.0.borrow_mut().set_output(pin, level);
    }

    fn address(&self) -> Option<u16> {
        self.0.borrow().address()
    }

    fn data(&self) -> Option<u8> {
        self.0.borrow().data()
    }

    fn address_driver(&self) -> Option<Driver> {
        self.0.borrow().address_driver()
    }

    fn data_driver(&self) -> Option<Driver> {
        self.0.borrow().data_driver()
    }

    fn drive_address(&mut self, driver: Driver, value: u16) -> Result<(), BusConflict> {
        self.0.borrow_mut().drive_address(driver, value)
    }

    fn drive_data(&mut self, driver: Driver, value: u8) -> Result<(), BusConflict> {
        self.0.borrow_mut().drive_data(driver, value)
    }

    fn release_address(&mut self, driver: Driver) {
        self.0.borrow_mut().release_address(driver);
    }

    fn release_data(&mut self, driver: Driver) {
        self.0.borrow_mut().release_data(driver);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_board_is_idle() {
        let board = PinBoard::new();
        for pin in OutputPin::ALL {
            assert_eq!(board.output(pin), Level::High, "{}", pin.name());
        }
        for pin in InputPin::ALL {
            assert_eq!(board.input(pin), Level::High);
        }
        assert_eq!(board.address(), None);
        assert_eq!(board.data(), None);
    }

    #[test]
    fn wired_handles_share_one_board() {
        let mut cpu_side = WiredPins::new();
        let host_side = cpu_side.clone();

        cpu_side.set_output(OutputPin::Mreq, Level::Low);
        cpu_side.drive_address(Driver::Cpu, 0xBEEF).unwrap();

        assert!(host_side.board().asserted(OutputPin::Mreq));
        assert_eq!(host_side.board().address(), Some(0xBEEF));

        host_side.board_mut().set_input(InputPin::Int, Level::Low);
        assert_eq!(cpu_side.input(InputPin::Int), Level::Low);
    }

    #[test]
    fn wired_handles_report_conflicts() {
        let mut cpu_side = WiredPins::new();
        let host_side = cpu_side.clone();
        host_side.board_mut().drive_data(Driver::External, 0x3E).unwrap();
        assert!(cpu_side.drive_data(Driver::Cpu, 0x00).is_err());
    }
}
