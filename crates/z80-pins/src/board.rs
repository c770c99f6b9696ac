//! A CPU wired to an `emu_core::Bus`.
//!
//! `Board` keeps its own handle on the CPU's pins and, after every half
//! period, answers whatever transaction the control outputs describe:
//!
//! - MREQ+RD: drive the memory byte onto the data pins
//! - MREQ+WR (falling edge of WR): write the data pins to memory
//! - IORQ+RD / IORQ+WR: the same against the I/O space
//! - M1+IORQ: drive the interrupt vector byte
//!
//! The data pins are released as soon as no read is in progress.

use emu_core::{Bus, Tickable, Ticks};

use crate::config::Z80Config;
use crate::cpu::Z80;
use crate::error::BusConflict;
use crate::pins::{PinBank, WiredPins};
use crate::signal::{Driver, InputPin, Level, OutputPin};

/// Half periods `run_until_halt` allows one instruction, wait states
/// included.
pub const STALL_LIMIT: Ticks = Ticks::from_periods(1024);

/// What the board is currently answering on the data pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Response {
    Idle,
    Memory,
    Port,
    Vector,
}

pub struct Board<B: Bus> {
    cpu: Z80<WiredPins>,
    pins: WiredPins,
    bus: B,
    /// Byte supplied during interrupt acknowledge.
    interrupt_vector: u8,
    response: Response,
    write_strobe: bool,
    conflict: Option<BusConflict>,
}

impl<B: Bus> Board<B> {
    #[must_use]
    pub fn new(bus: B) -> Self {
        Self::with_config(bus, Z80Config::default())
    }

    #[must_use]
    pub fn with_config(bus: B, config: Z80Config) -> Self {
        let pins = WiredPins::new();
        Self {
            cpu: Z80::with_config(pins.clone(), config),
            pins,
            bus,
            interrupt_vector: 0xFF,
            response: Response::Idle,
            write_strobe: false,
            conflict: None,
        }
    }

    #[must_use]
    pub fn cpu(&self) -> &Z80<WiredPins> {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Z80<WiredPins> {
        &mut self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// The host's handle on the pins.
    #[must_use]
    pub fn pins(&self) -> &WiredPins {
        &self.pins
    }

    pub fn set_input(&mut self, pin: InputPin, level: Level) {
        self.pins.board_mut().set_input(pin, level);
    }

    /// Byte put on the data bus when the CPU acknowledges INT.
    pub fn set_interrupt_vector(&mut self, vector: u8) {
        self.interrupt_vector = vector;
    }

    /// A drive the board could not make because the CPU held the data bus.
    #[must_use]
    pub fn conflict(&self) -> Option<BusConflict> {
        self.conflict
    }

    /// One half clock period, then service the pins.
    pub fn tick(&mut self) {
        self.cpu.advance_half_t_state();
        self.service();
    }

    /// Run until an instruction completes, prefixes included. Returns the
    /// T-states taken; wait states count.
    ///
    /// Does not return while RESET, BUSREQ or WAIT is held LOW, since no
    /// instruction completes. `step_within` is the bounded form.
    pub fn step(&mut self) -> u32 {
        let taken = self.tick_until(|board| board.cpu.instruction_complete());
        taken.periods() as u32
    }

    /// As `step`, giving up after `limit` half periods. `None` if no
    /// instruction completed in time.
    pub fn step_within(&mut self, limit: Ticks) -> Option<u32> {
        let mut taken = Ticks::ZERO;
        while taken < limit {
            self.tick();
            taken += Ticks::new(1);
            if self.cpu.instruction_complete() {
                return Some(taken.periods() as u32);
            }
        }
        None
    }

    /// Step until the CPU halts or `limit` instructions have run. True if
    /// it halted. A CPU stalled on RESET, BUSREQ or WAIT for longer than
    /// `STALL_LIMIT` counts as not halted.
    pub fn run_until_halt(&mut self, limit: u64) -> bool {
        for _ in 0..limit {
            if self.cpu.control().halted {
                return true;
            }
            if self.step_within(STALL_LIMIT).is_none() {
                return false;
            }
        }
        self.cpu.control().halted
    }

    fn service(&mut self) {
        let mut board = self.pins.board_mut();
        let m1 = board.asserted(OutputPin::M1);
        let mreq = board.asserted(OutputPin::Mreq);
        let iorq = board.asserted(OutputPin::Iorq);
        let rd = board.asserted(OutputPin::Rd);
        let wr = board.asserted(OutputPin::Wr);
        let address = board.address();

        let wanted = match (m1 && iorq, rd && mreq, rd && iorq) {
            (true, _, _) => Response::Vector,
            (_, true, _) => Response::Memory,
            (_, _, true) => Response::Port,
            _ => Response::Idle,
        };

        if wanted != self.response {
            board.release_data(Driver::External);
            self.response = wanted;
            let value = match (wanted, address) {
                (Response::Vector, _) => Some(self.interrupt_vector),
                (Response::Memory, Some(address)) => Some(self.bus.read(address)),
                (Response::Port, Some(address)) => Some(self.bus.io_read(address)),
                _ => None,
            };
            if let Some(value) = value {
                if let Err(conflict) = board.drive_data(Driver::External, value) {
                    self.conflict = Some(conflict);
                }
            }
        }

        if wr && !self.write_strobe {
            if let (Some(address), Some(value)) = (address, board.data()) {
                if mreq {
                    self.bus.write(address, value);
                } else if iorq {
                    self.bus.io_write(address, value);
                }
            }
        }
        self.write_strobe = wr;
    }
}

impl<B: Bus> Tickable for Board<B> {
    fn tick(&mut self) {
        Board::tick(self);
    }
}
