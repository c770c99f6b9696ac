//! Pin-level Z80 CPU model.
//!
//! Each call to `Z80::advance_half_t_state()` advances exactly one half
//! clock period. All interaction with the outside world goes through the
//! CPU's pins: memory and I/O devices watch MREQ/IORQ/RD/WR/M1 and drive the
//! data bus, interrupt and DMA masters pull the input lines.

mod board;
mod config;
mod control;
mod cpu;
mod datapath;
mod error;
mod flags;
mod instructions;
mod pins;
mod registers;
mod router;
mod signal;
mod timing;
mod trace;

pub use board::{Board, STALL_LIMIT};
pub use config::{ConflictPolicy, Z80Config};
pub use control::ControlState;
pub use cpu::Z80;
pub use error::{BusConflict, Fault, TimingViolation};
pub use flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
pub use pins::{PinBank, PinBoard, WiredPins};
pub use registers::Registers;
pub use signal::{BusConnector, BusName, Driver, InputPin, Level, OutputPin};
pub use timing::{AddressSource, Coordinate, CycleKind, CycleShape, MachineCycle, PinEdge, Template};
pub use trace::{MicroInstruction, MicroKind, TraceSink};
