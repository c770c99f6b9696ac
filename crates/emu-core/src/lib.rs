//! Core traits and types for cycle-accurate emulation.
//!
//! Components advance in response to explicit clock calls. Nothing runs on
//! its own, and nothing observes state except through these traits.

mod bus;
mod cpu;
mod observable;
mod tickable;
mod ticks;

pub use bus::{Bus, SimpleBus};
pub use cpu::Cpu;
pub use observable::{Observable, Value};
pub use tickable::Tickable;
pub use ticks::Ticks;
