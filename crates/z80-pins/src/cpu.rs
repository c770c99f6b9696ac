//! Z80 machine-cycle sequencer, stepped one half clock period at a time.

use std::mem;

use emu_core::{Cpu, Observable, Tickable, Ticks, Value};

use crate::config::{ConflictPolicy, Z80Config};
use crate::control::{ControlState, Service};
use crate::datapath::Core;
use crate::error::{BusConflict, Fault, TimingViolation};
use crate::flags::{CF, HF, NF, PF, SF, XF, YF, ZF};
use crate::instructions::{
    self, FETCH, HALT_LOOP, IM0_ACKNOWLEDGE, IM1_ACKNOWLEDGE, IM2_ACKNOWLEDGE, Instruction,
    NMI_ACKNOWLEDGE, Prefix, UNSUPPORTED,
};
use crate::pins::PinBank;
use crate::registers::Registers;
use crate::router::{Dest, Reg16, Source};
use crate::signal::{Driver, InputPin, Level, OutputPin};
use crate::timing::{AddressSource, Coordinate, MachineCycle};
use crate::trace::{MicroInstruction, MicroKind, TraceSink};

/// Z80 CPU.
///
/// The CPU owns a `PinBank` and nothing else of its environment. Every call
/// to [`Z80::advance_half_t_state`] is one half period of CLK: odd halves of
/// a machine cycle are rising edges, even halves falling edges. Memory and
/// I/O devices answer by watching the control outputs and driving the data
/// pins between calls.
pub struct Z80<P: PinBank> {
    core: Core,
    pins: P,
    config: Z80Config,

    // === Sequencer position ===
    /// Instruction (or interrupt response) being stepped through.
    active: Instruction,
    /// True while `active` is the fetch placeholder awaiting decode.
    decoding: bool,
    /// 0-based index into the active cycle list.
    cycle_index: usize,
    /// 1-based half within the current machine cycle; 0 before the first.
    half: u8,
    /// Half periods left in the wait state being inserted.
    wait_halves: u8,
    /// Consecutive half periods RESET has been LOW.
    reset_halves: u16,

    // === Bookkeeping ===
    complete: bool,
    instruction_count: u64,
    half_ticks: Ticks,
    trace: Option<Box<dyn TraceSink>>,
}

impl<P: PinBank> Z80<P> {
    /// A CPU in the reset state, wired to `pins`.
    #[must_use]
    pub fn new(pins: P) -> Self {
        Self::with_config(pins, Z80Config::default())
    }

    #[must_use]
    pub fn with_config(pins: P, config: Z80Config) -> Self {
        let mut cpu = Self {
            core: Core::default(),
            pins,
            config,
            active: FETCH,
            decoding: true,
            cycle_index: 0,
            half: 0,
            wait_halves: 0,
            reset_halves: 0,
            complete: false,
            instruction_count: 0,
            half_ticks: Ticks::ZERO,
            trace: None,
        };
        cpu.apply_reset();
        let nmi = cpu.pins.input(InputPin::Nmi);
        cpu.core.control.settle_nmi(nmi);
        cpu.core.events.clear();
        cpu
    }

    /// Advance by one half clock period.
    pub fn advance_half_t_state(&mut self) {
        self.half_ticks += Ticks::new(1);
        self.complete = false;
        self.core.control.watch_nmi(self.pins.input(InputPin::Nmi));
        self.core.router.latch_data_pins(self.pins.data());

        // RESET preempts everything.
        if !self.reset_held() {
            if self.core.control.bus_released {
                self.poll_bus_return();
            } else if self.wait_halves > 0 {
                self.stretch_wait();
            } else if self.advance_coordinate() {
                self.run_half();
            }
        }

        self.mirror_status_pins();
        self.publish();
    }

    // === Public accessors ===

    #[must_use]
    pub fn pins(&self) -> &P {
        &self.pins
    }

    pub fn pins_mut(&mut self) -> &mut P {
        &mut self.pins
    }

    #[must_use]
    pub fn registers(&self) -> Registers {
        self.core.regs
    }

    pub fn set_registers(&mut self, regs: Registers) {
        self.core.regs = regs;
    }

    #[must_use]
    pub fn control(&self) -> ControlState {
        self.core.control.snapshot()
    }

    #[must_use]
    pub fn config(&self) -> Z80Config {
        self.config
    }

    /// Position inside the active instruction.
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.cycle_index as u8 + 1, self.half)
    }

    /// Mnemonic of the instruction being executed.
    #[must_use]
    pub fn mnemonic(&self) -> &'static str {
        self.active.mnemonic
    }

    /// True if the last half period finished an instruction. Prefix bytes
    /// on their own do not count.
    #[must_use]
    pub fn instruction_complete(&self) -> bool {
        self.complete
    }

    /// Instructions completed, interrupt responses and halt-loop cycles
    /// included.
    #[must_use]
    pub fn instruction_count(&self) -> u64 {
        self.instruction_count
    }

    /// Half clock periods since construction.
    #[must_use]
    pub fn half_ticks(&self) -> Ticks {
        self.half_ticks
    }

    #[must_use]
    pub fn last_fault(&self) -> Option<Fault> {
        self.core.fault
    }

    /// How many opcodes ran as unsupported no-ops.
    #[must_use]
    pub fn unsupported_opcodes(&self) -> u64 {
        self.core.unsupported_count
    }

    /// Send every micro-operation to `sink` from now on.
    pub fn attach_trace(&mut self, sink: impl TraceSink + 'static) {
        self.trace = Some(Box::new(sink));
    }

    pub fn detach_trace(&mut self) -> Option<Box<dyn TraceSink>> {
        self.trace.take()
    }

    /// Apply the reset state immediately, as if RESET had been held.
    pub fn reset(&mut self) {
        self.apply_reset();
        self.publish();
    }

    // === Sequencer steps ===

    /// Count RESET; true while the CPU is held in reset.
    fn reset_held(&mut self) -> bool {
        if self.pins.input(InputPin::Reset).is_high() {
            self.reset_halves = 0;
            return false;
        }
        self.reset_halves = self.reset_halves.saturating_add(1);
        let needed = self.config.reset_hold_halves();
        if self.reset_halves < needed {
            return false;
        }
        if self.reset_halves == needed {
            self.apply_reset();
        }
        // NMI edges while held are lost.
        let nmi = self.pins.input(InputPin::Nmi);
        self.core.control.settle_nmi(nmi);
        true
    }

    fn apply_reset(&mut self) {
        let regs = &mut self.core.regs;
        regs.set_af(0xFFFF);
        regs.sp = 0xFFFF;
        regs.pc = 0;
        regs.i = 0;
        regs.r = 0;

        self.core.control.reset();
        self.core.router.clear();
        self.core.opcode = 0;
        self.core.prefix = Prefix::None;
        self.core.next_prefix = Prefix::None;
        self.core.alternate = false;

        self.release_address();
        self.release_data();
        for pin in OutputPin::ALL {
            self.set_pin(pin, Level::High);
        }

        self.active = FETCH;
        self.decoding = true;
        self.cycle_index = 0;
        self.half = 0;
        self.wait_halves = 0;
        self.core.emit(MicroInstruction::new(MicroKind::Reset));
    }

    fn poll_bus_return(&mut self) {
        if self.pins.input(InputPin::Busreq).is_high() {
            self.core.control.bus_released = false;
            self.core.emit(MicroInstruction::new(MicroKind::DmaExited));
        }
    }

    fn grant_bus(&mut self) {
        self.core.control.busreq_pending = false;
        self.core.control.bus_released = true;
        self.release_address();
        self.release_data();
        self.core.emit(MicroInstruction::new(MicroKind::DmaEntered));
    }

    /// One half period of TW. WAIT is looked at again on its falling edge.
    fn stretch_wait(&mut self) {
        self.wait_halves -= 1;
        if self.wait_halves == 0 && self.pins.input(InputPin::Wait).is_low() {
            self.wait_halves = 2;
        }
    }

    /// Move to the next half. Returns false if the bus was handed over
    /// instead.
    fn advance_coordinate(&mut self) -> bool {
        if self.half != 0 && self.half < self.current_cycle().half_ticks() {
            self.half += 1;
            return true;
        }
        if self.core.control.busreq_pending {
            self.grant_bus();
            return false;
        }
        if self.half != 0 && !self.on_last_cycle() {
            self.cycle_index += 1;
            self.half = 1;
        } else {
            self.begin_instruction();
        }
        true
    }

    fn begin_instruction(&mut self) {
        self.cycle_index = 0;
        self.half = 1;
        self.core.alternate = false;
        self.core.control.defer_interrupts = false;

        // Nothing may cut in between a prefix and its opcode.
        let service = if self.core.next_prefix == Prefix::None {
            self.core.control.next_service()
        } else {
            Service::Fetch
        };
        self.decoding = service == Service::Fetch;
        self.active = match service {
            Service::Nmi => {
                self.core.accept_nmi();
                NMI_ACKNOWLEDGE
            }
            Service::Interrupt => {
                self.core.accept_interrupt();
                match self.core.control.im {
                    0 => IM0_ACKNOWLEDGE,
                    1 => IM1_ACKNOWLEDGE,
                    _ => IM2_ACKNOWLEDGE,
                }
            }
            Service::HaltLoop => HALT_LOOP,
            Service::Fetch => FETCH,
        };
    }

    fn run_half(&mut self) {
        let half = self.half;
        let shape = self.current_cycle().kind.shape();

        for edge in shape.pins.iter().filter(|edge| edge.half == half) {
            self.set_pin(edge.pin, edge.level);
        }
        if half == 1 {
            self.place_address(self.current_cycle().address);
        }
        if shape.data_sample == Some(half) {
            self.core.sample_from(Source::DataPins);
        }
        if shape.refresh == Some(half) {
            if self.decoding {
                self.decode();
            }
            self.core.sample_from(Reg16::Ir);
            self.core.send_to(Dest::AddressPins);
            self.core.regs.increment_r();
        }

        let at = self.coordinate();
        let handler = self.active.handler;
        let could_switch = !self.core.alternate;
        handler(&mut self.core, at);
        if could_switch && self.core.alternate {
            debug_assert!(
                self.cycle_index < self.cycles().len(),
                "{} switched timing after its templates diverged",
                self.active.mnemonic
            );
        }

        if shape.data_drive == Some(half) {
            self.core.send_to(Dest::DataPins);
        }
        self.flush_router();
        if shape.data_release == Some(half) {
            self.release_data();
        }

        if shape.wait_sample == Some(half) && self.pins.input(InputPin::Wait).is_low() {
            self.wait_halves = 2;
        }

        let cycle = self.current_cycle();
        let last = self.on_last_cycle();
        if half == cycle.sampling_half() {
            self.core.control.sample_busreq(self.pins.input(InputPin::Busreq));
            if last {
                self.core.control.sample_interrupts(self.pins.input(InputPin::Int));
            }
        }
        if last && half == cycle.half_ticks() && self.core.next_prefix == Prefix::None {
            self.complete = true;
            self.instruction_count += 1;
        }
    }

    fn place_address(&mut self, source: AddressSource) {
        let core = &mut self.core;
        match source {
            AddressSource::None | AddressSource::Router => {}
            AddressSource::Pc => {
                core.sample_from(Reg16::Pc);
                core.send_to(Dest::AddressPins);
                core.step_address_bus(1);
                core.send_to(Reg16::Pc);
            }
            AddressSource::PcHold => {
                core.sample_from(Reg16::Pc);
                core.send_to(Dest::AddressPins);
            }
            AddressSource::SpDecrement => {
                core.sample_from(Reg16::Sp);
                core.step_address_bus(-1);
                core.send_to(Reg16::Sp);
                core.send_to(Dest::AddressPins);
            }
            AddressSource::SpIncrement => {
                core.sample_from(Reg16::Sp);
                core.send_to(Dest::AddressPins);
                core.step_address_bus(1);
                core.send_to(Reg16::Sp);
            }
            AddressSource::Wz => {
                core.sample_from(Reg16::Wz);
                core.send_to(Dest::AddressPins);
            }
        }
    }

    /// Swap the fetch placeholder for the instruction the opcode selects.
    fn decode(&mut self) {
        let opcode = self.core.router.data_bus;
        self.core.opcode = opcode;
        self.core.prefix = mem::take(&mut self.core.next_prefix);
        self.decoding = false;
        self.active = match instructions::lookup(self.core.prefix, opcode) {
            Some(instruction) => instruction,
            None => {
                self.core.fault = Some(Fault::UnsupportedOpcode {
                    prefix: self.core.prefix.byte(),
                    opcode,
                    pc: self.core.regs.pc.wrapping_sub(1),
                });
                self.core.unsupported_count += 1;
                self.core.emit(MicroInstruction::with_value(
                    MicroKind::UnsupportedOpcode,
                    u16::from(opcode),
                ));
                UNSUPPORTED
            }
        };
    }

    // === Pins ===

    fn set_pin(&mut self, pin: OutputPin, level: Level) {
        if self.pins.output(pin) != level {
            self.pins.set_output(pin, level);
            self.core.emit(MicroInstruction::pin_changed(pin, level));
        }
    }

    fn mirror_status_pins(&mut self) {
        let control = self.core.control;
        self.set_pin(OutputPin::Halt, Level::active_low(control.halted));
        self.set_pin(OutputPin::Busack, Level::active_low(control.bus_released));
    }

    /// Put the router's queued sends on the pins.
    fn flush_router(&mut self) {
        if let Some(address) = self.core.router.take_address_out() {
            match self.pins.drive_address(Driver::Cpu, address) {
                Ok(()) => self
                    .core
                    .emit(MicroInstruction::with_value(MicroKind::AddressDriven, address)),
                Err(conflict) => self.bus_conflict(conflict),
            }
        }
        if let Some(data) = self.core.router.take_data_out() {
            match self.pins.drive_data(Driver::Cpu, data) {
                Ok(()) => self.core.emit(MicroInstruction::with_value(
                    MicroKind::DataDriven,
                    u16::from(data),
                )),
                Err(conflict) => self.bus_conflict(conflict),
            }
        }
    }

    fn release_address(&mut self) {
        if self.pins.address_driver() == Some(Driver::Cpu) {
            self.pins.release_address(Driver::Cpu);
            self.core.emit(MicroInstruction::new(MicroKind::AddressReleased));
        }
    }

    fn release_data(&mut self) {
        if self.pins.data_driver() == Some(Driver::Cpu) {
            self.pins.release_data(Driver::Cpu);
            self.core.emit(MicroInstruction::new(MicroKind::DataReleased));
        }
    }

    fn bus_conflict(&mut self, conflict: BusConflict) {
        self.core.emit(MicroInstruction::new(MicroKind::BusConflict));
        match self.config.conflict_policy {
            ConflictPolicy::Panic => panic!("{conflict}"),
            ConflictPolicy::Record => self.core.fault = Some(conflict.into()),
        }
    }

    // === Template access ===

    fn cycles(&self) -> &'static [MachineCycle] {
        self.active.template.cycles(self.core.alternate)
    }

    fn current_cycle(&self) -> MachineCycle {
        let cycles = self.cycles();
        match cycles.get(self.cycle_index) {
            Some(cycle) => *cycle,
            None => panic!(
                "{}: {}",
                self.active.mnemonic,
                TimingViolation {
                    machine_cycle: self.cycle_index as u8 + 1,
                    half_t: self.half,
                    cycles: cycles.len(),
                }
            ),
        }
    }

    fn on_last_cycle(&self) -> bool {
        self.cycle_index + 1 >= self.cycles().len()
    }

    fn publish(&mut self) {
        match self.trace.as_mut() {
            Some(sink) => {
                for event in self.core.events.drain(..) {
                    sink.record(&event);
                }
            }
            None => self.core.events.clear(),
        }
    }
}

impl<P: PinBank> Cpu for Z80<P> {
    type Registers = Registers;

    fn pc(&self) -> u32 {
        u32::from(self.core.regs.pc)
    }

    fn registers(&self) -> Registers {
        self.core.regs
    }

    fn is_halted(&self) -> bool {
        self.core.control.halted
    }

    fn reset(&mut self) {
        Z80::reset(self);
    }
}

impl<P: PinBank> Tickable for Z80<P> {
    fn tick(&mut self) {
        self.advance_half_t_state();
    }
}

/// All query paths supported by the Z80.
const Z80_QUERY_PATHS: &[&str] = &[
    // Registers
    "a",
    "f",
    "b",
    "c",
    "d",
    "e",
    "h",
    "l",
    "af",
    "bc",
    "de",
    "hl",
    "ix",
    "iy",
    "sp",
    "pc",
    "i",
    "r",
    "wz",
    // Flags
    "flags.s",
    "flags.z",
    "flags.y",
    "flags.h",
    "flags.x",
    "flags.p",
    "flags.n",
    "flags.c",
    // Control unit
    "iff1",
    "iff2",
    "im",
    "halted",
    "nmi_pending",
    "int_pending",
    "busreq_pending",
    "bus_released",
    // Sequencer
    "instruction",
    "opcode",
    "coordinate.machine_cycle",
    "coordinate.half_t",
    "instructions",
    "ticks",
    // Pins
    "pins.m1",
    "pins.mreq",
    "pins.iorq",
    "pins.rd",
    "pins.wr",
    "pins.rfsh",
    "pins.halt",
    "pins.busack",
    "pins.address",
    "pins.data",
];

fn level_name(level: Level) -> Value {
    match level {
        Level::Low => "low".into(),
        Level::High => "high".into(),
    }
}

impl<P: PinBank> Observable for Z80<P> {
    fn query(&self, path: &str) -> Option<Value> {
        let regs = &self.core.regs;
        let control = &self.core.control;
        match path {
            // Registers
            "a" => Some(regs.a.into()),
            "f" => Some(regs.f.into()),
            "b" => Some(regs.b.into()),
            "c" => Some(regs.c.into()),
            "d" => Some(regs.d.into()),
            "e" => Some(regs.e.into()),
            "h" => Some(regs.h.into()),
            "l" => Some(regs.l.into()),
            "af" => Some(regs.af().into()),
            "bc" => Some(regs.bc().into()),
            "de" => Some(regs.de().into()),
            "hl" => Some(regs.hl().into()),
            "ix" => Some(regs.ix.into()),
            "iy" => Some(regs.iy.into()),
            "sp" => Some(regs.sp.into()),
            "pc" => Some(regs.pc.into()),
            "i" => Some(regs.i.into()),
            "r" => Some(regs.r.into()),
            "wz" => Some(regs.wz.into()),

            // Flags
            "flags.s" => Some((regs.f & SF != 0).into()),
            "flags.z" => Some((regs.f & ZF != 0).into()),
            "flags.y" => Some((regs.f & YF != 0).into()),
            "flags.h" => Some((regs.f & HF != 0).into()),
            "flags.x" => Some((regs.f & XF != 0).into()),
            "flags.p" => Some((regs.f & PF != 0).into()),
            "flags.n" => Some((regs.f & NF != 0).into()),
            "flags.c" => Some((regs.f & CF != 0).into()),

            // Control unit
            "iff1" => Some(control.iff1.into()),
            "iff2" => Some(control.iff2.into()),
            "im" => Some(control.im.into()),
            "halted" => Some(control.halted.into()),
            "nmi_pending" => Some(control.nmi_pending.into()),
            "int_pending" => Some(control.int_pending.into()),
            "busreq_pending" => Some(control.busreq_pending.into()),
            "bus_released" => Some(control.bus_released.into()),

            // Sequencer
            "instruction" => Some(self.active.mnemonic.into()),
            "opcode" => Some(self.core.opcode.into()),
            "coordinate.machine_cycle" => Some(self.coordinate().machine_cycle.into()),
            "coordinate.half_t" => Some(self.coordinate().half_t.into()),
            "instructions" => Some(self.instruction_count.into()),
            "ticks" => Some(self.half_ticks.get().into()),

            // Pins
            "pins.m1" => Some(level_name(self.pins.output(OutputPin::M1))),
            "pins.mreq" => Some(level_name(self.pins.output(OutputPin::Mreq))),
            "pins.iorq" => Some(level_name(self.pins.output(OutputPin::Iorq))),
            "pins.rd" => Some(level_name(self.pins.output(OutputPin::Rd))),
            "pins.wr" => Some(level_name(self.pins.output(OutputPin::Wr))),
            "pins.rfsh" => Some(level_name(self.pins.output(OutputPin::Rfsh))),
            "pins.halt" => Some(level_name(self.pins.output(OutputPin::Halt))),
            "pins.busack" => Some(level_name(self.pins.output(OutputPin::Busack))),
            "pins.address" => Some(self.pins.address().map_or("released".into(), Value::from)),
            "pins.data" => Some(self.pins.data().map_or("released".into(), Value::from)),

            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        Z80_QUERY_PATHS
    }
}
