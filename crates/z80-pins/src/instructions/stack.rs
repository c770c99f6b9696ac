//! Calls, returns, restarts and the interrupt responses that push PC.

use super::{Instruction, M1, POP, PUSH, READ_PC, entry};
use crate::datapath::Core;
use crate::router::{Dest, Reg8, Reg16, Source};
use crate::timing::{AddressSource, Coordinate, MachineCycle};

const M1_LONG: MachineCycle = MachineCycle::fetch(5);
const NMI_M1: MachineCycle = M1_LONG.addressed(AddressSource::PcHold);
const READ_PC_LONG: MachineCycle = READ_PC.lasting(4);
const ACKNOWLEDGE: MachineCycle = MachineCycle::acknowledge(7);
const READ_VECTOR: MachineCycle = MachineCycle::read(AddressSource::Router);

pub(super) const CALL: Instruction =
    entry("CALL nn", &[M1, READ_PC, READ_PC_LONG, PUSH, PUSH], call);
pub(super) const RET: Instruction = entry("RET", &[M1, POP, POP], ret);
pub(super) const RST: Instruction = entry("RST p", &[M1_LONG, PUSH, PUSH], rst);

/// NMI response: an opcode fetch whose byte is ignored, then PC is pushed
/// and execution continues at 0x0066.
pub(crate) const NMI_ACKNOWLEDGE: Instruction =
    entry("NMI", &[NMI_M1, PUSH, PUSH], nmi_acknowledge);

/// Mode 0: the byte on the data bus is taken as an RST.
pub(crate) const IM0_ACKNOWLEDGE: Instruction =
    entry("INT IM 0", &[ACKNOWLEDGE, PUSH, PUSH], im0_acknowledge);

/// Mode 1: RST 38h whatever is on the data bus.
pub(crate) const IM1_ACKNOWLEDGE: Instruction =
    entry("INT IM 1", &[ACKNOWLEDGE, PUSH, PUSH], im1_acknowledge);

/// Mode 2: the new PC is read from I:vector.
pub(crate) const IM2_ACKNOWLEDGE: Instruction = entry(
    "INT IM 2",
    &[ACKNOWLEDGE, PUSH, PUSH, READ_VECTOR, READ_VECTOR],
    im2_acknowledge,
);

/// Push PC over machine cycles 2 and 3, high byte first.
fn push_pc(core: &mut Core, at: Coordinate, first: u8) {
    if at.half_t != 1 {
        return;
    }
    if at.machine_cycle == first {
        core.sample_from(Source::High(Reg16::Pc));
    } else if at.machine_cycle == first + 1 {
        core.sample_from(Source::Low(Reg16::Pc));
    }
}

/// Jump to a page-zero restart address after the push.
fn restart(core: &mut Core, at: Coordinate, vector: u8) {
    if (at.machine_cycle, at.half_t) == (3, 6) {
        core.regs.wz = u16::from(vector);
        core.sample_from(Reg16::Wz);
        core.send_to(Reg16::Pc);
    }
}

fn call(core: &mut Core, at: Coordinate) {
    match (at.machine_cycle, at.half_t) {
        (2, 6) => core.send_to(Reg8::Z),
        (3, 6) => core.send_to(Reg8::W),
        (5, 6) => {
            core.sample_from(Reg16::Wz);
            core.send_to(Reg16::Pc);
        }
        _ => push_pc(core, at, 4),
    }
}

fn ret(core: &mut Core, at: Coordinate) {
    match (at.machine_cycle, at.half_t) {
        (2, 6) => core.send_to(Reg8::Z),
        (3, 6) => {
            core.send_to(Reg8::W);
            core.sample_from(Reg16::Wz);
            core.send_to(Reg16::Pc);
        }
        _ => {}
    }
}

fn rst(core: &mut Core, at: Coordinate) {
    let vector = core.opcode & 0x38;
    push_pc(core, at, 2);
    restart(core, at, vector);
}

fn nmi_acknowledge(core: &mut Core, at: Coordinate) {
    push_pc(core, at, 2);
    restart(core, at, 0x66);
}

fn im0_acknowledge(core: &mut Core, at: Coordinate) {
    if (at.machine_cycle, at.half_t) == (1, 9) {
        core.send_to(Reg8::Z);
    }
    let vector = core.regs.z() & 0x38;
    push_pc(core, at, 2);
    restart(core, at, vector);
}

fn im1_acknowledge(core: &mut Core, at: Coordinate) {
    push_pc(core, at, 2);
    restart(core, at, 0x38);
}

fn im2_acknowledge(core: &mut Core, at: Coordinate) {
    match (at.machine_cycle, at.half_t) {
        (1, 9) => {
            core.send_to(Reg8::Z);
            core.sample_from(Reg8::I);
            core.send_to(Reg8::W);
        }
        (4, 1) => {
            core.sample_from(Reg16::Wz);
            core.send_to(Dest::AddressPins);
        }
        (4, 6) => core.send_to(Reg8::Z),
        (5, 1) => {
            core.step_address_bus(1);
            core.send_to(Dest::AddressPins);
        }
        (5, 6) => {
            core.send_to(Reg8::W);
            core.sample_from(Reg16::Wz);
            core.send_to(Reg16::Pc);
        }
        _ => push_pc(core, at, 2),
    }
}
