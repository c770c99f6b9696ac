//! Immediate and absolute loads.

use super::{Instruction, M1, READ_PC, entry};
use crate::datapath::Core;
use crate::router::{Dest, Reg8, Reg16};
use crate::timing::{AddressSource, Coordinate, MachineCycle};

const READ_WZ: MachineCycle = MachineCycle::read(AddressSource::Wz);
const WRITE_WZ: MachineCycle = MachineCycle::write(AddressSource::Wz);

pub(super) const LD_R_N: Instruction = entry("LD r,n", &[M1, READ_PC], ld_r_n);
pub(super) const LD_RR_NN: Instruction = entry("LD rr,nn", &[M1, READ_PC, READ_PC], ld_rr_nn);
pub(super) const LD_INDEX_NN: Instruction =
    entry("LD IX,nn", &[M1, READ_PC, READ_PC], ld_index_nn);
pub(super) const LD_A_MEM: Instruction =
    entry("LD A,(nn)", &[M1, READ_PC, READ_PC, READ_WZ], ld_a_mem);
pub(super) const LD_MEM_A: Instruction =
    entry("LD (nn),A", &[M1, READ_PC, READ_PC, WRITE_WZ], ld_mem_a);

/// Register encoded in bits 5-3 of the opcode. 6 is (HL) and never reaches
/// here.
fn register(code: u8) -> Reg8 {
    match code & 7 {
        0 => Reg8::B,
        1 => Reg8::C,
        2 => Reg8::D,
        3 => Reg8::E,
        4 => Reg8::H,
        5 => Reg8::L,
        _ => Reg8::A,
    }
}

/// Pair encoded in bits 5-4 of the opcode.
fn pair(code: u8) -> Reg16 {
    match code & 3 {
        0 => Reg16::Bc,
        1 => Reg16::De,
        2 => Reg16::Hl,
        _ => Reg16::Sp,
    }
}

fn ld_r_n(core: &mut Core, at: Coordinate) {
    if (at.machine_cycle, at.half_t) == (2, 6) {
        core.send_to(register(core.opcode >> 3));
    }
}

fn load_immediate_pair(core: &mut Core, at: Coordinate, target: Reg16) {
    match (at.machine_cycle, at.half_t) {
        (2, 6) => core.send_to(Dest::Low(target)),
        (3, 6) => core.send_to(Dest::High(target)),
        _ => {}
    }
}

fn ld_rr_nn(core: &mut Core, at: Coordinate) {
    let target = pair(core.opcode >> 4);
    load_immediate_pair(core, at, target);
}

fn ld_index_nn(core: &mut Core, at: Coordinate) {
    let target = core.index_register();
    load_immediate_pair(core, at, target);
}

fn ld_a_mem(core: &mut Core, at: Coordinate) {
    match (at.machine_cycle, at.half_t) {
        (2, 6) => core.send_to(Reg8::Z),
        (3, 6) => core.send_to(Reg8::W),
        (4, 6) => {
            core.send_to(Reg8::A);
            core.sample_from(Reg16::Wz);
            core.step_address_bus(1);
            core.send_to(Reg16::Wz);
        }
        _ => {}
    }
}

fn ld_mem_a(core: &mut Core, at: Coordinate) {
    match (at.machine_cycle, at.half_t) {
        (2, 6) => core.send_to(Reg8::Z),
        (3, 6) => core.send_to(Reg8::W),
        (4, 1) => core.sample_from(Reg8::A),
        (4, 6) => {
            // WZ ends up as A:(n+1).
            core.sample_from(Reg16::Wz);
            core.step_address_bus(1);
            core.send_to(Reg16::Wz);
            core.sample_from(Reg8::A);
            core.send_to(Reg8::W);
        }
        _ => {}
    }
}
