//! Jump group.
//!
//! | Instruction | Cycles                  | T-states |
//! |-------------|-------------------------|----------|
//! | JP nn       | M1 4, MR 3, MR 3        | 10       |
//! | JP cc,nn    | M1 4, MR 3, MR 3        | 10       |
//! | JR e        | M1 4, MR 3, internal 5  | 12       |
//! | JR cc,e     | as JR, or M1 4, MR 3    | 12 / 7   |
//! | DJNZ e      | M1 5, MR 3, internal 5  | 13 / 8   |
//! | JP (HL)     | M1 4                    | 4        |
//! | JP (IX/IY)  | prefix 4, M1 4          | 8        |

use super::{Instruction, M1, READ_PC, entry};
use crate::datapath::Core;
use crate::flags::condition;
use crate::router::{Reg8, Reg16};
use crate::timing::{Coordinate, MachineCycle, Template};

const RELATIVE: MachineCycle = MachineCycle::internal(5);
const M1_LONG: MachineCycle = MachineCycle::fetch(5);

pub(super) const JP_NN: Instruction = entry("JP nn", &[M1, READ_PC, READ_PC], jp_nn);
pub(super) const JP_CC: Instruction = entry("JP cc,nn", &[M1, READ_PC, READ_PC], jp_cc);
pub(super) const JR: Instruction = entry("JR e", &[M1, READ_PC, RELATIVE], jr);
pub(super) const JR_CC: Instruction = Instruction {
    mnemonic: "JR cc,e",
    template: Template::with_alternate(&[M1, READ_PC, RELATIVE], &[M1, READ_PC]),
    handler: jr_cc,
};
pub(super) const DJNZ: Instruction = Instruction {
    mnemonic: "DJNZ e",
    template: Template::with_alternate(&[M1_LONG, READ_PC, RELATIVE], &[M1_LONG, READ_PC]),
    handler: djnz,
};
pub(super) const JP_HL: Instruction = entry("JP (HL)", &[M1], jp_hl);
pub(super) const JP_INDEX: Instruction = entry("JP (IX)", &[M1], jp_index);

fn jp_nn(core: &mut Core, at: Coordinate) {
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

fn jp_cc(core: &mut Core, at: Coordinate) {
    match (at.machine_cycle, at.half_t) {
        (2, 6) => core.send_to(Reg8::Z),
        (3, 6) => {
            // The operand is fetched either way; only the PC load is
            // conditional.
            core.send_to(Reg8::W);
            if condition(core.regs.f, core.opcode >> 3) {
                core.sample_from(Reg16::Wz);
                core.send_to(Reg16::Pc);
            }
        }
        _ => {}
    }
}

/// The internal cycle shared by JR, JR cc and DJNZ.
fn relative(core: &mut Core, at: Coordinate) {
    match (at.machine_cycle, at.half_t) {
        (3, 2) => {
            core.sample_from(Reg16::Pc);
            core.send_to(Reg16::Wz);
        }
        (3, 6) => {
            core.sample_from_wz_plus_displacement();
            core.send_to(Reg16::Wz);
        }
        (3, 10) => {
            core.sample_from(Reg16::Wz);
            core.send_to(Reg16::Pc);
        }
        _ => {}
    }
}

fn jr(core: &mut Core, at: Coordinate) {
    relative(core, at);
}

fn jr_cc(core: &mut Core, at: Coordinate) {
    if (at.machine_cycle, at.half_t) == (1, 8) && !condition(core.regs.f, (core.opcode >> 3) & 3) {
        core.select_alternate();
    }
    relative(core, at);
}

fn djnz(core: &mut Core, at: Coordinate) {
    if (at.machine_cycle, at.half_t) == (1, 10) {
        core.regs.b = core.regs.b.wrapping_sub(1);
        if core.regs.b == 0 {
            core.select_alternate();
        }
    }
    relative(core, at);
}

fn jp_hl(core: &mut Core, at: Coordinate) {
    if (at.machine_cycle, at.half_t) == (1, 7) {
        core.sample_from(Reg16::Hl);
        core.send_to(Reg16::Pc);
    }
}

fn jp_index(core: &mut Core, at: Coordinate) {
    if (at.machine_cycle, at.half_t) == (1, 7) {
        core.sample_from(core.index_register());
        core.send_to(Reg16::Pc);
    }
}
