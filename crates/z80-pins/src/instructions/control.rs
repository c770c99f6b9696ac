//! CPU control group, prefix bytes and the sequencer's own fetch and halt
//! cycles.

use super::{Instruction, M1, POP, Prefix, entry, idle};
use crate::datapath::Core;
use crate::flags::{CF, HF, NF, XF, YF};
use crate::router::{Reg8, Reg16};
use crate::timing::Coordinate;

/// Opcode fetch before the decode point. Replaced at half 5 of M1 by the
/// decoded instruction.
pub(crate) const FETCH: Instruction = entry("fetch", &[M1], idle);

/// One 4-T-state cycle of the halt loop. The byte read is discarded.
pub(crate) const HALT_LOOP: Instruction = entry("halt loop", &[M1], halt_loop);

/// Stand-in for opcodes the catalog does not carry.
pub(crate) const UNSUPPORTED: Instruction = entry("unsupported", &[M1], idle);

pub(super) const NOP: Instruction = entry("NOP", &[M1], idle);
pub(super) const HALT: Instruction = entry("HALT", &[M1], halt);
pub(super) const DI: Instruction = entry("DI", &[M1], di);
pub(super) const EI: Instruction = entry("EI", &[M1], ei);
pub(super) const SCF: Instruction = entry("SCF", &[M1], scf);
pub(super) const CCF: Instruction = entry("CCF", &[M1], ccf);
pub(super) const PREFIX: Instruction = entry("prefix", &[M1], prefix);

pub(super) const ED_NOP: Instruction = entry("NOP*", &[M1], idle);
pub(super) const IM: Instruction = entry("IM n", &[M1], im);
pub(super) const RETN: Instruction = entry("RETN", &[M1, POP, POP], retn);
pub(super) const RETI: Instruction = entry("RETI", &[M1, POP, POP], reti);

fn halt(core: &mut Core, at: Coordinate) {
    if (at.machine_cycle, at.half_t) == (1, 5) {
        core.enter_halt();
    }
}

fn halt_loop(core: &mut Core, at: Coordinate) {
    // The fetch moved PC past HALT; put it back.
    if (at.machine_cycle, at.half_t) == (1, 8) {
        core.regs.pc = core.regs.pc.wrapping_sub(1);
    }
}

fn di(core: &mut Core, at: Coordinate) {
    if (at.machine_cycle, at.half_t) == (1, 6) {
        core.set_interrupt_enable(false, false);
    }
}

fn ei(core: &mut Core, at: Coordinate) {
    if (at.machine_cycle, at.half_t) == (1, 6) {
        core.set_interrupt_enable(true, true);
        core.defer_interrupts();
    }
}

fn scf(core: &mut Core, at: Coordinate) {
    if (at.machine_cycle, at.half_t) == (1, 6) {
        let regs = &mut core.regs;
        regs.f = (regs.f & !(HF | NF | YF | XF)) | (regs.a & (YF | XF)) | CF;
    }
}

fn ccf(core: &mut Core, at: Coordinate) {
    if (at.machine_cycle, at.half_t) == (1, 6) {
        let regs = &mut core.regs;
        let carry = regs.f & CF;
        let half = if carry != 0 { HF } else { 0 };
        regs.f = (regs.f & !(HF | NF | YF | XF | CF)) | (regs.a & (YF | XF)) | half | (carry ^ CF);
    }
}

fn prefix(core: &mut Core, at: Coordinate) {
    if (at.machine_cycle, at.half_t) == (1, 6) {
        core.next_prefix = match core.opcode {
            0xCB => Prefix::Cb,
            0xDD => Prefix::Dd,
            0xED => Prefix::Ed,
            _ => Prefix::Fd,
        };
        core.defer_interrupts();
    }
}

fn im(core: &mut Core, at: Coordinate) {
    if (at.machine_cycle, at.half_t) == (1, 6) {
        let mode = match (core.opcode >> 3) & 3 {
            0 | 1 => 0,
            2 => 1,
            _ => 2,
        };
        core.set_interrupt_mode(mode);
    }
}

/// Pop the return address into WZ, then PC.
fn pop_pc(core: &mut Core, at: Coordinate) {
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

fn retn(core: &mut Core, at: Coordinate) {
    if (at.machine_cycle, at.half_t) == (1, 6) {
        let iff2 = core.control.iff2;
        core.set_interrupt_enable(iff2, iff2);
    }
    pop_pc(core, at);
}

fn reti(core: &mut Core, at: Coordinate) {
    if (at.machine_cycle, at.half_t) == (1, 6) {
        let iff2 = core.control.iff2;
        core.set_interrupt_enable(false, iff2);
    }
    pop_pc(core, at);
}
