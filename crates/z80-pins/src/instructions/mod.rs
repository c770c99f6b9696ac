//! Instruction timing dispatch.
//!
//! Each catalogued opcode maps to an `Instruction`: a mnemonic, the
//! machine-cycle template the sequencer steps through, and a handler the
//! sequencer calls once per half period with the current coordinate.
//! Handlers match on `(machine_cycle, half_t)` and ignore every other
//! coordinate.
//!
//! Besides the opcode tables there are pseudo-instructions the sequencer
//! starts on its own: the halt loop and the interrupt acknowledges.

mod control;
mod io;
mod jump;
mod load;
mod stack;

use crate::datapath::Core;
use crate::router::Reg16;
use crate::timing::{AddressSource, Coordinate, MachineCycle, Template};

pub(crate) use control::{FETCH, HALT_LOOP, UNSUPPORTED};
pub(crate) use stack::{IM0_ACKNOWLEDGE, IM1_ACKNOWLEDGE, IM2_ACKNOWLEDGE, NMI_ACKNOWLEDGE};

pub(crate) type Handler = fn(&mut Core, Coordinate);

#[derive(Debug, Clone, Copy)]
pub(crate) struct Instruction {
    pub(crate) mnemonic: &'static str,
    pub(crate) template: Template,
    pub(crate) handler: Handler,
}

/// Opcode prefix selecting the decode table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum Prefix {
    #[default]
    None,
    Cb,
    Dd,
    Ed,
    Fd,
}

impl Prefix {
    pub(crate) const fn byte(self) -> Option<u8> {
        match self {
            Self::None => None,
            Self::Cb => Some(0xCB),
            Self::Dd => Some(0xDD),
            Self::Ed => Some(0xED),
            Self::Fd => Some(0xFD),
        }
    }

    pub(crate) const fn index_register(self) -> Reg16 {
        match self {
            Self::Fd => Reg16::Iy,
            _ => Reg16::Ix,
        }
    }
}

const M1: MachineCycle = MachineCycle::fetch(4);
const READ_PC: MachineCycle = MachineCycle::read(AddressSource::Pc);
const PUSH: MachineCycle = MachineCycle::write(AddressSource::SpDecrement);
const POP: MachineCycle = MachineCycle::read(AddressSource::SpIncrement);

const fn entry(
    mnemonic: &'static str,
    cycles: &'static [MachineCycle],
    handler: Handler,
) -> Instruction {
    Instruction {
        mnemonic,
        template: Template::fixed(cycles),
        handler,
    }
}

/// Handler for cycles with nothing to move.
fn idle(_core: &mut Core, _at: Coordinate) {}

static UNPREFIXED: [Option<Instruction>; 256] = unprefixed();
static INDEXED: [Option<Instruction>; 256] = indexed();
static EXTENDED: [Option<Instruction>; 256] = extended();

const fn unprefixed() -> [Option<Instruction>; 256] {
    let mut table = [None; 256];

    table[0x00] = Some(control::NOP);
    table[0x76] = Some(control::HALT);
    table[0xF3] = Some(control::DI);
    table[0xFB] = Some(control::EI);
    table[0x37] = Some(control::SCF);
    table[0x3F] = Some(control::CCF);
    table[0xCB] = Some(control::PREFIX);
    table[0xDD] = Some(control::PREFIX);
    table[0xED] = Some(control::PREFIX);
    table[0xFD] = Some(control::PREFIX);

    table[0xC3] = Some(jump::JP_NN);
    table[0x18] = Some(jump::JR);
    table[0x10] = Some(jump::DJNZ);
    table[0xE9] = Some(jump::JP_HL);

    table[0x3A] = Some(load::LD_A_MEM);
    table[0x32] = Some(load::LD_MEM_A);

    table[0xCD] = Some(stack::CALL);
    table[0xC9] = Some(stack::RET);

    table[0xDB] = Some(io::IN_A_N);
    table[0xD3] = Some(io::OUT_N_A);

    let mut code = 0;
    while code < 8 {
        table[0xC2 + code * 8] = Some(jump::JP_CC);
        table[0xC7 + code * 8] = Some(stack::RST);
        // LD (HL),n is a memory write, not a register load.
        if code != 6 {
            table[0x06 + code * 8] = Some(load::LD_R_N);
        }
        code += 1;
    }

    let mut cc = 0;
    while cc < 4 {
        table[0x20 + cc * 8] = Some(jump::JR_CC);
        table[0x01 + cc * 16] = Some(load::LD_RR_NN);
        cc += 1;
    }

    table
}

const fn indexed() -> [Option<Instruction>; 256] {
    let mut table = [None; 256];
    table[0x21] = Some(load::LD_INDEX_NN);
    table[0xE9] = Some(jump::JP_INDEX);
    table
}

const fn extended() -> [Option<Instruction>; 256] {
    let mut table = [None; 256];
    let mut row = 0;
    while row < 8 {
        let base = 0x40 + row * 8;
        table[base + 0x05] = if row == 1 {
            Some(control::RETI)
        } else {
            Some(control::RETN)
        };
        table[base + 0x06] = Some(control::IM);
        row += 1;
    }
    table
}

/// The instruction for `opcode` under `prefix`, or `None` if the catalog
/// does not carry it.
pub(crate) fn lookup(prefix: Prefix, opcode: u8) -> Option<Instruction> {
    let index = usize::from(opcode);
    match prefix {
        Prefix::None => UNPREFIXED[index],
        // DD/FD before an opcode with no indexed form runs the plain form.
        Prefix::Dd | Prefix::Fd => INDEXED[index].or(UNPREFIXED[index]),
        // Unlisted ED opcodes are two-byte no-ops on the real part.
        Prefix::Ed => Some(EXTENDED[index].unwrap_or(control::ED_NOP)),
        Prefix::Cb => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::CycleKind;

    fn catalog() -> impl Iterator<Item = Instruction> {
        let tables = [&UNPREFIXED, &INDEXED, &EXTENDED];
        let pseudo = [
            FETCH,
            HALT_LOOP,
            UNSUPPORTED,
            control::ED_NOP,
            NMI_ACKNOWLEDGE,
            IM0_ACKNOWLEDGE,
            IM1_ACKNOWLEDGE,
            IM2_ACKNOWLEDGE,
        ];
        tables
            .into_iter()
            .flat_map(|table| table.iter().flatten().copied())
            .chain(pseudo)
    }

    #[test]
    fn no_cycle_is_shorter_than_its_kind() {
        for instruction in catalog() {
            let template = instruction.template;
            let lists = std::iter::once(template.normal).chain(template.alternate);
            for cycles in lists {
                for cycle in cycles {
                    assert!(
                        cycle.t_states >= cycle.kind.shape().t_states,
                        "{}: {cycle:?}",
                        instruction.mnemonic
                    );
                }
            }
        }
    }

    #[test]
    fn every_template_starts_with_an_m1() {
        for instruction in catalog() {
            let first = instruction.template.normal[0].kind;
            assert!(
                matches!(
                    first,
                    CycleKind::OpcodeFetch | CycleKind::InterruptAcknowledge
                ),
                "{}",
                instruction.mnemonic
            );
        }
    }

    #[test]
    fn alternates_share_their_opening_cycles() {
        for instruction in catalog() {
            if let Some(alt) = instruction.template.alternate {
                let normal = instruction.template.normal;
                assert!(alt.len() <= normal.len(), "{}", instruction.mnemonic);
                let shared = alt.len() - 1;
                assert_eq!(&alt[..shared], &normal[..shared], "{}", instruction.mnemonic);
            }
        }
    }

    #[test]
    fn jump_group_timings() {
        let t = |prefix, op| lookup(prefix, op).map(|i| i.template.t_states());
        let alt = |op| lookup(Prefix::None, op).and_then(|i| i.template.alternate_t_states());
        assert_eq!(t(Prefix::None, 0xC3), Some(10));
        assert_eq!(t(Prefix::None, 0xCA), Some(10));
        assert_eq!(t(Prefix::None, 0x18), Some(12));
        assert_eq!(t(Prefix::None, 0x20), Some(12));
        assert_eq!(alt(0x20), Some(7));
        assert_eq!(t(Prefix::None, 0x10), Some(13));
        assert_eq!(alt(0x10), Some(8));
        assert_eq!(t(Prefix::None, 0xE9), Some(4));
        assert_eq!(t(Prefix::Dd, 0xE9), Some(4));
        assert_eq!(t(Prefix::Fd, 0xE9), Some(4));
    }

    #[test]
    fn prefix_fallbacks() {
        assert_eq!(lookup(Prefix::Dd, 0x00).map(|i| i.mnemonic), Some("NOP"));
        assert_eq!(lookup(Prefix::Ed, 0x00).map(|i| i.mnemonic), Some("NOP*"));
        assert_eq!(lookup(Prefix::Ed, 0x4D).map(|i| i.mnemonic), Some("RETI"));
        assert_eq!(lookup(Prefix::Ed, 0x55).map(|i| i.mnemonic), Some("RETN"));
        assert!(lookup(Prefix::Cb, 0x00).is_none());
        assert!(lookup(Prefix::None, 0x80).is_none());
        assert!(lookup(Prefix::None, 0x36).is_none());
    }
}
