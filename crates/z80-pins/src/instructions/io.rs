//! Port I/O with an immediate port number. The upper address byte is A.

use super::{Instruction, M1, READ_PC, entry};
use crate::datapath::Core;
use crate::router::{Reg8, Reg16};
use crate::timing::{AddressSource, Coordinate, MachineCycle};

const PORT_READ: MachineCycle = MachineCycle::io_read(AddressSource::Wz);
const PORT_WRITE: MachineCycle = MachineCycle::io_write(AddressSource::Wz);

pub(super) const IN_A_N: Instruction = entry("IN A,(n)", &[M1, READ_PC, PORT_READ], in_a_n);
pub(super) const OUT_N_A: Instruction = entry("OUT (n),A", &[M1, READ_PC, PORT_WRITE], out_n_a);

/// Port address A:n into WZ.
fn latch_port(core: &mut Core) {
    core.send_to(Reg8::Z);
    core.sample_from(Reg8::A);
    core.send_to(Reg8::W);
}

fn in_a_n(core: &mut Core, at: Coordinate) {
    match (at.machine_cycle, at.half_t) {
        (2, 6) => latch_port(core),
        (3, 8) => {
            core.send_to(Reg8::A);
            core.sample_from(Reg16::Wz);
            core.step_address_bus(1);
            core.send_to(Reg16::Wz);
        }
        _ => {}
    }
}

fn out_n_a(core: &mut Core, at: Coordinate) {
    match (at.machine_cycle, at.half_t) {
        (2, 6) => latch_port(core),
        (3, 1) => core.sample_from(Reg8::A),
        (3, 8) => {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Source;

    #[test]
    fn in_reads_port_into_a() {
        let mut core = Core::default();
        core.regs.a = 0x12;
        for (index, cycle) in IN_A_N.template.normal.iter().enumerate() {
            for half in 1..=cycle.half_ticks() {
                if index > 0 && Some(half) == cycle.kind.shape().data_sample {
                    core.router.latch_data_pins(Some(if index == 1 { 0xFE } else { 0x42 }));
                    core.sample_from(Source::DataPins);
                }
                if (index, half) == (2, 1) {
                    assert_eq!(core.regs.wz, 0x12FE);
                }
                (IN_A_N.handler)(&mut core, Coordinate::new(index as u8 + 1, half));
            }
        }
        assert_eq!(core.regs.a, 0x42);
        assert_eq!(core.regs.wz, 0x12FF);
    }

    #[test]
    fn out_keeps_a_on_the_data_bus_for_the_write() {
        let mut core = Core::default();
        core.regs.a = 0x07;
        for (index, cycle) in OUT_N_A.template.normal.iter().enumerate() {
            for half in 1..=cycle.half_ticks() {
                if index == 1 && Some(half) == cycle.kind.shape().data_sample {
                    core.router.latch_data_pins(Some(0xFF));
                    core.sample_from(Source::DataPins);
                }
                (OUT_N_A.handler)(&mut core, Coordinate::new(index as u8 + 1, half));
                if (index, half) == (2, 2) {
                    assert_eq!(core.router.data_bus, 0x07);
                }
            }
        }
        assert_eq!(core.regs.wz, 0x0700);
    }
}
