//! Internal bus router.
//!
//! Two internal buses connect the register file to the pins: a 16-bit
//! address bus and an 8-bit data bus. `sample_from` loads a bus from a
//! register (or from the data pins), `send_to` copies a bus into a register
//! (or queues it for the pins). The bus width follows the register width.

use crate::datapath::Core;
use crate::registers::Registers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reg8 {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
    I,
    W,
    Z,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reg16 {
    Bc,
    De,
    Hl,
    Ix,
    Iy,
    Sp,
    Pc,
    Wz,
    /// I:R, the refresh address.
    Ir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Source {
    Byte(Reg8),
    Word(Reg16),
    /// High byte of a pair, onto the data bus.
    High(Reg16),
    /// Low byte of a pair, onto the data bus.
    Low(Reg16),
    /// This half period's snapshot of the data pins. Floating reads `0xFF`.
    DataPins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dest {
    Byte(Reg8),
    Word(Reg16),
    High(Reg16),
    Low(Reg16),
    /// Queue the address bus for the address pins.
    AddressPins,
    /// Queue the data bus for the data pins.
    DataPins,
}

impl From<Reg8> for Source {
    fn from(reg: Reg8) -> Self {
        Self::Byte(reg)
    }
}

impl From<Reg16> for Source {
    fn from(reg: Reg16) -> Self {
        Self::Word(reg)
    }
}

impl From<Reg8> for Dest {
    fn from(reg: Reg8) -> Self {
        Self::Byte(reg)
    }
}

impl From<Reg16> for Dest {
    fn from(reg: Reg16) -> Self {
        Self::Word(reg)
    }
}

/// Internal bus latches and the pending pin sends.
#[derive(Debug, Clone, Default)]
pub(crate) struct BusRouter {
    pub(crate) address_bus: u16,
    pub(crate) data_bus: u8,
    data_pins: Option<u8>,
    /// Last byte sampled from the data pins.
    displacement: u8,
    address_out: Option<u16>,
    data_out: Option<u8>,
}

impl BusRouter {
    /// Snapshot the data pins for this half period.
    pub(crate) fn latch_data_pins(&mut self, value: Option<u8>) {
        self.data_pins = value;
    }

    pub(crate) fn take_address_out(&mut self) -> Option<u16> {
        self.address_out.take()
    }

    pub(crate) fn take_data_out(&mut self) -> Option<u8> {
        self.data_out.take()
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

fn byte(regs: &Registers, reg: Reg8) -> u8 {
    match reg {
        Reg8::A => regs.a,
        Reg8::B => regs.b,
        Reg8::C => regs.c,
        Reg8::D => regs.d,
        Reg8::E => regs.e,
        Reg8::H => regs.h,
        Reg8::L => regs.l,
        Reg8::I => regs.i,
        Reg8::W => regs.w(),
        Reg8::Z => regs.z(),
    }
}

fn set_byte(regs: &mut Registers, reg: Reg8, value: u8) {
    match reg {
        Reg8::A => regs.a = value,
        Reg8::B => regs.b = value,
        Reg8::C => regs.c = value,
        Reg8::D => regs.d = value,
        Reg8::E => regs.e = value,
        Reg8::H => regs.h = value,
        Reg8::L => regs.l = value,
        Reg8::I => regs.i = value,
        Reg8::W => regs.set_w(value),
        Reg8::Z => regs.set_z(value),
    }
}

fn word(regs: &Registers, reg: Reg16) -> u16 {
    match reg {
        Reg16::Bc => regs.bc(),
        Reg16::De => regs.de(),
        Reg16::Hl => regs.hl(),
        Reg16::Ix => regs.ix,
        Reg16::Iy => regs.iy,
        Reg16::Sp => regs.sp,
        Reg16::Pc => regs.pc,
        Reg16::Wz => regs.wz,
        Reg16::Ir => regs.ir(),
    }
}

fn set_word(regs: &mut Registers, reg: Reg16, value: u16) {
    match reg {
        Reg16::Bc => regs.set_bc(value),
        Reg16::De => regs.set_de(value),
        Reg16::Hl => regs.set_hl(value),
        Reg16::Ix => regs.ix = value,
        Reg16::Iy => regs.iy = value,
        Reg16::Sp => regs.sp = value,
        Reg16::Pc => regs.pc = value,
        Reg16::Wz => regs.wz = value,
        Reg16::Ir => {
            regs.i = (value >> 8) as u8;
            regs.r = value as u8;
        }
    }
}

impl Core {
    /// Load an internal bus from `source`.
    pub(crate) fn sample_from(&mut self, source: impl Into<Source>) {
        let router = &mut self.router;
        match source.into() {
            Source::Byte(reg) => router.data_bus = byte(&self.regs, reg),
            Source::Word(reg) => router.address_bus = word(&self.regs, reg),
            Source::High(reg) => router.data_bus = (word(&self.regs, reg) >> 8) as u8,
            Source::Low(reg) => router.data_bus = word(&self.regs, reg) as u8,
            Source::DataPins => {
                let value = router.data_pins.unwrap_or(0xFF);
                router.data_bus = value;
                router.displacement = value;
            }
        }
    }

    /// Copy an internal bus into `dest`.
    pub(crate) fn send_to(&mut self, dest: impl Into<Dest>) {
        let address = self.router.address_bus;
        let data = self.router.data_bus;
        match dest.into() {
            Dest::Byte(reg) => set_byte(&mut self.regs, reg, data),
            Dest::Word(reg) => set_word(&mut self.regs, reg, address),
            Dest::High(reg) => {
                let low = word(&self.regs, reg) & 0x00FF;
                set_word(&mut self.regs, reg, u16::from(data) << 8 | low);
            }
            Dest::Low(reg) => {
                let high = word(&self.regs, reg) & 0xFF00;
                set_word(&mut self.regs, reg, high | u16::from(data));
            }
            Dest::AddressPins => self.router.address_out = Some(address),
            Dest::DataPins => self.router.data_out = Some(data),
        }
    }

    /// Load the address bus with WZ plus the last sampled byte, taken as a
    /// signed displacement.
    pub(crate) fn sample_from_wz_plus_displacement(&mut self) {
        let offset = i16::from(self.router.displacement as i8);
        self.router.address_bus = self.regs.wz.wrapping_add_signed(offset);
    }

    /// Run the address bus through the incrementer.
    pub(crate) fn step_address_bus(&mut self, delta: i8) {
        self.router.address_bus = self.router.address_bus.wrapping_add_signed(i16::from(delta));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_sources_use_the_address_bus() {
        let mut core = Core::default();
        core.regs.set_hl(0x4321);
        core.sample_from(Reg16::Hl);
        core.send_to(Reg16::Pc);
        assert_eq!(core.regs.pc, 0x4321);
        assert_eq!(core.router.data_bus, 0);
    }

    #[test]
    fn halves_travel_on_the_data_bus() {
        let mut core = Core::default();
        core.regs.pc = 0xABCD;
        core.sample_from(Source::High(Reg16::Pc));
        core.send_to(Reg8::W);
        core.sample_from(Source::Low(Reg16::Pc));
        core.send_to(Reg8::Z);
        assert_eq!(core.regs.wz, 0xABCD);

        core.router.data_bus = 0x12;
        core.send_to(Dest::High(Reg16::Sp));
        core.router.data_bus = 0x34;
        core.send_to(Dest::Low(Reg16::Sp));
        assert_eq!(core.regs.sp, 0x1234);
    }

    #[test]
    fn floating_data_pins_read_ff() {
        let mut core = Core::default();
        core.router.latch_data_pins(None);
        core.sample_from(Source::DataPins);
        assert_eq!(core.router.data_bus, 0xFF);
    }

    #[test]
    fn displacement_is_signed() {
        let mut core = Core::default();
        core.regs.wz = 0x8002;
        core.router.latch_data_pins(Some(0xFE));
        core.sample_from(Source::DataPins);
        core.sample_from_wz_plus_displacement();
        assert_eq!(core.router.address_bus, 0x8000);

        core.router.latch_data_pins(Some(0x7F));
        core.sample_from(Source::DataPins);
        core.sample_from_wz_plus_displacement();
        assert_eq!(core.router.address_bus, 0x8081);
    }

    #[test]
    fn pin_sends_are_queued_until_taken() {
        let mut core = Core::default();
        core.regs.sp = 0x0000;
        core.sample_from(Reg16::Sp);
        core.step_address_bus(-1);
        core.send_to(Reg16::Sp);
        core.send_to(Dest::AddressPins);
        assert_eq!(core.regs.sp, 0xFFFF);
        assert_eq!(core.router.take_address_out(), Some(0xFFFF));
        assert_eq!(core.router.take_address_out(), None);
        assert_eq!(core.router.take_data_out(), None);
    }

    #[test]
    fn ir_destination_splits_into_i_and_r() {
        let mut core = Core::default();
        core.router.address_bus = 0x3F12;
        core.send_to(Reg16::Ir);
        assert_eq!((core.regs.i, core.regs.r), (0x3F, 0x12));
    }
}
