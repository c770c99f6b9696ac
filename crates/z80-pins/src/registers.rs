//! Z80 register set.

/// Z80 registers snapshot.
///
/// Interrupt and halt state live in the control unit, not here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Registers {
    // Main registers
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,

    // Alternate registers
    pub a_alt: u8,
    pub f_alt: u8,
    pub b_alt: u8,
    pub c_alt: u8,
    pub d_alt: u8,
    pub e_alt: u8,
    pub h_alt: u8,
    pub l_alt: u8,

    // Index registers
    pub ix: u16,
    pub iy: u16,

    // Other registers
    pub sp: u16,
    pub pc: u16,
    /// Interrupt page: high byte of the IM 2 vector table and of the
    /// refresh address.
    pub i: u8,
    /// Refresh counter. Bit 7 is only changed by software.
    pub r: u8,

    /// WZ/MEMPTR: hidden scratch pair used to assemble addresses.
    /// W is the high byte, Z the low byte.
    pub wz: u16,
}

impl Registers {
    #[must_use]
    pub const fn af(&self) -> u16 {
        (self.a as u16) << 8 | self.f as u16
    }

    #[must_use]
    pub const fn bc(&self) -> u16 {
        (self.b as u16) << 8 | self.c as u16
    }

    #[must_use]
    pub const fn de(&self) -> u16 {
        (self.d as u16) << 8 | self.e as u16
    }

    #[must_use]
    pub const fn hl(&self) -> u16 {
        (self.h as u16) << 8 | self.l as u16
    }

    /// I and R as the refresh address.
    #[must_use]
    pub const fn ir(&self) -> u16 {
        (self.i as u16) << 8 | self.r as u16
    }

    #[must_use]
    pub const fn w(&self) -> u8 {
        (self.wz >> 8) as u8
    }

    #[must_use]
    pub const fn z(&self) -> u8 {
        self.wz as u8
    }

    pub fn set_af(&mut self, value: u16) {
        self.a = (value >> 8) as u8;
        self.f = value as u8;
    }

    pub fn set_bc(&mut self, value: u16) {
        self.b = (value >> 8) as u8;
        self.c = value as u8;
    }

    pub fn set_de(&mut self, value: u16) {
        self.d = (value >> 8) as u8;
        self.e = value as u8;
    }

    pub fn set_hl(&mut self, value: u16) {
        self.h = (value >> 8) as u8;
        self.l = value as u8;
    }

    pub fn set_w(&mut self, value: u8) {
        self.wz = (self.wz & 0x00FF) | (u16::from(value) << 8);
    }

    pub fn set_z(&mut self, value: u8) {
        self.wz = (self.wz & 0xFF00) | u16::from(value);
    }

    /// Advance the low seven bits of R, keeping bit 7.
    pub fn increment_r(&mut self) {
        self.r = (self.r & 0x80) | (self.r.wrapping_add(1) & 0x7F);
    }
}
