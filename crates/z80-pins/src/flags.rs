//! Z80 flag register bits and condition codes.

/// Sign flag (bit 7) - set if result is negative.
pub const SF: u8 = 0b1000_0000;

/// Zero flag (bit 6) - set if result is zero.
pub const ZF: u8 = 0b0100_0000;

/// Undocumented flag (bit 5) - copy of bit 5 of result.
pub const YF: u8 = 0b0010_0000;

/// Half-carry flag (bit 4) - carry from bit 3 to bit 4.
pub const HF: u8 = 0b0001_0000;

/// Undocumented flag (bit 3) - copy of bit 3 of result.
pub const XF: u8 = 0b0000_1000;

/// Parity/Overflow flag (bit 2) - parity or overflow depending on instruction.
pub const PF: u8 = 0b0000_0100;

/// Add/Subtract flag (bit 1) - set if last operation was subtraction.
pub const NF: u8 = 0b0000_0010;

/// Carry flag (bit 0) - carry out of bit 7.
pub const CF: u8 = 0b0000_0001;

/// Evaluate a 3-bit condition code (bits 5-3 of JP cc / CALL cc / RET cc)
/// against the flags. JR cc uses the first four codes only.
#[must_use]
pub const fn condition(f: u8, cc: u8) -> bool {
    match cc & 7 {
        0 => f & ZF == 0, // NZ
        1 => f & ZF != 0, // Z
        2 => f & CF == 0, // NC
        3 => f & CF != 0, // C
        4 => f & PF == 0, // PO
        5 => f & PF != 0, // PE
        6 => f & SF == 0, // P
        _ => f & SF != 0, // M
    }
}
