use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Flags: u8 {
        const ZERO       = 0b1000_0000;
        const SUBTRACT   = 0b0100_0000;
        const HALF_CARRY = 0b0010_0000;
        const CARRY      = 0b0001_0000;
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Register {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
    F,
    AF,
    BC,
    DE,
    HL,
    SP,
    PC,
}

/// Register file. F is kept as [`Flags`], which drops the low nibble on every store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub f: Flags,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
}

impl Registers {
    /// State left behind by the DMG boot ROM.
    pub fn post_boot() -> Registers {
        Registers {
            a: 0x01,
            f: Flags::ZERO | Flags::HALF_CARRY | Flags::CARRY,
            b: 0x00,
            c: 0x13,
            d: 0x00,
            e: 0xd8,
            h: 0x01,
            l: 0x4d,
            sp: 0xfffe,
            pc: 0x0100,
        }
    }

    #[inline]
    pub fn af(&self) -> u16 {
        u16::from_be_bytes([self.a, self.f.bits()])
    }

    #[inline]
    pub fn set_af(&mut self, value: u16) {
        let [a, f] = value.to_be_bytes();
        self.a = a;
        self.f = Flags::from_bits_truncate(f);
    }

    #[inline]
    pub fn bc(&self) -> u16 {
        u16::from_be_bytes([self.b, self.c])
    }

    #[inline]
    pub fn set_bc(&mut self, value: u16) {
        [self.b, self.c] = value.to_be_bytes();
    }

    #[inline]
    pub fn de(&self) -> u16 {
        u16::from_be_bytes([self.d, self.e])
    }

    #[inline]
    pub fn set_de(&mut self, value: u16) {
        [self.d, self.e] = value.to_be_bytes();
    }

    #[inline]
    pub fn hl(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }

    #[inline]
    pub fn set_hl(&mut self, value: u16) {
        [self.h, self.l] = value.to_be_bytes();
    }
}

impl Default for Registers {
    fn default() -> Registers {
        Registers {
            a: 0,
            f: Flags::empty(),
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            sp: 0,
            pc: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_registers_round_trip_through_halves() {
        let mut registers = Registers::default();
        for value in 0..=u16::MAX {
            registers.set_bc(value);
            registers.set_de(value);
            registers.set_hl(value);
            assert_eq!(u16::from_be_bytes([registers.b, registers.c]), value);
            assert_eq!(u16::from_be_bytes([registers.d, registers.e]), value);
            assert_eq!(u16::from_be_bytes([registers.h, registers.l]), value);
            assert_eq!(registers.bc(), value);
            assert_eq!(registers.de(), value);
            assert_eq!(registers.hl(), value);
        }
    }

    #[test]
    fn af_drops_low_flag_nibble() {
        let mut registers = Registers::default();
        for value in 0..=u16::MAX {
            registers.set_af(value);
            assert_eq!(registers.a, (value >> 8) as u8);
            assert_eq!(registers.af(), value & 0xfff0);
            assert_eq!(registers.f.bits() & 0x0f, 0);
        }
    }
}
