use crate::lr35902::cpu::Cpu;
use crate::lr35902::registers::Flags;

impl Cpu {
    /// ADD/ADC into A.
    pub fn alu_add(&mut self, value: u8, use_carry: bool) {
        let a = self.registers().a;
        let carry = (use_carry && self.read_flag(Flags::CARRY)) as u8;
        let result = a.wrapping_add(value).wrapping_add(carry);

        self.update_flag(Flags::ZERO, result == 0);
        self.update_flag(Flags::SUBTRACT, false);
        self.update_flag(Flags::HALF_CARRY, (a & 0x0f) + (value & 0x0f) + carry > 0x0f);
        self.update_flag(Flags::CARRY, a as u16 + value as u16 + carry as u16 > 0xff);
        self.registers_mut().a = result;
    }

    /// SUB/SBC, or CP when `store` is false.
    pub fn alu_sub(&mut self, value: u8, use_carry: bool, store: bool) {
        let a = self.registers().a;
        let borrow = (use_carry && self.read_flag(Flags::CARRY)) as u8;
        let result = a.wrapping_sub(value).wrapping_sub(borrow);

        self.update_flag(Flags::ZERO, result == 0);
        self.update_flag(Flags::SUBTRACT, true);
        self.update_flag(Flags::HALF_CARRY, (a & 0x0f) < (value & 0x0f) + borrow);
        self.update_flag(Flags::CARRY, (a as u16) < value as u16 + borrow as u16);
        if store {
            self.registers_mut().a = result;
        }
    }

    pub fn alu_and(&mut self, value: u8) {
        let result = self.registers().a & value;
        self.set_logic_flags(result, true);
    }

    pub fn alu_or(&mut self, value: u8) {
        let result = self.registers().a | value;
        self.set_logic_flags(result, false);
    }

    pub fn alu_xor(&mut self, value: u8) {
        let result = self.registers().a ^ value;
        self.set_logic_flags(result, false);
    }

    fn set_logic_flags(&mut self, result: u8, half_carry: bool) {
        self.update_flag(Flags::ZERO, result == 0);
        self.update_flag(Flags::SUBTRACT, false);
        self.update_flag(Flags::HALF_CARRY, half_carry);
        self.update_flag(Flags::CARRY, false);
        self.registers_mut().a = result;
    }

    /// INC r8. Carry is untouched.
    pub fn alu_inc(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.update_flag(Flags::ZERO, result == 0);
        self.update_flag(Flags::SUBTRACT, false);
        self.update_flag(Flags::HALF_CARRY, (value & 0x0f) + 1 > 0x0f);
        result
    }

    /// DEC r8. Carry is untouched.
    pub fn alu_dec(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.update_flag(Flags::ZERO, result == 0);
        self.update_flag(Flags::SUBTRACT, true);
        self.update_flag(Flags::HALF_CARRY, value & 0x0f < 1);
        result
    }

    /// ADD HL, rr. Zero is untouched; H and C come from bits 11 and 15.
    pub fn alu_add_hl(&mut self, value: u16) {
        let hl = self.registers().hl();
        let result = hl.wrapping_add(value);

        self.update_flag(Flags::SUBTRACT, false);
        self.update_flag(Flags::HALF_CARRY, (hl & 0x0fff) + (value & 0x0fff) > 0x0fff);
        self.update_flag(Flags::CARRY, hl as u32 + value as u32 > 0xffff);
        self.registers_mut().set_hl(result);
    }

    /// SP plus a signed offset as used by ADD SP,e8 and LD HL,SP+e8. The flags come from
    /// the unsigned addition of the low bytes.
    pub fn alu_sp_offset(&mut self, offset: i8) -> u16 {
        let sp = self.registers().sp;
        let unsigned = offset as u8 as u16;

        self.update_flag(Flags::ZERO, false);
        self.update_flag(Flags::SUBTRACT, false);
        self.update_flag(Flags::HALF_CARRY, (sp & 0x0f) + (unsigned & 0x0f) > 0x0f);
        self.update_flag(Flags::CARRY, (sp & 0xff) + unsigned > 0xff);
        sp.wrapping_add_signed(offset as i16)
    }

    pub fn alu_daa(&mut self) {
        let mut a = self.registers().a;
        let mut carry = self.read_flag(Flags::CARRY);
        let half_carry = self.read_flag(Flags::HALF_CARRY);

        if !self.read_flag(Flags::SUBTRACT) {
            if carry || a > 0x99 {
                a = a.wrapping_add(0x60);
                carry = true;
            }
            if half_carry || a & 0x0f > 0x09 {
                a = a.wrapping_add(0x06);
            }
        } else {
            if carry {
                a = a.wrapping_sub(0x60);
            }
            if half_carry {
                a = a.wrapping_sub(0x06);
            }
        }

        self.update_flag(Flags::ZERO, a == 0);
        self.update_flag(Flags::HALF_CARRY, false);
        self.update_flag(Flags::CARRY, carry);
        self.registers_mut().a = a;
    }

    /// The eight $cb-prefixed shift operations, selected by bits 3-5 of the opcode.
    pub fn alu_shift(&mut self, operation: u8, value: u8) -> u8 {
        let carry_in = self.read_flag(Flags::CARRY) as u8;

        let (result, carry) = match operation & 0b111 {
            0 => (value.rotate_left(1), value & 0x80 != 0),
            1 => (value.rotate_right(1), value & 0x01 != 0),
            2 => ((value << 1) | carry_in, value & 0x80 != 0),
            3 => ((value >> 1) | (carry_in << 7), value & 0x01 != 0),
            4 => (value << 1, value & 0x80 != 0),
            5 => ((value >> 1) | (value & 0x80), value & 0x01 != 0),
            6 => (value.rotate_left(4), false),
            _ => (value >> 1, value & 0x01 != 0),
        };

        self.update_flag(Flags::ZERO, result == 0);
        self.update_flag(Flags::SUBTRACT, false);
        self.update_flag(Flags::HALF_CARRY, false);
        self.update_flag(Flags::CARRY, carry);
        result
    }

    pub fn alu_bit(&mut self, bit: u8, value: u8) {
        self.update_flag(Flags::ZERO, value & (1 << bit) == 0);
        self.update_flag(Flags::SUBTRACT, false);
        self.update_flag(Flags::HALF_CARRY, true);
    }
}

#[cfg(test)]
mod tests {
    use crate::lr35902::cpu::Cpu;
    use crate::lr35902::registers::Flags;

    const EDGES: [u8; 9] = [0x00, 0x01, 0x0f, 0x10, 0x7f, 0x80, 0x99, 0xfe, 0xff];

    fn cpu_with(a: u8, carry: bool) -> Cpu {
        let mut cpu = Cpu::new();
        cpu.registers_mut().a = a;
        cpu.update_flag(Flags::CARRY, carry);
        cpu
    }

    #[test]
    fn add_matches_wide_arithmetic() {
        for a in EDGES {
            for b in EDGES {
                for carry in [false, true] {
                    let mut cpu = cpu_with(a, carry);
                    cpu.alu_add(b, true);

                    let wide = a as u16 + b as u16 + carry as u16;
                    assert_eq!(cpu.registers().a, wide as u8);
                    assert_eq!(cpu.read_flag(Flags::CARRY), wide > 0xff, "{a:02x}+{b:02x}+{carry}");
                    assert_eq!(cpu.read_flag(Flags::ZERO), wide as u8 == 0);
                    assert_eq!(
                        cpu.read_flag(Flags::HALF_CARRY),
                        (a & 0xf) + (b & 0xf) + carry as u8 > 0xf
                    );
                    assert!(!cpu.read_flag(Flags::SUBTRACT));
                }
            }
        }
    }

    #[test]
    fn sub_matches_wide_arithmetic() {
        for a in EDGES {
            for b in EDGES {
                for carry in [false, true] {
                    let mut cpu = cpu_with(a, carry);
                    cpu.alu_sub(b, true, true);

                    let wide = a as i16 - b as i16 - carry as i16;
                    assert_eq!(cpu.registers().a, wide as u8);
                    assert_eq!(cpu.read_flag(Flags::CARRY), wide < 0, "{a:02x}-{b:02x}-{carry}");
                    assert_eq!(cpu.read_flag(Flags::ZERO), wide as u8 == 0);
                    assert_eq!(
                        cpu.read_flag(Flags::HALF_CARRY),
                        ((a & 0xf) as i16) - ((b & 0xf) as i16) - (carry as i16) < 0
                    );
                    assert!(cpu.read_flag(Flags::SUBTRACT));
                }
            }
        }
    }

    #[test]
    fn compare_leaves_accumulator() {
        let mut cpu = cpu_with(0x3c, false);
        cpu.alu_sub(0x3c, false, false);
        assert_eq!(cpu.registers().a, 0x3c);
        assert!(cpu.read_flag(Flags::ZERO));

        cpu.alu_sub(0x40, false, false);
        assert!(cpu.read_flag(Flags::CARRY));
        assert!(!cpu.read_flag(Flags::ZERO));
    }

    #[test]
    fn inc_dec_keep_carry() {
        let mut cpu = cpu_with(0, true);
        assert_eq!(cpu.alu_inc(0x0f), 0x10);
        assert!(cpu.read_flag(Flags::HALF_CARRY));
        assert!(cpu.read_flag(Flags::CARRY));

        assert_eq!(cpu.alu_inc(0xff), 0x00);
        assert!(cpu.read_flag(Flags::ZERO));

        assert_eq!(cpu.alu_dec(0x10), 0x0f);
        assert!(cpu.read_flag(Flags::HALF_CARRY));
        assert!(cpu.read_flag(Flags::SUBTRACT));
        assert!(cpu.read_flag(Flags::CARRY));

        assert_eq!(cpu.alu_dec(0x01), 0x00);
        assert!(cpu.read_flag(Flags::ZERO));
        assert!(!cpu.read_flag(Flags::HALF_CARRY));
    }

    #[test]
    fn sp_offset_flags_use_low_byte() {
        let mut cpu = Cpu::new();
        cpu.registers_mut().sp = 0x00ff;
        assert_eq!(cpu.alu_sp_offset(1), 0x0100);
        assert!(cpu.read_flag(Flags::CARRY));
        assert!(cpu.read_flag(Flags::HALF_CARRY));

        cpu.registers_mut().sp = 0x1000;
        assert_eq!(cpu.alu_sp_offset(-1), 0x0fff);
        assert!(!cpu.read_flag(Flags::CARRY));
        assert!(!cpu.read_flag(Flags::HALF_CARRY));
        assert!(!cpu.read_flag(Flags::ZERO));
    }

    #[test]
    fn daa_corrects_bcd() {
        // 0x45 + 0x38 = 0x7d -> 0x83
        let mut cpu = cpu_with(0x45, false);
        cpu.alu_add(0x38, false);
        cpu.alu_daa();
        assert_eq!(cpu.registers().a, 0x83);
        assert!(!cpu.read_flag(Flags::CARRY));

        // 0x99 + 0x01 = 0x9a -> 0x00 with carry
        let mut cpu = cpu_with(0x99, false);
        cpu.alu_add(0x01, false);
        cpu.alu_daa();
        assert_eq!(cpu.registers().a, 0x00);
        assert!(cpu.read_flag(Flags::CARRY));
        assert!(cpu.read_flag(Flags::ZERO));

        // 0x42 - 0x15 = 0x2d -> 0x27
        let mut cpu = cpu_with(0x42, false);
        cpu.alu_sub(0x15, false, true);
        cpu.alu_daa();
        assert_eq!(cpu.registers().a, 0x27);
    }

    #[test]
    fn shifts_report_carry_out() {
        let mut cpu = cpu_with(0, true);
        assert_eq!(cpu.alu_shift(2, 0x80), 0x01);
        assert!(cpu.read_flag(Flags::CARRY));

        assert_eq!(cpu.alu_shift(5, 0x81), 0xc0);
        assert!(cpu.read_flag(Flags::CARRY));

        assert_eq!(cpu.alu_shift(6, 0xf1), 0x1f);
        assert!(!cpu.read_flag(Flags::CARRY));

        assert_eq!(cpu.alu_shift(7, 0x01), 0x00);
        assert!(cpu.read_flag(Flags::ZERO));
        assert!(cpu.read_flag(Flags::CARRY));
    }
}
