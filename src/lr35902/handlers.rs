use crate::lr35902::cpu::Cpu;
use crate::lr35902::registers::Flags;
use crate::memory::mmu::Mmu;
use log::{debug, warn};

const HIGH_PAGE: u16 = 0xff00;

/// Operand slots in the opcode byte.
#[inline]
fn dst(opcode: u8) -> u8 {
    (opcode >> 3) & 0b111
}

#[inline]
fn src(opcode: u8) -> u8 {
    opcode & 0b111
}

#[inline]
fn pair(opcode: u8) -> u8 {
    (opcode >> 4) & 0b11
}

pub struct Handlers {}

#[allow(unused_variables)]
impl Handlers {
    pub fn nop(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        0
    }

    pub fn illegal(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        warn!(
            "Illegal opcode ${:02x} at ${:04x}, treating as NOP",
            opcode,
            cpu.registers().pc.wrapping_sub(1)
        );
        0
    }

    pub fn stop(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        // STOP is followed by a padding byte
        cpu.fetch8(mmu);
        debug!("STOP at ${:04x}", cpu.registers().pc.wrapping_sub(2));
        cpu.halt();
        0
    }

    pub fn halt(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        cpu.halt();
        0
    }

    pub fn di(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let ime = cpu.ime_mut();
        ime.enabled = false;
        ime.enable_pending = false;
        0
    }

    pub fn ei(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        if !cpu.ime().enabled {
            cpu.ime_mut().enable_pending = true;
        }
        0
    }

    pub fn ld_r8_r8(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let value = cpu.read_r8(mmu, src(opcode));
        cpu.write_r8(mmu, dst(opcode), value);
        0
    }

    pub fn ld_r8_imm8(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let value = cpu.fetch8(mmu);
        cpu.write_r8(mmu, dst(opcode), value);
        0
    }

    pub fn ld_r16_imm16(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let value = cpu.fetch16(mmu);
        cpu.write_r16(pair(opcode), value);
        0
    }

    /// LD (BC),A and LD (DE),A.
    pub fn ld_indirect_a(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let addr = cpu.read_r16(pair(opcode));
        mmu.write(addr, cpu.registers().a);
        0
    }

    pub fn ld_a_indirect(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let addr = cpu.read_r16(pair(opcode));
        cpu.registers_mut().a = mmu.read(addr);
        0
    }

    pub fn ld_hli_a(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let hl = cpu.registers().hl();
        mmu.write(hl, cpu.registers().a);
        cpu.registers_mut().set_hl(hl.wrapping_add(1));
        0
    }

    pub fn ld_hld_a(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let hl = cpu.registers().hl();
        mmu.write(hl, cpu.registers().a);
        cpu.registers_mut().set_hl(hl.wrapping_sub(1));
        0
    }

    pub fn ld_a_hli(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let hl = cpu.registers().hl();
        cpu.registers_mut().a = mmu.read(hl);
        cpu.registers_mut().set_hl(hl.wrapping_add(1));
        0
    }

    pub fn ld_a_hld(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let hl = cpu.registers().hl();
        cpu.registers_mut().a = mmu.read(hl);
        cpu.registers_mut().set_hl(hl.wrapping_sub(1));
        0
    }

    pub fn ldh_imm8_a(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let addr = HIGH_PAGE + cpu.fetch8(mmu) as u16;
        mmu.write(addr, cpu.registers().a);
        0
    }

    pub fn ldh_a_imm8(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let addr = HIGH_PAGE + cpu.fetch8(mmu) as u16;
        cpu.registers_mut().a = mmu.read(addr);
        0
    }

    pub fn ldh_c_a(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let addr = HIGH_PAGE + cpu.registers().c as u16;
        mmu.write(addr, cpu.registers().a);
        0
    }

    pub fn ldh_a_c(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let addr = HIGH_PAGE + cpu.registers().c as u16;
        cpu.registers_mut().a = mmu.read(addr);
        0
    }

    pub fn ld_imm16_a(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let addr = cpu.fetch16(mmu);
        mmu.write(addr, cpu.registers().a);
        0
    }

    pub fn ld_a_imm16(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let addr = cpu.fetch16(mmu);
        cpu.registers_mut().a = mmu.read(addr);
        0
    }

    pub fn ld_imm16_sp(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let addr = cpu.fetch16(mmu);
        mmu.write16(addr, cpu.registers().sp);
        0
    }

    pub fn ld_sp_hl(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let hl = cpu.registers().hl();
        cpu.registers_mut().sp = hl;
        0
    }

    pub fn ld_hl_sp_offset(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let offset = cpu.fetch8(mmu) as i8;
        let value = cpu.alu_sp_offset(offset);
        cpu.registers_mut().set_hl(value);
        0
    }

    pub fn add_sp_offset(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let offset = cpu.fetch8(mmu) as i8;
        let value = cpu.alu_sp_offset(offset);
        cpu.registers_mut().sp = value;
        0
    }

    pub fn push(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let value = match pair(opcode) {
            3 => cpu.registers().af(),
            index => cpu.read_r16(index),
        };
        cpu.push_stack(mmu, value);
        0
    }

    pub fn pop(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let value = cpu.pop_stack(mmu);
        match pair(opcode) {
            // the low nibble of F does not exist
            3 => cpu.registers_mut().set_af(value),
            index => cpu.write_r16(index, value),
        }
        0
    }

    pub fn inc_r8(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let value = cpu.read_r8(mmu, dst(opcode));
        let result = cpu.alu_inc(value);
        cpu.write_r8(mmu, dst(opcode), result);
        0
    }

    pub fn dec_r8(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let value = cpu.read_r8(mmu, dst(opcode));
        let result = cpu.alu_dec(value);
        cpu.write_r8(mmu, dst(opcode), result);
        0
    }

    pub fn inc_r16(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let value = cpu.read_r16(pair(opcode)).wrapping_add(1);
        cpu.write_r16(pair(opcode), value);
        0
    }

    pub fn dec_r16(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let value = cpu.read_r16(pair(opcode)).wrapping_sub(1);
        cpu.write_r16(pair(opcode), value);
        0
    }

    pub fn add_hl_r16(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let value = cpu.read_r16(pair(opcode));
        cpu.alu_add_hl(value);
        0
    }

    pub fn alu_r8(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let value = cpu.read_r8(mmu, src(opcode));
        Handlers::alu(cpu, dst(opcode), value);
        0
    }

    pub fn alu_imm8(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let value = cpu.fetch8(mmu);
        Handlers::alu(cpu, dst(opcode), value);
        0
    }

    fn alu(cpu: &mut Cpu, operation: u8, value: u8) {
        match operation {
            0 => cpu.alu_add(value, false),
            1 => cpu.alu_add(value, true),
            2 => cpu.alu_sub(value, false, true),
            3 => cpu.alu_sub(value, true, true),
            4 => cpu.alu_and(value),
            5 => cpu.alu_xor(value),
            6 => cpu.alu_or(value),
            _ => cpu.alu_sub(value, false, false),
        }
    }

    pub fn daa(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        cpu.alu_daa();
        0
    }

    pub fn cpl(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        cpu.registers_mut().a ^= 0xff;
        cpu.update_flag(Flags::SUBTRACT, true);
        cpu.update_flag(Flags::HALF_CARRY, true);
        0
    }

    pub fn scf(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        cpu.update_flag(Flags::SUBTRACT, false);
        cpu.update_flag(Flags::HALF_CARRY, false);
        cpu.update_flag(Flags::CARRY, true);
        0
    }

    pub fn ccf(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let carry = cpu.read_flag(Flags::CARRY);
        cpu.update_flag(Flags::SUBTRACT, false);
        cpu.update_flag(Flags::HALF_CARRY, false);
        cpu.update_flag(Flags::CARRY, !carry);
        0
    }

    pub fn rlca(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        Handlers::rotate_a(cpu, 0)
    }

    pub fn rrca(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        Handlers::rotate_a(cpu, 1)
    }

    pub fn rla(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        Handlers::rotate_a(cpu, 2)
    }

    pub fn rra(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        Handlers::rotate_a(cpu, 3)
    }

    /// Accumulator rotates behave like their prefixed forms but always clear Z.
    fn rotate_a(cpu: &mut Cpu, operation: u8) -> usize {
        let a = cpu.registers().a;
        let result = cpu.alu_shift(operation, a);
        cpu.update_flag(Flags::ZERO, false);
        cpu.registers_mut().a = result;
        0
    }

    pub fn jr(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let offset = cpu.fetch8(mmu) as i8;
        let conditional = opcode != 0x18;
        if conditional && !cpu.check_condition(dst(opcode)) {
            return 0;
        }

        let pc = cpu.registers().pc.wrapping_add_signed(offset as i16);
        cpu.registers_mut().pc = pc;
        conditional as usize
    }

    pub fn jp(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let addr = cpu.fetch16(mmu);
        let conditional = opcode != 0xc3;
        if conditional && !cpu.check_condition(dst(opcode)) {
            return 0;
        }

        cpu.registers_mut().pc = addr;
        conditional as usize
    }

    pub fn jp_hl(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let hl = cpu.registers().hl();
        cpu.registers_mut().pc = hl;
        0
    }

    pub fn call(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let addr = cpu.fetch16(mmu);
        let conditional = opcode != 0xcd;
        if conditional && !cpu.check_condition(dst(opcode)) {
            return 0;
        }

        let pc = cpu.registers().pc;
        cpu.push_stack(mmu, pc);
        cpu.registers_mut().pc = addr;
        if conditional {
            3
        } else {
            0
        }
    }

    pub fn ret(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let conditional = opcode != 0xc9;
        if conditional && !cpu.check_condition(dst(opcode)) {
            return 0;
        }

        let addr = cpu.pop_stack(mmu);
        cpu.registers_mut().pc = addr;
        if conditional {
            3
        } else {
            0
        }
    }

    pub fn reti(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let addr = cpu.pop_stack(mmu);
        cpu.registers_mut().pc = addr;
        let ime = cpu.ime_mut();
        ime.enabled = true;
        ime.enable_pending = false;
        0
    }

    pub fn rst(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let pc = cpu.registers().pc;
        cpu.push_stack(mmu, pc);
        cpu.registers_mut().pc = (opcode & 0b0011_1000) as u16;
        0
    }

    pub fn shift(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let value = cpu.read_r8(mmu, src(opcode));
        let result = cpu.alu_shift(dst(opcode), value);
        cpu.write_r8(mmu, src(opcode), result);
        0
    }

    pub fn bit(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let value = cpu.read_r8(mmu, src(opcode));
        cpu.alu_bit(dst(opcode), value);
        0
    }

    pub fn res(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let value = cpu.read_r8(mmu, src(opcode));
        cpu.write_r8(mmu, src(opcode), value & !(1 << dst(opcode)));
        0
    }

    pub fn set(cpu: &mut Cpu, mmu: &mut Mmu, opcode: u8) -> usize {
        let value = cpu.read_r8(mmu, src(opcode));
        cpu.write_r8(mmu, src(opcode), value | (1 << dst(opcode)));
        0
    }
}
