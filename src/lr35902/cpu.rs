use crate::lr35902::irq::{Ime, Vector};
use crate::lr35902::registers::{Flags, Register, Registers};
use crate::lr35902::sm83::{Instruction, Sm83, PREFIX_OPCODE};
use crate::memory::mmu::Mmu;
use crate::memory::registers::InterruptFlags;
use crate::memory::INTERRUPT_ENABLE_REGISTER;
use log::{debug, trace};

/// Machine cycles spent pushing PC and jumping to an interrupt vector.
const INTERRUPT_DISPATCH_CYCLES: usize = 5;

#[derive(Clone)]
pub struct Cpu {
    sm83: Sm83,
    registers: Registers,
    ime: Ime,
    halted: bool,
    opcode: u16,
    cycles: usize,
}

impl Cpu {
    /// Power-on state for running a boot ROM from $0000.
    pub fn new() -> Cpu {
        Cpu::with_registers(Registers::default())
    }

    /// State the boot ROM hands over to the cartridge at $0100.
    pub fn post_boot() -> Cpu {
        Cpu::with_registers(Registers::post_boot())
    }

    fn with_registers(registers: Registers) -> Cpu {
        Cpu {
            sm83: Sm83::new(),
            registers,
            ime: Ime::default(),
            halted: false,
            opcode: 0,
            cycles: 0,
        }
    }

    /// Executes one instruction and returns the machine cycles it took.
    pub fn tick(&mut self, mmu: &mut Mmu) -> usize {
        if self.halted {
            if !self.pending_interrupts(mmu).is_empty() {
                self.halted = false;
            } else {
                self.cycles += 1;
                return 1;
            }
        }

        // EI lands after the instruction that follows it.
        let enable_ime = self.ime.enable_pending;

        let pc = self.registers.pc;
        let mut opcode = self.fetch8(mmu);
        let instruction: Instruction = if opcode == PREFIX_OPCODE {
            opcode = self.fetch8(mmu);
            self.opcode = 0xcb00 | opcode as u16;
            *self.sm83.lookup_prefixed(opcode)
        } else {
            self.opcode = opcode as u16;
            *self.sm83.lookup(opcode)
        };

        trace!("[{:#06x}] {:04x} {:<16} {}", pc, self.opcode, instruction.mnemonic, self);

        let cycles = instruction.cycles + (instruction.handler)(self, mmu, opcode);

        if enable_ime && self.ime.enable_pending {
            self.ime.enabled = true;
            self.ime.enable_pending = false;
        }

        self.cycles += cycles;
        cycles
    }

    /// Services the highest priority pending interrupt if IME allows it. Returns the
    /// machine cycles spent on the dispatch.
    pub fn handle_interrupts(&mut self, mmu: &mut Mmu) -> usize {
        if !self.ime.enabled {
            return 0;
        }

        let vector = match Vector::from_flags(self.pending_interrupts(mmu)) {
            Some(vector) => vector,
            None => return 0,
        };

        self.ime.enabled = false;
        self.ime.enable_pending = false;
        self.halted = false;

        let remaining = mmu.interrupt_flags() - vector.to_flag();
        mmu.set_interrupt_flags(remaining);

        let pc = self.registers.pc;
        self.push_stack(mmu, pc);
        self.registers.pc = vector.to_address();
        debug!("Servicing {} interrupt, returning to ${:04x}", vector, pc);

        self.cycles += INTERRUPT_DISPATCH_CYCLES;
        INTERRUPT_DISPATCH_CYCLES
    }

    /// Requests the given interrupts and wakes the CPU from HALT/STOP, whether or not
    /// IME would let them be serviced.
    pub fn interrupt(&mut self, mmu: &mut Mmu, flags: InterruptFlags) {
        if flags.is_empty() {
            return;
        }

        mmu.request_interrupt(flags);
        self.halted = false;
    }

    fn pending_interrupts(&self, mmu: &Mmu) -> InterruptFlags {
        mmu.interrupt_flags() & mmu.read_as::<InterruptFlags>(INTERRUPT_ENABLE_REGISTER)
    }

    pub fn snapshot(&self) -> CpuSnapshot {
        let mnemonic = if self.opcode > 0xff {
            self.sm83.lookup_prefixed(self.opcode as u8).mnemonic
        } else {
            self.sm83.lookup(self.opcode as u8).mnemonic
        };

        CpuSnapshot {
            registers: self.registers.clone(),
            opcode: self.opcode,
            mnemonic,
            ime: self.ime.enabled,
            halted: self.halted,
            cycles: self.cycles,
        }
    }

    #[inline]
    pub fn fetch8(&mut self, mmu: &Mmu) -> u8 {
        let data = mmu.read(self.registers.pc);
        self.registers.pc = self.registers.pc.wrapping_add(1);
        data
    }

    #[inline]
    pub fn fetch16(&mut self, mmu: &Mmu) -> u16 {
        let lo = self.fetch8(mmu);
        let hi = self.fetch8(mmu);
        u16::from_le_bytes([lo, hi])
    }

    pub fn push_stack(&mut self, mmu: &mut Mmu, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.registers.sp = self.registers.sp.wrapping_sub(1);
        mmu.write(self.registers.sp, hi);
        self.registers.sp = self.registers.sp.wrapping_sub(1);
        mmu.write(self.registers.sp, lo);
    }

    pub fn pop_stack(&mut self, mmu: &mut Mmu) -> u16 {
        let lo = mmu.read(self.registers.sp);
        self.registers.sp = self.registers.sp.wrapping_add(1);
        let hi = mmu.read(self.registers.sp);
        self.registers.sp = self.registers.sp.wrapping_add(1);
        u16::from_le_bytes([lo, hi])
    }

    /// Reads the 8-bit operand encoded in three opcode bits. Index 6 is (HL).
    pub fn read_r8(&self, mmu: &Mmu, index: u8) -> u8 {
        match index & 0b111 {
            0 => self.registers.b,
            1 => self.registers.c,
            2 => self.registers.d,
            3 => self.registers.e,
            4 => self.registers.h,
            5 => self.registers.l,
            6 => mmu.read(self.registers.hl()),
            _ => self.registers.a,
        }
    }

    pub fn write_r8(&mut self, mmu: &mut Mmu, index: u8, data: u8) {
        match index & 0b111 {
            0 => self.registers.b = data,
            1 => self.registers.c = data,
            2 => self.registers.d = data,
            3 => self.registers.e = data,
            4 => self.registers.h = data,
            5 => self.registers.l = data,
            6 => mmu.write(self.registers.hl(), data),
            _ => self.registers.a = data,
        }
    }

    /// 16-bit operand from two opcode bits, with SP in slot 3.
    pub fn read_r16(&self, index: u8) -> u16 {
        match index & 0b11 {
            0 => self.registers.bc(),
            1 => self.registers.de(),
            2 => self.registers.hl(),
            _ => self.registers.sp,
        }
    }

    pub fn write_r16(&mut self, index: u8, value: u16) {
        match index & 0b11 {
            0 => self.registers.set_bc(value),
            1 => self.registers.set_de(value),
            2 => self.registers.set_hl(value),
            _ => self.registers.sp = value,
        }
    }

    /// Condition encoded in two opcode bits: NZ, Z, NC, C.
    pub fn check_condition(&self, index: u8) -> bool {
        match index & 0b11 {
            0 => !self.read_flag(Flags::ZERO),
            1 => self.read_flag(Flags::ZERO),
            2 => !self.read_flag(Flags::CARRY),
            _ => self.read_flag(Flags::CARRY),
        }
    }

    pub fn read_register(&self, register: &Register) -> u8 {
        match register {
            Register::A => self.registers.a,
            Register::F => self.registers.f.bits(),
            Register::B => self.registers.b,
            Register::C => self.registers.c,
            Register::D => self.registers.d,
            Register::E => self.registers.e,
            Register::H => self.registers.h,
            Register::L => self.registers.l,
            _ => panic!("Invalid register: {:?}", register),
        }
    }

    pub fn read_register16(&self, register: &Register) -> u16 {
        match register {
            Register::AF => self.registers.af(),
            Register::BC => self.registers.bc(),
            Register::DE => self.registers.de(),
            Register::HL => self.registers.hl(),
            Register::SP => self.registers.sp,
            Register::PC => self.registers.pc,
            _ => panic!("Invalid register: {:?}", register),
        }
    }

    pub fn write_register(&mut self, register: &Register, data: u8) {
        match register {
            Register::A => self.registers.a = data,
            Register::F => self.registers.f = Flags::from_bits_truncate(data),
            Register::B => self.registers.b = data,
            Register::C => self.registers.c = data,
            Register::D => self.registers.d = data,
            Register::E => self.registers.e = data,
            Register::H => self.registers.h = data,
            Register::L => self.registers.l = data,
            _ => panic!("Invalid register: {:?}", register),
        }
    }

    pub fn write_register16(&mut self, register: &Register, value: u16) {
        match register {
            Register::AF => self.registers.set_af(value),
            Register::BC => self.registers.set_bc(value),
            Register::DE => self.registers.set_de(value),
            Register::HL => self.registers.set_hl(value),
            Register::SP => self.registers.sp = value,
            Register::PC => self.registers.pc = value,
            _ => panic!("Invalid register: {:?}", register),
        }
    }

    #[inline]
    pub fn read_flag(&self, flag: Flags) -> bool {
        self.registers.f.contains(flag)
    }

    #[inline]
    pub fn update_flag(&mut self, flag: Flags, value: bool) {
        self.registers.f.set(flag, value);
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub(crate) fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    pub fn ime(&self) -> &Ime {
        &self.ime
    }

    pub(crate) fn ime_mut(&mut self) -> &mut Ime {
        &mut self.ime
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub(crate) fn halt(&mut self) {
        self.halted = true;
    }

    pub fn cycles(&self) -> usize {
        self.cycles
    }
}

impl Default for Cpu {
    fn default() -> Cpu {
        Cpu::new()
    }
}

impl std::fmt::Display for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "A: ${:02x}  F: ${:02x}  B: ${:02x}  C: ${:02x}  D: ${:02x}  E: ${:02x}  H: ${:02x}  L: ${:02x}  SP: ${:04x}  PC: ${:04x}",
            self.registers.a,
            self.registers.f.bits(),
            self.registers.b,
            self.registers.c,
            self.registers.d,
            self.registers.e,
            self.registers.h,
            self.registers.l,
            self.registers.sp,
            self.registers.pc
        )
    }
}

/// Copy of the processor state for debuggers and tracing. Taking one has no side effects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CpuSnapshot {
    pub registers: Registers,
    /// Last decoded opcode; prefixed opcodes carry $cb in the high byte.
    pub opcode: u16,
    pub mnemonic: &'static str,
    pub ime: bool,
    pub halted: bool,
    pub cycles: usize,
}

impl CpuSnapshot {
    pub fn flags(&self) -> Flags {
        self.registers.f
    }
}

impl std::fmt::Display for CpuSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let flag = |flag: Flags, c: char| if self.flags().contains(flag) { c } else { '-' };
        write!(
            f,
            "AF: ${:04x}  BC: ${:04x}  DE: ${:04x}  HL: ${:04x}  SP: ${:04x}  PC: ${:04x}  [{}{}{}{}]  IME: {}  op: ${:04x} ({})",
            self.registers.af(),
            self.registers.bc(),
            self.registers.de(),
            self.registers.hl(),
            self.registers.sp,
            self.registers.pc,
            flag(Flags::ZERO, 'Z'),
            flag(Flags::SUBTRACT, 'N'),
            flag(Flags::HALF_CARRY, 'H'),
            flag(Flags::CARRY, 'C'),
            self.ime as u8,
            self.opcode,
            self.mnemonic
        )
    }
}
