use crate::lr35902::cpu::Cpu;
use crate::lr35902::handlers::Handlers;
use crate::memory::mmu::Mmu;

/// Executes an instruction whose opcode byte has already been fetched. Operand bytes
/// are fetched by the handler itself. Returns cycles spent beyond the base cost, which
/// is only non-zero for taken branches.
pub type Handler = fn(&mut Cpu, &mut Mmu, u8) -> usize;

pub const PREFIX_OPCODE: u8 = 0xcb;

/// Opcodes that do not exist on the SM83. They execute as a one cycle no-op.
pub const INVALID_OPCODES: [u8; 11] = [0xd3, 0xdb, 0xdd, 0xe3, 0xe4, 0xeb, 0xec, 0xed, 0xf4, 0xfc, 0xfd];

const ALU_MNEMONICS: [&str; 8] = ["ADD A, r", "ADC A, r", "SUB r", "SBC A, r", "AND r", "XOR r", "OR r", "CP r"];
const ALU_IMM_MNEMONICS: [&str; 8] = ["ADD A, d8", "ADC A, d8", "SUB d8", "SBC A, d8", "AND d8", "XOR d8", "OR d8", "CP d8"];
const SHIFT_MNEMONICS: [&str; 8] = ["RLC r", "RRC r", "RL r", "RR r", "SLA r", "SRA r", "SWAP r", "SRL r"];

#[derive(Clone, Copy)]
pub struct Instruction {
    pub mnemonic: &'static str,
    pub handler: Handler,
    /// Machine cycles, with conditional branches counted as not taken.
    pub cycles: usize,
}

impl Instruction {
    const fn new(mnemonic: &'static str, handler: Handler, cycles: usize) -> Instruction {
        Instruction { mnemonic, handler, cycles }
    }
}

impl std::fmt::Debug for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} ({} cycles)", self.mnemonic, self.cycles)
    }
}

/// Dispatch tables for the base and $cb-prefixed opcode spaces.
#[derive(Clone)]
pub struct Sm83 {
    lut: [Instruction; 256],
    lut_prefixed: [Instruction; 256],
}

impl Sm83 {
    pub fn new() -> Sm83 {
        Sm83 {
            lut: std::array::from_fn(|opcode| decode(opcode as u8)),
            lut_prefixed: std::array::from_fn(|opcode| decode_prefixed(opcode as u8)),
        }
    }

    #[inline]
    pub fn lookup(&self, opcode: u8) -> &Instruction {
        &self.lut[opcode as usize]
    }

    #[inline]
    pub fn lookup_prefixed(&self, opcode: u8) -> &Instruction {
        &self.lut_prefixed[opcode as usize]
    }
}

impl Default for Sm83 {
    fn default() -> Sm83 {
        Sm83::new()
    }
}

fn decode(opcode: u8) -> Instruction {
    match opcode {
        0x00 => Instruction::new("NOP", Handlers::nop, 1),
        0x10 => Instruction::new("STOP", Handlers::stop, 1),
        0x76 => Instruction::new("HALT", Handlers::halt, 1),
        0xf3 => Instruction::new("DI", Handlers::di, 1),
        0xfb => Instruction::new("EI", Handlers::ei, 1),
        PREFIX_OPCODE => Instruction::new("PREFIX CB", Handlers::nop, 1),
        op if INVALID_OPCODES.contains(&op) => Instruction::new("ILLEGAL", Handlers::illegal, 1),

        // 8-bit loads
        0x36 => Instruction::new("LD (HL), d8", Handlers::ld_r8_imm8, 3),
        op if op & 0b1100_0111 == 0b0000_0110 => Instruction::new("LD r, d8", Handlers::ld_r8_imm8, 2),
        0x70..=0x77 => Instruction::new("LD (HL), r", Handlers::ld_r8_r8, 2),
        op if op & 0b1100_0111 == 0b0100_0110 => Instruction::new("LD r, (HL)", Handlers::ld_r8_r8, 2),
        0x40..=0x7f => Instruction::new("LD r, r", Handlers::ld_r8_r8, 1),
        0x02 | 0x12 => Instruction::new("LD (rr), A", Handlers::ld_indirect_a, 2),
        0x0a | 0x1a => Instruction::new("LD A, (rr)", Handlers::ld_a_indirect, 2),
        0x22 => Instruction::new("LD (HL+), A", Handlers::ld_hli_a, 2),
        0x32 => Instruction::new("LD (HL-), A", Handlers::ld_hld_a, 2),
        0x2a => Instruction::new("LD A, (HL+)", Handlers::ld_a_hli, 2),
        0x3a => Instruction::new("LD A, (HL-)", Handlers::ld_a_hld, 2),
        0xe0 => Instruction::new("LDH (a8), A", Handlers::ldh_imm8_a, 3),
        0xf0 => Instruction::new("LDH A, (a8)", Handlers::ldh_a_imm8, 3),
        0xe2 => Instruction::new("LD (C), A", Handlers::ldh_c_a, 2),
        0xf2 => Instruction::new("LD A, (C)", Handlers::ldh_a_c, 2),
        0xea => Instruction::new("LD (a16), A", Handlers::ld_imm16_a, 4),
        0xfa => Instruction::new("LD A, (a16)", Handlers::ld_a_imm16, 4),

        // 16-bit loads and arithmetic
        0x01 | 0x11 | 0x21 | 0x31 => Instruction::new("LD rr, d16", Handlers::ld_r16_imm16, 3),
        0x08 => Instruction::new("LD (a16), SP", Handlers::ld_imm16_sp, 5),
        0xf8 => Instruction::new("LD HL, SP+r8", Handlers::ld_hl_sp_offset, 3),
        0xf9 => Instruction::new("LD SP, HL", Handlers::ld_sp_hl, 2),
        0xe8 => Instruction::new("ADD SP, r8", Handlers::add_sp_offset, 4),
        0x03 | 0x13 | 0x23 | 0x33 => Instruction::new("INC rr", Handlers::inc_r16, 2),
        0x0b | 0x1b | 0x2b | 0x3b => Instruction::new("DEC rr", Handlers::dec_r16, 2),
        0x09 | 0x19 | 0x29 | 0x39 => Instruction::new("ADD HL, rr", Handlers::add_hl_r16, 2),
        0xc1 | 0xd1 | 0xe1 | 0xf1 => Instruction::new("POP rr", Handlers::pop, 3),
        0xc5 | 0xd5 | 0xe5 | 0xf5 => Instruction::new("PUSH rr", Handlers::push, 4),

        // 8-bit arithmetic
        0x34 => Instruction::new("INC (HL)", Handlers::inc_r8, 3),
        0x35 => Instruction::new("DEC (HL)", Handlers::dec_r8, 3),
        op if op & 0b1100_0111 == 0b0000_0100 => Instruction::new("INC r", Handlers::inc_r8, 1),
        op if op & 0b1100_0111 == 0b0000_0101 => Instruction::new("DEC r", Handlers::dec_r8, 1),
        0x80..=0xbf => {
            let cycles = if opcode & 0b111 == 6 { 2 } else { 1 };
            Instruction::new(ALU_MNEMONICS[(opcode as usize >> 3) & 0b111], Handlers::alu_r8, cycles)
        }
        op if op & 0b1100_0111 == 0b1100_0110 => {
            Instruction::new(ALU_IMM_MNEMONICS[(opcode as usize >> 3) & 0b111], Handlers::alu_imm8, 2)
        }
        0x27 => Instruction::new("DAA", Handlers::daa, 1),
        0x2f => Instruction::new("CPL", Handlers::cpl, 1),
        0x37 => Instruction::new("SCF", Handlers::scf, 1),
        0x3f => Instruction::new("CCF", Handlers::ccf, 1),

        // accumulator rotates
        0x07 => Instruction::new("RLCA", Handlers::rlca, 1),
        0x0f => Instruction::new("RRCA", Handlers::rrca, 1),
        0x17 => Instruction::new("RLA", Handlers::rla, 1),
        0x1f => Instruction::new("RRA", Handlers::rra, 1),

        // control flow
        0x18 => Instruction::new("JR r8", Handlers::jr, 3),
        0x20 | 0x28 | 0x30 | 0x38 => Instruction::new("JR cc, r8", Handlers::jr, 2),
        0xc3 => Instruction::new("JP a16", Handlers::jp, 4),
        0xc2 | 0xca | 0xd2 | 0xda => Instruction::new("JP cc, a16", Handlers::jp, 3),
        0xe9 => Instruction::new("JP HL", Handlers::jp_hl, 1),
        0xcd => Instruction::new("CALL a16", Handlers::call, 6),
        0xc4 | 0xcc | 0xd4 | 0xdc => Instruction::new("CALL cc, a16", Handlers::call, 3),
        0xc9 => Instruction::new("RET", Handlers::ret, 4),
        0xc0 | 0xc8 | 0xd0 | 0xd8 => Instruction::new("RET cc", Handlers::ret, 2),
        0xd9 => Instruction::new("RETI", Handlers::reti, 4),
        op if op & 0b1100_0111 == 0b1100_0111 => Instruction::new("RST", Handlers::rst, 4),

        _ => unreachable!("opcode ${:02x} is not covered by the decoder", opcode),
    }
}

fn decode_prefixed(opcode: u8) -> Instruction {
    let indirect = opcode & 0b111 == 6;

    match opcode >> 6 {
        0 => Instruction::new(
            SHIFT_MNEMONICS[(opcode as usize >> 3) & 0b111],
            Handlers::shift,
            if indirect { 4 } else { 2 },
        ),
        1 => Instruction::new("BIT n, r", Handlers::bit, if indirect { 3 } else { 2 }),
        2 => Instruction::new("RES n, r", Handlers::res, if indirect { 4 } else { 2 }),
        _ => Instruction::new("SET n, r", Handlers::set, if indirect { 4 } else { 2 }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoder_covers_every_opcode() {
        let sm83 = Sm83::new();
        for opcode in 0..=255u8 {
            assert!(sm83.lookup(opcode).cycles > 0);
            assert!(sm83.lookup_prefixed(opcode).cycles >= 2);
        }
    }

    #[test]
    fn invalid_opcodes_decode_as_illegal() {
        let sm83 = Sm83::new();
        for opcode in INVALID_OPCODES {
            assert_eq!(sm83.lookup(opcode).mnemonic, "ILLEGAL");
            assert_eq!(sm83.lookup(opcode).cycles, 1);
        }
        assert_eq!(sm83.lookup(0xd2).mnemonic, "JP cc, a16");
    }

    #[test]
    fn memory_operands_cost_extra_cycles() {
        let sm83 = Sm83::new();
        assert_eq!(sm83.lookup(0x41).cycles, 1);
        assert_eq!(sm83.lookup(0x46).cycles, 2);
        assert_eq!(sm83.lookup(0x77).cycles, 2);
        assert_eq!(sm83.lookup(0x86).cycles, 2);
        assert_eq!(sm83.lookup(0x34).cycles, 3);
        assert_eq!(sm83.lookup_prefixed(0x46).cycles, 3);
        assert_eq!(sm83.lookup_prefixed(0x86).cycles, 4);
        assert_eq!(sm83.lookup_prefixed(0x11).cycles, 2);
    }
}
