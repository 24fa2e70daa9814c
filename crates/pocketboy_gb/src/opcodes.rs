//! Static metadata for the full opcode catalogue.
//!
//! Ids are dense: 0x000-0x0FF is the base page, 0x100-0x1FF the CB-prefixed
//! page. Every id has an entry, including the 11 unassigned base slots,
//! so a decode error can always name what it hit. Execution lives in
//! [`crate::cpu`]; this table only carries the disassembly mnemonic, the
//! instruction width and the registers worth showing in a trace line.

use std::borrow::Cow;
use std::fmt;

use lazy_static::lazy_static;

use crate::cpu::{Reg16, Reg8};

/// First byte of every two-byte opcode.
pub const CB_PREFIX: u8 = 0xCB;

/// Base-page ids with no instruction assigned. Fetching one is a fatal
/// decode error.
pub const ILLEGAL_OPCODES: [u8; 11] = [
    0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD,
];

/// A register shown on an instruction trace line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TracedReg {
    R8(Reg8),
    R16(Reg16),
    /// Byte addressed through a pair, e.g. (HL).
    Ind(Reg16),
    /// Byte at FF00+C.
    HighC,
}

impl fmt::Display for TracedReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TracedReg::R8(r) => write!(f, "{r:?}"),
            TracedReg::R16(r) => write!(f, "{r:?}"),
            TracedReg::Ind(r) => write!(f, "({r:?})"),
            TracedReg::HighC => write!(f, "(C)"),
        }
    }
}

/// Per-opcode metadata.
pub struct OpcodeInfo {
    /// Disassembly mnemonic with immediate placeholders (d8, d16, a8, a16,
    /// r8) still in place.
    pub mnemonic: Cow<'static, str>,
    /// Instruction width in bytes, counting the opcode byte but not the CB
    /// prefix. Width minus one is the number of immediate bytes.
    pub width: u8,
    /// Registers to show when tracing this instruction.
    pub regs: Vec<TracedReg>,
}

lazy_static! {
    /// All 512 opcode ids, indexed densely.
    pub static ref OPCODES: Vec<OpcodeInfo> = {
        let mut table = Vec::with_capacity(512);
        for op in 0..=0xFFu8 {
            table.push(base_info(op));
        }
        for op in 0..=0xFFu8 {
            table.push(cb_info(op));
        }
        table
    };
}

fn info(mnemonic: impl Into<Cow<'static, str>>, width: u8, regs: Vec<TracedReg>) -> OpcodeInfo {
    OpcodeInfo {
        mnemonic: mnemonic.into(),
        width,
        regs,
    }
}

/// Operand name for a 3-bit register code, as used by the generated
/// LD/ALU/CB mnemonics.
fn operand_name(code: u8) -> &'static str {
    match code & 7 {
        0 => "B",
        1 => "C",
        2 => "D",
        3 => "E",
        4 => "H",
        5 => "L",
        6 => "(HL)",
        _ => "A",
    }
}

fn operand_traced(code: u8) -> TracedReg {
    match code & 7 {
        0 => TracedReg::R8(Reg8::B),
        1 => TracedReg::R8(Reg8::C),
        2 => TracedReg::R8(Reg8::D),
        3 => TracedReg::R8(Reg8::E),
        4 => TracedReg::R8(Reg8::H),
        5 => TracedReg::R8(Reg8::L),
        6 => TracedReg::Ind(Reg16::HL),
        _ => TracedReg::R8(Reg8::A),
    }
}

fn base_info(op: u8) -> OpcodeInfo {
    use Reg16::*;
    use Reg8::*;
    use TracedReg::{HighC, Ind, R16, R8};

    match op {
        0x00 => info("NOP", 1, vec![]),
        0x01 => info("LD  BC,d16", 3, vec![R16(BC)]),
        0x02 => info("LD  (BC),A", 1, vec![Ind(BC), R8(A)]),
        0x03 => info("INC BC", 1, vec![R16(BC)]),
        0x04 => info("INC B", 1, vec![R8(B)]),
        0x05 => info("DEC B", 1, vec![R8(B)]),
        0x06 => info("LD  B,d8", 2, vec![R8(B)]),
        0x07 => info("RLCA", 1, vec![R8(A)]),
        0x08 => info("LD  (a16),SP", 3, vec![R16(SP)]),
        0x09 => info("ADD HL,BC", 1, vec![R16(HL), R16(BC)]),
        0x0A => info("LD  A,(BC)", 1, vec![R8(A), Ind(BC)]),
        0x0B => info("DEC BC", 1, vec![R16(BC)]),
        0x0C => info("INC C", 1, vec![R8(C)]),
        0x0D => info("DEC C", 1, vec![R8(C)]),
        0x0E => info("LD  C,d8", 2, vec![R8(C)]),
        0x0F => info("RRCA", 1, vec![R8(A)]),
        0x10 => info("STOP", 1, vec![]),
        0x11 => info("LD  DE,d16", 3, vec![R16(DE)]),
        0x12 => info("LD  (DE),A", 1, vec![Ind(DE), R8(A)]),
        0x13 => info("INC DE", 1, vec![R16(DE)]),
        0x14 => info("INC D", 1, vec![R8(D)]),
        0x15 => info("DEC D", 1, vec![R8(D)]),
        0x16 => info("LD  D,d8", 2, vec![R8(D)]),
        0x17 => info("RLA", 1, vec![R8(A)]),
        0x18 => info("JR  r8", 2, vec![]),
        0x19 => info("ADD HL,DE", 1, vec![R16(HL), R16(DE)]),
        0x1A => info("LD  A,(DE)", 1, vec![R8(A), Ind(DE)]),
        0x1B => info("DEC DE", 1, vec![R16(DE)]),
        0x1C => info("INC E", 1, vec![R8(E)]),
        0x1D => info("DEC E", 1, vec![R8(E)]),
        0x1E => info("LD  E,d8", 2, vec![R8(E)]),
        0x1F => info("RRA", 1, vec![R8(A)]),
        0x20 => info("JR  NZ,r8", 2, vec![]),
        0x21 => info("LD  HL,d16", 3, vec![R16(HL)]),
        0x22 => info("LDI (HL),A", 1, vec![Ind(HL), R8(A)]),
        0x23 => info("INC HL", 1, vec![R16(HL)]),
        0x24 => info("INC H", 1, vec![R8(H)]),
        0x25 => info("DEC H", 1, vec![R8(H)]),
        0x26 => info("LD  H,d8", 2, vec![R8(H)]),
        0x27 => info("DAA", 1, vec![R8(A)]),
        0x28 => info("JR  Z,r8", 2, vec![]),
        0x29 => info("ADD HL,HL", 1, vec![R16(HL)]),
        0x2A => info("LDI A,(HL)", 1, vec![R8(A), Ind(HL)]),
        0x2B => info("DEC HL", 1, vec![R16(HL)]),
        0x2C => info("INC L", 1, vec![R8(L)]),
        0x2D => info("DEC L", 1, vec![R8(L)]),
        0x2E => info("LD  L,d8", 2, vec![R8(L)]),
        0x2F => info("CPL", 1, vec![R8(A)]),
        0x30 => info("JR  NC,r8", 2, vec![]),
        0x31 => info("LD  SP,d16", 3, vec![R16(SP)]),
        0x32 => info("LDD (HL),A", 1, vec![Ind(HL), R8(A)]),
        0x33 => info("INC SP", 1, vec![R16(SP)]),
        0x34 => info("INC (HL)", 1, vec![Ind(HL)]),
        0x35 => info("DEC (HL)", 1, vec![Ind(HL)]),
        0x36 => info("LD  (HL),d8", 2, vec![Ind(HL)]),
        0x37 => info("SCF", 1, vec![]),
        0x38 => info("JR  C,r8", 2, vec![]),
        0x39 => info("ADD HL,SP", 1, vec![R16(HL), R16(SP)]),
        0x3A => info("LDD A,(HL)", 1, vec![R8(A), Ind(HL)]),
        0x3B => info("DEC SP", 1, vec![R16(SP)]),
        0x3C => info("INC A", 1, vec![R8(A)]),
        0x3D => info("DEC A", 1, vec![R8(A)]),
        0x3E => info("LD  A,d8", 2, vec![R8(A)]),
        0x3F => info("CCF", 1, vec![]),
        0x76 => info("HALT", 1, vec![]),
        // LD r,r'
        0x40..=0x7F => {
            let dst = (op >> 3) & 7;
            let src = op & 7;
            let mut regs = vec![operand_traced(dst)];
            if src != dst {
                regs.push(operand_traced(src));
            }
            info(
                format!("LD {},{}", operand_name(dst), operand_name(src)),
                1,
                regs,
            )
        }
        // Accumulator arithmetic and logic
        0x80..=0xBF => {
            let family = match (op >> 3) & 7 {
                0 => "ADD",
                1 => "ADC",
                2 => "SUB",
                3 => "SBC",
                4 => "AND",
                5 => "XOR",
                6 => "OR",
                _ => "CP",
            };
            let src = op & 7;
            let mut regs = vec![R8(A)];
            if src & 7 != 7 {
                regs.push(operand_traced(src));
            }
            info(format!("{:<3} A,{}", family, operand_name(src)), 1, regs)
        }
        0xC0 => info("RET NZ", 1, vec![]),
        0xC1 => info("POP BC", 1, vec![R16(BC)]),
        0xC2 => info("JP  NZ,a16", 3, vec![]),
        0xC3 => info("JP  a16", 3, vec![]),
        0xC4 => info("CALL NZ,a16", 3, vec![]),
        0xC5 => info("PUSH BC", 1, vec![R16(BC)]),
        0xC6 => info("ADD A,d8", 2, vec![R8(A)]),
        0xC7 => info("RST 00h", 1, vec![]),
        0xC8 => info("RET Z", 1, vec![]),
        0xC9 => info("RET", 1, vec![]),
        0xCA => info("JP  Z,a16", 3, vec![]),
        0xCB => info("PREFIX CB", 1, vec![]),
        0xCC => info("CALL Z,a16", 3, vec![]),
        0xCD => info("CALL a16", 3, vec![]),
        0xCE => info("ADC A,d8", 2, vec![R8(A)]),
        0xCF => info("RST 08h", 1, vec![]),
        0xD0 => info("RET NC", 1, vec![]),
        0xD1 => info("POP DE", 1, vec![R16(DE)]),
        0xD2 => info("JP  NC,a16", 3, vec![]),
        0xD4 => info("CALL NC,a16", 3, vec![]),
        0xD5 => info("PUSH DE", 1, vec![R16(DE)]),
        0xD6 => info("SUB A,d8", 2, vec![R8(A)]),
        0xD7 => info("RST 10h", 1, vec![]),
        0xD8 => info("RET C", 1, vec![]),
        0xD9 => info("RETI", 1, vec![]),
        0xDA => info("JP  C,a16", 3, vec![]),
        0xDC => info("CALL C,a16", 3, vec![]),
        0xDE => info("SBC A,d8", 2, vec![R8(A)]),
        0xDF => info("RST 18h", 1, vec![]),
        0xE0 => info("LDH (a8),A", 2, vec![R8(A)]),
        0xE1 => info("POP HL", 1, vec![R16(HL)]),
        0xE2 => info("LD  (C),A", 1, vec![HighC, R8(A)]),
        0xE5 => info("PUSH HL", 1, vec![R16(HL)]),
        0xE6 => info("AND A,d8", 2, vec![R8(A)]),
        0xE7 => info("RST 20h", 1, vec![]),
        0xE8 => info("ADD SP,r8", 2, vec![R16(SP)]),
        0xE9 => info("JP  (HL)", 1, vec![R16(HL)]),
        0xEA => info("LD  (a16),A", 3, vec![R8(A)]),
        0xEE => info("XOR A,d8", 2, vec![R8(A)]),
        0xEF => info("RST 28h", 1, vec![]),
        0xF0 => info("LDH A,(a8)", 2, vec![R8(A)]),
        0xF1 => info("POP AF", 1, vec![R16(AF)]),
        0xF2 => info("LD  A,(C)", 1, vec![R8(A), HighC]),
        0xF3 => info("DI", 1, vec![]),
        0xF5 => info("PUSH AF", 1, vec![R16(AF)]),
        0xF6 => info("OR  A,d8", 2, vec![R8(A)]),
        0xF7 => info("RST 30h", 1, vec![]),
        0xF8 => info("LD  HL,SP+r8", 2, vec![R16(HL), R16(SP)]),
        0xF9 => info("LD  SP,HL", 1, vec![R16(SP), R16(HL)]),
        0xFA => info("LD  A,(a16)", 3, vec![R8(A)]),
        0xFB => info("EI", 1, vec![]),
        0xFE => info("CP  A,d8", 2, vec![R8(A)]),
        0xFF => info("RST 38h", 1, vec![]),
        0xD3 | 0xDB | 0xDD | 0xE3 | 0xE4 | 0xEB | 0xEC | 0xED | 0xF4 | 0xFC | 0xFD => {
            info("<invalid opcode>", 1, vec![])
        }
    }
}

fn cb_info(op: u8) -> OpcodeInfo {
    let operand = op & 7;
    let regs = vec![operand_traced(operand)];
    let mnemonic = match op >> 6 {
        0 => {
            let family = match (op >> 3) & 7 {
                0 => "RLC",
                1 => "RRC",
                2 => "RL",
                3 => "RR",
                4 => "SLA",
                5 => "SRA",
                6 => "SWAP",
                _ => "SRL",
            };
            format!("{:<3} {}", family, operand_name(operand))
        }
        group => {
            let family = match group {
                1 => "BIT",
                2 => "RES",
                _ => "SET",
            };
            format!("{} {},{}", family, (op >> 3) & 7, operand_name(operand))
        }
    };
    info(mnemonic, 1, regs)
}

/// Render a mnemonic with its immediate placeholder substituted.
///
/// `imm` holds the instruction's immediate bytes in fetch order; too few
/// bytes leaves the placeholder as-is.
pub fn disassemble(id: u16, imm: &[u8]) -> String {
    let mnemonic = OPCODES[id as usize].mnemonic.as_ref();
    if mnemonic.contains("d16") || mnemonic.contains("a16") {
        if let [low, high, ..] = *imm {
            let value = u16::from_le_bytes([low, high]);
            return mnemonic
                .replace("d16", &format!("{value:04X}"))
                .replace("a16", &format!("{value:04X}"));
        }
    } else if let [byte, ..] = *imm {
        if mnemonic.contains("a8") {
            return mnemonic.replace("a8", &format!("FF{byte:02X}"));
        }
        if mnemonic.contains("d8") {
            return mnemonic.replace("d8", &format!("{byte:02X}"));
        }
        if mnemonic.contains("r8") {
            return mnemonic.replace("r8", &format!("{:+}", byte as i8));
        }
    }
    mnemonic.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_every_id() {
        assert_eq!(OPCODES.len(), 512);
        for entry in OPCODES.iter() {
            assert!(!entry.mnemonic.is_empty());
            assert!((1..=3).contains(&entry.width));
        }
    }

    #[test]
    fn illegal_slots_are_marked() {
        for op in ILLEGAL_OPCODES {
            assert_eq!(OPCODES[op as usize].mnemonic, "<invalid opcode>");
        }
        // And nothing else is.
        let marked = OPCODES
            .iter()
            .filter(|e| e.mnemonic == "<invalid opcode>")
            .count();
        assert_eq!(marked, ILLEGAL_OPCODES.len());
    }

    #[test]
    fn generated_mnemonics_match_convention() {
        assert_eq!(OPCODES[0x41].mnemonic, "LD B,C");
        assert_eq!(OPCODES[0x77].mnemonic, "LD (HL),A");
        assert_eq!(OPCODES[0x88].mnemonic, "ADC A,B");
        assert_eq!(OPCODES[0xB8].mnemonic, "CP  A,B");
        assert_eq!(OPCODES[0x101].mnemonic, "RLC C");
        assert_eq!(OPCODES[0x111].mnemonic, "RL  C");
        assert_eq!(OPCODES[0x116].mnemonic, "RL  (HL)");
        assert_eq!(OPCODES[0x136].mnemonic, "SWAP (HL)");
        assert_eq!(OPCODES[0x17F].mnemonic, "BIT 7,A");
        assert_eq!(OPCODES[0x1FF].mnemonic, "SET 7,A");
    }

    #[test]
    fn disassembly_substitutes_immediates() {
        assert_eq!(disassemble(0x01, &[0x34, 0x12]), "LD  BC,1234");
        assert_eq!(disassemble(0x3E, &[0xAB]), "LD  A,AB");
        assert_eq!(disassemble(0xE0, &[0x44]), "LDH (FF44),A");
        assert_eq!(disassemble(0x18, &[0xFE]), "JR  -2");
        assert_eq!(disassemble(0x00, &[]), "NOP");
        assert_eq!(disassemble(0x01, &[]), "LD  BC,d16");
    }
}
