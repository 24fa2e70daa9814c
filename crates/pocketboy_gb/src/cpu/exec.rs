//! Opcode dispatch.
//!
//! One match over the dense id space routes every instruction to a
//! parameterised handler; the regular LD/ALU/CB blocks decode their operand
//! from the id's bit fields instead of enumerating 64 arms each.

use super::{Cpu, Operand, Reg16, Reg8};
use crate::bus::Bus;
use crate::error::Error;
use crate::opcodes;

const ACC: Operand = Operand::Reg(Reg8::A);

mod alu;
mod cb;
mod control;
mod ld;

pub(super) use cb::{Direction, ShiftContext, ShiftKind};
pub(super) use control::Cond;

/// BC/DE/HL/SP from bits 4-5, as used by the d16 load, INC/DEC and
/// ADD HL rows.
fn wide_pair(id: u16) -> Reg16 {
    match (id >> 4) & 3 {
        0 => Reg16::BC,
        1 => Reg16::DE,
        2 => Reg16::HL,
        _ => Reg16::SP,
    }
}

/// BC/DE/HL/AF from bits 4-5, as used by PUSH and POP.
fn stack_pair(id: u16) -> Reg16 {
    match (id >> 4) & 3 {
        0 => Reg16::BC,
        1 => Reg16::DE,
        2 => Reg16::HL,
        _ => Reg16::AF,
    }
}

impl Cpu {
    pub(super) fn exec(&mut self, bus: &mut Bus, id: u16) -> Result<(), Error> {
        use self::Direction::{Left, Right};
        use self::ShiftContext::Accumulator;
        use self::ShiftKind::{Rotate, ThroughCarry};

        let dst = Operand::from_code((id >> 3) as u8);
        let src = Operand::from_code(id as u8);

        match id {
            0x00 => {
                self.cycles.add(1, 4);
                Ok(())
            }
            0x01 | 0x11 | 0x21 | 0x31 => self.ld16_imm(bus, wide_pair(id)),
            0x02 => self.ld8(bus, Operand::Mem(Reg16::BC), ACC),
            0x0A => self.ld8(bus, ACC, Operand::Mem(Reg16::BC)),
            0x12 => self.ld8(bus, Operand::Mem(Reg16::DE), ACC),
            0x1A => self.ld8(bus, ACC, Operand::Mem(Reg16::DE)),
            0x03 | 0x13 | 0x23 | 0x33 => self.inc16(wide_pair(id)),
            0x0B | 0x1B | 0x2B | 0x3B => self.dec16(wide_pair(id)),
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => self.inc8(bus, dst),
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => self.dec8(bus, dst),
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => self.ld8_imm(bus, dst),
            0x07 => self.shift8(bus, ACC, Left, Rotate, Accumulator),
            0x0F => self.shift8(bus, ACC, Right, Rotate, Accumulator),
            0x17 => self.shift8(bus, ACC, Left, ThroughCarry, Accumulator),
            0x1F => self.shift8(bus, ACC, Right, ThroughCarry, Accumulator),
            0x08 => self.ld_a16_sp(bus),
            0x09 | 0x19 | 0x29 | 0x39 => self.add16_hl(wide_pair(id)),
            0x10 | 0x76 => self.halt(),
            0x18 => self.jr(bus, Cond::Always),
            0x20 => self.jr(bus, Cond::NotZero),
            0x28 => self.jr(bus, Cond::Zero),
            0x30 => self.jr(bus, Cond::NotCarry),
            0x38 => self.jr(bus, Cond::Carry),
            0x22 => self.ld_hl_step(bus, false, 1),
            0x2A => self.ld_hl_step(bus, true, 1),
            0x32 => self.ld_hl_step(bus, false, -1),
            0x3A => self.ld_hl_step(bus, true, -1),
            0x27 => self.daa(),
            0x2F => self.cpl(),
            0x37 => self.set_carry(false),
            0x3F => self.set_carry(true),
            0x40..=0x7F => self.ld8(bus, dst, src),
            0x80..=0x87 => self.add8(bus, src, false),
            0x88..=0x8F => self.add8(bus, src, true),
            0x90..=0x97 => self.sub8(bus, src, false, true),
            0x98..=0x9F => self.sub8(bus, src, true, true),
            0xA0..=0xA7 => self.and8(bus, src),
            0xA8..=0xAF => self.xor8(bus, src),
            0xB0..=0xB7 => self.or8(bus, src),
            0xB8..=0xBF => self.sub8(bus, src, false, false),
            0xC0 => self.ret_cond(bus, Cond::NotZero),
            0xC8 => self.ret_cond(bus, Cond::Zero),
            0xD0 => self.ret_cond(bus, Cond::NotCarry),
            0xD8 => self.ret_cond(bus, Cond::Carry),
            0xC9 => self.ret(bus),
            0xD9 => self.reti(bus),
            0xC1 | 0xD1 | 0xE1 | 0xF1 => self.pop16(bus, stack_pair(id)),
            0xC5 | 0xD5 | 0xE5 | 0xF5 => self.push16(bus, stack_pair(id)),
            0xC2 => self.jp(bus, Cond::NotZero),
            0xCA => self.jp(bus, Cond::Zero),
            0xD2 => self.jp(bus, Cond::NotCarry),
            0xDA => self.jp(bus, Cond::Carry),
            0xC3 => self.jp(bus, Cond::Always),
            0xE9 => self.jp_hl(),
            0xC4 => self.call(bus, Cond::NotZero),
            0xCC => self.call(bus, Cond::Zero),
            0xD4 => self.call(bus, Cond::NotCarry),
            0xDC => self.call(bus, Cond::Carry),
            0xCD => self.call(bus, Cond::Always),
            0xC6 => self.add8_imm(bus, false),
            0xCE => self.add8_imm(bus, true),
            0xD6 => self.sub8_imm(bus, false, true),
            0xDE => self.sub8_imm(bus, true, true),
            0xE6 => self.and8_imm(bus),
            0xEE => self.xor8_imm(bus),
            0xF6 => self.or8_imm(bus),
            0xFE => self.sub8_imm(bus, false, false),
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                self.rst(bus, (id & 0x38) as u16)
            }
            0xE0 => self.ldh_a8(bus, true),
            0xF0 => self.ldh_a8(bus, false),
            0xE2 => self.ld8(bus, Operand::HighC, ACC),
            0xF2 => self.ld8(bus, ACC, Operand::HighC),
            0xE8 => self.add_sp_r8(bus),
            0xF8 => self.ld_hl_sp_r8(bus),
            0xF9 => self.ld_sp_hl(),
            0xEA => self.ld_a16_a(bus, true),
            0xFA => self.ld_a16_a(bus, false),
            0xF3 => self.set_ime(false),
            0xFB => self.set_ime(true),
            // 0xCB itself never reaches here via step(); treat a direct call
            // like an unassigned slot.
            0xCB | 0xD3 | 0xDB | 0xDD | 0xE3 | 0xE4 | 0xEB | 0xEC | 0xED | 0xF4 | 0xFC | 0xFD => {
                Err(self.decode_error(id))
            }
            0x100..=0x1FF => self.exec_cb(bus, (id & 0xFF) as u8),
            _ => panic!("opcode id 0x{id:03X} out of range"),
        }
    }

    fn exec_cb(&mut self, bus: &mut Bus, op: u8) -> Result<(), Error> {
        use self::Direction::{Left, Right};
        use self::ShiftContext::General;
        use self::ShiftKind::{Rotate, Shift, SignExtend, ThroughCarry};

        let operand = Operand::from_code(op);
        let bit = (op >> 3) & 7;
        match op >> 6 {
            0 => match bit {
                0 => self.shift8(bus, operand, Left, Rotate, General),
                1 => self.shift8(bus, operand, Right, Rotate, General),
                2 => self.shift8(bus, operand, Left, ThroughCarry, General),
                3 => self.shift8(bus, operand, Right, ThroughCarry, General),
                4 => self.shift8(bus, operand, Left, Shift, General),
                5 => self.shift8(bus, operand, Right, SignExtend, General),
                6 => self.swap8(bus, operand),
                _ => self.shift8(bus, operand, Right, Shift, General),
            },
            1 => self.bit_test(bus, operand, bit),
            2 => self.bit_assign(bus, operand, bit, false),
            _ => self.bit_assign(bus, operand, bit, true),
        }
    }

    fn decode_error(&self, id: u16) -> Error {
        // PC already advanced past the opcode byte(s).
        let fetched = if id > 0xFF { 2 } else { 1 };
        Error::Decode {
            opcode: id,
            mnemonic: opcodes::OPCODES[id as usize].mnemonic.to_string(),
            pc: self.pc.value().wrapping_sub(fetched),
        }
    }
}
