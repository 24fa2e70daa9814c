//! Rotates, shifts, SWAP and single-bit operations.
//!
//! One parameterised shifter covers RLCA/RRCA/RLA/RRA and the whole CB
//! rotate block: the accumulator short forms differ only in cycle cost and
//! in leaving the zero flag untouched.

use crate::bus::Bus;
use crate::cpu::{Cpu, Flags, Operand};
use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    Left,
    Right,
}

/// What happens to the vacated bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ShiftKind {
    /// RLC/RRC: the shifted-out bit wraps around.
    Rotate,
    /// RL/RR: the old carry flag fills the gap.
    ThroughCarry,
    /// SLA/SRL: the gap fills with zero.
    Shift,
    /// SRA: the sign bit is repeated.
    SignExtend,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ShiftContext {
    /// One-byte accumulator form; zero flag untouched.
    Accumulator,
    /// CB-prefixed form; zero flag reflects the result.
    General,
}

impl Cpu {
    pub(super) fn shift8(
        &mut self,
        bus: &mut Bus,
        operand: Operand,
        dir: Direction,
        kind: ShiftKind,
        ctx: ShiftContext,
    ) -> Result<(), Error> {
        self.operand_surcharge(operand);
        let old = self.get8(bus, operand)?;
        let (mut result, shifted_out) = match dir {
            Direction::Left => (old << 1, old >> 7),
            Direction::Right => (old >> 1, old & 1),
        };
        match kind {
            ShiftKind::Rotate => match dir {
                Direction::Left => result |= shifted_out,
                Direction::Right => result |= shifted_out << 7,
            },
            ShiftKind::ThroughCarry => {
                if self.flags.carry {
                    result |= match dir {
                        Direction::Left => 0x01,
                        Direction::Right => 0x80,
                    };
                }
            }
            ShiftKind::Shift => {}
            ShiftKind::SignExtend => result |= old & 0x80,
        }
        self.set8(bus, operand, result)?;
        self.flags = Flags {
            zero: match ctx {
                ShiftContext::Accumulator => self.flags.zero,
                ShiftContext::General => result == 0,
            },
            subtract: false,
            half_carry: false,
            carry: shifted_out != 0,
        };
        match ctx {
            ShiftContext::Accumulator => self.cycles.add(1, 4),
            ShiftContext::General => self.cycles.add(2, 8),
        }
        Ok(())
    }

    pub(super) fn swap8(&mut self, bus: &mut Bus, operand: Operand) -> Result<(), Error> {
        self.operand_surcharge(operand);
        let old = self.get8(bus, operand)?;
        let result = old.rotate_left(4);
        self.set8(bus, operand, result)?;
        self.flags = Flags {
            zero: result == 0,
            subtract: false,
            half_carry: false,
            carry: false,
        };
        self.cycles.add(2, 8);
        Ok(())
    }

    /// BIT n: zero flag mirrors the complement of the tested bit, carry is
    /// preserved.
    pub(super) fn bit_test(&mut self, bus: &mut Bus, operand: Operand, bit: u8) -> Result<(), Error> {
        self.operand_surcharge(operand);
        let value = self.get8(bus, operand)?;
        self.flags = Flags {
            zero: value & (1 << bit) == 0,
            subtract: false,
            half_carry: true,
            carry: self.flags.carry,
        };
        self.cycles.add(2, 8);
        Ok(())
    }

    /// SET/RES n: pure read-modify-write, flags untouched.
    pub(super) fn bit_assign(
        &mut self,
        bus: &mut Bus,
        operand: Operand,
        bit: u8,
        set: bool,
    ) -> Result<(), Error> {
        let old = self.get8(bus, operand)?;
        let result = if set {
            old | 1 << bit
        } else {
            old & !(1 << bit)
        };
        self.operand_surcharge(operand);
        self.set8(bus, operand, result)?;
        self.cycles.add(2, 8);
        Ok(())
    }
}
