//! Register file, flag semantics and the fetch/decode/execute loop.

use std::fmt;

use crate::bus::Bus;
use crate::error::Error;
use crate::opcodes::CB_PREFIX;
#[cfg(feature = "cpu-trace")]
use crate::opcodes::{self, TracedReg};

mod exec;

#[cfg(test)]
mod tests;

/// A 16-bit register pair with byte-level access to both halves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Register(u16);

impl Register {
    pub fn new(value: u16) -> Self {
        Register(value)
    }

    #[inline]
    pub fn value(self) -> u16 {
        self.0
    }

    #[inline]
    pub fn set_value(&mut self, value: u16) {
        self.0 = value;
    }

    #[inline]
    pub fn high(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub fn low(self) -> u8 {
        self.0 as u8
    }

    #[inline]
    pub fn set_high(&mut self, value: u8) {
        self.0 = (u16::from(value) << 8) | (self.0 & 0x00FF);
    }

    #[inline]
    pub fn set_low(&mut self, value: u8) {
        self.0 = (self.0 & 0xFF00) | u16::from(value);
    }
}

/// The four ALU flags, stored unpacked. They only take their F-register bit
/// positions when packed through [`Flags::to_byte`] (PUSH AF and traces).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flags {
    pub zero: bool,
    pub subtract: bool,
    pub half_carry: bool,
    pub carry: bool,
}

impl Flags {
    /// Pack into the F-register layout: Z at bit 7, N at 6, H at 5, C at 4.
    /// The low nibble always reads as zero.
    pub fn to_byte(self) -> u8 {
        (u8::from(self.zero) << 7)
            | (u8::from(self.subtract) << 6)
            | (u8::from(self.half_carry) << 5)
            | (u8::from(self.carry) << 4)
    }

    pub fn from_byte(byte: u8) -> Self {
        Flags {
            zero: byte & 0x80 != 0,
            subtract: byte & 0x40 != 0,
            half_carry: byte & 0x20 != 0,
            carry: byte & 0x10 != 0,
        }
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            if self.zero { 'Z' } else { '-' },
            if self.subtract { 'N' } else { '-' },
            if self.half_carry { 'H' } else { '-' },
            if self.carry { 'C' } else { '-' },
        )
    }
}

/// Named 8-bit registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reg8 {
    A,
    B,
    C,
    D,
    E,
    H,
    L,
}

/// Named 16-bit register pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reg16 {
    AF,
    BC,
    DE,
    HL,
    SP,
    PC,
}

/// An 8-bit instruction operand: either a register or a memory byte reached
/// through one of the addressing modes. Memory operands carry an extra cycle
/// surcharge on top of the instruction's base cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    Reg(Reg8),
    /// Byte addressed by a pair, only ever BC, DE or HL.
    Mem(Reg16),
    /// Byte at FF00+C.
    HighC,
}

impl Operand {
    /// Decode the 3-bit register code shared by the LD, ALU and CB opcode
    /// blocks: B C D E H L (HL) A.
    pub(crate) fn from_code(code: u8) -> Operand {
        match code & 7 {
            0 => Operand::Reg(Reg8::B),
            1 => Operand::Reg(Reg8::C),
            2 => Operand::Reg(Reg8::D),
            3 => Operand::Reg(Reg8::E),
            4 => Operand::Reg(Reg8::H),
            5 => Operand::Reg(Reg8::L),
            6 => Operand::Mem(Reg16::HL),
            _ => Operand::Reg(Reg8::A),
        }
    }
}

/// Dual cycle counters.
///
/// `machine` advances roughly per byte fetched plus addressing surcharges;
/// `cpu` counts DMG T-cycles. Both saturate only at u64 range, which no
/// realistic run approaches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cycles {
    pub machine: u64,
    pub cpu: u64,
}

impl Cycles {
    #[inline]
    fn add(&mut self, machine: u64, cpu: u64) {
        self.machine += machine;
        self.cpu += cpu;
    }
}

/// The CPU: accumulator, flags, register pairs, interrupt master enable,
/// halt latch and cycle counters.
#[derive(Clone, Debug, Default)]
pub struct Cpu {
    pub a: u8,
    pub flags: Flags,
    pub bc: Register,
    pub de: Register,
    pub hl: Register,
    pub sp: Register,
    pub pc: Register,
    pub ime: bool,
    pub halted: bool,
    pub cycles: Cycles,
}

impl Cpu {
    pub fn new() -> Self {
        Cpu::default()
    }

    /// AF packs the accumulator with the flag bits.
    #[inline]
    pub fn af(&self) -> u16 {
        (u16::from(self.a) << 8) | u16::from(self.flags.to_byte())
    }

    /// Unpacking ignores the low nibble of F, which does not exist in
    /// hardware.
    #[inline]
    pub fn set_af(&mut self, value: u16) {
        self.a = (value >> 8) as u8;
        self.flags = Flags::from_byte(value as u8);
    }

    pub fn get16(&self, pair: Reg16) -> u16 {
        match pair {
            Reg16::AF => self.af(),
            Reg16::BC => self.bc.value(),
            Reg16::DE => self.de.value(),
            Reg16::HL => self.hl.value(),
            Reg16::SP => self.sp.value(),
            Reg16::PC => self.pc.value(),
        }
    }

    pub fn set16(&mut self, pair: Reg16, value: u16) {
        match pair {
            Reg16::AF => self.set_af(value),
            Reg16::BC => self.bc.set_value(value),
            Reg16::DE => self.de.set_value(value),
            Reg16::HL => self.hl.set_value(value),
            Reg16::SP => self.sp.set_value(value),
            Reg16::PC => self.pc.set_value(value),
        }
    }

    pub fn get8(&self, bus: &Bus, operand: Operand) -> Result<u8, Error> {
        match operand {
            Operand::Reg(Reg8::A) => Ok(self.a),
            Operand::Reg(Reg8::B) => Ok(self.bc.high()),
            Operand::Reg(Reg8::C) => Ok(self.bc.low()),
            Operand::Reg(Reg8::D) => Ok(self.de.high()),
            Operand::Reg(Reg8::E) => Ok(self.de.low()),
            Operand::Reg(Reg8::H) => Ok(self.hl.high()),
            Operand::Reg(Reg8::L) => Ok(self.hl.low()),
            Operand::Mem(pair) => bus.read(self.indirect_addr(pair)),
            Operand::HighC => bus.read(0xFF00 | u16::from(self.bc.low())),
        }
    }

    pub fn set8(&mut self, bus: &mut Bus, operand: Operand, value: u8) -> Result<(), Error> {
        match operand {
            Operand::Reg(Reg8::A) => {
                self.a = value;
                Ok(())
            }
            Operand::Reg(Reg8::B) => {
                self.bc.set_high(value);
                Ok(())
            }
            Operand::Reg(Reg8::C) => {
                self.bc.set_low(value);
                Ok(())
            }
            Operand::Reg(Reg8::D) => {
                self.de.set_high(value);
                Ok(())
            }
            Operand::Reg(Reg8::E) => {
                self.de.set_low(value);
                Ok(())
            }
            Operand::Reg(Reg8::H) => {
                self.hl.set_high(value);
                Ok(())
            }
            Operand::Reg(Reg8::L) => {
                self.hl.set_low(value);
                Ok(())
            }
            Operand::Mem(pair) => bus.write(self.indirect_addr(pair), value),
            Operand::HighC => bus.write(0xFF00 | u16::from(self.bc.low()), value),
        }
    }

    fn indirect_addr(&self, pair: Reg16) -> u16 {
        match pair {
            Reg16::BC => self.bc.value(),
            Reg16::DE => self.de.value(),
            Reg16::HL => self.hl.value(),
            // No instruction encodes these; hitting this is a decoder bug.
            other => panic!("{other:?} is not an indirect addressing pair"),
        }
    }

    /// Extra cycle cost of a memory-side operand, charged once per operand
    /// on top of the instruction's base cost.
    fn operand_surcharge(&mut self, operand: Operand) {
        match operand {
            Operand::Reg(_) => {}
            Operand::Mem(_) => self.cycles.add(0, 4),
            Operand::HighC => self.cycles.add(1, 4),
        }
    }

    fn fetch8(&mut self, bus: &Bus) -> Result<u8, Error> {
        let addr = self.pc.value();
        let byte = bus.read(addr)?;
        self.pc.set_value(addr.wrapping_add(1));
        Ok(byte)
    }

    fn fetch16(&mut self, bus: &Bus) -> Result<u16, Error> {
        let low = self.fetch8(bus)?;
        let high = self.fetch8(bus)?;
        Ok(u16::from_le_bytes([low, high]))
    }

    /// Fetch, decode and execute one instruction.
    ///
    /// A halted CPU wakes only when an enabled interrupt is requested;
    /// otherwise the step idles for one machine cycle. Errors are fatal:
    /// the offending state is logged and the caller is expected to stop.
    pub fn step(&mut self, bus: &mut Bus) -> Result<(), Error> {
        if self.halted {
            if bus.pending_interrupts().is_empty() {
                self.cycles.add(1, 4);
                return Ok(());
            }
            self.halted = false;
        }

        let start_pc = self.pc.value();
        let mut id = u16::from(self.fetch8(bus)?);
        if id == u16::from(CB_PREFIX) {
            id = 0x100 | u16::from(self.fetch8(bus)?);
        }

        #[cfg(feature = "cpu-trace")]
        self.trace_instruction(bus, start_pc, id);

        match self.exec(bus, id) {
            Ok(()) => Ok(()),
            Err(err) => {
                log::error!("fatal at PC=0x{start_pc:04X}: {err}\n{}", self.dump_state());
                Err(err)
            }
        }
    }

    /// Multi-line register and flag dump for fatal-error reports.
    pub fn dump_state(&self) -> String {
        format!(
            "AF=0x{:04X} BC=0x{:04X} DE=0x{:04X} HL=0x{:04X}\n\
             SP=0x{:04X} PC=0x{:04X} IME={} flags=[{}]\n\
             cycles: machine={} cpu={}",
            self.af(),
            self.bc.value(),
            self.de.value(),
            self.hl.value(),
            self.sp.value(),
            self.pc.value(),
            self.ime,
            self.flags,
            self.cycles.machine,
            self.cycles.cpu,
        )
    }

    #[cfg(feature = "cpu-trace")]
    fn trace_instruction(&self, bus: &Bus, addr: u16, id: u16) {
        use std::fmt::Write as _;

        let entry = &opcodes::OPCODES[id as usize];
        let imm_base = if id > 0xFF {
            addr.wrapping_add(2)
        } else {
            addr.wrapping_add(1)
        };
        let mut imm = [0u8; 2];
        let imm_len = usize::from(entry.width.saturating_sub(1));
        for (offset, slot) in imm.iter_mut().take(imm_len).enumerate() {
            *slot = bus.read(imm_base.wrapping_add(offset as u16)).unwrap_or(0);
        }

        let mut regs = String::new();
        for reg in &entry.regs {
            let _ = write!(regs, " {}={}", reg, self.traced_value(bus, *reg));
        }
        log::trace!(
            "{:04X}  {:<14}{} [{}]",
            addr,
            opcodes::disassemble(id, &imm[..imm_len]),
            regs,
            self.flags,
        );
    }

    #[cfg(feature = "cpu-trace")]
    fn traced_value(&self, bus: &Bus, reg: TracedReg) -> String {
        let reg8 = |r| match r {
            Reg8::A => self.a,
            Reg8::B => self.bc.high(),
            Reg8::C => self.bc.low(),
            Reg8::D => self.de.high(),
            Reg8::E => self.de.low(),
            Reg8::H => self.hl.high(),
            Reg8::L => self.hl.low(),
        };
        match reg {
            TracedReg::R8(r) => format!("{:02X}", reg8(r)),
            TracedReg::R16(r) => format!("{:04X}", self.get16(r)),
            TracedReg::Ind(r) => match bus.read(self.get16(r)) {
                Ok(byte) => format!("{byte:02X}"),
                Err(_) => "??".into(),
            },
            TracedReg::HighC => match bus.read(0xFF00 | u16::from(self.bc.low())) {
                Ok(byte) => format!("{byte:02X}"),
                Err(_) => "??".into(),
            },
        }
    }
}
