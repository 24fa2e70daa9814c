//! Data movement: 8/16-bit loads, the high-page forms and stack traffic.

use crate::bus::Bus;
use crate::cpu::{Cpu, Operand, Reg16, Reg8};
use crate::error::Error;

impl Cpu {
    /// Generic 8-bit move. Memory-side operands add their surcharge on top
    /// of the one-byte base cost, so e.g. LD (HL),B lands on 8 T-cycles and
    /// LD (C),A on 8 with an extra machine cycle.
    pub(super) fn ld8(&mut self, bus: &mut Bus, dst: Operand, src: Operand) -> Result<(), Error> {
        self.operand_surcharge(dst);
        self.operand_surcharge(src);
        let value = self.get8(bus, src)?;
        self.set8(bus, dst, value)?;
        self.cycles.add(1, 4);
        Ok(())
    }

    pub(super) fn ld8_imm(&mut self, bus: &mut Bus, dst: Operand) -> Result<(), Error> {
        self.operand_surcharge(dst);
        let value = self.fetch8(bus)?;
        self.set8(bus, dst, value)?;
        self.cycles.add(2, 8);
        Ok(())
    }

    pub(super) fn ld16_imm(&mut self, bus: &mut Bus, pair: Reg16) -> Result<(), Error> {
        let value = self.fetch16(bus)?;
        self.set16(pair, value);
        self.cycles.add(3, 12);
        Ok(())
    }

    /// LDI/LDD: move through (HL), then step HL without touching flags.
    pub(super) fn ld_hl_step(
        &mut self,
        bus: &mut Bus,
        into_a: bool,
        step: i16,
    ) -> Result<(), Error> {
        if into_a {
            self.ld8(bus, Operand::Reg(Reg8::A), Operand::Mem(Reg16::HL))?;
        } else {
            self.ld8(bus, Operand::Mem(Reg16::HL), Operand::Reg(Reg8::A))?;
        }
        self.hl.set_value(self.hl.value().wrapping_add(step as u16));
        Ok(())
    }

    pub(super) fn ld_sp_hl(&mut self) -> Result<(), Error> {
        self.sp.set_value(self.hl.value());
        self.cycles.add(1, 8);
        Ok(())
    }

    /// LD (a16),SP stores both stack-pointer bytes little-endian.
    pub(super) fn ld_a16_sp(&mut self, bus: &mut Bus) -> Result<(), Error> {
        let addr = self.fetch16(bus)?;
        let sp = self.sp.value();
        bus.write(addr, sp as u8)?;
        bus.write(addr.wrapping_add(1), (sp >> 8) as u8)?;
        self.cycles.add(3, 20);
        Ok(())
    }

    /// LDH (a8),A and LDH A,(a8): one-byte offset into the FF00 page.
    pub(super) fn ldh_a8(&mut self, bus: &mut Bus, store: bool) -> Result<(), Error> {
        let offset = self.fetch8(bus)?;
        let addr = 0xFF00 | u16::from(offset);
        if store {
            bus.write(addr, self.a)?;
        } else {
            self.a = bus.read(addr)?;
        }
        self.cycles.add(2, 12);
        Ok(())
    }

    pub(super) fn ld_a16_a(&mut self, bus: &mut Bus, store: bool) -> Result<(), Error> {
        let addr = self.fetch16(bus)?;
        if store {
            bus.write(addr, self.a)?;
        } else {
            self.a = bus.read(addr)?;
        }
        self.cycles.add(3, 16);
        Ok(())
    }

    /// Raw push, no cycle cost. CALL, RST and PUSH charge their own totals.
    pub(super) fn stack_push(&mut self, bus: &mut Bus, value: u16) -> Result<(), Error> {
        let sp = self.sp.value();
        bus.write(sp.wrapping_sub(1), (value >> 8) as u8)?;
        bus.write(sp.wrapping_sub(2), value as u8)?;
        self.sp.set_value(sp.wrapping_sub(2));
        Ok(())
    }

    pub(super) fn stack_pop(&mut self, bus: &Bus) -> Result<u16, Error> {
        let sp = self.sp.value();
        let low = bus.read(sp)?;
        let high = bus.read(sp.wrapping_add(1))?;
        self.sp.set_value(sp.wrapping_add(2));
        Ok(u16::from_le_bytes([low, high]))
    }

    pub(super) fn push16(&mut self, bus: &mut Bus, pair: Reg16) -> Result<(), Error> {
        let value = self.get16(pair);
        self.stack_push(bus, value)?;
        self.cycles.add(1, 16);
        Ok(())
    }

    /// POP AF goes through [`Cpu::set_af`], so the phantom low nibble of F
    /// is dropped on the way in.
    pub(super) fn pop16(&mut self, bus: &mut Bus, pair: Reg16) -> Result<(), Error> {
        let value = self.stack_pop(bus)?;
        self.set16(pair, value);
        self.cycles.add(1, 12);
        Ok(())
    }
}
