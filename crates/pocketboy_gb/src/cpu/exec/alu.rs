//! Accumulator arithmetic, logic and the 16-bit adder.

use crate::bus::Bus;
use crate::cpu::{Cpu, Flags, Operand, Reg16};
use crate::error::Error;

impl Cpu {
    /// Shared core of ADD/ADC. The half-carry folds the incoming carry into
    /// the low-nibble sum so ADC reports it even when the addend's nibble
    /// alone would not overflow.
    fn add_a(&mut self, added: u8, use_carry: bool) {
        let old = self.a;
        let carry = u8::from(use_carry && self.flags.carry);
        let result = old.wrapping_add(added).wrapping_add(carry);
        self.a = result;
        self.flags = Flags {
            zero: result == 0,
            subtract: false,
            half_carry: (old & 0xF) + (added & 0xF) + carry >= 0x10,
            carry: u16::from(old) + u16::from(added) + u16::from(carry) > 0xFF,
        };
    }

    /// Shared core of SUB/SBC/CP; CP computes the same flags without
    /// storing the result.
    fn sub_a(&mut self, subbed: u8, use_carry: bool, store: bool) {
        let old = self.a;
        let carry = u8::from(use_carry && self.flags.carry);
        let result = old.wrapping_sub(subbed).wrapping_sub(carry);
        if store {
            self.a = result;
        }
        self.flags = Flags {
            zero: result == 0,
            subtract: true,
            half_carry: u16::from(old & 0xF) < u16::from(subbed & 0xF) + u16::from(carry),
            carry: u16::from(old) < u16::from(subbed) + u16::from(carry),
        };
    }

    pub(super) fn add8(&mut self, bus: &mut Bus, src: Operand, use_carry: bool) -> Result<(), Error> {
        self.operand_surcharge(src);
        let added = self.get8(bus, src)?;
        self.add_a(added, use_carry);
        self.cycles.add(1, 4);
        Ok(())
    }

    pub(super) fn add8_imm(&mut self, bus: &mut Bus, use_carry: bool) -> Result<(), Error> {
        let added = self.fetch8(bus)?;
        self.add_a(added, use_carry);
        self.cycles.add(2, 8);
        Ok(())
    }

    pub(super) fn sub8(
        &mut self,
        bus: &mut Bus,
        src: Operand,
        use_carry: bool,
        store: bool,
    ) -> Result<(), Error> {
        self.operand_surcharge(src);
        let subbed = self.get8(bus, src)?;
        self.sub_a(subbed, use_carry, store);
        self.cycles.add(1, 4);
        Ok(())
    }

    pub(super) fn sub8_imm(
        &mut self,
        bus: &mut Bus,
        use_carry: bool,
        store: bool,
    ) -> Result<(), Error> {
        let subbed = self.fetch8(bus)?;
        self.sub_a(subbed, use_carry, store);
        self.cycles.add(2, 8);
        Ok(())
    }

    fn logic_flags(&mut self, result: u8, half_carry: bool) {
        self.a = result;
        self.flags = Flags {
            zero: result == 0,
            subtract: false,
            half_carry,
            carry: false,
        };
    }

    pub(super) fn and8(&mut self, bus: &mut Bus, src: Operand) -> Result<(), Error> {
        self.operand_surcharge(src);
        let value = self.get8(bus, src)?;
        self.logic_flags(self.a & value, true);
        self.cycles.add(1, 4);
        Ok(())
    }

    pub(super) fn and8_imm(&mut self, bus: &mut Bus) -> Result<(), Error> {
        let value = self.fetch8(bus)?;
        self.logic_flags(self.a & value, true);
        self.cycles.add(2, 8);
        Ok(())
    }

    pub(super) fn or8(&mut self, bus: &mut Bus, src: Operand) -> Result<(), Error> {
        self.operand_surcharge(src);
        let value = self.get8(bus, src)?;
        self.logic_flags(self.a | value, false);
        self.cycles.add(1, 4);
        Ok(())
    }

    pub(super) fn or8_imm(&mut self, bus: &mut Bus) -> Result<(), Error> {
        let value = self.fetch8(bus)?;
        self.logic_flags(self.a | value, false);
        self.cycles.add(2, 8);
        Ok(())
    }

    pub(super) fn xor8(&mut self, bus: &mut Bus, src: Operand) -> Result<(), Error> {
        self.operand_surcharge(src);
        let value = self.get8(bus, src)?;
        self.logic_flags(self.a ^ value, false);
        self.cycles.add(1, 4);
        Ok(())
    }

    pub(super) fn xor8_imm(&mut self, bus: &mut Bus) -> Result<(), Error> {
        let value = self.fetch8(bus)?;
        self.logic_flags(self.a ^ value, false);
        self.cycles.add(2, 8);
        Ok(())
    }

    /// INC on an 8-bit operand leaves the carry flag alone.
    pub(super) fn inc8(&mut self, bus: &mut Bus, operand: Operand) -> Result<(), Error> {
        self.operand_surcharge(operand);
        let old = self.get8(bus, operand)?;
        let result = old.wrapping_add(1);
        self.set8(bus, operand, result)?;
        self.flags = Flags {
            zero: result == 0,
            subtract: false,
            half_carry: old & 0xF == 0xF,
            carry: self.flags.carry,
        };
        self.cycles.add(1, 4);
        Ok(())
    }

    pub(super) fn dec8(&mut self, bus: &mut Bus, operand: Operand) -> Result<(), Error> {
        self.operand_surcharge(operand);
        let old = self.get8(bus, operand)?;
        let result = old.wrapping_sub(1);
        self.set8(bus, operand, result)?;
        self.flags = Flags {
            zero: result == 0,
            subtract: true,
            half_carry: old & 0xF < result & 0xF,
            carry: self.flags.carry,
        };
        self.cycles.add(1, 4);
        Ok(())
    }

    /// 16-bit INC/DEC touch no flags at all.
    pub(super) fn inc16(&mut self, pair: Reg16) -> Result<(), Error> {
        self.set16(pair, self.get16(pair).wrapping_add(1));
        self.cycles.add(1, 8);
        Ok(())
    }

    pub(super) fn dec16(&mut self, pair: Reg16) -> Result<(), Error> {
        self.set16(pair, self.get16(pair).wrapping_sub(1));
        self.cycles.add(1, 8);
        Ok(())
    }

    /// ADD HL,rr. Half-carry is the carry out of bit 11 of the full 16-bit
    /// sum, not a per-nibble artifact; zero is preserved.
    pub(super) fn add16_hl(&mut self, pair: Reg16) -> Result<(), Error> {
        let current = self.hl.value();
        let added = self.get16(pair);
        self.hl.set_value(current.wrapping_add(added));
        self.flags = Flags {
            zero: self.flags.zero,
            subtract: false,
            half_carry: (current & 0x0FFF) + (added & 0x0FFF) > 0x0FFF,
            carry: u32::from(current) + u32::from(added) > 0xFFFF,
        };
        self.cycles.add(1, 8);
        Ok(())
    }

    /// Decimal adjust after a BCD add or subtract.
    pub(super) fn daa(&mut self) -> Result<(), Error> {
        let mut carry = self.flags.carry;
        if self.flags.subtract {
            let mut adjust = 0u8;
            if self.flags.half_carry {
                adjust |= 0x06;
            }
            if self.flags.carry {
                adjust |= 0x60;
            }
            self.a = self.a.wrapping_sub(adjust);
        } else {
            let mut adjust = 0u8;
            if self.flags.half_carry || self.a & 0xF > 0x9 {
                adjust |= 0x06;
            }
            if self.flags.carry || self.a > 0x99 {
                adjust |= 0x60;
                carry = true;
            }
            self.a = self.a.wrapping_add(adjust);
        }
        self.flags = Flags {
            zero: self.a == 0,
            subtract: self.flags.subtract,
            half_carry: false,
            carry,
        };
        self.cycles.add(1, 4);
        Ok(())
    }

    pub(super) fn cpl(&mut self) -> Result<(), Error> {
        self.a = !self.a;
        self.flags.subtract = true;
        self.flags.half_carry = true;
        self.cycles.add(1, 4);
        Ok(())
    }

    /// SCF sets the carry, CCF inverts it; both clear N and H.
    pub(super) fn set_carry(&mut self, invert: bool) -> Result<(), Error> {
        self.flags.carry = if invert { !self.flags.carry } else { true };
        self.flags.subtract = false;
        self.flags.half_carry = false;
        self.cycles.add(1, 4);
        Ok(())
    }

    /// SP plus a sign-extended immediate, with flags computed from the
    /// unsigned byte against SP's low byte. Shared by ADD SP,r8 and
    /// LD HL,SP+r8.
    fn sp_offset(&mut self, bus: &Bus) -> Result<(u16, Flags), Error> {
        let byte = self.fetch8(bus)?;
        let sp = self.sp.value();
        let result = sp.wrapping_add(i16::from(byte as i8) as u16);
        let flags = Flags {
            zero: false,
            subtract: false,
            half_carry: (sp & 0xF) + u16::from(byte & 0xF) > 0xF,
            carry: (sp & 0xFF) + u16::from(byte) > 0xFF,
        };
        Ok((result, flags))
    }

    pub(super) fn add_sp_r8(&mut self, bus: &mut Bus) -> Result<(), Error> {
        let (result, flags) = self.sp_offset(bus)?;
        self.sp.set_value(result);
        self.flags = flags;
        self.cycles.add(2, 16);
        Ok(())
    }

    pub(super) fn ld_hl_sp_r8(&mut self, bus: &mut Bus) -> Result<(), Error> {
        let (result, flags) = self.sp_offset(bus)?;
        self.hl.set_value(result);
        self.flags = flags;
        self.cycles.add(2, 12);
        Ok(())
    }
}
