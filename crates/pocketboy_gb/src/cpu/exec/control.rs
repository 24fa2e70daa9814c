//! Control flow: jumps, calls, returns, restarts, halt and the interrupt
//! master enable.

use crate::bus::Bus;
use crate::cpu::{Cpu, Flags};
use crate::error::Error;

/// Branch condition of the conditional jump/call/return families.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Cond {
    Always,
    Zero,
    NotZero,
    Carry,
    NotCarry,
}

impl Cond {
    fn taken(self, flags: Flags) -> bool {
        match self {
            Cond::Always => true,
            Cond::Zero => flags.zero,
            Cond::NotZero => !flags.zero,
            Cond::Carry => flags.carry,
            Cond::NotCarry => !flags.carry,
        }
    }
}

impl Cpu {
    /// Relative jump. The signed offset is applied to the address of the
    /// next instruction, after both instruction bytes are consumed.
    pub(super) fn jr(&mut self, bus: &mut Bus, cond: Cond) -> Result<(), Error> {
        let offset = self.fetch8(bus)? as i8;
        self.cycles.add(2, 8);
        if cond.taken(self.flags) {
            let target = self.pc.value().wrapping_add(i16::from(offset) as u16);
            self.pc.set_value(target);
            self.cycles.add(0, 4);
        }
        Ok(())
    }

    pub(super) fn jp(&mut self, bus: &mut Bus, cond: Cond) -> Result<(), Error> {
        let target = self.fetch16(bus)?;
        self.cycles.add(3, 12);
        if cond.taken(self.flags) {
            self.pc.set_value(target);
            self.cycles.add(0, 4);
        }
        Ok(())
    }

    pub(super) fn jp_hl(&mut self) -> Result<(), Error> {
        self.pc.set_value(self.hl.value());
        self.cycles.add(1, 4);
        Ok(())
    }

    pub(super) fn call(&mut self, bus: &mut Bus, cond: Cond) -> Result<(), Error> {
        let target = self.fetch16(bus)?;
        self.cycles.add(3, 12);
        if cond.taken(self.flags) {
            let ret = self.pc.value();
            self.stack_push(bus, ret)?;
            self.pc.set_value(target);
            self.cycles.add(0, 12);
        }
        Ok(())
    }

    pub(super) fn ret(&mut self, bus: &mut Bus) -> Result<(), Error> {
        let target = self.stack_pop(bus)?;
        self.pc.set_value(target);
        self.cycles.add(1, 16);
        Ok(())
    }

    pub(super) fn ret_cond(&mut self, bus: &mut Bus, cond: Cond) -> Result<(), Error> {
        self.cycles.add(1, 8);
        if cond.taken(self.flags) {
            let target = self.stack_pop(bus)?;
            self.pc.set_value(target);
            self.cycles.add(0, 12);
        }
        Ok(())
    }

    /// RETI re-enables interrupt dispatch on the way out.
    pub(super) fn reti(&mut self, bus: &mut Bus) -> Result<(), Error> {
        self.ret(bus)?;
        self.ime = true;
        Ok(())
    }

    /// One-byte call to a fixed low vector.
    pub(super) fn rst(&mut self, bus: &mut Bus, vector: u16) -> Result<(), Error> {
        let ret = self.pc.value();
        self.stack_push(bus, ret)?;
        self.pc.set_value(vector);
        self.cycles.add(1, 16);
        Ok(())
    }

    /// HALT and STOP both park the CPU until an enabled interrupt is
    /// requested; the run loop treats the halted state as its exit.
    pub(super) fn halt(&mut self) -> Result<(), Error> {
        self.halted = true;
        self.cycles.add(1, 4);
        Ok(())
    }

    pub(super) fn set_ime(&mut self, enabled: bool) -> Result<(), Error> {
        self.ime = enabled;
        self.cycles.add(1, 4);
        Ok(())
    }
}
