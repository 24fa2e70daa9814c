//! 64K address-space router.
//!
//! Every address belongs to exactly one handler; there is no silent
//! fall-through. Cartridge ranges delegate to the [`MemoryController`]
//! capability, the IO page dispatches through [`IoReg`], and everything the
//! core owns storage for (VRAM, WRAM, OAM, HRAM, IO register files) lives
//! directly on [`Bus`].

use bitflags::bitflags;

use crate::cartridge::MemoryController;
use crate::error::{Access, Error};

mod io;

pub use io::{IoReg, Lcd, Serial, Sound, Timer};

/// One VRAM bank (8000-9FFF window).
pub const VRAM_BANK_SIZE: usize = 8 * 1024;
/// One WRAM bank (C000-CFFF fixed, D000-DFFF switchable).
pub const WRAM_BANK_SIZE: usize = 4 * 1024;
/// Object attribute memory (FE00-FE9F).
pub const OAM_SIZE: usize = 0xA0;
/// High RAM (FF80-FFFE).
pub const HRAM_SIZE: usize = 0x7F;
/// Boot ROM overlay mapped over 0000-00FF until unmapped via FF50.
pub const BOOT_ROM_SIZE: usize = 0x100;

bitflags! {
    /// Interrupt sources shared by the IF (FF0F) and IE (FFFF) registers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Interrupts: u8 {
        const VBLANK = 1 << 0;
        const LCD_STAT = 1 << 1;
        const TIMER = 1 << 2;
        const SERIAL = 1 << 3;
        const JOYPAD = 1 << 4;
    }
}

/// The memory bus. Owns all core-side storage and the cartridge controller.
pub struct Bus {
    controller: Box<dyn MemoryController>,
    boot_rom: Option<[u8; BOOT_ROM_SIZE]>,
    vram: [[u8; VRAM_BANK_SIZE]; 2],
    vram_bank: usize,
    wram: [u8; WRAM_BANK_SIZE],
    wram_banks: Vec<[u8; WRAM_BANK_SIZE]>,
    wram_bank: usize,
    oam: [u8; OAM_SIZE],
    hram: [u8; HRAM_SIZE],
    joypad: u8,
    serial: Serial,
    timer: Timer,
    if_flags: Interrupts,
    ie_reg: u8,
    sound: Sound,
    lcd: Lcd,
}

impl Bus {
    pub fn new(controller: Box<dyn MemoryController>) -> Self {
        Self {
            controller,
            boot_rom: None,
            vram: [[0; VRAM_BANK_SIZE]; 2],
            vram_bank: 0,
            wram: [0; WRAM_BANK_SIZE],
            wram_banks: vec![[0; WRAM_BANK_SIZE]],
            wram_bank: 0,
            oam: [0; OAM_SIZE],
            hram: [0; HRAM_SIZE],
            // Buttons idle high, no select line active.
            joypad: 0xCF,
            serial: Serial::default(),
            timer: Timer::default(),
            if_flags: Interrupts::empty(),
            ie_reg: 0,
            sound: Sound::default(),
            lcd: Lcd::default(),
        }
    }

    /// Overlay a 256-byte boot ROM at 0000-00FF. It stays mapped until the
    /// program writes a non-zero value to FF50.
    pub fn load_boot_rom(&mut self, blob: [u8; BOOT_ROM_SIZE]) {
        self.boot_rom = Some(blob);
    }

    pub fn boot_rom_active(&self) -> bool {
        self.boot_rom.is_some()
    }

    pub fn read(&self, addr: u16) -> Result<u8, Error> {
        match addr {
            0x0000..=0x00FF => match &self.boot_rom {
                Some(blob) => Ok(blob[addr as usize]),
                None => self.controller.read(addr),
            },
            0x0100..=0x7FFF => self.controller.read(addr),
            0x8000..=0x9FFF => Ok(self.vram[self.vram_bank][(addr - 0x8000) as usize]),
            0xA000..=0xBFFF => self.controller.read(addr),
            0xC000..=0xCFFF => Ok(self.wram[(addr - 0xC000) as usize]),
            0xD000..=0xDFFF => Ok(self.wram_banks[self.wram_bank][(addr - 0xD000) as usize]),
            // Echo of C000-DDFF.
            0xE000..=0xFDFF => self.read(addr - 0x2000),
            0xFE00..=0xFE9F => Ok(self.oam[(addr - 0xFE00) as usize]),
            // Unusable range reads as 0.
            0xFEA0..=0xFEFF => Ok(0),
            0xFF00..=0xFF7F => match IoReg::from_addr(addr) {
                Some(reg) => Ok(self.io_read(reg)),
                None => Err(Error::UnmappedIo {
                    addr,
                    access: Access::Read,
                }),
            },
            0xFF80..=0xFFFE => Ok(self.hram[(addr - 0xFF80) as usize]),
            0xFFFF => Ok(self.ie_reg),
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) -> Result<(), Error> {
        match addr {
            // The boot ROM overlay is not writable; ROM writes still reach
            // the controller so mapper registers keep working underneath it.
            0x0000..=0x7FFF => self.controller.write(addr, value),
            0x8000..=0x9FFF => {
                self.vram[self.vram_bank][(addr - 0x8000) as usize] = value;
                Ok(())
            }
            0xA000..=0xBFFF => self.controller.write(addr, value),
            0xC000..=0xCFFF => {
                self.wram[(addr - 0xC000) as usize] = value;
                Ok(())
            }
            0xD000..=0xDFFF => {
                self.wram_banks[self.wram_bank][(addr - 0xD000) as usize] = value;
                Ok(())
            }
            0xE000..=0xFDFF => self.write(addr - 0x2000, value),
            0xFE00..=0xFE9F => {
                self.oam[(addr - 0xFE00) as usize] = value;
                Ok(())
            }
            // Writes to the unusable range are dropped.
            0xFEA0..=0xFEFF => Ok(()),
            0xFF00..=0xFF7F => match IoReg::from_addr(addr) {
                Some(reg) => {
                    self.io_write(reg, value);
                    Ok(())
                }
                None => Err(Error::UnmappedIo {
                    addr,
                    access: Access::Write,
                }),
            },
            0xFF80..=0xFFFE => {
                self.hram[(addr - 0xFF80) as usize] = value;
                Ok(())
            }
            0xFFFF => {
                self.ie_reg = value;
                Ok(())
            }
        }
    }

    /// Raise interrupt request bits in IF, as external collaborators
    /// (video, timer, serial, joypad) would.
    pub fn request_interrupt(&mut self, sources: Interrupts) {
        self.if_flags |= sources;
    }

    pub fn enabled_interrupts(&self) -> Interrupts {
        Interrupts::from_bits_truncate(self.ie_reg)
    }

    /// Requested sources that are also enabled; non-empty wakes a halted CPU.
    pub fn pending_interrupts(&self) -> Interrupts {
        self.if_flags & self.enabled_interrupts()
    }

    /// Select the active VRAM bank. Bank 1 only exists on the colour
    /// hardware; the core keeps both so a CGB-aware video collaborator can
    /// drive this.
    pub fn select_vram_bank(&mut self, bank: usize) {
        self.vram_bank = bank.min(self.vram.len() - 1);
    }

    pub fn sound(&self) -> &Sound {
        &self.sound
    }

    pub fn lcd(&self) -> &Lcd {
        &self.lcd
    }

    pub fn lcd_mut(&mut self) -> &mut Lcd {
        &mut self.lcd
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut Timer {
        &mut self.timer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::FlatCartridge;

    fn empty_bus() -> Bus {
        let cart = FlatCartridge::with_ram(vec![]).unwrap();
        Bus::new(Box::new(cart))
    }

    #[test]
    fn echo_ram_mirrors_work_ram() {
        let mut bus = empty_bus();
        bus.write(0xC123, 0x42).unwrap();
        assert_eq!(bus.read(0xE123).unwrap(), 0x42);
        bus.write(0xFDFF, 0x99).unwrap();
        assert_eq!(bus.read(0xDDFF).unwrap(), 0x99);
    }

    #[test]
    fn unusable_range_reads_zero_and_drops_writes() {
        let mut bus = empty_bus();
        bus.write(0xFEA0, 0xFF).unwrap();
        assert_eq!(bus.read(0xFEA0).unwrap(), 0);
        assert_eq!(bus.read(0xFEFF).unwrap(), 0);
    }

    #[test]
    fn oam_hram_and_ie_are_backed() {
        let mut bus = empty_bus();
        bus.write(0xFE00, 0x11).unwrap();
        bus.write(0xFF80, 0x22).unwrap();
        bus.write(0xFFFF, 0x1F).unwrap();
        assert_eq!(bus.read(0xFE00).unwrap(), 0x11);
        assert_eq!(bus.read(0xFF80).unwrap(), 0x22);
        assert_eq!(bus.read(0xFFFF).unwrap(), 0x1F);
        assert_eq!(bus.enabled_interrupts(), Interrupts::all());
    }

    #[test]
    fn every_mapped_io_register_round_trips() {
        let mut bus = empty_bus();
        for addr in 0xFF00..=0xFF7F {
            if IoReg::from_addr(addr).is_some() {
                bus.write(addr, 0).unwrap();
                bus.read(addr).unwrap();
            }
        }
    }

    #[test]
    fn unmapped_io_register_is_fatal() {
        let mut bus = empty_bus();
        assert!(matches!(
            bus.read(0xFF03),
            Err(Error::UnmappedIo { addr: 0xFF03, .. })
        ));
        assert!(matches!(
            bus.write(0xFF7F, 0),
            Err(Error::UnmappedIo { addr: 0xFF7F, .. })
        ));
    }

    #[test]
    fn interrupt_flags_read_back_with_unused_bits_high() {
        let mut bus = empty_bus();
        bus.write(0xFF0F, 0x01).unwrap();
        assert_eq!(bus.read(0xFF0F).unwrap(), 0xE1);
    }

    #[test]
    fn pending_interrupts_need_both_request_and_enable() {
        let mut bus = empty_bus();
        bus.request_interrupt(Interrupts::TIMER);
        assert!(bus.pending_interrupts().is_empty());
        bus.write(0xFFFF, Interrupts::TIMER.bits()).unwrap();
        assert_eq!(bus.pending_interrupts(), Interrupts::TIMER);
    }

    #[test]
    fn divider_write_resets_it() {
        let mut bus = empty_bus();
        bus.timer_mut().divider = 0xAB;
        bus.write(0xFF04, 0x55).unwrap();
        assert_eq!(bus.read(0xFF04).unwrap(), 0);
    }

    #[test]
    fn boot_rom_overlays_cartridge_until_disabled() {
        let cart = FlatCartridge::new(vec![0x11; 0x200]).unwrap();
        let mut bus = Bus::new(Box::new(cart));
        let mut boot = [0u8; BOOT_ROM_SIZE];
        boot[0] = 0xFE;
        bus.load_boot_rom(boot);

        assert_eq!(bus.read(0x0000).unwrap(), 0xFE);
        assert_eq!(bus.read(0x0100).unwrap(), 0x11);

        bus.write(0xFF50, 1).unwrap();
        assert!(!bus.boot_rom_active());
        assert_eq!(bus.read(0x0000).unwrap(), 0x11);
    }
}
