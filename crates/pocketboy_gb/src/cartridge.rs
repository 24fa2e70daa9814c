use crate::error::{Access, Error};

/// ROM bank size in bytes (0000-3FFF and the switchable 4000-7FFF window).
pub const ROM_BANK_SIZE: usize = 16 * 1024;
/// Cartridge RAM window size (A000-BFFF).
pub const RAM_BANK_SIZE: usize = 8 * 1024;

/// Capability consumed by the bus for all cartridge-side accesses.
///
/// The controller sees raw 16-bit addresses: 0000-7FFF for ROM (writes in
/// that range drive mapper registers on banked cartridges) and A000-BFFF for
/// cartridge RAM. Concrete bank-switching strategies (MBC1/3/5, ...) live
/// behind this trait and are external collaborators as far as the CPU core
/// is concerned.
pub trait MemoryController {
    fn read(&self, addr: u16) -> Result<u8, Error>;
    fn write(&mut self, addr: u16, value: u8) -> Result<(), Error>;
}

/// Minimal flat controller: two fixed ROM banks (32K) and optionally one
/// RAM bank, i.e. an MBC-less cartridge.
///
/// Enough for unit tests and the many commercial 32K images that carry no
/// mapper at all.
#[derive(Debug)]
pub struct FlatCartridge {
    rom: Vec<u8>,
    ram: Option<[u8; RAM_BANK_SIZE]>,
}

impl FlatCartridge {
    /// Wrap a ROM image of at most 32K. Shorter images are zero-padded to
    /// the full two banks; larger images need a real mapper and are a
    /// configuration error here.
    pub fn new(mut rom: Vec<u8>) -> Result<Self, Error> {
        if rom.len() > 2 * ROM_BANK_SIZE {
            return Err(Error::Config(format!(
                "flat cartridge holds at most {} bytes, got {}",
                2 * ROM_BANK_SIZE,
                rom.len()
            )));
        }
        rom.resize(2 * ROM_BANK_SIZE, 0);
        Ok(Self { rom, ram: None })
    }

    /// Same as [`FlatCartridge::new`] but with one battery-less RAM bank
    /// mapped at A000-BFFF.
    pub fn with_ram(rom: Vec<u8>) -> Result<Self, Error> {
        let mut cart = Self::new(rom)?;
        cart.ram = Some([0; RAM_BANK_SIZE]);
        Ok(cart)
    }
}

impl MemoryController for FlatCartridge {
    fn read(&self, addr: u16) -> Result<u8, Error> {
        match addr {
            0x0000..=0x7FFF => Ok(self.rom[addr as usize]),
            0xA000..=0xBFFF => match &self.ram {
                Some(ram) => Ok(ram[(addr - 0xA000) as usize]),
                None => Err(Error::BusRange {
                    addr,
                    access: Access::Read,
                    reason: "cartridge has no RAM".into(),
                }),
            },
            _ => Err(Error::BusRange {
                addr,
                access: Access::Read,
                reason: "address outside cartridge space".into(),
            }),
        }
    }

    fn write(&mut self, addr: u16, value: u8) -> Result<(), Error> {
        match addr {
            // No mapper registers to drive; flat cartridges ignore ROM
            // writes like real MBC-less boards do.
            0x0000..=0x7FFF => Ok(()),
            0xA000..=0xBFFF => match &mut self.ram {
                Some(ram) => {
                    ram[(addr - 0xA000) as usize] = value;
                    Ok(())
                }
                None => Err(Error::BusRange {
                    addr,
                    access: Access::Write,
                    reason: "cartridge has no RAM".into(),
                }),
            },
            _ => Err(Error::BusRange {
                addr,
                access: Access::Write,
                reason: "address outside cartridge space".into(),
            }),
        }
    }
}
