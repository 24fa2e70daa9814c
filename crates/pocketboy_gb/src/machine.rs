//! Whole-machine assembly: CPU plus bus, construction options and the run
//! loop.

use crate::bus::{Bus, BOOT_ROM_SIZE};
use crate::cartridge::MemoryController;
use crate::cpu::Cpu;
use crate::error::Error;
use crate::DEFAULT_ENTRY_POINT;

/// Construction knobs for [`GameBoy`].
#[derive(Clone, Copy, Debug)]
pub struct EmulatorOptions {
    /// Start with post-boot register state instead of running a boot ROM:
    /// SP at 0xFFFE, interrupts masked, PC at `entry_point`.
    pub skip_bootstrap: bool,
    /// Address execution starts from when the bootstrap is skipped.
    pub entry_point: u16,
}

impl Default for EmulatorOptions {
    fn default() -> Self {
        EmulatorOptions {
            skip_bootstrap: true,
            entry_point: DEFAULT_ENTRY_POINT,
        }
    }
}

/// A CPU wired to a bus, stepped entirely by the host. No wall-clock pacing
/// happens here; the cycle counters on [`Cpu`] are plain bookkeeping.
pub struct GameBoy {
    pub cpu: Cpu,
    pub bus: Bus,
}

impl GameBoy {
    pub fn new(controller: Box<dyn MemoryController>, options: EmulatorOptions) -> Self {
        let mut cpu = Cpu::new();
        let bus = Bus::new(controller);
        if options.skip_bootstrap {
            cpu.sp.set_value(0xFFFE);
            cpu.pc.set_value(options.entry_point);
            cpu.ime = false;
        }
        GameBoy { cpu, bus }
    }

    /// Start from a 256-byte boot ROM overlay instead of the post-boot
    /// state. Execution begins at 0x0000 inside the overlay; the blob is
    /// expected to unmap itself through FF50 when done.
    pub fn with_boot_rom(controller: Box<dyn MemoryController>, blob: [u8; BOOT_ROM_SIZE]) -> Self {
        let mut gb = GameBoy::new(
            controller,
            EmulatorOptions {
                skip_bootstrap: false,
                entry_point: 0,
            },
        );
        gb.bus.load_boot_rom(blob);
        gb
    }

    /// Execute one instruction (or one idle cycle while halted).
    pub fn step(&mut self) -> Result<(), Error> {
        self.cpu.step(&mut self.bus)
    }

    /// Step until the CPU halts. HALT and STOP are the only normal exits;
    /// any error is fatal and has already been logged with a register dump.
    pub fn run(&mut self) -> Result<(), Error> {
        while !self.cpu.halted {
            self.step()?;
        }
        log::debug!(
            "halted at PC=0x{:04X} after {} machine cycles",
            self.cpu.pc.value(),
            self.cpu.cycles.machine
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::FlatCartridge;

    fn boot_with(entry: &[u8]) -> GameBoy {
        let mut rom = vec![0u8; usize::from(DEFAULT_ENTRY_POINT)];
        rom.extend_from_slice(entry);
        let cart = FlatCartridge::new(rom).unwrap();
        GameBoy::new(Box::new(cart), EmulatorOptions::default())
    }

    #[test]
    fn post_boot_state_skips_bootstrap() {
        let gb = boot_with(&[0x00]);
        assert_eq!(gb.cpu.pc.value(), DEFAULT_ENTRY_POINT);
        assert_eq!(gb.cpu.sp.value(), 0xFFFE);
        assert!(!gb.cpu.ime);
        assert!(!gb.cpu.halted);
    }

    #[test]
    fn run_stops_at_halt() {
        // Three NOPs then HALT.
        let mut gb = boot_with(&[0x00, 0x00, 0x00, 0x76]);
        gb.run().unwrap();
        assert!(gb.cpu.halted);
        assert_eq!(gb.cpu.pc.value(), DEFAULT_ENTRY_POINT + 4);
        assert_eq!(gb.cpu.cycles.machine, 4);
        assert_eq!(gb.cpu.cycles.cpu, 16);
    }

    #[test]
    fn stop_also_ends_the_run() {
        let mut gb = boot_with(&[0x10, 0x00]);
        gb.run().unwrap();
        assert!(gb.cpu.halted);
    }

    #[test]
    fn boot_rom_controls_startup() {
        // Boot blob: LD A,0x5A then unmap itself via FF50. The next fetch
        // lands in cartridge ROM, which halts.
        let mut blob = [0u8; BOOT_ROM_SIZE];
        blob[..4].copy_from_slice(&[0x3E, 0x5A, 0xE0, 0x50]);
        let mut rom = vec![0x00; 0x200];
        rom[4] = 0x76;
        let cart = FlatCartridge::new(rom).unwrap();
        let mut gb = GameBoy::with_boot_rom(Box::new(cart), blob);

        assert_eq!(gb.cpu.pc.value(), 0);
        assert!(gb.bus.boot_rom_active());
        gb.run().unwrap();
        assert!(!gb.bus.boot_rom_active());
        assert_eq!(gb.cpu.a, 0x5A);
    }
}
