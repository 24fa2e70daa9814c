//! Instruction-processing core for a Game Boy (DMG) class CPU.
//!
//! This crate models the register file, flag semantics, the full base and
//! CB-prefixed opcode set, and a byte-addressable memory bus with
//! bank-switched cartridge access and memory-mapped IO registers. Video
//! composition and audio synthesis are external collaborators: the core owns
//! the VRAM, OAM, LCD and sound register storage and exposes it through the
//! bus, but never renders pixels or waveforms itself.
//!
//! The core is fully synchronous and counts cycles without pacing against a
//! wall clock; the host decides how often to call [`GameBoy::step`].

pub mod bus;
pub mod cartridge;
pub mod cpu;
pub mod error;
pub mod machine;
pub mod opcodes;

pub use cartridge::{FlatCartridge, MemoryController};
pub use error::Error;
pub use machine::{EmulatorOptions, GameBoy};

/// Address the CPU starts from when a cartridge entry point is not given.
pub const DEFAULT_ENTRY_POINT: u16 = 0x0100;
