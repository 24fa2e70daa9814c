use super::Bus;
use crate::bus::Interrupts;

/// Dense id for every implemented IO register in FF00-FF7F.
///
/// Addresses with no id here are "unimplemented IO register" fatal errors at
/// the bus level; they are never silently readable as 0. The set below is
/// the full DMG map the core owns storage for: joypad, serial, timer,
/// interrupt flags, the sound register file, wave pattern RAM, the LCD
/// register file and the boot ROM disable latch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IoReg {
    /// FF00 Joypad port
    Joypad,
    /// FF01 Serial IO data
    SerialData,
    /// FF02 Serial IO control
    SerialControl,
    /// FF04 Divider (write resets to 0)
    Divider,
    /// FF05 Timer counter
    TimerCounter,
    /// FF06 Timer modulo
    TimerModulo,
    /// FF07 Timer control
    TimerControl,
    /// FF0F Interrupt flags
    InterruptFlags,
    /// FF10 Sweep (sound mode #1)
    Sound1Sweep,
    /// FF11 Sound length / pattern duty (sound mode #1)
    Sound1Length,
    /// FF12 Volume envelope (sound mode #1)
    Sound1Envelope,
    /// FF13 Frequency low (sound mode #1)
    Sound1FreqLow,
    /// FF14 Frequency high (sound mode #1)
    Sound1FreqHigh,
    /// FF16 Sound length / pattern duty (sound mode #2)
    Sound2Length,
    /// FF17 Volume envelope (sound mode #2)
    Sound2Envelope,
    /// FF18 Frequency low (sound mode #2)
    Sound2FreqLow,
    /// FF19 Frequency high (sound mode #2)
    Sound2FreqHigh,
    /// FF1A Channel enable (sound mode #3)
    Sound3Enable,
    /// FF1B Sound length (sound mode #3)
    Sound3Length,
    /// FF1C Output level (sound mode #3)
    Sound3Level,
    /// FF1D Frequency low (sound mode #3)
    Sound3FreqLow,
    /// FF1E Frequency high (sound mode #3)
    Sound3FreqHigh,
    /// FF20 Sound length (sound mode #4)
    Sound4Length,
    /// FF21 Volume envelope (sound mode #4)
    Sound4Envelope,
    /// FF22 Polynomial counter (sound mode #4)
    Sound4Counter,
    /// FF23 Counter / consecutive control (sound mode #4)
    Sound4Control,
    /// FF24 Channel / volume control
    SoundChannelVolume,
    /// FF25 Sound output terminal selector
    SoundTerminalSelect,
    /// FF26 Sound on/off
    SoundEnable,
    /// FF30-FF3F Wave pattern RAM byte
    SoundWave(u8),
    /// FF40 LCD control
    LcdControl,
    /// FF41 LCD status
    LcdStatus,
    /// FF42 Background vertical scroll
    ScrollY,
    /// FF43 Background horizontal scroll
    ScrollX,
    /// FF44 Current scanline
    Scanline,
    /// FF45 Scanline compare
    ScanlineCompare,
    /// FF46 OAM DMA transfer control
    DmaControl,
    /// FF47 Background palette
    BgPalette,
    /// FF48 Sprite palette #0
    ObjPalette0,
    /// FF49 Sprite palette #1
    ObjPalette1,
    /// FF4A Window Y position
    WindowY,
    /// FF4B Window X position
    WindowX,
    /// FF50 Boot ROM disable latch
    BootRomDisable,
}

impl IoReg {
    /// Map an absolute address in FF00-FF7F to its register id, or `None`
    /// for the unimplemented holes.
    pub fn from_addr(addr: u16) -> Option<IoReg> {
        use IoReg::*;
        let reg = match addr {
            0xFF00 => Joypad,
            0xFF01 => SerialData,
            0xFF02 => SerialControl,
            0xFF04 => Divider,
            0xFF05 => TimerCounter,
            0xFF06 => TimerModulo,
            0xFF07 => TimerControl,
            0xFF0F => InterruptFlags,
            0xFF10 => Sound1Sweep,
            0xFF11 => Sound1Length,
            0xFF12 => Sound1Envelope,
            0xFF13 => Sound1FreqLow,
            0xFF14 => Sound1FreqHigh,
            0xFF16 => Sound2Length,
            0xFF17 => Sound2Envelope,
            0xFF18 => Sound2FreqLow,
            0xFF19 => Sound2FreqHigh,
            0xFF1A => Sound3Enable,
            0xFF1B => Sound3Length,
            0xFF1C => Sound3Level,
            0xFF1D => Sound3FreqLow,
            0xFF1E => Sound3FreqHigh,
            0xFF20 => Sound4Length,
            0xFF21 => Sound4Envelope,
            0xFF22 => Sound4Counter,
            0xFF23 => Sound4Control,
            0xFF24 => SoundChannelVolume,
            0xFF25 => SoundTerminalSelect,
            0xFF26 => SoundEnable,
            0xFF30..=0xFF3F => SoundWave((addr - 0xFF30) as u8),
            0xFF40 => LcdControl,
            0xFF41 => LcdStatus,
            0xFF42 => ScrollY,
            0xFF43 => ScrollX,
            0xFF44 => Scanline,
            0xFF45 => ScanlineCompare,
            0xFF46 => DmaControl,
            0xFF47 => BgPalette,
            0xFF48 => ObjPalette0,
            0xFF49 => ObjPalette1,
            0xFF4A => WindowY,
            0xFF4B => WindowX,
            0xFF50 => BootRomDisable,
            _ => return None,
        };
        Some(reg)
    }

    pub fn name(self) -> &'static str {
        use IoReg::*;
        match self {
            Joypad => "Joypad port",
            SerialData => "Serial IO data",
            SerialControl => "Serial IO control",
            Divider => "Divider",
            TimerCounter => "Timer counter",
            TimerModulo => "Timer modulo",
            TimerControl => "Timer control",
            InterruptFlags => "Interrupt flags",
            Sound1Sweep => "Sweep (sound mode #1)",
            Sound1Length => "Sound length / pattern duty (sound mode #1)",
            Sound1Envelope => "Volume envelope (sound mode #1)",
            Sound1FreqLow => "Frequency low (sound mode #1)",
            Sound1FreqHigh => "Frequency high (sound mode #1)",
            Sound2Length => "Sound length / pattern duty (sound mode #2)",
            Sound2Envelope => "Volume envelope (sound mode #2)",
            Sound2FreqLow => "Frequency low (sound mode #2)",
            Sound2FreqHigh => "Frequency high (sound mode #2)",
            Sound3Enable => "Channel enable (sound mode #3)",
            Sound3Length => "Sound length (sound mode #3)",
            Sound3Level => "Output level (sound mode #3)",
            Sound3FreqLow => "Frequency low (sound mode #3)",
            Sound3FreqHigh => "Frequency high (sound mode #3)",
            Sound4Length => "Sound length (sound mode #4)",
            Sound4Envelope => "Volume envelope (sound mode #4)",
            Sound4Counter => "Polynomial counter (sound mode #4)",
            Sound4Control => "Counter control (sound mode #4)",
            SoundChannelVolume => "Channel / volume control",
            SoundTerminalSelect => "Sound output terminal selector",
            SoundEnable => "Sound on/off",
            SoundWave(_) => "Wave pattern RAM",
            LcdControl => "LCD control",
            LcdStatus => "LCD status",
            ScrollY => "Background vertical scroll",
            ScrollX => "Background horizontal scroll",
            Scanline => "Current scanline",
            ScanlineCompare => "Scanline compare",
            DmaControl => "DMA transfer control",
            BgPalette => "Background palette",
            ObjPalette0 => "Sprite palette #0",
            ObjPalette1 => "Sprite palette #1",
            WindowY => "Window Y position",
            WindowX => "Window X position",
            BootRomDisable => "Boot ROM disable",
        }
    }
}

/// Serial port register storage.
#[derive(Clone, Copy, Debug, Default)]
pub struct Serial {
    pub data: u8,
    pub control: u8,
}

/// Divider/timer register storage. The core does not advance the timer by
/// itself; an external clock collaborator owns that, the CPU only routes
/// register accesses.
#[derive(Clone, Copy, Debug, Default)]
pub struct Timer {
    pub divider: u8,
    pub counter: u8,
    pub modulo: u8,
    pub control: u8,
}

/// Sound-channel register storage, exposed so an external audio renderer can
/// observe it. No waveform computation happens here.
#[derive(Clone, Debug, Default)]
pub struct Sound {
    pub ch1_sweep: u8,
    pub ch1_length: u8,
    pub ch1_envelope: u8,
    pub ch1_freq_low: u8,
    pub ch1_freq_high: u8,
    pub ch2_length: u8,
    pub ch2_envelope: u8,
    pub ch2_freq_low: u8,
    pub ch2_freq_high: u8,
    pub ch3_enable: u8,
    pub ch3_length: u8,
    pub ch3_level: u8,
    pub ch3_freq_low: u8,
    pub ch3_freq_high: u8,
    pub ch4_length: u8,
    pub ch4_envelope: u8,
    pub ch4_counter: u8,
    pub ch4_control: u8,
    pub channel_volume: u8,
    pub terminal_select: u8,
    pub enable: u8,
    pub wave_pattern: [u8; 16],
}

impl Sound {
    /// Master sound-on bit of NR52.
    pub fn enabled(&self) -> bool {
        self.enable & 0x80 != 0
    }
}

/// LCD register file, exposed for an external video renderer.
#[derive(Clone, Copy, Debug, Default)]
pub struct Lcd {
    pub control: u8,
    pub status: u8,
    pub scroll_y: u8,
    pub scroll_x: u8,
    pub scanline: u8,
    pub scanline_compare: u8,
    pub dma: u8,
    pub bg_palette: u8,
    pub obj_palette0: u8,
    pub obj_palette1: u8,
    pub window_y: u8,
    pub window_x: u8,
}

impl Bus {
    /// Read a mapped IO register. Unmapped addresses never reach this point;
    /// the router turns them into fatal errors first.
    pub(super) fn io_read(&self, reg: IoReg) -> u8 {
        use IoReg::*;
        match reg {
            // Bits 7-6 are unused on hardware and read back as 1.
            Joypad => self.joypad | 0xC0,
            SerialData => self.serial.data,
            SerialControl => self.serial.control,
            Divider => self.timer.divider,
            TimerCounter => self.timer.counter,
            TimerModulo => self.timer.modulo,
            TimerControl => self.timer.control,
            // Upper 3 bits of IF are wired high.
            InterruptFlags => self.if_flags.bits() | 0xE0,
            Sound1Sweep => self.sound.ch1_sweep,
            Sound1Length => self.sound.ch1_length,
            Sound1Envelope => self.sound.ch1_envelope,
            Sound1FreqLow => self.sound.ch1_freq_low,
            Sound1FreqHigh => self.sound.ch1_freq_high,
            Sound2Length => self.sound.ch2_length,
            Sound2Envelope => self.sound.ch2_envelope,
            Sound2FreqLow => self.sound.ch2_freq_low,
            Sound2FreqHigh => self.sound.ch2_freq_high,
            Sound3Enable => self.sound.ch3_enable,
            Sound3Length => self.sound.ch3_length,
            Sound3Level => self.sound.ch3_level,
            Sound3FreqLow => self.sound.ch3_freq_low,
            Sound3FreqHigh => self.sound.ch3_freq_high,
            Sound4Length => self.sound.ch4_length,
            Sound4Envelope => self.sound.ch4_envelope,
            Sound4Counter => self.sound.ch4_counter,
            Sound4Control => self.sound.ch4_control,
            SoundChannelVolume => self.sound.channel_volume,
            SoundTerminalSelect => self.sound.terminal_select,
            SoundEnable => self.sound.enable,
            SoundWave(idx) => self.sound.wave_pattern[idx as usize],
            LcdControl => self.lcd.control,
            LcdStatus => self.lcd.status,
            ScrollY => self.lcd.scroll_y,
            ScrollX => self.lcd.scroll_x,
            Scanline => self.lcd.scanline,
            ScanlineCompare => self.lcd.scanline_compare,
            DmaControl => self.lcd.dma,
            BgPalette => self.lcd.bg_palette,
            ObjPalette0 => self.lcd.obj_palette0,
            ObjPalette1 => self.lcd.obj_palette1,
            WindowY => self.lcd.window_y,
            WindowX => self.lcd.window_x,
            BootRomDisable => u8::from(self.boot_rom.is_none()),
        }
    }

    pub(super) fn io_write(&mut self, reg: IoReg, value: u8) {
        use IoReg::*;
        match reg {
            // Only the select bits (4-5) are writable.
            Joypad => self.joypad = (self.joypad & 0xCF) | (value & 0x30),
            SerialData => self.serial.data = value,
            SerialControl => self.serial.control = value,
            // Any write resets the divider.
            Divider => self.timer.divider = 0,
            TimerCounter => self.timer.counter = value,
            TimerModulo => self.timer.modulo = value,
            TimerControl => self.timer.control = value,
            InterruptFlags => self.if_flags = Interrupts::from_bits_truncate(value),
            Sound1Sweep => self.sound.ch1_sweep = value,
            Sound1Length => self.sound.ch1_length = value,
            Sound1Envelope => self.sound.ch1_envelope = value,
            Sound1FreqLow => self.sound.ch1_freq_low = value,
            Sound1FreqHigh => self.sound.ch1_freq_high = value,
            Sound2Length => self.sound.ch2_length = value,
            Sound2Envelope => self.sound.ch2_envelope = value,
            Sound2FreqLow => self.sound.ch2_freq_low = value,
            Sound2FreqHigh => self.sound.ch2_freq_high = value,
            Sound3Enable => self.sound.ch3_enable = value,
            Sound3Length => self.sound.ch3_length = value,
            Sound3Level => self.sound.ch3_level = value,
            Sound3FreqLow => self.sound.ch3_freq_low = value,
            Sound3FreqHigh => self.sound.ch3_freq_high = value,
            Sound4Length => self.sound.ch4_length = value,
            Sound4Envelope => self.sound.ch4_envelope = value,
            Sound4Counter => self.sound.ch4_counter = value,
            Sound4Control => self.sound.ch4_control = value,
            SoundChannelVolume => self.sound.channel_volume = value,
            SoundTerminalSelect => self.sound.terminal_select = value,
            SoundEnable => self.sound.enable = value,
            SoundWave(idx) => self.sound.wave_pattern[idx as usize] = value,
            LcdControl => self.lcd.control = value,
            LcdStatus => self.lcd.status = value,
            ScrollY => self.lcd.scroll_y = value,
            ScrollX => self.lcd.scroll_x = value,
            // Writing the scanline counter resets it.
            Scanline => self.lcd.scanline = 0,
            ScanlineCompare => self.lcd.scanline_compare = value,
            DmaControl => self.lcd.dma = value,
            BgPalette => self.lcd.bg_palette = value,
            ObjPalette0 => self.lcd.obj_palette0 = value,
            ObjPalette1 => self.lcd.obj_palette1 = value,
            WindowY => self.lcd.window_y = value,
            WindowX => self.lcd.window_x = value,
            BootRomDisable => {
                if value != 0 {
                    self.boot_rom = None;
                }
            }
        }
    }
}
