//! Cartridge ROM window, BIOS overlay, and mapper register bank.
//!
//! Modeled after the SMS "Sega mapper": three 16 KiB banking windows at
//! `$0000-$3FFF`/`$4000-$7FFF`/`$8000-$BFFF`, selected by registers aliased
//! into the top of RAM at `$FFFC-$FFFF`. The first 1 KiB of the ROM window
//! is unbanked (always bank 0, byte 0) so the reset vector is always
//! reachable regardless of the mapper state.

/// Size of one ROM bank.
pub const BANK_SIZE: usize = 0x4000;

/// A cartridge (or BIOS) ROM image with Sega-mapper bank registers.
pub struct Cartridge {
    rom: Vec<u8>,
    bank_count: usize,
    bank0: u8,
    bank1: u8,
    bank2: u8,
    /// `$FFFC` control register. Recognized but RAM/ROM slot-2 switching is
    /// not implemented — see the memory-control open question in DESIGN.md.
    control: u8,
}

impl Cartridge {
    /// Load a ROM image, resetting mapper state to its power-on defaults:
    /// `bank0=0`, `bank1=min(1, bank_count-1)`, `bank2=bank_count-1`.
    pub fn new(rom: Vec<u8>) -> Self {
        let bank_count = Self::bank_count_for(rom.len());
        Cartridge {
            rom,
            bank_count,
            bank0: 0,
            bank1: bank_count.saturating_sub(1).min(1) as u8,
            bank2: (bank_count - 1) as u8,
            control: 0,
        }
    }

    pub fn load_rom(&mut self, rom: Vec<u8>) {
        *self = Self::new(rom);
    }

    fn bank_count_for(rom_len: usize) -> usize {
        rom_len.div_ceil(BANK_SIZE).max(1)
    }

    fn bank_offset(&self, bank: u8) -> usize {
        (bank as usize % self.bank_count) * BANK_SIZE
    }

    /// Read through the three banking windows. `addr` is relative to
    /// `$0000` (i.e. already masked into `0..=0xBFFF` by the caller).
    pub fn read(&self, addr: u16) -> u8 {
        if self.rom.is_empty() {
            return 0xFF;
        }
        let offset = match addr {
            0x0000..=0x03FF => addr as usize,
            0x0400..=0x3FFF => self.bank_offset(self.bank0) + addr as usize,
            0x4000..=0x7FFF => self.bank_offset(self.bank1) + (addr as usize - 0x4000),
            0x8000..=0xBFFF => self.bank_offset(self.bank2) + (addr as usize - 0x8000),
            _ => return 0xFF,
        };
        self.rom.get(offset).copied().unwrap_or(0xFF)
    }

    /// Handle a write into the mapper register window `$FFFC-$FFFF`.
    /// Returns the value so the caller can also mirror it into RAM (the
    /// registers are aliased onto the last four bytes of RAM on real
    /// hardware, so code that reads them back via `$FFFC-$FFFF` sees the
    /// value whether it goes through the mapper or the RAM mirror).
    pub fn write_mapper(&mut self, addr: u16, value: u8) {
        match addr {
            0xFFFC => self.control = value,
            0xFFFD => self.bank0 = value,
            0xFFFE => self.bank1 = value,
            0xFFFF => self.bank2 = value,
            _ => {}
        }
    }

    pub fn mapper_register(&self, addr: u16) -> u8 {
        match addr {
            0xFFFC => self.control,
            0xFFFD => self.bank0,
            0xFFFE => self.bank1,
            0xFFFF => self.bank2,
            _ => 0xFF,
        }
    }

    pub fn bank0(&self) -> u8 {
        self.bank0
    }
    pub fn bank1(&self) -> u8 {
        self.bank1
    }
    pub fn bank2(&self) -> u8 {
        self.bank2
    }
    pub fn control(&self) -> u8 {
        self.control
    }
    pub fn bank_count(&self) -> usize {
        self.bank_count
    }
    pub fn rom(&self) -> &[u8] {
        &self.rom
    }

    pub fn set_banks(&mut self, control: u8, bank0: u8, bank1: u8, bank2: u8) {
        self.control = control;
        self.bank0 = bank0;
        self.bank1 = bank1;
        self.bank2 = bank2;
    }
}

impl Default for Cartridge {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Bit layout of the memory-control register (port `$3E`).
pub mod memory_control {
    /// 1 = BIOS ROM disabled (so the cartridge/RAM becomes visible at `$0000-$BFFF`).
    pub const BIOS_DISABLE: u8 = 0x08;
    /// 1 = work RAM disabled.
    pub const RAM_DISABLE: u8 = 0x10;
    /// 1 = cartridge slot disabled.
    pub const CART_DISABLE: u8 = 0x40;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_count_rounds_up() {
        assert_eq!(Cartridge::bank_count_for(0x4001), 2);
        assert_eq!(Cartridge::bank_count_for(0x4000), 1);
        assert_eq!(Cartridge::bank_count_for(0), 1);
    }

    #[test]
    fn first_kib_is_unbanked() {
        let mut rom = vec![0u8; BANK_SIZE * 2];
        rom[0x0400] = 0x11;
        rom[0x4400] = 0x22;
        let mut cart = Cartridge::new(rom);
        assert_eq!(cart.read(0x0400), 0x11);
        cart.write_mapper(0xFFFD, 1);
        assert_eq!(cart.read(0x0400), 0x22);
        // bytes below 0x400 always come from bank 0 regardless of bank0 register
        assert_eq!(cart.read(0x0000), 0);
    }

    #[test]
    fn bank_index_wraps_modulo_bank_count() {
        let rom = vec![0u8; BANK_SIZE * 2];
        let mut cart = Cartridge::new(rom);
        cart.write_mapper(0xFFFD, 5); // 5 % 2 == 1
        assert_eq!(cart.bank0(), 5);
        assert_eq!(cart.bank_offset(cart.bank0()), BANK_SIZE);
    }
}
