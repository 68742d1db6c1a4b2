use log::debug;

const RAM_ENABLE_RANGE: std::ops::Range<u16> = 0x0000..0x2000;
const ROM_BANK_RANGE: std::ops::Range<u16> = 0x2000..0x4000;
const SECONDARY_BANK_REGISTER: std::ops::Range<u16> = 0x4000..0x6000;
const BANKING_MODE_REGISTER: std::ops::Range<u16> = 0x6000..0x8000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BankingMode {
    /// The 2-bit register supplies bits 5-6 of the ROM bank.
    Rom,
    /// The 2-bit register selects the RAM bank.
    Ram,
}

#[derive(Clone, Debug)]
pub struct Mbc1 {
    rom_bank: u8,
    ram_bank: u8,
    ram_enabled: bool,
    banking_mode: BankingMode,
}

impl Mbc1 {
    pub fn new() -> Mbc1 {
        Mbc1 {
            rom_bank: 1,
            ram_bank: 0,
            ram_enabled: false,
            banking_mode: BankingMode::Rom,
        }
    }

    pub fn handle_write(&mut self, addr: u16, data: u8) {
        match addr {
            addr if RAM_ENABLE_RANGE.contains(&addr) => match data & 0x0f {
                0x0a => {
                    self.ram_enabled = true;
                    debug!("MBC1: RAM enabled");
                }
                0x00 => {
                    self.ram_enabled = false;
                    debug!("MBC1: RAM disabled");
                }
                _ => {}
            },
            addr if ROM_BANK_RANGE.contains(&addr) => {
                // 5-bit register. Higher bits are discarded and a zero selects bank 1 instead,
                // so bank 0 never shows up in the switchable slot through this field.
                let mut lower = data & 0b0001_1111;
                if lower == 0 {
                    lower = 1;
                }
                self.rom_bank = (self.rom_bank & 0b0110_0000) | lower;
                debug!("MBC1: Switched to ROM bank {}", self.rom_bank);
            }
            addr if SECONDARY_BANK_REGISTER.contains(&addr) => match self.banking_mode {
                BankingMode::Rom => {
                    self.rom_bank = (self.rom_bank & 0b0001_1111) | ((data & 0b11) << 5);
                    debug!("MBC1: Switched to ROM bank {}", self.rom_bank);
                }
                BankingMode::Ram => {
                    self.ram_bank = data & 0b11;
                    debug!("MBC1: Switched to RAM bank {}", self.ram_bank);
                }
            },
            addr if BANKING_MODE_REGISTER.contains(&addr) => {
                self.banking_mode = if data & 0b1 == 0 { BankingMode::Rom } else { BankingMode::Ram };
                debug!("MBC1: Switched to banking mode: {:?}", self.banking_mode);
            }
            _ => {}
        }
    }

    #[inline]
    pub fn rom_bank(&self) -> u8 {
        self.rom_bank
    }

    #[inline]
    pub fn ram_bank(&self) -> u8 {
        self.ram_bank
    }

    #[inline]
    pub fn ram_enabled(&self) -> bool {
        self.ram_enabled
    }

    #[inline]
    pub fn banking_mode(&self) -> &BankingMode {
        &self.banking_mode
    }
}

impl Default for Mbc1 {
    fn default() -> Mbc1 {
        Mbc1::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_write_selects_bank_one() {
        let mut mbc1 = Mbc1::new();
        mbc1.handle_write(0x2000, 0x00);
        assert_eq!(mbc1.rom_bank(), 1);

        mbc1.handle_write(0x3fff, 0x05);
        assert_eq!(mbc1.rom_bank(), 5);

        // only the low five bits count
        mbc1.handle_write(0x2100, 0xe3);
        assert_eq!(mbc1.rom_bank(), 3);
    }

    #[test]
    fn ram_enable_needs_0a_in_low_nibble() {
        let mut mbc1 = Mbc1::new();
        mbc1.handle_write(0x0000, 0x1a);
        assert!(mbc1.ram_enabled());

        // values other than $x0 leave the latch untouched
        mbc1.handle_write(0x1fff, 0x05);
        assert!(mbc1.ram_enabled());

        mbc1.handle_write(0x0100, 0x00);
        assert!(!mbc1.ram_enabled());
    }

    #[test]
    fn secondary_register_follows_banking_mode() {
        let mut mbc1 = Mbc1::new();
        mbc1.handle_write(0x2000, 0x01);
        mbc1.handle_write(0x4000, 0x02);
        assert_eq!(mbc1.rom_bank(), 0x41);
        assert_eq!(mbc1.ram_bank(), 0);

        mbc1.handle_write(0x6000, 0x01);
        assert_eq!(mbc1.banking_mode(), &BankingMode::Ram);
        mbc1.handle_write(0x5fff, 0x03);
        assert_eq!(mbc1.ram_bank(), 3);
        assert_eq!(mbc1.rom_bank(), 0x41);

        mbc1.handle_write(0x7fff, 0x00);
        assert_eq!(mbc1.banking_mode(), &BankingMode::Rom);
    }

    #[test]
    fn upper_bits_survive_lower_bank_write() {
        let mut mbc1 = Mbc1::new();
        mbc1.handle_write(0x4000, 0x01);
        mbc1.handle_write(0x2000, 0x00);
        assert_eq!(mbc1.rom_bank(), 0x21);
    }
}
