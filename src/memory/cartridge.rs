use crate::error::{
    ArchiveSnafu, EmptyArchiveSnafu, GbError, RomReadSnafu, RomSizeMismatchSnafu, RomTooLargeSnafu,
    RomTooSmallSnafu, UnsupportedRamSizeSnafu, UnsupportedRomSizeSnafu,
};
use crate::memory::mapper::Mapper;
use crate::memory::{EXTERNAL_RAM_END, EXTERNAL_RAM_START, RAM_BANK_SIZE, ROM_BANK_SIZE};
use log::info;
use snafu::prelude::*;
use std::io::Read;
use std::path::Path;

const TITLE_RANGE: std::ops::Range<usize> = 0x0134..0x0144;
const CARTRIDGE_TYPE_ADDRESS: usize = 0x0147;
const ROM_SIZE_ADDRESS: usize = 0x0148;
const RAM_SIZE_ADDRESS: usize = 0x0149;
const HEADER_END: usize = 0x0150;

const MAX_ROM_SIZE: usize = 0x20_0000;
const MIN_ROM_SIZE: usize = 2 * ROM_BANK_SIZE;

/// Value seen on the data bus when nothing drives it.
pub const OPEN_BUS: u8 = 0xff;

#[derive(Clone, Debug)]
pub struct Header {
    pub title: String,
    pub cartridge_type: u8,
    pub rom_size_code: u8,
    pub ram_size_code: u8,
}

impl Header {
    fn parse(rom: &[u8]) -> Header {
        let title = rom[TITLE_RANGE]
            .iter()
            .take_while(|&&b| b != 0)
            .filter(|b| b.is_ascii_graphic() || **b == b' ')
            .map(|&b| b as char)
            .collect::<String>();

        Header {
            title,
            cartridge_type: rom[CARTRIDGE_TYPE_ADDRESS],
            rom_size_code: rom[ROM_SIZE_ADDRESS],
            ram_size_code: rom[RAM_SIZE_ADDRESS],
        }
    }

    /// ROM size declared at $0148: 32 KiB shifted left by the code.
    fn rom_size(&self) -> Result<usize, GbError> {
        match self.rom_size_code {
            code @ 0x00..=0x08 => Ok(MIN_ROM_SIZE << code),
            code => UnsupportedRomSizeSnafu { code }.fail(),
        }
    }

    fn ram_size(&self) -> Result<usize, GbError> {
        match self.ram_size_code {
            0x00 => Ok(0),
            0x01 => Ok(0x800),
            0x02 => Ok(RAM_BANK_SIZE),
            0x03 => Ok(RAM_BANK_SIZE * 4),
            code => UnsupportedRamSizeSnafu { code }.fail(),
        }
    }
}

#[derive(Clone)]
pub struct Cartridge {
    header: Header,
    mapper: Mapper,
    rom: Vec<u8>,
    ram: Vec<u8>,
}

impl Cartridge {
    /// Builds a cartridge from a raw ROM image, selecting the bank controller and
    /// external RAM size from the header.
    pub fn load(mut rom: Vec<u8>) -> Result<Cartridge, GbError> {
        ensure!(rom.len() >= HEADER_END, RomTooSmallSnafu { size: rom.len() });
        ensure!(rom.len() <= MAX_ROM_SIZE, RomTooLargeSnafu { size: rom.len() });

        let header = Header::parse(&rom);
        let mapper = Mapper::from_cartridge_type(header.cartridge_type)?;
        let ram = vec![0; header.ram_size()?];

        let declared = header.rom_size()?;
        ensure!(declared <= MAX_ROM_SIZE, RomTooLargeSnafu { size: declared });
        ensure!(rom.len() <= declared, RomSizeMismatchSnafu { size: rom.len(), declared });

        // Short dumps are padded so every bank the header declares is addressable.
        rom.resize(declared, OPEN_BUS);
        let banks = declared / ROM_BANK_SIZE;

        info!(
            "Loaded \"{}\": {} ({} ROM banks, {} bytes RAM)",
            header.title,
            mapper.name(),
            banks,
            ram.len()
        );

        Ok(Cartridge { header, mapper, rom, ram })
    }

    /// Loads a ROM from disk. Zip archives are searched for the first `.gb`/`.gbc` entry.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Cartridge, GbError> {
        let path = path.as_ref();
        let is_zip = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("zip"))
            .unwrap_or(false);

        let rom = if is_zip {
            Cartridge::read_archive(path)?
        } else {
            std::fs::read(path).context(RomReadSnafu { path })?
        };

        Cartridge::load(rom)
    }

    fn read_archive(path: &Path) -> Result<Vec<u8>, GbError> {
        let file = std::fs::File::open(path).context(RomReadSnafu { path })?;
        let mut archive = zip::ZipArchive::new(file).context(ArchiveSnafu { path })?;

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).context(ArchiveSnafu { path })?;
            let name = entry.name().to_ascii_lowercase();
            if entry.is_file() && (name.ends_with(".gb") || name.ends_with(".gbc")) {
                let mut rom = Vec::with_capacity(entry.size() as usize);
                entry.read_to_end(&mut rom).context(RomReadSnafu { path })?;
                return Ok(rom);
            }
        }

        EmptyArchiveSnafu { path }.fail()
    }

    #[inline]
    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x3fff => self.rom[addr as usize],
            0x4000..=0x7fff => {
                let offset = (addr as usize - 0x4000) + self.rom_bank() * ROM_BANK_SIZE;
                assert!(offset < self.rom.len(), "ROM offset ${:06x} outside image", offset);
                self.rom[offset]
            }
            EXTERNAL_RAM_START..=EXTERNAL_RAM_END => match self.ram_offset(addr) {
                Some(offset) => self.ram[offset],
                None => OPEN_BUS,
            },
            _ => OPEN_BUS,
        }
    }

    #[inline]
    pub fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x7fff => self.mapper.handle_write(addr, data),
            EXTERNAL_RAM_START..=EXTERNAL_RAM_END => {
                if let Some(offset) = self.ram_offset(addr) {
                    self.ram[offset] = data;
                }
            }
            _ => {}
        }
    }

    /// Effective ROM bank for the switchable slot. Bank lines beyond the image
    /// are not connected, so the register is reduced to the bank count.
    #[inline]
    pub fn rom_bank(&self) -> usize {
        self.mapper.current_rom_bank() % self.rom_bank_count()
    }

    #[inline]
    pub fn ram_bank(&self) -> usize {
        self.mapper.current_ram_bank()
    }

    #[inline]
    pub fn rom_bank_count(&self) -> usize {
        self.rom.len() / ROM_BANK_SIZE
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    pub fn ram_size(&self) -> usize {
        self.ram.len()
    }

    fn ram_offset(&self, addr: u16) -> Option<usize> {
        if !self.mapper.ram_enabled() {
            return None;
        }

        let offset = (addr - EXTERNAL_RAM_START) as usize + self.ram_bank() * RAM_BANK_SIZE;
        (offset < self.ram.len()).then_some(offset)
    }
}
