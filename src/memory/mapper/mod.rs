use crate::error::{GbError, UnsupportedCartridgeSnafu};
use crate::memory::mapper::mbc1::Mbc1;
use crate::memory::mapper::rom::Rom;
use snafu::prelude::*;

pub mod mbc1;
pub mod rom;

/// Bank controller selected by the cartridge header. Each variant carries the
/// register state its controller exposes through ROM-space writes; the ROM and
/// RAM images themselves live in [`crate::memory::cartridge::Cartridge`].
#[derive(Clone, Debug)]
pub enum Mapper {
    Rom(Rom),
    Mbc1(Mbc1),
}

impl Mapper {
    /// Picks the controller for header byte $0147.
    pub fn from_cartridge_type(kind: u8) -> Result<Mapper, GbError> {
        match kind {
            0x00 | 0x08 | 0x09 => Ok(Mapper::Rom(Rom::new())),
            0x01..=0x03 => Ok(Mapper::Mbc1(Mbc1::new())),
            _ => UnsupportedCartridgeSnafu { kind }.fail(),
        }
    }

    pub fn handle_write(&mut self, addr: u16, data: u8) {
        match self {
            Mapper::Rom(rom) => rom.handle_write(addr, data),
            Mapper::Mbc1(mbc1) => mbc1.handle_write(addr, data),
        }
    }

    /// Bank mapped into $4000-$7fff.
    #[inline]
    pub fn current_rom_bank(&self) -> usize {
        match self {
            Mapper::Rom(_) => 1,
            Mapper::Mbc1(mbc1) => mbc1.rom_bank() as usize,
        }
    }

    /// Bank mapped into $a000-$bfff.
    #[inline]
    pub fn current_ram_bank(&self) -> usize {
        match self {
            Mapper::Rom(_) => 0,
            Mapper::Mbc1(mbc1) => mbc1.ram_bank() as usize,
        }
    }

    #[inline]
    pub fn ram_enabled(&self) -> bool {
        match self {
            Mapper::Rom(_) => true,
            Mapper::Mbc1(mbc1) => mbc1.ram_enabled(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mapper::Rom(_) => "ROM",
            Mapper::Mbc1(_) => "MBC1",
        }
    }
}
