use crate::joypad::Joypad;
use crate::memory::cartridge::Cartridge;
use crate::memory::registers::InterruptFlags;
use crate::memory::{
    BOOTROM_MAPPER_REGISTER, BOOTROM_SIZE, DIV_REGISTER, ECHO_RAM_END, ECHO_RAM_OFFSET,
    ECHO_RAM_START, EXTERNAL_RAM_END, EXTERNAL_RAM_START, INTERRUPT_FLAGS_REGISTER, JOYPAD_REGISTER,
    LCD_STATUS_REGISTER, OAM_DMA_REGISTER, OAM_SIZE, OAM_START, SCANLINE_Y_REGISTER, UNUSABLE_END,
    UNUSABLE_START,
};
use log::{debug, warn};

const STAT_WRITABLE_BITS: u8 = 0b0111_1000;

/// The address space. Owns every byte that is not cartridge storage and applies
/// the side effects attached to individual registers.
#[derive(Clone)]
pub struct Mmu {
    cartridge: Cartridge,
    memory: Vec<u8>,
    bootrom: Vec<u8>,
    bootrom_mapped: bool,
    joypad: Joypad,
    div_reset: bool,
}

impl Mmu {
    /// An empty boot ROM leaves the overlay unmapped from the start.
    pub fn new(bootrom: Vec<u8>, cartridge: Cartridge) -> Mmu {
        debug_assert!(bootrom.is_empty() || bootrom.len() == BOOTROM_SIZE);

        Mmu {
            cartridge,
            memory: vec![0; 0x10000],
            bootrom_mapped: !bootrom.is_empty(),
            bootrom,
            joypad: Joypad::new(),
            div_reset: false,
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x00ff if self.bootrom_mapped => self.bootrom[addr as usize],
            JOYPAD_REGISTER => self.joypad.as_u8(self.memory[addr as usize]),
            0x0000..=0x7fff | EXTERNAL_RAM_START..=EXTERNAL_RAM_END => self.cartridge.read(addr),
            ECHO_RAM_START..=ECHO_RAM_END => self.memory[(addr - ECHO_RAM_OFFSET) as usize],
            INTERRUPT_FLAGS_REGISTER => 0b1110_0000 | self.memory[addr as usize],
            _ => self.memory[addr as usize],
        }
    }

    /// Every special-cased address short-circuits the plain store below it.
    pub fn write(&mut self, addr: u16, data: u8) {
        match addr {
            OAM_DMA_REGISTER => self.dma_transfer(data),
            DIV_REGISTER => {
                self.memory[addr as usize] = 0;
                self.div_reset = true;
            }
            SCANLINE_Y_REGISTER => self.memory[addr as usize] = 0,
            ECHO_RAM_START..=ECHO_RAM_END => {
                self.memory[addr as usize] = data;
                self.memory[(addr - ECHO_RAM_OFFSET) as usize] = data;
            }
            UNUSABLE_START..=UNUSABLE_END => {
                warn!("Discarding write of ${:02x} to unusable memory at ${:04x}", data, addr);
            }
            0x0000..=0x7fff | EXTERNAL_RAM_START..=EXTERNAL_RAM_END => self.cartridge.write(addr, data),
            JOYPAD_REGISTER => self.memory[addr as usize] = data & 0b0011_0000,
            LCD_STATUS_REGISTER => {
                let current = self.memory[addr as usize];
                self.memory[addr as usize] = (current & !STAT_WRITABLE_BITS) | (data & STAT_WRITABLE_BITS);
            }
            INTERRUPT_FLAGS_REGISTER => self.memory[addr as usize] = data & 0b0001_1111,
            BOOTROM_MAPPER_REGISTER => {
                if data != 0 && self.bootrom_mapped {
                    debug!("Unmapping boot ROM");
                    self.bootrom_mapped = false;
                }
                self.memory[addr as usize] = data;
            }
            _ => self.memory[addr as usize] = data,
        }
    }

    pub fn read16(&self, addr: u16) -> u16 {
        u16::from_le_bytes([self.read(addr), self.read(addr.wrapping_add(1))])
    }

    pub fn write16(&mut self, addr: u16, data: u16) {
        let [lo, hi] = data.to_le_bytes();
        self.write(addr, lo);
        self.write(addr.wrapping_add(1), hi);
    }

    pub fn read_as<T>(&self, addr: u16) -> T
    where
        T: From<u8>,
    {
        T::from(self.read(addr))
    }

    /// Reads the backing byte without any of the address-dependent behavior of [`Mmu::read`].
    /// Only meant for hardware units that own the register, such as the timer and PPU.
    #[inline]
    pub fn read_raw(&self, addr: u16) -> u8 {
        self.memory[addr as usize]
    }

    /// Stores into the backing byte without triggering the side effects of [`Mmu::write`],
    /// so DIV and LY can advance without being cleared.
    #[inline]
    pub fn write_raw(&mut self, addr: u16, data: u8) {
        self.memory[addr as usize] = data;
    }

    pub fn read_raw_as<T>(&self, addr: u16) -> T
    where
        T: From<u8>,
    {
        T::from(self.read_raw(addr))
    }

    pub fn interrupt_flags(&self) -> InterruptFlags {
        self.read_raw_as::<InterruptFlags>(INTERRUPT_FLAGS_REGISTER)
    }

    pub fn set_interrupt_flags(&mut self, flags: InterruptFlags) {
        self.write_raw(INTERRUPT_FLAGS_REGISTER, flags.bits());
    }

    pub fn request_interrupt(&mut self, flags: InterruptFlags) {
        let pending = self.interrupt_flags() | flags;
        self.set_interrupt_flags(pending);
    }

    /// Reports, once, that DIV was written since the last call.
    pub fn take_div_reset(&mut self) -> bool {
        std::mem::take(&mut self.div_reset)
    }

    pub fn is_bootrom_mapped(&self) -> bool {
        self.bootrom_mapped
    }

    pub fn cartridge(&self) -> &Cartridge {
        &self.cartridge
    }

    pub fn joypad(&self) -> &Joypad {
        &self.joypad
    }

    pub fn joypad_mut(&mut self) -> &mut Joypad {
        &mut self.joypad
    }

    fn dma_transfer(&mut self, data: u8) {
        let source = (data as u16) << 8;
        debug!("OAM DMA from ${:04x}", source);

        for i in 0..OAM_SIZE {
            let value = self.read(source.wrapping_add(i));
            self.memory[(OAM_START + i) as usize] = value;
        }
    }
}
