//! A DMG Game Boy core: SM83 CPU, memory bus with MBC1 banking, timer, interrupts
//! and a scanline PPU, driven one frame at a time by [`gameboy::GameBoy`].

pub mod error;
pub mod gameboy;
pub mod joypad;
pub mod lr35902;
pub mod memory;
pub mod video;
