pub mod palette;
pub mod ppu;
pub mod sprite;
pub mod state;
pub mod tile;

pub const SCREEN_WIDTH: usize = 160;
pub const SCREEN_HEIGHT: usize = 144;

pub const TILESET_0_ADDRESS: u16 = 0x8000;
pub const TILESET_1_ADDRESS: u16 = 0x9000;
pub const TILEMAP_0_ADDRESS: u16 = 0x9800;
pub const TILEMAP_1_ADDRESS: u16 = 0x9c00;
pub const TILEMAP_WIDTH: u16 = 32;

/// Scanline timing in machine cycles. A line is 114 cycles: OAM scan for the first
/// 21, pixel transfer up to 64, then H-Blank.
pub const CYCLES_PER_SCANLINE: usize = 114;
pub const OAM_SCAN_END: usize = 21;
pub const TRANSFER_END: usize = 64;

pub const SCANLINES_PER_FRAME: usize = 154;
pub const CYCLES_PER_FRAME: usize = CYCLES_PER_SCANLINE * SCANLINES_PER_FRAME;
