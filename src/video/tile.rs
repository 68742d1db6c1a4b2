use crate::video::{TILESET_0_ADDRESS, TILESET_1_ADDRESS};

/// Bytes per 8x8 tile, two bitplanes per row.
pub const TILE_SIZE: u16 = 16;

/// Start of a tile's data. With LCDC bit 4 set tiles are indexed unsigned from $8000,
/// otherwise signed around $9000.
pub fn tile_address(unsigned_addressing: bool, index: u8) -> u16 {
    if unsigned_addressing {
        TILESET_0_ADDRESS + index as u16 * TILE_SIZE
    } else {
        TILESET_1_ADDRESS.wrapping_add_signed(index as i8 as i16 * TILE_SIZE as i16)
    }
}

/// 2-bit color index of a pixel in a tile row. Column 0 is the leftmost pixel.
pub fn color_index(lsb: u8, msb: u8, column: u8) -> u8 {
    let bit = 7 - (column & 0b111);
    let lsb_bit = (lsb >> bit) & 0b0000_0001;
    let msb_bit = (msb >> bit) & 0b0000_0001;
    (msb_bit << 1) | lsb_bit
}
