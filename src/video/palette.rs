pub type Color = [u8; 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Palette {
    #[default]
    White,
    LightGray,
    DarkGray,
    Black,
}

impl Palette {
    /// Maps a 2-bit color index through a BGP/OBP style palette register.
    pub fn from_register(color: u8, register: u8) -> Palette {
        let shade = (register >> ((color & 0b11) * 2)) & 0b11;

        match shade {
            0b00 => Palette::White,
            0b01 => Palette::LightGray,
            0b10 => Palette::DarkGray,
            _ => Palette::Black,
        }
    }
}

impl From<Palette> for Color {
    fn from(palette: Palette) -> Color {
        match palette {
            Palette::White => [0xff, 0xff, 0xff],
            Palette::LightGray => [0xaa, 0xaa, 0xaa],
            Palette::DarkGray => [0x55, 0x55, 0x55],
            Palette::Black => [0x00, 0x00, 0x00],
        }
    }
}
