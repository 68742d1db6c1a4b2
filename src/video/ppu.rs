use crate::memory::mmu::Mmu;
use crate::memory::registers::{InterruptFlags, LcdControl, LcdStatus};
use crate::memory::{
    BG_PALETTE_REGISTER, LCD_CONTROL_REGISTER, LCD_STATUS_REGISTER, OBJ0_PALETTE_REGISTER,
    OBJ1_PALETTE_REGISTER, SCANLINE_Y_COMPARE_REGISTER, SCANLINE_Y_REGISTER, SCROLL_X_REGISTER,
    SCROLL_Y_REGISTER, WINDOW_X_REGISTER, WINDOW_Y_REGISTER,
};
use crate::video::palette::{Color, Palette};
use crate::video::sprite::{Sprite, SpriteAttributes};
use crate::video::state::State;
use crate::video::tile::{self, TILE_SIZE};
use crate::video::{
    CYCLES_PER_SCANLINE, OAM_SCAN_END, SCANLINES_PER_FRAME, SCREEN_HEIGHT, SCREEN_WIDTH,
    TILEMAP_0_ADDRESS, TILEMAP_1_ADDRESS, TILEMAP_WIDTH, TILESET_0_ADDRESS, TRANSFER_END,
};
use log::trace;

pub type Frame = [[Palette; SCREEN_WIDTH]; SCREEN_HEIGHT];

pub struct Ppu {
    buffer: Box<Frame>,
    frame: Box<Frame>,
    scanline_counter: usize,
    state: State,
    window_line: u8,
    frame_ready: bool,
}

impl Ppu {
    pub fn new() -> Ppu {
        Ppu {
            buffer: Box::new([[Palette::default(); SCREEN_WIDTH]; SCREEN_HEIGHT]),
            frame: Box::new([[Palette::default(); SCREEN_WIDTH]; SCREEN_HEIGHT]),
            scanline_counter: 0,
            state: State::HBlank,
            window_line: 0,
            frame_ready: false,
        }
    }

    /// Advances the LCD by `cycles` machine cycles and returns the interrupts raised.
    /// Every visible line is rendered into the back buffer as it completes.
    pub fn tick(&mut self, mmu: &mut Mmu, cycles: usize) -> InterruptFlags {
        let lcdc = mmu.read_raw_as::<LcdControl>(LCD_CONTROL_REGISTER);
        if !lcdc.contains(LcdControl::LCD_DISPLAY) {
            self.disable(mmu);
            return InterruptFlags::empty();
        }

        let mut raised = InterruptFlags::empty();
        self.scanline_counter += cycles;

        while self.scanline_counter >= CYCLES_PER_SCANLINE {
            self.scanline_counter -= CYCLES_PER_SCANLINE;

            let mut ly = mmu.read_raw(SCANLINE_Y_REGISTER);
            if (ly as usize) < SCREEN_HEIGHT {
                self.render_scanline(mmu, ly);
            }

            ly += 1;
            if ly as usize == SCREEN_HEIGHT {
                trace!("Entering V-Blank");
                self.frame_ready = true;
                raised |= InterruptFlags::VBLANK;
            } else if ly as usize >= SCANLINES_PER_FRAME {
                ly = 0;
                self.window_line = 0;
            }

            mmu.write_raw(SCANLINE_Y_REGISTER, ly);
            raised |= self.compare_scanline(mmu);
        }

        raised |= self.update_state(mmu);
        raised |= self.compare_scanline(mmu);
        raised
    }

    fn disable(&mut self, mmu: &mut Mmu) {
        self.scanline_counter = 0;
        self.window_line = 0;
        self.state = State::HBlank;

        mmu.write_raw(SCANLINE_Y_REGISTER, 0);
        let stat = mmu.read_raw(LCD_STATUS_REGISTER) & !LcdStatus::MODE.bits();
        mmu.write_raw(LCD_STATUS_REGISTER, stat);
    }

    fn update_state(&mut self, mmu: &mut Mmu) -> InterruptFlags {
        let state = if mmu.read_raw(SCANLINE_Y_REGISTER) as usize >= SCREEN_HEIGHT {
            State::VBlank
        } else if self.scanline_counter < OAM_SCAN_END {
            State::OamScan
        } else if self.scanline_counter < TRANSFER_END {
            State::Drawing
        } else {
            State::HBlank
        };

        if state == self.state {
            return InterruptFlags::empty();
        }
        self.state = state;

        let stat = mmu.read_raw_as::<LcdStatus>(LCD_STATUS_REGISTER);
        let updated = (stat.bits() & !LcdStatus::MODE.bits()) | state.as_u8();
        mmu.write_raw(LCD_STATUS_REGISTER, updated);

        match state.interrupt_source() {
            Some(source) if stat.contains(source) => InterruptFlags::LCD_STAT,
            _ => InterruptFlags::empty(),
        }
    }

    /// Refreshes the coincidence flag and requests the STAT interrupt on every update
    /// while LY matches LYC.
    fn compare_scanline(&self, mmu: &mut Mmu) -> InterruptFlags {
        let coincidence = mmu.read_raw(SCANLINE_Y_REGISTER) == mmu.read_raw(SCANLINE_Y_COMPARE_REGISTER);
        let mut stat = mmu.read_raw_as::<LcdStatus>(LCD_STATUS_REGISTER);
        stat.set(LcdStatus::COINCIDENCE, coincidence);
        mmu.write_raw(LCD_STATUS_REGISTER, stat.bits());

        if coincidence && stat.contains(LcdStatus::COINCIDENCE_INTERRUPT) {
            InterruptFlags::LCD_STAT
        } else {
            InterruptFlags::empty()
        }
    }

    fn render_scanline(&mut self, mmu: &Mmu, ly: u8) {
        let lcdc = mmu.read_raw_as::<LcdControl>(LCD_CONTROL_REGISTER);
        let mut colors = [0u8; SCREEN_WIDTH];

        if lcdc.contains(LcdControl::BG_DISPLAY) {
            self.render_background(mmu, lcdc, ly, &mut colors);
            if lcdc.contains(LcdControl::WINDOW_DISPLAY) {
                self.render_window(mmu, lcdc, ly, &mut colors);
            }
        }

        let bgp = mmu.read_raw(BG_PALETTE_REGISTER);
        let line = &mut self.buffer[ly as usize];
        for (pixel, color) in line.iter_mut().zip(colors.iter()) {
            *pixel = Palette::from_register(*color, bgp);
        }

        if lcdc.contains(LcdControl::OBJ_DISPLAY) {
            self.render_sprites(mmu, lcdc, ly, &colors);
        }
    }

    fn render_background(&self, mmu: &Mmu, lcdc: LcdControl, ly: u8, colors: &mut [u8; SCREEN_WIDTH]) {
        let scy = mmu.read_raw(SCROLL_Y_REGISTER);
        let scx = mmu.read_raw(SCROLL_X_REGISTER);
        let map = if lcdc.contains(LcdControl::BG_TILE_MAP) {
            TILEMAP_1_ADDRESS
        } else {
            TILEMAP_0_ADDRESS
        };

        let y = ly.wrapping_add(scy);
        for (x, color) in colors.iter_mut().enumerate() {
            *color = self.fetch_map_pixel(mmu, lcdc, map, (x as u8).wrapping_add(scx), y);
        }
    }

    fn render_window(&mut self, mmu: &Mmu, lcdc: LcdControl, ly: u8, colors: &mut [u8; SCREEN_WIDTH]) {
        let wy = mmu.read_raw(WINDOW_Y_REGISTER);
        let wx = mmu.read_raw(WINDOW_X_REGISTER) as i16 - 7;
        if ly < wy || wx >= SCREEN_WIDTH as i16 {
            return;
        }

        let map = if lcdc.contains(LcdControl::WINDOW_TILE_MAP) {
            TILEMAP_1_ADDRESS
        } else {
            TILEMAP_0_ADDRESS
        };

        for x in wx.max(0) as usize..SCREEN_WIDTH {
            let window_x = (x as i16 - wx) as u8;
            colors[x] = self.fetch_map_pixel(mmu, lcdc, map, window_x, self.window_line);
        }

        // the window keeps its own line counter, so hiding it for a few lines
        // resumes where it left off
        self.window_line = self.window_line.wrapping_add(1);
    }

    fn fetch_map_pixel(&self, mmu: &Mmu, lcdc: LcdControl, map: u16, x: u8, y: u8) -> u8 {
        let map_addr = map + (y as u16 / 8) * TILEMAP_WIDTH + x as u16 / 8;
        let index = mmu.read_raw(map_addr);
        let row_addr = tile::tile_address(lcdc.contains(LcdControl::BG_TILE_DATA), index) + (y as u16 % 8) * 2;

        tile::color_index(mmu.read_raw(row_addr), mmu.read_raw(row_addr + 1), x % 8)
    }

    fn render_sprites(&mut self, mmu: &Mmu, lcdc: LcdControl, ly: u8, bg_colors: &[u8; SCREEN_WIDTH]) {
        let height = if lcdc.contains(LcdControl::OBJ_SIZE) { 16 } else { 8 };
        let sprites = Sprite::scan_line(mmu, ly, height);
        if sprites.is_empty() {
            return;
        }

        let obp0 = mmu.read_raw(OBJ0_PALETTE_REGISTER);
        let obp1 = mmu.read_raw(OBJ1_PALETTE_REGISTER);

        for x in 0..SCREEN_WIDTH {
            // the first opaque sprite pixel wins, even if it then hides behind the background
            let pixel = sprites.iter().find_map(|sprite| {
                let column = sprite.column_at(x)?;
                let color = self.fetch_sprite_pixel(mmu, sprite, ly, column, height);
                (color != 0).then_some((sprite, color))
            });

            let Some((sprite, color)) = pixel else {
                continue;
            };

            if sprite.attributes.contains(SpriteAttributes::PRIORITY) && bg_colors[x] != 0 {
                continue;
            }

            let palette = if sprite.attributes.contains(SpriteAttributes::PALETTE) {
                obp1
            } else {
                obp0
            };
            self.buffer[ly as usize][x] = Palette::from_register(color, palette);
        }
    }

    fn fetch_sprite_pixel(&self, mmu: &Mmu, sprite: &Sprite, ly: u8, column: u8, height: u8) -> u8 {
        let mut row = (ly as i16 - (sprite.y as i16 - 16)) as u8;
        if sprite.attributes.contains(SpriteAttributes::FLIP_Y) {
            row = height - 1 - row;
        }

        let column = if sprite.attributes.contains(SpriteAttributes::FLIP_X) {
            7 - column
        } else {
            column
        };

        // 8x16 sprites ignore bit 0 of the tile index
        let tile_index = if height == 16 {
            sprite.tile_index & 0xfe
        } else {
            sprite.tile_index
        };

        let row_addr = TILESET_0_ADDRESS + tile_index as u16 * TILE_SIZE + row as u16 * 2;
        tile::color_index(mmu.read_raw(row_addr), mmu.read_raw(row_addr + 1), column)
    }

    /// Publishes the back buffer as the current frame.
    pub fn flush(&mut self) {
        *self.frame = *self.buffer;
        self.frame_ready = false;
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// The current frame as packed RGB24, row-major.
    pub fn frame_rgb(&self) -> Vec<u8> {
        self.frame
            .iter()
            .flatten()
            .flat_map(|pixel| Color::from(*pixel))
            .collect()
    }

    /// Set when the PPU entered V-Blank since the last [`Ppu::flush`].
    pub fn frame_ready(&self) -> bool {
        self.frame_ready
    }

    pub fn state(&self) -> State {
        self.state
    }
}

impl Default for Ppu {
    fn default() -> Ppu {
        Ppu::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::mmu::tests::test_mmu;
    use crate::memory::OAM_START;
    use crate::video::CYCLES_PER_FRAME;

    fn lcd_on() -> Mmu {
        let mut mmu = test_mmu();
        // LCD on, unsigned tile data, BG and sprites enabled
        mmu.write(LCD_CONTROL_REGISTER, 0b1001_0011);
        mmu.write(BG_PALETTE_REGISTER, 0xe4);
        mmu.write(OBJ0_PALETTE_REGISTER, 0xe4);
        mmu.write(OBJ1_PALETTE_REGISTER, 0x1b);
        mmu
    }

    fn fill_tile(mmu: &mut Mmu, index: u16, color: u8) {
        let lsb = if color & 1 != 0 { 0xff } else { 0x00 };
        let msb = if color & 2 != 0 { 0xff } else { 0x00 };
        for row in 0..8 {
            mmu.write(TILESET_0_ADDRESS + index * TILE_SIZE + row * 2, lsb);
            mmu.write(TILESET_0_ADDRESS + index * TILE_SIZE + row * 2 + 1, msb);
        }
    }

    fn place_sprite(mmu: &mut Mmu, slot: u16, y: u8, x: u8, tile: u8, attributes: u8) {
        let addr = OAM_START + slot * 4;
        mmu.write(addr, y);
        mmu.write(addr + 1, x);
        mmu.write(addr + 2, tile);
        mmu.write(addr + 3, attributes);
    }

    fn render_line(ppu: &mut Ppu, mmu: &mut Mmu) {
        ppu.tick(mmu, CYCLES_PER_SCANLINE);
        ppu.flush();
    }

    #[test]
    fn visible_lines_end_in_one_vblank() {
        let mut mmu = lcd_on();
        let mut ppu = Ppu::new();

        let mut vblanks = 0;
        for _ in 0..SCREEN_HEIGHT {
            if ppu.tick(&mut mmu, CYCLES_PER_SCANLINE).contains(InterruptFlags::VBLANK) {
                vblanks += 1;
            }
        }

        assert_eq!(mmu.read(SCANLINE_Y_REGISTER), 144);
        assert_eq!(vblanks, 1);
        assert_eq!(ppu.state(), State::VBlank);
        assert!(ppu.frame_ready());
        assert_eq!(mmu.read(LCD_STATUS_REGISTER) & 0b11, 1);
    }

    #[test]
    fn full_frame_wraps_scanline() {
        let mut mmu = lcd_on();
        let mut ppu = Ppu::new();

        let mut raised = InterruptFlags::empty();
        for _ in 0..CYCLES_PER_FRAME / 2 {
            raised |= ppu.tick(&mut mmu, 2);
        }

        assert_eq!(mmu.read(SCANLINE_Y_REGISTER), 0);
        assert!(raised.contains(InterruptFlags::VBLANK));
    }

    #[test]
    fn modes_follow_scanline_position() {
        let mut mmu = lcd_on();
        let mut ppu = Ppu::new();

        ppu.tick(&mut mmu, 10);
        assert_eq!(mmu.read(LCD_STATUS_REGISTER) & 0b11, 2);
        ppu.tick(&mut mmu, 20);
        assert_eq!(mmu.read(LCD_STATUS_REGISTER) & 0b11, 3);
        ppu.tick(&mut mmu, 40);
        assert_eq!(mmu.read(LCD_STATUS_REGISTER) & 0b11, 0);
        ppu.tick(&mut mmu, 44);
        assert_eq!(mmu.read(LCD_STATUS_REGISTER) & 0b11, 2);
        assert_eq!(mmu.read(SCANLINE_Y_REGISTER), 1);
    }

    #[test]
    fn hblank_interrupt_needs_enable_bit() {
        let mut mmu = lcd_on();
        let mut ppu = Ppu::new();
        assert!(ppu.tick(&mut mmu, 70).is_empty());

        let mut mmu = lcd_on();
        let mut ppu = Ppu::new();
        mmu.write(LCD_STATUS_REGISTER, LcdStatus::HBLANK_INTERRUPT.bits());
        ppu.tick(&mut mmu, 30);
        assert_eq!(ppu.tick(&mut mmu, 40), InterruptFlags::LCD_STAT);
    }

    #[test]
    fn lyc_match_raises_on_every_update_of_the_line() {
        let mut mmu = lcd_on();
        let mut ppu = Ppu::new();
        mmu.write(SCANLINE_Y_COMPARE_REGISTER, 3);
        mmu.write(LCD_STATUS_REGISTER, LcdStatus::COINCIDENCE_INTERRUPT.bits());

        let mut hits = 0;
        for _ in 0..(CYCLES_PER_SCANLINE * 5) {
            if ppu.tick(&mut mmu, 1).contains(InterruptFlags::LCD_STAT) {
                hits += 1;
                assert_eq!(mmu.read(SCANLINE_Y_REGISTER), 3);
            }
        }

        assert_eq!(hits, CYCLES_PER_SCANLINE);
        assert_eq!(mmu.read(LCD_STATUS_REGISTER) & LcdStatus::COINCIDENCE.bits(), 0);
    }

    #[test]
    fn lyc_match_keeps_raising_while_ly_holds() {
        let mut mmu = lcd_on();
        let mut ppu = Ppu::new();
        mmu.write(SCANLINE_Y_COMPARE_REGISTER, 0);
        mmu.write(LCD_STATUS_REGISTER, LcdStatus::COINCIDENCE_INTERRUPT.bits());

        assert!(ppu.tick(&mut mmu, 1).contains(InterruptFlags::LCD_STAT));
        assert!(ppu.tick(&mut mmu, 1).contains(InterruptFlags::LCD_STAT));
        assert_eq!(mmu.read(SCANLINE_Y_REGISTER), 0);
    }

    #[test]
    fn lcd_off_resets_scanline() {
        let mut mmu = lcd_on();
        let mut ppu = Ppu::new();
        ppu.tick(&mut mmu, CYCLES_PER_SCANLINE * 10 + 30);
        assert_eq!(mmu.read(SCANLINE_Y_REGISTER), 10);

        mmu.write(LCD_CONTROL_REGISTER, 0);
        assert!(ppu.tick(&mut mmu, CYCLES_PER_SCANLINE * 3).is_empty());
        assert_eq!(mmu.read(SCANLINE_Y_REGISTER), 0);
        assert_eq!(mmu.read(LCD_STATUS_REGISTER) & 0b11, 0);
    }

    #[test]
    fn background_uses_tile_map_and_scroll() {
        let mut mmu = lcd_on();
        let mut ppu = Ppu::new();
        fill_tile(&mut mmu, 1, 3);
        // second tile of the first map row
        mmu.write(TILEMAP_0_ADDRESS + 1, 1);

        render_line(&mut ppu, &mut mmu);
        assert_eq!(ppu.frame()[0][7], Palette::White);
        assert_eq!(ppu.frame()[0][8], Palette::Black);
        assert_eq!(ppu.frame()[0][15], Palette::Black);
        assert_eq!(ppu.frame()[0][16], Palette::White);

        mmu.write(SCROLL_X_REGISTER, 4);
        render_line(&mut ppu, &mut mmu);
        assert_eq!(ppu.frame()[1][3], Palette::White);
        assert_eq!(ppu.frame()[1][4], Palette::Black);
    }

    #[test]
    fn window_covers_background_from_wx() {
        let mut mmu = lcd_on();
        let mut ppu = Ppu::new();
        fill_tile(&mut mmu, 2, 2);
        for i in 0..32 {
            mmu.write(TILEMAP_1_ADDRESS + i, 2);
        }

        let lcdc = mmu.read(LCD_CONTROL_REGISTER);
        mmu.write(LCD_CONTROL_REGISTER, lcdc | (LcdControl::WINDOW_DISPLAY | LcdControl::WINDOW_TILE_MAP).bits());
        mmu.write(WINDOW_Y_REGISTER, 0);
        mmu.write(WINDOW_X_REGISTER, 7 + 80);

        render_line(&mut ppu, &mut mmu);
        assert_eq!(ppu.frame()[0][79], Palette::White);
        assert_eq!(ppu.frame()[0][80], Palette::DarkGray);
        assert_eq!(ppu.frame()[0][159], Palette::DarkGray);
    }

    #[test]
    fn sprites_draw_over_background() {
        let mut mmu = lcd_on();
        let mut ppu = Ppu::new();
        fill_tile(&mut mmu, 4, 1);
        place_sprite(&mut mmu, 0, 16, 8 + 20, 4, 0);

        render_line(&mut ppu, &mut mmu);
        assert_eq!(ppu.frame()[0][19], Palette::White);
        assert_eq!(ppu.frame()[0][20], Palette::LightGray);
        assert_eq!(ppu.frame()[0][27], Palette::LightGray);
        assert_eq!(ppu.frame()[0][28], Palette::White);
    }

    #[test]
    fn lower_x_wins_overlap() {
        let mut mmu = lcd_on();
        let mut ppu = Ppu::new();
        fill_tile(&mut mmu, 4, 1);
        fill_tile(&mut mmu, 5, 3);
        // slot 0 sits further right, so slot 1 is drawn on top where they overlap
        place_sprite(&mut mmu, 0, 16, 8 + 12, 4, 0);
        place_sprite(&mut mmu, 1, 16, 8 + 8, 5, 0);

        render_line(&mut ppu, &mut mmu);
        assert_eq!(ppu.frame()[0][12], Palette::Black);
        assert_eq!(ppu.frame()[0][15], Palette::Black);
        assert_eq!(ppu.frame()[0][16], Palette::LightGray);
    }

    #[test]
    fn sprite_palette_and_priority_attributes() {
        let mut mmu = lcd_on();
        let mut ppu = Ppu::new();
        fill_tile(&mut mmu, 1, 1);
        fill_tile(&mut mmu, 4, 1);
        // background tile under the left half of the screen
        mmu.write(TILEMAP_0_ADDRESS, 1);

        place_sprite(&mut mmu, 0, 16, 8, 4, SpriteAttributes::PRIORITY.bits());
        place_sprite(&mut mmu, 1, 16, 8 + 40, 4, SpriteAttributes::PALETTE.bits());

        render_line(&mut ppu, &mut mmu);
        // hidden behind a non-zero background color
        assert_eq!(ppu.frame()[0][0], Palette::LightGray);
        // OBP1 is $1b, mapping color 1 to dark gray
        assert_eq!(ppu.frame()[0][40], Palette::DarkGray);
    }

    #[test]
    fn ten_sprites_per_line() {
        let mut mmu = lcd_on();
        let mut ppu = Ppu::new();
        fill_tile(&mut mmu, 4, 3);
        for slot in 0..12u16 {
            place_sprite(&mut mmu, slot, 16, 8 + slot as u8 * 8, 4, 0);
        }

        render_line(&mut ppu, &mut mmu);
        assert_eq!(ppu.frame()[0][79], Palette::Black);
        assert_eq!(ppu.frame()[0][80], Palette::White);
        assert_eq!(ppu.frame()[0][95], Palette::White);
    }

    #[test]
    fn frame_converts_to_rgb() {
        let mut ppu = Ppu::new();
        ppu.flush();
        let rgb = ppu.frame_rgb();
        assert_eq!(rgb.len(), SCREEN_WIDTH * SCREEN_HEIGHT * 3);
        assert!(rgb.iter().all(|byte| *byte == 0xff));
    }
}
