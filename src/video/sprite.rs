use crate::memory::mmu::Mmu;
use crate::memory::OAM_START;
use bitflags::bitflags;

pub const OAM_SPRITE_COUNT: usize = 40;
pub const MAX_SPRITES_PER_LINE: usize = 10;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SpriteAttributes: u8 {
        const PALETTE  = 0b0001_0000;
        const FLIP_X   = 0b0010_0000;
        const FLIP_Y   = 0b0100_0000;
        const PRIORITY = 0b1000_0000;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    pub index: usize,
    pub y: u8,
    pub x: u8,
    pub tile_index: u8,
    pub attributes: SpriteAttributes,
}

impl Sprite {
    pub fn from_oam(mmu: &Mmu, index: usize) -> Sprite {
        let sprite_addr = OAM_START + (index as u16 * 4);

        Sprite {
            index,
            y: mmu.read_raw(sprite_addr),
            x: mmu.read_raw(sprite_addr + 1),
            tile_index: mmu.read_raw(sprite_addr + 2),
            attributes: SpriteAttributes::from_bits_truncate(mmu.read_raw(sprite_addr + 3)),
        }
    }

    /// Sprites selected for a scanline: the first ten overlapping it in OAM order,
    /// sorted so the one drawn on top comes first (lower X, then lower OAM index).
    pub fn scan_line(mmu: &Mmu, scanline: u8, height: u8) -> Vec<Sprite> {
        let mut sprites = (0..OAM_SPRITE_COUNT)
            .map(|index| Sprite::from_oam(mmu, index))
            .filter(|sprite| sprite.is_visible_on_scanline(scanline, height))
            .take(MAX_SPRITES_PER_LINE)
            .collect::<Vec<Sprite>>();

        sprites.sort_by_key(|sprite| (sprite.x, sprite.index));
        sprites
    }

    pub fn is_visible_on_scanline(&self, scanline: u8, height: u8) -> bool {
        let top = self.y as i16 - 16;
        let line = scanline as i16;
        line >= top && line < top + height as i16
    }

    /// Column inside the sprite covering screen column `x`, if any.
    pub fn column_at(&self, x: usize) -> Option<u8> {
        let left = self.x as i16 - 8;
        let column = x as i16 - left;
        (0..8).contains(&column).then_some(column as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::mmu::tests::test_mmu;

    fn place(mmu: &mut Mmu, index: usize, y: u8, x: u8) {
        let addr = OAM_START + (index as u16 * 4);
        mmu.write(addr, y);
        mmu.write(addr + 1, x);
    }

    #[test]
    fn only_the_first_ten_in_oam_order_are_selected() {
        let mut mmu = test_mmu();
        for index in 0..12 {
            place(&mut mmu, index, 16, 100 - index as u8);
        }

        let sprites = Sprite::scan_line(&mmu, 0, 8);
        assert_eq!(sprites.len(), MAX_SPRITES_PER_LINE);
        assert!(sprites.iter().all(|sprite| sprite.index < 10));
        // lowest X first
        assert_eq!(sprites[0].index, 9);
    }

    #[test]
    fn equal_x_falls_back_to_oam_index() {
        let mut mmu = test_mmu();
        place(&mut mmu, 3, 16, 40);
        place(&mut mmu, 1, 16, 40);

        let order = Sprite::scan_line(&mmu, 4, 8).iter().map(|sprite| sprite.index).collect::<Vec<usize>>();
        assert_eq!(order, vec![1, 3]);
    }

    #[test]
    fn tall_sprites_cover_sixteen_lines() {
        let mut mmu = test_mmu();
        place(&mut mmu, 0, 16, 8);

        assert_eq!(Sprite::scan_line(&mmu, 12, 8).len(), 0);
        assert_eq!(Sprite::scan_line(&mmu, 12, 16).len(), 1);
    }

    #[test]
    fn column_lookup_handles_the_left_edge() {
        let sprite = Sprite {
            index: 0,
            y: 16,
            x: 4,
            tile_index: 0,
            attributes: SpriteAttributes::empty(),
        };

        assert_eq!(sprite.column_at(0), Some(4));
        assert_eq!(sprite.column_at(3), Some(7));
        assert_eq!(sprite.column_at(4), None);
    }
}
