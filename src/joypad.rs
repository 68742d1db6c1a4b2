use log::trace;

const BUTTON_SELECT: u8 = 0b0010_0000;
const DIRECTION_SELECT: u8 = 0b0001_0000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Button {
    A,
    B,
    Select,
    Start,
    Right,
    Left,
    Up,
    Down,
}

impl Button {
    fn is_direction(&self) -> bool {
        matches!(self, Button::Right | Button::Left | Button::Up | Button::Down)
    }

    fn mask(&self) -> u8 {
        match self {
            Button::A | Button::Right => 0b0001,
            Button::B | Button::Left => 0b0010,
            Button::Select | Button::Up => 0b0100,
            Button::Start | Button::Down => 0b1000,
        }
    }
}

/// Button state as two active-low nibbles, the way P1 exposes them.
#[derive(Clone, Debug)]
pub struct Joypad {
    buttons: u8,
    directions: u8,
}

impl Joypad {
    pub fn new() -> Joypad {
        Joypad {
            buttons: 0x0f,
            directions: 0x0f,
        }
    }

    /// Replaces both masks. A cleared bit means pressed.
    pub fn set_state(&mut self, buttons: u8, directions: u8) {
        self.buttons = buttons & 0x0f;
        self.directions = directions & 0x0f;
    }

    /// Returns true when the button went from released to pressed.
    pub fn press(&mut self, button: Button) -> bool {
        let mask = button.mask();
        let state = self.state_mut(button);
        let was_released = *state & mask != 0;
        *state &= !mask;
        was_released
    }

    pub fn release(&mut self, button: Button) {
        let mask = button.mask();
        *self.state_mut(button) |= mask;
    }

    pub fn buttons(&self) -> u8 {
        self.buttons
    }

    pub fn directions(&self) -> u8 {
        self.directions
    }

    /// Value of P1 given the select bits last written by the game.
    pub fn as_u8(&self, joypad_state: u8) -> u8 {
        let button_select = joypad_state & BUTTON_SELECT == 0;
        let direction_select = joypad_state & DIRECTION_SELECT == 0;

        let nibble = match (button_select, direction_select) {
            (true, true) => {
                trace!("Joypad has buttons and d-pad mode selected");
                self.buttons & self.directions
            }
            (true, false) => self.buttons,
            (false, true) => self.directions,
            (false, false) => 0x0f,
        };

        0b1100_0000 | (joypad_state & (BUTTON_SELECT | DIRECTION_SELECT)) | nibble
    }

    fn state_mut(&mut self, button: Button) -> &mut u8 {
        if button.is_direction() {
            &mut self.directions
        } else {
            &mut self.buttons
        }
    }
}

impl Default for Joypad {
    fn default() -> Joypad {
        Joypad::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_bits_pick_the_nibble() {
        let mut joypad = Joypad::new();
        joypad.press(Button::Start);
        joypad.press(Button::Left);

        assert_eq!(joypad.as_u8(0x10), 0b1101_0111);
        assert_eq!(joypad.as_u8(0x20), 0b1110_1101);
        assert_eq!(joypad.as_u8(0x30), 0b1111_1111);
    }

    #[test]
    fn press_reports_edges_only() {
        let mut joypad = Joypad::new();
        assert!(joypad.press(Button::A));
        assert!(!joypad.press(Button::A));
        joypad.release(Button::A);
        assert_eq!(joypad.buttons(), 0x0f);
        assert!(joypad.press(Button::A));
    }

    #[test]
    fn set_state_masks_to_four_bits() {
        let mut joypad = Joypad::new();
        joypad.set_state(0xfe, 0xf7);
        assert_eq!(joypad.buttons(), 0x0e);
        assert_eq!(joypad.directions(), 0x07);
    }
}
