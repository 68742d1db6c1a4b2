use crate::memory::registers::LcdStatus;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum State {
    HBlank,  // H-Blank
    VBlank,  // V-Blank
    OamScan, // OAM Scan
    Drawing, // Pixel transfer
}

impl State {
    pub fn as_u8(self) -> u8 {
        match self {
            State::HBlank => 0,
            State::VBlank => 1,
            State::OamScan => 2,
            State::Drawing => 3,
        }
    }

    /// STAT enable bit that turns entering this mode into an interrupt.
    pub fn interrupt_source(self) -> Option<LcdStatus> {
        match self {
            State::HBlank => Some(LcdStatus::HBLANK_INTERRUPT),
            State::VBlank => Some(LcdStatus::VBLANK_INTERRUPT),
            State::OamScan => Some(LcdStatus::OAM_INTERRUPT),
            State::Drawing => None,
        }
    }
}
