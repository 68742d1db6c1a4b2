use crate::memory::registers::InterruptFlags;

/// Interrupt master enable. EI only takes effect after the next instruction,
/// hence the pending latch.
#[derive(Clone, Debug, Default)]
pub struct Ime {
    pub enabled: bool,
    pub enable_pending: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vector {
    VBlank,
    Stat,
    Timer,
    Serial,
    Joypad,
}

impl Vector {
    const ALL: [Vector; 5] = [Vector::VBlank, Vector::Stat, Vector::Timer, Vector::Serial, Vector::Joypad];

    /// Picks the highest priority source among the requested and enabled ones.
    pub fn from_flags(flags: InterruptFlags) -> Option<Vector> {
        let flag = flags.highest_priority()?;
        Vector::ALL.into_iter().find(|vector| vector.to_flag() == flag)
    }

    pub fn to_flag(&self) -> InterruptFlags {
        match self {
            Vector::VBlank => InterruptFlags::VBLANK,
            Vector::Stat => InterruptFlags::LCD_STAT,
            Vector::Timer => InterruptFlags::TIMER,
            Vector::Serial => InterruptFlags::SERIAL,
            Vector::Joypad => InterruptFlags::JOYPAD,
        }
    }

    pub fn to_address(&self) -> u16 {
        0x0040 + 8 * self.to_flag().index() as u16
    }
}

impl std::fmt::Display for Vector {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Vector::VBlank => write!(f, "VBLANK"),
            Vector::Stat => write!(f, "STAT"),
            Vector::Timer => write!(f, "TIMER"),
            Vector::Serial => write!(f, "SERIAL"),
            Vector::Joypad => write!(f, "JOYPAD"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vectors_follow_priority_order() {
        let all = InterruptFlags::all();
        assert_eq!(Vector::from_flags(all), Some(Vector::VBlank));
        assert_eq!(
            Vector::from_flags(InterruptFlags::JOYPAD | InterruptFlags::TIMER),
            Some(Vector::Timer)
        );
        assert_eq!(Vector::from_flags(InterruptFlags::empty()), None);
    }

    #[test]
    fn vector_addresses() {
        assert_eq!(Vector::VBlank.to_address(), 0x40);
        assert_eq!(Vector::Stat.to_address(), 0x48);
        assert_eq!(Vector::Timer.to_address(), 0x50);
        assert_eq!(Vector::Serial.to_address(), 0x58);
        assert_eq!(Vector::Joypad.to_address(), 0x60);
    }
}
