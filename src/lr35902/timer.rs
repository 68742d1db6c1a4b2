use crate::memory::mmu::Mmu;
use crate::memory::registers::{InterruptFlags, TimerControl};
use crate::memory::{DIV_REGISTER, TAC_REGISTER, TIMA_REGISTER, TMA_REGISTER};

/// Machine cycles per DIV increment (16384 Hz).
const DIV_PERIOD: usize = 64;

/// Clock cycles per TIMA increment, indexed by TAC's clock select bits.
const TIMA_PERIODS: [usize; 4] = [1024, 16, 64, 256];

pub struct Timer {
    div_cycles: usize,
    tima_clocks: usize,
    reload_pending: bool,
}

impl Timer {
    pub fn new() -> Timer {
        Timer {
            div_cycles: 0,
            tima_clocks: 0,
            reload_pending: false,
        }
    }

    /// Advances DIV and TIMA by `cycles` machine cycles and returns the interrupts raised.
    ///
    /// An overflowing TIMA reads as $00 until the next update, which reloads it from TMA
    /// and raises the timer interrupt.
    pub fn tick(&mut self, mmu: &mut Mmu, cycles: usize) -> InterruptFlags {
        let mut raised = InterruptFlags::empty();

        // TIMA is clocked off the same divider, so its phase restarts too
        if mmu.take_div_reset() {
            self.div_cycles = 0;
            self.tima_clocks = 0;
        }

        if self.reload_pending {
            self.reload(mmu);
            raised |= InterruptFlags::TIMER;
        }

        self.div_cycles += cycles;
        while self.div_cycles >= DIV_PERIOD {
            self.div_cycles -= DIV_PERIOD;
            mmu.write_raw(DIV_REGISTER, mmu.read_raw(DIV_REGISTER).wrapping_add(1));
        }

        let tac = self.read_tac(mmu);
        if !tac.contains(TimerControl::ENABLE) {
            return raised;
        }

        let period = TIMA_PERIODS[(tac & TimerControl::CLOCK_SELECT).bits() as usize];
        self.tima_clocks += cycles * 4;
        while self.tima_clocks >= period {
            self.tima_clocks -= period;

            if self.reload_pending {
                self.reload(mmu);
                raised |= InterruptFlags::TIMER;
            }

            let tima = mmu.read_raw(TIMA_REGISTER);
            if tima == 0xff {
                mmu.write_raw(TIMA_REGISTER, 0x00);
                self.reload_pending = true;
            } else {
                mmu.write_raw(TIMA_REGISTER, tima + 1);
            }
        }

        raised
    }

    fn reload(&mut self, mmu: &mut Mmu) {
        let tma = mmu.read_raw(TMA_REGISTER);
        mmu.write_raw(TIMA_REGISTER, tma);
        self.reload_pending = false;
    }

    #[inline]
    fn read_tac(&self, mmu: &Mmu) -> TimerControl {
        mmu.read_raw_as::<TimerControl>(TAC_REGISTER)
    }
}

impl Default for Timer {
    fn default() -> Timer {
        Timer::new()
    }
}
