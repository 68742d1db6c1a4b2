use crate::error::{GbError, InvalidBootRomSnafu};
use crate::joypad::Button;
use crate::lr35902::cpu::{Cpu, CpuSnapshot};
use crate::lr35902::timer::Timer;
use crate::memory::cartridge::Cartridge;
use crate::memory::mmu::Mmu;
use crate::memory::registers::InterruptFlags;
use crate::memory::{
    BG_PALETTE_REGISTER, BOOTROM_SIZE, DIV_REGISTER, INTERRUPT_ENABLE_REGISTER, INTERRUPT_FLAGS_REGISTER,
    JOYPAD_REGISTER, LCD_CONTROL_REGISTER, OBJ0_PALETTE_REGISTER, OBJ1_PALETTE_REGISTER, TAC_REGISTER,
};
use crate::video::ppu::{Frame, Ppu};
use crate::video::CYCLES_PER_FRAME;
use log::{debug, info};
use snafu::ensure;

/// I/O state the DMG boot ROM leaves behind, applied when starting without one.
const POST_BOOT_IO: [(u16, u8); 8] = [
    (JOYPAD_REGISTER, 0x30),
    (TAC_REGISTER, 0xf8),
    (INTERRUPT_FLAGS_REGISTER, 0xe1),
    (LCD_CONTROL_REGISTER, 0x91),
    (BG_PALETTE_REGISTER, 0xfc),
    (OBJ0_PALETTE_REGISTER, 0xff),
    (OBJ1_PALETTE_REGISTER, 0xff),
    (INTERRUPT_ENABLE_REGISTER, 0x00),
];
const POST_BOOT_DIV: u8 = 0xab;

pub struct GameBoy {
    cpu: Cpu,
    mmu: Mmu,
    ppu: Ppu,
    timer: Timer,
    frame_cycles: usize,
    frames: usize,
}

impl GameBoy {
    /// Without a boot ROM the machine starts at $0100 in the state the boot ROM would
    /// have left it in.
    pub fn new(cartridge: Cartridge, bootrom: Option<Vec<u8>>) -> Result<GameBoy, GbError> {
        let (cpu, mmu) = match bootrom {
            Some(bootrom) => {
                ensure!(bootrom.len() == BOOTROM_SIZE, InvalidBootRomSnafu { size: bootrom.len() });
                info!("Starting from boot ROM");
                (Cpu::new(), Mmu::new(bootrom, cartridge))
            }
            None => {
                let mut mmu = Mmu::new(Vec::new(), cartridge);
                for (addr, data) in POST_BOOT_IO {
                    mmu.write(addr, data);
                }
                mmu.write_raw(DIV_REGISTER, POST_BOOT_DIV);
                info!("No boot ROM given, starting at $0100");
                (Cpu::post_boot(), mmu)
            }
        };

        Ok(GameBoy {
            cpu,
            mmu,
            ppu: Ppu::new(),
            timer: Timer::new(),
            frame_cycles: 0,
            frames: 0,
        })
    }

    /// Runs one instruction, lets the timer and PPU catch up and services a pending
    /// interrupt if one is allowed. Returns the machine cycles that passed.
    pub fn step(&mut self) -> usize {
        let cycles = self.cpu.tick(&mut self.mmu);
        self.advance(cycles);

        let dispatch = self.cpu.handle_interrupts(&mut self.mmu);
        if dispatch > 0 {
            self.advance(dispatch);
        }

        cycles + dispatch
    }

    fn advance(&mut self, cycles: usize) {
        let raised = self.timer.tick(&mut self.mmu, cycles) | self.ppu.tick(&mut self.mmu, cycles);
        self.cpu.interrupt(&mut self.mmu, raised);
    }

    /// Runs one frame worth of cycles and publishes the rendered frame. Cycles past the
    /// end of the frame count towards the next one.
    pub fn run_frame(&mut self) {
        while self.frame_cycles < CYCLES_PER_FRAME {
            self.frame_cycles += self.step();
        }
        self.frame_cycles -= CYCLES_PER_FRAME;

        self.ppu.flush();
        self.frames += 1;
        debug!("Frame {} done, {} cycles carried over", self.frames, self.frame_cycles);
    }

    /// Presses a button. A newly pressed button requests the joypad interrupt.
    pub fn press(&mut self, button: Button) {
        if self.mmu.joypad_mut().press(button) {
            self.cpu.interrupt(&mut self.mmu, InterruptFlags::JOYPAD);
        }
    }

    pub fn release(&mut self, button: Button) {
        self.mmu.joypad_mut().release(button);
    }

    /// Replaces both joypad masks. A cleared bit means pressed.
    pub fn set_joypad_state(&mut self, buttons: u8, directions: u8) {
        self.mmu.joypad_mut().set_state(buttons, directions);
    }

    pub fn frame(&self) -> &Frame {
        self.ppu.frame()
    }

    pub fn frame_rgb(&self) -> Vec<u8> {
        self.ppu.frame_rgb()
    }

    pub fn snapshot(&self) -> CpuSnapshot {
        self.cpu.snapshot()
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn mmu(&self) -> &Mmu {
        &self.mmu
    }
}
