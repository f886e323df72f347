//! Top-level NES system.
//!
//! The system clock is the PPU dot. `clock()` advances the PPU on every
//! tick, the CPU on every third (the hardware's 3:1 ratio), then forwards
//! a pending PPU NMI to the CPU. One frame is 341 dots x 262 scanlines.
//!
//! The session struct owns the CPU and the bus; there is no process-wide
//! state. The CPU borrows the bus per call and never holds a reference
//! across ticks.

use fc_core::{Bus, Observable, Tickable, Value};
use fc_6502::Cpu6502;

use crate::bus::NesBus;
use crate::cartridge::Cartridge;
use crate::config::NesConfig;
use crate::controller::Controller;
use crate::input::{InputQueue, NesButton};
use crate::ppu;

/// CPU runs once per this many system (PPU-dot) ticks.
const CPU_DIVISOR: u64 = 3;

/// NES system.
pub struct Nes {
    cpu: Cpu6502,
    bus: NesBus,
    /// System clock: counts PPU dots since power-on.
    system_clock: u64,
    /// Completed frame counter.
    frame_count: u64,
    /// Timed input event queue.
    input_queue: InputQueue,
}

impl Nes {
    /// Build a machine from the given configuration and reset the CPU
    /// from the cartridge's reset vector.
    ///
    /// # Errors
    ///
    /// Returns an error when the ROM image is invalid (bad magic,
    /// truncated data, unsupported mapper).
    pub fn new(config: &NesConfig) -> Result<Self, String> {
        let cartridge = Cartridge::from_ines_bytes(&config.rom_data)?;
        Ok(Self::from_cartridge(cartridge))
    }

    fn from_cartridge(cartridge: Cartridge) -> Self {
        let mut bus = NesBus::new(cartridge);
        let mut cpu = Cpu6502::new();
        cpu.reset(&mut bus);

        Self {
            cpu,
            bus,
            system_clock: 0,
            frame_count: 0,
            input_queue: InputQueue::new(),
        }
    }

    /// One system clock: PPU dot, CPU every third call, NMI hand-off.
    pub fn clock(&mut self) {
        {
            let NesBus {
                ppu, cartridge, ..
            } = &mut self.bus;
            ppu.clock(cartridge);
        }

        if self.system_clock % CPU_DIVISOR == 0 {
            self.cpu.clock(&mut self.bus);
        }

        if self.bus.ppu.take_nmi() {
            self.cpu.nmi(&mut self.bus);
        }

        self.system_clock += 1;
    }

    /// Run to the next frame boundary.
    ///
    /// Processes queued input at frame start, clocks until the PPU signals
    /// frame completion, and returns the number of dots executed. Once
    /// past the first (partial, power-on) frame this is exactly
    /// 341 x 262.
    pub fn run_frame(&mut self) -> u64 {
        self.input_queue
            .process(self.frame_count, &mut self.bus.controller1);
        self.frame_count += 1;

        let mut dots = 0u64;
        loop {
            self.clock();
            dots += 1;
            if self.bus.ppu.take_frame_complete() {
                break;
            }
        }
        dots
    }

    /// Reset every component and the system clock, as the console's
    /// reset button does.
    pub fn reset(&mut self) {
        self.bus.cartridge.reset();
        self.bus.ppu.reset();
        self.bus.controller1.reset();
        self.bus.controller2.reset();
        self.cpu.reset(&mut self.bus);
        self.system_clock = 0;
    }

    /// The rendered frame (ARGB32, 256x240).
    #[must_use]
    pub fn framebuffer(&self) -> &[u32] {
        self.bus.ppu.framebuffer()
    }

    /// Framebuffer width in pixels.
    #[must_use]
    pub fn framebuffer_width(&self) -> u32 {
        ppu::FB_WIDTH
    }

    /// Framebuffer height in pixels.
    #[must_use]
    pub fn framebuffer_height(&self) -> u32 {
        ppu::FB_HEIGHT
    }

    /// Reference to the CPU.
    #[must_use]
    pub fn cpu(&self) -> &Cpu6502 {
        &self.cpu
    }

    /// Mutable reference to the CPU.
    pub fn cpu_mut(&mut self) -> &mut Cpu6502 {
        &mut self.cpu
    }

    /// Reference to the bus.
    #[must_use]
    pub fn bus(&self) -> &NesBus {
        &self.bus
    }

    /// Mutable reference to the bus.
    pub fn bus_mut(&mut self) -> &mut NesBus {
        &mut self.bus
    }

    /// System clock tick count (PPU dots).
    #[must_use]
    pub fn system_clock(&self) -> u64 {
        self.system_clock
    }

    /// Completed frame count.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Mutable reference to the timed input queue.
    pub fn input_queue(&mut self) -> &mut InputQueue {
        &mut self.input_queue
    }

    /// Press a button on controller 1 immediately.
    pub fn press_button(&mut self, button: NesButton) {
        self.bus.controller1.set_button(button.bit(), true);
    }

    /// Release a button on controller 1.
    pub fn release_button(&mut self, button: NesButton) {
        self.bus.controller1.set_button(button.bit(), false);
    }

    /// Release all buttons on controller 1.
    pub fn release_all_buttons(&mut self) {
        for bit in 0..8 {
            self.bus.controller1.set_button(bit, false);
        }
    }

    /// Controller 1 reference.
    #[must_use]
    pub fn controller1(&self) -> &Controller {
        &self.bus.controller1
    }
}

impl Tickable for Nes {
    fn tick(&mut self) {
        self.clock();
    }
}

impl Observable for Nes {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("cpu.") {
            self.cpu.query(rest)
        } else if let Some(rest) = path.strip_prefix("ppu.") {
            match rest {
                "scanline" => Some(self.bus.ppu.scanline().into()),
                "dot" => Some(self.bus.ppu.dot().into()),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("memory.") {
            let addr = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X"))
            {
                u16::from_str_radix(hex, 16).ok()
            } else if let Some(hex) = rest.strip_prefix('$') {
                u16::from_str_radix(hex, 16).ok()
            } else {
                rest.parse().ok()
            };
            addr.map(|a| Value::U8(self.bus.peek(a)))
        } else {
            match path {
                "system_clock" => Some(self.system_clock.into()),
                "frame_count" => Some(self.frame_count.into()),
                _ => self.cpu.query(path),
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "cpu.<6502 paths>",
            "ppu.scanline",
            "ppu.dot",
            "memory.<address>",
            "system_clock",
            "frame_count",
        ]
    }
}
