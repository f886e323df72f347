//! NES CPU bus: address decoding and routing.
//!
//! Implements `fc_core::Bus`. Every CPU access lands on the controller
//! ports, internal RAM (2 KiB mirrored four times), the PPU register
//! window, or the cartridge. The cartridge may decline an address, in
//! which case reads fall through to 0 and writes are dropped.

use fc_core::Bus;

use crate::cartridge::Cartridge;
use crate::controller::Controller;
use crate::ppu::Ppu;

/// The NES bus. Owns system RAM and the devices the CPU can reach.
pub struct NesBus {
    /// 2 KiB internal RAM ($0000-$07FF, mirrored to $1FFF).
    pub ram: [u8; 2048],
    pub ppu: Ppu,
    pub cartridge: Cartridge,
    /// Controller 1 ($4016).
    pub controller1: Controller,
    /// Controller 2 ($4017 reads; $4016 writes strobe both).
    pub controller2: Controller,
}

impl NesBus {
    #[must_use]
    pub fn new(cartridge: Cartridge) -> Self {
        Self {
            ram: [0; 2048],
            ppu: Ppu::new(),
            cartridge,
            controller1: Controller::new(),
            controller2: Controller::new(),
        }
    }
}

impl Bus for NesBus {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x4016 => self.controller1.read(),
            0x4017 => self.controller2.read(),
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x2000..=0x3FFF => self.ppu.cpu_read(addr & 0x0007, &mut self.cartridge),
            _ => self.cartridge.cpu_read(addr).unwrap_or(0),
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x4016 | 0x4017 => {
                // A strobe write latches both controllers.
                self.controller1.write(value);
                self.controller2.write(value);
            }
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = value,
            0x2000..=0x3FFF => {
                self.ppu
                    .cpu_write(addr & 0x0007, value, &mut self.cartridge);
            }
            _ => {
                self.cartridge.cpu_write(addr, value);
            }
        }
    }

    fn peek(&self, addr: u16) -> u8 {
        match addr {
            // Observation must not advance the shift registers; report the
            // open-bus bits only.
            0x4016 | 0x4017 => 0x40,
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x2000..=0x3FFF => self.ppu.cpu_peek(addr & 0x0007),
            _ => self.cartridge.cpu_read(addr).unwrap_or(0),
        }
    }
}
