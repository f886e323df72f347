//! Cycle-accurate NES emulator core.
//!
//! The system clock is the PPU dot: the PPU advances on every tick and the
//! CPU on every third, the hardware's 3:1 ratio. One frame is 341 dots x
//! 262 scanlines. The CPU and PPU communicate only through bus-routed
//! registers and the PPU's NMI signal.
//!
//! Scope: the PPU renders the background layer only — sprite/OAM
//! compositing and the APU are not modelled. The OAM register ports
//! ($2003/$2004) are accepted as no-ops.

mod bus;
pub mod capture;
mod cartridge;
mod config;
mod controller;
#[cfg(feature = "native")]
pub mod controller_map;
pub mod input;
mod nes;
mod palette;
pub mod ppu;

pub use bus::NesBus;
pub use cartridge::{Cartridge, Header, Mapper, Mirroring, Nrom};
pub use config::NesConfig;
pub use controller::Controller;
pub use input::{InputQueue, NesButton};
pub use nes::Nes;
