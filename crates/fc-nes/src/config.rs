//! NES configuration.

/// Everything needed to construct a machine.
pub struct NesConfig {
    /// iNES file contents.
    pub rom_data: Vec<u8>,
}
