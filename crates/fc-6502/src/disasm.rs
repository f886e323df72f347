//! Disassembler for the 6502 instruction stream.
//!
//! A debug convenience, not required for emulation: walks a byte range via
//! side-effect-free `peek` reads and renders one line per instruction,
//! keyed by address.

use std::collections::BTreeMap;

use fc_core::Bus;

use crate::cpu::{LOOKUP, Mode};

/// Disassemble the byte range `[start, stop]` into `address -> text`.
///
/// Instructions are decoded greedily from `start`; undefined opcodes render
/// as `???` with their tabled addressing mode. Reads use `Bus::peek`, so
/// disassembling a live machine cannot perturb it.
#[must_use]
pub fn disassemble(bus: &dyn Bus, start: u16, stop: u16) -> BTreeMap<u16, String> {
    let mut lines = BTreeMap::new();
    // Wider than u16 so the loop terminates at the top of memory.
    let mut addr = u32::from(start);

    while addr <= u32::from(stop) {
        let line_addr = addr as u16;

        let opcode = bus.peek(addr as u16);
        addr += 1;
        let entry = &LOOKUP[opcode as usize];

        let operand = match entry.mode.operand_len() {
            1 => {
                let lo = bus.peek(addr as u16);
                addr += 1;
                u16::from(lo)
            }
            2 => {
                let lo = bus.peek(addr as u16);
                addr += 1;
                let hi = bus.peek(addr as u16);
                addr += 1;
                (u16::from(hi) << 8) | u16::from(lo)
            }
            _ => 0,
        };

        let text = match entry.mode {
            Mode::Imp => format!("${line_addr:04X}: {} {{IMP}}", entry.mnemonic),
            Mode::Imm => format!("${line_addr:04X}: {} #${operand:02X} {{IMM}}", entry.mnemonic),
            Mode::Zp0 => format!("${line_addr:04X}: {} ${operand:02X} {{ZP0}}", entry.mnemonic),
            Mode::Zpx => format!("${line_addr:04X}: {} ${operand:02X},X {{ZPX}}", entry.mnemonic),
            Mode::Zpy => format!("${line_addr:04X}: {} ${operand:02X},Y {{ZPY}}", entry.mnemonic),
            Mode::Izx => format!("${line_addr:04X}: {} (${operand:02X},X) {{IZX}}", entry.mnemonic),
            Mode::Izy => format!("${line_addr:04X}: {} (${operand:02X}),Y {{IZY}}", entry.mnemonic),
            Mode::Abs => format!("${line_addr:04X}: {} ${operand:04X} {{ABS}}", entry.mnemonic),
            Mode::Abx => format!("${line_addr:04X}: {} ${operand:04X},X {{ABX}}", entry.mnemonic),
            Mode::Aby => format!("${line_addr:04X}: {} ${operand:04X},Y {{ABY}}", entry.mnemonic),
            Mode::Ind => format!("${line_addr:04X}: {} (${operand:04X}) {{IND}}", entry.mnemonic),
            Mode::Rel => {
                let target = (addr as u16).wrapping_add(sign_extend(operand as u8));
                format!(
                    "${line_addr:04X}: {} ${:02X} [${target:04X}] {{REL}}",
                    entry.mnemonic, operand
                )
            }
        };

        lines.insert(line_addr, text);
    }

    lines
}

fn sign_extend(offset: u8) -> u16 {
    if offset & 0x80 != 0 {
        u16::from(offset) | 0xFF00
    } else {
        u16::from(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fc_core::SimpleBus;

    #[test]
    fn renders_common_modes() {
        let mut bus = SimpleBus::new();
        bus.load(
            0x8000,
            &[
                0xA9, 0x10, // LDA #$10
                0x8D, 0x00, 0x20, // STA $2000
                0xD0, 0xFB, // BNE -5
                0x6C, 0xFF, 0x20, // JMP ($20FF)
            ],
        );

        let lines = disassemble(&bus, 0x8000, 0x8009);
        assert_eq!(lines[&0x8000], "$8000: LDA #$10 {IMM}");
        assert_eq!(lines[&0x8002], "$8002: STA $2000 {ABS}");
        assert_eq!(lines[&0x8005], "$8005: BNE $FB [$8002] {REL}");
        assert_eq!(lines[&0x8007], "$8007: JMP ($20FF) {IND}");
    }

    #[test]
    fn undefined_opcode_renders_as_unknown() {
        let mut bus = SimpleBus::new();
        bus.load(0x8000, &[0x02]);
        let lines = disassemble(&bus, 0x8000, 0x8000);
        assert_eq!(lines[&0x8000], "$8000: ??? {IMP}");
    }

    #[test]
    fn terminates_at_top_of_memory() {
        let bus = SimpleBus::new();
        // Opcode 0x00 at $FFFF has IMM mode, whose operand read would wrap;
        // the walk must still stop.
        let lines = disassemble(&bus, 0xFFF0, 0xFFFF);
        assert!(!lines.is_empty());
        assert!(lines.keys().all(|&a| a >= 0xFFF0));
    }
}
