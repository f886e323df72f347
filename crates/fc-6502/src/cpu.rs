//! 6502 CPU implementation.
//!
//! Fetch-decode-execute over a 256-entry descriptor table. When the cycle
//! countdown reaches zero, `clock()` fetches the opcode, runs the
//! descriptor's addressing-mode function (resolving `addr_abs`/`addr_rel`
//! and reporting a possible page-cross penalty) and then its operation
//! function; the instruction's full cost is charged up front and burned
//! off one cycle per call. The extra cycle is charged only when both the
//! addressing mode and the operation report it — the historical combined-
//! cycle quirk.

use fc_core::{Bus, Observable, Value};

use crate::Registers;
use crate::flags::{B, C, D, I, N, U, V, Z};

/// Operation function: executes an instruction's semantics and returns 1
/// if the instruction can take the page-cross penalty cycle.
type Operate = fn(&mut Cpu6502, &mut dyn Bus) -> u8;

/// Addressing-mode function: resolves the effective address and returns 1
/// if the resolution crossed a page boundary.
type AddrFn = fn(&mut Cpu6502, &mut dyn Bus) -> u8;

/// Addressing-mode tag.
///
/// Dispatch goes through the descriptor's function pointer; the tag exists
/// so that implied-operand detection and the disassembler never need to
/// compare function pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Implied / accumulator.
    Imp,
    /// Immediate.
    Imm,
    /// Zero page.
    Zp0,
    /// Zero page, X-indexed.
    Zpx,
    /// Zero page, Y-indexed.
    Zpy,
    /// Relative (branches).
    Rel,
    /// Absolute.
    Abs,
    /// Absolute, X-indexed.
    Abx,
    /// Absolute, Y-indexed.
    Aby,
    /// Indirect (JMP only, with the page-wrap bug).
    Ind,
    /// (Indirect, X).
    Izx,
    /// (Indirect), Y.
    Izy,
}

impl Mode {
    /// The addressing-mode function for this tag.
    const fn resolver(self) -> AddrFn {
        match self {
            Mode::Imp => Cpu6502::imp,
            Mode::Imm => Cpu6502::imm,
            Mode::Zp0 => Cpu6502::zp0,
            Mode::Zpx => Cpu6502::zpx,
            Mode::Zpy => Cpu6502::zpy,
            Mode::Rel => Cpu6502::rel,
            Mode::Abs => Cpu6502::abs,
            Mode::Abx => Cpu6502::abx,
            Mode::Aby => Cpu6502::aby,
            Mode::Ind => Cpu6502::ind,
            Mode::Izx => Cpu6502::izx,
            Mode::Izy => Cpu6502::izy,
        }
    }

    /// Operand bytes following the opcode.
    #[must_use]
    pub const fn operand_len(self) -> u16 {
        match self {
            Mode::Imp => 0,
            Mode::Imm | Mode::Zp0 | Mode::Zpx | Mode::Zpy | Mode::Rel | Mode::Izx | Mode::Izy => 1,
            Mode::Abs | Mode::Abx | Mode::Aby | Mode::Ind => 2,
        }
    }
}

/// Per-opcode instruction descriptor.
pub struct Instruction {
    /// Assembler mnemonic; `"???"` for undefined opcodes.
    pub mnemonic: &'static str,
    pub(crate) operate: Operate,
    pub(crate) addrmode: AddrFn,
    /// Addressing-mode tag (always agrees with `addrmode`).
    pub mode: Mode,
    /// Base cycle count before penalties.
    pub cycles: u8,
}

/// Build a descriptor; the addressing function is derived from the tag so
/// the two can never disagree.
const fn instr(mnemonic: &'static str, operate: Operate, mode: Mode, cycles: u8) -> Instruction {
    Instruction {
        mnemonic,
        operate,
        addrmode: mode.resolver(),
        mode,
        cycles,
    }
}

type O = Cpu6502;
type M = Mode;

/// The 256-entry opcode table, indexed by opcode byte.
///
/// Undefined opcodes decode to unofficial NOPs (with their measured cycle
/// costs) or to `xxx`, a fixed-cost no-op. Every byte value decodes to
/// something; there is no trap path.
#[rustfmt::skip]
pub static LOOKUP: [Instruction; 256] = [
    // 0x00
    instr("BRK", O::brk, M::Imm, 7), instr("ORA", O::ora, M::Izx, 6), instr("???", O::xxx, M::Imp, 2), instr("???", O::xxx, M::Imp, 8),
    instr("NOP", O::nop, M::Imp, 3), instr("ORA", O::ora, M::Zp0, 3), instr("ASL", O::asl, M::Zp0, 5), instr("???", O::xxx, M::Imp, 5),
    instr("PHP", O::php, M::Imp, 3), instr("ORA", O::ora, M::Imm, 2), instr("ASL", O::asl, M::Imp, 2), instr("???", O::xxx, M::Imp, 2),
    instr("NOP", O::nop, M::Imp, 4), instr("ORA", O::ora, M::Abs, 4), instr("ASL", O::asl, M::Abs, 6), instr("???", O::xxx, M::Imp, 6),
    // 0x10
    instr("BPL", O::bpl, M::Rel, 2), instr("ORA", O::ora, M::Izy, 5), instr("???", O::xxx, M::Imp, 2), instr("???", O::xxx, M::Imp, 8),
    instr("NOP", O::nop, M::Imp, 4), instr("ORA", O::ora, M::Zpx, 4), instr("ASL", O::asl, M::Zpx, 6), instr("???", O::xxx, M::Imp, 6),
    instr("CLC", O::clc, M::Imp, 2), instr("ORA", O::ora, M::Aby, 4), instr("NOP", O::nop, M::Imp, 2), instr("???", O::xxx, M::Imp, 7),
    instr("NOP", O::nop, M::Imp, 4), instr("ORA", O::ora, M::Abx, 4), instr("ASL", O::asl, M::Abx, 7), instr("???", O::xxx, M::Imp, 7),
    // 0x20
    instr("JSR", O::jsr, M::Abs, 6), instr("AND", O::and, M::Izx, 6), instr("???", O::xxx, M::Imp, 2), instr("???", O::xxx, M::Imp, 8),
    instr("BIT", O::bit, M::Zp0, 3), instr("AND", O::and, M::Zp0, 3), instr("ROL", O::rol, M::Zp0, 5), instr("???", O::xxx, M::Imp, 5),
    instr("PLP", O::plp, M::Imp, 4), instr("AND", O::and, M::Imm, 2), instr("ROL", O::rol, M::Imp, 2), instr("???", O::xxx, M::Imp, 2),
    instr("BIT", O::bit, M::Abs, 4), instr("AND", O::and, M::Abs, 4), instr("ROL", O::rol, M::Abs, 6), instr("???", O::xxx, M::Imp, 6),
    // 0x30
    instr("BMI", O::bmi, M::Rel, 2), instr("AND", O::and, M::Izy, 5), instr("???", O::xxx, M::Imp, 2), instr("???", O::xxx, M::Imp, 8),
    instr("NOP", O::nop, M::Imp, 4), instr("AND", O::and, M::Zpx, 4), instr("ROL", O::rol, M::Zpx, 6), instr("???", O::xxx, M::Imp, 6),
    instr("SEC", O::sec, M::Imp, 2), instr("AND", O::and, M::Aby, 4), instr("NOP", O::nop, M::Imp, 2), instr("???", O::xxx, M::Imp, 7),
    instr("NOP", O::nop, M::Imp, 4), instr("AND", O::and, M::Abx, 4), instr("ROL", O::rol, M::Abx, 7), instr("???", O::xxx, M::Imp, 7),
    // 0x40
    instr("RTI", O::rti, M::Imp, 6), instr("EOR", O::eor, M::Izx, 6), instr("???", O::xxx, M::Imp, 2), instr("???", O::xxx, M::Imp, 8),
    instr("NOP", O::nop, M::Imp, 3), instr("EOR", O::eor, M::Zp0, 3), instr("LSR", O::lsr, M::Zp0, 5), instr("???", O::xxx, M::Imp, 5),
    instr("PHA", O::pha, M::Imp, 3), instr("EOR", O::eor, M::Imm, 2), instr("LSR", O::lsr, M::Imp, 2), instr("???", O::xxx, M::Imp, 2),
    instr("JMP", O::jmp, M::Abs, 3), instr("EOR", O::eor, M::Abs, 4), instr("LSR", O::lsr, M::Abs, 6), instr("???", O::xxx, M::Imp, 6),
    // 0x50
    instr("BVC", O::bvc, M::Rel, 2), instr("EOR", O::eor, M::Izy, 5), instr("???", O::xxx, M::Imp, 2), instr("???", O::xxx, M::Imp, 8),
    instr("NOP", O::nop, M::Imp, 4), instr("EOR", O::eor, M::Zpx, 4), instr("LSR", O::lsr, M::Zpx, 6), instr("???", O::xxx, M::Imp, 6),
    instr("CLI", O::cli, M::Imp, 2), instr("EOR", O::eor, M::Aby, 4), instr("NOP", O::nop, M::Imp, 2), instr("???", O::xxx, M::Imp, 7),
    instr("NOP", O::nop, M::Imp, 4), instr("EOR", O::eor, M::Abx, 4), instr("LSR", O::lsr, M::Abx, 7), instr("???", O::xxx, M::Imp, 7),
    // 0x60
    instr("RTS", O::rts, M::Imp, 6), instr("ADC", O::adc, M::Izx, 6), instr("???", O::xxx, M::Imp, 2), instr("???", O::xxx, M::Imp, 8),
    instr("NOP", O::nop, M::Imp, 3), instr("ADC", O::adc, M::Zp0, 3), instr("ROR", O::ror, M::Zp0, 5), instr("???", O::xxx, M::Imp, 5),
    instr("PLA", O::pla, M::Imp, 4), instr("ADC", O::adc, M::Imm, 2), instr("ROR", O::ror, M::Imp, 2), instr("???", O::xxx, M::Imp, 2),
    instr("JMP", O::jmp, M::Ind, 5), instr("ADC", O::adc, M::Abs, 4), instr("ROR", O::ror, M::Abs, 6), instr("???", O::xxx, M::Imp, 6),
    // 0x70
    instr("BVS", O::bvs, M::Rel, 2), instr("ADC", O::adc, M::Izy, 5), instr("???", O::xxx, M::Imp, 2), instr("???", O::xxx, M::Imp, 8),
    instr("NOP", O::nop, M::Imp, 4), instr("ADC", O::adc, M::Zpx, 4), instr("ROR", O::ror, M::Zpx, 6), instr("???", O::xxx, M::Imp, 6),
    instr("SEI", O::sei, M::Imp, 2), instr("ADC", O::adc, M::Aby, 4), instr("NOP", O::nop, M::Imp, 2), instr("???", O::xxx, M::Imp, 7),
    instr("NOP", O::nop, M::Imp, 4), instr("ADC", O::adc, M::Abx, 4), instr("ROR", O::ror, M::Abx, 7), instr("???", O::xxx, M::Imp, 7),
    // 0x80
    instr("NOP", O::nop, M::Imp, 2), instr("STA", O::sta, M::Izx, 6), instr("NOP", O::nop, M::Imp, 2), instr("???", O::xxx, M::Imp, 6),
    instr("STY", O::sty, M::Zp0, 3), instr("STA", O::sta, M::Zp0, 3), instr("STX", O::stx, M::Zp0, 3), instr("???", O::xxx, M::Imp, 3),
    instr("DEY", O::dey, M::Imp, 2), instr("NOP", O::nop, M::Imm, 2), instr("TXA", O::txa, M::Imp, 2), instr("???", O::xxx, M::Imp, 2),
    instr("STY", O::sty, M::Abs, 4), instr("STA", O::sta, M::Abs, 4), instr("STX", O::stx, M::Abs, 4), instr("???", O::xxx, M::Imp, 4),
    // 0x90
    instr("BCC", O::bcc, M::Rel, 2), instr("STA", O::sta, M::Izy, 6), instr("???", O::xxx, M::Imp, 2), instr("???", O::xxx, M::Imp, 6),
    instr("STY", O::sty, M::Zpx, 4), instr("STA", O::sta, M::Zpx, 4), instr("STX", O::stx, M::Zpy, 4), instr("???", O::xxx, M::Imp, 4),
    instr("TYA", O::tya, M::Imp, 2), instr("STA", O::sta, M::Aby, 5), instr("TXS", O::txs, M::Imp, 2), instr("???", O::xxx, M::Imp, 5),
    instr("NOP", O::nop, M::Imp, 5), instr("STA", O::sta, M::Abx, 5), instr("???", O::xxx, M::Imp, 5), instr("???", O::xxx, M::Imp, 5),
    // 0xA0
    instr("LDY", O::ldy, M::Imm, 2), instr("LDA", O::lda, M::Izx, 6), instr("LDX", O::ldx, M::Imm, 2), instr("???", O::xxx, M::Imp, 6),
    instr("LDY", O::ldy, M::Zp0, 3), instr("LDA", O::lda, M::Zp0, 3), instr("LDX", O::ldx, M::Zp0, 3), instr("???", O::xxx, M::Imp, 3),
    instr("TAY", O::tay, M::Imp, 2), instr("LDA", O::lda, M::Imm, 2), instr("TAX", O::tax, M::Imp, 2), instr("???", O::xxx, M::Imp, 2),
    instr("LDY", O::ldy, M::Abs, 4), instr("LDA", O::lda, M::Abs, 4), instr("LDX", O::ldx, M::Abs, 4), instr("???", O::xxx, M::Imp, 4),
    // 0xB0
    instr("BCS", O::bcs, M::Rel, 2), instr("LDA", O::lda, M::Izy, 5), instr("???", O::xxx, M::Imp, 2), instr("???", O::xxx, M::Imp, 5),
    instr("LDY", O::ldy, M::Zpx, 4), instr("LDA", O::lda, M::Zpx, 4), instr("LDX", O::ldx, M::Zpy, 4), instr("???", O::xxx, M::Imp, 4),
    instr("CLV", O::clv, M::Imp, 2), instr("LDA", O::lda, M::Aby, 4), instr("TSX", O::tsx, M::Imp, 2), instr("???", O::xxx, M::Imp, 4),
    instr("LDY", O::ldy, M::Abx, 4), instr("LDA", O::lda, M::Abx, 4), instr("LDX", O::ldx, M::Aby, 4), instr("???", O::xxx, M::Imp, 4),
    // 0xC0
    instr("CPY", O::cpy, M::Imm, 2), instr("CMP", O::cmp, M::Izx, 6), instr("NOP", O::nop, M::Imp, 2), instr("???", O::xxx, M::Imp, 8),
    instr("CPY", O::cpy, M::Zp0, 3), instr("CMP", O::cmp, M::Zp0, 3), instr("DEC", O::dec, M::Zp0, 5), instr("???", O::xxx, M::Imp, 5),
    instr("INY", O::iny, M::Imp, 2), instr("CMP", O::cmp, M::Imm, 2), instr("DEX", O::dex, M::Imp, 2), instr("???", O::xxx, M::Imp, 2),
    instr("CPY", O::cpy, M::Abs, 4), instr("CMP", O::cmp, M::Abs, 4), instr("DEC", O::dec, M::Abs, 6), instr("???", O::xxx, M::Imp, 6),
    // 0xD0
    instr("BNE", O::bne, M::Rel, 2), instr("CMP", O::cmp, M::Izy, 5), instr("???", O::xxx, M::Imp, 2), instr("???", O::xxx, M::Imp, 8),
    instr("NOP", O::nop, M::Imp, 4), instr("CMP", O::cmp, M::Zpx, 4), instr("DEC", O::dec, M::Zpx, 6), instr("???", O::xxx, M::Imp, 6),
    instr("CLD", O::cld, M::Imp, 2), instr("CMP", O::cmp, M::Aby, 4), instr("NOP", O::nop, M::Imp, 2), instr("???", O::xxx, M::Imp, 7),
    instr("NOP", O::nop, M::Imp, 4), instr("CMP", O::cmp, M::Abx, 4), instr("DEC", O::dec, M::Abx, 7), instr("???", O::xxx, M::Imp, 7),
    // 0xE0
    instr("CPX", O::cpx, M::Imm, 2), instr("SBC", O::sbc, M::Izx, 6), instr("NOP", O::nop, M::Imp, 2), instr("???", O::xxx, M::Imp, 8),
    instr("CPX", O::cpx, M::Zp0, 3), instr("SBC", O::sbc, M::Zp0, 3), instr("INC", O::inc, M::Zp0, 5), instr("???", O::xxx, M::Imp, 5),
    instr("INX", O::inx, M::Imp, 2), instr("SBC", O::sbc, M::Imm, 2), instr("NOP", O::nop, M::Imp, 2), instr("SBC", O::sbc, M::Imp, 2),
    instr("CPX", O::cpx, M::Abs, 4), instr("SBC", O::sbc, M::Abs, 4), instr("INC", O::inc, M::Abs, 6), instr("???", O::xxx, M::Imp, 6),
    // 0xF0
    instr("BEQ", O::beq, M::Rel, 2), instr("SBC", O::sbc, M::Izy, 5), instr("???", O::xxx, M::Imp, 2), instr("???", O::xxx, M::Imp, 8),
    instr("NOP", O::nop, M::Imp, 4), instr("SBC", O::sbc, M::Zpx, 4), instr("INC", O::inc, M::Zpx, 6), instr("???", O::xxx, M::Imp, 6),
    instr("SED", O::sed, M::Imp, 2), instr("SBC", O::sbc, M::Aby, 4), instr("NOP", O::nop, M::Imp, 2), instr("???", O::xxx, M::Imp, 7),
    instr("NOP", O::nop, M::Imp, 4), instr("SBC", O::sbc, M::Abx, 4), instr("INC", O::inc, M::Abx, 7), instr("???", O::xxx, M::Imp, 7),
];

/// The MOS 6502 CPU.
#[derive(Debug)]
pub struct Cpu6502 {
    /// Architectural registers.
    pub regs: Registers,

    /// Operand fetched for the current instruction.
    fetched: u8,
    /// Resolved effective address.
    addr_abs: u16,
    /// Sign-extended branch offset.
    addr_rel: u16,
    /// Opcode being executed.
    opcode: u8,
    /// Cycles remaining in the current instruction.
    cycles: u8,
    /// Total cycles executed since power-on.
    total_cycles: u64,
}

impl Default for Cpu6502 {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu6502 {
    /// Create a CPU in power-on state. `reset()` must run before the first
    /// `clock()` so PC is loaded from the reset vector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            fetched: 0,
            addr_abs: 0,
            addr_rel: 0,
            opcode: 0,
            cycles: 0,
            total_cycles: 0,
        }
    }

    /// Advance one CPU cycle.
    ///
    /// The instruction executes in full on the cycle the countdown reaches
    /// zero; subsequent calls burn the remaining cycles so that timing is
    /// externally accurate.
    pub fn clock(&mut self, bus: &mut dyn Bus) {
        if self.cycles == 0 {
            self.opcode = bus.read(self.regs.pc);

            // The unused bit always reads as set.
            self.regs.p.set(U);

            self.regs.pc = self.regs.pc.wrapping_add(1);

            let descriptor = &LOOKUP[self.opcode as usize];
            self.cycles = descriptor.cycles;

            let extra_mode = (descriptor.addrmode)(self, bus);
            let extra_op = (descriptor.operate)(self, bus);
            self.cycles += extra_mode & extra_op;

            self.regs.p.set(U);
        }

        self.total_cycles += 1;
        self.cycles -= 1;
    }

    /// True at an instruction boundary.
    #[must_use]
    pub fn complete(&self) -> bool {
        self.cycles == 0
    }

    /// Reset: PC from the vector at $FFFC/$FFFD, A = X = Y = 0, S = $FD,
    /// status = unused bit only. Charges 8 cycles.
    pub fn reset(&mut self, bus: &mut dyn Bus) {
        let lo = u16::from(bus.read(0xFFFC));
        let hi = u16::from(bus.read(0xFFFD));

        self.regs = Registers::new();
        self.regs.pc = (hi << 8) | lo;

        self.fetched = 0;
        self.addr_abs = 0;
        self.addr_rel = 0;

        self.cycles = 8;
    }

    /// Maskable interrupt request. Honored only while the I flag is clear:
    /// pushes PC (high, low) and status (B clear, U set, then I set),
    /// vectors through $FFFE/$FFFF, and charges 7 cycles.
    pub fn irq(&mut self, bus: &mut dyn Bus) {
        if self.regs.p.is_set(I) {
            return;
        }
        self.interrupt(bus, 0xFFFE);
        self.cycles = 7;
    }

    /// Non-maskable interrupt. Same sequence as IRQ, unconditional,
    /// vectors through $FFFA/$FFFB, and charges 8 cycles.
    pub fn nmi(&mut self, bus: &mut dyn Bus) {
        self.interrupt(bus, 0xFFFA);
        self.cycles = 8;
    }

    /// Shared IRQ/NMI push-and-vector sequence.
    fn interrupt(&mut self, bus: &mut dyn Bus, vector: u16) {
        let addr = self.regs.push();
        bus.write(addr, (self.regs.pc >> 8) as u8);
        let addr = self.regs.push();
        bus.write(addr, (self.regs.pc & 0x00FF) as u8);

        self.regs.p.clear(B);
        self.regs.p.set(U);
        self.regs.p.set(I);
        let addr = self.regs.push();
        bus.write(addr, self.regs.p.0);

        let lo = u16::from(bus.read(vector));
        let hi = u16::from(bus.read(vector.wrapping_add(1)));
        self.regs.pc = (hi << 8) | lo;
    }

    /// Total cycles executed since power-on.
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Read the current instruction's operand: from the effective address
    /// for memory modes, from the accumulator for implied mode.
    fn fetch(&mut self, bus: &mut dyn Bus) -> u8 {
        if LOOKUP[self.opcode as usize].mode != Mode::Imp {
            self.fetched = bus.read(self.addr_abs);
        }
        self.fetched
    }

    /// Store a read-modify-write result: to A in implied mode, else back
    /// through the bus at the effective address.
    fn write_result(&mut self, bus: &mut dyn Bus, value: u8) {
        if LOOKUP[self.opcode as usize].mode == Mode::Imp {
            self.regs.a = value;
        } else {
            bus.write(self.addr_abs, value);
        }
    }

    // ------------------------------------------------------------------
    // Addressing modes
    // ------------------------------------------------------------------

    /// Implied / accumulator: the operand is A.
    fn imp(&mut self, _bus: &mut dyn Bus) -> u8 {
        self.fetched = self.regs.a;
        0
    }

    /// Immediate: operand byte follows the opcode.
    fn imm(&mut self, _bus: &mut dyn Bus) -> u8 {
        self.addr_abs = self.regs.pc;
        self.regs.pc = self.regs.pc.wrapping_add(1);
        0
    }

    /// Zero page.
    fn zp0(&mut self, bus: &mut dyn Bus) -> u8 {
        self.addr_abs = u16::from(bus.read(self.regs.pc)) & 0x00FF;
        self.regs.pc = self.regs.pc.wrapping_add(1);
        0
    }

    /// Zero page, X-indexed; wraps inside page zero.
    fn zpx(&mut self, bus: &mut dyn Bus) -> u8 {
        self.addr_abs = (u16::from(bus.read(self.regs.pc)) + u16::from(self.regs.x)) & 0x00FF;
        self.regs.pc = self.regs.pc.wrapping_add(1);
        0
    }

    /// Zero page, Y-indexed; wraps inside page zero.
    fn zpy(&mut self, bus: &mut dyn Bus) -> u8 {
        self.addr_abs = (u16::from(bus.read(self.regs.pc)) + u16::from(self.regs.y)) & 0x00FF;
        self.regs.pc = self.regs.pc.wrapping_add(1);
        0
    }

    /// Relative: sign-extended branch offset into `addr_rel`.
    fn rel(&mut self, bus: &mut dyn Bus) -> u8 {
        self.addr_rel = u16::from(bus.read(self.regs.pc));
        self.regs.pc = self.regs.pc.wrapping_add(1);
        if self.addr_rel & 0x80 != 0 {
            self.addr_rel |= 0xFF00;
        }
        0
    }

    /// Absolute.
    fn abs(&mut self, bus: &mut dyn Bus) -> u8 {
        let lo = u16::from(bus.read(self.regs.pc));
        self.regs.pc = self.regs.pc.wrapping_add(1);
        let hi = u16::from(bus.read(self.regs.pc));
        self.regs.pc = self.regs.pc.wrapping_add(1);

        self.addr_abs = (hi << 8) | lo;
        0
    }

    /// Absolute, X-indexed: reports a penalty when indexing carries into
    /// the high byte.
    fn abx(&mut self, bus: &mut dyn Bus) -> u8 {
        let lo = u16::from(bus.read(self.regs.pc));
        self.regs.pc = self.regs.pc.wrapping_add(1);
        let hi = u16::from(bus.read(self.regs.pc));
        self.regs.pc = self.regs.pc.wrapping_add(1);

        self.addr_abs = ((hi << 8) | lo).wrapping_add(u16::from(self.regs.x));

        u8::from(self.addr_abs & 0xFF00 != hi << 8)
    }

    /// Absolute, Y-indexed.
    fn aby(&mut self, bus: &mut dyn Bus) -> u8 {
        let lo = u16::from(bus.read(self.regs.pc));
        self.regs.pc = self.regs.pc.wrapping_add(1);
        let hi = u16::from(bus.read(self.regs.pc));
        self.regs.pc = self.regs.pc.wrapping_add(1);

        self.addr_abs = ((hi << 8) | lo).wrapping_add(u16::from(self.regs.y));

        u8::from(self.addr_abs & 0xFF00 != hi << 8)
    }

    /// Indirect (JMP only). Reproduces the hardware bug: when the pointer
    /// low byte is $FF, the high byte of the target is read from the start
    /// of the same page rather than the next one.
    fn ind(&mut self, bus: &mut dyn Bus) -> u8 {
        let ptr_lo = u16::from(bus.read(self.regs.pc));
        self.regs.pc = self.regs.pc.wrapping_add(1);
        let ptr_hi = u16::from(bus.read(self.regs.pc));
        self.regs.pc = self.regs.pc.wrapping_add(1);

        let ptr = (ptr_hi << 8) | ptr_lo;

        let lo = u16::from(bus.read(ptr));
        let hi = if ptr_lo == 0x00FF {
            u16::from(bus.read(ptr & 0xFF00))
        } else {
            u16::from(bus.read(ptr.wrapping_add(1)))
        };

        self.addr_abs = (hi << 8) | lo;
        0
    }

    /// (Indirect, X): pointer in page zero, pre-indexed by X with wrap.
    fn izx(&mut self, bus: &mut dyn Bus) -> u8 {
        let t = u16::from(bus.read(self.regs.pc));
        self.regs.pc = self.regs.pc.wrapping_add(1);

        let x = u16::from(self.regs.x);
        let lo = u16::from(bus.read((t + x) & 0x00FF));
        let hi = u16::from(bus.read((t + x + 1) & 0x00FF));

        self.addr_abs = (hi << 8) | lo;
        0
    }

    /// (Indirect), Y: pointer in page zero, post-indexed by Y; reports a
    /// penalty on page cross.
    fn izy(&mut self, bus: &mut dyn Bus) -> u8 {
        let t = u16::from(bus.read(self.regs.pc));
        self.regs.pc = self.regs.pc.wrapping_add(1);

        let lo = u16::from(bus.read(t & 0x00FF));
        let hi = u16::from(bus.read((t + 1) & 0x00FF));

        self.addr_abs = ((hi << 8) | lo).wrapping_add(u16::from(self.regs.y));

        u8::from(self.addr_abs & 0xFF00 != hi << 8)
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Branch helper: taken branches cost one extra cycle, two when the
    /// target is on a different page. Branch penalties bypass the
    /// mode-AND-operation rule and charge directly.
    fn branch_if(&mut self, taken: bool) -> u8 {
        if taken {
            self.cycles += 1;
            self.addr_abs = self.regs.pc.wrapping_add(self.addr_rel);

            if self.addr_abs & 0xFF00 != self.regs.pc & 0xFF00 {
                self.cycles += 1;
            }

            self.regs.pc = self.addr_abs;
        }
        0
    }

    fn adc(&mut self, bus: &mut dyn Bus) -> u8 {
        let fetched = u16::from(self.fetch(bus));
        let a = u16::from(self.regs.a);
        let temp = a + fetched + u16::from(self.regs.p.bit(C));

        self.regs.p.set_if(C, temp > 255);
        self.regs.p.set_if(Z, temp & 0x00FF == 0);
        self.regs.p.set_if(V, !(a ^ fetched) & (a ^ temp) & 0x0080 != 0);
        self.regs.p.set_if(N, temp & 0x0080 != 0);

        self.regs.a = (temp & 0x00FF) as u8;
        1
    }

    /// SBC is ADC of the one's complement: A + ~M + C.
    fn sbc(&mut self, bus: &mut dyn Bus) -> u8 {
        let value = u16::from(self.fetch(bus)) ^ 0x00FF;
        let a = u16::from(self.regs.a);
        let temp = a + value + u16::from(self.regs.p.bit(C));

        self.regs.p.set_if(C, temp & 0xFF00 != 0);
        self.regs.p.set_if(Z, temp & 0x00FF == 0);
        self.regs.p.set_if(V, (temp ^ a) & (temp ^ value) & 0x0080 != 0);
        self.regs.p.set_if(N, temp & 0x0080 != 0);

        self.regs.a = (temp & 0x00FF) as u8;
        1
    }

    fn and(&mut self, bus: &mut dyn Bus) -> u8 {
        let fetched = self.fetch(bus);
        self.regs.a &= fetched;
        self.regs.p.update_nz(self.regs.a);
        1
    }

    fn asl(&mut self, bus: &mut dyn Bus) -> u8 {
        let temp = u16::from(self.fetch(bus)) << 1;
        self.regs.p.set_if(C, temp & 0xFF00 != 0);
        self.regs.p.set_if(Z, temp & 0x00FF == 0);
        self.regs.p.set_if(N, temp & 0x0080 != 0);
        self.write_result(bus, (temp & 0x00FF) as u8);
        0
    }

    fn bcc(&mut self, _bus: &mut dyn Bus) -> u8 {
        let taken = !self.regs.p.is_set(C);
        self.branch_if(taken)
    }

    fn bcs(&mut self, _bus: &mut dyn Bus) -> u8 {
        let taken = self.regs.p.is_set(C);
        self.branch_if(taken)
    }

    fn beq(&mut self, _bus: &mut dyn Bus) -> u8 {
        let taken = self.regs.p.is_set(Z);
        self.branch_if(taken)
    }

    fn bit(&mut self, bus: &mut dyn Bus) -> u8 {
        let fetched = self.fetch(bus);
        self.regs.p.set_if(Z, self.regs.a & fetched == 0);
        self.regs.p.set_if(N, fetched & 0x80 != 0);
        self.regs.p.set_if(V, fetched & 0x40 != 0);
        0
    }

    fn bmi(&mut self, _bus: &mut dyn Bus) -> u8 {
        let taken = self.regs.p.is_set(N);
        self.branch_if(taken)
    }

    fn bne(&mut self, _bus: &mut dyn Bus) -> u8 {
        let taken = !self.regs.p.is_set(Z);
        self.branch_if(taken)
    }

    fn bpl(&mut self, _bus: &mut dyn Bus) -> u8 {
        let taken = !self.regs.p.is_set(N);
        self.branch_if(taken)
    }

    /// BRK: the padding byte was consumed by immediate addressing, so PC
    /// already holds the return address. Pushes PC then status with B set,
    /// sets I, and vectors through $FFFE.
    fn brk(&mut self, bus: &mut dyn Bus) -> u8 {
        let addr = self.regs.push();
        bus.write(addr, (self.regs.pc >> 8) as u8);
        let addr = self.regs.push();
        bus.write(addr, (self.regs.pc & 0x00FF) as u8);

        let addr = self.regs.push();
        bus.write(addr, self.regs.p.0 | B | U);
        self.regs.p.set(I);

        let lo = u16::from(bus.read(0xFFFE));
        let hi = u16::from(bus.read(0xFFFF));
        self.regs.pc = (hi << 8) | lo;
        0
    }

    fn bvc(&mut self, _bus: &mut dyn Bus) -> u8 {
        let taken = !self.regs.p.is_set(V);
        self.branch_if(taken)
    }

    fn bvs(&mut self, _bus: &mut dyn Bus) -> u8 {
        let taken = self.regs.p.is_set(V);
        self.branch_if(taken)
    }

    fn clc(&mut self, _bus: &mut dyn Bus) -> u8 {
        self.regs.p.clear(C);
        0
    }

    fn cld(&mut self, _bus: &mut dyn Bus) -> u8 {
        self.regs.p.clear(D);
        0
    }

    fn cli(&mut self, _bus: &mut dyn Bus) -> u8 {
        self.regs.p.clear(I);
        0
    }

    fn clv(&mut self, _bus: &mut dyn Bus) -> u8 {
        self.regs.p.clear(V);
        0
    }

    /// Compare helper shared by CMP/CPX/CPY.
    fn compare(&mut self, lhs: u8, rhs: u8) {
        let temp = u16::from(lhs).wrapping_sub(u16::from(rhs));
        self.regs.p.set_if(C, lhs >= rhs);
        self.regs.p.set_if(Z, temp & 0x00FF == 0);
        self.regs.p.set_if(N, temp & 0x0080 != 0);
    }

    fn cmp(&mut self, bus: &mut dyn Bus) -> u8 {
        let fetched = self.fetch(bus);
        self.compare(self.regs.a, fetched);
        1
    }

    fn cpx(&mut self, bus: &mut dyn Bus) -> u8 {
        let fetched = self.fetch(bus);
        self.compare(self.regs.x, fetched);
        0
    }

    fn cpy(&mut self, bus: &mut dyn Bus) -> u8 {
        let fetched = self.fetch(bus);
        self.compare(self.regs.y, fetched);
        0
    }

    fn dec(&mut self, bus: &mut dyn Bus) -> u8 {
        let temp = self.fetch(bus).wrapping_sub(1);
        bus.write(self.addr_abs, temp);
        self.regs.p.update_nz(temp);
        0
    }

    fn dex(&mut self, _bus: &mut dyn Bus) -> u8 {
        self.regs.x = self.regs.x.wrapping_sub(1);
        self.regs.p.update_nz(self.regs.x);
        0
    }

    fn dey(&mut self, _bus: &mut dyn Bus) -> u8 {
        self.regs.y = self.regs.y.wrapping_sub(1);
        self.regs.p.update_nz(self.regs.y);
        0
    }

    fn eor(&mut self, bus: &mut dyn Bus) -> u8 {
        let fetched = self.fetch(bus);
        self.regs.a ^= fetched;
        self.regs.p.update_nz(self.regs.a);
        1
    }

    fn inc(&mut self, bus: &mut dyn Bus) -> u8 {
        let temp = self.fetch(bus).wrapping_add(1);
        bus.write(self.addr_abs, temp);
        self.regs.p.update_nz(temp);
        0
    }

    fn inx(&mut self, _bus: &mut dyn Bus) -> u8 {
        self.regs.x = self.regs.x.wrapping_add(1);
        self.regs.p.update_nz(self.regs.x);
        0
    }

    fn iny(&mut self, _bus: &mut dyn Bus) -> u8 {
        self.regs.y = self.regs.y.wrapping_add(1);
        self.regs.p.update_nz(self.regs.y);
        0
    }

    fn jmp(&mut self, _bus: &mut dyn Bus) -> u8 {
        self.regs.pc = self.addr_abs;
        0
    }

    fn jsr(&mut self, bus: &mut dyn Bus) -> u8 {
        self.regs.pc = self.regs.pc.wrapping_sub(1);

        let addr = self.regs.push();
        bus.write(addr, (self.regs.pc >> 8) as u8);
        let addr = self.regs.push();
        bus.write(addr, (self.regs.pc & 0x00FF) as u8);

        self.regs.pc = self.addr_abs;
        0
    }

    fn lda(&mut self, bus: &mut dyn Bus) -> u8 {
        self.regs.a = self.fetch(bus);
        self.regs.p.update_nz(self.regs.a);
        1
    }

    fn ldx(&mut self, bus: &mut dyn Bus) -> u8 {
        self.regs.x = self.fetch(bus);
        self.regs.p.update_nz(self.regs.x);
        1
    }

    fn ldy(&mut self, bus: &mut dyn Bus) -> u8 {
        self.regs.y = self.fetch(bus);
        self.regs.p.update_nz(self.regs.y);
        1
    }

    fn lsr(&mut self, bus: &mut dyn Bus) -> u8 {
        let fetched = self.fetch(bus);
        self.regs.p.set_if(C, fetched & 0x01 != 0);
        let temp = fetched >> 1;
        self.regs.p.update_nz(temp);
        self.write_result(bus, temp);
        0
    }

    /// Official and unofficial NOPs. The ABS,X-shaped unofficial NOPs can
    /// take the page-cross penalty cycle.
    fn nop(&mut self, _bus: &mut dyn Bus) -> u8 {
        match self.opcode {
            0x1C | 0x3C | 0x5C | 0x7C | 0xDC | 0xFC => 1,
            _ => 0,
        }
    }

    fn ora(&mut self, bus: &mut dyn Bus) -> u8 {
        let fetched = self.fetch(bus);
        self.regs.a |= fetched;
        self.regs.p.update_nz(self.regs.a);
        1
    }

    fn pha(&mut self, bus: &mut dyn Bus) -> u8 {
        let addr = self.regs.push();
        bus.write(addr, self.regs.a);
        0
    }

    /// PHP pushes with B and U set; the live copies are then cleared (the
    /// next fetch restores U).
    fn php(&mut self, bus: &mut dyn Bus) -> u8 {
        let addr = self.regs.push();
        bus.write(addr, self.regs.p.0 | B | U);
        self.regs.p.clear(B);
        self.regs.p.clear(U);
        0
    }

    fn pla(&mut self, bus: &mut dyn Bus) -> u8 {
        let addr = self.regs.pop();
        self.regs.a = bus.read(addr);
        self.regs.p.update_nz(self.regs.a);
        0
    }

    fn plp(&mut self, bus: &mut dyn Bus) -> u8 {
        let addr = self.regs.pop();
        self.regs.p.0 = bus.read(addr);
        self.regs.p.set(U);
        0
    }

    fn rol(&mut self, bus: &mut dyn Bus) -> u8 {
        let fetched = self.fetch(bus);
        let result = (u16::from(fetched) << 1) | u16::from(self.regs.p.bit(C));
        self.regs.p.set_if(C, result & 0xFF00 != 0);
        self.regs.p.set_if(Z, result & 0x00FF == 0);
        self.regs.p.set_if(N, result & 0x0080 != 0);
        self.write_result(bus, (result & 0x00FF) as u8);
        0
    }

    fn ror(&mut self, bus: &mut dyn Bus) -> u8 {
        let fetched = self.fetch(bus);
        let result = (self.regs.p.bit(C) << 7) | (fetched >> 1);
        self.regs.p.set_if(C, fetched & 0x01 != 0);
        self.regs.p.update_nz(result);
        self.write_result(bus, result);
        0
    }

    /// RTI pulls status (B and U are discarded) then PC.
    fn rti(&mut self, bus: &mut dyn Bus) -> u8 {
        let addr = self.regs.pop();
        self.regs.p.0 = bus.read(addr);
        self.regs.p.clear(B);
        self.regs.p.clear(U);

        let addr = self.regs.pop();
        let lo = u16::from(bus.read(addr));
        let addr = self.regs.pop();
        let hi = u16::from(bus.read(addr));
        self.regs.pc = (hi << 8) | lo;
        0
    }

    fn rts(&mut self, bus: &mut dyn Bus) -> u8 {
        let addr = self.regs.pop();
        let lo = u16::from(bus.read(addr));
        let addr = self.regs.pop();
        let hi = u16::from(bus.read(addr));
        self.regs.pc = ((hi << 8) | lo).wrapping_add(1);
        0
    }

    fn sec(&mut self, _bus: &mut dyn Bus) -> u8 {
        self.regs.p.set(C);
        0
    }

    fn sed(&mut self, _bus: &mut dyn Bus) -> u8 {
        self.regs.p.set(D);
        0
    }

    fn sei(&mut self, _bus: &mut dyn Bus) -> u8 {
        self.regs.p.set(I);
        0
    }

    fn sta(&mut self, bus: &mut dyn Bus) -> u8 {
        bus.write(self.addr_abs, self.regs.a);
        0
    }

    fn stx(&mut self, bus: &mut dyn Bus) -> u8 {
        bus.write(self.addr_abs, self.regs.x);
        0
    }

    fn sty(&mut self, bus: &mut dyn Bus) -> u8 {
        bus.write(self.addr_abs, self.regs.y);
        0
    }

    fn tax(&mut self, _bus: &mut dyn Bus) -> u8 {
        self.regs.x = self.regs.a;
        self.regs.p.update_nz(self.regs.x);
        0
    }

    fn tay(&mut self, _bus: &mut dyn Bus) -> u8 {
        self.regs.y = self.regs.a;
        self.regs.p.update_nz(self.regs.y);
        0
    }

    fn tsx(&mut self, _bus: &mut dyn Bus) -> u8 {
        self.regs.x = self.regs.s;
        self.regs.p.update_nz(self.regs.x);
        0
    }

    fn txa(&mut self, _bus: &mut dyn Bus) -> u8 {
        self.regs.a = self.regs.x;
        self.regs.p.update_nz(self.regs.a);
        0
    }

    fn txs(&mut self, _bus: &mut dyn Bus) -> u8 {
        self.regs.s = self.regs.x;
        0
    }

    fn tya(&mut self, _bus: &mut dyn Bus) -> u8 {
        self.regs.a = self.regs.y;
        self.regs.p.update_nz(self.regs.a);
        0
    }

    /// Placeholder for undefined opcodes: burns its tabled cycles, touches
    /// nothing.
    fn xxx(&mut self, _bus: &mut dyn Bus) -> u8 {
        0
    }
}

impl fc_core::Cpu for Cpu6502 {
    type Registers = Registers;

    fn clock(&mut self, bus: &mut dyn Bus) {
        Cpu6502::clock(self, bus);
    }

    fn reset(&mut self, bus: &mut dyn Bus) {
        Cpu6502::reset(self, bus);
    }

    fn irq(&mut self, bus: &mut dyn Bus) {
        Cpu6502::irq(self, bus);
    }

    fn nmi(&mut self, bus: &mut dyn Bus) {
        Cpu6502::nmi(self, bus);
    }

    fn complete(&self) -> bool {
        Cpu6502::complete(self)
    }

    fn registers(&self) -> Registers {
        self.regs
    }
}

impl Observable for Cpu6502 {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(flag) = path.strip_prefix("flags.") {
            let mask = match flag {
                "c" => C,
                "z" => Z,
                "i" => I,
                "d" => D,
                "b" => B,
                "u" => U,
                "v" => V,
                "n" => N,
                _ => return None,
            };
            return Some(self.regs.p.is_set(mask).into());
        }

        match path {
            "pc" => Some(self.regs.pc.into()),
            "a" => Some(self.regs.a.into()),
            "x" => Some(self.regs.x.into()),
            "y" => Some(self.regs.y.into()),
            "s" => Some(self.regs.s.into()),
            "p" => Some(self.regs.p.0.into()),
            "opcode" => Some(self.opcode.into()),
            "cycles" => Some(self.cycles.into()),
            "total_cycles" => Some(self.total_cycles.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pc",
            "a",
            "x",
            "y",
            "s",
            "p",
            "opcode",
            "cycles",
            "total_cycles",
            "flags.c",
            "flags.z",
            "flags.i",
            "flags.d",
            "flags.b",
            "flags.u",
            "flags.v",
            "flags.n",
        ]
    }
}
