//! Unit tests for 6502 instruction behavior and cycle accounting.

use fc_core::{Bus, SimpleBus};
use fc_6502::{B, C, I, N, U, V, Z, Cpu6502};

/// Run one complete instruction (execute cycle + countdown).
fn run_instruction(cpu: &mut Cpu6502, bus: &mut SimpleBus) {
    cpu.clock(bus);
    for _ in 0..20 {
        if cpu.complete() {
            return;
        }
        cpu.clock(bus);
    }
    panic!("instruction did not complete within 20 cycles");
}

/// Run one instruction and return how many cycles it consumed.
fn timed_instruction(cpu: &mut Cpu6502, bus: &mut SimpleBus) -> u64 {
    let start = cpu.total_cycles();
    run_instruction(cpu, bus);
    cpu.total_cycles() - start
}

/// Load a program at `pc` and point the CPU there.
fn setup_program(bus: &mut SimpleBus, cpu: &mut Cpu6502, pc: u16, program: &[u8]) {
    bus.load(pc, program);
    cpu.regs.pc = pc;
}

// ---------------------------------------------------------------------------
// Reset
// ---------------------------------------------------------------------------

#[test]
fn reset_loads_vector_and_clears_state() {
    let mut bus = SimpleBus::new();
    bus.load(0xFFFC, &[0x34, 0x12]);
    let mut cpu = Cpu6502::new();
    cpu.regs.a = 0xAA;
    cpu.regs.x = 0xBB;
    cpu.regs.y = 0xCC;

    cpu.reset(&mut bus);

    assert_eq!(cpu.regs.pc, 0x1234);
    assert_eq!(cpu.regs.a, 0);
    assert_eq!(cpu.regs.x, 0);
    assert_eq!(cpu.regs.y, 0);
    assert_eq!(cpu.regs.s, 0xFD);
    assert_eq!(cpu.regs.p.0, U, "status holds only the unused bit");
}

#[test]
fn reset_charges_eight_cycles_without_bus_traffic() {
    let mut bus = SimpleBus::new();
    bus.load(0xFFFC, &[0x00, 0x02]);
    // A marker instruction at the reset target: LDA #$55.
    bus.load(0x0200, &[0xA9, 0x55]);
    let mut cpu = Cpu6502::new();
    cpu.reset(&mut bus);

    // The next 8 clocks are internal countdown only.
    for _ in 0..8 {
        assert!(!cpu.complete());
        cpu.clock(&mut bus);
        assert_eq!(cpu.regs.a, 0, "no instruction may run during reset");
    }
    assert!(cpu.complete());

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a, 0x55);
}

// ---------------------------------------------------------------------------
// Interrupts
// ---------------------------------------------------------------------------

#[test]
fn nmi_stack_discipline_and_rti_round_trip() {
    let mut bus = SimpleBus::new();
    bus.load(0xFFFA, &[0x00, 0x03]); // NMI vector -> $0300
    bus.load(0x0300, &[0x40]); // RTI

    let mut cpu = Cpu6502::new();
    cpu.regs.pc = 0x8123;
    cpu.regs.s = 0xFD;
    cpu.regs.p.set(C);
    cpu.regs.p.set(N);
    let status_before = cpu.regs.p.0;

    cpu.nmi(&mut bus);

    // Exactly 3 bytes pushed: PC high, PC low, status.
    assert_eq!(cpu.regs.s, 0xFA);
    assert_eq!(bus.peek(0x01FD), 0x81, "PC high pushed first");
    assert_eq!(bus.peek(0x01FC), 0x23, "PC low pushed second");
    let pushed = bus.peek(0x01FB);
    assert_eq!(pushed & B, 0, "B clear in interrupt push");
    assert_ne!(pushed & U, 0, "U set in interrupt push");
    assert_eq!(cpu.regs.pc, 0x0300);
    assert!(cpu.regs.p.is_set(I));

    // Burn the 8 interrupt cycles, then run RTI.
    while !cpu.complete() {
        cpu.clock(&mut bus);
    }
    run_instruction(&mut cpu, &mut bus);

    assert_eq!(cpu.regs.pc, 0x8123, "RTI restores the interrupted PC");
    assert_eq!(cpu.regs.s, 0xFD);
    // B and U are discarded on pull; the rest matches the pushed byte
    // (which carries I, set during the interrupt sequence).
    assert_eq!(cpu.regs.p.0 & !(B | U), pushed & !(B | U));
    assert_eq!(pushed & !(B | U | I), status_before & !(B | U | I));
}

#[test]
fn nmi_charges_eight_cycles_irq_seven() {
    let mut bus = SimpleBus::new();
    bus.load(0xFFFA, &[0x00, 0x03]);
    bus.load(0xFFFE, &[0x00, 0x04]);

    let mut cpu = Cpu6502::new();
    cpu.regs.p.clear(I);
    cpu.nmi(&mut bus);
    let mut n = 0;
    while !cpu.complete() {
        cpu.clock(&mut bus);
        n += 1;
    }
    assert_eq!(n, 8);

    let mut cpu = Cpu6502::new();
    cpu.regs.p.clear(I);
    cpu.irq(&mut bus);
    let mut n = 0;
    while !cpu.complete() {
        cpu.clock(&mut bus);
        n += 1;
    }
    assert_eq!(n, 7);
}

#[test]
fn irq_masked_by_interrupt_disable() {
    let mut bus = SimpleBus::new();
    bus.load(0xFFFE, &[0x00, 0x04]);

    let mut cpu = Cpu6502::new();
    cpu.regs.pc = 0x8000;
    cpu.regs.p.set(I);
    cpu.irq(&mut bus);

    assert_eq!(cpu.regs.pc, 0x8000, "masked IRQ must not vector");
    assert_eq!(cpu.regs.s, 0xFD, "masked IRQ must not push");
}

// ---------------------------------------------------------------------------
// ADC / SBC
// ---------------------------------------------------------------------------

#[test]
fn adc_sbc_round_trip_full_space() {
    // Subtracting with a borrow equal to the carry that was added undoes
    // ADC for every (A, operand, carry-in) — on the 6502 the borrow is the
    // complemented carry, so SBC runs with C = !c. The classic two's-
    // complement identity validating the XOR-with-$FF subtraction.
    let mut bus = SimpleBus::new();
    let mut cpu = Cpu6502::new();

    for a in 0..=255u8 {
        for operand in 0..=255u8 {
            for carry in 0..=1u8 {
                setup_program(&mut bus, &mut cpu, 0x0200, &[0x69, operand, 0xE9, operand]);
                cpu.regs.a = a;
                cpu.regs.p.set_if(C, carry == 1);
                run_instruction(&mut cpu, &mut bus);

                cpu.regs.p.set_if(C, carry == 0);
                run_instruction(&mut cpu, &mut bus);

                assert_eq!(
                    cpu.regs.a, a,
                    "round trip failed for A={a:#04X} M={operand:#04X} C={carry}"
                );
            }
        }
    }
}

#[test]
fn adc_signed_overflow_cases() {
    let mut bus = SimpleBus::new();
    let mut cpu = Cpu6502::new();

    // 0x50 + 0x50 = 0xA0: positive + positive -> negative, V set.
    setup_program(&mut bus, &mut cpu, 0x0200, &[0x69, 0x50]);
    cpu.regs.a = 0x50;
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a, 0xA0);
    assert!(cpu.regs.p.is_set(V));
    assert!(cpu.regs.p.is_set(N));
    assert!(!cpu.regs.p.is_set(C));

    // 0xD0 + 0x90 = 0x160: negative + negative -> positive, V and C set.
    setup_program(&mut bus, &mut cpu, 0x0200, &[0x69, 0x90]);
    cpu.regs.a = 0xD0;
    cpu.regs.p.clear(C);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.a, 0x60);
    assert!(cpu.regs.p.is_set(V));
    assert!(cpu.regs.p.is_set(C));
}

// ---------------------------------------------------------------------------
// Page-cross cycle accounting
// ---------------------------------------------------------------------------

#[test]
fn absolute_indexed_page_cross_costs_extra_cycle() {
    let mut bus = SimpleBus::new();
    let mut cpu = Cpu6502::new();

    // LDA $20FF,X with X=1 crosses into $2100: 4 + 1 cycles.
    setup_program(&mut bus, &mut cpu, 0x0200, &[0xBD, 0xFF, 0x20]);
    cpu.regs.x = 1;
    assert_eq!(timed_instruction(&mut cpu, &mut bus), 5);

    // LDA $2000,X with X=1 stays on the page: 4 cycles.
    setup_program(&mut bus, &mut cpu, 0x0200, &[0xBD, 0x00, 0x20]);
    cpu.regs.x = 1;
    assert_eq!(timed_instruction(&mut cpu, &mut bus), 4);

    // Same for Y indexing.
    setup_program(&mut bus, &mut cpu, 0x0200, &[0xB9, 0xFF, 0x20]);
    cpu.regs.y = 1;
    assert_eq!(timed_instruction(&mut cpu, &mut bus), 5);

    setup_program(&mut bus, &mut cpu, 0x0200, &[0xB9, 0x00, 0x20]);
    cpu.regs.y = 1;
    assert_eq!(timed_instruction(&mut cpu, &mut bus), 4);
}

#[test]
fn indirect_indexed_page_cross_costs_extra_cycle() {
    let mut bus = SimpleBus::new();
    let mut cpu = Cpu6502::new();

    // Pointer at $10 -> $20FF; LDA ($10),Y with Y=1 crosses: 5 + 1.
    bus.load(0x0010, &[0xFF, 0x20]);
    setup_program(&mut bus, &mut cpu, 0x0200, &[0xB1, 0x10]);
    cpu.regs.y = 1;
    assert_eq!(timed_instruction(&mut cpu, &mut bus), 6);

    // Pointer -> $2000; no cross: 5.
    bus.load(0x0010, &[0x00, 0x20]);
    setup_program(&mut bus, &mut cpu, 0x0200, &[0xB1, 0x10]);
    cpu.regs.y = 1;
    assert_eq!(timed_instruction(&mut cpu, &mut bus), 5);
}

#[test]
fn store_never_takes_the_penalty() {
    let mut bus = SimpleBus::new();
    let mut cpu = Cpu6502::new();

    // STA $20FF,X crosses the page but stays 5 cycles: the operation's
    // indicator is 0, and the charge is the AND of both indicators.
    setup_program(&mut bus, &mut cpu, 0x0200, &[0x9D, 0xFF, 0x20]);
    cpu.regs.x = 1;
    assert_eq!(timed_instruction(&mut cpu, &mut bus), 5);
}

// ---------------------------------------------------------------------------
// Branches
// ---------------------------------------------------------------------------

#[test]
fn branch_timing_not_taken_taken_and_page_cross() {
    let mut bus = SimpleBus::new();
    let mut cpu = Cpu6502::new();

    // Not taken: 2 cycles.
    setup_program(&mut bus, &mut cpu, 0x0200, &[0xD0, 0x10]); // BNE +16
    cpu.regs.p.set(Z);
    assert_eq!(timed_instruction(&mut cpu, &mut bus), 2);
    assert_eq!(cpu.regs.pc, 0x0202);

    // Taken, same page: 3 cycles.
    setup_program(&mut bus, &mut cpu, 0x0200, &[0xD0, 0x10]);
    cpu.regs.p.clear(Z);
    assert_eq!(timed_instruction(&mut cpu, &mut bus), 3);
    assert_eq!(cpu.regs.pc, 0x0212);

    // Taken, crossing a page: 4 cycles.
    setup_program(&mut bus, &mut cpu, 0x02F0, &[0xD0, 0x20]); // BNE +32
    cpu.regs.p.clear(Z);
    assert_eq!(timed_instruction(&mut cpu, &mut bus), 4);
    assert_eq!(cpu.regs.pc, 0x0312);

    // Backward branch.
    setup_program(&mut bus, &mut cpu, 0x0200, &[0xD0, 0xFB]); // BNE -5
    cpu.regs.p.clear(Z);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.pc, 0x01FD);
}

// ---------------------------------------------------------------------------
// Indirect JMP page-wrap bug
// ---------------------------------------------------------------------------

#[test]
fn jmp_indirect_wraps_within_page() {
    let mut bus = SimpleBus::new();
    let mut cpu = Cpu6502::new();

    bus.write(0x20FF, 0x34); // target low
    bus.write(0x2000, 0x12); // target high comes from the SAME page
    bus.write(0x2100, 0x56); // the byte a correct fetch would use

    setup_program(&mut bus, &mut cpu, 0x0200, &[0x6C, 0xFF, 0x20]); // JMP ($20FF)
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.pc, 0x1234);

    // A pointer not ending in $FF fetches normally.
    bus.write(0x20FE, 0x78);
    bus.write(0x20FF, 0x9A);
    setup_program(&mut bus, &mut cpu, 0x0200, &[0x6C, 0xFE, 0x20]); // JMP ($20FE)
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.pc, 0x9A78);
}

// ---------------------------------------------------------------------------
// Stack discipline
// ---------------------------------------------------------------------------

#[test]
fn stack_lives_in_page_one_and_wraps() {
    let mut bus = SimpleBus::new();
    let mut cpu = Cpu6502::new();

    // PHA with S=$00 writes $0100 and wraps S to $FF.
    setup_program(&mut bus, &mut cpu, 0x0200, &[0x48]);
    cpu.regs.a = 0x77;
    cpu.regs.s = 0x00;
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(bus.peek(0x0100), 0x77);
    assert_eq!(cpu.regs.s, 0xFF);
}

#[test]
fn jsr_rts_round_trip() {
    let mut bus = SimpleBus::new();
    let mut cpu = Cpu6502::new();

    // JSR $0300 / ... / subroutine RTS.
    setup_program(&mut bus, &mut cpu, 0x0200, &[0x20, 0x00, 0x03, 0xA9, 0x01]);
    bus.load(0x0300, &[0x60]); // RTS

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.pc, 0x0300);
    // Return address on the stack is the last byte of the JSR operand.
    assert_eq!(bus.peek(0x01FD), 0x02);
    assert_eq!(bus.peek(0x01FC), 0x02);

    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.regs.pc, 0x0203, "RTS resumes after the JSR");

    run_instruction(&mut cpu, &mut bus); // LDA #$01
    assert_eq!(cpu.regs.a, 1);
}

#[test]
fn php_pushes_b_and_u_plp_restores() {
    let mut bus = SimpleBus::new();
    let mut cpu = Cpu6502::new();

    setup_program(&mut bus, &mut cpu, 0x0200, &[0x38, 0x08, 0x18, 0x28]); // SEC PHP CLC PLP
    for _ in 0..4 {
        run_instruction(&mut cpu, &mut bus);
    }
    assert!(cpu.regs.p.is_set(C), "PLP restores carry");

    // The pushed byte carried B and U.
    assert_ne!(bus.peek(0x01FD) & (B | U), 0);
    assert_eq!(bus.peek(0x01FD) & (B | U), B | U);
}

#[test]
fn brk_pushes_return_address_and_vectors() {
    let mut bus = SimpleBus::new();
    let mut cpu = Cpu6502::new();
    bus.load(0xFFFE, &[0x00, 0x03]);

    setup_program(&mut bus, &mut cpu, 0x0200, &[0x58, 0x00, 0xEA]); // CLI BRK padding
    run_instruction(&mut cpu, &mut bus); // CLI
    run_instruction(&mut cpu, &mut bus); // BRK

    assert_eq!(cpu.regs.pc, 0x0300);
    assert!(cpu.regs.p.is_set(I));
    assert_eq!(cpu.regs.s, 0xFA);
    // Return address skips the padding byte: $0203.
    assert_eq!(bus.peek(0x01FD), 0x02);
    assert_eq!(bus.peek(0x01FC), 0x03);
    let pushed = bus.peek(0x01FB);
    assert_eq!(pushed & (B | U), B | U, "BRK pushes with B and U set");
    assert_eq!(pushed & I, 0, "I was clear at push time");
}

// ---------------------------------------------------------------------------
// Unofficial opcodes
// ---------------------------------------------------------------------------

#[test]
fn unofficial_nops_burn_their_tabled_cycles() {
    let mut bus = SimpleBus::new();
    let mut cpu = Cpu6502::new();

    // $1A: 2-cycle NOP.
    setup_program(&mut bus, &mut cpu, 0x0200, &[0x1A]);
    assert_eq!(timed_instruction(&mut cpu, &mut bus), 2);
    assert_eq!(cpu.regs.pc, 0x0201);

    // $0C: 4-cycle NOP.
    setup_program(&mut bus, &mut cpu, 0x0200, &[0x0C]);
    assert_eq!(timed_instruction(&mut cpu, &mut bus), 4);

    // $03: 8-cycle placeholder, no register effects.
    setup_program(&mut bus, &mut cpu, 0x0200, &[0x03]);
    let before = cpu.regs;
    let cycles = timed_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 8);
    assert_eq!(cpu.regs.a, before.a);
    assert_eq!(cpu.regs.s, before.s);
}

// ---------------------------------------------------------------------------
// Flag spot checks
// ---------------------------------------------------------------------------

#[test]
fn compare_sets_carry_zero_negative() {
    let mut bus = SimpleBus::new();
    let mut cpu = Cpu6502::new();

    setup_program(&mut bus, &mut cpu, 0x0200, &[0xC9, 0x10]); // CMP #$10
    cpu.regs.a = 0x10;
    run_instruction(&mut cpu, &mut bus);
    assert!(cpu.regs.p.is_set(C));
    assert!(cpu.regs.p.is_set(Z));

    setup_program(&mut bus, &mut cpu, 0x0200, &[0xC9, 0x20]);
    cpu.regs.a = 0x10;
    run_instruction(&mut cpu, &mut bus);
    assert!(!cpu.regs.p.is_set(C));
    assert!(cpu.regs.p.is_set(N));
}

#[test]
fn bit_reflects_operand_high_bits() {
    let mut bus = SimpleBus::new();
    let mut cpu = Cpu6502::new();

    bus.write(0x0010, 0xC0);
    setup_program(&mut bus, &mut cpu, 0x0200, &[0x24, 0x10]); // BIT $10
    cpu.regs.a = 0x0F;
    run_instruction(&mut cpu, &mut bus);
    assert!(cpu.regs.p.is_set(N));
    assert!(cpu.regs.p.is_set(V));
    assert!(cpu.regs.p.is_set(Z), "A & M == 0");
}

#[test]
fn rmw_instructions_write_through_the_bus() {
    let mut bus = SimpleBus::new();
    let mut cpu = Cpu6502::new();

    bus.write(0x0040, 0x80);
    setup_program(&mut bus, &mut cpu, 0x0200, &[0x46, 0x40]); // LSR $40
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(bus.peek(0x0040), 0x40);
    assert!(!cpu.regs.p.is_set(C));

    bus.write(0x0041, 0xFF);
    setup_program(&mut bus, &mut cpu, 0x0200, &[0xE6, 0x41]); // INC $41
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(bus.peek(0x0041), 0x00);
    assert!(cpu.regs.p.is_set(Z));
}
