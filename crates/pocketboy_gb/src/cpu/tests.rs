use super::*;
use crate::bus::Interrupts;
use crate::error::Error;
use crate::cartridge::FlatCartridge;
use crate::machine::{EmulatorOptions, GameBoy};
use crate::opcodes::{ILLEGAL_OPCODES, OPCODES};
use crate::DEFAULT_ENTRY_POINT;

const ENTRY: u16 = DEFAULT_ENTRY_POINT;

/// Machine with `code` placed at the entry point of a flat test ROM.
fn machine_with(code: &[u8]) -> GameBoy {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut rom = vec![0u8; usize::from(ENTRY)];
    rom.extend_from_slice(code);
    let cart = FlatCartridge::with_ram(rom).unwrap();
    GameBoy::new(Box::new(cart), EmulatorOptions::default())
}

/// Run `code` until it halts; programs are expected to end in STOP or HALT.
fn run_code(code: &[u8]) -> GameBoy {
    let mut gb = machine_with(code);
    gb.run().unwrap();
    gb
}

#[test]
fn register_halves_compose() {
    let mut reg = Register::new(0x1234);
    assert_eq!(reg.high(), 0x12);
    assert_eq!(reg.low(), 0x34);
    reg.set_high(0xAB);
    assert_eq!(reg.value(), 0xAB34);
    reg.set_low(0xCD);
    assert_eq!(reg.value(), 0xABCD);
}

#[test]
fn flags_pack_into_the_high_nibble() {
    let flags = Flags {
        zero: true,
        subtract: false,
        half_carry: true,
        carry: false,
    };
    assert_eq!(flags.to_byte(), 0xA0);
    assert_eq!(Flags::from_byte(0xA0), flags);
    // The low nibble does not exist.
    assert_eq!(Flags::from_byte(0x0F), Flags::default());
}

#[test]
fn af_masks_the_phantom_flag_bits() {
    let mut cpu = Cpu::new();
    cpu.set_af(0x12FF);
    assert_eq!(cpu.a, 0x12);
    assert_eq!(cpu.af(), 0x12F0);
}

#[test]
fn get8_and_set8_cover_every_operand() {
    let mut gb = machine_with(&[]);
    let regs = [
        Reg8::A,
        Reg8::B,
        Reg8::C,
        Reg8::D,
        Reg8::E,
        Reg8::H,
        Reg8::L,
    ];
    for (i, reg) in regs.iter().enumerate() {
        gb.cpu
            .set8(&mut gb.bus, Operand::Reg(*reg), 0x10 + i as u8)
            .unwrap();
    }
    for (i, reg) in regs.iter().enumerate() {
        assert_eq!(
            gb.cpu.get8(&gb.bus, Operand::Reg(*reg)).unwrap(),
            0x10 + i as u8
        );
    }

    gb.cpu.hl.set_value(0xC040);
    gb.cpu.set8(&mut gb.bus, Operand::Mem(Reg16::HL), 0x99).unwrap();
    assert_eq!(gb.cpu.get8(&gb.bus, Operand::Mem(Reg16::HL)).unwrap(), 0x99);

    gb.cpu.bc.set_low(0x80);
    gb.cpu.set8(&mut gb.bus, Operand::HighC, 0x77).unwrap();
    assert_eq!(gb.cpu.get8(&gb.bus, Operand::HighC).unwrap(), 0x77);
    assert_eq!(gb.bus.read(0xFF80).unwrap(), 0x77);
}

#[test]
#[should_panic(expected = "not an indirect addressing pair")]
fn memory_operand_through_sp_is_a_bug() {
    let gb = machine_with(&[]);
    let _ = gb.cpu.get8(&gb.bus, Operand::Mem(Reg16::SP));
}

#[test]
fn ld_program_counts_cycles_exactly() {
    // LD BC,0x3412; LD DE,0xFFC3; LD HL,0xBBAA; LD B,C; LD H,E;
    // LD (HL),B; LD A,(HL)
    let mut gb = machine_with(&[
        0x01, 0x12, 0x34, 0x11, 0xC3, 0xFF, 0x21, 0xAA, 0xBB, 0x41, 0x63, 0x70, 0x7E,
    ]);
    for _ in 0..7 {
        gb.step().unwrap();
    }
    assert_eq!(gb.cpu.bc.value(), 0x1212);
    assert_eq!(gb.cpu.de.value(), 0xFFC3);
    assert_eq!(gb.cpu.hl.value(), 0xC3AA);
    assert_eq!(gb.cpu.a, 0x12);
    assert_eq!(gb.cpu.cycles.machine, 13);
    assert_eq!(gb.cpu.cycles.cpu, 60);
}

#[test]
fn inc16_and_dec16_wrap_without_touching_flags() {
    // LD BC,0x0000; DEC BC; LD DE,0xFFFF; INC DE
    let mut gb = machine_with(&[0x01, 0x00, 0x00, 0x0B, 0x11, 0xFF, 0xFF, 0x13]);
    gb.cpu.flags = Flags::from_byte(0xF0);
    for _ in 0..4 {
        gb.step().unwrap();
    }
    assert_eq!(gb.cpu.bc.value(), 0xFFFF);
    assert_eq!(gb.cpu.de.value(), 0x0000);
    assert_eq!(gb.cpu.flags.to_byte(), 0xF0);
}

#[test]
fn inc8_half_carries_and_preserves_carry() {
    // LD A,0x0F; SCF; INC A
    let gb = run_code(&[0x3E, 0x0F, 0x37, 0x3C, 0x10]);
    assert_eq!(gb.cpu.a, 0x10);
    assert!(gb.cpu.flags.half_carry);
    assert!(!gb.cpu.flags.subtract);
    assert!(gb.cpu.flags.carry);
}

#[test]
fn dec8_to_zero_sets_zero_and_subtract() {
    // LD B,0x01; DEC B
    let gb = run_code(&[0x06, 0x01, 0x05, 0x10]);
    assert_eq!(gb.cpu.bc.high(), 0x00);
    assert!(gb.cpu.flags.zero);
    assert!(gb.cpu.flags.subtract);
}

#[test]
fn adc_folds_carry_into_the_half_carry() {
    // LD A,0xFA; LD BC,0x0F0F; ADD A,B; LD L,A; ADC A,C
    let mut gb = machine_with(&[0x3E, 0xFA, 0x01, 0x0F, 0x0F, 0x80, 0x6F, 0x89]);
    for _ in 0..3 {
        gb.step().unwrap();
    }
    // 0xFA + 0x0F carries out of both nibbles.
    assert_eq!(gb.cpu.a, 0x09);
    assert_eq!(gb.cpu.flags.to_byte(), 0x30);
    gb.step().unwrap();
    gb.step().unwrap();
    // 0x09 + 0x0F + carry: half-carry only exists because of the carry-in.
    assert_eq!(gb.cpu.a, 0x19);
    assert_eq!(gb.cpu.flags.to_byte(), 0x20);
}

#[test]
fn sub_borrows_and_cp_leaves_a_alone() {
    // LD A,0x10; SUB A,0x01; CP A,0x0F
    let gb = run_code(&[0x3E, 0x10, 0xD6, 0x01, 0xFE, 0x0F, 0x10]);
    assert_eq!(gb.cpu.a, 0x0F);
    assert!(gb.cpu.flags.zero);
    assert!(gb.cpu.flags.subtract);
    assert!(!gb.cpu.flags.carry);
}

#[test]
fn sbc_borrows_through_the_carry() {
    // LD A,0x00; SUB A,0x01 (sets carry); LD A,0x10; SBC A,0x0F
    let gb = run_code(&[0x3E, 0x00, 0xD6, 0x01, 0x3E, 0x10, 0xDE, 0x0F, 0x10]);
    assert_eq!(gb.cpu.a, 0x00);
    assert!(gb.cpu.flags.zero);
    assert!(gb.cpu.flags.half_carry);
    assert!(!gb.cpu.flags.carry);
}

#[test]
fn logic_ops_set_their_fixed_flags() {
    // LD A,0xF0; AND A,0x0F -> 0, Z and H set
    let gb = run_code(&[0x3E, 0xF0, 0xE6, 0x0F, 0x10]);
    assert_eq!(gb.cpu.a, 0x00);
    assert!(gb.cpu.flags.zero);
    assert!(gb.cpu.flags.half_carry);
    assert!(!gb.cpu.flags.carry);

    // XOR A clears A; OR rebuilds it
    let gb = run_code(&[0x3E, 0x5A, 0xAF, 0xF6, 0x21, 0x10]);
    assert_eq!(gb.cpu.a, 0x21);
    assert!(!gb.cpu.flags.zero);
    assert!(!gb.cpu.flags.half_carry);
}

#[test]
fn daa_adjusts_bcd_addition() {
    // LD A,0x15; ADD A,0x27; DAA -> 0x42
    let gb = run_code(&[0x3E, 0x15, 0xC6, 0x27, 0x27, 0x10]);
    assert_eq!(gb.cpu.a, 0x42);
    assert!(!gb.cpu.flags.carry);
    assert!(!gb.cpu.flags.half_carry);
}

#[test]
fn add_hl_carries_out_of_bit_11_and_preserves_zero() {
    // LD HL,0x0FFF; LD BC,0x0001; ADD HL,BC
    let mut gb = machine_with(&[0x21, 0xFF, 0x0F, 0x01, 0x01, 0x00, 0x09]);
    gb.cpu.flags.zero = true;
    for _ in 0..3 {
        gb.step().unwrap();
    }
    assert_eq!(gb.cpu.hl.value(), 0x1000);
    assert!(gb.cpu.flags.half_carry);
    assert!(!gb.cpu.flags.carry);
    assert!(gb.cpu.flags.zero);
}

#[test]
fn cpl_scf_ccf() {
    // LD A,0xF0; CPL; SCF; CCF
    let mut gb = machine_with(&[0x3E, 0xF0, 0x2F, 0x37, 0x3F]);
    gb.step().unwrap();
    gb.step().unwrap();
    assert_eq!(gb.cpu.a, 0x0F);
    assert!(gb.cpu.flags.subtract);
    assert!(gb.cpu.flags.half_carry);
    gb.step().unwrap();
    assert!(gb.cpu.flags.carry);
    assert!(!gb.cpu.flags.half_carry);
    gb.step().unwrap();
    assert!(!gb.cpu.flags.carry);
}

#[test]
fn jr_taken_skips_and_charges_the_long_cost() {
    // XOR A; JR Z,+1; INC A (skipped); INC A; STOP
    let gb = run_code(&[0xAF, 0x28, 0x01, 0x3C, 0x3C, 0x10]);
    assert_eq!(gb.cpu.a, 0x01);
    assert_eq!(gb.cpu.cycles.machine, 1 + 2 + 1 + 1);
    assert_eq!(gb.cpu.cycles.cpu, 4 + 12 + 4 + 4);
}

#[test]
fn jr_not_taken_falls_through_on_the_short_cost() {
    // XOR A; JR NZ,+1; INC A; INC A; STOP
    let gb = run_code(&[0xAF, 0x20, 0x01, 0x3C, 0x3C, 0x10]);
    assert_eq!(gb.cpu.a, 0x02);
    assert_eq!(gb.cpu.cycles.cpu, 4 + 8 + 4 + 4 + 4);
}

#[test]
fn jr_backwards_loops() {
    // loop: INC A; CP A,0x03; JR NZ,loop; STOP
    let gb = run_code(&[0x3C, 0xFE, 0x03, 0x20, 0xFB, 0x10]);
    assert_eq!(gb.cpu.a, 0x03);
}

#[test]
fn call_and_ret_round_trip_through_the_stack() {
    // CALL sub; STOP; sub: LD A,0x42; RET
    let lo = (ENTRY + 4) as u8;
    let hi = ((ENTRY + 4) >> 8) as u8;
    let gb = run_code(&[0xCD, lo, hi, 0x10, 0x3E, 0x42, 0xC9]);
    assert_eq!(gb.cpu.a, 0x42);
    assert_eq!(gb.cpu.sp.value(), 0xFFFE);
    assert_eq!(gb.cpu.cycles.cpu, 24 + 8 + 16 + 4);
}

#[test]
fn conditional_call_not_taken_is_cheap() {
    // XOR A; CALL NZ,a16; STOP
    let gb = run_code(&[0xAF, 0xC4, 0xFF, 0xFF, 0x10]);
    assert_eq!(gb.cpu.sp.value(), 0xFFFE);
    assert_eq!(gb.cpu.cycles.cpu, 4 + 12 + 4);
}

#[test]
fn rst_pushes_the_return_address() {
    let mut rom = vec![0u8; usize::from(ENTRY) + 1];
    // Vector 08h: LD A,0x07; HALT
    rom[0x08..0x0B].copy_from_slice(&[0x3E, 0x07, 0x76]);
    rom[usize::from(ENTRY)] = 0xCF;
    let cart = FlatCartridge::new(rom).unwrap();
    let mut gb = GameBoy::new(Box::new(cart), EmulatorOptions::default());
    gb.run().unwrap();

    assert_eq!(gb.cpu.a, 0x07);
    assert_eq!(gb.cpu.sp.value(), 0xFFFC);
    // Return address: high at SP+1, low at SP.
    assert_eq!(gb.bus.read(0xFFFC).unwrap(), (ENTRY + 1) as u8);
    assert_eq!(gb.bus.read(0xFFFD).unwrap(), ((ENTRY + 1) >> 8) as u8);
}

#[test]
fn pop_af_drops_the_low_nibble() {
    // LD BC,0x12FF; PUSH BC; POP AF; PUSH AF; POP DE
    let gb = run_code(&[0x01, 0xFF, 0x12, 0xC5, 0xF1, 0xF5, 0xD1, 0x10]);
    assert_eq!(gb.cpu.a, 0x12);
    assert_eq!(gb.cpu.flags.to_byte(), 0xF0);
    assert_eq!(gb.cpu.de.value(), 0x12F0);
}

#[test]
fn high_page_forms_reach_hram_and_io() {
    // LD A,0x2A; LDH (0x80),A; LD C,0x80; XOR A; LD A,(C)
    let gb = run_code(&[0x3E, 0x2A, 0xE0, 0x80, 0x0E, 0x80, 0xAF, 0xF2, 0x10]);
    assert_eq!(gb.cpu.a, 0x2A);
    assert_eq!(gb.bus.read(0xFF80).unwrap(), 0x2A);
}

#[test]
fn high_c_operand_costs_an_extra_machine_cycle() {
    // LD C,0x80; LD (C),A
    let mut gb = machine_with(&[0x0E, 0x80, 0xE2]);
    gb.step().unwrap();
    let before = gb.cpu.cycles;
    gb.step().unwrap();
    assert_eq!(gb.cpu.cycles.machine - before.machine, 2);
    assert_eq!(gb.cpu.cycles.cpu - before.cpu, 8);
}

#[test]
fn absolute_loads_move_a_through_work_ram() {
    // LD A,0x77; LD (0xC000),A; XOR A; LD A,(0xC000)
    let gb = run_code(&[0x3E, 0x77, 0xEA, 0x00, 0xC0, 0xAF, 0xFA, 0x00, 0xC0, 0x10]);
    assert_eq!(gb.cpu.a, 0x77);
    assert_eq!(gb.bus.read(0xC000).unwrap(), 0x77);
}

#[test]
fn ld_a16_sp_stores_little_endian() {
    // LD SP,0xBEEF; LD (0xC100),SP
    let mut gb = machine_with(&[0x31, 0xEF, 0xBE, 0x08, 0x00, 0xC1]);
    gb.step().unwrap();
    gb.step().unwrap();
    assert_eq!(gb.bus.read(0xC100).unwrap(), 0xEF);
    assert_eq!(gb.bus.read(0xC101).unwrap(), 0xBE);
    assert_eq!(gb.cpu.cycles.cpu, 12 + 20);
    // SP untouched afterwards; restore before anything stack-like runs.
    assert_eq!(gb.cpu.sp.value(), 0xBEEF);
}

#[test]
fn sp_offset_forms_flag_on_the_low_byte() {
    // LD SP,0xFFF8; ADD SP,+8; LD HL,SP-2
    let mut gb = machine_with(&[0x31, 0xF8, 0xFF, 0xE8, 0x08, 0xF8, 0xFE]);
    gb.step().unwrap();
    gb.step().unwrap();
    assert_eq!(gb.cpu.sp.value(), 0x0000);
    assert!(gb.cpu.flags.half_carry);
    assert!(gb.cpu.flags.carry);
    assert!(!gb.cpu.flags.zero);
    gb.step().unwrap();
    assert_eq!(gb.cpu.hl.value(), 0xFFFE);
    assert!(!gb.cpu.flags.half_carry);
    assert!(!gb.cpu.flags.carry);
}

#[test]
fn ldi_and_ldd_step_hl() {
    // LD HL,0xC000; LD A,0x11; LDI (HL),A; LDD A,(HL)
    let mut gb = machine_with(&[0x21, 0x00, 0xC0, 0x3E, 0x11, 0x22, 0x3A]);
    for _ in 0..3 {
        gb.step().unwrap();
    }
    assert_eq!(gb.bus.read(0xC000).unwrap(), 0x11);
    assert_eq!(gb.cpu.hl.value(), 0xC001);
    gb.step().unwrap();
    assert_eq!(gb.cpu.a, 0x00);
    assert_eq!(gb.cpu.hl.value(), 0xC000);
}

#[test]
fn accumulator_rotates_leave_zero_untouched() {
    // LD A,0x80; RLCA
    let gb = run_code(&[0x3E, 0x80, 0x07, 0x10]);
    assert_eq!(gb.cpu.a, 0x01);
    assert!(gb.cpu.flags.carry);
    assert!(!gb.cpu.flags.zero);
}

#[test]
fn rla_shifts_the_old_carry_in() {
    // SCF; LD A,0x00; RLA
    let gb = run_code(&[0x37, 0x3E, 0x00, 0x17, 0x10]);
    assert_eq!(gb.cpu.a, 0x01);
    assert!(!gb.cpu.flags.carry);
}

#[test]
fn cb_shifts_report_zero() {
    // LD A,0x01; SRL A
    let gb = run_code(&[0x3E, 0x01, 0xCB, 0x3F, 0x10]);
    assert_eq!(gb.cpu.a, 0x00);
    assert!(gb.cpu.flags.zero);
    assert!(gb.cpu.flags.carry);
}

#[test]
fn sra_repeats_the_sign_bit() {
    // LD A,0x81; SRA A
    let gb = run_code(&[0x3E, 0x81, 0xCB, 0x2F, 0x10]);
    assert_eq!(gb.cpu.a, 0xC0);
    assert!(gb.cpu.flags.carry);
}

#[test]
fn swap_exchanges_nibbles() {
    // LD A,0xF0; SWAP A
    let gb = run_code(&[0x3E, 0xF0, 0xCB, 0x37, 0x10]);
    assert_eq!(gb.cpu.a, 0x0F);
    assert!(!gb.cpu.flags.carry);
    assert!(!gb.cpu.flags.zero);
}

#[test]
fn bit_test_set_and_reset() {
    // SCF; LD A,0x80; BIT 7,A; BIT 0,A; RES 7,A; SET 0,A
    let mut gb = machine_with(&[0x37, 0x3E, 0x80, 0xCB, 0x7F, 0xCB, 0x47, 0xCB, 0xBF, 0xCB, 0xC7]);
    for _ in 0..3 {
        gb.step().unwrap();
    }
    assert!(!gb.cpu.flags.zero);
    assert!(gb.cpu.flags.half_carry);
    // BIT preserves the carry from SCF.
    assert!(gb.cpu.flags.carry);
    gb.step().unwrap();
    assert!(gb.cpu.flags.zero);
    gb.step().unwrap();
    assert_eq!(gb.cpu.a, 0x00);
    gb.step().unwrap();
    assert_eq!(gb.cpu.a, 0x01);
}

#[test]
fn cb_through_hl_adds_the_indirect_surcharge() {
    // LD HL,0xC000; BIT 0,(HL)
    let mut gb = machine_with(&[0x21, 0x00, 0xC0, 0xCB, 0x46]);
    gb.step().unwrap();
    gb.step().unwrap();
    assert_eq!(gb.cpu.cycles.machine, 3 + 2);
    assert_eq!(gb.cpu.cycles.cpu, 12 + 12);
}

#[test]
fn di_and_ei_toggle_the_master_enable() {
    let mut gb = machine_with(&[0xFB, 0xF3]);
    gb.step().unwrap();
    assert!(gb.cpu.ime);
    gb.step().unwrap();
    assert!(!gb.cpu.ime);
}

#[test]
fn halted_cpu_idles_until_an_enabled_interrupt() {
    // HALT; INC A
    let mut gb = machine_with(&[0x76, 0x3C]);
    gb.run().unwrap();
    assert!(gb.cpu.halted);

    // Requested but not enabled: stays parked, one idle cycle per step.
    gb.bus.request_interrupt(Interrupts::TIMER);
    let before = gb.cpu.cycles;
    gb.step().unwrap();
    assert!(gb.cpu.halted);
    assert_eq!(gb.cpu.cycles.machine - before.machine, 1);
    assert_eq!(gb.cpu.cycles.cpu - before.cpu, 4);

    // Enable it: the next step wakes up and executes INC A.
    gb.bus.write(0xFFFF, Interrupts::TIMER.bits()).unwrap();
    gb.step().unwrap();
    assert!(!gb.cpu.halted);
    assert_eq!(gb.cpu.a, 0x01);
}

#[test]
fn every_assigned_opcode_executes() -> anyhow::Result<()> {
    use anyhow::Context as _;

    for op in 0x00..=0xFFu8 {
        if op == 0xCB || ILLEGAL_OPCODES.contains(&op) {
            continue;
        }
        let mut gb = machine_with(&[op, 0x00, 0x00]);
        gb.step().with_context(|| format!("opcode 0x{op:02X}"))?;
    }
    for sub in 0x00..=0xFFu8 {
        let mut gb = machine_with(&[0xCB, sub]);
        gb.step().with_context(|| format!("opcode 0xCB 0x{sub:02X}"))?;
    }
    Ok(())
}

#[test]
fn unassigned_opcodes_are_decode_errors() {
    for op in ILLEGAL_OPCODES {
        let mut gb = machine_with(&[op]);
        match gb.step() {
            Err(Error::Decode {
                opcode,
                mnemonic,
                pc,
            }) => {
                assert_eq!(opcode, u16::from(op));
                assert_eq!(mnemonic, OPCODES[op as usize].mnemonic);
                assert_eq!(pc, ENTRY);
            }
            other => panic!("opcode 0x{op:02X}: expected decode error, got {other:?}"),
        }
    }
}

#[test]
fn dump_state_names_every_register() {
    let mut cpu = Cpu::new();
    cpu.set_af(0x1230);
    cpu.pc.set_value(0x0150);
    let dump = cpu.dump_state();
    assert!(dump.contains("AF=0x1230"));
    assert!(dump.contains("PC=0x0150"));
    assert!(dump.contains("IME=false"));
}
