//! # Execution Tests
//!
//! Instruction semantics: wrapping arithmetic, shift masking, signed and
//! unsigned comparisons, the M extension, control flow, and memory access.

use pretty_assertions::assert_eq;

use crate::common::builder::instruction as asm;
use crate::common::harness::TestContext;
use rvdiff_core::common::constants::MEMORY_BASE;
use rvdiff_core::sim::RunState;

#[test]
fn test_addi_chain() {
    let mut ctx = TestContext::new().load_program(&[
        asm::addi(1, 0, 100),
        asm::addi(1, 1, -30),
        asm::addi(2, 1, 0),
    ]);
    ctx.run(3);
    assert_eq!(ctx.get_reg(1), 70);
    assert_eq!(ctx.get_reg(2), 70);
}

#[test]
fn test_x0_stays_zero_after_write() {
    let mut ctx = TestContext::new().load_program(&[asm::addi(0, 0, 123), asm::add(0, 1, 1)]);
    ctx.set_reg(1, 7);
    ctx.run(2);
    assert_eq!(ctx.get_reg(0), 0);
}

#[test]
fn test_add_wraps_at_word_width() {
    let mut ctx = TestContext::new().load_program(&[asm::add(3, 1, 2)]);
    ctx.set_reg(1, 0xFFFF_FFFF);
    ctx.set_reg(2, 2);
    ctx.run(1);
    assert_eq!(ctx.get_reg(3), 1);
}

#[test]
fn test_sub_wraps_below_zero() {
    let mut ctx = TestContext::new().load_program(&[asm::sub(3, 1, 2)]);
    ctx.set_reg(1, 0);
    ctx.set_reg(2, 1);
    ctx.run(1);
    assert_eq!(ctx.get_reg(3), 0xFFFF_FFFF);
}

#[test]
fn test_bitwise_ops() {
    let mut ctx = TestContext::new().load_program(&[
        asm::xor(3, 1, 2),
        asm::or(4, 1, 2),
        asm::and(5, 1, 2),
    ]);
    ctx.set_reg(1, 0xF0F0_1234);
    ctx.set_reg(2, 0x0FF0_4321);
    ctx.run(3);
    assert_eq!(ctx.get_reg(3), 0xF0F0_1234 ^ 0x0FF0_4321);
    assert_eq!(ctx.get_reg(4), 0xF0F0_1234 | 0x0FF0_4321);
    assert_eq!(ctx.get_reg(5), 0xF0F0_1234 & 0x0FF0_4321);
}

#[test]
fn test_bitwise_immediate_ops() {
    let mut ctx = TestContext::new().load_program(&[
        asm::xori(3, 1, -1),
        asm::ori(4, 1, 0x0F0),
        asm::andi(5, 1, 0x0FF),
    ]);
    ctx.set_reg(1, 0x0000_1234);
    ctx.run(3);
    assert_eq!(ctx.get_reg(3), !0x0000_1234);
    assert_eq!(ctx.get_reg(4), 0x0000_12F4);
    assert_eq!(ctx.get_reg(5), 0x0000_0034);
}

#[test]
fn test_bge_and_bgeu() {
    // bge -1 >= 1 is false; bgeu 0xFFFFFFFF >= 1 is true.
    let mut ctx = TestContext::new().load_program(&[
        asm::bge(1, 2, 8),  // not taken
        asm::addi(3, 0, 1), // executed
        asm::bgeu(1, 2, 8), // taken
        asm::addi(4, 0, 1), // skipped
    ]);
    ctx.set_reg(1, 0xFFFF_FFFF);
    ctx.set_reg(2, 1);
    ctx.run(3);
    assert_eq!(ctx.get_reg(3), 1);
    assert_eq!(ctx.get_reg(4), 0);
}

#[test]
fn test_shifts_mask_register_amount_to_five_bits() {
    // Shift amount 35 must behave as 3.
    let mut ctx =
        TestContext::new().load_program(&[asm::sll(3, 1, 2), asm::srl(4, 1, 2), asm::sra(5, 1, 2)]);
    ctx.set_reg(1, 0x8000_0010);
    ctx.set_reg(2, 35);
    ctx.run(3);
    assert_eq!(ctx.get_reg(3), 0x8000_0010u32.wrapping_shl(3));
    assert_eq!(ctx.get_reg(4), 0x8000_0010 >> 3);
    assert_eq!(ctx.get_reg(5), ((0x8000_0010u32 as i32) >> 3) as u32);
}

#[test]
fn test_sra_sign_extends() {
    let mut ctx = TestContext::new().load_program(&[asm::srai(2, 1, 4)]);
    ctx.set_reg(1, 0x8000_0000);
    ctx.run(1);
    assert_eq!(ctx.get_reg(2), 0xF800_0000);
}

#[test]
fn test_slt_signed_vs_sltu_unsigned() {
    let mut ctx = TestContext::new().load_program(&[asm::slt(3, 1, 2), asm::sltu(4, 1, 2)]);
    ctx.set_reg(1, 0xFFFF_FFFF); // -1 signed, huge unsigned
    ctx.set_reg(2, 1);
    ctx.run(2);
    assert_eq!(ctx.get_reg(3), 1, "signed: -1 < 1");
    assert_eq!(ctx.get_reg(4), 0, "unsigned: 0xFFFFFFFF > 1");
}

#[test]
fn test_slti_and_sltiu() {
    let mut ctx = TestContext::new().load_program(&[asm::slti(2, 1, -1), asm::sltiu(3, 1, -1)]);
    ctx.set_reg(1, 0xFFFF_FFFE);
    ctx.run(2);
    assert_eq!(ctx.get_reg(2), 1, "signed: -2 < -1");
    assert_eq!(ctx.get_reg(3), 1, "unsigned: 0xFFFFFFFE < 0xFFFFFFFF");
}

#[test]
fn test_mul_low_word() {
    let mut ctx = TestContext::new().load_program(&[asm::mul(3, 1, 2)]);
    ctx.set_reg(1, 0x1234_5678);
    ctx.set_reg(2, 0x9ABC_DEF0);
    ctx.run(1);
    assert_eq!(
        ctx.get_reg(3),
        0x1234_5678u32.wrapping_mul(0x9ABC_DEF0u32)
    );
}

#[test]
fn test_mulh_variants() {
    let mut ctx = TestContext::new().load_program(&[
        asm::mulh(3, 1, 2),
        asm::mulhu(4, 1, 2),
        asm::mulhsu(5, 1, 2),
    ]);
    ctx.set_reg(1, 0xFFFF_FFFF); // -1 signed
    ctx.set_reg(2, 2);
    ctx.run(3);
    // signed * signed: -1 * 2 = -2 -> high word all ones
    assert_eq!(ctx.get_reg(3), 0xFFFF_FFFF);
    // unsigned * unsigned: (2^32 - 1) * 2 -> high word 1
    assert_eq!(ctx.get_reg(4), 1);
    // signed * unsigned: -1 * 2 = -2 -> high word all ones
    assert_eq!(ctx.get_reg(5), 0xFFFF_FFFF);
}

#[test]
fn test_division_by_zero_produces_spec_results() {
    let mut ctx = TestContext::new().load_program(&[
        asm::div(3, 1, 2),
        asm::divu(4, 1, 2),
        asm::rem(5, 1, 2),
        asm::remu(6, 1, 2),
    ]);
    ctx.set_reg(1, 42);
    ctx.set_reg(2, 0);
    ctx.run(4);
    assert_eq!(ctx.get_reg(3), u32::MAX, "div by zero -> all ones");
    assert_eq!(ctx.get_reg(4), u32::MAX, "divu by zero -> all ones");
    assert_eq!(ctx.get_reg(5), 42, "rem by zero -> dividend");
    assert_eq!(ctx.get_reg(6), 42, "remu by zero -> dividend");
}

#[test]
fn test_signed_division_overflow() {
    let mut ctx = TestContext::new().load_program(&[asm::div(3, 1, 2), asm::rem(4, 1, 2)]);
    ctx.set_reg(1, 0x8000_0000); // i32::MIN
    ctx.set_reg(2, 0xFFFF_FFFF); // -1
    ctx.run(2);
    assert_eq!(ctx.get_reg(3), 0x8000_0000, "MIN / -1 -> dividend");
    assert_eq!(ctx.get_reg(4), 0, "MIN % -1 -> zero");
}

#[test]
fn test_blt_signed_taken_bltu_unsigned_not() {
    // blt -1, 1 branches; bltu with the same bit patterns must fall through.
    let mut ctx = TestContext::new().load_program(&[
        asm::blt(1, 2, 8),    // taken: skips the next instruction
        asm::addi(3, 0, 1),   // skipped
        asm::bltu(1, 2, 8),   // not taken
        asm::addi(4, 0, 1),   // executed
    ]);
    ctx.set_reg(1, 0xFFFF_FFFF);
    ctx.set_reg(2, 1);
    ctx.run(3);
    assert_eq!(ctx.get_reg(3), 0, "blt must skip the addi");
    assert_eq!(ctx.get_reg(4), 1, "bltu must fall through to the addi");
}

#[test]
fn test_beq_and_bne() {
    let mut ctx = TestContext::new().load_program(&[
        asm::beq(1, 2, 8),  // taken
        asm::addi(3, 0, 1), // skipped
        asm::bne(1, 2, 8),  // not taken
        asm::addi(4, 0, 1), // executed
    ]);
    ctx.set_reg(1, 5);
    ctx.set_reg(2, 5);
    ctx.run(3);
    assert_eq!(ctx.get_reg(3), 0);
    assert_eq!(ctx.get_reg(4), 1);
}

#[test]
fn test_backward_branch() {
    // 0: addi x1, x1, 1
    // 4: bne  x1, x2, -4   (loop until x1 == x2)
    let mut ctx = TestContext::new().load_program(&[asm::addi(1, 1, 1), asm::bne(1, 2, -4)]);
    ctx.set_reg(2, 3);
    ctx.run(6);
    assert_eq!(ctx.get_reg(1), 3);
    assert_eq!(ctx.sim.cpu.pc, MEMORY_BASE + 8);
}

#[test]
fn test_jal_links_and_jumps() {
    let mut ctx = TestContext::new().load_program(&[
        asm::jal(1, 12),    // jump to +12, link pc+4
        asm::addi(3, 0, 1), // skipped
        asm::addi(4, 0, 1), // skipped
        asm::addi(5, 0, 1), // target
    ]);
    ctx.run(2);
    assert_eq!(ctx.get_reg(1), MEMORY_BASE + 4);
    assert_eq!(ctx.get_reg(5), 1);
}

#[test]
fn test_jalr_target_is_src1_plus_imm() {
    let mut ctx = TestContext::new().load_program(&[
        asm::jalr(1, 2, 4), // jump to x2 + 4
        asm::addi(3, 0, 1), // skipped
        asm::addi(4, 0, 1), // target
    ]);
    ctx.set_reg(2, MEMORY_BASE + 4);
    ctx.run(2);
    assert_eq!(ctx.get_reg(1), MEMORY_BASE + 4);
    assert_eq!(ctx.get_reg(4), 1);
    assert_eq!(ctx.get_reg(3), 0);
}

#[test]
fn test_lui_and_auipc() {
    let mut ctx = TestContext::new().load_program(&[asm::lui(1, 0xDEADB), asm::auipc(2, 0x1)]);
    ctx.run(2);
    assert_eq!(ctx.get_reg(1), 0xDEAD_B000);
    assert_eq!(ctx.get_reg(2), (MEMORY_BASE + 4).wrapping_add(0x1000));
}

#[test]
fn test_store_load_round_trip() {
    let mut ctx = TestContext::new().load_program(&[asm::sw(1, 2, 0x100), asm::lw(3, 1, 0x100)]);
    ctx.set_reg(1, MEMORY_BASE + 0x1000);
    ctx.set_reg(2, 0xCAFE_BABE);
    ctx.run(2);
    assert_eq!(ctx.get_reg(3), 0xCAFE_BABE);
}

#[test]
fn test_lb_sign_extends_lbu_does_not() {
    let mut ctx = TestContext::new().load_program(&[
        asm::sb(1, 2, 0),
        asm::lb(3, 1, 0),
        asm::lbu(4, 1, 0),
    ]);
    ctx.set_reg(1, MEMORY_BASE + 0x1000);
    ctx.set_reg(2, 0x80);
    ctx.run(3);
    assert_eq!(ctx.get_reg(3), 0xFFFF_FF80);
    assert_eq!(ctx.get_reg(4), 0x0000_0080);
}

#[test]
fn test_lh_sign_extends_lhu_does_not() {
    let mut ctx = TestContext::new().load_program(&[
        asm::sh(1, 2, 0),
        asm::lh(3, 1, 0),
        asm::lhu(4, 1, 0),
    ]);
    ctx.set_reg(1, MEMORY_BASE + 0x1000);
    ctx.set_reg(2, 0x8001);
    ctx.run(3);
    assert_eq!(ctx.get_reg(3), 0xFFFF_8001);
    assert_eq!(ctx.get_reg(4), 0x0000_8001);
}

#[test]
fn test_ebreak_halts_with_a0_exit_code() {
    let mut ctx = TestContext::new().load_program(&[asm::addi(10, 0, 0), asm::ebreak()]);
    ctx.run(10);
    assert_eq!(ctx.sim.state(), RunState::End);
    assert_eq!(ctx.sim.exit_code(), 0);
}

#[test]
fn test_ebreak_with_nonzero_a0_is_a_bad_trap() {
    let mut ctx = TestContext::new().load_program(&[asm::addi(10, 0, 3), asm::ebreak()]);
    ctx.run(10);
    assert_eq!(ctx.sim.state(), RunState::End);
    assert_eq!(ctx.sim.exit_code(), 1);
}

#[test]
fn test_illegal_instruction_aborts() {
    let mut ctx = TestContext::new().load_program(&[0xFFFF_FFFF]);
    ctx.run(10);
    assert_eq!(ctx.sim.state(), RunState::Abort);
    assert_eq!(ctx.sim.exit_code(), 1);
}

#[test]
fn test_unmapped_access_aborts() {
    // Load far below the memory window with no region mapped there.
    let mut ctx = TestContext::new().load_program(&[asm::lw(1, 0, 0x100)]);
    ctx.run(10);
    assert_eq!(ctx.sim.state(), RunState::Abort);
}
