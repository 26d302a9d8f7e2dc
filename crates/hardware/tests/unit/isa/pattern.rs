//! # Pattern Table Tests
//!
//! First-match-wins scanning and the catch-all ordering.

use crate::common::builder::instruction as asm;
use rvdiff_core::isa::{InstructionTable, Op};

#[test]
fn test_lookup_distinguishes_funct7() {
    let table = InstructionTable::new();
    assert_eq!(table.lookup(asm::add(1, 2, 3)).op, Op::Add);
    assert_eq!(table.lookup(asm::sub(1, 2, 3)).op, Op::Sub);
    assert_eq!(table.lookup(asm::srl(1, 2, 3)).op, Op::Srl);
    assert_eq!(table.lookup(asm::sra(1, 2, 3)).op, Op::Sra);
}

#[test]
fn test_lookup_muldiv_share_opcode_with_alu() {
    let table = InstructionTable::new();
    assert_eq!(table.lookup(asm::mul(1, 2, 3)).op, Op::Mul);
    assert_eq!(table.lookup(asm::div(1, 2, 3)).op, Op::Div);
    assert_eq!(table.lookup(asm::remu(1, 2, 3)).op, Op::Remu);
}

#[test]
fn test_lookup_immediate_shifts() {
    let table = InstructionTable::new();
    assert_eq!(table.lookup(asm::slli(1, 2, 5)).op, Op::Slli);
    assert_eq!(table.lookup(asm::srli(1, 2, 5)).op, Op::Srli);
    assert_eq!(table.lookup(asm::srai(1, 2, 5)).op, Op::Srai);
    assert_eq!(table.lookup(asm::addi(1, 2, 5)).op, Op::Addi);
}

#[test]
fn test_lookup_system_instructions() {
    let table = InstructionTable::new();
    assert_eq!(table.lookup(asm::ecall()).op, Op::Ecall);
    assert_eq!(table.lookup(asm::ebreak()).op, Op::Ebreak);
}

#[test]
fn test_catch_all_matches_garbage() {
    let table = InstructionTable::new();
    assert_eq!(table.lookup(0x0000_0000).op, Op::Illegal);
    assert_eq!(table.lookup(0xFFFF_FFFF).op, Op::Illegal);
    // A system-opcode word that is neither ecall nor ebreak.
    assert_eq!(table.lookup(0x1234_0073).op, Op::Illegal);
}

#[test]
fn test_every_defined_encoding_beats_the_catch_all() {
    let table = InstructionTable::new();
    let encodings = [
        asm::add(1, 2, 3),
        asm::lw(1, 2, 0),
        asm::sw(1, 2, 0),
        asm::beq(1, 2, 8),
        asm::lui(1, 1),
        asm::auipc(1, 1),
        asm::jal(1, 8),
        asm::jalr(1, 2, 0),
        asm::mulhsu(1, 2, 3),
    ];
    for inst in encodings {
        assert_ne!(table.lookup(inst).op, Op::Illegal, "encoding {inst:#010x}");
    }
}
