//! Operand extraction and immediate reassembly.
//!
//! This module turns a matched 32-bit encoding into an operand set:
//! 1. **Register fields:** `rd` (bits 11:7), `rs1` (19:15), `rs2` (24:20)
//!    are extracted unconditionally.
//! 2. **Source values:** `src1`/`src2` are read from the register file when
//!    the format requires them.
//! 3. **Immediates:** Reassembled and sign-extended per the canonical RISC-V
//!    bit layouts for the I/S/B/U/J formats.
//! 4. **Shift amount:** A 5-bit masked copy of `src2` (R-format) or the
//!    immediate (I-format) for shift instructions.

use crate::core::arch::Gpr;
use crate::isa::pattern::Format;

/// Decoded operand set for one instruction.
#[derive(Debug, Clone, Copy, Default)]
pub struct Operands {
    /// Destination register index (bits 11:7).
    pub rd: usize,
    /// First source register index (bits 19:15).
    pub rs1: usize,
    /// Second source register index (bits 24:20).
    pub rs2: usize,
    /// Value of `rs1`, when the format reads it.
    pub src1: u32,
    /// Value of `rs2`, when the format reads it.
    pub src2: u32,
    /// Sign-extended immediate, per format.
    pub imm: u32,
    /// 5-bit shift amount: `src2 & 0x1f` for R-format, `imm & 0x1f` for
    /// I-format shifts.
    pub shamt: u32,
}

/// Extracts bits `hi:lo` (inclusive) of `inst`, right-aligned.
#[inline(always)]
const fn bits(inst: u32, hi: u32, lo: u32) -> u32 {
    (inst >> lo) & ((1 << (hi - lo + 1)) - 1)
}

/// Sign-extends the low `width` bits of `value` to 32 bits.
#[inline(always)]
const fn sext(value: u32, width: u32) -> u32 {
    let shift = 32 - width;
    (((value << shift) as i32) >> shift) as u32
}

/// I-format immediate: sign-extend bits 31:20.
const fn imm_i(inst: u32) -> u32 {
    sext(bits(inst, 31, 20), 12)
}

/// S-format immediate: sign-extend {bits 31:25, bits 11:7}.
const fn imm_s(inst: u32) -> u32 {
    sext((bits(inst, 31, 25) << 5) | bits(inst, 11, 7), 12)
}

/// B-format immediate: sign-extend {bit 31, bit 7, bits 30:25, bits 11:8}
/// with an implicit zero in bit 0.
const fn imm_b(inst: u32) -> u32 {
    sext(
        (bits(inst, 31, 31) << 12)
            | (bits(inst, 7, 7) << 11)
            | (bits(inst, 30, 25) << 5)
            | (bits(inst, 11, 8) << 1),
        13,
    )
}

/// U-format immediate: bits 31:12 shifted left by 12.
const fn imm_u(inst: u32) -> u32 {
    sext(bits(inst, 31, 12), 20) << 12
}

/// J-format immediate: sign-extend {bit 31, bits 19:12, bit 20, bits 30:21}
/// with an implicit zero in bit 0.
const fn imm_j(inst: u32) -> u32 {
    sext(
        (bits(inst, 31, 31) << 20)
            | (bits(inst, 19, 12) << 12)
            | (bits(inst, 20, 20) << 11)
            | (bits(inst, 30, 21) << 1),
        21,
    )
}

/// Decodes the operand set of `inst` according to `format`.
///
/// The decoder itself signals no errors; an encoding that matches no pattern
/// is caught by the table's catch-all entry before decoding.
pub fn decode(inst: u32, format: Format, regs: &Gpr) -> Operands {
    let mut ops = Operands {
        rd: bits(inst, 11, 7) as usize,
        rs1: bits(inst, 19, 15) as usize,
        rs2: bits(inst, 24, 20) as usize,
        ..Operands::default()
    };

    match format {
        Format::R => {
            ops.src1 = regs.read(ops.rs1);
            ops.src2 = regs.read(ops.rs2);
            ops.shamt = ops.src2 & 0x1F;
        }
        Format::I => {
            ops.src1 = regs.read(ops.rs1);
            ops.imm = imm_i(inst);
            ops.shamt = ops.imm & 0x1F;
        }
        Format::S => {
            ops.src1 = regs.read(ops.rs1);
            ops.src2 = regs.read(ops.rs2);
            ops.imm = imm_s(inst);
        }
        Format::B => {
            ops.src1 = regs.read(ops.rs1);
            ops.src2 = regs.read(ops.rs2);
            ops.imm = imm_b(inst);
        }
        Format::U => ops.imm = imm_u(inst),
        Format::J => ops.imm = imm_j(inst),
        Format::None => {}
    }

    ops
}
