//! The main execution loop.
//!
//! This module retires one instruction per call. Each retirement:
//! 1. **Fetch:** Reads the 32-bit word at the pc through the bus.
//! 2. **Match:** Scans the pattern table in declaration order; the first
//!    matching entry selects the operand format and the action.
//! 3. **Execute:** Runs the action, which may write a register, access the
//!    bus, or overwrite the default `next_pc = pc + 4`.
//! 4. **Commit:** Re-arms the `x0 = 0` invariant and advances the pc.
//!
//! All arithmetic is wrapping at word width; division follows the RISC-V
//! results for divide-by-zero and signed overflow rather than trapping.

use super::Cpu;
use crate::common::SimError;
use crate::common::constants::INSTRUCTION_LEN;
use crate::isa::{Op, abi, cause, decode};

/// Outcome of retiring one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// The instruction retired normally.
    Retired {
        /// Program counter of the retired instruction.
        pc: u32,
        /// Program counter the hart committed to next.
        next_pc: u32,
        /// `true` if the instruction touched a device region; the oracle
        /// must skip the reference comparison for this retirement.
        device_access: bool,
    },
    /// An `ebreak` halted the hart.
    Halted {
        /// Program counter of the `ebreak`.
        pc: u32,
        /// Exit code carried in `a0`.
        code: u32,
    },
}

impl Cpu {
    /// Fetches, decodes, and executes one instruction.
    ///
    /// # Errors
    ///
    /// Fatal on an unmapped bus access, an unsupported access width, or an
    /// illegal instruction. The run cannot continue past any of these.
    pub fn step(&mut self) -> Result<StepResult, SimError> {
        let pc = self.pc;
        let inst = self.load(pc, 4, pc)? as u32;
        let mut next_pc = pc.wrapping_add(INSTRUCTION_LEN);

        let entry = self.table.lookup(inst);
        let ops = decode(inst, entry.format, &self.regs);

        match entry.op {
            // RV32I register-register
            Op::Add => self.regs.write(ops.rd, ops.src1.wrapping_add(ops.src2)),
            Op::Sub => self.regs.write(ops.rd, ops.src1.wrapping_sub(ops.src2)),
            Op::Sll => self.regs.write(ops.rd, ops.src1 << ops.shamt),
            Op::Slt => {
                let lt = (ops.src1 as i32) < (ops.src2 as i32);
                self.regs.write(ops.rd, u32::from(lt));
            }
            Op::Sltu => self.regs.write(ops.rd, u32::from(ops.src1 < ops.src2)),
            Op::Xor => self.regs.write(ops.rd, ops.src1 ^ ops.src2),
            Op::Srl => self.regs.write(ops.rd, ops.src1 >> ops.shamt),
            Op::Sra => {
                let shifted = (ops.src1 as i32) >> ops.shamt;
                self.regs.write(ops.rd, shifted as u32);
            }
            Op::Or => self.regs.write(ops.rd, ops.src1 | ops.src2),
            Op::And => self.regs.write(ops.rd, ops.src1 & ops.src2),

            // RV32I register-immediate
            Op::Jalr => {
                self.regs.write(ops.rd, pc.wrapping_add(4));
                next_pc = ops.src1.wrapping_add(ops.imm);
            }
            Op::Lb => {
                let val = self.load(ops.src1.wrapping_add(ops.imm), 1, pc)?;
                self.regs.write(ops.rd, val as u8 as i8 as i32 as u32);
            }
            Op::Lh => {
                let val = self.load(ops.src1.wrapping_add(ops.imm), 2, pc)?;
                self.regs.write(ops.rd, val as u16 as i16 as i32 as u32);
            }
            Op::Lw => {
                let val = self.load(ops.src1.wrapping_add(ops.imm), 4, pc)?;
                self.regs.write(ops.rd, val as u32);
            }
            Op::Lbu => {
                let val = self.load(ops.src1.wrapping_add(ops.imm), 1, pc)?;
                self.regs.write(ops.rd, val as u32);
            }
            Op::Lhu => {
                let val = self.load(ops.src1.wrapping_add(ops.imm), 2, pc)?;
                self.regs.write(ops.rd, val as u32);
            }
            Op::Addi => self.regs.write(ops.rd, ops.src1.wrapping_add(ops.imm)),
            Op::Slti => {
                let lt = (ops.src1 as i32) < (ops.imm as i32);
                self.regs.write(ops.rd, u32::from(lt));
            }
            Op::Sltiu => self.regs.write(ops.rd, u32::from(ops.src1 < ops.imm)),
            Op::Xori => self.regs.write(ops.rd, ops.src1 ^ ops.imm),
            Op::Ori => self.regs.write(ops.rd, ops.src1 | ops.imm),
            Op::Andi => self.regs.write(ops.rd, ops.src1 & ops.imm),
            Op::Slli => self.regs.write(ops.rd, ops.src1 << ops.shamt),
            Op::Srli => self.regs.write(ops.rd, ops.src1 >> ops.shamt),
            Op::Srai => {
                let shifted = (ops.src1 as i32) >> ops.shamt;
                self.regs.write(ops.rd, shifted as u32);
            }

            // RV32I stores
            Op::Sb => self.store(ops.src1.wrapping_add(ops.imm), 1, ops.src2, pc)?,
            Op::Sh => self.store(ops.src1.wrapping_add(ops.imm), 2, ops.src2, pc)?,
            Op::Sw => self.store(ops.src1.wrapping_add(ops.imm), 4, ops.src2, pc)?,

            // RV32I branches
            Op::Beq => {
                if ops.src1 == ops.src2 {
                    next_pc = pc.wrapping_add(ops.imm);
                }
            }
            Op::Bne => {
                if ops.src1 != ops.src2 {
                    next_pc = pc.wrapping_add(ops.imm);
                }
            }
            Op::Blt => {
                if (ops.src1 as i32) < (ops.src2 as i32) {
                    next_pc = pc.wrapping_add(ops.imm);
                }
            }
            Op::Bge => {
                if (ops.src1 as i32) >= (ops.src2 as i32) {
                    next_pc = pc.wrapping_add(ops.imm);
                }
            }
            Op::Bltu => {
                if ops.src1 < ops.src2 {
                    next_pc = pc.wrapping_add(ops.imm);
                }
            }
            Op::Bgeu => {
                if ops.src1 >= ops.src2 {
                    next_pc = pc.wrapping_add(ops.imm);
                }
            }

            // RV32I upper-immediate and jumps
            Op::Lui => self.regs.write(ops.rd, ops.imm),
            Op::Auipc => self.regs.write(ops.rd, pc.wrapping_add(ops.imm)),
            Op::Jal => {
                self.regs.write(ops.rd, pc.wrapping_add(4));
                next_pc = pc.wrapping_add(ops.imm);
            }

            // RV32M
            Op::Mul => self.regs.write(ops.rd, ops.src1.wrapping_mul(ops.src2)),
            Op::Mulh => self.regs.write(ops.rd, mulh(ops.src1, ops.src2)),
            Op::Mulhsu => self.regs.write(ops.rd, mulhsu(ops.src1, ops.src2)),
            Op::Mulhu => self.regs.write(ops.rd, mulhu(ops.src1, ops.src2)),
            Op::Div => self.regs.write(ops.rd, div(ops.src1, ops.src2)),
            Op::Divu => self.regs.write(ops.rd, divu(ops.src1, ops.src2)),
            Op::Rem => self.regs.write(ops.rd, rem(ops.src1, ops.src2)),
            Op::Remu => self.regs.write(ops.rd, remu(ops.src1, ops.src2)),

            // System
            Op::Ecall => {
                let handler = self.raise_trap(cause::ENVIRONMENT_CALL_FROM_M_MODE, pc, 0);
                next_pc = handler;
            }
            Op::Ebreak => {
                let code = self.regs.read(abi::REG_A0);
                return Ok(StepResult::Halted { pc, code });
            }
            Op::Illegal => {
                let _ = self.raise_trap(cause::ILLEGAL_INSTRUCTION, pc, inst);
                return Err(SimError::IllegalInstruction { inst, pc });
            }
        }

        self.regs.write(abi::REG_ZERO, 0);
        self.pc = next_pc;
        let device_access = self.bus.take_device_access();
        Ok(StepResult::Retired {
            pc,
            next_pc,
            device_access,
        })
    }

    /// Bus read with the faulting pc attached to any error.
    fn load(&mut self, addr: u32, len: usize, pc: u32) -> Result<u64, SimError> {
        self.bus.read(addr, len).map_err(|e| SimError::bus(pc, e))
    }

    /// Bus write with the faulting pc attached to any error.
    fn store(&mut self, addr: u32, len: usize, data: u32, pc: u32) -> Result<(), SimError> {
        self.bus
            .write(addr, len, u64::from(data))
            .map_err(|e| SimError::bus(pc, e))
    }
}

/// High word of the signed 64-bit product.
fn mulh(a: u32, b: u32) -> u32 {
    let product = i64::from(a as i32) * i64::from(b as i32);
    (product >> 32) as u32
}

/// High word of the signed-by-unsigned 64-bit product.
fn mulhsu(a: u32, b: u32) -> u32 {
    let product = i64::from(a as i32) * i64::from(b);
    (product >> 32) as u32
}

/// High word of the unsigned 64-bit product.
fn mulhu(a: u32, b: u32) -> u32 {
    let product = u64::from(a) * u64::from(b);
    (product >> 32) as u32
}

/// Signed division with the RISC-V edge-case results: divide-by-zero yields
/// all ones, `i32::MIN / -1` yields the dividend.
fn div(a: u32, b: u32) -> u32 {
    let (a, b) = (a as i32, b as i32);
    if b == 0 {
        u32::MAX
    } else {
        a.wrapping_div(b) as u32
    }
}

/// Unsigned division; divide-by-zero yields all ones.
fn divu(a: u32, b: u32) -> u32 {
    if b == 0 { u32::MAX } else { a / b }
}

/// Signed remainder with the RISC-V edge-case results: divide-by-zero yields
/// the dividend, `i32::MIN % -1` yields zero.
fn rem(a: u32, b: u32) -> u32 {
    let (a, b) = (a as i32, b as i32);
    if b == 0 {
        a as u32
    } else {
        a.wrapping_rem(b) as u32
    }
}

/// Unsigned remainder; divide-by-zero yields the dividend.
fn remu(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { a % b }
}
