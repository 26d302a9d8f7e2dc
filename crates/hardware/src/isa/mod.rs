//! Instruction set definitions for the RV32IM core.
//!
//! This module implements everything the execution unit needs to understand a
//! 32-bit encoding:
//! 1. **Patterns:** The ordered mask/value table mapping encodings to
//!    operations, compiled once at start-up from textual bit templates.
//! 2. **Decoding:** Operand extraction and immediate reassembly for the six
//!    instruction formats.
//! 3. **ABI:** Register index constants and the ABI name table.
//! 4. **Causes:** Machine-mode trap cause codes.

/// Register index constants and ABI register names.
pub mod abi;
/// Machine-mode trap cause codes.
pub mod cause;
/// Operand extraction and immediate reassembly.
pub mod decode;
/// The ordered instruction pattern table.
pub mod pattern;

pub use decode::{Operands, decode};
pub use pattern::{Format, InstructionTable, Op, Pattern};
