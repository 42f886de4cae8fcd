//! MIPS32 instruction set backend.
//!
//! This crate provides the opcode table, instruction decoding with
//! branch-target resolution, and the symbolic effect of each instruction
//! for a backtracking disassembler. Expressions come from `mdasm-ir`;
//! control-flow and ABI hooks live in `mdasm-cfg`.

mod config;
mod decode;
mod fields;
mod mips;
mod opcodes;
mod semantics;
mod stream;
mod table;
mod types;

pub use config::*;
pub use decode::*;
pub use fields::*;
pub use mips::*;
pub use opcodes::*;
pub use semantics::*;
pub use stream::*;
pub use table::*;
pub use types::*;

use thiserror::Error;

/// Opcode table construction errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("Invalid argument {field} in {mnemonic}")]
    UnsupportedArgument { mnemonic: Mnemonic, field: Field },
    #[error("Pattern {bin:#010x} of {mnemonic} sets variable field bits {overlap:#010x}")]
    PatternOverlapsField {
        mnemonic: Mnemonic,
        bin: u32,
        overlap: u32,
    },
    #[error("Too many opcodes: {0}")]
    TooManyOpcodes(usize),
}

pub type Result<T> = std::result::Result<T, TableError>;
