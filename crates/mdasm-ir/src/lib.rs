//! Symbolic expression algebra for the MIPS backend.
//!
//! This crate provides pure expression types with no MIPS-specific knowledge.
//! Instruction decoding and per-instruction semantics live in `mdasm-isa`.

mod expr;
mod location;

pub use expr::*;
pub use location::*;
